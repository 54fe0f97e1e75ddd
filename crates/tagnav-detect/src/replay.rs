use std::collections::VecDeque;

use tagnav_image::ImageU8View;

use crate::backend::{BackendError, DetectorBackend, NativeDetection};

/// A scripted result for one detector call.
#[derive(Clone, Debug)]
enum ReplayFrame {
    Detections(Vec<NativeDetection>),
    Failure(String),
}

/// A [`DetectorBackend`] that returns recorded detections, one frame per call.
///
/// Every call overwrites the storage returned by the previous one, the same
/// way a native detector reuses its result array. Once the recording is
/// exhausted, calls return no detections.
#[derive(Debug, Default)]
pub struct ReplayBackend {
    frames: VecDeque<ReplayFrame>,
    current: Vec<NativeDetection>,
    calls: usize,
    released: bool,
}

impl ReplayBackend {
    /// Creates an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame with the given detections.
    pub fn push_frame(&mut self, detections: Vec<NativeDetection>) -> &mut Self {
        self.frames.push_back(ReplayFrame::Detections(detections));
        self
    }

    /// Appends a frame on which the native call fails.
    pub fn push_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.frames.push_back(ReplayFrame::Failure(message.into()));
        self
    }

    /// Number of detector calls so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Number of recorded frames not yet replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Returns true once [`DetectorBackend::release`] has been called.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl DetectorBackend for ReplayBackend {
    fn detect(
        &mut self,
        _image: ImageU8View<'_>,
        _decimation: u32,
    ) -> Result<&[NativeDetection], BackendError> {
        self.calls += 1;
        self.current.clear();

        match self.frames.pop_front() {
            Some(ReplayFrame::Detections(detections)) => self.current = detections,
            Some(ReplayFrame::Failure(message)) => return Err(message.into()),
            None => {}
        }

        Ok(&self.current)
    }

    fn release(&mut self) {
        self.frames.clear();
        self.current.clear();
        self.released = true;
    }
}
