use tagnav_image::{FrameBuffer, ImageAllocator, ImageSize};

use crate::{
    backend::DetectorBackend, detection::RawDetection, errors::DetectorError,
};

/// Parameters fixed at detector construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorParams {
    /// Pixel subsampling factor, `1` for full resolution. Larger values trade
    /// corner precision for speed.
    pub decimation: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self { decimation: 1 }
    }
}

/// Adapter around a [`DetectorBackend`], bound to one buffer resolution.
///
/// `detect` takes `&mut self`, so a detector is never re-entered, and it takes
/// the buffer by shared reference, so the buffer cannot be written during a
/// detection.
pub struct TagDetector<B: DetectorBackend> {
    backend: B,
    size: ImageSize,
    params: DetectorParams,
    released: bool,
}

impl<B: DetectorBackend> TagDetector<B> {
    /// Creates a new `TagDetector` for buffers of the given size.
    ///
    /// # Arguments
    ///
    /// * `backend` - The external detection primitive.
    /// * `size` - The size of the buffers that will be processed.
    /// * `params` - The detector parameters.
    ///
    /// # Returns
    ///
    /// Returns the detector or [`DetectorError::InvalidDecimation`].
    pub fn new(backend: B, size: ImageSize, params: DetectorParams) -> Result<Self, DetectorError> {
        if params.decimation == 0 {
            return Err(DetectorError::InvalidDecimation(params.decimation));
        }

        log::debug!(
            "tag detector created for {size} with decimation {}",
            params.decimation
        );

        Ok(Self {
            backend,
            size,
            params,
            released: false,
        })
    }

    /// The buffer size this detector was built for.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The detector parameters.
    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Shared access to the backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs the backend once on `buffer` and copies its detections out.
    ///
    /// Backend failures are returned as [`DetectorError::NativeInterop`].
    /// Detections with invalid ids or non-finite coordinates are dropped.
    pub fn try_detect<A: ImageAllocator>(
        &mut self,
        buffer: &FrameBuffer<A>,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        if buffer.size() != self.size {
            return Err(DetectorError::Reinitialization {
                expected: self.size,
                actual: buffer.size(),
            });
        }

        let view = buffer.view()?;
        let native = self
            .backend
            .detect(view, self.params.decimation)
            .map_err(DetectorError::NativeInterop)?;

        let detections = native
            .iter()
            .filter_map(|det| {
                let raw = RawDetection::from_native(det);
                if raw.is_none() {
                    log::warn!("dropping invalid detection for id {}", det.id);
                }
                raw
            })
            .collect();

        Ok(detections)
    }

    /// Runs the backend once on `buffer`.
    ///
    /// A failing backend call is logged and treated as a frame without
    /// detections. Dimension mismatches and released buffers are returned as
    /// errors.
    pub fn detect<A: ImageAllocator>(
        &mut self,
        buffer: &FrameBuffer<A>,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        match self.try_detect(buffer) {
            Err(DetectorError::NativeInterop(err)) => {
                log::warn!("native detector call failed: {err}");
                Ok(Vec::new())
            }
            res => res,
        }
    }

    /// Releases the backend resources.
    pub fn destroy(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.released {
            self.backend.release();
            self.released = true;
            log::debug!("tag detector for {} destroyed", self.size);
        }
    }
}

impl<B: DetectorBackend> Drop for TagDetector<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
