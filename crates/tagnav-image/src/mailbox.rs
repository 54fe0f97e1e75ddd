use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{error::ImageError, image::ImageSize};

/// An owned, fully materialized single-channel frame.
///
/// The capture side builds the whole frame before posting it, so the pipeline
/// never observes a partially written image.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFrame {
    size: ImageSize,
    data: Vec<u8>,
}

impl GrayFrame {
    /// Creates a frame from tightly packed row-major pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::SizeMismatch`] if `data.len() != width * height`.
    pub fn new(size: ImageSize, data: Vec<u8>) -> Result<Self, ImageError> {
        if data.len() != size.area() {
            return Err(ImageError::SizeMismatch {
                expected: size.area(),
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Creates a frame filled with a constant value.
    pub fn from_size_val(size: ImageSize, val: u8) -> Self {
        Self {
            size,
            data: vec![val; size.area()],
        }
    }

    /// Size of the frame in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The pixel data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame and returns its pixel data.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<GrayFrame>,
    posted: u64,
    overwritten: u64,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    // a panicking capture callback cannot leave the slot half-written
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-slot mailbox between an asynchronous capture source and the pipeline.
///
/// A newly posted frame replaces any frame that has not been taken yet, and
/// the pipeline consumes at most one frame per [`FrameMailbox::take`].
#[derive(Debug, Default)]
pub struct FrameMailbox {
    slot: Arc<Mutex<Slot>>,
}

/// Cloneable handle used by the capture side to post frames.
#[derive(Clone, Debug)]
pub struct FrameSender {
    slot: Arc<Mutex<Slot>>,
}

impl FrameSender {
    /// Posts a frame, overwriting any unconsumed one.
    ///
    /// Returns `true` if an unconsumed frame was replaced.
    pub fn post(&self, frame: GrayFrame) -> bool {
        let mut slot = lock(&self.slot);
        slot.posted += 1;
        let replaced = slot.frame.replace(frame).is_some();
        if replaced {
            slot.overwritten += 1;
        }
        replaced
    }
}

impl FrameMailbox {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for posting frames, typically moved into a capture callback.
    pub fn sender(&self) -> FrameSender {
        FrameSender {
            slot: self.slot.clone(),
        }
    }

    /// Takes the latest frame, if any.
    pub fn take(&self) -> Option<GrayFrame> {
        lock(&self.slot).frame.take()
    }

    /// Returns true if no frame is waiting.
    pub fn is_empty(&self) -> bool {
        lock(&self.slot).frame.is_none()
    }

    /// Total number of frames posted so far.
    pub fn posted(&self) -> u64 {
        lock(&self.slot).posted
    }

    /// Number of frames replaced before the pipeline consumed them.
    pub fn overwritten(&self) -> u64 {
        lock(&self.slot).overwritten
    }
}
