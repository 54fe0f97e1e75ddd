use tagnav_image::{ImageError, ImageSize};

use crate::backend::BackendError;

/// Errors that can occur when running the detector adapter.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// Error related to the image buffer.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// The buffer dimensions differ from the ones the detector was built for.
    #[error("Detector was built for {expected} but received {actual}; it must be reconstructed")]
    Reinitialization {
        /// Dimensions fixed at construction.
        expected: ImageSize,
        /// Dimensions of the buffer passed to `detect`.
        actual: ImageSize,
    },

    /// The decimation factor must be at least 1.
    #[error("Invalid decimation factor {0}, expected a value >= 1")]
    InvalidDecimation(u32),

    /// The native detector call failed.
    #[error("Native detector call failed: {0}")]
    NativeInterop(#[source] BackendError),
}
