use crate::{allocator::AllocatorError, image::ImageSize};

/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// The buffer memory could not be allocated.
    #[error("Failed to allocate the image buffer: {0}")]
    Allocation(#[from] AllocatorError),

    /// The requested image dimensions cannot back a buffer.
    #[error("Invalid image size: {0}")]
    InvalidImageSize(ImageSize),

    /// The row alignment must be at least one byte.
    #[error("Invalid stride alignment {0}")]
    InvalidAlignment(usize),

    /// The data length does not match the buffer size.
    #[error("Data length ({actual}) does not match the buffer size ({expected})")]
    SizeMismatch {
        /// Number of bytes the buffer holds.
        expected: usize,
        /// Number of bytes provided.
        actual: usize,
    },

    /// The buffer memory has already been released.
    #[error("The image buffer has been released")]
    Released,
}
