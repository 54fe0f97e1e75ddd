#![deny(missing_docs)]
//! Frame buffers for fiducial detection
//!
//! This crate owns the single-channel image buffer that is handed to the
//! marker detector every frame, and the single-slot mailbox used to hand
//! frames over from an asynchronous capture source.

/// Allocators backing the frame buffer memory.
pub mod allocator;

/// The fixed-size single-channel buffer shared with the detector.
pub mod buffer;

/// Error types for the image module.
pub mod error;

/// Image size definitions.
pub mod image;

/// Single-slot frame hand-over between capture and pipeline.
pub mod mailbox;

pub use crate::allocator::{AllocatorError, CpuAllocator, ImageAllocator};
pub use crate::buffer::{FrameBuffer, ImageU8View};
pub use crate::error::ImageError;
pub use crate::image::ImageSize;
pub use crate::mailbox::{FrameMailbox, FrameSender, GrayFrame};
