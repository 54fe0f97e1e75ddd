#![deny(missing_docs)]
//! # Tagnav Detect
//!
//! Wraps an external fiducial marker detector behind the [`DetectorBackend`]
//! trait and copies its per-frame corner data out into owned
//! [`RawDetection`] values.

/// The external detection primitive.
pub mod backend;

/// Owned per-marker detections.
pub mod detection;

/// The detector adapter.
pub mod detector;

/// Error types for the detector adapter.
pub mod errors;

/// A backend that replays recorded detections.
pub mod replay;

pub use backend::{BackendError, DetectorBackend, NativeDetection};
pub use detection::RawDetection;
pub use detector::{DetectorParams, TagDetector};
pub use errors::DetectorError;
pub use replay::ReplayBackend;
