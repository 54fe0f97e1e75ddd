//! Error types shared by the pose modules.

use thiserror::Error;

/// Error types for pose recovery.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PoseError {
    /// The corners do not span a usable quadrilateral.
    #[error("Degenerate tag geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// The camera intrinsics cannot be used to back-project pixels.
    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// The physical tag size must be positive and finite.
    #[error("Invalid tag size {0}, expected a positive finite value")]
    InvalidTagSize(f64),
}
