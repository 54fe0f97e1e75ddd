#![deny(missing_docs)]
//! # Tagnav
//!
//! Recovers the world-frame poses of square fiducial markers from the
//! corners reported by an external detector, one frame at a time.
//!
//! A [`FiducialPipeline`] owns the image buffer handed to the detector. Each
//! cycle it consumes at most one captured frame, solves every detection
//! against the intrinsics and camera pose of a [`CameraTracker`], and
//! publishes one [`TagPose`] per successful solve to its subscribers.

#[doc(inline)]
pub use tagnav_detect as detect;

#[doc(inline)]
pub use tagnav_image as image;

#[doc(inline)]
pub use tagnav_pose as pose;

/// Pipeline configuration.
pub mod config;

/// Pose events and their subscribers.
pub mod dispatcher;

/// Error types for the pipeline.
pub mod error;

/// The per-frame detection and pose pipeline.
pub mod pipeline;

/// Rate-limited logging of repeated messages.
pub mod throttle;

/// The camera tracking collaborator.
pub mod tracker;

pub use config::TagNavConfig;
pub use dispatcher::{DispatchSummary, EventDispatcher, TagFailure, TagPose};
pub use error::PipelineError;
pub use pipeline::{solve_detection, FiducialPipeline, FrameOutcome, FrameReport};
pub use throttle::ThrottledLog;
pub use tracker::{CameraTracker, StaticTracker};
