#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Tagnav Pose
//!
//! Recovers the camera-space pose of a square fiducial marker from its four
//! image corners, converts the rotation to a quaternion and composes the
//! result with the camera pose into world space.
//!
//! The solver is a fast first-order approximation that assumes the marker is
//! seen roughly fronto-parallel. It is not a Perspective-n-Point solver and
//! its accuracy degrades at steep viewing angles.
//!
//! ## Example
//!
//! ```rust
//! use glam::{DVec2, UVec2};
//! use tagnav_pose::{
//!     solve_tag_pose, tag_orientation, to_world, CameraIntrinsics, CameraPose, ModelGeometry,
//!     SolverParams,
//! };
//!
//! let intrinsics = CameraIntrinsics::new(
//!     DVec2::new(800.0, 800.0),
//!     DVec2::new(320.0, 240.0),
//!     UVec2::new(640, 480),
//! )?;
//! let geometry = ModelGeometry::new(0.16)?;
//!
//! // a 0.16m tag, 2m in front of the camera
//! let corners = [
//!     DVec2::new(288.0, 208.0),
//!     DVec2::new(352.0, 208.0),
//!     DVec2::new(352.0, 272.0),
//!     DVec2::new(288.0, 272.0),
//! ];
//!
//! let pose = solve_tag_pose(&corners, &geometry, &intrinsics, &SolverParams::default())?;
//! assert!((pose.translation.z - 2.0).abs() < 1e-6);
//!
//! let world = to_world(&CameraPose::IDENTITY, pose.translation, tag_orientation(&pose.rotation));
//! assert!((world.rotation.length() - 1.0).abs() < 1e-9);
//! # Ok::<(), tagnav_pose::PoseError>(())
//! ```

/// Camera intrinsics and camera pose.
pub mod camera;

/// Error types for pose recovery.
pub mod error;

/// Physical marker geometry.
pub mod geometry;

/// Rotation matrix to quaternion conversion.
pub mod rotation;

/// The approximate square-marker pose solver.
pub mod solver;

/// Camera-space to world-space composition.
pub mod world;

pub use camera::{CameraIntrinsics, CameraPose};
pub use error::PoseError;
pub use geometry::ModelGeometry;
pub use rotation::{quat_from_rotation_matrix, tag_facing_rotation, tag_orientation};
pub use solver::{
    corner_rays, estimate_depth, quad_area, reprojection_rmse, solve_tag_pose, RigidTransform,
    SolverParams,
};
pub use world::{to_world, WorldPose};
