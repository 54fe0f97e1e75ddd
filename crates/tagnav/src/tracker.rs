use tagnav_pose::{CameraIntrinsics, CameraPose};

/// Supplies the camera model and the current camera pose.
///
/// The pipeline queries both once per processed frame.
pub trait CameraTracker {
    /// Intrinsics of the camera that produced the frame.
    fn intrinsics(&self) -> CameraIntrinsics;

    /// Pose of the camera in the world frame when the frame was captured.
    fn camera_pose(&self) -> CameraPose;
}

impl<T: CameraTracker + ?Sized> CameraTracker for &T {
    fn intrinsics(&self) -> CameraIntrinsics {
        (**self).intrinsics()
    }

    fn camera_pose(&self) -> CameraPose {
        (**self).camera_pose()
    }
}

/// A tracker reporting fixed intrinsics and a fixed camera pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticTracker {
    /// The camera intrinsics.
    pub intrinsics: CameraIntrinsics,
    /// The camera pose in the world frame.
    pub pose: CameraPose,
}

impl StaticTracker {
    /// A tracker for a camera at the world origin.
    pub fn new(intrinsics: CameraIntrinsics) -> Self {
        Self {
            intrinsics,
            pose: CameraPose::IDENTITY,
        }
    }

    /// Replaces the camera pose.
    pub fn with_pose(mut self, pose: CameraPose) -> Self {
        self.pose = pose;
        self
    }
}

impl CameraTracker for StaticTracker {
    fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    fn camera_pose(&self) -> CameraPose {
        self.pose
    }
}
