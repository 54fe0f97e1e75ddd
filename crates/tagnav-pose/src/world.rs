use glam::{DQuat, DVec3};

use crate::camera::CameraPose;

/// A pose expressed in the world frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPose {
    /// Position in world coordinates.
    pub position: DVec3,
    /// Orientation in the world frame.
    pub rotation: DQuat,
}

/// Composes a camera-space pose with the camera pose.
///
/// `position = camera.position + camera.rotation * position` and
/// `rotation = camera.rotation * rotation`.
#[inline]
pub fn to_world(camera: &CameraPose, position: DVec3, rotation: DQuat) -> WorldPose {
    WorldPose {
        position: camera.position + camera.rotation * position,
        rotation: camera.rotation * rotation,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn translated_and_rotated_camera() {
        let camera = CameraPose::new(
            DVec3::new(1.0, 2.0, 3.0),
            DQuat::from_axis_angle(DVec3::Y, std::f64::consts::FRAC_PI_2),
        );
        let world = to_world(&camera, DVec3::new(0.0, 0.0, 2.0), DQuat::IDENTITY);

        // +z in camera space is +x in world space after a quarter turn about y
        assert_relative_eq!(world.position.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(world.position.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(world.position.z, 3.0, epsilon = 1e-12);
        assert_eq!(world.rotation, camera.rotation);
    }
}
