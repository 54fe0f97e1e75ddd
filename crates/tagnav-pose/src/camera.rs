use glam::{DQuat, DVec2, DVec3, UVec2};

use crate::error::PoseError;

/// Represents the intrinsic parameters of a pinhole camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length in pixels, `(fx, fy)`.
    pub focal_length: DVec2,
    /// Principal point in pixels, `(cx, cy)`.
    pub principal_point: DVec2,
    /// Image resolution in pixels.
    pub resolution: UVec2,
}

impl CameraIntrinsics {
    /// Create camera intrinsics from focal lengths and principal point.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::InvalidIntrinsics`] if a focal length is zero or
    /// any parameter is not finite.
    pub fn new(
        focal_length: DVec2,
        principal_point: DVec2,
        resolution: UVec2,
    ) -> Result<Self, PoseError> {
        let intrinsics = Self {
            focal_length,
            principal_point,
            resolution,
        };
        intrinsics.validate()?;
        Ok(intrinsics)
    }

    /// Create camera intrinsics from a 3x3 intrinsics matrix.
    pub fn from_matrix(k: &[[f64; 3]; 3], resolution: UVec2) -> Result<Self, PoseError> {
        if k[0][1] != 0.0 || k[1][0] != 0.0 || k[2][0] != 0.0 || k[2][1] != 0.0 || k[2][2] != 1.0
        {
            return Err(PoseError::InvalidIntrinsics(
                "matrix must have form [[fx, 0, cx], [0, fy, cy], [0, 0, 1]]".to_string(),
            ));
        }

        Self::new(
            DVec2::new(k[0][0], k[1][1]),
            DVec2::new(k[0][2], k[1][2]),
            resolution,
        )
    }

    /// Create camera intrinsics from a vertical field of view in radians,
    /// assuming square pixels and a centered principal point.
    pub fn from_fov(resolution: UVec2, fov_y: f64) -> Result<Self, PoseError> {
        if !(fov_y > 0.0 && fov_y < std::f64::consts::PI) {
            return Err(PoseError::InvalidIntrinsics(format!(
                "field of view {fov_y} must be in (0, pi)"
            )));
        }

        let half = resolution.as_dvec2() / 2.0;
        let f = half.y / (fov_y / 2.0).tan();
        Self::new(DVec2::splat(f), half, resolution)
    }

    /// Checks that the intrinsics can back-project pixels.
    pub fn validate(&self) -> Result<(), PoseError> {
        if !self.focal_length.is_finite() || !self.principal_point.is_finite() {
            return Err(PoseError::InvalidIntrinsics(format!(
                "non-finite parameters: focal length {}, principal point {}",
                self.focal_length, self.principal_point
            )));
        }
        if self.focal_length.x == 0.0 || self.focal_length.y == 0.0 {
            return Err(PoseError::InvalidIntrinsics(format!(
                "focal length {} must be nonzero",
                self.focal_length
            )));
        }
        Ok(())
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f64 {
        2.0 * (self.resolution.y as f64 / 2.0).atan2(self.focal_length.y)
    }

    /// Convert to 3x3 intrinsics matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.focal_length.x, 0.0, self.principal_point.x],
            [0.0, self.focal_length.y, self.principal_point.y],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Unit ray from the camera center through `pixel`.
    #[inline]
    pub fn pixel_to_ray(&self, pixel: DVec2) -> DVec3 {
        ((pixel - self.principal_point) / self.focal_length)
            .extend(1.0)
            .normalize()
    }

    /// Projects a camera-space point to pixels, or `None` if it lies behind the camera.
    #[inline]
    pub fn project(&self, point: DVec3) -> Option<DVec2> {
        if point.z <= 0.0 {
            return None;
        }
        Some(self.focal_length * point.truncate() / point.z + self.principal_point)
    }
}

/// Pose of the camera in the world frame, as reported by the tracking system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// Camera center in world coordinates.
    pub position: DVec3,
    /// Rotation from camera frame to world frame.
    pub rotation: DQuat,
}

impl CameraPose {
    /// The camera at the world origin, axes aligned with the world frame.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Creates a camera pose.
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            focal_length: DVec2::new(600.0, 500.0),
            principal_point: DVec2::new(320.0, 240.0),
            resolution: UVec2::new(640, 480),
        }
    }

    #[test]
    fn zero_focal_length_is_rejected() {
        let res = CameraIntrinsics::new(
            DVec2::new(0.0, 500.0),
            DVec2::new(320.0, 240.0),
            UVec2::new(640, 480),
        );
        assert!(matches!(res, Err(PoseError::InvalidIntrinsics(_))));

        let res = CameraIntrinsics::new(
            DVec2::new(500.0, f64::NAN),
            DVec2::new(320.0, 240.0),
            UVec2::new(640, 480),
        );
        assert!(matches!(res, Err(PoseError::InvalidIntrinsics(_))));
    }

    #[test]
    fn matrix_round_trip() -> Result<(), PoseError> {
        let k = intrinsics().to_matrix();
        let from_k = CameraIntrinsics::from_matrix(&k, UVec2::new(640, 480))?;
        assert_eq!(from_k, intrinsics());

        let skewed = [[600.0, 1.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]];
        assert!(CameraIntrinsics::from_matrix(&skewed, UVec2::new(640, 480)).is_err());
        Ok(())
    }

    #[test]
    fn fov_round_trip() -> Result<(), PoseError> {
        let fov = 82.0f64.to_radians();
        let cam = CameraIntrinsics::from_fov(UVec2::new(1600, 1600), fov)?;
        assert_relative_eq!(cam.fov_y(), fov, epsilon = 1e-12);
        assert_relative_eq!(cam.principal_point.x, 800.0);
        assert_relative_eq!(cam.focal_length.x, cam.focal_length.y);

        assert!(CameraIntrinsics::from_fov(UVec2::new(1600, 1600), 0.0).is_err());
        Ok(())
    }

    #[test]
    fn ray_and_projection_agree() {
        let cam = intrinsics();
        let pixel = DVec2::new(400.0, 100.0);
        let ray = cam.pixel_to_ray(pixel);
        assert_relative_eq!(ray.length(), 1.0, epsilon = 1e-12);

        let projected = cam.project(ray * 3.0).expect("point in front of camera");
        assert_relative_eq!(projected.x, pixel.x, epsilon = 1e-9);
        assert_relative_eq!(projected.y, pixel.y, epsilon = 1e-9);

        assert!(cam.project(DVec3::new(0.0, 0.0, -1.0)).is_none());
    }
}
