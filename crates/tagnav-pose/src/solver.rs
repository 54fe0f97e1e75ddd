//! Approximate pose of a square marker from its four image corners.
//!
//! The depth is estimated from the apparent edge lengths under a
//! fronto-parallel assumption, and the orientation from the directions of the
//! back-projected corner rays. This is a first-order approximation, not a
//! Perspective-n-Point solve: the error grows with the viewing angle and is
//! not bounded for steep views. [`reprojection_rmse`] measures how well a
//! solved pose explains the observed corners.

use glam::{DMat3, DVec2, DVec3};

use crate::{camera::CameraIntrinsics, error::PoseError, geometry::ModelGeometry};

/// Parameters of the pose solver.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Edges shorter than this many pixels are excluded from the depth estimate.
    pub edge_epsilon: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self { edge_epsilon: 1e-6 }
    }
}

/// Rotation and translation mapping marker coordinates into camera coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    /// Rotation whose columns are the marker x, y and z axes in camera space.
    pub rotation: DMat3,
    /// Marker center in camera space.
    pub translation: DVec3,
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: DMat3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Maps a marker-frame point into camera space.
    #[inline]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }
}

/// Weighted depth of the marker along the optical axis.
///
/// Each edge `i -> i + 1` votes with `d_i = M_i * fx / L_i`, weighted by its
/// pixel length `L_i`. Edges shorter than `edge_epsilon` are skipped.
///
/// # Errors
///
/// Returns [`PoseError::DegenerateGeometry`] if every edge is skipped.
pub fn estimate_depth(
    corners: &[DVec2; 4],
    geometry: &ModelGeometry,
    focal_x: f64,
    edge_epsilon: f64,
) -> Result<f64, PoseError> {
    let mut weighted_depth = 0.0;
    let mut total_weight = 0.0;

    for i in 0..4 {
        let pixel_length = corners[i].distance(corners[(i + 1) % 4]);
        if pixel_length.is_nan() || pixel_length <= edge_epsilon {
            log::trace!("skipping edge {i} of length {pixel_length}");
            continue;
        }

        let depth = geometry.edge_length(i) * focal_x / pixel_length;
        weighted_depth += depth * pixel_length;
        total_weight += pixel_length;
    }

    if total_weight <= edge_epsilon {
        return Err(PoseError::DegenerateGeometry("all edges have zero length"));
    }

    Ok(weighted_depth / total_weight)
}

/// Unit rays from the camera center through each corner.
pub fn corner_rays(corners: &[DVec2; 4], intrinsics: &CameraIntrinsics) -> [DVec3; 4] {
    corners.map(|c| intrinsics.pixel_to_ray(c))
}

/// Signed area of the quadrilateral in square pixels (shoelace formula).
///
/// The sign depends on the winding of the corners.
pub fn quad_area(corners: &[DVec2; 4]) -> f64 {
    0.5 * (0..4)
        .map(|i| corners[i].perp_dot(corners[(i + 1) % 4]))
        .sum::<f64>()
}

/// Rejects quadrilaterals with coincident corners or no enclosed area.
///
/// The area must exceed `edge_epsilon` times the perimeter, i.e. the quad
/// must be more than `edge_epsilon` pixels thick on average.
fn check_quad(corners: &[DVec2; 4], edge_epsilon: f64) -> Result<(), PoseError> {
    for i in 0..4 {
        for j in i + 1..4 {
            if corners[i].distance(corners[j]) <= edge_epsilon {
                return Err(PoseError::DegenerateGeometry("coincident corners"));
            }
        }
    }

    let perimeter: f64 = (0..4).map(|i| corners[i].distance(corners[(i + 1) % 4])).sum();
    if quad_area(corners).abs() <= edge_epsilon * perimeter {
        return Err(PoseError::DegenerateGeometry("corners enclose no area"));
    }
    Ok(())
}

fn unit(v: DVec3, what: &'static str) -> Result<DVec3, PoseError> {
    v.try_normalize().ok_or(PoseError::DegenerateGeometry(what))
}

/// Estimates the camera-space pose of a square marker.
///
/// # Arguments
///
/// * `corners` - The four corners in pixels, in the order of [`ModelGeometry::corners`].
/// * `geometry` - The physical marker geometry.
/// * `intrinsics` - The camera intrinsics.
/// * `params` - The solver parameters.
///
/// # Returns
///
/// The transform from marker frame to camera frame. The rotation is exactly
/// orthonormal: the x axis is kept, z is derived from x and y, and y is
/// re-derived from z and x.
///
/// # Errors
///
/// * [`PoseError::InvalidIntrinsics`] if the focal length is zero.
/// * [`PoseError::DegenerateGeometry`] if two corners coincide, the corners
///   enclose no area, or the depth or an axis cannot be computed. No NaN is
///   ever returned.
pub fn solve_tag_pose(
    corners: &[DVec2; 4],
    geometry: &ModelGeometry,
    intrinsics: &CameraIntrinsics,
    params: &SolverParams,
) -> Result<RigidTransform, PoseError> {
    intrinsics.validate()?;

    if !corners.iter().all(|c| c.is_finite()) {
        return Err(PoseError::DegenerateGeometry("non-finite corner"));
    }
    check_quad(corners, params.edge_epsilon)?;

    let depth = estimate_depth(
        corners,
        geometry,
        intrinsics.focal_length.x,
        params.edge_epsilon,
    )?;

    let rays = corner_rays(corners, intrinsics);

    let x_axis = unit((rays[1] - rays[0]) + (rays[2] - rays[3]), "x axis collapsed")?;
    let y_axis = unit((rays[3] - rays[0]) + (rays[2] - rays[1]), "y axis collapsed")?;
    let z_axis = unit(x_axis.cross(y_axis), "x and y axes are parallel")?;
    let y_axis = unit(z_axis.cross(x_axis), "y axis collapsed")?;

    let center_ray = unit(rays.iter().sum::<DVec3>() / 4.0, "center ray collapsed")?;

    Ok(RigidTransform {
        rotation: DMat3::from_cols(x_axis, y_axis, z_axis),
        translation: center_ray * depth,
    })
}

/// Root-mean-square pixel distance between the observed corners and the
/// model corners projected with `transform`.
///
/// Returns `None` if a projected corner falls behind the camera.
pub fn reprojection_rmse(
    transform: &RigidTransform,
    geometry: &ModelGeometry,
    intrinsics: &CameraIntrinsics,
    corners: &[DVec2; 4],
) -> Option<f64> {
    let mut sum_sq = 0.0;
    for (model, observed) in geometry.corners().iter().zip(corners) {
        let projected = intrinsics.project(transform.transform_point(*model))?;
        sum_sq += projected.distance_squared(*observed);
    }
    Some((sum_sq / 4.0).sqrt())
}
