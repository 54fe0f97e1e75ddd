use glam::{DMat3, DQuat};

/// Converts a rotation matrix to a unit quaternion.
///
/// Uses Shepperd's method: the branch is chosen from the trace and the largest
/// diagonal element so that the square root is always taken of a quantity
/// bounded away from zero.
///
/// The input must be orthonormal. This is not checked; the result for other
/// matrices is meaningless.
pub fn quat_from_rotation_matrix(m: &DMat3) -> DQuat {
    // row-major accessor over glam's column-major storage
    let r = |row: usize, col: usize| m.col(col)[row];

    let (r00, r11, r22) = (r(0, 0), r(1, 1), r(2, 2));
    let trace = r00 + r11 + r22;

    let (w, x, y, z) = if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        (
            0.25 / s,
            (r(2, 1) - r(1, 2)) * s,
            (r(0, 2) - r(2, 0)) * s,
            (r(1, 0) - r(0, 1)) * s,
        )
    } else if r00 > r11 && r00 > r22 {
        let s = 2.0 * (1.0 + r00 - r11 - r22).sqrt();
        (
            (r(2, 1) - r(1, 2)) / s,
            0.25 * s,
            (r(0, 1) + r(1, 0)) / s,
            (r(0, 2) + r(2, 0)) / s,
        )
    } else if r11 > r22 {
        let s = 2.0 * (1.0 + r11 - r00 - r22).sqrt();
        (
            (r(0, 2) - r(2, 0)) / s,
            (r(0, 1) + r(1, 0)) / s,
            0.25 * s,
            (r(1, 2) + r(2, 1)) / s,
        )
    } else {
        let s = 2.0 * (1.0 + r22 - r00 - r11).sqrt();
        (
            (r(1, 0) - r(0, 1)) / s,
            (r(0, 2) + r(2, 0)) / s,
            (r(1, 2) + r(2, 1)) / s,
            0.25 * s,
        )
    };

    DQuat::from_xyzw(x, y, z, w).normalize()
}

/// Flips the solver's forward axis so that it leaves the visible face of the
/// marker, then rebuilds a right-handed orthonormal basis.
///
/// The solver's z axis points into the marker. Keeping it would mirror the
/// published orientation. With `forward = -z`, the right axis becomes
/// `up x forward` and the up axis `forward x right`, which is a rotation of
/// the input by 180 degrees about its own y axis.
pub fn tag_facing_rotation(m: &DMat3) -> DMat3 {
    let forward = (-m.z_axis).normalize();
    let up = m.y_axis.normalize();
    let right = up.cross(forward).normalize();
    let up = forward.cross(right).normalize();

    DMat3::from_cols(right, up, forward)
}

/// Orientation of a solved marker as a unit quaternion, with the forward flip applied.
pub fn tag_orientation(m: &DMat3) -> DQuat {
    quat_from_rotation_matrix(&tag_facing_rotation(m))
}
