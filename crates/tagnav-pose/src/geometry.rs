use glam::DVec3;

use crate::error::PoseError;

/// Physical geometry of a square marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelGeometry {
    tag_size: f64,
}

impl ModelGeometry {
    /// Creates the geometry of a marker with the given side length in meters.
    pub fn new(tag_size: f64) -> Result<Self, PoseError> {
        if !(tag_size.is_finite() && tag_size > 0.0) {
            return Err(PoseError::InvalidTagSize(tag_size));
        }
        Ok(Self { tag_size })
    }

    /// Side length of the marker in meters.
    #[inline]
    pub fn tag_size(&self) -> f64 {
        self.tag_size
    }

    /// Corners in the marker's local frame, on the plane `z = 0`:
    ///
    ///  - p0 = [-s/2, -s/2, 0]
    ///  - p1 = [ s/2, -s/2, 0]
    ///  - p2 = [ s/2,  s/2, 0]
    ///  - p3 = [-s/2,  s/2, 0]
    pub fn corners(&self) -> [DVec3; 4] {
        let h = self.tag_size / 2.0;
        [
            DVec3::new(-h, -h, 0.0),
            DVec3::new(h, -h, 0.0),
            DVec3::new(h, h, 0.0),
            DVec3::new(-h, h, 0.0),
        ]
    }

    /// Length of the model edge from corner `i` to corner `(i + 1) % 4`.
    #[inline]
    pub fn edge_length(&self, i: usize) -> f64 {
        let corners = self.corners();
        corners[i % 4].distance(corners[(i + 1) % 4])
    }
}
