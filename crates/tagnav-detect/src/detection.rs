use glam::DVec2;

use crate::backend::NativeDetection;

/// A detected marker, copied out of the native detector.
///
/// The four corners are ordered consistently with the canonical model corners
/// of the marker: bottom-left, bottom-right, top-right, top-left in the
/// marker's own frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    /// Decoded marker id.
    pub id: u32,
    /// Corners in image pixels.
    pub corners: [DVec2; 4],
    /// Marker center in image pixels.
    pub center: DVec2,
    /// Number of bit errors corrected while decoding.
    pub hamming: u32,
    /// Decoding confidence reported by the detector.
    pub decision_margin: f32,
}

impl RawDetection {
    /// Minimum pixel distance between any two corners of a valid detection.
    pub const MIN_CORNER_SEPARATION: f64 = 1e-6;

    /// Creates a detection from its corners, using their centroid as center.
    pub fn new(id: u32, corners: [DVec2; 4]) -> Self {
        let center = corners.iter().sum::<DVec2>() / 4.0;
        Self {
            id,
            corners,
            center,
            hamming: 0,
            decision_margin: 0.0,
        }
    }

    /// Copies a native detection.
    ///
    /// Returns `None` for a negative id, non-finite coordinates or two
    /// corners closer than [`RawDetection::MIN_CORNER_SEPARATION`].
    pub fn from_native(native: &NativeDetection) -> Option<Self> {
        let id = u32::try_from(native.id).ok()?;
        let corners = native.corners.map(DVec2::from_array);
        let center = DVec2::from_array(native.center);

        if !center.is_finite() || !corners.iter().all(|c| c.is_finite()) {
            return None;
        }
        if has_coincident_corners(&corners) {
            return None;
        }

        Some(Self {
            id,
            corners,
            center,
            hamming: native.hamming.max(0) as u32,
            decision_margin: native.decision_margin,
        })
    }

    /// Pixel lengths of the four edges `corner[i] -> corner[(i + 1) % 4]`.
    pub fn edge_lengths(&self) -> [f64; 4] {
        std::array::from_fn(|i| self.corners[i].distance(self.corners[(i + 1) % 4]))
    }
}

fn has_coincident_corners(corners: &[DVec2; 4]) -> bool {
    (0..4).any(|i| {
        (i + 1..4).any(|j| {
            corners[i].distance(corners[j]) < RawDetection::MIN_CORNER_SEPARATION
        })
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn native(id: i32) -> NativeDetection {
        NativeDetection {
            id,
            hamming: 1,
            decision_margin: 42.0,
            center: [15.0, 15.0],
            corners: [[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0]],
        }
    }

    #[test]
    fn from_native_copies_fields() {
        let det = RawDetection::from_native(&native(7)).expect("valid detection");
        assert_eq!(det.id, 7);
        assert_eq!(det.hamming, 1);
        assert_eq!(det.center, DVec2::new(15.0, 15.0));
        assert_eq!(det.corners[2], DVec2::new(20.0, 20.0));
        assert_eq!(det.edge_lengths(), [10.0; 4]);
    }

    #[test]
    fn from_native_rejects_invalid() {
        assert!(RawDetection::from_native(&native(-1)).is_none());

        let mut nan = native(3);
        nan.corners[1][0] = f64::NAN;
        assert!(RawDetection::from_native(&nan).is_none());

        let mut inf = native(3);
        inf.center[1] = f64::INFINITY;
        assert!(RawDetection::from_native(&inf).is_none());
    }

    #[test]
    fn from_native_rejects_coincident_corners() {
        // adjacent pair
        let mut adjacent = native(3);
        adjacent.corners[2] = adjacent.corners[1];
        assert!(RawDetection::from_native(&adjacent).is_none());

        // diagonal pair
        let mut diagonal = native(3);
        diagonal.corners[2] = diagonal.corners[0];
        assert!(RawDetection::from_native(&diagonal).is_none());

        let mut all = native(3);
        all.corners = [[12.0, 12.0]; 4];
        assert!(RawDetection::from_native(&all).is_none());

        // a sub-pixel quad is small but valid
        let mut tiny = native(3);
        tiny.corners = [[10.0, 10.0], [10.5, 10.0], [10.5, 10.5], [10.0, 10.5]];
        assert!(RawDetection::from_native(&tiny).is_some());
    }

    #[test]
    fn new_uses_centroid() {
        let det = RawDetection::new(
            1,
            [
                DVec2::new(0.0, 0.0),
                DVec2::new(4.0, 0.0),
                DVec2::new(4.0, 2.0),
                DVec2::new(0.0, 2.0),
            ],
        );
        assert_relative_eq!(det.center.x, 2.0);
        assert_relative_eq!(det.center.y, 1.0);
    }
}
