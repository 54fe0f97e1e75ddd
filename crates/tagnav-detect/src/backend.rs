use tagnav_image::ImageU8View;

/// Error reported by a detector backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// One marker as reported by the native detector.
///
/// The field layout follows the native `apriltag_detection` record, minus
/// the family and homography pointers.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NativeDetection {
    /// Decoded marker id.
    pub id: i32,
    /// Number of bit errors corrected while decoding.
    pub hamming: i32,
    /// Average contrast between the marker bits and the decision threshold.
    pub decision_margin: f32,
    /// Marker center in pixels.
    pub center: [f64; 2],
    /// Sub-pixel corners in pixels, in the detector's winding order.
    pub corners: [[f64; 2]; 4],
}

/// The external marker detection primitive.
///
/// Implementations run their detection algorithm synchronously on the given
/// image. The returned detections borrow the backend: they stay valid only
/// until the next call, so callers must copy them out first.
pub trait DetectorBackend {
    /// Detects markers in `image`, subsampling by `decimation` (`1` = full resolution).
    fn detect(
        &mut self,
        image: ImageU8View<'_>,
        decimation: u32,
    ) -> Result<&[NativeDetection], BackendError>;

    /// Releases the native resources held by the backend.
    fn release(&mut self) {}
}

impl<B: DetectorBackend + ?Sized> DetectorBackend for Box<B> {
    fn detect(
        &mut self,
        image: ImageU8View<'_>,
        decimation: u32,
    ) -> Result<&[NativeDetection], BackendError> {
        (**self).detect(image, decimation)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
