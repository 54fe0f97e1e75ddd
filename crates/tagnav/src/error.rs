use tagnav_detect::DetectorError;
use tagnav_image::ImageError;
use tagnav_pose::PoseError;

/// An error type for the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The configuration cannot drive a pipeline.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error related to the image buffer.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error related to the detector adapter.
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// Error related to the pose solver or the camera model.
    #[error(transparent)]
    Pose(#[from] PoseError),

    /// The configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
