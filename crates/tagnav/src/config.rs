use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tagnav_detect::DetectorParams;
use tagnav_image::ImageSize;
use tagnav_pose::SolverParams;

use crate::error::PipelineError;

/// Configuration of a [`crate::FiducialPipeline`].
///
/// Every field has a default, so a JSON document only needs the fields it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagNavConfig {
    /// Physical side length of the markers in meters.
    pub tag_size: f64,
    /// Detector pixel subsampling factor, `1` for full resolution.
    pub decimation: u32,
    /// Width of the captured frames in pixels.
    pub width: usize,
    /// Height of the captured frames in pixels.
    pub height: usize,
    /// Edges shorter than this many pixels are ignored by the depth estimate.
    pub edge_epsilon: f64,
    /// Solve the detections of a frame in parallel.
    pub parallel_solve: bool,
    /// Minimum interval in seconds between two identical warnings.
    pub log_throttle_secs: f64,
}

impl Default for TagNavConfig {
    fn default() -> Self {
        Self {
            tag_size: 0.16,
            decimation: 1,
            width: 1600,
            height: 1600,
            edge_epsilon: 1e-6,
            parallel_solve: true,
            log_throttle_secs: 1.0,
        }
    }
}

impl TagNavConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that the configuration can drive a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(msg));

        if !(self.tag_size.is_finite() && self.tag_size > 0.0) {
            return invalid(format!("tag_size must be positive, got {}", self.tag_size));
        }
        if self.decimation == 0 {
            return invalid("decimation must be at least 1".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return invalid(format!(
                "frame size must be nonzero, got {}x{}",
                self.width, self.height
            ));
        }
        if !(self.edge_epsilon.is_finite() && self.edge_epsilon >= 0.0) {
            return invalid(format!(
                "edge_epsilon must be non-negative, got {}",
                self.edge_epsilon
            ));
        }
        if Duration::try_from_secs_f64(self.log_throttle_secs).is_err() {
            return invalid(format!(
                "log_throttle_secs must be a non-negative number of seconds, got {}",
                self.log_throttle_secs
            ));
        }
        Ok(())
    }

    /// Size of the frames and of the detector buffer.
    #[inline]
    pub fn image_size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Parameters for the detector adapter.
    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            decimation: self.decimation,
        }
    }

    /// Parameters for the pose solver.
    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            edge_epsilon: self.edge_epsilon,
        }
    }

    /// The warning throttle interval, zero if the configured value is invalid.
    pub fn log_throttle(&self) -> Duration {
        Duration::try_from_secs_f64(self.log_throttle_secs).unwrap_or(Duration::ZERO)
    }
}
