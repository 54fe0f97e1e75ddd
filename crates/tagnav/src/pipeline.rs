use rayon::prelude::*;
use tagnav_detect::{DetectorBackend, DetectorError, RawDetection, TagDetector};
use tagnav_image::{FrameBuffer, FrameMailbox, FrameSender, GrayFrame};
use tagnav_pose::{
    solve_tag_pose, tag_orientation, to_world, CameraIntrinsics, CameraPose, ModelGeometry,
    SolverParams,
};

use crate::{
    config::TagNavConfig,
    dispatcher::{EventDispatcher, TagFailure, TagPose},
    error::PipelineError,
    throttle::ThrottledLog,
    tracker::CameraTracker,
};

/// Counts of one processed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Detections returned by the detector.
    pub detections: usize,
    /// Poses delivered to the subscribers.
    pub published: usize,
    /// Detections whose solve failed.
    pub failed: usize,
}

/// What happened during one pipeline cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No frame was waiting in the mailbox.
    Idle,
    /// The frame did not fit the buffer and was skipped.
    Dropped,
    /// The frame was detected, solved and dispatched.
    Processed(FrameReport),
}

/// Solves one detection and expresses the result in the world frame.
///
/// The solver's forward axis is flipped to leave the visible face of the
/// marker before the rotation is converted.
pub fn solve_detection(
    detection: RawDetection,
    geometry: &ModelGeometry,
    intrinsics: &CameraIntrinsics,
    camera: &CameraPose,
    params: &SolverParams,
) -> Result<TagPose, TagFailure> {
    let transform = solve_tag_pose(&detection.corners, geometry, intrinsics, params).map_err(
        |error| TagFailure {
            id: detection.id,
            error,
        },
    )?;

    let world = to_world(
        camera,
        transform.translation,
        tag_orientation(&transform.rotation),
    );

    Ok(TagPose {
        id: detection.id,
        position: world.position,
        rotation: world.rotation,
        detection,
    })
}

/// Detects markers in captured frames and publishes their world poses.
///
/// The pipeline owns the buffer shared with the detector. A capture thread
/// posts frames through [`FiducialPipeline::frame_sender`]; each call to
/// [`FiducialPipeline::process_frame`] consumes at most one of them.
///
/// # Example
///
/// ```
/// use tagnav::{FiducialPipeline, FrameOutcome, StaticTracker, TagNavConfig};
/// use tagnav::detect::ReplayBackend;
/// use tagnav::image::GrayFrame;
/// use tagnav::pose::CameraIntrinsics;
///
/// let config = TagNavConfig { width: 64, height: 48, ..Default::default() };
/// let mut pipeline = FiducialPipeline::new(config, ReplayBackend::new()).unwrap();
///
/// let intrinsics = CameraIntrinsics::from_fov([64, 48].into(), 1.0).unwrap();
/// let tracker = StaticTracker::new(intrinsics);
///
/// assert_eq!(pipeline.process_frame(&tracker).unwrap(), FrameOutcome::Idle);
///
/// let sender = pipeline.frame_sender();
/// sender.post(GrayFrame::from_size_val([64, 48].into(), 0));
/// assert!(matches!(
///     pipeline.process_frame(&tracker).unwrap(),
///     FrameOutcome::Processed(_)
/// ));
///
/// pipeline.shutdown();
/// ```
pub struct FiducialPipeline<B: DetectorBackend> {
    config: TagNavConfig,
    geometry: ModelGeometry,
    solver: SolverParams,
    buffer: FrameBuffer,
    detector: TagDetector<B>,
    mailbox: FrameMailbox,
    dispatcher: EventDispatcher,
    throttle: ThrottledLog,
}

impl<B: DetectorBackend> FiducialPipeline<B> {
    /// Validates `config`, acquires the image buffer and builds the detector.
    ///
    /// # Errors
    ///
    /// Configuration and allocation failures are returned; a pipeline is never
    /// built in a partially initialized state.
    pub fn new(config: TagNavConfig, backend: B) -> Result<Self, PipelineError> {
        config.validate()?;

        let geometry = ModelGeometry::new(config.tag_size)?;
        let size = config.image_size();
        let buffer = FrameBuffer::acquire(size)?;
        let detector = TagDetector::new(backend, size, config.detector_params())?;

        log::info!(
            "fiducial pipeline ready: {size}, tag size {} m, decimation {}",
            config.tag_size,
            config.decimation
        );

        Ok(Self {
            geometry,
            solver: config.solver_params(),
            buffer,
            detector,
            mailbox: FrameMailbox::new(),
            dispatcher: EventDispatcher::new(config.log_throttle()),
            throttle: ThrottledLog::new(config.log_throttle()),
            config,
        })
    }

    /// The configuration the pipeline was built with.
    #[inline]
    pub fn config(&self) -> &TagNavConfig {
        &self.config
    }

    /// The marker geometry.
    #[inline]
    pub fn geometry(&self) -> &ModelGeometry {
        &self.geometry
    }

    /// A handle for posting captured frames, usable from another thread.
    pub fn frame_sender(&self) -> FrameSender {
        self.mailbox.sender()
    }

    /// The mailbox holding the next unconsumed frame.
    #[inline]
    pub fn mailbox(&self) -> &FrameMailbox {
        &self.mailbox
    }

    /// The buffer handed to the detector.
    #[inline]
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Shared access to the detector backend.
    #[inline]
    pub fn backend(&self) -> &B {
        self.detector.backend()
    }

    /// The dispatcher, for registering subscribers.
    #[inline]
    pub fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    /// Registers a callback invoked for every published pose.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&TagPose) + Send + 'static,
    {
        self.dispatcher.subscribe(callback);
    }

    /// Processes the frame waiting in the mailbox, if any.
    pub fn process_frame<T: CameraTracker>(
        &mut self,
        tracker: &T,
    ) -> Result<FrameOutcome, PipelineError> {
        match self.mailbox.take() {
            Some(frame) => self.process_gray(&frame, tracker),
            None => Ok(FrameOutcome::Idle),
        }
    }

    /// Copies `frame` into the detector buffer, then detects, solves and
    /// publishes.
    ///
    /// A frame whose dimensions differ from the buffer is dropped, even if it
    /// holds the same number of pixels, and the buffer keeps its previous
    /// contents. A failing detector call counts as a frame without
    /// detections. Failed solves are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer was released or if the tracker reports
    /// unusable intrinsics.
    pub fn process_gray<T: CameraTracker>(
        &mut self,
        frame: &GrayFrame,
        tracker: &T,
    ) -> Result<FrameOutcome, PipelineError> {
        if frame.size() != self.buffer.size() {
            self.throttle.warn(&format!(
                "dropping {} frame, the detector buffer is {}",
                frame.size(),
                self.buffer.size()
            ));
            return Ok(FrameOutcome::Dropped);
        }

        // frame and buffer sizes match, so only a released buffer can fail here
        self.buffer.write_packed(frame.as_slice())?;

        let detections = match self.detector.try_detect(&self.buffer) {
            Ok(detections) => detections,
            Err(DetectorError::NativeInterop(err)) => {
                self.throttle
                    .warn(&format!("native detector call failed: {err}"));
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };

        let count = detections.len();
        if count == 0 {
            return Ok(FrameOutcome::Processed(FrameReport::default()));
        }

        let intrinsics = tracker.intrinsics();
        intrinsics.validate()?;
        let camera = tracker.camera_pose();

        for detection in &detections {
            log::debug!("detected tag {}", detection.id);
        }

        let geometry = &self.geometry;
        let solver = &self.solver;
        let solve = |detection| solve_detection(detection, geometry, &intrinsics, &camera, solver);

        // indexed parallel iterators keep detection order
        let results: Vec<_> = if self.config.parallel_solve {
            detections.into_par_iter().map(solve).collect()
        } else {
            detections.into_iter().map(solve).collect()
        };

        let summary = self.dispatcher.dispatch_frame(results);

        Ok(FrameOutcome::Processed(FrameReport {
            detections: count,
            published: summary.published,
            failed: summary.failed,
        }))
    }

    /// Destroys the detector and releases the image buffer.
    pub fn shutdown(self) {
        let Self {
            detector,
            mut buffer,
            mailbox,
            ..
        } = self;

        detector.destroy();
        buffer.release();

        log::info!(
            "fiducial pipeline shut down: {} frames posted, {} overwritten",
            mailbox.posted(),
            mailbox.overwritten()
        );
    }
}

impl<B: DetectorBackend> std::fmt::Debug for FiducialPipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiducialPipeline")
            .field("config", &self.config)
            .field("buffer", &self.buffer)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
