use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use argh::FromArgs;
use glam::{DMat3, DQuat, DVec2, DVec3, UVec2};
use tagnav::{
    detect::{BackendError, DetectorBackend, NativeDetection},
    image::{GrayFrame, ImageU8View},
    pose::{CameraIntrinsics, CameraPose, ModelGeometry, RigidTransform},
    FiducialPipeline, FrameOutcome, StaticTracker, TagNavConfig,
};

/// Runs the fiducial pipeline on a synthetic orbiting marker scene
#[derive(Debug, FromArgs)]
struct Args {
    /// optional JSON configuration file
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// number of frames to capture
    #[argh(option, short = 'n', default = "30")]
    frames: usize,

    /// number of markers in the scene
    #[argh(option, short = 't', default = "3")]
    tags: usize,

    /// capture period in milliseconds
    #[argh(option, short = 'p', default = "10")]
    period_ms: u64,

    /// vertical field of view in degrees
    #[argh(option, default = "82.0")]
    fov: f64,
}

/// Projects the scene of frame `k` the way a detector would report it.
fn render_detections(
    k: usize,
    tags: usize,
    geometry: &ModelGeometry,
    intrinsics: &CameraIntrinsics,
) -> Vec<NativeDetection> {
    (0..tags)
        .filter_map(|i| {
            let phase = k as f64 * 0.05 + i as f64 * std::f64::consts::TAU / tags as f64;
            let pose = RigidTransform {
                rotation: DMat3::from_rotation_z(0.3 * phase.sin()),
                translation: DVec3::new(0.4 * phase.cos(), 0.3 * phase.sin(), 1.5 + 0.2 * i as f64),
            };

            let mut corners = [[0.0; 2]; 4];
            for (dst, p) in corners.iter_mut().zip(geometry.corners()) {
                *dst = intrinsics.project(pose.transform_point(p))?.to_array();
            }
            let center = corners.iter().map(|c| DVec2::from_array(*c)).sum::<DVec2>() / 4.0;

            Some(NativeDetection {
                id: i as i32,
                corners,
                center: center.to_array(),
                ..Default::default()
            })
        })
        .collect()
}

/// Synthetic detector. The capture thread stamps each frame with its index
/// in the first pixel, and the scene is rendered for that index, so the
/// detections always belong to the frame being processed even when the
/// mailbox overwrote earlier ones.
struct SceneBackend {
    tags: usize,
    geometry: ModelGeometry,
    intrinsics: CameraIntrinsics,
    current: Vec<NativeDetection>,
}

impl DetectorBackend for SceneBackend {
    fn detect(
        &mut self,
        image: ImageU8View<'_>,
        _decimation: u32,
    ) -> Result<&[NativeDetection], BackendError> {
        let k = image.get(0, 0).ok_or("empty frame")? as usize;
        if k % 17 == 16 {
            return Err(format!("simulated detector failure on frame {k}").into());
        }

        self.current = render_detections(k, self.tags, &self.geometry, &self.intrinsics);
        Ok(&self.current)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => TagNavConfig::from_json_file(path)?,
        None => TagNavConfig::default(),
    };

    let size = config.image_size();
    let resolution = UVec2::new(u32::try_from(size.width)?, u32::try_from(size.height)?);
    let intrinsics = CameraIntrinsics::from_fov(resolution, args.fov.to_radians())?;
    let backend = SceneBackend {
        tags: args.tags,
        geometry: ModelGeometry::new(config.tag_size)?,
        intrinsics,
        current: Vec::new(),
    };

    let mut pipeline = FiducialPipeline::new(config, backend)?;

    let published = Arc::new(AtomicUsize::new(0));
    {
        let published = published.clone();
        pipeline.subscribe(move |pose| {
            published.fetch_add(1, Ordering::Relaxed);
            log::info!(
                "tag {} at [{:.3}, {:.3}, {:.3}]",
                pose.id,
                pose.position.x,
                pose.position.y,
                pose.position.z
            );
        });
    }

    let sender = pipeline.frame_sender();
    let period = Duration::from_millis(args.period_ms);
    let frames = args.frames;
    let capture = thread::spawn(move || {
        for k in 0..frames {
            let frame = GrayFrame::from_size_val(size, (k % 256) as u8);
            if sender.post(frame) {
                log::debug!("frame {k} replaced an unconsumed frame");
            }
            thread::sleep(period);
        }
    });

    let tracker = StaticTracker::new(intrinsics).with_pose(CameraPose::new(
        DVec3::new(0.0, 1.6, 0.0),
        DQuat::IDENTITY,
    ));

    let mut processed = 0;
    loop {
        match pipeline.process_frame(&tracker)? {
            FrameOutcome::Processed(report) => {
                processed += 1;
                log::debug!("{report:?}");
            }
            FrameOutcome::Dropped => log::warn!("frame dropped"),
            FrameOutcome::Idle if capture.is_finished() && pipeline.mailbox().is_empty() => break,
            FrameOutcome::Idle => thread::sleep(Duration::from_millis(1)),
        }
    }

    capture
        .join()
        .map_err(|_| "capture thread panicked")?;

    println!(
        "processed {processed} of {} frames ({} overwritten), published {} poses",
        pipeline.mailbox().posted(),
        pipeline.mailbox().overwritten(),
        published.load(Ordering::Relaxed)
    );

    pipeline.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use tagnav::image::{FrameBuffer, ImageSize};

    use super::*;

    fn backend() -> SceneBackend {
        SceneBackend {
            tags: 2,
            geometry: ModelGeometry::new(0.16).unwrap(),
            intrinsics: CameraIntrinsics::from_fov(UVec2::new(64, 64), 1.4).unwrap(),
            current: Vec::new(),
        }
    }

    #[test]
    fn detections_follow_the_stamped_frame() -> Result<(), BackendError> {
        let size = ImageSize::from([64, 64]);
        let mut buffer = FrameBuffer::acquire(size)?;
        let mut scene = backend();

        // frames 0 and 1 were overwritten, frame 2 is the one processed
        buffer.write(GrayFrame::from_size_val(size, 2).as_slice())?;
        let seen = scene.detect(buffer.view()?, 1)?.to_vec();

        let expected = render_detections(2, 2, &scene.geometry, &scene.intrinsics);
        assert_eq!(seen, expected);
        assert_ne!(seen, render_detections(0, 2, &scene.geometry, &scene.intrinsics));
        Ok(())
    }

    #[test]
    fn failure_frames_are_reported() -> Result<(), BackendError> {
        let size = ImageSize::from([64, 64]);
        let mut buffer = FrameBuffer::acquire(size)?;
        buffer.write(GrayFrame::from_size_val(size, 16).as_slice())?;

        assert!(backend().detect(buffer.view()?, 1).is_err());
        Ok(())
    }
}
