use std::time::Duration;

use glam::{DQuat, DVec3};
use tagnav_detect::RawDetection;
use tagnav_pose::PoseError;

use crate::throttle::ThrottledLog;

/// A marker pose in the world frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TagPose {
    /// Decoded marker id.
    pub id: u32,
    /// Marker center in world coordinates.
    pub position: DVec3,
    /// Marker orientation in the world frame, unit norm.
    pub rotation: DQuat,
    /// The detection the pose was solved from.
    pub detection: RawDetection,
}

/// A detection whose pose could not be solved.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Failed to solve the pose of tag {id}: {error}")]
pub struct TagFailure {
    /// Decoded marker id.
    pub id: u32,
    /// Why the solve failed.
    #[source]
    pub error: PoseError,
}

/// Counts of one dispatched frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Poses delivered to the subscribers.
    pub published: usize,
    /// Detections skipped because their solve failed.
    pub failed: usize,
}

type Subscriber = Box<dyn FnMut(&TagPose) + Send>;

/// Delivers pose events to subscribers, synchronously and in order.
pub struct EventDispatcher {
    subscribers: Vec<Subscriber>,
    throttle: ThrottledLog,
}

impl EventDispatcher {
    /// Creates a dispatcher whose failure warnings are throttled by `log_interval`.
    pub fn new(log_interval: Duration) -> Self {
        Self {
            subscribers: Vec::new(),
            throttle: ThrottledLog::new(log_interval),
        }
    }

    /// Registers a callback invoked for every published pose.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&TagPose) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers one pose to every subscriber, in subscription order.
    pub fn publish(&mut self, pose: &TagPose) {
        log::trace!("publishing tag {} at {}", pose.id, pose.position);
        for subscriber in self.subscribers.iter_mut() {
            subscriber(pose);
        }
    }

    /// Publishes the successful results of one frame in order.
    ///
    /// Failures are logged and skipped; they never stop the remaining results.
    pub fn dispatch_frame<I>(&mut self, results: I) -> DispatchSummary
    where
        I: IntoIterator<Item = Result<TagPose, TagFailure>>,
    {
        let mut summary = DispatchSummary::default();
        for result in results {
            match result {
                Ok(pose) => {
                    self.publish(&pose);
                    summary.published += 1;
                }
                Err(failure) => {
                    self.throttle.warn(&failure.to_string());
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscribers.len())
            .field("throttle", &self.throttle)
            .finish()
    }
}
