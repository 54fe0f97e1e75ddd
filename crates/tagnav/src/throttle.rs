use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Emits each distinct message at most once per interval.
///
/// Messages are keyed by their full text, so a warning that names a tag id
/// is throttled per tag. Only messages seen within the last interval are
/// remembered.
#[derive(Debug, Clone)]
pub struct ThrottledLog {
    interval: Duration,
    last: HashMap<String, Instant>,
}

impl ThrottledLog {
    /// Creates a throttle with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: HashMap::new(),
        }
    }

    /// The minimum interval between two identical messages.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` if `message` may be emitted at `now`, and records it.
    pub fn should_log_at(&mut self, message: &str, now: Instant) -> bool {
        match self.last.get_mut(message) {
            Some(last) if now.saturating_duration_since(*last) < self.interval => false,
            Some(last) => {
                *last = now;
                true
            }
            None => {
                // entries older than one interval no longer suppress anything
                let interval = self.interval;
                self.last
                    .retain(|_, last| now.saturating_duration_since(*last) < interval);
                self.last.insert(message.to_owned(), now);
                true
            }
        }
    }

    /// Number of messages currently being throttled.
    #[inline]
    pub fn tracked(&self) -> usize {
        self.last.len()
    }

    /// Logs `message` at `level` unless it was logged less than one interval ago.
    ///
    /// Returns whether the message was emitted.
    pub fn log(&mut self, level: log::Level, message: &str) -> bool {
        let emit = self.should_log_at(message, Instant::now());
        if emit {
            log::log!(level, "{message}");
        }
        emit
    }

    /// Throttled `warn`.
    pub fn warn(&mut self, message: &str) -> bool {
        self.log(log::Level::Warn, message)
    }

    /// Throttled `debug`.
    pub fn debug(&mut self, message: &str) -> bool {
        self.log(log::Level::Debug, message)
    }
}

impl Default for ThrottledLog {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_message_is_suppressed_within_interval() {
        let mut throttle = ThrottledLog::new(Duration::from_secs(1));
        let t0 = Instant::now();

        assert!(throttle.should_log_at("tag 3 failed", t0));
        assert!(!throttle.should_log_at("tag 3 failed", t0 + Duration::from_millis(500)));
        assert!(throttle.should_log_at("tag 3 failed", t0 + Duration::from_millis(1000)));
        assert!(!throttle.should_log_at("tag 3 failed", t0 + Duration::from_millis(1500)));
    }

    #[test]
    fn distinct_messages_are_independent() {
        let mut throttle = ThrottledLog::default();
        let t0 = Instant::now();

        assert!(throttle.should_log_at("a", t0));
        assert!(throttle.should_log_at("b", t0));
        assert!(!throttle.should_log_at("a", t0));
    }

    #[test]
    fn expired_messages_are_forgotten() {
        let mut throttle = ThrottledLog::new(Duration::from_secs(1));
        let t0 = Instant::now();

        for i in 0..100 {
            assert!(throttle.should_log_at(&format!("backend error {i}"), t0));
        }
        assert_eq!(throttle.tracked(), 100);

        let later = t0 + Duration::from_secs(2);
        assert!(throttle.should_log_at("backend error 100", later));
        assert_eq!(throttle.tracked(), 1);

        // a live entry survives pruning and still suppresses
        assert!(throttle.should_log_at("other", later + Duration::from_millis(100)));
        assert_eq!(throttle.tracked(), 2);
        assert!(!throttle.should_log_at("backend error 100", later + Duration::from_millis(200)));
    }

    #[test]
    fn zero_interval_never_suppresses() {
        let mut throttle = ThrottledLog::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(throttle.should_log_at("a", t0));
        assert!(throttle.should_log_at("a", t0));
        assert!(throttle.warn("a"));
    }
}
