//! Adaptive-timeout polling shared by every wait.
//!
//! A wait starts with a deadline of `base` from now. Whenever less than
//! `extension` remains and the agent showed activity within
//! `activity_threshold`, the deadline moves forward by `extension`. A busy
//! agent can therefore run indefinitely, while a stalled one times out at
//! the base deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// Timing parameters for [`poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub base: Duration,
    pub extension: Duration,
    pub activity_threshold: Duration,
    pub interval: Duration,
}

/// Deadline that extends itself while activity keeps arriving.
#[derive(Debug, Clone)]
pub struct AdaptiveDeadline {
    policy: TimeoutPolicy,
    started: Instant,
    deadline: Instant,
    last_activity: Instant,
    extensions: u32,
}

impl AdaptiveDeadline {
    /// Starts a deadline at `now`. The start counts as activity.
    pub fn new(policy: TimeoutPolicy, now: Instant) -> Self {
        Self {
            policy,
            started: now,
            deadline: now + policy.base,
            last_activity: now,
            extensions: 0,
        }
    }

    /// Records that the agent did something observable.
    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Extends the deadline if it is close and activity is recent.
    ///
    /// Returns true when an extension was applied.
    pub fn refresh(&mut self, now: Instant) -> bool {
        let remaining = self.deadline.saturating_duration_since(now);
        let idle_for = now.saturating_duration_since(self.last_activity);
        if remaining < self.policy.extension && idle_for <= self.policy.activity_threshold {
            self.deadline += self.policy.extension;
            self.extensions += 1;
            return true;
        }
        false
    }

    /// Returns true once `now` is at or past the deadline.
    pub fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Number of extensions granted so far.
    pub fn extensions(&self) -> u32 {
        self.extensions
    }

    /// Time since the deadline was started.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe<T> {
    /// `Some` once the awaited signal is present.
    pub result: Option<T>,
    /// True if the agent showed activity since the previous probe.
    pub active: bool,
}

impl<T> Probe<T> {
    pub fn pending(active: bool) -> Self {
        Self {
            result: None,
            active,
        }
    }

    pub fn done(value: T) -> Self {
        Self {
            result: Some(value),
            active: true,
        }
    }
}

/// Why a poll gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    pub waited: Duration,
    pub extensions: u32,
}

/// Repeatedly probes until it reports a result or the deadline expires.
pub async fn poll_until<T, F, Fut>(
    policy: TimeoutPolicy,
    mut probe: F,
) -> std::result::Result<T, PollTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    let mut deadline = AdaptiveDeadline::new(policy, Instant::now());
    loop {
        let observed = probe().await;
        let now = Instant::now();
        if let Some(value) = observed.result {
            trace!(
                elapsed = ?deadline.elapsed(now),
                extensions = deadline.extensions(),
                "poll satisfied"
            );
            return Ok(value);
        }
        if observed.active {
            deadline.record_activity(now);
        }
        if deadline.refresh(now) {
            debug!(extensions = deadline.extensions(), "activity detected, extending deadline");
        }
        if deadline.expired(now) {
            return Err(PollTimeout {
                waited: deadline.elapsed(now),
                extensions: deadline.extensions(),
            });
        }
        sleep(policy.interval).await;
    }
}

/// Detects change between consecutive terminal snapshots.
#[derive(Debug, Default)]
pub struct LivenessProbe {
    last: Option<String>,
}

impl LivenessProbe {
    /// Returns true if `snapshot` differs from the previous one.
    ///
    /// The first snapshot only sets the baseline.
    pub fn observe(&mut self, snapshot: &str) -> bool {
        let changed = matches!(&self.last, Some(prev) if prev != snapshot);
        if self.last.as_deref() != Some(snapshot) {
            self.last = Some(snapshot.to_string());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TimeoutPolicy {
        TimeoutPolicy {
            base: Duration::from_secs(30 * 60),
            extension: Duration::from_secs(15 * 60),
            activity_threshold: Duration::from_secs(60),
            interval: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_no_extension_while_far_from_deadline() {
        let start = Instant::now();
        let mut d = AdaptiveDeadline::new(policy(), start);
        assert!(!d.refresh(start + Duration::from_secs(60)));
        assert_eq!(d.extensions(), 0);
    }

    #[test]
    fn test_extension_requires_recent_activity() {
        let start = Instant::now();
        let mut d = AdaptiveDeadline::new(policy(), start);
        let late = start + Duration::from_secs(20 * 60);
        assert!(!d.refresh(late));

        d.record_activity(late);
        assert!(d.refresh(late));
        assert!(!d.expired(start + Duration::from_secs(40 * 60)));
        assert!(d.expired(start + Duration::from_secs(45 * 60)));
    }

    #[test]
    fn test_liveness_probe() {
        let mut probe = LivenessProbe::default();
        assert!(!probe.observe("a"));
        assert!(!probe.observe("a"));
        assert!(probe.observe("b"));
        assert!(!probe.observe("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_activity_outlives_ten_extensions() {
        let start = Instant::now();
        let finish_at = Duration::from_secs(4 * 60 * 60);
        let result = poll_until(policy(), || async move {
            if start.elapsed() >= finish_at {
                Probe::done(())
            } else {
                Probe::pending(true)
            }
        })
        .await;

        assert!(result.is_ok());
        // base + 10 extensions is 180 minutes; we finished at 240.
        assert!(start.elapsed() >= finish_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_activity_fails_at_base_deadline() {
        let err = poll_until(policy(), || async { Probe::<()>::pending(false) })
            .await
            .unwrap_err();

        assert_eq!(err.extensions, 0);
        assert!(err.waited >= Duration::from_secs(30 * 60));
        assert!(err.waited < Duration::from_secs(30 * 60) + Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_that_stops_times_out_later() {
        let start = Instant::now();
        let busy_for = Duration::from_secs(40 * 60);
        let err = poll_until(policy(), || async move {
            Probe::<()>::pending(start.elapsed() < busy_for)
        })
        .await
        .unwrap_err();

        assert!(err.extensions >= 1);
        assert!(err.waited > Duration::from_secs(30 * 60));
    }
}
