//! Exponential backoff reconnection logic.
//!
//! Delays come from `backon`'s exponential iterator. On top of that the
//! state remembers when the current attempt started: an attempt that stayed
//! up for `success_equivalent` before failing counts as a success, so a
//! bridge that runs for days and hits the odd transient fault starts again
//! from the minimum delay.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use tokio::time::Instant;

/// Configuration for exponential backoff reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub min_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Multiplier for each successive attempt.
    pub factor: f32,
    /// Add up to one extra delay's worth of random jitter.
    pub jitter: bool,
    /// Maximum number of consecutive failures (None = infinite).
    pub max_attempts: Option<usize>,
    /// Uptime after which a failed attempt is treated as a success.
    pub success_equivalent: Option<Duration>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(90),
            factor: std::f32::consts::SQRT_2,
            jitter: true,
            max_attempts: None,
            success_equivalent: Some(Duration::from_secs(300)),
        }
    }
}

impl ReconnectConfig {
    fn build(&self) -> ExponentialBackoff {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor);
        if self.jitter {
            builder = builder.with_jitter();
        }
        match self.max_attempts {
            Some(max) => builder.with_max_times(max),
            None => builder.without_max_times(),
        }
        .build()
    }
}

/// Tracks reconnection state and calculates delays.
pub struct ReconnectState {
    config: ReconnectConfig,
    backoff: ExponentialBackoff,
    attempts: usize,
    attempt_started: Option<Instant>,
}

impl ReconnectState {
    pub fn new(config: ReconnectConfig) -> Self {
        let backoff = config.build();
        Self {
            config,
            backoff,
            attempts: 0,
            attempt_started: None,
        }
    }

    /// Mark the start of a connection attempt.
    pub fn attempt_started(&mut self) {
        self.attempt_started_at(Instant::now());
    }

    pub fn attempt_started_at(&mut self, now: Instant) {
        self.attempt_started = Some(now);
    }

    /// Record a failure and return the delay before the next attempt, or
    /// None if max attempts exceeded.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.next_delay_at(Instant::now())
    }

    pub fn next_delay_at(&mut self, now: Instant) -> Option<Duration> {
        if self.ran_long_enough(now) {
            self.reset();
        }

        let delay = self.backoff.next()?;
        self.attempts += 1;
        Some(delay)
    }

    /// Reset state after a successful (or success-equivalent) connection.
    pub fn reset(&mut self) {
        self.backoff = self.config.build();
        self.attempts = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    fn ran_long_enough(&self, now: Instant) -> bool {
        match (self.config.success_equivalent, self.attempt_started) {
            (Some(threshold), Some(started)) => now.saturating_duration_since(started) >= threshold,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deterministic() -> ReconnectConfig {
        ReconnectConfig {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(90),
            factor: 2.0,
            jitter: false,
            max_attempts: None,
            success_equivalent: Some(Duration::from_secs(300)),
        }
    }

    #[test]
    fn test_quick_failures_grow_delay() {
        let mut state = ReconnectState::new(deterministic());
        let start = Instant::now();

        let mut delays = Vec::new();
        for i in 0..4 {
            let now = start + Duration::from_secs(i * 10);
            state.attempt_started_at(now);
            delays.push(state.next_delay_at(now + Duration::from_secs(5)).unwrap());
        }

        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
        assert_eq!(state.attempts(), 4);
    }

    #[test]
    fn test_long_uptime_resets_growth() {
        let mut state = ReconnectState::new(deterministic());
        let start = Instant::now();

        state.attempt_started_at(start);
        state.next_delay_at(start + Duration::from_secs(1));
        state.attempt_started_at(start + Duration::from_secs(2));
        assert_eq!(
            state.next_delay_at(start + Duration::from_secs(3)),
            Some(Duration::from_secs(2))
        );

        // Connected for 300s before failing: counts as a success.
        let connected = start + Duration::from_secs(10);
        state.attempt_started_at(connected);
        assert_eq!(
            state.next_delay_at(connected + Duration::from_secs(300)),
            Some(Duration::from_secs(1))
        );
        assert_eq!(state.attempts(), 1);
    }

    #[test]
    fn test_uptime_just_below_threshold_keeps_growth() {
        let mut state = ReconnectState::new(deterministic());
        let start = Instant::now();

        state.attempt_started_at(start);
        state.next_delay_at(start);
        state.attempt_started_at(start);
        assert_eq!(
            state.next_delay_at(start + Duration::from_secs(299)),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_delay_capped() {
        let mut state = ReconnectState::new(ReconnectConfig {
            max_delay: Duration::from_secs(5),
            ..deterministic()
        });
        let delays: Vec<_> = (0..6).map(|_| state.next_delay().unwrap()).collect();
        assert_eq!(delays.last(), Some(&Duration::from_secs(5)));
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(5)));
    }

    #[test]
    fn test_max_attempts() {
        let mut state = ReconnectState::new(ReconnectConfig {
            max_attempts: Some(2),
            ..deterministic()
        });
        assert!(state.next_delay().is_some());
        assert!(state.next_delay().is_some());
        assert!(state.next_delay().is_none());

        state.reset();
        assert!(state.next_delay().is_some());
    }

    #[test]
    fn test_jitter_stays_within_double() {
        let mut state = ReconnectState::new(ReconnectConfig {
            jitter: true,
            ..deterministic()
        });
        let delay = state.next_delay().unwrap();
        assert!(delay >= Duration::from_secs(1));
        assert!(delay <= Duration::from_secs(2));
    }

    #[test]
    fn test_no_threshold_never_resets() {
        let mut state = ReconnectState::new(ReconnectConfig {
            success_equivalent: None,
            ..deterministic()
        });
        let start = Instant::now();
        state.attempt_started_at(start);
        state.next_delay_at(start);
        state.attempt_started_at(start);
        assert_eq!(
            state.next_delay_at(start + Duration::from_secs(10_000)),
            Some(Duration::from_secs(2))
        );
    }
}
