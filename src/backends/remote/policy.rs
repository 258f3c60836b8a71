// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded reconnection policy.
//!
//! Pure decision logic only. The client owns the timers and publishes the
//! countdown on its state channel.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait `delay`, then make reconnect attempt number `attempt` (1-based).
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted. Only a manual reconnect leaves this state.
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub countdown_tick: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
            countdown_tick: Duration::from_secs(1),
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration, countdown_tick: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            countdown_tick,
        }
    }

    /// Decide what to do after `attempts_made` consecutive failed reconnects.
    pub fn next(&self, attempts_made: u32) -> ReconnectDecision {
        if attempts_made < self.max_attempts {
            ReconnectDecision::Retry {
                attempt: attempts_made + 1,
                delay: self.delay,
            }
        } else {
            ReconnectDecision::GiveUp
        }
    }

    pub fn countdown(&self) -> Countdown {
        Countdown {
            remaining: self.delay,
            tick: self.countdown_tick,
        }
    }
}

/// Steps of a reconnect delay: yields `(remaining, sleep_for)` until the delay
/// has fully elapsed.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: Duration,
    tick: Duration,
}

impl Iterator for Countdown {
    type Item = (Duration, Duration);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_zero() {
            return None;
        }
        let remaining = self.remaining;
        let step = if self.tick.is_zero() {
            remaining
        } else {
            self.tick.min(remaining)
        };
        self.remaining -= step;
        Some((remaining, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_until_budget_spent() {
        let policy = ReconnectPolicy::new(3, Duration::from_secs(5), Duration::from_secs(1));

        assert_eq!(
            policy.next(0),
            ReconnectDecision::Retry {
                attempt: 1,
                delay: Duration::from_secs(5)
            }
        );
        assert!(matches!(policy.next(2), ReconnectDecision::Retry { attempt: 3, .. }));
        assert_eq!(policy.next(3), ReconnectDecision::GiveUp);
        assert_eq!(policy.next(7), ReconnectDecision::GiveUp);
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let policy = ReconnectPolicy::new(0, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(policy.next(0), ReconnectDecision::GiveUp);
    }

    #[test]
    fn test_countdown_ticks_down_to_zero() {
        let policy = ReconnectPolicy::new(3, Duration::from_millis(2500), Duration::from_secs(1));

        let steps: Vec<_> = policy.countdown().collect();

        assert_eq!(
            steps,
            vec![
                (Duration::from_millis(2500), Duration::from_secs(1)),
                (Duration::from_millis(1500), Duration::from_secs(1)),
                (Duration::from_millis(500), Duration::from_millis(500)),
            ]
        );
    }

    #[test]
    fn test_countdown_with_zero_tick_is_single_step() {
        let policy = ReconnectPolicy::new(1, Duration::from_secs(2), Duration::ZERO);
        assert_eq!(policy.countdown().count(), 1);
    }

    #[test]
    fn test_zero_delay_has_no_countdown() {
        let policy = ReconnectPolicy::new(1, Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.countdown().next(), None);
    }
}
