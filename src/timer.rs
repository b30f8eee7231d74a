//! Single-shot answer countdown
//!
//! The countdown does not own a clock. Starting it asks the host to deliver
//! an [`AlarmMessage::CountdownExpired`] after the duration, through the same
//! `schedule_message` closure the rest of the player uses. The alarm carries
//! a [`TimerToken`]; only the token of the currently armed countdown is
//! accepted, which makes [`CountdownTimer::cancel`] effective even though the
//! host's alarm is already in flight.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::AlarmMessage;

/// Identifies one arming of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    /// Generation of the question the countdown was armed for
    pub generation: u64,
    /// Arming counter, unique per timer
    pub serial: u64,
}

/// A cancelable one-shot deadline
#[derive(Debug, Default, Clone)]
pub struct CountdownTimer {
    /// The token of the armed countdown, if any
    armed: Option<TimerToken>,
    /// Counter used to mint tokens
    next_serial: u64,
    /// When the armed countdown started
    started_at: Option<SystemTime>,
    /// Length of the armed countdown
    duration: Duration,
}

impl CountdownTimer {
    /// Arms the countdown, implicitly canceling any prior one
    ///
    /// # Arguments
    ///
    /// * `duration` - Time until expiry
    /// * `generation` - Generation of the question the countdown belongs to
    /// * `schedule_message` - Function to schedule the expiry alarm
    pub fn start<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        duration: Duration,
        generation: u64,
        mut schedule_message: S,
    ) -> TimerToken {
        let token = TimerToken {
            generation,
            serial: self.next_serial,
        };
        self.next_serial += 1;

        self.armed = Some(token);
        self.started_at = Some(SystemTime::now());
        self.duration = duration;

        schedule_message(AlarmMessage::CountdownExpired(token), duration);

        token
    }

    /// Disarms the countdown; safe to call when idle or already fired
    pub fn cancel(&mut self) {
        self.armed = None;
        self.started_at = None;
    }

    /// Consumes an expiry alarm
    ///
    /// Returns `true` exactly once for the armed token and disarms the
    /// countdown. Tokens of canceled or superseded countdowns return
    /// `false`.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.armed == Some(token) {
            self.cancel();
            true
        } else {
            false
        }
    }

    /// Whether a countdown is armed
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time since the armed countdown started
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .and_then(|start| start.elapsed().ok())
            .unwrap_or_default()
    }

    /// Time left before expiry, or `None` when idle
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|_| self.duration.saturating_sub(self.elapsed()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn start(timer: &mut CountdownTimer, generation: u64) -> (TimerToken, Vec<(AlarmMessage, Duration)>) {
        let mut scheduled = Vec::new();
        let token = timer.start(Duration::from_secs(3), generation, |alarm, duration| {
            scheduled.push((alarm, duration));
        });
        (token, scheduled)
    }

    #[test]
    fn test_start_schedules_expiry() {
        let mut timer = CountdownTimer::default();
        let (token, scheduled) = start(&mut timer, 2);

        assert!(timer.is_armed());
        assert_eq!(token.generation, 2);
        assert_eq!(scheduled.len(), 1);
        assert!(matches!(
            scheduled[0],
            (AlarmMessage::CountdownExpired(t), d) if t == token && d == Duration::from_secs(3)
        ));
    }

    #[test]
    fn test_fires_at_most_once() {
        let mut timer = CountdownTimer::default();
        let (token, _) = start(&mut timer, 0);

        assert!(timer.fire(token));
        assert!(!timer.fire(token));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancel_blocks_expiry() {
        let mut timer = CountdownTimer::default();
        let (token, _) = start(&mut timer, 0);

        timer.cancel();
        timer.cancel();
        assert!(!timer.fire(token));
        assert_eq!(timer.remaining(), None);
    }

    #[test]
    fn test_cancel_when_never_started() {
        let mut timer = CountdownTimer::default();
        timer.cancel();
        assert!(!timer.is_armed());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_restart_supersedes_prior_countdown() {
        let mut timer = CountdownTimer::default();
        let (first, _) = start(&mut timer, 0);
        let (second, _) = start(&mut timer, 0);

        assert_ne!(first, second);
        assert!(!timer.fire(first));
        assert!(timer.fire(second));
    }

    #[test]
    fn test_remaining_is_bounded_by_duration() {
        let mut timer = CountdownTimer::default();
        start(&mut timer, 0);

        let remaining = timer.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(3));
    }
}
