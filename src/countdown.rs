//! Countdowns
//!
//! A countdown is a start time plus a duration. It holds no timer of its
//! own: callers pass the current time, so a view can tick it as often as it
//! likes and drop it on unmount without anything left running.

use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::{SignedDuration, Timestamp};

/// Fixed-length countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: Timestamp,
    duration: SignedDuration,
}

impl Countdown {
    /// Start a countdown.
    pub fn new(started_at: Timestamp, duration: SignedDuration) -> Self {
        Self {
            started_at,
            duration: duration.max(SignedDuration::ZERO),
        }
    }

    /// When the countdown started.
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Total length.
    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    /// Time left at `now`, between zero and the full duration.
    pub fn remaining(&self, now: Timestamp) -> SignedDuration {
        let elapsed = self.started_at.duration_until(now).max(SignedDuration::ZERO);

        self.duration
            .checked_sub(elapsed)
            .unwrap_or(SignedDuration::ZERO)
            .clamp(SignedDuration::ZERO, self.duration)
    }

    /// Whether no time is left.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.remaining(now).is_zero()
    }

    /// Remaining time as `MM:SS`, the way the order page shows it.
    pub fn clock(&self, now: Timestamp) -> String {
        let secs = self.remaining(now).as_secs();

        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Remaining time in words, e.g. `14m 5s`.
    pub fn humanized(&self, now: Timestamp) -> String {
        format!("{}", self.remaining(now).unsigned_abs().human(Truncate::Second))
    }
}
