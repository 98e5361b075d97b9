// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports for time: the staging timer and the wall clock.

use std::time::Duration;

use chrono::Utc;
use guidepost_proto::Timestamp;

/// Identity of one scheduled stage resolution.
///
/// Every `open` and `patch` allocates a fresh epoch; the engine only honours
/// the timer its current stage is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageTimer {
    epoch: u64,
}

impl StageTimer {
    /// Timer for `epoch`.
    pub fn new(epoch: u64) -> Self {
        Self { epoch }
    }

    /// Epoch number.
    pub fn epoch(self) -> u64 {
        self.epoch
    }
}

/// Schedules single-shot resolution timers.
///
/// When a timer fires the host calls [`crate::GuideEngine::on_stage_timer`].
/// A zero delay means "after the current turn", never synchronously.
pub trait StageScheduler {
    /// Arrange for `timer` to fire after `delay`.
    fn schedule(&mut self, timer: StageTimer, delay: Duration);
    /// Cancel a pending timer; a no-op if it already fired.
    fn cancel(&mut self, timer: StageTimer);
}

/// Source of "now" for engagement timestamps and throttling.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
