// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Manual doubles for the engine's ports. Clones share state so a test keeps
//! a handle after moving one into the engine.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::TimeDelta;
use guidepost_core::{Clock, EngagementRequest, EngagementSink, StageScheduler, StageTimer};
use guidepost_proto::{EngagementStatus, Timestamp};

use crate::builders::ts;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Default)]
struct SchedulerLog {
    pending: Vec<(StageTimer, Duration)>,
    scheduled: Vec<(StageTimer, Duration)>,
    cancelled: Vec<StageTimer>,
}

/// Scheduler that only fires when the test says so.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    log: Arc<Mutex<SchedulerLog>>,
}

impl ManualScheduler {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers scheduled and neither fired nor cancelled, oldest first.
    pub fn pending(&self) -> Vec<StageTimer> {
        lock(&self.log).pending.iter().map(|(t, _)| *t).collect()
    }

    /// Every `schedule` call, in order.
    pub fn scheduled(&self) -> Vec<(StageTimer, Duration)> {
        lock(&self.log).scheduled.clone()
    }

    /// Every `cancel` call, in order.
    pub fn cancelled(&self) -> Vec<StageTimer> {
        lock(&self.log).cancelled.clone()
    }

    /// Remove and return every pending timer; the caller delivers them.
    pub fn take_pending(&self) -> Vec<StageTimer> {
        lock(&self.log)
            .pending
            .drain(..)
            .map(|(t, _)| t)
            .collect()
    }
}

impl StageScheduler for ManualScheduler {
    fn schedule(&mut self, timer: StageTimer, delay: Duration) {
        let mut log = lock(&self.log);
        log.pending.push((timer, delay));
        log.scheduled.push((timer, delay));
    }

    fn cancel(&mut self, timer: StageTimer) {
        let mut log = lock(&self.log);
        log.pending.retain(|(t, _)| *t != timer);
        log.cancelled.push(timer);
    }
}

/// Sink that keeps every request.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    requests: Arc<Mutex<Vec<EngagementRequest>>>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests dispatched so far.
    pub fn requests(&self) -> Vec<EngagementRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests with `status`.
    pub fn count(&self, status: EngagementStatus) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.status == status)
            .count()
    }

    /// Total requests.
    pub fn len(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Whether nothing was dispatched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EngagementSink for RecordingSink {
    fn dispatch(&mut self, request: EngagementRequest) {
        lock(&self.requests).push(request);
    }
}

/// Clock that only moves when told to. Starts at [`ts`]`(0)`.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<Timestamp>>,
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(ts(0))
    }
}

impl FixedClock {
    /// Clock reading `now`.
    pub fn at(now: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Set the time.
    pub fn set(&self, now: Timestamp) {
        *lock(&self.now) = now;
    }

    /// Move forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = lock(&self.now);
        let next = TimeDelta::try_seconds(secs).and_then(|d| now.checked_add_signed(d));
        if let Some(next) = next {
            *now = next;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *lock(&self.now)
    }
}
