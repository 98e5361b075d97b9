// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tokio-backed staging timers.

use std::collections::HashMap;
use std::time::Duration;

use guidepost_core::{StageScheduler, StageTimer};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Sleeps on the tokio runtime and reports fired timers over a channel.
///
/// Must be used from within a runtime. Cancelled timers are aborted, so they
/// never reach the channel.
#[derive(Debug)]
pub struct TokioScheduler {
    tx: UnboundedSender<StageTimer>,
    pending: HashMap<StageTimer, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Scheduler plus the receiver fired timers arrive on.
    pub fn new() -> (Self, UnboundedReceiver<StageTimer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                pending: HashMap::new(),
            },
            rx,
        )
    }

    /// Forget a timer that has fired.
    pub fn fired(&mut self, timer: StageTimer) {
        self.pending.remove(&timer);
    }

    /// Timers scheduled and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl StageScheduler for TokioScheduler {
    fn schedule(&mut self, timer: StageTimer, delay: Duration) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(timer);
        });
        debug!(epoch = timer.epoch(), ?delay, "stage timer scheduled");
        if let Some(old) = self.pending.insert(timer, handle) {
            old.abort();
        }
    }

    fn cancel(&mut self, timer: StageTimer) {
        if let Some(handle) = self.pending.remove(&timer) {
            handle.abort();
            debug!(epoch = timer.epoch(), "stage timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
