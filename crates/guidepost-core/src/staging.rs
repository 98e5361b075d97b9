// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Group staging: collect the candidates competing for the group's slot during
//! a short window, then commit to the lowest display index seen.
//!
//! ```text
//!   (none) --select--> Open --timer--> Closed --socket event--> Patch
//!                                        ^                        |
//!                                        +---------timer----------+
//!   any state --location change--> (none)
//! ```
//!
//! Candidates live in a map keyed by display index, so "lowest populated
//! index wins" does not depend on arrival order.

use std::collections::BTreeMap;

use crate::scheduler::StageTimer;

/// Stage lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Accumulating candidates; nothing renders yet.
    Open,
    /// Winner committed.
    Closed,
    /// Re-accumulating after a socket event while the previous winner keeps rendering.
    Patch,
}

/// Working state of the staging window for the default group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStage {
    status: StageStatus,
    ordered: BTreeMap<usize, String>,
    resolved: Option<String>,
    timer: Option<StageTimer>,
}

impl GroupStage {
    /// Fresh open stage waiting on `timer`.
    pub fn open(timer: StageTimer) -> Self {
        Self {
            status: StageStatus::Open,
            ordered: BTreeMap::new(),
            resolved: None,
            timer: Some(timer),
        }
    }

    /// Current status.
    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// Candidates observed in this window, by display index.
    pub fn ordered(&self) -> &BTreeMap<usize, String> {
        &self.ordered
    }

    /// Committed winner.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    /// Pending resolution timer; `None` once closed.
    pub fn timer(&self) -> Option<StageTimer> {
        self.timer
    }

    /// Whether the stage is still accumulating.
    pub fn is_accumulating(&self) -> bool {
        matches!(self.status, StageStatus::Open | StageStatus::Patch)
    }

    /// Record the candidate found at `index`. Ignored once closed.
    pub fn record(&mut self, index: usize, key: &str) {
        if self.is_accumulating() {
            self.ordered.insert(index, key.to_string());
        }
    }

    /// Whether `key` is the committed winner.
    pub fn is_resolved(&self, key: &str) -> bool {
        self.resolved.as_deref() == Some(key)
    }

    /// Commit the lowest-index candidate. Returns false when not accumulating.
    pub fn close(&mut self) -> bool {
        if !self.is_accumulating() {
            return false;
        }
        self.resolved = self.ordered.values().next().cloned();
        self.status = StageStatus::Closed;
        self.timer = None;
        true
    }

    /// Re-open a closed stage for re-accumulation, keeping the winner.
    /// Returns false unless the stage was closed.
    pub fn patch(&mut self, timer: StageTimer) -> bool {
        if self.status != StageStatus::Closed {
            return false;
        }
        self.ordered.clear();
        self.status = StageStatus::Patch;
        self.timer = Some(timer);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_picks_lowest_index_regardless_of_arrival() {
        let mut stage = GroupStage::open(StageTimer::new(1));
        stage.record(4, "late-low-priority");
        stage.record(1, "high-priority");
        stage.record(2, "middle");
        assert!(stage.close());
        assert_eq!(stage.resolved(), Some("high-priority"));
        assert_eq!(stage.timer(), None);
        assert!(!stage.close(), "a closed stage never resolves twice");
    }

    #[test]
    fn empty_window_resolves_to_nothing() {
        let mut stage = GroupStage::open(StageTimer::new(1));
        stage.close();
        assert_eq!(stage.status(), StageStatus::Closed);
        assert_eq!(stage.resolved(), None);
    }

    #[test]
    fn patch_only_from_closed_and_keeps_winner() {
        let mut stage = GroupStage::open(StageTimer::new(1));
        assert!(!stage.patch(StageTimer::new(2)));

        stage.record(0, "g1");
        stage.close();
        stage.record(3, "ignored-while-closed");
        assert_eq!(stage.ordered().len(), 1);

        assert!(stage.patch(StageTimer::new(2)));
        assert_eq!(stage.status(), StageStatus::Patch);
        assert!(stage.ordered().is_empty());
        assert_eq!(stage.resolved(), Some("g1"));
        assert_eq!(stage.timer(), Some(StageTimer::new(2)));
        assert!(!stage.patch(StageTimer::new(3)));
    }

    #[test]
    fn patch_window_can_resolve_to_a_new_winner() {
        let mut stage = GroupStage::open(StageTimer::new(1));
        stage.record(2, "g2");
        stage.close();
        stage.patch(StageTimer::new(2));
        stage.record(0, "g0");
        stage.close();
        assert!(stage.is_resolved("g0"));
    }
}
