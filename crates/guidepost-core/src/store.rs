// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Snapshot store: every mutation publishes a new `Arc<StoreState>` root.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use guidepost_proto::{GuideGroup, IneligibilityMarker, Timestamp};

use crate::guide::LocalGuide;
use crate::query::{QueryKey, QueryStatus};

/// Debug overrides for previewing guides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugState {
    /// Guide that bypasses URL rules, throttling and staging.
    pub forced_guide_key: Option<String>,
    /// Return selections immediately instead of staging them.
    pub skip_staging: bool,
}

/// Observable guide state.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Guides by key.
    pub guides: BTreeMap<String, Arc<LocalGuide>>,
    /// Guide groups; the first one is the default group.
    pub guide_groups: Vec<GuideGroup>,
    /// The default group was manufactured locally because the server sent none.
    pub synthetic_group: bool,
    /// Last display time per group key.
    pub guide_group_display_logs: BTreeMap<String, Timestamp>,
    /// Server ineligibility markers by guide key.
    pub ineligible_guides: BTreeMap<String, IneligibilityMarker>,
    /// Fetch status per canonical query key.
    pub queries: BTreeMap<QueryKey, QueryStatus>,
    /// Current location href.
    pub location: Option<String>,
    /// Render-trigger tick.
    pub counter: u64,
    /// Preview overrides.
    pub debug: DebugState,
}

impl StoreState {
    /// Guide by key.
    pub fn guide(&self, key: &str) -> Option<&Arc<LocalGuide>> {
        self.guides.get(key)
    }

    /// The group staging and selection run against.
    pub fn default_group(&self) -> Option<&GuideGroup> {
        self.guide_groups.first()
    }

    /// Status of a query.
    pub fn query(&self, key: &QueryKey) -> Option<&QueryStatus> {
        self.queries.get(key)
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Arc<StoreState>) + Send>;

/// Holds the current root and notifies listeners after each mutation.
pub struct Store {
    state: Arc<StoreState>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_listener: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreState::default())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Store {
    /// Store seeded with `state`.
    pub fn new(state: StoreState) -> Self {
        Self {
            state: Arc::new(state),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current root. Cheap; compare roots with `Arc::ptr_eq`.
    pub fn snapshot(&self) -> Arc<StoreState> {
        Arc::clone(&self.state)
    }

    /// Borrow the current root.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Register a listener called with every new root.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Arc<StoreState>) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false when it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Apply `f` to a copy of the current state, publish it as the new root and notify.
    pub fn update(&mut self, f: impl FnOnce(&mut StoreState)) -> Arc<StoreState> {
        let mut next = StoreState::clone(&self.state);
        f(&mut next);
        self.state = Arc::new(next);
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        Arc::clone(&self.state)
    }
}
