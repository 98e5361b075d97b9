// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The guide engine: store owner, staging driver and fetch bookkeeper.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use guidepost_proto::wire::{self, GuideSocketEvent, JoinParams, SocketMessage, WireError};
use guidepost_proto::{FetchGuidesParams, GuidesResponse};
use tracing::{debug, info, warn};

use crate::engagement::EngagementSink;
use crate::error::GuideError;
use crate::guide::LocalGuide;
use crate::location::{LocationTracker, NavigationEvent};
use crate::predicate::GuideFilter;
use crate::query::{self, FetchPlan, QueryKey, QueryStatus};
use crate::reconcile;
use crate::scheduler::{Clock, StageScheduler, StageTimer, SystemClock};
use crate::selection::{self, SelectOptions, Selection};
use crate::staging::{GroupStage, StageStatus};
use crate::store::{DebugState, Store, StoreState, SubscriptionId};

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Guide channel.
    pub channel_id: String,
    /// Authenticated user; required by fetch and engagement.
    pub user_id: Option<String>,
    /// Staging window length.
    pub order_resolution_duration: Duration,
    /// Tenant sent with fetches, joins and seen events.
    pub tenant: Option<String>,
    /// Targeting data sent with fetches, joins and seen events.
    pub data: Option<serde_json::Value>,
    /// Forward navigation events to `set_location`.
    pub track_location: bool,
}

impl EngineConfig {
    /// Config for `channel_id` with a zero-length staging window.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: None,
            order_resolution_duration: Duration::ZERO,
            tenant: None,
            data: None,
            track_location: true,
        }
    }

    /// Set the user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the staging window.
    pub fn with_order_resolution(mut self, duration: Duration) -> Self {
        self.order_resolution_duration = duration;
        self
    }
}

/// Single-owner guide engine.
///
/// `S` schedules staging timers, `D` carries engagement requests to the
/// network, `C` supplies timestamps.
pub struct GuideEngine<S, D, C = SystemClock> {
    pub(crate) config: EngineConfig,
    pub(crate) store: Store,
    pub(crate) stage: Option<GroupStage>,
    next_epoch: u64,
    pub(crate) scheduler: S,
    pub(crate) sink: D,
    pub(crate) clock: C,
    pub(crate) tracker: LocationTracker,
}

impl<S, D, C> fmt::Debug for GuideEngine<S, D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuideEngine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("stage", &self.stage)
            .field("next_epoch", &self.next_epoch)
            .finish_non_exhaustive()
    }
}

impl<S, D> GuideEngine<S, D, SystemClock>
where
    S: StageScheduler,
    D: EngagementSink,
{
    /// Engine on the wall clock.
    pub fn new(config: EngineConfig, scheduler: S, sink: D) -> Self {
        Self::with_clock(config, scheduler, sink, SystemClock)
    }
}

impl<S, D, C> GuideEngine<S, D, C>
where
    S: StageScheduler,
    D: EngagementSink,
    C: Clock,
{
    /// Engine with an explicit clock.
    pub fn with_clock(config: EngineConfig, scheduler: S, sink: D, clock: C) -> Self {
        let mut tracker = LocationTracker::new();
        if !config.track_location {
            tracker.detach();
        }
        Self {
            config,
            store: Store::default(),
            stage: None,
            next_epoch: 0,
            scheduler,
            sink,
            clock,
            tracker,
        }
    }

    /// Settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the user context.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.config.user_id = user_id;
    }

    /// Current store root.
    pub fn snapshot(&self) -> Arc<StoreState> {
        self.store.snapshot()
    }

    /// Listen for new store roots.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Arc<StoreState>) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    /// Stop listening.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Current staging window, if any.
    pub fn stage(&self) -> Option<&GroupStage> {
        self.stage.as_ref()
    }

    /// Timer port.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Timer port, mutably.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Engagement port.
    pub fn sink(&self) -> &D {
        &self.sink
    }

    /// Engagement port, mutably.
    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    pub(crate) fn require_user(&self, operation: &'static str) -> Result<String, GuideError> {
        self.config
            .user_id
            .clone()
            .ok_or_else(|| GuideError::unauthenticated(operation))
    }

    fn next_timer(&mut self) -> StageTimer {
        self.next_epoch += 1;
        StageTimer::new(self.next_epoch)
    }

    // --- selection ---------------------------------------------------------

    /// What a view matching `filter` should render right now.
    ///
    /// The first call for a group opens a staging window and returns `None`;
    /// once the window's timer fires only the winning guide is returned, and
    /// only to callers whose filter selects it.
    pub fn select_guide(&mut self, filter: &GuideFilter) -> Option<Arc<LocalGuide>> {
        let state = self.store.snapshot();
        if state.debug.forced_guide_key.is_some() {
            return selection::select_forced(&state, filter).map(|s| s.guide);
        }
        let now = self.clock.now();
        let candidate = selection::select_guide(&state, filter, SelectOptions::default(), now);
        if state.debug.skip_staging {
            return candidate.map(|s| s.guide);
        }

        if self.stage.is_none() {
            let timer = self.next_timer();
            let mut stage = GroupStage::open(timer);
            if let Some(c) = &candidate {
                stage.record(c.index, c.key());
            }
            debug!(epoch = timer.epoch(), candidate = ?candidate.as_ref().map(Selection::key), "stage opened");
            self.stage = Some(stage);
            self.scheduler
                .schedule(timer, self.config.order_resolution_duration);
            return None;
        }

        let stage = self.stage.as_mut()?;
        if let Some(c) = &candidate {
            stage.record(c.index, c.key());
        }
        match stage.status() {
            StageStatus::Open => None,
            StageStatus::Closed | StageStatus::Patch => candidate
                .filter(|c| stage.is_resolved(c.key()))
                .or_else(|| {
                    // The guide on screen outlives the throttle its own render started.
                    let unthrottled = SelectOptions {
                        include_throttled: true,
                    };
                    selection::select_guide(&state, filter, unthrottled, now)
                        .filter(|c| stage.is_resolved(c.key()))
                })
                .map(|c| c.guide),
        }
    }

    /// Every eligible guide in display order, bypassing staging.
    pub fn select_guides(&self, filter: &GuideFilter, opts: SelectOptions) -> Vec<Selection> {
        selection::select_guides(self.store.state(), filter, opts, self.clock.now())
    }

    /// Whether the default group's display interval is running.
    pub fn is_throttled(&self) -> bool {
        selection::is_throttled(self.store.state(), self.clock.now())
    }

    /// Bump the render counter so subscribers re-run selection, e.g. when a
    /// throttle window may have lapsed.
    pub fn refresh(&mut self) {
        self.store.update(|s| s.counter += 1);
    }

    /// Resolution timer callback. Returns false for superseded or unknown timers.
    pub fn on_stage_timer(&mut self, timer: StageTimer) -> bool {
        let Some(stage) = self.stage.as_mut() else {
            debug!(epoch = timer.epoch(), "timer fired without a stage");
            return false;
        };
        if stage.timer() != Some(timer) {
            debug!(epoch = timer.epoch(), "stale stage timer ignored");
            return false;
        }
        stage.close();
        debug!(epoch = timer.epoch(), resolved = ?stage.resolved(), "stage closed");
        self.store.update(|s| s.counter += 1);
        true
    }

    fn discard_stage(&mut self) {
        if let Some(stage) = self.stage.take() {
            if let Some(timer) = stage.timer() {
                self.scheduler.cancel(timer);
            }
            debug!(status = ?stage.status(), "stage discarded");
        }
    }

    /// Closed stage → patch, before a socket event lands. Other states are left alone.
    pub(crate) fn maybe_patch(&mut self) {
        if !self
            .stage
            .as_ref()
            .is_some_and(|s| s.status() == StageStatus::Closed)
        {
            return;
        }
        let timer = self.next_timer();
        if let Some(stage) = self.stage.as_mut() {
            stage.patch(timer);
            debug!(epoch = timer.epoch(), resolved = ?stage.resolved(), "stage patched");
        }
        self.scheduler
            .schedule(timer, self.config.order_resolution_duration);
    }

    // --- location ----------------------------------------------------------

    /// Store a new location, discarding any stage. No-op if unchanged.
    pub fn set_location(&mut self, href: impl Into<String>) -> bool {
        let href = href.into();
        if self.store.state().location.as_deref() == Some(href.as_str()) {
            return false;
        }
        self.discard_stage();
        debug!(location = %href, "location changed");
        self.store.update(|s| s.location = Some(href));
        true
    }

    /// Navigation entry point for router adapters.
    pub fn on_navigate(&mut self, event: &NavigationEvent) -> bool {
        let current = self.store.state().location.as_deref();
        match self.tracker.resolve(event, current) {
            Some(href) => {
                let href = href.to_owned();
                self.set_location(href)
            }
            None => false,
        }
    }

    /// Navigation tracker.
    pub fn location_tracker(&self) -> &LocationTracker {
        &self.tracker
    }

    /// Navigation tracker, mutably (attach/detach).
    pub fn location_tracker_mut(&mut self) -> &mut LocationTracker {
        &mut self.tracker
    }

    // --- debug -------------------------------------------------------------

    /// Replace debug overrides; discards the stage so the next selection starts over.
    pub fn set_debug(&mut self, debug: DebugState) {
        self.discard_stage();
        self.store.update(|s| s.debug = debug);
    }

    // --- fetch -------------------------------------------------------------

    /// Fetch parameters carrying the configured tenant and data.
    pub fn default_fetch_params(&self) -> FetchGuidesParams {
        FetchGuidesParams {
            tenant: self.config.tenant.clone(),
            data: self.config.data.clone(),
            ..FetchGuidesParams::default()
        }
    }

    /// Mark a query as loading unless an identical one is in flight.
    pub fn begin_fetch(&mut self, params: &FetchGuidesParams) -> Result<FetchPlan, GuideError> {
        self.require_user("fetch")?;
        let key = QueryKey::for_params(params);
        if matches!(self.store.state().query(&key), Some(QueryStatus::Loading)) {
            debug!(query_key = %key, "fetch already in flight");
            return Ok(FetchPlan::InFlight(key));
        }
        info!(query_key = %key, "fetching guides");
        let status_key = key.clone();
        self.store.update(|s| {
            s.queries.insert(status_key, QueryStatus::Loading);
        });
        Ok(FetchPlan::Request(key))
    }

    /// Merge a successful response.
    pub fn complete_fetch(&mut self, key: &QueryKey, response: GuidesResponse) {
        info!(
            query_key = %key,
            guides = response.entries.len(),
            groups = response.guide_groups.len(),
            "guides fetched"
        );
        let key = key.clone();
        self.store
            .update(|s| query::apply_fetch_result(s, key, response));
    }

    /// Record a failed fetch; guide data is untouched.
    pub fn fail_fetch(&mut self, key: &QueryKey, error: impl fmt::Display) {
        let error = error.to_string();
        warn!(query_key = %key, %error, "guide fetch failed");
        let key = key.clone();
        self.store.update(|s| {
            s.queries.insert(key, QueryStatus::Error { error });
        });
    }

    // --- real-time ---------------------------------------------------------

    /// Topic for the configured channel.
    pub fn topic(&self) -> String {
        wire::guide_topic(&self.config.channel_id)
    }

    /// Join parameters: target params plus the user.
    pub fn join_params(&self) -> Result<JoinParams, GuideError> {
        Ok(JoinParams {
            user_id: self.require_user("subscribe")?,
            data: self.config.data.clone(),
            tenant: self.config.tenant.clone(),
        })
    }

    /// Reconcile one guide event. A closed stage is patched before the store changes.
    pub fn apply_socket_event(&mut self, event: GuideSocketEvent) {
        debug!(
            event = event.event_name(),
            guide_key = event.guide_key(),
            "guide socket event"
        );
        self.maybe_patch();
        self.store
            .update(|s| reconcile::apply_socket_event(s, event));
    }

    /// Decode and reconcile a raw socket frame. Returns whether a guide event was applied.
    pub fn handle_socket_message(&mut self, msg: &SocketMessage) -> Result<bool, WireError> {
        match wire::decode_event(msg, &self.topic())? {
            Some(event) => {
                self.apply_socket_event(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
