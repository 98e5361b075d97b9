// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine harness wired to the manual doubles.

use std::sync::Arc;
use std::time::Duration;

use guidepost_core::{EngineConfig, FetchPlan, GuideEngine, GuideFilter, LocalGuide};
use guidepost_proto::GuidesResponse;

use crate::ports::{FixedClock, ManualScheduler, RecordingSink};

/// Engine type used throughout the test suites.
pub type TestEngine = GuideEngine<ManualScheduler, RecordingSink, FixedClock>;

/// Channel the harness engine is configured for.
pub const TEST_CHANNEL: &str = "chan";

/// Test user.
pub const TEST_USER: &str = "user-1";

/// An engine plus handles to its scheduler, sink and clock.
///
/// # Example
///
/// ```
/// use guidepost_core::GuideFilter;
/// use guidepost_dry_tests::{EngineHarness, ResponseBuilder};
///
/// let mut h = EngineHarness::loaded(ResponseBuilder::new().sequenced(&["a", "b"]).build());
/// assert!(h.engine.select_guide(&GuideFilter::any()).is_none());
/// h.fire_timers();
/// assert_eq!(h.engine.select_guide(&GuideFilter::any()).unwrap().key, "a");
/// ```
#[derive(Debug)]
pub struct EngineHarness {
    /// The engine under test.
    pub engine: TestEngine,
    /// Scheduler handle.
    pub scheduler: ManualScheduler,
    /// Sink handle.
    pub sink: RecordingSink,
    /// Clock handle.
    pub clock: FixedClock,
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new(Self::config())
    }
}

impl EngineHarness {
    /// Authenticated config for [`TEST_CHANNEL`] with a zero staging window.
    pub fn config() -> EngineConfig {
        EngineConfig::new(TEST_CHANNEL)
            .with_user(TEST_USER)
            .with_order_resolution(Duration::ZERO)
    }

    /// Harness around `config`.
    pub fn new(config: EngineConfig) -> Self {
        let scheduler = ManualScheduler::new();
        let sink = RecordingSink::new();
        let clock = FixedClock::default();
        let engine = GuideEngine::with_clock(config, scheduler.clone(), sink.clone(), clock.clone());
        Self {
            engine,
            scheduler,
            sink,
            clock,
        }
    }

    /// Default harness with `response` already fetched.
    pub fn loaded(response: GuidesResponse) -> Self {
        let mut harness = Self::default();
        harness.load(response);
        harness
    }

    /// Run a fetch with the engine's default params and merge `response`.
    /// Returns false if the engine refused (no user) or the query was in flight.
    pub fn load(&mut self, response: GuidesResponse) -> bool {
        let params = self.engine.default_fetch_params();
        match self.engine.begin_fetch(&params) {
            Ok(FetchPlan::Request(key)) => {
                self.engine.complete_fetch(&key, response);
                true
            }
            Ok(FetchPlan::InFlight(_)) | Err(_) => false,
        }
    }

    /// Deliver every pending timer. Returns how many closed a stage.
    pub fn fire_timers(&mut self) -> usize {
        self.scheduler
            .take_pending()
            .into_iter()
            .filter(|timer| self.engine.on_stage_timer(*timer))
            .count()
    }

    /// Select, fire the staging timer, select again: the settled answer for `filter`.
    pub fn settle(&mut self, filter: &GuideFilter) -> Option<Arc<LocalGuide>> {
        if let Some(guide) = self.engine.select_guide(filter) {
            return Some(guide);
        }
        self.fire_timers();
        self.engine.select_guide(filter)
    }
}
