// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! guidepost-core: decides which in-app guide is visible right now.
//!
//! The engine is synchronous and single-owner. Everything asynchronous (the
//! resolution timer, network fetches, socket delivery, engagement `PUT`s) lives
//! behind the ports in [`scheduler`] and [`engagement`], and re-enters the
//! engine through plain method calls:
//!
//! * [`GuideEngine::select_guide`] runs the selection algorithm through the
//!   group staging window.
//! * [`GuideEngine::on_stage_timer`] closes a staging window when its timer fires.
//! * [`GuideEngine::apply_socket_event`] reconciles real-time guide events.
//! * [`GuideEngine::set_location`] / [`GuideEngine::on_navigate`] feed navigation.
//! * `mark_as_seen` / `mark_as_interacted` / `mark_as_archived` apply optimistic
//!   engagement and hand the remote request to an [`EngagementSink`].
#![forbid(unsafe_code)]

mod engine;
mod error;
mod guide;
mod query;
mod reconcile;
mod store;

pub mod engagement;
pub mod location;
pub mod predicate;
pub mod scheduler;
pub mod selection;
pub mod staging;
pub mod url_pattern;

pub use engagement::{EngagementRequest, EngagementSink, StepHandle};
pub use engine::{EngineConfig, GuideEngine};
pub use error::GuideError;
pub use guide::LocalGuide;
pub use location::{LocationTracker, NavigationEvent};
pub use predicate::GuideFilter;
pub use query::{synthetic_default_group, FetchPlan, QueryKey, QueryStatus, DEFAULT_GROUP_KEY};
pub use scheduler::{Clock, StageScheduler, StageTimer, SystemClock};
pub use selection::{SelectOptions, Selection};
pub use staging::{GroupStage, StageStatus};
pub use store::{DebugState, Store, StoreState, SubscriptionId};
