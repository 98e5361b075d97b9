// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the Guidepost guide API.
//!
//! Three surfaces share these types:
//!
//! * REST: `GET /v1/users/{user}/guides/{channel}` returns a [`GuidesResponse`];
//!   `PUT /v1/users/{user}/guides/messages/{message}/{status}` records engagement.
//! * Real-time: the `guides:{channel}` topic carries [`wire::SocketMessage`]
//!   envelopes decoded into [`wire::GuideSocketEvent`].
//! * Local state: [`Guide`] and [`GuideGroup`] are stored as received and
//!   replaced wholesale on every fetch or socket update.

mod api;
mod model;
pub mod wire;

pub use api::{
    EngagementBody, EngagementResponse, EngagementStatus, FetchGuidesParams, GuidesResponse,
};
pub use model::{
    ActivationRule, Directive, Guide, GuideGroup, GuideStep, IneligibilityMarker,
    IneligibilityReason, RawUrlPattern, RuleOperator, RuleVariable, StepMessage, Timestamp,
};
