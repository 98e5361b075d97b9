// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Guide, step and group records as served by the guide API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock timestamp used for engagement and display logs (RFC 3339 on the wire).
pub type Timestamp = DateTime<Utc>;

/// Whether a URL rule admits or rejects a guide when it matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Matching makes the guide eligible.
    Allow,
    /// Matching makes the guide ineligible; wins over any allow match.
    Block,
}

/// Location component a rule is tested against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleVariable {
    /// URL pathname (`/dashboard/settings`).
    Pathname,
    /// Any variable this client does not understand; never matches.
    #[serde(other)]
    Unsupported,
}

/// Comparison performed between the location variable and the rule argument.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    /// Exact match; the argument is normalized to carry a leading slash.
    EqualTo,
    /// Substring match.
    Contains,
}

/// Structured URL activation rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationRule {
    /// Allow or block.
    pub directive: Directive,
    /// Location component under test.
    pub variable: RuleVariable,
    /// Comparison operator.
    pub operator: RuleOperator,
    /// Right-hand side of the comparison.
    pub argument: String,
}

/// URL activation rule expressed as a pathname pattern (`/users/:id/*`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawUrlPattern {
    /// Allow or block.
    pub directive: Directive,
    /// Pathname pattern source.
    pub pathname: String,
}

/// Engagement state of a single guide step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepMessage {
    /// Message identifier used by the engagement endpoints.
    pub id: String,
    /// First time the step was rendered.
    #[serde(default)]
    pub seen_at: Option<Timestamp>,
    /// Last time the step was read.
    #[serde(default)]
    pub read_at: Option<Timestamp>,
    /// Last time the user interacted with the step.
    #[serde(default)]
    pub interacted_at: Option<Timestamp>,
    /// Time the step was dismissed for good.
    #[serde(default)]
    pub archived_at: Option<Timestamp>,
    /// Last time a link inside the step was followed.
    #[serde(default)]
    pub link_clicked_at: Option<Timestamp>,
}

/// A renderable unit within a guide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuideStep {
    /// Step reference, unique within its guide.
    #[serde(rename = "ref")]
    pub step_ref: String,
    /// Message-type schema key (e.g. `banner`).
    #[serde(default)]
    pub schema_key: String,
    /// Message-type schema version.
    #[serde(default)]
    pub schema_semver: String,
    /// Message-type schema variant (e.g. `default`).
    #[serde(default)]
    pub schema_variant_key: String,
    /// Engagement state.
    pub message: StepMessage,
    /// Opaque per-schema payload rendered by the view layer.
    #[serde(default)]
    pub content: serde_json::Value,
}

/// An in-app guide definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guide {
    /// Server identifier.
    pub id: String,
    /// Stable key; guides are stored and ordered by key.
    pub key: String,
    /// Guide channel the guide belongs to.
    pub channel_id: String,
    /// Message type (banner, card, modal, ...).
    #[serde(rename = "type")]
    pub guide_type: String,
    /// Guide version.
    #[serde(default)]
    pub semver: String,
    /// Whether the guide is published and active.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<GuideStep>,
    /// Structured URL rules.
    #[serde(default)]
    pub activation_url_rules: Vec<ActivationRule>,
    /// Pathname-pattern URL rules; take precedence over `activation_url_rules` when present.
    #[serde(default)]
    pub activation_url_patterns: Vec<RawUrlPattern>,
    /// Exempt from the group display interval.
    #[serde(default)]
    pub bypass_global_group_limit: bool,
    /// Creation time.
    pub inserted_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

fn default_active() -> bool {
    true
}

/// Ordering and throttling context for guides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuideGroup {
    /// Group key.
    pub key: String,
    /// Guide keys, highest priority first.
    #[serde(default)]
    pub display_sequence: Vec<String>,
    /// Minimum seconds between two displays from this group.
    #[serde(default)]
    pub display_interval: Option<u64>,
    /// Creation time.
    #[serde(default)]
    pub inserted_at: Option<Timestamp>,
    /// Last modification time.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Why the server considers a guide ineligible right now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    /// Guide is not active.
    GuideNotActive,
    /// All steps were archived by this user.
    MarkedAsArchived,
    /// Targeting conditions evaluate to false.
    TargetConditionsNotMet,
    /// User is not in the target audience.
    NotInTargetAudience,
    /// Reason this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Server-asserted ineligibility for one guide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IneligibilityMarker {
    /// Guide key.
    pub key: String,
    /// Machine-readable reason.
    pub reason: IneligibilityReason,
    /// Human-readable explanation.
    #[serde(default)]
    pub message: String,
}
