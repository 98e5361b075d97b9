// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builders for guides, groups and fetch responses.

use chrono::DateTime;
use guidepost_proto::{
    ActivationRule, Directive, Guide, GuideGroup, GuideStep, GuidesResponse, IneligibilityMarker,
    IneligibilityReason, RawUrlPattern, RuleOperator, RuleVariable, StepMessage, Timestamp,
};
use serde_json::json;

const BASE_EPOCH_SECS: i64 = 1_735_689_600;

/// `2025-01-01T00:00:00Z` plus `secs` seconds.
pub fn ts(secs: i64) -> Timestamp {
    DateTime::from_timestamp(BASE_EPOCH_SECS + secs, 0).unwrap_or_default()
}

/// Builder for [`Guide`] records.
///
/// Guides start active, typed `banner`, with a single step `"step-1"` whose
/// message id is `"{key}-step-1-msg"`.
///
/// # Example
///
/// ```
/// use guidepost_dry_tests::GuideBuilder;
///
/// let guide = GuideBuilder::new("welcome")
///     .guide_type("card")
///     .allow_equal("/dashboard")
///     .build();
///
/// assert_eq!(guide.guide_type, "card");
/// assert_eq!(guide.activation_url_rules.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GuideBuilder {
    guide: Guide,
}

impl GuideBuilder {
    /// Guide `key` with one unseen step.
    pub fn new(key: &str) -> Self {
        let guide = Guide {
            id: format!("{key}-id"),
            key: key.to_string(),
            channel_id: "chan".to_string(),
            guide_type: "banner".to_string(),
            semver: "1.0.0".to_string(),
            active: true,
            steps: Vec::new(),
            activation_url_rules: Vec::new(),
            activation_url_patterns: Vec::new(),
            bypass_global_group_limit: false,
            inserted_at: ts(0),
            updated_at: ts(0),
        };
        Self { guide }.step("step-1")
    }

    /// Message type.
    pub fn guide_type(mut self, guide_type: &str) -> Self {
        self.guide.guide_type = guide_type.to_string();
        self
    }

    /// Channel.
    pub fn channel(mut self, channel_id: &str) -> Self {
        self.guide.channel_id = channel_id.to_string();
        self
    }

    /// Creation time.
    pub fn inserted_at(mut self, at: Timestamp) -> Self {
        self.guide.inserted_at = at;
        self
    }

    /// Version string.
    pub fn semver(mut self, semver: &str) -> Self {
        self.guide.semver = semver.to_string();
        self
    }

    /// Exempt from the group display interval.
    pub fn bypass_group_limit(mut self) -> Self {
        self.guide.bypass_global_group_limit = true;
        self
    }

    /// Drop every step (including the default one).
    pub fn no_steps(mut self) -> Self {
        self.guide.steps.clear();
        self
    }

    /// Append an unseen step.
    pub fn step(mut self, step_ref: &str) -> Self {
        let message = StepMessage {
            id: format!("{}-{step_ref}-msg", self.guide.key),
            ..StepMessage::default()
        };
        self.guide.steps.push(GuideStep {
            step_ref: step_ref.to_string(),
            schema_key: self.guide.guide_type.clone(),
            schema_semver: "0.0.1".to_string(),
            schema_variant_key: "default".to_string(),
            message,
            content: json!({ "title": format!("{} {step_ref}", self.guide.key) }),
        });
        self
    }

    /// Mark `step_ref` as seen at `at`.
    pub fn seen(mut self, step_ref: &str, at: Timestamp) -> Self {
        if let Some(step) = self.guide.steps.iter_mut().find(|s| s.step_ref == step_ref) {
            step.message.seen_at = Some(at);
        }
        self
    }

    /// Structured rule.
    pub fn rule(mut self, directive: Directive, operator: RuleOperator, argument: &str) -> Self {
        self.guide.activation_url_rules.push(ActivationRule {
            directive,
            variable: RuleVariable::Pathname,
            operator,
            argument: argument.to_string(),
        });
        self
    }

    /// `allow pathname equal_to argument`.
    pub fn allow_equal(self, argument: &str) -> Self {
        self.rule(Directive::Allow, RuleOperator::EqualTo, argument)
    }

    /// `block pathname contains argument`.
    pub fn block_contains(self, argument: &str) -> Self {
        self.rule(Directive::Block, RuleOperator::Contains, argument)
    }

    /// Pathname pattern rule.
    pub fn pattern(mut self, directive: Directive, pathname: &str) -> Self {
        self.guide.activation_url_patterns.push(RawUrlPattern {
            directive,
            pathname: pathname.to_string(),
        });
        self
    }

    /// Finish.
    pub fn build(self) -> Guide {
        self.guide
    }
}

/// Builder for [`GuideGroup`] records.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    group: GuideGroup,
}

impl GroupBuilder {
    /// Empty group `key`.
    pub fn new(key: &str) -> Self {
        Self {
            group: GuideGroup {
                key: key.to_string(),
                display_sequence: Vec::new(),
                display_interval: None,
                inserted_at: Some(ts(0)),
                updated_at: Some(ts(0)),
            },
        }
    }

    /// Display sequence, highest priority first.
    pub fn sequence(mut self, keys: &[&str]) -> Self {
        self.group.display_sequence = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    /// Display interval in seconds.
    pub fn display_interval(mut self, secs: u64) -> Self {
        self.group.display_interval = Some(secs);
        self
    }

    /// Finish.
    pub fn build(self) -> GuideGroup {
        self.group
    }
}

/// Builder for [`GuidesResponse`] payloads.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuilder {
    response: GuidesResponse,
}

impl ResponseBuilder {
    /// Empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a guide.
    pub fn guide(mut self, guide: Guide) -> Self {
        self.response.entries.push(guide);
        self
    }

    /// Add a group.
    pub fn group(mut self, group: GuideGroup) -> Self {
        self.response.guide_groups.push(group);
        self
    }

    /// Add guides `keys` (default builder) and a `"default"` group listing them in order.
    pub fn sequenced(mut self, keys: &[&str]) -> Self {
        for key in keys {
            self.response.entries.push(GuideBuilder::new(key).build());
        }
        self.group(GroupBuilder::new("default").sequence(keys).build())
    }

    /// Record the last display time for `group_key`.
    pub fn display_log(mut self, group_key: &str, at: Timestamp) -> Self {
        self.response
            .guide_group_display_logs
            .insert(group_key.to_string(), at);
        self
    }

    /// Add an ineligibility marker.
    pub fn ineligible(mut self, key: &str, reason: IneligibilityReason) -> Self {
        self.response.ineligible_guides.push(IneligibilityMarker {
            key: key.to_string(),
            reason,
            message: String::new(),
        });
        self
    }

    /// Finish.
    pub fn build(self) -> GuidesResponse {
        self.response
    }
}
