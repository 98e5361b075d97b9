// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! REST request and response payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Guide, GuideGroup, IneligibilityMarker, Timestamp};

/// Query parameters for the guide fetch endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FetchGuidesParams {
    /// Restrict to a single message type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub guide_type: Option<String>,
    /// Tenant scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Targeting data, JSON-encoded on the query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Ask the server to return guides regardless of eligibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_all_guides: Option<bool>,
}

impl FetchGuidesParams {
    /// Query-string pairs, sorted by name, with `data` JSON-encoded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(data) = &self.data {
            pairs.push(("data", data.to_string()));
        }
        if let Some(force) = self.force_all_guides {
            pairs.push(("force_all_guides", force.to_string()));
        }
        if let Some(tenant) = &self.tenant {
            pairs.push(("tenant", tenant.clone()));
        }
        if let Some(ty) = &self.guide_type {
            pairs.push(("type", ty.clone()));
        }
        pairs
    }
}

/// Body of a successful guide fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuidesResponse {
    /// Guides visible to the user.
    #[serde(default)]
    pub entries: Vec<Guide>,
    /// Ordering groups; the first one drives selection.
    #[serde(default)]
    pub guide_groups: Vec<GuideGroup>,
    /// Last display time per group key.
    #[serde(default)]
    pub guide_group_display_logs: BTreeMap<String, Timestamp>,
    /// Guides the server considers ineligible, with reasons.
    #[serde(default)]
    pub ineligible_guides: Vec<IneligibilityMarker>,
}

/// Engagement event kinds recorded against a step message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    /// Step rendered.
    Seen,
    /// User interacted with the step.
    Interacted,
    /// Step dismissed.
    Archived,
}

impl EngagementStatus {
    /// Path segment used by the engagement endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            EngagementStatus::Seen => "seen",
            EngagementStatus::Interacted => "interacted",
            EngagementStatus::Archived => "archived",
        }
    }
}

/// Body of an engagement `PUT`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngagementBody {
    /// Guide channel.
    pub channel_id: String,
    /// Guide key.
    pub guide_key: String,
    /// Guide identifier.
    pub guide_id: String,
    /// Step reference.
    pub guide_step_ref: String,
    /// Rendered step content (seen only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    /// Ambient targeting data (seen only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Ambient tenant (seen only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Caller-supplied metadata (interacted only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Body of an engagement response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementResponse {
    /// `"ok"` on success.
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_are_sorted_and_encode_data() {
        let params = FetchGuidesParams {
            guide_type: Some("banner".into()),
            tenant: Some("acme".into()),
            data: Some(json!({ "plan": "pro" })),
            force_all_guides: None,
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("data", r#"{"plan":"pro"}"#.to_string()),
                ("tenant", "acme".to_string()),
                ("type", "banner".to_string()),
            ]
        );
    }

    #[test]
    fn engagement_body_omits_unset_fields() {
        let body = EngagementBody {
            channel_id: "ch".into(),
            guide_key: "g".into(),
            guide_id: "g_1".into(),
            guide_step_ref: "s1".into(),
            ..EngagementBody::default()
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "channel_id": "ch",
                "guide_key": "g",
                "guide_id": "g_1",
                "guide_step_ref": "s1"
            })
        );
    }

    #[test]
    fn response_defaults_missing_collections() {
        let resp: GuidesResponse = serde_json::from_value(json!({ "entries": [] })).unwrap();
        assert!(resp.guide_groups.is_empty());
        assert!(resp.guide_group_display_logs.is_empty());
        assert!(resp.ineligible_guides.is_empty());
    }
}
