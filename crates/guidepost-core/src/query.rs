// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fetch bookkeeping: canonical query keys, status, and merging responses.

use std::fmt;
use std::sync::Arc;

use guidepost_proto::{FetchGuidesParams, Guide, GuideGroup, GuidesResponse};

use crate::guide::LocalGuide;
use crate::store::StoreState;

/// Key of the group manufactured when the server returns none.
pub const DEFAULT_GROUP_KEY: &str = "default";

/// Canonical string identifying a fetch, e.g. `guides?tenant=acme&type=banner`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Key for a parameter set; equal parameter sets produce equal keys.
    pub fn for_params(params: &FetchGuidesParams) -> Self {
        let pairs = params.query_pairs();
        if pairs.is_empty() {
            return Self("guides".to_string());
        }
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!("guides?{query}"))
    }

    /// Key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// Request in flight.
    Loading,
    /// Last request succeeded.
    Ok,
    /// Last request failed; guide data was left untouched.
    Error {
        /// Rendered failure.
        error: String,
    },
}

/// What a caller should do after [`crate::GuideEngine::begin_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// Issue the request, then report back under this key.
    Request(QueryKey),
    /// An identical request is already in flight.
    InFlight(QueryKey),
}

/// Default group ordering guides by insertion time, then key.
pub fn synthetic_default_group<'a>(guides: impl IntoIterator<Item = &'a Guide>) -> GuideGroup {
    let mut ordered: Vec<&Guide> = guides.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.inserted_at
            .cmp(&b.inserted_at)
            .then_with(|| a.key.cmp(&b.key))
    });
    GuideGroup {
        key: DEFAULT_GROUP_KEY.to_string(),
        display_sequence: ordered.into_iter().map(|g| g.key.clone()).collect(),
        display_interval: None,
        inserted_at: None,
        updated_at: None,
    }
}

pub(crate) fn apply_fetch_result(state: &mut StoreState, key: QueryKey, response: GuidesResponse) {
    let GuidesResponse {
        entries,
        guide_groups,
        guide_group_display_logs,
        ineligible_guides,
    } = response;

    state.synthetic_group = guide_groups.is_empty();
    state.guide_groups = if state.synthetic_group {
        vec![synthetic_default_group(&entries)]
    } else {
        guide_groups
    };
    state.guides = entries
        .into_iter()
        .map(|g| (g.key.clone(), Arc::new(LocalGuide::from_guide(g))))
        .collect();
    state.guide_group_display_logs = guide_group_display_logs;
    state.ineligible_guides = ineligible_guides
        .into_iter()
        .map(|m| (m.key.clone(), m))
        .collect();
    state.queries.insert(key, QueryStatus::Ok);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_params_share_a_key() {
        let a = FetchGuidesParams {
            guide_type: Some("banner".into()),
            tenant: Some("acme".into()),
            ..Default::default()
        };
        let b = FetchGuidesParams {
            tenant: Some("acme".into()),
            guide_type: Some("banner".into()),
            ..Default::default()
        };
        assert_eq!(QueryKey::for_params(&a), QueryKey::for_params(&b));
        assert_eq!(
            QueryKey::for_params(&a).as_str(),
            "guides?tenant=acme&type=banner"
        );
        assert_eq!(
            QueryKey::for_params(&FetchGuidesParams::default()).as_str(),
            "guides"
        );
    }

    #[test]
    fn data_key_order_does_not_change_the_key() {
        let a = FetchGuidesParams {
            data: Some(json!({ "a": 1, "b": 2 })),
            ..Default::default()
        };
        let b = FetchGuidesParams {
            data: Some(json!({ "b": 2, "a": 1 })),
            ..Default::default()
        };
        assert_eq!(QueryKey::for_params(&a), QueryKey::for_params(&b));
    }

    #[test]
    fn synthetic_group_orders_by_insertion_then_key() {
        let guide = |key: &str, at: &str| -> Guide {
            serde_json::from_value(json!({
                "id": key, "key": key, "channel_id": "c", "type": "banner",
                "inserted_at": at, "updated_at": at
            }))
            .unwrap()
        };
        let guides = [
            guide("late", "2025-03-01T00:00:00Z"),
            guide("b", "2025-01-01T00:00:00Z"),
            guide("a", "2025-01-01T00:00:00Z"),
        ];
        let group = synthetic_default_group(&guides);
        assert_eq!(group.key, DEFAULT_GROUP_KEY);
        assert_eq!(group.display_sequence, vec!["a", "b", "late"]);
    }
}
