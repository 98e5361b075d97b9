// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Real-time channel framing for the `guides:{channel}` topic.
//!
//! Frames are JSON text:
//!
//! ``{"topic": "guides:<channel>", "event": "guide.added", "data": {...}}``
//!
//! * `guide.added`   – `data = {"guide": Guide}`
//! * `guide.updated` – `data = {"guide": Guide, "eligible": bool}`
//! * `guide.removed` – `data = {"guide": {"key": ..}}`
//!
//! Any other event on the topic (joins, replies, heartbeats) decodes to `None`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Guide;

/// Topic prefix for guide channels.
pub const GUIDE_TOPIC_PREFIX: &str = "guides:";
/// Event name for a newly visible guide.
pub const EVENT_GUIDE_ADDED: &str = "guide.added";
/// Event name for a changed guide.
pub const EVENT_GUIDE_UPDATED: &str = "guide.updated";
/// Event name for a withdrawn guide.
pub const EVENT_GUIDE_REMOVED: &str = "guide.removed";

/// Topic name for a guide channel.
pub fn guide_topic(channel_id: &str) -> String {
    format!("{GUIDE_TOPIC_PREFIX}{channel_id}")
}

/// Errors raised while decoding socket frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame or payload is not valid JSON for the expected shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Frame arrived on a topic other than the guide topic.
    #[error("unexpected topic {actual:?} (expected {expected:?})")]
    TopicMismatch {
        /// Topic the decoder was asked for.
        expected: String,
        /// Topic carried by the frame.
        actual: String,
    },
}

/// Generic socket envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketMessage {
    /// Channel topic.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SocketMessage {
    /// Parse a text frame.
    pub fn from_text(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render as a text frame.
    pub fn to_text(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Minimal guide reference carried by removal events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuideRef {
    /// Guide key.
    pub key: String,
    /// Guide identifier, when sent.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct AddedPayload {
    guide: Guide,
}

#[derive(Serialize, Deserialize)]
struct UpdatedPayload {
    guide: Guide,
    eligible: bool,
}

#[derive(Serialize, Deserialize)]
struct RemovedPayload {
    guide: GuideRef,
}

/// Decoded guide event.
#[derive(Debug, Clone, PartialEq)]
pub enum GuideSocketEvent {
    /// A guide became visible (`guide.added`).
    Added {
        /// Full guide record.
        guide: Box<Guide>,
    },
    /// A guide changed (`guide.updated`).
    Updated {
        /// Full guide record.
        guide: Box<Guide>,
        /// Whether the guide is still eligible for this user.
        eligible: bool,
    },
    /// A guide was withdrawn (`guide.removed`).
    Removed {
        /// Reference to the withdrawn guide.
        guide: GuideRef,
    },
}

impl GuideSocketEvent {
    /// Key of the guide the event concerns.
    pub fn guide_key(&self) -> &str {
        match self {
            GuideSocketEvent::Added { guide } | GuideSocketEvent::Updated { guide, .. } => {
                &guide.key
            }
            GuideSocketEvent::Removed { guide } => &guide.key,
        }
    }

    /// Canonical event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            GuideSocketEvent::Added { .. } => EVENT_GUIDE_ADDED,
            GuideSocketEvent::Updated { .. } => EVENT_GUIDE_UPDATED,
            GuideSocketEvent::Removed { .. } => EVENT_GUIDE_REMOVED,
        }
    }
}

/// Decode a guide event from an envelope received on `topic`.
///
/// Returns `Ok(None)` for events that are not guide events.
pub fn decode_event(
    msg: &SocketMessage,
    topic: &str,
) -> Result<Option<GuideSocketEvent>, WireError> {
    if msg.topic != topic {
        return Err(WireError::TopicMismatch {
            expected: topic.to_string(),
            actual: msg.topic.clone(),
        });
    }
    let data = msg.data.clone();
    let event = match msg.event.as_str() {
        EVENT_GUIDE_ADDED => {
            let p: AddedPayload = serde_json::from_value(data)?;
            GuideSocketEvent::Added {
                guide: Box::new(p.guide),
            }
        }
        EVENT_GUIDE_UPDATED => {
            let p: UpdatedPayload = serde_json::from_value(data)?;
            GuideSocketEvent::Updated {
                guide: Box::new(p.guide),
                eligible: p.eligible,
            }
        }
        EVENT_GUIDE_REMOVED => {
            let p: RemovedPayload = serde_json::from_value(data)?;
            GuideSocketEvent::Removed { guide: p.guide }
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Wrap a guide event in an envelope for `topic`.
pub fn encode_event(event: &GuideSocketEvent, topic: &str) -> Result<SocketMessage, WireError> {
    let data = match event {
        GuideSocketEvent::Added { guide } => serde_json::to_value(AddedPayload {
            guide: (**guide).clone(),
        })?,
        GuideSocketEvent::Updated { guide, eligible } => serde_json::to_value(UpdatedPayload {
            guide: (**guide).clone(),
            eligible: *eligible,
        })?,
        GuideSocketEvent::Removed { guide } => serde_json::to_value(RemovedPayload {
            guide: guide.clone(),
        })?,
    };
    Ok(SocketMessage {
        topic: topic.to_string(),
        event: event.event_name().to_string(),
        data,
    })
}

/// Parameters sent when joining the guide topic: target params plus `user_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JoinParams {
    /// Authenticated user.
    pub user_id: String,
    /// Targeting data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Tenant scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guide_json(key: &str) -> serde_json::Value {
        json!({
            "id": format!("{key}_id"),
            "key": key,
            "channel_id": "ch_1",
            "type": "card",
            "inserted_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    #[test]
    fn decodes_updated_with_eligibility_flag() {
        let text = json!({
            "topic": "guides:ch_1",
            "event": "guide.updated",
            "data": { "guide": guide_json("g2"), "eligible": false }
        })
        .to_string();
        let msg = SocketMessage::from_text(&text).unwrap();
        let event = decode_event(&msg, &guide_topic("ch_1")).unwrap().unwrap();
        match event {
            GuideSocketEvent::Updated { guide, eligible } => {
                assert_eq!(guide.key, "g2");
                assert!(!eligible);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn updated_without_eligibility_flag_is_rejected() {
        let msg = SocketMessage {
            topic: "guides:ch_1".into(),
            event: EVENT_GUIDE_UPDATED.into(),
            data: json!({ "guide": guide_json("g2") }),
        };
        assert!(matches!(
            decode_event(&msg, "guides:ch_1"),
            Err(WireError::Json(_))
        ));
    }

    #[test]
    fn removed_only_needs_a_key() {
        let msg = SocketMessage {
            topic: "guides:ch_1".into(),
            event: EVENT_GUIDE_REMOVED.into(),
            data: json!({ "guide": { "key": "g1" } }),
        };
        let event = decode_event(&msg, "guides:ch_1").unwrap().unwrap();
        assert_eq!(event.guide_key(), "g1");
    }

    #[test]
    fn control_events_are_ignored_and_foreign_topics_rejected() {
        let reply = SocketMessage {
            topic: "guides:ch_1".into(),
            event: "phx_reply".into(),
            data: json!({ "status": "ok" }),
        };
        assert!(decode_event(&reply, "guides:ch_1").unwrap().is_none());

        let foreign = SocketMessage {
            topic: "feeds:ch_1".into(),
            ..reply
        };
        assert!(matches!(
            decode_event(&foreign, "guides:ch_1"),
            Err(WireError::TopicMismatch { .. })
        ));
    }

    #[test]
    fn encoded_added_event_decodes_back_to_the_same_guide() {
        let guide: Guide = serde_json::from_value(guide_json("g1")).unwrap();
        let event = GuideSocketEvent::Added {
            guide: Box::new(guide),
        };
        let msg = encode_event(&event, "guides:ch_1").unwrap();
        assert_eq!(msg.event, "guide.added");
        let back = decode_event(&msg, "guides:ch_1").unwrap().unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn join_params_flatten_targeting() {
        let params = JoinParams {
            user_id: "u1".into(),
            data: None,
            tenant: Some("acme".into()),
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({ "user_id": "u1", "tenant": "acme" })
        );
    }
}
