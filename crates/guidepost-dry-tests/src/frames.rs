// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Socket frames as the server sends them.

use guidepost_proto::wire::{
    guide_topic, SocketMessage, EVENT_GUIDE_ADDED, EVENT_GUIDE_REMOVED, EVENT_GUIDE_UPDATED,
};
use guidepost_proto::Guide;
use serde_json::json;

/// `guide.added` on `channel_id`'s topic.
pub fn added_frame(channel_id: &str, guide: &Guide) -> SocketMessage {
    SocketMessage {
        topic: guide_topic(channel_id),
        event: EVENT_GUIDE_ADDED.to_string(),
        data: json!({ "guide": guide }),
    }
}

/// `guide.updated` on `channel_id`'s topic.
pub fn updated_frame(channel_id: &str, guide: &Guide, eligible: bool) -> SocketMessage {
    SocketMessage {
        topic: guide_topic(channel_id),
        event: EVENT_GUIDE_UPDATED.to_string(),
        data: json!({ "guide": guide, "eligible": eligible }),
    }
}

/// `guide.removed` on `channel_id`'s topic.
pub fn removed_frame(channel_id: &str, guide_key: &str) -> SocketMessage {
    SocketMessage {
        topic: guide_topic(channel_id),
        event: EVENT_GUIDE_REMOVED.to_string(),
        data: json!({ "guide": { "key": guide_key } }),
    }
}
