// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Store-side half of real-time reconciliation. Staging is handled by the engine
//! before this runs.

use std::sync::Arc;

use guidepost_proto::wire::GuideSocketEvent;
use guidepost_proto::Guide;

use crate::guide::LocalGuide;
use crate::store::StoreState;

pub(crate) fn apply_socket_event(state: &mut StoreState, event: GuideSocketEvent) {
    match event {
        GuideSocketEvent::Added { guide }
        | GuideSocketEvent::Updated {
            guide,
            eligible: true,
        } => upsert(state, *guide),
        GuideSocketEvent::Updated {
            guide,
            eligible: false,
        } => remove(state, &guide.key),
        GuideSocketEvent::Removed { guide } => remove(state, &guide.key),
    }
    state.counter += 1;
}

fn upsert(state: &mut StoreState, guide: Guide) {
    let key = guide.key.clone();
    state.ineligible_guides.remove(&key);
    if state.synthetic_group {
        if let Some(group) = state.guide_groups.first_mut() {
            if !group.display_sequence.contains(&key) {
                group.display_sequence.push(key.clone());
            }
        }
    }
    state
        .guides
        .insert(key, Arc::new(LocalGuide::from_guide(guide)));
}

fn remove(state: &mut StoreState, key: &str) {
    state.guides.remove(key);
}
