// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Selection algorithm: walk the default group's display sequence and keep the
//! eligible guides. Lower index means higher priority. Pure function of the
//! state, filter, options and `now`.

use std::sync::Arc;

use chrono::TimeDelta;
use guidepost_proto::Timestamp;

use crate::guide::LocalGuide;
use crate::predicate::{self, GuideFilter};
use crate::store::StoreState;

/// Selection switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Ignore the group display interval.
    pub include_throttled: bool,
}

/// A candidate and its position in the display sequence.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Index in the default group's `display_sequence`.
    pub index: usize,
    /// The guide.
    pub guide: Arc<LocalGuide>,
}

impl Selection {
    /// Guide key.
    pub fn key(&self) -> &str {
        &self.guide.key
    }
}

/// Whether the default group's display interval is still running at `now`.
pub fn is_throttled(state: &StoreState, now: Timestamp) -> bool {
    let Some(group) = state.default_group() else {
        return false;
    };
    let Some(interval) = group.display_interval else {
        return false;
    };
    let Some(last) = state.guide_group_display_logs.get(&group.key) else {
        return false;
    };
    let Some(window) = i64::try_from(interval).ok().and_then(TimeDelta::try_seconds) else {
        return true;
    };
    match last.checked_add_signed(window) {
        Some(until) => now < until,
        None => true,
    }
}

fn candidates<'a>(
    state: &'a StoreState,
    filter: &'a GuideFilter,
    opts: SelectOptions,
    now: Timestamp,
) -> impl Iterator<Item = Selection> + 'a {
    let pathname = state
        .location
        .as_deref()
        .and_then(predicate::location_pathname);
    let throttled = !opts.include_throttled && is_throttled(state, now);
    state
        .default_group()
        .into_iter()
        .flat_map(|group| group.display_sequence.iter().enumerate())
        .filter_map(move |(index, key)| {
            let guide = state.guides.get(key)?;
            if throttled && !guide.bypass_global_group_limit {
                return None;
            }
            if !predicate::is_eligible(guide, filter, pathname.as_deref()) {
                return None;
            }
            Some(Selection {
                index,
                guide: Arc::clone(guide),
            })
        })
}

/// First eligible guide in display order.
pub fn select_guide(
    state: &StoreState,
    filter: &GuideFilter,
    opts: SelectOptions,
    now: Timestamp,
) -> Option<Selection> {
    candidates(state, filter, opts, now).next()
}

/// Every eligible guide in display order.
pub fn select_guides(
    state: &StoreState,
    filter: &GuideFilter,
    opts: SelectOptions,
    now: Timestamp,
) -> Vec<Selection> {
    candidates(state, filter, opts, now).collect()
}

/// The debug-forced guide, if one is set, stored, and accepted by `filter`.
///
/// URL rules and throttling do not apply to it.
pub fn select_forced(state: &StoreState, filter: &GuideFilter) -> Option<Selection> {
    let key = state.debug.forced_guide_key.as_deref()?;
    let guide = state.guides.get(key)?;
    if !filter.matches(guide) {
        return None;
    }
    let index = state
        .default_group()
        .and_then(|g| g.display_sequence.iter().position(|k| k == key))
        .unwrap_or(0);
    Some(Selection {
        index,
        guide: Arc::clone(guide),
    })
}
