// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Group staging through the engine: open/close/patch, location resets,
//! stale timers and debug overrides.

use std::time::Duration;

use guidepost_core::{DebugState, GuideFilter, NavigationEvent, StageStatus, StageTimer};
use guidepost_dry_tests::{
    updated_frame, EngineHarness, GroupBuilder, GuideBuilder, ResponseBuilder, TEST_CHANNEL,
};
use proptest::prelude::*;

fn banner_and_card() -> EngineHarness {
    let response = ResponseBuilder::new()
        .guide(GuideBuilder::new("g1").guide_type("banner").build())
        .guide(GuideBuilder::new("g2").guide_type("card").build())
        .group(GroupBuilder::new("default").sequence(&["g1", "g2"]).build())
        .build();
    EngineHarness::loaded(response)
}

fn selected(h: &mut EngineHarness, filter: &GuideFilter) -> Option<String> {
    h.engine.select_guide(filter).map(|g| g.key.clone())
}

#[test]
fn competing_views_resolve_to_the_lowest_display_index() {
    let mut h = banner_and_card();
    let card = GuideFilter::by_type("card");
    let banner = GuideFilter::by_type("banner");

    assert_eq!(selected(&mut h, &card), None);
    assert_eq!(selected(&mut h, &banner), None);
    assert_eq!(h.engine.stage().map(|s| s.status()), Some(StageStatus::Open));

    assert_eq!(h.fire_timers(), 1);
    assert_eq!(selected(&mut h, &banner), Some("g1".into()));
    assert_eq!(selected(&mut h, &card), None);
}

#[test]
fn stage_timer_uses_the_configured_window() {
    let config = EngineHarness::config().with_order_resolution(Duration::from_millis(250));
    let mut h = EngineHarness::new(config);
    h.load(ResponseBuilder::new().sequenced(&["a"]).build());
    h.engine.select_guide(&GuideFilter::any());
    assert_eq!(
        h.scheduler.scheduled(),
        vec![(StageTimer::new(1), Duration::from_millis(250))]
    );
}

#[test]
fn closing_bumps_the_render_counter() {
    let mut h = banner_and_card();
    h.engine.select_guide(&GuideFilter::any());
    let before = h.engine.snapshot().counter;
    h.fire_timers();
    assert_eq!(h.engine.snapshot().counter, before + 1);
}

#[test]
fn socket_event_patches_a_closed_stage_and_keeps_the_winner() {
    let mut h = banner_and_card();
    let g1 = GuideFilter::by_key("g1");
    assert_eq!(h.settle(&g1).map(|g| g.key.clone()), Some("g1".into()));

    let g2 = GuideBuilder::new("g2").guide_type("card").semver("2.0.0").build();
    assert!(h
        .engine
        .handle_socket_message(&updated_frame(TEST_CHANNEL, &g2, true))
        .unwrap());

    let stage = h.engine.stage().unwrap();
    assert_eq!(stage.status(), StageStatus::Patch);
    assert!(stage.ordered().is_empty());
    assert_eq!(stage.resolved(), Some("g1"));
    assert_eq!(h.engine.snapshot().guides["g2"].semver, "2.0.0");

    // Still rendered while the patch window is open.
    assert_eq!(selected(&mut h, &g1), Some("g1".into()));
    assert_eq!(h.fire_timers(), 1);
    assert_eq!(selected(&mut h, &g1), Some("g1".into()));
}

#[test]
fn patch_window_can_promote_a_higher_priority_newcomer() {
    let response = ResponseBuilder::new()
        .guide(GuideBuilder::new("g2").build())
        .group(GroupBuilder::new("default").sequence(&["g1", "g2"]).build())
        .build();
    let mut h = EngineHarness::loaded(response);
    let any = GuideFilter::any();
    assert_eq!(h.settle(&any).map(|g| g.key.clone()), Some("g2".into()));

    let g1 = GuideBuilder::new("g1").build();
    h.engine
        .handle_socket_message(&guidepost_dry_tests::added_frame(TEST_CHANNEL, &g1))
        .unwrap();
    assert_eq!(selected(&mut h, &any), None, "g1 is not the resolved guide yet");
    h.fire_timers();
    assert_eq!(selected(&mut h, &any), Some("g1".into()));
}

#[test]
fn socket_events_leave_open_stages_alone() {
    let mut h = banner_and_card();
    h.engine.select_guide(&GuideFilter::any());
    let g2 = GuideBuilder::new("g2").guide_type("card").build();
    h.engine
        .handle_socket_message(&updated_frame(TEST_CHANNEL, &g2, true))
        .unwrap();
    assert_eq!(h.engine.stage().map(|s| s.status()), Some(StageStatus::Open));
    assert_eq!(h.scheduler.scheduled().len(), 1);
}

#[test]
fn location_change_discards_any_stage() {
    let any = GuideFilter::any();

    // open
    let mut h = banner_and_card();
    h.engine.select_guide(&any);
    assert!(h.engine.set_location("/a"));
    assert!(h.engine.stage().is_none());
    assert_eq!(h.scheduler.cancelled(), vec![StageTimer::new(1)]);

    // closed
    h.settle(&any);
    assert!(h.engine.set_location("/b"));
    assert!(h.engine.stage().is_none());

    // patch
    h.settle(&any);
    let g2 = GuideBuilder::new("g2").guide_type("card").build();
    h.engine
        .handle_socket_message(&updated_frame(TEST_CHANNEL, &g2, true))
        .unwrap();
    assert_eq!(h.engine.stage().map(|s| s.status()), Some(StageStatus::Patch));
    assert!(h.engine.set_location("/c"));
    assert!(h.engine.stage().is_none());

    // next selection starts over
    assert_eq!(selected(&mut h, &any), None);
    assert_eq!(h.engine.stage().map(|s| s.status()), Some(StageStatus::Open));
}

#[test]
fn unchanged_location_is_a_no_op() {
    let mut h = banner_and_card();
    assert!(h.engine.set_location("/a"));
    h.engine.select_guide(&GuideFilter::any());
    assert!(!h.engine.set_location("/a"));
    assert!(h.engine.stage().is_some());
}

#[test]
fn navigation_events_funnel_into_set_location() {
    let mut h = banner_and_card();
    assert!(h.engine.on_navigate(&NavigationEvent::Push("/a".into())));
    assert!(!h.engine.on_navigate(&NavigationEvent::Pop("/a".into())));
    assert!(h.engine.on_navigate(&NavigationEvent::HashChange("/a#top".into())));
    assert_eq!(h.engine.snapshot().location.as_deref(), Some("/a#top"));

    h.engine.location_tracker_mut().detach();
    assert!(!h.engine.on_navigate(&NavigationEvent::Replace("/b".into())));
    assert_eq!(h.engine.snapshot().location.as_deref(), Some("/a#top"));
}

#[test]
fn untracked_engines_ignore_navigation() {
    let mut config = EngineHarness::config();
    config.track_location = false;
    let mut h = EngineHarness::new(config);
    assert!(!h.engine.on_navigate(&NavigationEvent::Push("/a".into())));
    assert!(h.engine.set_location("/a"), "explicit set_location still works");
}

#[test]
fn superseded_timers_cannot_close_a_stage() {
    let mut h = banner_and_card();
    let any = GuideFilter::any();

    h.engine.select_guide(&any);
    let stale = h.scheduler.pending()[0];
    h.engine.set_location("/elsewhere");
    h.engine.select_guide(&any);

    assert!(!h.engine.on_stage_timer(stale));
    assert_eq!(h.engine.stage().map(|s| s.status()), Some(StageStatus::Open));
    assert_eq!(h.fire_timers(), 1);

    // A timer from a finished window cannot re-close it either.
    let fresh = h.scheduler.scheduled().last().map(|(t, _)| *t).unwrap();
    assert!(!h.engine.on_stage_timer(fresh));
    assert!(!h.engine.on_stage_timer(StageTimer::new(99)));
}

#[test]
fn timer_without_a_stage_is_ignored() {
    let mut h = banner_and_card();
    assert!(!h.engine.on_stage_timer(StageTimer::new(1)));
}

#[test]
fn forced_guide_skips_staging_rules_and_throttle() {
    let response = ResponseBuilder::new()
        .guide(GuideBuilder::new("g1").build())
        .guide(GuideBuilder::new("preview").allow_equal("/nowhere").build())
        .group(GroupBuilder::new("default").sequence(&["g1", "preview"]).build())
        .build();
    let mut h = EngineHarness::loaded(response);
    h.engine.set_location("/here");
    h.engine.set_debug(DebugState {
        forced_guide_key: Some("preview".into()),
        skip_staging: false,
    });

    assert_eq!(selected(&mut h, &GuideFilter::any()), Some("preview".into()));
    assert_eq!(selected(&mut h, &GuideFilter::by_key("g1")), None);
    assert!(h.engine.stage().is_none());
}

#[test]
fn skip_staging_answers_immediately() {
    let mut h = banner_and_card();
    h.engine.set_debug(DebugState {
        forced_guide_key: None,
        skip_staging: true,
    });
    assert_eq!(selected(&mut h, &GuideFilter::by_type("card")), Some("g2".into()));
    assert!(h.scheduler.scheduled().is_empty());
}

proptest! {
    #[test]
    fn tie_break_ignores_call_order(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
        wanted in prop::collection::btree_set(0..6usize, 1..6),
    ) {
        let keys: Vec<String> = (0..6).map(|i| format!("g{i}")).collect();
        let mut response = ResponseBuilder::new();
        for key in &keys {
            response = response.guide(GuideBuilder::new(key).guide_type(key).build());
        }
        let seq: Vec<&str> = keys.iter().map(String::as_str).collect();
        let mut h = EngineHarness::loaded(
            response.group(GroupBuilder::new("default").sequence(&seq).build()).build(),
        );

        for i in order.iter().filter(|i| wanted.contains(i)) {
            prop_assert!(h.engine.select_guide(&GuideFilter::by_type(&keys[*i])).is_none());
        }
        h.fire_timers();

        let lowest = *wanted.iter().next().unwrap();
        prop_assert_eq!(h.engine.stage().and_then(|s| s.resolved()), Some(keys[lowest].as_str()));
    }
}
