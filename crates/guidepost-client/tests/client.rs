// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! `GuideClient` against the fake API and the in-process socket, on paused
//! tokio time.

use std::time::Duration;

use guidepost_app_core::{ClientPrefs, DebugPrefs};
use guidepost_client::{
    ChannelSocket, ClientError, ClientEvent, GuideClient, SocketError, SocketFeed,
};
use guidepost_core::{Clock, EngineConfig, GuideFilter, QueryStatus, SystemClock};
use guidepost_dry_tests::{
    added_frame, removed_frame, FakeGuideApi, GroupBuilder, GuideBuilder, ResponseBuilder,
    TEST_CHANNEL, TEST_USER,
};
use guidepost_proto::EngagementStatus;

type Client = GuideClient<FakeGuideApi, ChannelSocket>;

fn config() -> EngineConfig {
    EngineConfig::new(TEST_CHANNEL)
        .with_user(TEST_USER)
        .with_order_resolution(Duration::from_millis(100))
}

fn api() -> FakeGuideApi {
    FakeGuideApi::with_response(ResponseBuilder::new().sequenced(&["g1", "g2"]).build())
}

fn socket_client(api: FakeGuideApi) -> (Client, SocketFeed) {
    let (socket, feed) = ChannelSocket::pair();
    (Client::new(config(), api).with_socket(socket), feed)
}

#[tokio::test(start_paused = true)]
async fn fetched_guides_resolve_after_the_staging_window() {
    let api = api();
    let mut client = Client::new(config(), api.clone());
    assert_eq!(client.fetch(None).await.unwrap(), QueryStatus::Ok);

    let calls = api.fetches();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user_id, TEST_USER);
    assert_eq!(calls[0].channel_id, TEST_CHANNEL);

    let any = GuideFilter::any();
    assert!(client.engine_mut().select_guide(&any).is_none());
    assert_eq!(client.next_event().await, ClientEvent::StageTimer(true));
    assert_eq!(client.engine_mut().select_guide(&any).unwrap().key, "g1");
    assert_eq!(client.engine().scheduler().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn fetch_failures_are_recorded_not_returned() {
    let api = api();
    api.fail_fetches(Some("upstream unavailable"));
    let mut client = Client::new(config(), api);
    let status = client.fetch(None).await.unwrap();
    assert_eq!(
        status,
        QueryStatus::Error {
            error: "upstream unavailable".into()
        }
    );
    assert!(client.engine().snapshot().guides.is_empty());
}

#[tokio::test(start_paused = true)]
async fn fetch_without_a_user_is_refused() {
    let api = api();
    let mut client = Client::new(EngineConfig::new(TEST_CHANNEL), api.clone());
    assert!(matches!(
        client.fetch(None).await,
        Err(ClientError::Guide(_))
    ));
    assert!(api.fetches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn discarded_stages_cancel_their_timers() {
    let mut client = Client::new(config(), api()).with_throttle_interval(Duration::from_secs(5));
    client.fetch(None).await.unwrap();
    assert!(client.engine_mut().select_guide(&GuideFilter::any()).is_none());
    assert_eq!(client.engine().scheduler().pending(), 1);

    assert!(client.engine_mut().set_location("https://app.test/settings"));
    assert_eq!(client.engine().scheduler().pending(), 0);
    // Nothing is left to fire before the throttle re-check.
    assert_eq!(client.next_event().await, ClientEvent::ThrottleCheck(false));
    assert!(client.engine().stage().is_none());
}

#[tokio::test(start_paused = true)]
async fn subscribe_without_a_socket_is_a_no_op() {
    let mut client = Client::new(config(), api());
    assert!(!client.subscribe().unwrap());
    assert_eq!(client.joined_topic(), None);
    client.unsubscribe();
}

#[tokio::test(start_paused = true)]
async fn subscribe_joins_the_channel_topic_once() {
    let (mut client, _feed) = socket_client(api());
    assert!(client.subscribe().unwrap());
    assert!(client.subscribe().unwrap());
    assert_eq!(client.joined_topic(), Some("guides:chan"));

    let (topic, params) = client.socket().unwrap().joined().unwrap();
    assert_eq!(topic, "guides:chan");
    assert_eq!(params.user_id, TEST_USER);

    client.cleanup();
    assert!(client.socket().unwrap().joined().is_none());
    assert_eq!(client.joined_topic(), None);
    assert!(!client.engine().location_tracker().is_attached());
}

#[tokio::test(start_paused = true)]
async fn rejected_joins_surface_as_socket_errors() {
    let (mut socket, _feed) = ChannelSocket::pair();
    socket.reject_joins("forbidden");
    let mut client = Client::new(config(), api()).with_socket(socket);
    let err = client.subscribe().unwrap_err();
    assert!(matches!(
        err,
        ClientError::Socket(SocketError::JoinRejected { .. })
    ));
    assert_eq!(client.joined_topic(), None);
}

#[tokio::test(start_paused = true)]
async fn socket_frames_reconcile_the_store() {
    let (mut client, feed) = socket_client(api());
    client.fetch(None).await.unwrap();
    client.subscribe().unwrap();

    let g3 = GuideBuilder::new("g3").build();
    assert!(feed.push(added_frame(TEST_CHANNEL, &g3)));
    assert_eq!(client.next_event().await, ClientEvent::Socket(true));
    assert!(client.engine().snapshot().guide("g3").is_some());

    assert!(feed.push(removed_frame("elsewhere", "g1")));
    assert_eq!(client.next_event().await, ClientEvent::Socket(false));
    assert!(client.engine().snapshot().guide("g1").is_some());

    drop(feed);
    assert_eq!(client.next_event().await, ClientEvent::SocketClosed);
    assert_eq!(client.joined_topic(), None);
}

#[tokio::test(start_paused = true)]
async fn pump_applies_buffered_frames_without_waiting() {
    let (mut client, feed) = socket_client(api());
    client.fetch(None).await.unwrap();
    client.subscribe().unwrap();
    feed.push(removed_frame(TEST_CHANNEL, "g1"));
    feed.push(removed_frame(TEST_CHANNEL, "g2"));

    assert_eq!(client.pump(), 2);
    assert!(client.engine().snapshot().guides.is_empty());
    assert_eq!(client.pump(), 0);
}

#[tokio::test(start_paused = true)]
async fn engagement_is_delivered_in_the_background() {
    let api = api();
    let mut client = Client::new(config(), api.clone());
    client.fetch(None).await.unwrap();
    client.engine_mut().mark_as_seen("g1", "step-1").unwrap();
    client
        .engine_mut()
        .mark_as_interacted("g1", "step-1", None)
        .unwrap();

    assert_eq!(client.close().await, 2);
    let sent = api.engagements();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].status, EngagementStatus::Seen);
    assert_eq!(
        sent[1].path(),
        "/v1/users/user-1/guides/messages/g1-step-1-msg/interacted"
    );
}

#[tokio::test(start_paused = true)]
async fn failed_engagement_keeps_local_state() {
    let api = api();
    api.fail_engagements(Some("500"));
    let mut client = Client::new(config(), api.clone());
    client.fetch(None).await.unwrap();
    client.engine_mut().mark_as_archived("g2", "step-1").unwrap();

    let state = client.engine().snapshot();
    let step = state.guide("g2").unwrap().step("step-1").unwrap();
    assert!(step.message.archived_at.is_some());
    assert_eq!(client.close().await, 0);
    assert_eq!(api.engagements().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn throttle_changes_trigger_a_refresh() {
    let response = ResponseBuilder::new()
        .guide(GuideBuilder::new("g1").build())
        .group(
            GroupBuilder::new("default")
                .sequence(&["g1"])
                .display_interval(3600)
                .build(),
        )
        .display_log("default", SystemClock.now())
        .build();
    let api = FakeGuideApi::with_response(response);

    let mut client = Client::new(config(), api).with_throttle_interval(Duration::from_secs(1));
    client.fetch(None).await.unwrap();
    assert!(client.engine().is_throttled());

    let before = client.engine().snapshot().counter;
    assert_eq!(client.next_event().await, ClientEvent::ThrottleCheck(true));
    assert_eq!(client.engine().snapshot().counter, before + 1);
    assert_eq!(client.next_event().await, ClientEvent::ThrottleCheck(false));
    assert_eq!(client.engine().snapshot().counter, before + 1);
}

#[tokio::test(start_paused = true)]
async fn prefs_configure_channel_user_and_debug() {
    let prefs = ClientPrefs {
        channel_id: Some(TEST_CHANNEL.into()),
        user_id: Some(TEST_USER.into()),
        debug: DebugPrefs {
            forced_guide_key: None,
            skip_staging: true,
        },
        ..ClientPrefs::default()
    };
    let mut client = Client::from_prefs(&prefs, api()).unwrap();
    client.fetch(None).await.unwrap();
    let picked = client.engine_mut().select_guide(&GuideFilter::any());
    assert_eq!(picked.map(|g| g.key.clone()), Some("g1".to_string()));
    assert_eq!(client.engine().scheduler().pending(), 0);

    let missing_channel = ClientPrefs::default();
    assert!(matches!(
        Client::from_prefs(&missing_channel, api()),
        Err(ClientError::Config(_))
    ));
}
