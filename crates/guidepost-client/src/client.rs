// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `GuideClient`: owns a [`GuideEngine`] and feeds it timers, socket frames
//! and fetch results.

use std::sync::Arc;
use std::time::Duration;

use guidepost_app_core::{ClientPrefs, ConfigError};
use guidepost_core::{
    DebugState, EngineConfig, FetchPlan, GuideEngine, GuideError, QueryStatus, StageTimer,
};
use guidepost_proto::wire::SocketMessage;
use guidepost_proto::FetchGuidesParams;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, GuideApi};
use crate::dispatch::{spawn_engagement_worker, ChannelSink};
use crate::scheduler::TokioScheduler;
use crate::socket::{GuideSocket, SocketError};

/// Engine type driven by [`GuideClient`].
pub type ClientEngine = GuideEngine<TokioScheduler, ChannelSink>;

/// Client-level failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Engine precondition (authentication).
    #[error(transparent)]
    Guide(#[from] GuideError),
    /// REST failure.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Socket failure.
    #[error(transparent)]
    Socket(#[from] SocketError),
    /// Missing or invalid settings.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What [`GuideClient::next_event`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// A staging timer fired; `true` when it closed the current stage.
    StageTimer(bool),
    /// A socket frame arrived; `true` when it carried a guide event.
    Socket(bool),
    /// The throttle re-check ran; `true` when the throttle state flipped.
    ThrottleCheck(bool),
    /// The socket closed.
    SocketClosed,
}

/// Engine config derived from prefs: channel, user, staging window, tracking.
pub fn engine_config(prefs: &ClientPrefs) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::new(prefs.require_channel()?)
        .with_order_resolution(prefs.order_resolution_duration());
    config.user_id = prefs.user_id.clone();
    config.track_location = prefs.track_location;
    Ok(config)
}

enum Input {
    Timer(Option<StageTimer>),
    Frame(Option<SocketMessage>),
    Throttle,
}

/// Async owner of a guide engine.
///
/// Construct inside a tokio runtime: the engagement worker and staging timers
/// are spawned on it.
pub struct GuideClient<A, K> {
    engine: ClientEngine,
    api: Arc<A>,
    socket: Option<K>,
    joined: Option<String>,
    timers: UnboundedReceiver<StageTimer>,
    worker: JoinHandle<usize>,
    throttle_interval: Duration,
    next_throttle_check: Instant,
    last_throttled: bool,
}

impl<A, K> std::fmt::Debug for GuideClient<A, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuideClient")
            .field("engine", &self.engine)
            .field("joined", &self.joined)
            .field("throttle_interval", &self.throttle_interval)
            .finish_non_exhaustive()
    }
}

impl<A, K> GuideClient<A, K>
where
    A: GuideApi,
    K: GuideSocket,
{
    /// Client without a socket; `subscribe`/`unsubscribe` are no-ops.
    pub fn new(config: EngineConfig, api: A) -> Self {
        let (scheduler, timers) = TokioScheduler::new();
        let (sink, requests) = ChannelSink::new();
        let api = Arc::new(api);
        let worker = spawn_engagement_worker(Arc::clone(&api), requests);
        let throttle_interval = Duration::from_secs(30);
        Self {
            engine: GuideEngine::new(config, scheduler, sink),
            api,
            socket: None,
            joined: None,
            timers,
            worker,
            throttle_interval,
            next_throttle_check: Instant::now() + throttle_interval,
            last_throttled: false,
        }
    }

    /// Client configured from prefs, including debug overrides.
    pub fn from_prefs(prefs: &ClientPrefs, api: A) -> Result<Self, ClientError> {
        let mut client = Self::new(engine_config(prefs)?, api)
            .with_throttle_interval(prefs.throttle_check_interval());
        if prefs.debug.forced_guide_key.is_some() || prefs.debug.skip_staging {
            client.engine.set_debug(DebugState {
                forced_guide_key: prefs.debug.forced_guide_key.clone(),
                skip_staging: prefs.debug.skip_staging,
            });
        }
        Ok(client)
    }

    /// Attach a socket transport.
    pub fn with_socket(mut self, socket: K) -> Self {
        self.socket = Some(socket);
        self
    }

    /// How often [`Self::next_event`] re-checks the group throttle.
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self.next_throttle_check = Instant::now() + interval;
        self
    }

    /// The engine.
    pub fn engine(&self) -> &ClientEngine {
        &self.engine
    }

    /// The engine, mutably (selection, engagement, navigation).
    pub fn engine_mut(&mut self) -> &mut ClientEngine {
        &mut self.engine
    }

    /// The socket transport, if any.
    pub fn socket(&self) -> Option<&K> {
        self.socket.as_ref()
    }

    /// Topic currently joined.
    pub fn joined_topic(&self) -> Option<&str> {
        self.joined.as_deref()
    }

    /// Fetch guides for `params` (engine defaults when `None`) and merge them.
    ///
    /// Returns the resulting query status. API failures are recorded as
    /// [`QueryStatus::Error`], not returned.
    #[instrument(skip(self, params))]
    pub async fn fetch(
        &mut self,
        params: Option<FetchGuidesParams>,
    ) -> Result<QueryStatus, ClientError> {
        let params = params.unwrap_or_else(|| self.engine.default_fetch_params());
        let key = match self.engine.begin_fetch(&params)? {
            FetchPlan::InFlight(_) => return Ok(QueryStatus::Loading),
            FetchPlan::Request(key) => key,
        };
        let user_id = self
            .engine
            .config()
            .user_id
            .clone()
            .ok_or(GuideError::Unauthenticated { operation: "fetch" })?;
        let channel_id = self.engine.config().channel_id.clone();
        match self.api.fetch_guides(&user_id, &channel_id, &params).await {
            Ok(response) => self.engine.complete_fetch(&key, response),
            Err(err) => self.engine.fail_fetch(&key, err),
        }
        let status = self
            .engine
            .snapshot()
            .query(&key)
            .cloned()
            .unwrap_or(QueryStatus::Loading);
        Ok(status)
    }

    /// Join the guide topic. Returns false when there is no socket.
    #[instrument(skip(self))]
    pub fn subscribe(&mut self) -> Result<bool, ClientError> {
        let Some(socket) = self.socket.as_mut() else {
            debug!("no socket transport; subscribe skipped");
            return Ok(false);
        };
        let params = self.engine.join_params()?;
        let topic = self.engine.topic();
        if self.joined.as_deref() == Some(topic.as_str()) {
            return Ok(true);
        }
        socket.join(&topic, &params)?;
        info!(%topic, "subscribed to guide topic");
        self.joined = Some(topic);
        Ok(true)
    }

    /// Leave the guide topic. No-op without a socket or when not joined.
    pub fn unsubscribe(&mut self) {
        let (Some(socket), Some(topic)) = (self.socket.as_mut(), self.joined.take()) else {
            return;
        };
        socket.leave(&topic);
        info!(%topic, "unsubscribed from guide topic");
    }

    /// Unsubscribe and stop following navigation.
    pub fn cleanup(&mut self) {
        self.unsubscribe();
        self.engine.location_tracker_mut().detach();
        info!("guide client cleaned up");
    }

    /// Apply every fired timer and buffered socket frame without waiting.
    /// Returns how many inputs were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(timer) = self.timers.try_recv() {
            self.on_timer(timer);
            applied += 1;
        }
        while let Some(msg) = self.socket.as_mut().and_then(|s| s.try_recv()) {
            self.on_frame(&msg);
            applied += 1;
        }
        applied
    }

    /// Wait for the next timer, socket frame or throttle re-check and apply it.
    pub async fn next_event(&mut self) -> ClientEvent {
        let socket_live = self.socket.is_some() && self.joined.is_some();
        let socket = self.socket.as_mut();
        let timers = &mut self.timers;
        let throttle_at = self.next_throttle_check;

        let input = tokio::select! {
            timer = timers.recv() => Input::Timer(timer),
            frame = async {
                match socket {
                    Some(s) => s.recv().await,
                    None => std::future::pending().await,
                }
            }, if socket_live => Input::Frame(frame),
            () = time::sleep_until(throttle_at) => Input::Throttle,
        };

        match input {
            Input::Timer(Some(timer)) => ClientEvent::StageTimer(self.on_timer(timer)),
            // The scheduler holds a sender for the engine's lifetime.
            Input::Timer(None) => ClientEvent::StageTimer(false),
            Input::Frame(Some(msg)) => ClientEvent::Socket(self.on_frame(&msg)),
            Input::Frame(None) => {
                warn!("guide socket closed");
                self.joined = None;
                ClientEvent::SocketClosed
            }
            Input::Throttle => ClientEvent::ThrottleCheck(self.check_throttle()),
        }
    }

    /// Drop the engine and wait for queued engagement requests to drain.
    /// Returns how many were delivered successfully.
    pub async fn close(mut self) -> usize {
        self.cleanup();
        let Self { engine, worker, .. } = self;
        drop(engine);
        match worker.await {
            Ok(delivered) => delivered,
            Err(err) => {
                warn!(error = %err, "engagement worker failed");
                0
            }
        }
    }

    fn on_timer(&mut self, timer: StageTimer) -> bool {
        self.engine.scheduler_mut().fired(timer);
        self.engine.on_stage_timer(timer)
    }

    fn on_frame(&mut self, msg: &SocketMessage) -> bool {
        match self.engine.handle_socket_message(msg) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(event = %msg.event, error = %err, "dropping undecodable guide frame");
                false
            }
        }
    }

    fn check_throttle(&mut self) -> bool {
        self.next_throttle_check = Instant::now() + self.throttle_interval;
        let throttled = self.engine.is_throttled();
        let flipped = throttled != self.last_throttled;
        self.last_throttled = throttled;
        if flipped {
            debug!(throttled, "group throttle changed");
            self.engine.refresh();
        }
        flipped
    }
}
