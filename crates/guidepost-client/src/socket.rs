// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Real-time socket port.
//!
//! The client only needs to join/leave a topic and read frames. Transports
//! (phoenix websocket, test harness, replay file) adapt to [`GuideSocket`];
//! [`ChannelSocket`] is the in-process adapter fed through a [`SocketFeed`].

use std::future::Future;

use guidepost_proto::wire::{JoinParams, SocketMessage};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Socket failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    /// The transport is closed.
    #[error("socket closed")]
    Closed,
    /// The server refused the join.
    #[error("join rejected for {topic}: {reason}")]
    JoinRejected {
        /// Topic that was joined.
        topic: String,
        /// Server-provided reason.
        reason: String,
    },
}

/// Transport for guide topic frames.
pub trait GuideSocket: Send {
    /// Join `topic` with `params`.
    fn join(&mut self, topic: &str, params: &JoinParams) -> Result<(), SocketError>;
    /// Leave `topic`; a no-op when not joined.
    fn leave(&mut self, topic: &str);
    /// Next frame, or `None` once the transport is closed.
    fn recv(&mut self) -> impl Future<Output = Option<SocketMessage>> + Send;
    /// Next frame if one is already buffered.
    fn try_recv(&mut self) -> Option<SocketMessage>;
}

/// Channel-backed [`GuideSocket`].
#[derive(Debug)]
pub struct ChannelSocket {
    rx: UnboundedReceiver<SocketMessage>,
    joined: Option<(String, JoinParams)>,
    reject_join: Option<String>,
}

/// Sending half of a [`ChannelSocket`].
#[derive(Debug, Clone)]
pub struct SocketFeed {
    tx: UnboundedSender<SocketMessage>,
}

impl SocketFeed {
    /// Deliver a frame. Returns false once the socket is dropped.
    pub fn push(&self, msg: SocketMessage) -> bool {
        self.tx.send(msg).is_ok()
    }
}

impl ChannelSocket {
    /// Socket and its feed.
    pub fn pair() -> (Self, SocketFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx,
                joined: None,
                reject_join: None,
            },
            SocketFeed { tx },
        )
    }

    /// Refuse future joins with `reason`.
    pub fn reject_joins(&mut self, reason: impl Into<String>) {
        self.reject_join = Some(reason.into());
    }

    /// Topic and params currently joined.
    pub fn joined(&self) -> Option<(&str, &JoinParams)> {
        self.joined.as_ref().map(|(t, p)| (t.as_str(), p))
    }
}

impl GuideSocket for ChannelSocket {
    fn join(&mut self, topic: &str, params: &JoinParams) -> Result<(), SocketError> {
        if let Some(reason) = &self.reject_join {
            return Err(SocketError::JoinRejected {
                topic: topic.to_string(),
                reason: reason.clone(),
            });
        }
        self.joined = Some((topic.to_string(), params.clone()));
        Ok(())
    }

    fn leave(&mut self, topic: &str) {
        if self.joined.as_ref().is_some_and(|(t, _)| t == topic) {
            self.joined = None;
        }
    }

    async fn recv(&mut self) -> Option<SocketMessage> {
        self.rx.recv().await
    }

    fn try_recv(&mut self) -> Option<SocketMessage> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
