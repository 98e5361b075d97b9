// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engagement delivery: the engine hands requests to [`ChannelSink`] and a
//! background worker performs the `PUT`s in order.

use std::sync::Arc;

use guidepost_core::{EngagementRequest, EngagementSink};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::GuideApi;

/// Non-blocking engagement sink backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<EngagementRequest>,
}

impl ChannelSink {
    /// Sink plus the receiving end for a worker.
    pub fn new() -> (Self, UnboundedReceiver<EngagementRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EngagementSink for ChannelSink {
    fn dispatch(&mut self, request: EngagementRequest) {
        if let Err(err) = self.tx.send(request) {
            warn!(
                guide_key = %err.0.body.guide_key,
                status = err.0.status.as_str(),
                "engagement worker gone; request dropped"
            );
        }
    }
}

/// Deliver queued requests until every sender is dropped.
///
/// Failures are logged and dropped; local state was already updated.
pub fn spawn_engagement_worker<A: GuideApi>(
    api: Arc<A>,
    mut rx: UnboundedReceiver<EngagementRequest>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0usize;
        while let Some(request) = rx.recv().await {
            match api.put_engagement(&request).await {
                Ok(resp) => {
                    delivered += 1;
                    debug!(
                        guide_key = %request.body.guide_key,
                        status = request.status.as_str(),
                        response = %resp.status,
                        "engagement recorded"
                    );
                }
                Err(err) => warn!(
                    guide_key = %request.body.guide_key,
                    step_ref = %request.body.guide_step_ref,
                    status = request.status.as_str(),
                    error = %err,
                    "engagement request failed"
                ),
            }
        }
        delivered
    })
}
