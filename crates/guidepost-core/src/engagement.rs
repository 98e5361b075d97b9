// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engagement: optimistic step updates plus a remote request handed to a sink.
//!
//! Local state is updated first and never rolled back. The sink decides how
//! (and whether) the remote `PUT` is delivered.

use std::sync::Arc;

use guidepost_proto::{EngagementBody, EngagementStatus, GuideStep, StepMessage, Timestamp};
use serde_json::Value;
use tracing::debug;

use crate::engine::GuideEngine;
use crate::error::GuideError;
use crate::scheduler::{Clock, StageScheduler};
use crate::store::StoreState;

/// One remote engagement call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementRequest {
    /// User the message belongs to.
    pub user_id: String,
    /// Step message identifier.
    pub message_id: String,
    /// Endpoint suffix.
    pub status: EngagementStatus,
    /// Request body.
    pub body: EngagementBody,
}

impl EngagementRequest {
    /// Path relative to the API root.
    pub fn path(&self) -> String {
        format!(
            "/v1/users/{}/guides/messages/{}/{}",
            self.user_id,
            self.message_id,
            self.status.as_str()
        )
    }
}

/// Outbound side of engagement. Must not block.
pub trait EngagementSink {
    /// Hand off a request; failures are the sink's concern.
    fn dispatch(&mut self, request: EngagementRequest);
}

/// Engagement capability for one step: plain data, resolved against the
/// engine's current state on every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepHandle {
    guide_key: String,
    step_ref: String,
}

impl StepHandle {
    /// Handle for `step_ref` within `guide_key`.
    pub fn new(guide_key: &str, step_ref: &str) -> Self {
        Self {
            guide_key: guide_key.to_string(),
            step_ref: step_ref.to_string(),
        }
    }

    /// Guide key.
    pub fn guide_key(&self) -> &str {
        &self.guide_key
    }

    /// Step reference.
    pub fn step_ref(&self) -> &str {
        &self.step_ref
    }

    /// See [`GuideEngine::mark_as_seen`].
    pub fn mark_as_seen<S, D, C>(
        &self,
        engine: &mut GuideEngine<S, D, C>,
    ) -> Result<Option<GuideStep>, GuideError>
    where
        S: StageScheduler,
        D: EngagementSink,
        C: Clock,
    {
        engine.mark_as_seen(&self.guide_key, &self.step_ref)
    }

    /// See [`GuideEngine::mark_as_interacted`].
    pub fn mark_as_interacted<S, D, C>(
        &self,
        engine: &mut GuideEngine<S, D, C>,
        metadata: Option<Value>,
    ) -> Result<Option<GuideStep>, GuideError>
    where
        S: StageScheduler,
        D: EngagementSink,
        C: Clock,
    {
        engine.mark_as_interacted(&self.guide_key, &self.step_ref, metadata)
    }

    /// See [`GuideEngine::mark_as_archived`].
    pub fn mark_as_archived<S, D, C>(
        &self,
        engine: &mut GuideEngine<S, D, C>,
    ) -> Result<Option<GuideStep>, GuideError>
    where
        S: StageScheduler,
        D: EngagementSink,
        C: Clock,
    {
        engine.mark_as_archived(&self.guide_key, &self.step_ref)
    }
}

struct StepTarget {
    guide_id: String,
    step: GuideStep,
}

fn find_step(state: &StoreState, guide_key: &str, step_ref: &str) -> Option<StepTarget> {
    let guide = state.guide(guide_key)?;
    let step = guide.step(step_ref)?;
    Some(StepTarget {
        guide_id: guide.id.clone(),
        step: step.clone(),
    })
}

impl<S, D, C> GuideEngine<S, D, C>
where
    S: StageScheduler,
    D: EngagementSink,
    C: Clock,
{
    /// Record that a step was rendered.
    ///
    /// No-op (returning `Ok(None)`) when the step is unknown or already seen.
    /// Also starts the default group's throttle window.
    pub fn mark_as_seen(
        &mut self,
        guide_key: &str,
        step_ref: &str,
    ) -> Result<Option<GuideStep>, GuideError> {
        let user_id = self.require_user("mark_as_seen")?;
        let Some(target) = find_step(self.store.state(), guide_key, step_ref) else {
            debug!(guide_key, step_ref, "seen: step not found");
            return Ok(None);
        };
        if target.step.message.seen_at.is_some() {
            debug!(guide_key, step_ref, "seen: already recorded");
            return Ok(None);
        }
        let now = self.clock.now();
        let updated = self.update_step(guide_key, step_ref, now, true, |m| {
            m.seen_at = Some(now);
        });
        let body = EngagementBody {
            content: Some(target.step.content.clone()),
            data: self.config.data.clone(),
            tenant: self.config.tenant.clone(),
            ..self.base_body(guide_key, &target)
        };
        self.send(user_id, EngagementStatus::Seen, &target, body);
        Ok(updated)
    }

    /// Record an interaction. Always applied and always sent.
    pub fn mark_as_interacted(
        &mut self,
        guide_key: &str,
        step_ref: &str,
        metadata: Option<Value>,
    ) -> Result<Option<GuideStep>, GuideError> {
        let user_id = self.require_user("mark_as_interacted")?;
        let Some(target) = find_step(self.store.state(), guide_key, step_ref) else {
            debug!(guide_key, step_ref, "interacted: step not found");
            return Ok(None);
        };
        let now = self.clock.now();
        let updated = self.update_step(guide_key, step_ref, now, false, |m| {
            m.read_at = Some(now);
            m.interacted_at = Some(now);
        });
        let body = EngagementBody {
            metadata,
            ..self.base_body(guide_key, &target)
        };
        self.send(user_id, EngagementStatus::Interacted, &target, body);
        Ok(updated)
    }

    /// Dismiss a step for good. No-op when unknown or already archived.
    pub fn mark_as_archived(
        &mut self,
        guide_key: &str,
        step_ref: &str,
    ) -> Result<Option<GuideStep>, GuideError> {
        let user_id = self.require_user("mark_as_archived")?;
        let Some(target) = find_step(self.store.state(), guide_key, step_ref) else {
            debug!(guide_key, step_ref, "archived: step not found");
            return Ok(None);
        };
        if target.step.message.archived_at.is_some() {
            debug!(guide_key, step_ref, "archived: already recorded");
            return Ok(None);
        }
        let now = self.clock.now();
        let updated = self.update_step(guide_key, step_ref, now, false, |m| {
            m.archived_at = Some(now);
        });
        let body = self.base_body(guide_key, &target);
        self.send(user_id, EngagementStatus::Archived, &target, body);
        Ok(updated)
    }

    fn update_step(
        &mut self,
        guide_key: &str,
        step_ref: &str,
        now: Timestamp,
        log_display: bool,
        mutate: impl FnOnce(&mut StepMessage),
    ) -> Option<GuideStep> {
        let mut updated = None;
        self.store.update(|s| {
            if let Some(step) = s
                .guides
                .get_mut(guide_key)
                .map(Arc::make_mut)
                .and_then(|g| g.step_mut(step_ref))
            {
                mutate(&mut step.message);
                updated = Some(step.clone());
            }
            if log_display {
                if let Some(group_key) = s.default_group().map(|g| g.key.clone()) {
                    s.guide_group_display_logs.insert(group_key, now);
                }
            }
        });
        updated
    }

    fn base_body(&self, guide_key: &str, target: &StepTarget) -> EngagementBody {
        EngagementBody {
            channel_id: self.config.channel_id.clone(),
            guide_key: guide_key.to_string(),
            guide_id: target.guide_id.clone(),
            guide_step_ref: target.step.step_ref.clone(),
            ..EngagementBody::default()
        }
    }

    fn send(
        &mut self,
        user_id: String,
        status: EngagementStatus,
        target: &StepTarget,
        body: EngagementBody,
    ) {
        debug!(
            guide_key = %body.guide_key,
            step_ref = %body.guide_step_ref,
            status = status.as_str(),
            "engagement dispatched"
        );
        self.sink.dispatch(EngagementRequest {
            user_id,
            message_id: target.step.message.id.clone(),
            status,
            body,
        });
    }
}
