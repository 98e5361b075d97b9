// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted fake guide API.

use std::sync::{Arc, Mutex, MutexGuard};

use guidepost_client::{ApiError, GuideApi};
use guidepost_core::EngagementRequest;
use guidepost_proto::{EngagementResponse, FetchGuidesParams, GuidesResponse};

/// One recorded fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    /// User in the path.
    pub user_id: String,
    /// Channel in the path.
    pub channel_id: String,
    /// Query parameters.
    pub params: FetchGuidesParams,
}

#[derive(Debug, Default)]
struct Script {
    response: GuidesResponse,
    fetch_error: Option<String>,
    engagement_error: Option<String>,
    fetches: Vec<FetchCall>,
    engagements: Vec<EngagementRequest>,
}

/// [`GuideApi`] that serves a fixed response and records every call.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeGuideApi {
    script: Arc<Mutex<Script>>,
}

impl FakeGuideApi {
    /// API serving an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// API serving `response` to every fetch.
    pub fn with_response(response: GuidesResponse) -> Self {
        let api = Self::new();
        api.set_response(response);
        api
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the served response.
    pub fn set_response(&self, response: GuidesResponse) {
        self.lock().response = response;
    }

    /// Fail fetches with `message` (`None` to recover).
    pub fn fail_fetches(&self, message: Option<&str>) {
        self.lock().fetch_error = message.map(str::to_string);
    }

    /// Fail engagement calls with `message` (`None` to recover).
    pub fn fail_engagements(&self, message: Option<&str>) {
        self.lock().engagement_error = message.map(str::to_string);
    }

    /// Fetches received, in order.
    pub fn fetches(&self) -> Vec<FetchCall> {
        self.lock().fetches.clone()
    }

    /// Engagement requests received (including failed ones), in order.
    pub fn engagements(&self) -> Vec<EngagementRequest> {
        self.lock().engagements.clone()
    }
}

impl GuideApi for FakeGuideApi {
    async fn fetch_guides(
        &self,
        user_id: &str,
        channel_id: &str,
        params: &FetchGuidesParams,
    ) -> Result<GuidesResponse, ApiError> {
        let mut script = self.lock();
        script.fetches.push(FetchCall {
            user_id: user_id.to_string(),
            channel_id: channel_id.to_string(),
            params: params.clone(),
        });
        match &script.fetch_error {
            Some(message) => Err(ApiError::Other(message.clone())),
            None => Ok(script.response.clone()),
        }
    }

    async fn put_engagement(
        &self,
        request: &EngagementRequest,
    ) -> Result<EngagementResponse, ApiError> {
        let mut script = self.lock();
        script.engagements.push(request.clone());
        match &script.engagement_error {
            Some(message) => Err(ApiError::Other(message.clone())),
            None => Ok(EngagementResponse {
                status: "ok".to_string(),
            }),
        }
    }
}
