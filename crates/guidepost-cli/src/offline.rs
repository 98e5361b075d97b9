// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Guide API backed by a saved response file, for inspecting without a network.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use guidepost_client::{ApiError, GuideApi};
use guidepost_core::EngagementRequest;
use guidepost_proto::{EngagementResponse, FetchGuidesParams, GuidesResponse};

#[derive(Debug, Clone)]
pub struct FileGuideApi {
    response: GuidesResponse,
}

impl FileGuideApi {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let response = serde_json::from_str(&text)
            .with_context(|| format!("parse guides response {}", path.display()))?;
        Ok(Self { response })
    }
}

impl GuideApi for FileGuideApi {
    async fn fetch_guides(
        &self,
        _user_id: &str,
        _channel_id: &str,
        _params: &FetchGuidesParams,
    ) -> Result<GuidesResponse, ApiError> {
        Ok(self.response.clone())
    }

    async fn put_engagement(
        &self,
        request: &EngagementRequest,
    ) -> Result<EngagementResponse, ApiError> {
        Err(ApiError::Other(format!(
            "offline: {} not sent",
            request.path()
        )))
    }
}
