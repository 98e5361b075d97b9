// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Guide API port.

use std::future::Future;

use guidepost_core::EngagementRequest;
use guidepost_proto::{EngagementResponse, FetchGuidesParams, GuidesResponse};
use thiserror::Error;

/// Failures talking to the guide API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport or decode failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success response.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The configured base URL is unusable.
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
    /// Anything else (used by fakes).
    #[error("{0}")]
    Other(String),
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

/// The two REST calls the engine needs.
pub trait GuideApi: Send + Sync + 'static {
    /// `GET /v1/users/{user_id}/guides/{channel_id}`.
    fn fetch_guides(
        &self,
        user_id: &str,
        channel_id: &str,
        params: &FetchGuidesParams,
    ) -> impl Future<Output = Result<GuidesResponse, ApiError>> + Send;

    /// `PUT /v1/users/{user_id}/guides/messages/{message_id}/{status}`.
    fn put_engagement(
        &self,
        request: &EngagementRequest,
    ) -> impl Future<Output = Result<EngagementResponse, ApiError>> + Send;
}
