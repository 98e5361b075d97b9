// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! reqwest-backed [`GuideApi`].

use guidepost_app_core::ClientPrefs;
use guidepost_core::EngagementRequest;
use guidepost_proto::{EngagementResponse, FetchGuidesParams, GuidesResponse};
use reqwest::{RequestBuilder, Response};
use tracing::debug;
use url::Url;

use crate::api::{ApiError, GuideApi};

const USER_TOKEN_HEADER: &str = "X-Knock-User-Token";

/// HTTP client for the guide endpoints.
#[derive(Debug, Clone)]
pub struct HttpGuideApi {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    user_token: Option<String>,
}

impl HttpGuideApi {
    /// Client for `base_url` authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            api_key: api_key.into(),
            user_token: None,
        })
    }

    /// Client configured from saved prefs. Requires an API key.
    pub fn from_prefs(prefs: &ClientPrefs) -> Result<Self, ApiError> {
        let api_key = prefs
            .require_api_key()
            .map_err(|e| ApiError::Other(e.to_string()))?;
        Ok(Self::new(&prefs.api_url, api_key)?.with_user_token(prefs.user_token.clone()))
    }

    /// Attach a signed user token to every request.
    pub fn with_user_token(mut self, token: Option<String>) -> Self {
        self.user_token = token;
        self
    }

    /// API root.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `segments` under the API root; segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.bearer_auth(&self.api_key);
        match &self.user_token {
            Some(token) => req.header(USER_TOKEN_HEADER, token),
            None => req,
        }
    }
}

async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

impl GuideApi for HttpGuideApi {
    async fn fetch_guides(
        &self,
        user_id: &str,
        channel_id: &str,
        params: &FetchGuidesParams,
    ) -> Result<GuidesResponse, ApiError> {
        let url = self.endpoint(&["v1", "users", user_id, "guides", channel_id])?;
        debug!(%url, "GET guides");
        let resp = self
            .authorize(self.http.get(url))
            .query(&params.query_pairs())
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn put_engagement(
        &self,
        request: &EngagementRequest,
    ) -> Result<EngagementResponse, ApiError> {
        let url = self.endpoint(&[
            "v1",
            "users",
            &request.user_id,
            "guides",
            "messages",
            &request.message_id,
            request.status.as_str(),
        ])?;
        debug!(%url, "PUT engagement");
        let resp = self
            .authorize(self.http.put(url))
            .json(&request.body)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_segments_under_the_base_path() {
        let api = HttpGuideApi::new("https://api.example.test/", "pk").unwrap();
        let url = api
            .endpoint(&["v1", "users", "user one", "guides", "chan"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/v1/users/user%20one/guides/chan"
        );

        let nested = HttpGuideApi::new("http://localhost:4000/proxy", "pk").unwrap();
        assert_eq!(
            nested.endpoint(&["v1"]).unwrap().as_str(),
            "http://localhost:4000/proxy/v1"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(
            HttpGuideApi::new("mailto:someone@example.test", "pk"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpGuideApi::new("not a url", "pk"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn prefs_without_api_key_are_rejected() {
        let prefs = ClientPrefs::default();
        assert!(HttpGuideApi::from_prefs(&prefs).is_err());
    }
}
