// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted client preferences.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Default API root.
pub const DEFAULT_API_URL: &str = "https://api.knock.app";

/// Preview switches persisted alongside the client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugPrefs {
    /// Guide shown regardless of URL rules and throttling.
    pub forced_guide_key: Option<String>,
    /// Return selections without a staging window.
    pub skip_staging: bool,
}

/// Everything a client needs to talk to the guide API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientPrefs {
    /// API root.
    pub api_url: String,
    /// Publishable API key.
    pub api_key: Option<String>,
    /// Authenticated user.
    pub user_id: Option<String>,
    /// Signed user token, when enhanced security is on.
    pub user_token: Option<String>,
    /// Guide channel.
    pub channel_id: Option<String>,
    /// Staging window length.
    pub order_resolution_duration_ms: u64,
    /// Follow navigation events.
    pub track_location: bool,
    /// How often a throttled view re-checks the display interval.
    pub throttle_check_interval_ms: u64,
    /// Preview overrides.
    pub debug: DebugPrefs,
}

impl Default for ClientPrefs {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            user_id: None,
            user_token: None,
            channel_id: None,
            order_resolution_duration_ms: 0,
            track_location: true,
            throttle_check_interval_ms: 30_000,
            debug: DebugPrefs::default(),
        }
    }
}

impl ClientPrefs {
    /// Staging window as a duration.
    pub fn order_resolution_duration(&self) -> Duration {
        Duration::from_millis(self.order_resolution_duration_ms)
    }

    /// Throttle re-check interval as a duration.
    pub fn throttle_check_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_check_interval_ms)
    }

    /// Channel id, or `Invalid` when unset.
    pub fn require_channel(&self) -> Result<&str, ConfigError> {
        self.channel_id
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("channel_id is not set".into()))
    }

    /// API key, or `Invalid` when unset.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("api_key is not set".into()))
    }

    /// Apply every override that is set.
    pub fn apply(&mut self, overrides: PrefsOverrides) {
        let PrefsOverrides {
            api_url,
            api_key,
            user_id,
            user_token,
            channel_id,
            order_resolution_duration_ms,
        } = overrides;
        if let Some(v) = api_url {
            self.api_url = v;
        }
        if api_key.is_some() {
            self.api_key = api_key;
        }
        if user_id.is_some() {
            self.user_id = user_id;
        }
        if user_token.is_some() {
            self.user_token = user_token;
        }
        if channel_id.is_some() {
            self.channel_id = channel_id;
        }
        if let Some(v) = order_resolution_duration_ms {
            self.order_resolution_duration_ms = v;
        }
    }
}

/// Field-by-field overrides, e.g. from command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefsOverrides {
    /// API root.
    pub api_url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// User.
    pub user_id: Option<String>,
    /// User token.
    pub user_token: Option<String>,
    /// Channel.
    pub channel_id: Option<String>,
    /// Staging window.
    pub order_resolution_duration_ms: Option<u64>,
}
