// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Guidepost tools (config, prefs).
//! Keeps runtime adapters thin and storage-agnostic.

pub mod config;
pub mod prefs;
pub mod prefs_port;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use prefs::{ClientPrefs, DebugPrefs, PrefsOverrides};
pub use prefs_port::{PrefsPort, PREFS_KEY};
