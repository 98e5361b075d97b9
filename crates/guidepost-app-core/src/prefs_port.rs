// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prefs-facing port used by the client and CLI.

use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::prefs::ClientPrefs;

/// Config key the client prefs live under.
pub const PREFS_KEY: &str = "client";

/// Load and persist [`ClientPrefs`].
pub trait PrefsPort {
    /// Saved prefs, or defaults when none were saved.
    fn load_prefs(&self) -> Result<ClientPrefs, ConfigError>;
    /// Persist prefs.
    fn save_prefs(&self, prefs: &ClientPrefs) -> Result<(), ConfigError>;
}

impl<S: ConfigStore> PrefsPort for ConfigService<S> {
    fn load_prefs(&self) -> Result<ClientPrefs, ConfigError> {
        self.load_or_default(PREFS_KEY)
    }

    fn save_prefs(&self, prefs: &ClientPrefs) -> Result<(), ConfigError> {
        self.save(PREFS_KEY, prefs)
    }
}
