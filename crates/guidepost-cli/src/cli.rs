// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use guidepost_app_core::PrefsOverrides;

#[derive(Parser, Debug)]
#[command(name = "guidepost", author, version, about = "Guidepost guide selection toolkit")]
pub struct Cli {
    /// API root (overrides saved prefs)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Publishable API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,
    /// User to fetch guides for
    #[arg(long, global = true)]
    pub user_id: Option<String>,
    /// Signed user token
    #[arg(long, global = true)]
    pub user_token: Option<String>,
    /// Guide channel
    #[arg(long, global = true)]
    pub channel_id: Option<String>,
    /// Staging window in milliseconds
    #[arg(long, global = true)]
    pub order_resolution_ms: Option<u64>,
    /// Directory holding saved prefs (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> PrefsOverrides {
        PrefsOverrides {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            user_id: self.user_id.clone(),
            user_token: self.user_token.clone(),
            channel_id: self.channel_id.clone(),
            order_resolution_duration_ms: self.order_resolution_ms,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch guides and show which one a view would render
    Inspect(InspectArgs),
    /// Show or persist client prefs
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Location href to evaluate URL rules against
    #[arg(long)]
    pub location: Option<String>,
    /// Only guides of this type (also sent as the fetch `type` param)
    #[arg(long = "type")]
    pub guide_type: Option<String>,
    /// Only the guide with this key
    #[arg(long)]
    pub key: Option<String>,
    /// Tenant sent with the fetch
    #[arg(long)]
    pub tenant: Option<String>,
    /// Ignore the group display interval
    #[arg(long)]
    pub include_throttled: bool,
    /// Read a saved guides response instead of calling the API
    #[arg(long)]
    pub response: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print saved prefs with command-line overrides applied
    Show {
        /// Print the saved file as-is, ignoring overrides
        #[arg(long)]
        saved: bool,
    },
    /// Persist command-line overrides into the saved prefs
    Save,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}
