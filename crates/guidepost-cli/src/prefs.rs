// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `guidepost prefs`.

use anyhow::{Context, Result};
use guidepost_app_core::{ClientPrefs, PrefsPort};
use tracing::info;

use crate::cli::PrefsCommand;

pub fn run(
    port: &impl PrefsPort,
    saved: ClientPrefs,
    effective: ClientPrefs,
    cmd: PrefsCommand,
) -> Result<()> {
    match cmd {
        PrefsCommand::Show { saved: true } => print(&saved),
        PrefsCommand::Show { saved: false } => print(&effective),
        PrefsCommand::Save => {
            port.save_prefs(&effective).context("save prefs")?;
            info!("prefs saved");
            print(&effective)
        }
    }
}

fn print(prefs: &ClientPrefs) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(prefs)?);
    Ok(())
}
