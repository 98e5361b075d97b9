// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `guidepost` developer CLI: inspect guide selection against a location and
//! manage the saved client prefs.
// The CLI is expected to print to stdout.
#![allow(clippy::print_stdout)]

mod cli;
mod inspect;
mod offline;
mod prefs;

use anyhow::{Context, Result};
use clap::Parser;
use guidepost_app_core::{ClientPrefs, ConfigService, PrefsPort};
use guidepost_config_fs::FsConfigStore;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let store = match &cli.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("open config store")?;
    let service = ConfigService::new(store);
    let saved = service.load_prefs().context("load saved prefs")?;
    let effective = effective_prefs(&saved, &cli);

    match cli.command {
        Command::Inspect(args) => inspect::run(effective, args).await,
        Command::Prefs(cmd) => prefs::run(&service, saved, effective, cmd),
    }
}

fn effective_prefs(saved: &ClientPrefs, cli: &Cli) -> ClientPrefs {
    let mut prefs = saved.clone();
    prefs.apply(cli.overrides());
    prefs
}
