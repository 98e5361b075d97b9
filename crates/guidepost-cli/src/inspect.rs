// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `guidepost inspect`: fetch, apply a location, report eligibility and the
//! guide a view would settle on.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use guidepost_app_core::ClientPrefs;
use guidepost_client::{ChannelSocket, GuideApi, GuideClient, HttpGuideApi};
use guidepost_core::selection::{self, Selection};
use guidepost_core::{GuideFilter, QueryKey, QueryStatus, SelectOptions, StoreState};
use guidepost_proto::FetchGuidesParams;
use serde::Serialize;
use tracing::debug;

use crate::cli::{Format, InspectArgs};
use crate::offline::FileGuideApi;

const OFFLINE_USER: &str = "local";

#[derive(Debug, Serialize)]
struct Report {
    query: String,
    location: Option<String>,
    throttled: bool,
    selected: Option<String>,
    guides: Vec<GuideRow>,
    ineligible: Vec<IneligibleRow>,
}

#[derive(Debug, Serialize)]
struct GuideRow {
    /// Position in the default group; `None` for guides outside it.
    index: Option<usize>,
    key: String,
    guide_type: String,
    steps: usize,
    seen: usize,
    eligible: bool,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct IneligibleRow {
    key: String,
    reason: String,
    message: String,
}

pub async fn run(mut prefs: ClientPrefs, args: InspectArgs) -> Result<()> {
    let report = match &args.response {
        Some(path) => {
            if prefs.user_id.is_none() {
                debug!(user = OFFLINE_USER, "no user configured; using placeholder");
                prefs.user_id = Some(OFFLINE_USER.to_string());
            }
            inspect(&prefs, FileGuideApi::load(path)?, &args).await?
        }
        None => inspect(&prefs, HttpGuideApi::from_prefs(&prefs)?, &args).await?,
    };
    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Table => print_table(&report),
    }
    Ok(())
}

async fn inspect<A: GuideApi>(prefs: &ClientPrefs, api: A, args: &InspectArgs) -> Result<Report> {
    let mut client = GuideClient::<A, ChannelSocket>::from_prefs(prefs, api)?;
    let params = FetchGuidesParams {
        guide_type: args.guide_type.clone(),
        tenant: args.tenant.clone(),
        ..client.engine().default_fetch_params()
    };
    let query = QueryKey::for_params(&params);
    if let QueryStatus::Error { error } = client.fetch(Some(params)).await? {
        bail!("guide fetch failed: {error}");
    }
    if let Some(location) = &args.location {
        client.engine_mut().set_location(location.clone());
    }

    let filter = GuideFilter {
        key: args.key.clone(),
        guide_type: args.guide_type.clone(),
    };
    let opts = SelectOptions {
        include_throttled: args.include_throttled,
    };
    let eligible = client.engine().select_guides(&filter, opts);
    let state = client.engine().snapshot();
    let selected = settled_key(&state, &filter, &eligible);
    let mut eligible: BTreeSet<String> = eligible.iter().map(|s| s.key().to_string()).collect();
    eligible.extend(selected.clone());
    let report = Report {
        query: query.to_string(),
        location: state.location.clone(),
        throttled: client.engine().is_throttled(),
        guides: guide_rows(&state, &filter, &eligible, selected.as_deref()),
        ineligible: state
            .ineligible_guides
            .values()
            .map(|m| IneligibleRow {
                key: m.key.clone(),
                reason: serde_json::to_value(m.reason)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
                message: m.message.clone(),
            })
            .collect(),
        selected,
    };
    client.close().await;
    Ok(report)
}

/// The guide a view with `filter` would render. A forced guide wins outright,
/// and hides everything else when it does not match the filter.
fn settled_key(state: &StoreState, filter: &GuideFilter, eligible: &[Selection]) -> Option<String> {
    if state.debug.forced_guide_key.is_some() {
        return selection::select_forced(state, filter).map(|s| s.key().to_string());
    }
    eligible.first().map(|s| s.key().to_string())
}

fn guide_rows(
    state: &StoreState,
    filter: &GuideFilter,
    eligible: &BTreeSet<String>,
    selected: Option<&str>,
) -> Vec<GuideRow> {
    let sequence: Vec<&str> = state
        .default_group()
        .map(|g| g.display_sequence.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let mut rows: Vec<GuideRow> = state
        .guides
        .values()
        .filter(|g| filter.matches(g))
        .map(|g| GuideRow {
            index: sequence.iter().position(|k| *k == g.key),
            key: g.key.clone(),
            guide_type: g.guide_type.clone(),
            steps: g.steps.len(),
            seen: g
                .steps
                .iter()
                .filter(|s| s.message.seen_at.is_some())
                .count(),
            eligible: eligible.contains(&g.key),
            selected: selected == Some(g.key.as_str()),
        })
        .collect();
    rows.sort_by_key(|r| (r.index.is_none(), r.index, r.key.clone()));
    rows
}

fn print_table(report: &Report) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "key", "type", "seen", "eligible", "selected"]);
    for row in &report.guides {
        table.add_row(vec![
            row.index.map_or_else(|| "-".to_string(), |i| i.to_string()),
            row.key.clone(),
            row.guide_type.clone(),
            format!("{}/{}", row.seen, row.steps),
            yes_no(row.eligible).to_string(),
            if row.selected { "*" } else { "" }.to_string(),
        ]);
    }
    println!("query: {}", report.query);
    println!(
        "location: {}",
        report.location.as_deref().unwrap_or("(none)")
    );
    println!("throttled: {}", yes_no(report.throttled));
    println!("{table}");
    println!(
        "selected: {}",
        report.selected.as_deref().unwrap_or("(none)")
    );

    if !report.ineligible.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["key", "reason", "message"]);
        for row in &report.ineligible {
            table.add_row(vec![row.key.clone(), row.reason.clone(), row.message.clone()]);
        }
        println!("server-ineligible:\n{table}");
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
