// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! List command - search and filter the catalog

use super::AppContext;
use crate::client::CatalogClient;
use crate::render;
use crate::store::{FilterSection, RegulationStore};
use crate::types::LocationFilter;
use anyhow::{bail, Result};
use tracing::info;

/// Search, facet and location options shared by `list`, `map` and `export`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FilterArgs {
    /// Case-insensitive text matched against title, municipality and ambito
    #[arg(short, long)]
    pub search: Option<String>,

    /// Descriptor that must be present (economic, social, environmental, climate, urban)
    #[arg(long = "ambito", value_name = "DESCRIPTOR")]
    pub ambito: Vec<String>,

    /// Normative scale code (e.g. LEY_EST); repeat to accept several
    #[arg(long = "scale", value_name = "CODE")]
    pub scale: Vec<String>,

    /// Territorial level (comunitario, estatal, autonomico, municipal)
    #[arg(long = "territorial", value_name = "LEVEL")]
    pub territorial: Vec<String>,

    /// Autonomous community name (exact, case-insensitive)
    #[arg(long)]
    pub ccaa: Option<String>,

    /// Province name (exact, case-insensitive)
    #[arg(long)]
    pub provincia: Option<String>,

    /// Municipality name (exact, case-insensitive)
    #[arg(long)]
    pub municipio: Option<String>,

    /// Extra query parameter sent with every page request; repeatable
    #[arg(long = "remote-filter", value_name = "KEY=VALUE", value_parser = parse_remote_filter)]
    pub remote_filter: Vec<(String, String)>,

    /// Only use the first page instead of waiting for the whole catalog
    #[arg(long)]
    pub first_page: bool,
}

fn parse_remote_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

impl FilterArgs {
    /// Location part of the filter
    #[must_use]
    pub fn location(&self) -> LocationFilter {
        LocationFilter {
            ccaa: self.ccaa.clone(),
            provincia: self.provincia.clone(),
            municipio: self.municipio.clone(),
        }
    }
}

/// Initialize a store and apply `filters` to it
///
/// Any error message left in the store is turned into a command error.
pub async fn load_filtered(
    ctx: &AppContext,
    filters: &FilterArgs,
) -> Result<RegulationStore<CatalogClient>> {
    let store = ctx.filtered_store(filters.remote_filter.clone())?;
    store.initialize().await;
    if let Some(message) = store.error() {
        bail!(message);
    }
    if !filters.first_page {
        store.wait_for_background().await;
    }

    if let Some(query) = &filters.search {
        store.search_regulations(query);
    }
    for (section, options) in [
        (FilterSection::Ambito, &filters.ambito),
        (FilterSection::Scale, &filters.scale),
        (FilterSection::Territorial, &filters.territorial),
    ] {
        for option in options {
            store.update_filters(section, option, false);
        }
    }
    store.apply_filters(&filters.location());

    if let Some(message) = store.error() {
        bail!(message);
    }
    Ok(store)
}

/// Run the list command
pub async fn run(ctx: &AppContext, filters: &FilterArgs, limit: Option<usize>) -> Result<()> {
    let store = load_filtered(ctx, filters).await?;
    let snapshot = store.snapshot();
    info!(visible = snapshot.regulations.len(), total = snapshot.total_count, "listing regulations");

    let shown = limit.unwrap_or(snapshot.regulations.len());
    if ctx.json {
        return ctx.print_json(&snapshot.regulations[..shown.min(snapshot.regulations.len())]);
    }

    let reference = ctx.reference();
    println!("{}", ctx.heading(&render::summary(&snapshot)));
    for regulation in snapshot.regulations.iter().take(shown) {
        println!("{}", render::regulation_row(regulation, &reference));
    }
    if shown < snapshot.regulations.len() {
        println!("{}", ctx.dim(&format!("... {} más", snapshot.regulations.len() - shown)));
    }
    Ok(())
}
