// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - write the filtered regulations to JSON or CSV

use super::list::{load_filtered, FilterArgs};
use super::AppContext;
use crate::types::Regulation;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Pretty-printed JSON array
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl ExportFormat {
    /// File extension for the format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Serialize regulations in `format`
pub fn encode(regulations: &[Regulation], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => {
            serde_json::to_string_pretty(regulations).context("Failed to serialize JSON")
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for regulation in regulations {
                writer.serialize(regulation).context("Failed to write CSV row")?;
            }
            let bytes = writer.into_inner().context("Failed to flush CSV")?;
            String::from_utf8(bytes).context("CSV output is not UTF-8")
        }
    }
}

/// Run the export command
pub async fn run(
    ctx: &AppContext,
    filters: &FilterArgs,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let store = load_filtered(ctx, filters).await?;
    let regulations = store.regulations();
    let content = encode(&regulations, format)?;

    match output {
        Some(path) => {
            fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(count = regulations.len(), format = format.extension(), "exported to {}", path.display());
        }
        None => {
            std::io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
