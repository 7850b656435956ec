// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Lookup command - print reference tables

use super::AppContext;
use anyhow::{Context, Result};
use serde_json::json;

/// Reference table to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LookupTable {
    /// Ambito codes
    Ambito,
    /// Normative scale codes
    Scale,
    /// Thematic thesaurus
    Thesaurus,
    /// Autonomous communities
    Regions,
    /// Provinces, optionally of one region
    Provinces,
    /// Municipalities, optionally of one province
    Municipalities,
}

/// Run the lookup command
///
/// `parent` narrows provinces to a region and municipalities to a
/// province; it accepts an id or a name. For code tables it is a single
/// code (or `;`-separated list) to describe.
pub fn run(ctx: &AppContext, table: LookupTable, parent: Option<&str>) -> Result<()> {
    let reference = ctx.reference();
    let rows: Vec<(String, String)> = match table {
        LookupTable::Ambito => match parent {
            Some(code) => vec![(code.to_string(), reference.ambito_description(code))],
            None => reference
                .ambito_table()
                .context("Failed to load ambito table")?
                .iter()
                .map(|c| (c.id.clone(), c.description.clone()))
                .collect(),
        },
        LookupTable::Scale => match parent {
            Some(code) => vec![(code.to_string(), reference.scale_description(code))],
            None => reference
                .scale_table()
                .context("Failed to load normative scale table")?
                .iter()
                .map(|c| (c.id.clone(), c.description.clone()))
                .collect(),
        },
        LookupTable::Thesaurus => match parent {
            Some(codes) => reference
                .describe_codes(codes)
                .into_iter()
                .map(|l| (l.code, l.description))
                .collect(),
            None => reference
                .thesaurus()
                .context("Failed to load thesaurus")?
                .iter()
                .map(|t| (t.id.clone(), format!("{} [{}]", t.description, t.parent_category)))
                .collect(),
        },
        LookupTable::Regions => reference
            .regions()
            .context("Failed to load regions")?
            .iter()
            .map(|r| (r.id.clone(), r.name.clone()))
            .collect(),
        LookupTable::Provinces => {
            let provinces = match parent {
                Some(region) => {
                    let id = match reference.region_named(region).context("Failed to load regions")? {
                        Some(r) => r.id.clone(),
                        None => region.to_string(),
                    };
                    reference.provinces_of(&id).context("Failed to load provinces")?
                }
                None => reference
                    .provinces()
                    .context("Failed to load provinces")?
                    .iter()
                    .collect(),
            };
            provinces
                .into_iter()
                .map(|p| (p.id.clone(), p.name.clone()))
                .collect()
        }
        LookupTable::Municipalities => {
            let municipalities = match parent {
                Some(province) => {
                    let id = match reference
                        .province_named(province)
                        .context("Failed to load provinces")?
                    {
                        Some(p) => p.id.clone(),
                        None => province.to_string(),
                    };
                    reference
                        .municipalities_of(&id)
                        .context("Failed to load municipalities")?
                }
                None => reference
                    .municipalities()
                    .context("Failed to load municipalities")?
                    .iter()
                    .collect(),
            };
            municipalities
                .into_iter()
                .map(|m| (m.id.clone(), m.name.clone()))
                .collect()
        }
    };

    if ctx.json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(code, description)| json!({ "id": code, "description": description }))
            .collect();
        return ctx.print_json(&entries);
    }
    let width = rows.iter().map(|(code, _)| code.len()).max().unwrap_or(0);
    for (code, description) in &rows {
        println!("{code:<width$}  {description}");
    }
    Ok(())
}
