// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod admin;
pub mod chat;
pub mod completions;
pub mod config;
pub mod export;
pub mod list;
pub mod lookup;
pub mod map;
pub mod show;

use crate::client::CatalogClient;
use crate::config::Config;
use crate::reference::ReferenceData;
use crate::store::{RegulationStore, StoreOptions};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Effective configuration
    pub config: Config,
    /// Print JSON instead of text
    pub json: bool,
    /// Colour terminal output
    pub color: bool,
}

impl AppContext {
    /// Reference tables from the configured data directory, or bundled
    #[must_use]
    pub fn reference(&self) -> ReferenceData {
        ReferenceData::from_optional_dir(self.config.data_dir.as_deref())
    }

    /// A store reading from the configured catalog API
    pub fn store(&self) -> Result<RegulationStore<CatalogClient>> {
        self.filtered_store(Vec::new())
    }

    /// A store whose page requests carry `remote_filters`
    pub fn filtered_store(
        &self,
        remote_filters: Vec<(String, String)>,
    ) -> Result<RegulationStore<CatalogClient>> {
        let client = CatalogClient::from_config(&self.config)
            .context("Failed to create catalog client")?;
        let options = StoreOptions::from_config(&self.config).with_remote_filters(remote_filters);
        Ok(RegulationStore::new(client, options))
    }

    /// Bold heading when colour is on
    #[must_use]
    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Dimmed secondary text when colour is on
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Print a value as pretty JSON
    pub fn print_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
        Ok(())
    }
}
