// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - print the effective configuration

use super::AppContext;
use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Print one key, or the whole configuration
///
/// The backend key is never printed, only whether it is set.
pub fn run(ctx: &AppContext, key: Option<&str>) -> Result<()> {
    let mut settings =
        serde_json::to_value(&ctx.config).context("Failed to serialize configuration")?;
    if let Value::Object(map) = &mut settings {
        map.insert(
            "backend_key".into(),
            Value::from(if ctx.config.backend_key.is_some() { "[set]" } else { "[unset]" }),
        );
        if let Some(path) = crate::config::default_config_path() {
            map.insert("config_file".into(), Value::from(path.display().to_string()));
        }
    }

    match key {
        Some(key) => match settings.get(key) {
            Some(Value::String(s)) => println!("{s}"),
            Some(Value::Null) => println!(),
            Some(other) => println!("{other}"),
            None => bail!("Unknown configuration key: {key}"),
        },
        None => ctx.print_json(&settings)?,
    }
    Ok(())
}
