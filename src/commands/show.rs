// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show command - detail view of one regulation

use super::AppContext;
use crate::render;
use anyhow::{bail, Context, Result};

/// Run the show command
pub async fn run(ctx: &AppContext, id: &str) -> Result<()> {
    let store = ctx.store()?;
    store.select_regulation(id).await;

    let snapshot = store.snapshot();
    if let Some(message) = snapshot.error {
        bail!(message);
    }
    let regulation = snapshot
        .selected
        .with_context(|| format!("Regulation {id} not loaded"))?;

    if ctx.json {
        return ctx.print_json(&regulation);
    }
    let reference = ctx.reference();
    let detail = render::regulation_detail(&regulation, &reference);
    let mut lines = detail.lines();
    if let Some(title) = lines.next() {
        println!("{}", ctx.heading(title));
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
