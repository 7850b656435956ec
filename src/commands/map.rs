// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Map command - place the filtered regulations on municipality coordinates

use super::list::{load_filtered, FilterArgs};
use super::AppContext;
use crate::map;
use anyhow::Result;

/// Run the map command
pub async fn run(ctx: &AppContext, filters: &FilterArgs) -> Result<()> {
    let store = load_filtered(ctx, filters).await?;
    let reference = ctx.reference();
    let projection = map::markers(&store.regulations(), &reference);

    if ctx.json {
        return ctx.print_json(&projection);
    }

    println!(
        "{}",
        ctx.heading(&format!("{} normativas ubicadas", projection.markers.len()))
    );
    for marker in &projection.markers {
        println!(
            "{:>10.5} {:>10.5}  {}  [{}] {}",
            marker.lat, marker.lng, marker.municipality, marker.regulation_id, marker.title
        );
    }
    if projection.unplaced > 0 {
        println!(
            "{}",
            ctx.dim(&format!("{} sin coordenadas conocidas", projection.unplaced))
        );
    }
    Ok(())
}
