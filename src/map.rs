// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Map projection of regulations onto municipality coordinates

use crate::reference::ReferenceData;
use crate::types::Regulation;
use serde::Serialize;
use tracing::debug;

/// A regulation placed on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    /// Regulation id
    pub regulation_id: String,
    /// Regulation title
    pub title: String,
    /// Municipality name as matched in the coordinate table
    pub municipality: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Markers for a set of regulations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapProjection {
    /// One marker per placed regulation
    pub markers: Vec<MapMarker>,
    /// Regulations with a municipality that could not be resolved
    pub unplaced: usize,
}

/// Place every regulation that names a municipality
///
/// Regulations without a municipality are ignored; those whose
/// municipality is not in the coordinate table count as unplaced.
#[must_use]
pub fn markers(regulations: &[Regulation], reference: &ReferenceData) -> MapProjection {
    let mut projection = MapProjection::default();

    for regulation in regulations {
        let city = regulation.ciudad.trim();
        if city.is_empty() {
            continue;
        }
        match reference.municipality_point(city) {
            Some(point) => projection.markers.push(MapMarker {
                regulation_id: regulation.id.clone(),
                title: regulation.titulo.clone(),
                municipality: point.name.clone(),
                lat: point.lat,
                lng: point.lng,
            }),
            None => {
                debug!(id = %regulation.id, city, "no coordinates for municipality");
                projection.unplaced += 1;
            }
        }
    }

    projection
}
