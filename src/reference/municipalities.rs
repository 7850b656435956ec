// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Municipality coordinate table (IGN nomenclator export)

use super::{MunicipalityPoint, ReferenceError};

const PROVINCE_COL: usize = 4;
const NAME_COL: usize = 5;
const LONGITUDE_COL: usize = 13;
const LATITUDE_COL: usize = 14;
const MIN_COLUMNS: usize = 15;

/// Parse the `;`-separated municipality table
///
/// The first line is a header. Coordinates use a comma as decimal
/// separator. Rows with fewer than fifteen columns, an empty name or
/// unparsable coordinates are skipped.
pub fn parse_points(raw: &[u8], file: &str) -> Result<Vec<MunicipalityPoint>, ReferenceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(raw);

    let mut points = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| ReferenceError::Csv {
            file: file.to_string(),
            source: e,
        })?;
        if record.len() < MIN_COLUMNS {
            continue;
        }

        let field = |i: usize| {
            record
                .get(i)
                .map(|b| String::from_utf8_lossy(b).trim().to_string())
                .unwrap_or_default()
        };
        let name = field(NAME_COL);
        if name.is_empty() {
            continue;
        }
        let (Some(lng), Some(lat)) = (coordinate(&field(LONGITUDE_COL)), coordinate(&field(LATITUDE_COL)))
        else {
            continue;
        };

        points.push(MunicipalityPoint {
            name,
            province: field(PROVINCE_COL),
            lat,
            lng,
        });
    }
    Ok(points)
}

fn coordinate(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}
