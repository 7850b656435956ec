// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Static reference tables
//!
//! Region / province / municipality hierarchies, municipality coordinates
//! and the code tables used to label ambito, normative scale and thesaurus
//! codes. A [`ReferenceData`] reads each table at most once and keeps it
//! for its own lifetime; there is no invalidation.

mod municipalities;

pub use municipalities::parse_points;

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// File names inside a reference data directory
pub mod files {
    /// Autonomous communities
    pub const REGIONS: &str = "autonomias.json";
    /// Provinces
    pub const PROVINCES: &str = "provincias.json";
    /// Municipalities
    pub const MUNICIPALITIES: &str = "municipios.json";
    /// Municipality coordinates (`;`-separated)
    pub const MUNICIPALITY_POINTS: &str = "municipios.csv";
    /// Ambito code table
    pub const AMBITO: &str = "ambito.json";
    /// Normative scale code table
    pub const SCALES: &str = "escala_normativa.json";
    /// Thematic thesaurus
    pub const THESAURUS: &str = "tesauro.json";
}

// =============================================================================
// Records
// =============================================================================

/// Autonomous community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Synthetic id
    #[serde(rename = "autonomia_id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Province, child of a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    /// Synthetic id
    #[serde(rename = "provincia_id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Parent region id
    #[serde(rename = "comunidad_id", deserialize_with = "string_or_number")]
    pub region_id: String,
}

/// Municipality, child of a province
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    /// Synthetic id
    #[serde(rename = "municipio_id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Parent province id
    #[serde(rename = "provincia_id", deserialize_with = "string_or_number")]
    pub province_id: String,
}

/// Municipality with ETRS89 coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityPoint {
    /// Current official name
    pub name: String,
    /// Province name
    pub province: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Entry of a code table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDescription {
    /// Code as stored on regulations
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Human-readable description
    #[serde(rename = "descripcion")]
    pub description: String,
}

/// Entry of the thematic thesaurus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesaurusEntry {
    /// Thesaurus code
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Human-readable description
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Parent category
    #[serde(rename = "categoria_padre", default)]
    pub parent_category: String,
}

/// A code together with its resolved description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLabel {
    /// The raw code
    pub code: String,
    /// Its description, or the code itself when unknown
    pub description: String,
}

/// Errors from loading reference tables
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// A table file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// A JSON table is malformed
    #[error("failed to parse {file}: {source}")]
    Json {
        /// File name
        file: String,
        /// Underlying error
        source: serde_json::Error,
    },
    /// The municipality CSV is malformed
    #[error("failed to parse {file}: {source}")]
    Csv {
        /// File name
        file: String,
        /// Underlying error
        source: csv::Error,
    },
}

// =============================================================================
// Loader
// =============================================================================

#[derive(Debug, Clone)]
enum DataSource {
    Dir(PathBuf),
    Bundled,
}

/// Lazily loaded, instance-scoped reference tables
#[derive(Debug)]
pub struct ReferenceData {
    source: DataSource,
    regions: OnceLock<Vec<Region>>,
    provinces: OnceLock<Vec<Province>>,
    municipalities: OnceLock<Vec<Municipality>>,
    points: OnceLock<Vec<MunicipalityPoint>>,
    ambito: OnceLock<Vec<CodeDescription>>,
    scales: OnceLock<Vec<CodeDescription>>,
    thesaurus: OnceLock<Vec<ThesaurusEntry>>,
}

impl ReferenceData {
    /// Tables read from files in `dir`
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_source(DataSource::Dir(dir.into()))
    }

    /// Tables compiled into the binary
    #[must_use]
    pub fn bundled() -> Self {
        Self::with_source(DataSource::Bundled)
    }

    /// Tables from `dir` when given, bundled otherwise
    #[must_use]
    pub fn from_optional_dir(dir: Option<&Path>) -> Self {
        dir.map_or_else(Self::bundled, Self::from_dir)
    }

    fn with_source(source: DataSource) -> Self {
        Self {
            source,
            regions: OnceLock::new(),
            provinces: OnceLock::new(),
            municipalities: OnceLock::new(),
            points: OnceLock::new(),
            ambito: OnceLock::new(),
            scales: OnceLock::new(),
            thesaurus: OnceLock::new(),
        }
    }

    /// Load every table now, surfacing the first error
    pub fn preload(&self) -> Result<(), ReferenceError> {
        self.regions()?;
        self.provinces()?;
        self.municipalities()?;
        self.municipality_points()?;
        self.ambito_table()?;
        self.scale_table()?;
        self.thesaurus()?;
        Ok(())
    }

    /// True once every table has been loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.regions.get().is_some()
            && self.provinces.get().is_some()
            && self.municipalities.get().is_some()
            && self.points.get().is_some()
            && self.ambito.get().is_some()
            && self.scales.get().is_some()
            && self.thesaurus.get().is_some()
    }

    // -- tables ---------------------------------------------------------------

    /// All autonomous communities
    pub fn regions(&self) -> Result<&[Region], ReferenceError> {
        self.json_table(&self.regions, files::REGIONS)
    }

    /// All provinces
    pub fn provinces(&self) -> Result<&[Province], ReferenceError> {
        self.json_table(&self.provinces, files::PROVINCES)
    }

    /// All municipalities
    pub fn municipalities(&self) -> Result<&[Municipality], ReferenceError> {
        self.json_table(&self.municipalities, files::MUNICIPALITIES)
    }

    /// Ambito code table
    pub fn ambito_table(&self) -> Result<&[CodeDescription], ReferenceError> {
        self.json_table(&self.ambito, files::AMBITO)
    }

    /// Normative scale code table
    pub fn scale_table(&self) -> Result<&[CodeDescription], ReferenceError> {
        self.json_table(&self.scales, files::SCALES)
    }

    /// Thematic thesaurus
    pub fn thesaurus(&self) -> Result<&[ThesaurusEntry], ReferenceError> {
        self.json_table(&self.thesaurus, files::THESAURUS)
    }

    /// Municipalities with coordinates
    pub fn municipality_points(&self) -> Result<&[MunicipalityPoint], ReferenceError> {
        if let Some(points) = self.points.get() {
            return Ok(points);
        }
        let raw = self.read(files::MUNICIPALITY_POINTS)?;
        let parsed = parse_points(raw.as_bytes(), files::MUNICIPALITY_POINTS)?;
        debug!(count = parsed.len(), "loaded municipality coordinates");
        Ok(self.points.get_or_init(|| parsed))
    }

    // -- hierarchy ------------------------------------------------------------

    /// Provinces belonging to a region
    pub fn provinces_of(&self, region_id: &str) -> Result<Vec<&Province>, ReferenceError> {
        Ok(self
            .provinces()?
            .iter()
            .filter(|p| p.region_id == region_id)
            .collect())
    }

    /// Municipalities belonging to a province
    pub fn municipalities_of(&self, province_id: &str) -> Result<Vec<&Municipality>, ReferenceError> {
        Ok(self
            .municipalities()?
            .iter()
            .filter(|m| m.province_id == province_id)
            .collect())
    }

    /// Region by display name, case-insensitive
    pub fn region_named(&self, name: &str) -> Result<Option<&Region>, ReferenceError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .regions()?
            .iter()
            .find(|r| r.name.to_lowercase() == wanted))
    }

    /// Province by display name, case-insensitive
    pub fn province_named(&self, name: &str) -> Result<Option<&Province>, ReferenceError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .provinces()?
            .iter()
            .find(|p| p.name.to_lowercase() == wanted))
    }

    // -- labels ---------------------------------------------------------------

    /// Description of an ambito code; the code itself when unknown
    #[must_use]
    pub fn ambito_description(&self, code: &str) -> String {
        describe(code, self.ambito_table(), |t| {
            t.iter().find(|i| i.id == code).map(|i| i.description.clone())
        })
    }

    /// Description of a normative scale code; the code itself when unknown
    #[must_use]
    pub fn scale_description(&self, code: &str) -> String {
        describe(code, self.scale_table(), |t| {
            t.iter().find(|i| i.id == code).map(|i| i.description.clone())
        })
    }

    /// Description of a thesaurus code; the code itself when unknown
    #[must_use]
    pub fn thesaurus_description(&self, code: &str) -> String {
        describe(code, self.thesaurus(), |t| {
            t.iter().find(|i| i.id == code).map(|i| i.description.clone())
        })
    }

    /// Split a `;`-separated code list and label every code
    #[must_use]
    pub fn describe_codes(&self, codes: &str) -> Vec<CodeLabel> {
        codes
            .split(';')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| CodeLabel {
                code: code.to_string(),
                description: self.thesaurus_description(code),
            })
            .collect()
    }

    /// Coordinates for a municipality name
    ///
    /// Tries a case-insensitive exact match first, then a match where
    /// either name contains the other.
    #[must_use]
    pub fn municipality_point(&self, name: &str) -> Option<&MunicipalityPoint> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let points = match self.municipality_points() {
            Ok(points) => points,
            Err(e) => {
                warn!("municipality coordinates unavailable: {e}");
                return None;
            }
        };

        points
            .iter()
            .find(|p| p.name.trim().to_lowercase() == wanted)
            .or_else(|| {
                points.iter().find(|p| {
                    let candidate = p.name.trim().to_lowercase();
                    candidate.contains(&wanted) || wanted.contains(&candidate)
                })
            })
    }

    // -- plumbing -------------------------------------------------------------

    fn json_table<'a, T: serde::de::DeserializeOwned>(
        &'a self,
        cell: &'a OnceLock<Vec<T>>,
        file: &str,
    ) -> Result<&'a [T], ReferenceError> {
        if let Some(table) = cell.get() {
            return Ok(table);
        }
        let raw = self.read(file)?;
        let parsed: Vec<T> = serde_json::from_str(&raw).map_err(|e| ReferenceError::Json {
            file: file.to_string(),
            source: e,
        })?;
        debug!(file, rows = parsed.len(), "loaded reference table");
        Ok(cell.get_or_init(|| parsed))
    }

    fn read(&self, file: &str) -> Result<String, ReferenceError> {
        match &self.source {
            DataSource::Dir(dir) => {
                let path = dir.join(file);
                fs::read_to_string(&path).map_err(|e| ReferenceError::Io { path, source: e })
            }
            DataSource::Bundled => Ok(bundled(file).to_string()),
        }
    }
}

fn bundled(file: &str) -> &'static str {
    match file {
        files::REGIONS => include_str!("../../data/autonomias.json"),
        files::PROVINCES => include_str!("../../data/provincias.json"),
        files::MUNICIPALITIES => include_str!("../../data/municipios.json"),
        files::MUNICIPALITY_POINTS => include_str!("../../data/municipios.csv"),
        files::AMBITO => include_str!("../../data/ambito.json"),
        files::SCALES => include_str!("../../data/escala_normativa.json"),
        files::THESAURUS => include_str!("../../data/tesauro.json"),
        _ => "[]",
    }
}

fn describe<T>(
    code: &str,
    table: Result<&[T], ReferenceError>,
    lookup: impl FnOnce(&[T]) -> Option<String>,
) -> String {
    if code.is_empty() {
        return String::new();
    }
    match table {
        Ok(table) => lookup(table).unwrap_or_else(|| code.to_string()),
        Err(e) => {
            warn!(code, "reference table unavailable: {e}");
            code.to_string()
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
