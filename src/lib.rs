// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Datalex library - catalog of sustainability and urban-governance regulations
//!
//! This crate provides the data layer behind the CitiesDatalex catalog:
//! a typed client for the catalog, chat and backend APIs, a loader for the
//! static reference tables, and the regulation store that keeps the
//! search / filter / pagination state.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod commands;
pub mod config;
pub mod map;
pub mod reference;
pub mod render;
pub mod store;

/// Core data types shared by the client, the store and the commands
pub mod types {
    use serde::{Deserialize, Serialize};

    // =========================================================================
    // Regulation
    // =========================================================================

    /// A single catalog entry.
    ///
    /// Values of this type only ever come out of
    /// [`crate::client::normalize`], so every field is already coerced to
    /// its canonical shape (string id, boolean availability, empty strings
    /// instead of nulls).
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Regulation {
        /// Opaque identifier, unique within a loaded set
        pub id: String,
        /// Title of the document
        #[serde(default)]
        pub titulo: String,
        /// Normative scale code (e.g. `LEY_EST`, `REG_UE`)
        #[serde(default)]
        pub escala_normativa: String,
        /// Territorial scope code (`COM`, `EST`, `CCAA`, `MUN`)
        #[serde(default)]
        pub ambito: String,
        /// Autonomous community name
        #[serde(default)]
        pub ccaa: String,
        /// Province name
        #[serde(default)]
        pub provincia: String,
        /// Municipality name
        #[serde(default)]
        pub ciudad: String,
        /// Source URL
        #[serde(default)]
        pub url: String,
        /// Economic sustainability descriptor
        #[serde(default)]
        pub sostenibilidad_economica: String,
        /// Social sustainability descriptor
        #[serde(default)]
        pub sostenibilidad_social: String,
        /// Environmental sustainability descriptor
        #[serde(default)]
        pub sostenibilidad_ambiental: String,
        /// Climate change descriptor
        #[serde(default)]
        pub cambio_climatico: String,
        /// Urban governance descriptor
        #[serde(default)]
        pub gobernanza_urbana: String,
        /// Publication date as delivered by the backend
        #[serde(default)]
        pub date: String,
        /// Whether the source document is currently available
        #[serde(default)]
        pub disponible: bool,
        /// Summary text
        #[serde(default)]
        pub resumen: String,
    }

    impl Regulation {
        /// Text of one descriptor field
        #[must_use]
        pub fn descriptor(&self, descriptor: Descriptor) -> &str {
            match descriptor {
                Descriptor::Economic => &self.sostenibilidad_economica,
                Descriptor::Social => &self.sostenibilidad_social,
                Descriptor::Environmental => &self.sostenibilidad_ambiental,
                Descriptor::Climate => &self.cambio_climatico,
                Descriptor::Urban => &self.gobernanza_urbana,
            }
        }

        /// Whether a descriptor field carries any content
        #[must_use]
        pub fn has_descriptor(&self, descriptor: Descriptor) -> bool {
            !self.descriptor(descriptor).is_empty()
        }

        /// Territorial level derived from the ambito code
        #[must_use]
        pub fn territorial_level(&self) -> Option<TerritorialLevel> {
            TerritorialLevel::from_ambito_code(&self.ambito)
        }
    }

    /// Normative scale codes accepted by the catalog
    pub const NORMATIVE_SCALE_CODES: [&str; 16] = [
        "DOC_UE",
        "REG_UE",
        "DIR_UE",
        "UNE_ISO",
        "DOC_NA",
        "LEY_EST",
        "REG_EST",
        "LEY_CCAA",
        "REG_CCAA",
        "PLAN_TER",
        "PLAN_URB",
        "WHITE_PAPER",
        "NOTICIA",
        "DECISION",
        "INST_AGREE",
        "OTROS",
    ];

    // =========================================================================
    // Descriptors
    // =========================================================================

    /// The five sustainability / governance descriptor fields
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Descriptor {
        /// `sostenibilidad_economica`
        Economic,
        /// `sostenibilidad_social`
        Social,
        /// `sostenibilidad_ambiental`
        Environmental,
        /// `cambio_climatico`
        Climate,
        /// `gobernanza_urbana`
        Urban,
    }

    impl Descriptor {
        /// All descriptors in display order
        pub const ALL: [Self; 5] = [
            Self::Economic,
            Self::Environmental,
            Self::Climate,
            Self::Social,
            Self::Urban,
        ];

        /// Option id used by the ambito filter section
        #[must_use]
        pub fn option_id(&self) -> &'static str {
            match self {
                Self::Economic => "economic",
                Self::Social => "social",
                Self::Environmental => "environmental",
                Self::Climate => "climate",
                Self::Urban => "urban",
            }
        }

        /// Parse an ambito filter option id
        #[must_use]
        pub fn from_option_id(id: &str) -> Option<Self> {
            Self::ALL.into_iter().find(|d| d.option_id() == id)
        }

        /// Display label
        #[must_use]
        pub fn label(&self) -> &'static str {
            match self {
                Self::Economic => "Sostenibilidad Económica",
                Self::Social => "Sostenibilidad Social",
                Self::Environmental => "Sostenibilidad Ambiental",
                Self::Climate => "Cambio Climático",
                Self::Urban => "Gobernanza Urbana",
            }
        }
    }

    // =========================================================================
    // Territorial levels
    // =========================================================================

    /// Territorial level selected in the territorial filter section
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TerritorialLevel {
        /// European (`COM`)
        Comunitario,
        /// State (`EST`)
        Estatal,
        /// Autonomous community (`CCAA`)
        Autonomico,
        /// Municipal (`MUN`)
        Municipal,
    }

    impl TerritorialLevel {
        /// All levels in display order
        pub const ALL: [Self; 4] = [
            Self::Comunitario,
            Self::Estatal,
            Self::Autonomico,
            Self::Municipal,
        ];

        /// Map an ambito code to its territorial level
        #[must_use]
        pub fn from_ambito_code(code: &str) -> Option<Self> {
            match code {
                "COM" => Some(Self::Comunitario),
                "EST" => Some(Self::Estatal),
                "CCAA" => Some(Self::Autonomico),
                "MUN" => Some(Self::Municipal),
                _ => None,
            }
        }

        /// The ambito code for this level
        #[must_use]
        pub fn ambito_code(&self) -> &'static str {
            match self {
                Self::Comunitario => "COM",
                Self::Estatal => "EST",
                Self::Autonomico => "CCAA",
                Self::Municipal => "MUN",
            }
        }

        /// Option id used by the territorial filter section
        #[must_use]
        pub fn option_id(&self) -> &'static str {
            match self {
                Self::Comunitario => "comunitario",
                Self::Estatal => "estatal",
                Self::Autonomico => "autonomico",
                Self::Municipal => "municipal",
            }
        }

        /// Parse a territorial filter option id
        #[must_use]
        pub fn from_option_id(id: &str) -> Option<Self> {
            Self::ALL.into_iter().find(|l| l.option_id() == id)
        }
    }

    // =========================================================================
    // Location filter
    // =========================================================================

    /// Hierarchical location filter; an absent level does not filter
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LocationFilter {
        /// Autonomous community name
        pub ccaa: Option<String>,
        /// Province name
        pub provincia: Option<String>,
        /// Municipality name
        pub municipio: Option<String>,
    }

    impl LocationFilter {
        /// True when no level carries a non-empty value
        #[must_use]
        pub fn is_empty(&self) -> bool {
            [&self.ccaa, &self.provincia, &self.municipio]
                .iter()
                .all(|level| level.as_deref().map_or(true, str::is_empty))
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
