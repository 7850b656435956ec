// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Facet filter selections

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A facet filter section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSection {
    /// Sustainability descriptors (`economic`, `climate`, ...)
    Ambito,
    /// Normative scale codes
    Scale,
    /// Territorial levels (`comunitario`, `estatal`, ...)
    Territorial,
}

impl FilterSection {
    /// Every configured section
    pub const ALL: [Self; 3] = [Self::Ambito, Self::Scale, Self::Territorial];

    /// Section key
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ambito => "ambito",
            Self::Scale => "scale",
            Self::Territorial => "territorial",
        }
    }
}

impl fmt::Display for FilterSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("unknown filter section '{s}' (expected ambito, scale or territorial)"))
    }
}

/// Selected options per section
///
/// Every section is always present as a key, possibly with an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    sections: BTreeMap<FilterSection, BTreeSet<String>>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            sections: FilterSection::ALL
                .into_iter()
                .map(|section| (section, BTreeSet::new()))
                .collect(),
        }
    }
}

impl FilterState {
    /// Empty selections for every section
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `option` if absent, remove it if present
    pub fn toggle(&mut self, section: FilterSection, option: &str) {
        let selected = self.sections.entry(section).or_default();
        if !selected.remove(option) {
            selected.insert(option.to_string());
        }
    }

    /// Empty one section
    pub fn clear(&mut self, section: FilterSection) {
        self.sections.entry(section).or_default().clear();
    }

    /// Empty every section
    pub fn clear_all(&mut self) {
        for selected in self.sections.values_mut() {
            selected.clear();
        }
    }

    /// Options selected in a section
    #[must_use]
    pub fn selected(&self, section: FilterSection) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.sections.get(&section).unwrap_or(&EMPTY)
    }

    /// True when any section has a selection
    #[must_use]
    pub fn any_selected(&self) -> bool {
        self.sections.values().any(|selected| !selected.is_empty())
    }

    /// Iterate over `(section, selection)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (FilterSection, &BTreeSet<String>)> {
        self.sections.iter().map(|(section, selected)| (*section, selected))
    }
}
