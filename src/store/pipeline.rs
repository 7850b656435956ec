// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Visible-set computation
//!
//! Stages run in a fixed order (search, ambito, scale, territorial,
//! location) and each one narrows the output of the previous one.

use super::filters::{FilterSection, FilterState};
use super::StoreError;
use crate::types::{Descriptor, LocationFilter, Regulation, TerritorialLevel};
use std::collections::{BTreeSet, HashMap};

/// Run the whole pipeline over the cached set
pub fn run<'a>(
    cache: &'a [Regulation],
    query: &str,
    filters: &FilterState,
    location: &LocationFilter,
) -> Result<Vec<&'a Regulation>, StoreError> {
    let descriptors = parse_options(FilterSection::Ambito, filters, Descriptor::from_option_id)?;
    let levels = parse_options(FilterSection::Territorial, filters, TerritorialLevel::from_option_id)?;
    let scales = filters.selected(FilterSection::Scale);

    Ok(cache
        .iter()
        .filter(|r| matches_search(r, query))
        .filter(|r| descriptors.iter().all(|d| r.has_descriptor(*d)))
        .filter(|r| scales.is_empty() || scales.contains(&r.escala_normativa))
        .filter(|r| levels.is_empty() || r.territorial_level().is_some_and(|l| levels.contains(&l)))
        .filter(|r| matches_location(r, location))
        .collect())
}

/// Case-insensitive substring match on title, municipality and ambito
///
/// An empty query matches everything.
#[must_use]
pub fn matches_search(regulation: &Regulation, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    [&regulation.titulo, &regulation.ciudad, &regulation.ambito]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Case-insensitive exact match for every given location level
#[must_use]
pub fn matches_location(regulation: &Regulation, location: &LocationFilter) -> bool {
    let level_matches = |wanted: &Option<String>, actual: &str| match wanted.as_deref() {
        None | Some("") => true,
        Some(wanted) => actual.to_lowercase() == wanted.to_lowercase(),
    };
    level_matches(&location.ccaa, &regulation.ccaa)
        && level_matches(&location.provincia, &regulation.provincia)
        && level_matches(&location.municipio, &regulation.ciudad)
}

fn parse_options<T: Ord>(
    section: FilterSection,
    filters: &FilterState,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<BTreeSet<T>, StoreError> {
    filters
        .selected(section)
        .iter()
        .map(|option| {
            parse(option).ok_or_else(|| StoreError::UnknownOption {
                section,
                option: option.clone(),
            })
        })
        .collect()
}

/// Merge a fetched batch into the cache by id
///
/// Records already cached are replaced in place, new ones are appended in
/// batch order. Returns how many new ids were added.
pub fn merge_by_id(cache: &mut Vec<Regulation>, batch: Vec<Regulation>) -> usize {
    let mut index: HashMap<String, usize> = cache
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    let mut added = 0;
    for regulation in batch {
        if let Some(&pos) = index.get(&regulation.id) {
            cache[pos] = regulation;
        } else {
            index.insert(regulation.id.clone(), cache.len());
            cache.push(regulation);
            added += 1;
        }
    }
    added
}
