// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Plain-text rendering of regulations
//!
//! Codes are shown next to their reference-table labels. Colour is added
//! by the commands, never here.

use crate::reference::ReferenceData;
use crate::store::StoreSnapshot;
use crate::types::{Descriptor, Regulation};
use chrono::{DateTime, NaiveDate};
use std::fmt::Write;

/// One-line listing entry
#[must_use]
pub fn regulation_row(regulation: &Regulation, reference: &ReferenceData) -> String {
    let place = [&regulation.ciudad, &regulation.provincia, &regulation.ccaa]
        .into_iter()
        .find(|p| !p.is_empty())
        .cloned()
        .unwrap_or_else(|| reference.ambito_description(&regulation.ambito));

    format!(
        "[{}] {} | {} | {}",
        regulation.id,
        regulation.titulo,
        reference.scale_description(&regulation.escala_normativa),
        place
    )
}

/// Multi-line detail view
#[must_use]
pub fn regulation_detail(regulation: &Regulation, reference: &ReferenceData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", regulation.titulo);
    let _ = writeln!(out, "Id: {}", regulation.id);
    let _ = writeln!(
        out,
        "Escala normativa: {}",
        labelled(&regulation.escala_normativa, &reference.scale_description(&regulation.escala_normativa))
    );
    let _ = writeln!(
        out,
        "Ámbito: {}",
        labelled(&regulation.ambito, &reference.ambito_description(&regulation.ambito))
    );

    let location: Vec<&str> = [&regulation.ciudad, &regulation.provincia, &regulation.ccaa]
        .into_iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .collect();
    if !location.is_empty() {
        let _ = writeln!(out, "Ubicación: {}", location.join(", "));
    }
    if !regulation.date.is_empty() {
        let _ = writeln!(out, "Fecha: {}", format_date(&regulation.date));
    }
    let _ = writeln!(out, "Disponible: {}", if regulation.disponible { "sí" } else { "no" });
    if !regulation.url.is_empty() {
        let _ = writeln!(out, "URL: {}", regulation.url);
    }
    if !regulation.resumen.is_empty() {
        let _ = writeln!(out, "Resumen: {}", regulation.resumen);
    }

    let descriptors: Vec<Descriptor> = Descriptor::ALL
        .into_iter()
        .filter(|d| regulation.has_descriptor(*d))
        .collect();
    if !descriptors.is_empty() {
        let _ = writeln!(out, "Descriptores:");
        for descriptor in descriptors {
            let labels: Vec<String> = reference
                .describe_codes(regulation.descriptor(descriptor))
                .into_iter()
                .map(|label| labelled(&label.code, &label.description))
                .collect();
            let _ = writeln!(out, "  {}: {}", descriptor.label(), labels.join("; "));
        }
    }
    out
}

/// Status line for a store snapshot
#[must_use]
pub fn summary(snapshot: &StoreSnapshot) -> String {
    let mut line = format!(
        "Mostrando {} de {} normativas",
        snapshot.regulations.len(),
        snapshot.total_count
    );
    if snapshot.filter_active {
        line.push_str(" (filtros activos)");
    }
    if !snapshot.search_query.is_empty() {
        let _ = write!(line, " [búsqueda: \"{}\"]", snapshot.search_query);
    }
    line
}

/// Publication date as `dd/mm/yyyy` when it parses, verbatim otherwise
#[must_use]
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return stamp.format("%d/%m/%Y").to_string();
    }
    raw.to_string()
}

fn labelled(code: &str, description: &str) -> String {
    if code == description {
        code.to_string()
    } else {
        format!("{description} ({code})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Regulation {
        Regulation {
            id: "42".into(),
            titulo: "Ordenanza de movilidad sostenible".into(),
            escala_normativa: "PLAN_URB".into(),
            ambito: "MUN".into(),
            ccaa: "Comunidad de Madrid".into(),
            provincia: "Madrid".into(),
            ciudad: "Getafe".into(),
            url: "https://example.org/42.pdf".into(),
            gobernanza_urbana: "GOB-04;GOB-99".into(),
            cambio_climatico: "CLI-01".into(),
            date: "2023-05-17".into(),
            disponible: true,
            ..Regulation::default()
        }
    }

    #[test]
    fn row() {
        let reference = ReferenceData::bundled();
        insta::assert_snapshot!(
            regulation_row(&sample(), &reference),
            @"[42] Ordenanza de movilidad sostenible | Plan Urbanístico | Getafe"
        );
    }

    #[test]
    fn detail() {
        let reference = ReferenceData::bundled();
        insta::assert_snapshot!(regulation_detail(&sample(), &reference).trim_end(), @r"
        Ordenanza de movilidad sostenible
        Id: 42
        Escala normativa: Plan Urbanístico (PLAN_URB)
        Ámbito: Municipal (MUN)
        Ubicación: Getafe, Madrid, Comunidad de Madrid
        Fecha: 17/05/2023
        Disponible: sí
        URL: https://example.org/42.pdf
        Descriptores:
          Cambio Climático: Mitigación de emisiones (CLI-01)
          Gobernanza Urbana: Movilidad urbana sostenible (GOB-04); GOB-99
        ");
    }

    #[test]
    fn dates_that_do_not_parse_are_kept() {
        assert_eq!(format_date("2021-01-02T10:00:00+00:00"), "02/01/2021");
        assert_eq!(format_date("marzo 2020"), "marzo 2020");
    }

    #[test]
    fn summary_mentions_filters_and_search() {
        let snapshot = StoreSnapshot {
            total_count: 3,
            filter_active: true,
            search_query: "agua".into(),
            ..StoreSnapshot::default()
        };
        assert_eq!(
            summary(&snapshot),
            "Mostrando 0 de 3 normativas (filtros activos) [búsqueda: \"agua\"]"
        );
    }
}
