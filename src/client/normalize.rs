// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Normalization of loosely typed backend payloads
//!
//! Backend variants disagree on envelopes (`results` vs `data`), on the
//! type of `id` (number or string), on `disponible` (boolean or the
//! strings `"true"`/`"false"`) and on the case of the region column
//! (`ccaa` vs `CCAA`). Everything is coerced here so that only strict
//! [`Regulation`] values leave the client.

use super::ApiError;
use crate::types::Regulation;
use serde_json::{Map, Value};

/// Text columns copied into a [`Regulation`]
const TEXT_FIELDS: [&str; 14] = [
    "titulo",
    "escala_normativa",
    "ambito",
    "ccaa",
    "provincia",
    "ciudad",
    "url",
    "sostenibilidad_economica",
    "sostenibilidad_social",
    "sostenibilidad_ambiental",
    "cambio_climatico",
    "gobernanza_urbana",
    "date",
    "resumen",
];

/// Normalize one regulation object
pub fn regulation(endpoint: &str, value: &Value) -> Result<Regulation, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed(endpoint, "regulation is not an object"))?;

    let id = obj
        .get("id")
        .and_then(scalar_to_string)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| malformed(endpoint, "regulation without id"))?;

    let mut canonical = Map::new();
    canonical.insert("id".into(), Value::String(id));
    for field in TEXT_FIELDS {
        let raw = match field {
            // The hosted table stores the region in an uppercase column.
            "ccaa" => obj.get("ccaa").or_else(|| obj.get("CCAA")),
            other => obj.get(other),
        };
        let text = raw.and_then(scalar_to_string).unwrap_or_default();
        canonical.insert(field.into(), Value::String(text));
    }
    canonical.insert(
        "disponible".into(),
        Value::Bool(obj.get("disponible").is_some_and(truthy)),
    );

    serde_json::from_value(Value::Object(canonical))
        .map_err(|e| malformed(endpoint, &e.to_string()))
}

/// Normalize a detail response: a bare object or `{ "data": {...} }`
pub fn regulation_envelope(endpoint: &str, value: &Value) -> Result<Regulation, ApiError> {
    match value.get("data") {
        Some(inner) if inner.is_object() => regulation(endpoint, inner),
        _ => regulation(endpoint, value),
    }
}

/// Normalize a list response: `{ "results": [...] }`, `{ "data": [...] }`
/// or a bare array. A missing list is treated as empty.
pub fn regulation_list(endpoint: &str, value: &Value) -> Result<Vec<Regulation>, ApiError> {
    let items: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("results").or_else(|| obj.get("data")) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::Null) | None => &[],
            Some(_) => return Err(malformed(endpoint, "list envelope is not an array")),
        },
        _ => return Err(malformed(endpoint, "list response is not an object or array")),
    };

    items.iter().map(|item| regulation(endpoint, item)).collect()
}

/// Extract `{ "count": n }`; absent or null counts are zero
pub fn count(endpoint: &str, value: &Value) -> Result<u64, ApiError> {
    match value.get("count") {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| malformed(endpoint, "count is not a non-negative integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| malformed(endpoint, "count is not numeric")),
        Some(_) => Err(malformed(endpoint, "count has an unexpected type")),
    }
}

/// Render a scalar as a string; arrays and objects are rejected
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

fn malformed(endpoint: &str, message: &str) -> ApiError {
    ApiError::Malformed {
        endpoint: endpoint.into(),
        message: message.into(),
    }
}
