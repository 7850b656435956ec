// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Admin CRUD against the hosted backend's `registros` table
//!
//! The backend exposes a PostgREST-style table API under
//! `{backend}/rest/v1/registros`. Rows are keyed by an integer `id`, and
//! the region is stored in an uppercase `CCAA` column while the form uses
//! `ccaa`; [`RegulationForm::to_row`] and the read-side normalizer handle
//! the mapping.

use super::{normalize, send, send_json, ApiError};
use crate::config::Config;
use crate::types::{Regulation, TerritorialLevel, NORMATIVE_SCALE_CODES};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use url::Url;

const TABLE_ROUTE: &str = "rest/v1/registros";

/// Editable fields of a regulation, as entered in the admin form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationForm {
    /// Title (required)
    pub titulo: String,
    /// Normative scale code (required)
    pub escala_normativa: String,
    /// Territorial scope code (required)
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
    /// Source URL (required)
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
}

impl RegulationForm {
    /// Prefill a form from an existing regulation
    #[must_use]
    pub fn from_regulation(reg: &Regulation) -> Self {
        Self {
            titulo: reg.titulo.clone(),
            escala_normativa: reg.escala_normativa.clone(),
            ambito: reg.ambito.clone(),
            ccaa: reg.ccaa.clone(),
            provincia: reg.provincia.clone(),
            ciudad: reg.ciudad.clone(),
            url: reg.url.clone(),
            sostenibilidad_economica: reg.sostenibilidad_economica.clone(),
            sostenibilidad_social: reg.sostenibilidad_social.clone(),
            sostenibilidad_ambiental: reg.sostenibilidad_ambiental.clone(),
            cambio_climatico: reg.cambio_climatico.clone(),
            gobernanza_urbana: reg.gobernanza_urbana.clone(),
        }
    }

    /// Check required fields, known codes and the location hierarchy
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();

        for (value, label) in [
            (&self.titulo, "título"),
            (&self.escala_normativa, "escala normativa"),
            (&self.ambito, "ámbito territorial"),
            (&self.url, "URL"),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("El campo {label} es obligatorio"));
            }
        }

        if !self.escala_normativa.is_empty()
            && !NORMATIVE_SCALE_CODES.contains(&self.escala_normativa.as_str())
        {
            problems.push(format!("Escala normativa desconocida: {}", self.escala_normativa));
        }
        if !self.ambito.is_empty() && TerritorialLevel::from_ambito_code(&self.ambito).is_none() {
            problems.push(format!("Ámbito territorial desconocido: {}", self.ambito));
        }
        if !self.provincia.is_empty() && self.ccaa.is_empty() {
            problems.push("La provincia requiere una comunidad autónoma".to_string());
        }
        if !self.ciudad.is_empty() && self.provincia.is_empty() {
            problems.push("El municipio requiere una provincia".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(problems))
        }
    }

    /// Serialize to a table row, writing the region as `CCAA`
    #[must_use]
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        for (column, value) in [
            ("titulo", &self.titulo),
            ("escala_normativa", &self.escala_normativa),
            ("ambito", &self.ambito),
            ("CCAA", &self.ccaa),
            ("provincia", &self.provincia),
            ("ciudad", &self.ciudad),
            ("url", &self.url),
            ("sostenibilidad_economica", &self.sostenibilidad_economica),
            ("sostenibilidad_social", &self.sostenibilidad_social),
            ("sostenibilidad_ambiental", &self.sostenibilidad_ambiental),
            ("cambio_climatico", &self.cambio_climatico),
            ("gobernanza_urbana", &self.gobernanza_urbana),
        ] {
            row.insert(column.to_string(), Value::String(value.clone()));
        }
        row
    }
}

/// One page of the admin listing
#[derive(Debug, Clone)]
pub struct AdminPage {
    /// Rows on this page
    pub regulations: Vec<Regulation>,
    /// Total rows matching the query, when the backend reported it
    pub total: Option<u64>,
}

/// Client for the hosted backend table API
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    table_url: String,
}

impl AdminClient {
    /// Create a client for `backend_url` authenticated with `api_key`
    pub fn new(backend_url: &Url, api_key: &str, timeout_secs: u32) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| ApiError::Config(crate::config::ConfigError::Missing("backend_key")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ApiError::Config(crate::config::ConfigError::Missing("backend_key")))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        Ok(Self {
            http: super::http_client(timeout_secs, headers)?,
            table_url: super::join(backend_url, TABLE_ROUTE),
        })
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let (url, key) = config.backend()?;
        Self::new(&url, &key, config.timeout_secs)
    }

    /// Exact number of rows in the table
    pub async fn count(&self) -> Result<u64, ApiError> {
        let endpoint = "GET /registros (count)";
        let request = self
            .http
            .get(&self.table_url)
            .query(&[("select", "id"), ("limit", "1")])
            .header("Prefer", "count=exact");
        let resp = send(endpoint, request).await?;
        content_range_total(resp.headers()).ok_or_else(|| ApiError::Malformed {
            endpoint: endpoint.into(),
            message: "missing Content-Range total".into(),
        })
    }

    /// One page of rows ordered by id, optionally filtered by title
    pub async fn list(
        &self,
        page: u32,
        per_page: u32,
        title_search: Option<&str>,
    ) -> Result<AdminPage, ApiError> {
        let endpoint = "GET /registros";
        let offset = u64::from(page.max(1) - 1) * u64::from(per_page);
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "id.asc".to_string()),
            ("offset".to_string(), offset.to_string()),
            ("limit".to_string(), per_page.to_string()),
        ];
        if let Some(term) = title_search.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(("titulo".to_string(), format!("ilike.*{term}*")));
        }

        let request = self
            .http
            .get(&self.table_url)
            .query(&query)
            .header("Prefer", "count=exact");
        let resp = send(endpoint, request).await?;
        let total = content_range_total(resp.headers());
        let body: Value = resp.json().await.map_err(|e| ApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;

        Ok(AdminPage {
            regulations: normalize::regulation_list(endpoint, &body)?,
            total,
        })
    }

    /// Fetch one row by id
    pub async fn get(&self, id: i64) -> Result<Regulation, ApiError> {
        let endpoint = format!("GET /registros?id=eq.{id}");
        let request = self
            .http
            .get(&self.table_url)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let body: Value = send_json(&endpoint, request).await?;
        first_row(endpoint, &body)
    }

    /// Insert a new row; the id is the current maximum plus one
    pub async fn insert(&self, form: &RegulationForm) -> Result<Regulation, ApiError> {
        form.validate()?;
        let next_id = self.max_id().await?.map_or(1, |max| max + 1);

        let mut row = form.to_row();
        row.insert("id".into(), Value::from(next_id));
        row.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));

        let endpoint = "POST /registros".to_string();
        let request = self
            .http
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![Value::Object(row)]));
        let body: Value = send_json(&endpoint, request).await?;
        let created = first_row(endpoint, &body)?;
        info!(id = %created.id, "regulation created");
        Ok(created)
    }

    /// Update an existing row
    pub async fn update(&self, id: i64, form: &RegulationForm) -> Result<Regulation, ApiError> {
        form.validate()?;
        let endpoint = format!("PATCH /registros?id=eq.{id}");
        let request = self
            .http
            .patch(&self.table_url)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&Value::Object(form.to_row()));
        let body: Value = send_json(&endpoint, request).await?;
        let updated = first_row(endpoint, &body)?;
        info!(id, "regulation updated");
        Ok(updated)
    }

    /// Delete a row
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let endpoint = format!("DELETE /registros?id=eq.{id}");
        let request = self
            .http
            .delete(&self.table_url)
            .query(&[("id", format!("eq.{id}"))]);
        send(&endpoint, request).await?;
        info!(id, "regulation deleted");
        Ok(())
    }

    async fn max_id(&self) -> Result<Option<i64>, ApiError> {
        let endpoint = "GET /registros (max id)";
        let request = self
            .http
            .get(&self.table_url)
            .query(&[("select", "id"), ("order", "id.desc"), ("limit", "1")]);
        let body: Value = send_json(endpoint, request).await?;
        Ok(body
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("id"))
            .and_then(Value::as_i64))
    }
}

/// Parse the total out of `Content-Range: 0-9/57` (or `*/0`)
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit_once('/')?
        .1
        .parse()
        .ok()
}

fn first_row(endpoint: String, body: &Value) -> Result<Regulation, ApiError> {
    match body {
        Value::Array(rows) => match rows.first() {
            Some(row) => normalize::regulation(&endpoint, row),
            None => Err(ApiError::NotFound { endpoint }),
        },
        other => normalize::regulation(&endpoint, other),
    }
}
