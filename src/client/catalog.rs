// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Client for the read-only catalog API
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/regulations/count/` | Connectivity probe and total count |
//! | GET | `/regulations/?page=&limit=` | Paginated list |
//! | GET | `/regulations/{id}` | Detail |

use super::{normalize, send, send_json, ApiError, RegulationSource};
use crate::config::Config;
use crate::types::Regulation;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const COUNT_ROUTE: &str = "regulations/count/";
const LIST_ROUTE: &str = "regulations/";
const DETAIL_SEGMENT: &str = "regulations";

/// Client for the catalog API
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a client for `base_url`
    pub fn new(base_url: Url, timeout_secs: u32) -> Result<Self, ApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(Self {
            http: super::http_client(timeout_secs, headers)?,
            base_url,
        })
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_url()?, config.timeout_secs)
    }

    /// Base URL this client talks to
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/regulations/{id}` with `id` percent-encoded as one segment
    fn detail_url(&self, endpoint: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Malformed {
                endpoint: endpoint.into(),
                message: format!("base URL {} cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend([DETAIL_SEGMENT, id]);
        Ok(url)
    }
}

#[async_trait]
impl RegulationSource for CatalogClient {
    async fn probe(&self) -> Result<(), ApiError> {
        let url = super::join(&self.base_url, COUNT_ROUTE);
        send("GET /regulations/count/", self.http.get(&url)).await?;
        info!(base_url = %self.base_url, "catalog backend reachable");
        Ok(())
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let endpoint = "GET /regulations/count/";
        let url = super::join(&self.base_url, COUNT_ROUTE);
        let body: Value = send_json(endpoint, self.http.get(&url)).await?;
        let count = normalize::count(endpoint, &body)?;
        debug!(count, "fetched regulation count");
        Ok(count)
    }

    async fn list_page(
        &self,
        page: u32,
        limit: u32,
        filters: &[(String, String)],
    ) -> Result<Vec<Regulation>, ApiError> {
        let endpoint = "GET /regulations/";
        let url = super::join(&self.base_url, LIST_ROUTE);
        let request = self
            .http
            .get(&url)
            .query(&[("page", page), ("limit", limit)])
            .query(filters);
        let body: Value = send_json(endpoint, request).await?;
        let regulations = normalize::regulation_list(endpoint, &body)?;
        debug!(page, limit, filters = filters.len(), fetched = regulations.len(), "fetched regulation page");
        Ok(regulations)
    }

    async fn get(&self, id: &str) -> Result<Regulation, ApiError> {
        let endpoint = format!("GET /regulations/{id}");
        let url = self.detail_url(&endpoint, id)?;
        let resp = self.http.get(url);
        let body: Value = match send_json(&endpoint, resp).await {
            Err(ApiError::Status { status: 404, .. }) => {
                return Err(ApiError::NotFound { endpoint });
            }
            other => other?,
        };
        normalize::regulation_envelope(&endpoint, &body)
    }
}
