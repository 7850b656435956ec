// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Typed HTTP clients for the services the catalog talks to
//!
//! - [`catalog::CatalogClient`]: read-only catalog API (probe, count,
//!   paginated list, detail). Implements [`RegulationSource`] for the store.
//! - [`chat::ChatClient`]: document chat sessions, natural-language database
//!   queries, chatbot login and PDF upload.
//! - [`admin::AdminClient`]: table-level CRUD on the hosted backend's
//!   `registros` table.
//!
//! Every loosely typed payload goes through [`normalize`] before it
//! becomes a [`Regulation`]. Non-2xx responses always surface as
//! [`ApiError::Status`]; nothing is retried.

pub mod admin;
pub mod catalog;
pub mod chat;
pub mod normalize;

pub use admin::{AdminClient, RegulationForm};
pub use catalog::CatalogClient;
pub use chat::ChatClient;

use crate::config::ConfigError;
use crate::types::Regulation;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Read access to the regulation catalog, as needed by the store
#[async_trait]
pub trait RegulationSource: Send + Sync {
    /// Lightweight connectivity check
    async fn probe(&self) -> Result<(), ApiError>;

    /// Total number of regulations in the catalog
    async fn count(&self) -> Result<u64, ApiError>;

    /// One page of regulations (pages start at 1)
    ///
    /// `filters` are extra query parameters forwarded to the backend as
    /// given; an empty slice asks for the unfiltered catalog.
    async fn list_page(
        &self,
        page: u32,
        limit: u32,
        filters: &[(String, String)],
    ) -> Result<Vec<Regulation>, ApiError>;

    /// A single regulation by id
    async fn get(&self, id: &str) -> Result<Regulation, ApiError>;
}

/// Errors from remote calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport error
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Logical endpoint, e.g. `GET /regulations/`
        endpoint: String,
        /// Underlying transport error
        source: reqwest::Error,
    },
    /// The service answered with a non-2xx status
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// Logical endpoint
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },
    /// The response body is not valid JSON of the expected shape
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Logical endpoint
        endpoint: String,
        /// Underlying decoding error
        source: reqwest::Error,
    },
    /// The payload parsed but could not be normalized
    #[error("malformed payload from {endpoint}: {message}")]
    Malformed {
        /// Logical endpoint
        endpoint: String,
        /// What was wrong with it
        message: String,
    },
    /// The service answered 2xx but reported a failure status in the body
    #[error("{endpoint} rejected the request: {message}")]
    Rejected {
        /// Logical endpoint
        endpoint: String,
        /// Message reported by the service
        message: String,
    },
    /// Login failed
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The requested record does not exist
    #[error("{endpoint}: record not found")]
    NotFound {
        /// Logical endpoint
        endpoint: String,
    },
    /// An admin form did not validate
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    /// Client construction failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Build the shared `reqwest` client
pub(crate) fn http_client(
    timeout_secs: u32,
    headers: reqwest::header::HeaderMap,
) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(timeout_secs)))
        .default_headers(headers)
        .build()
        .map_err(|e| ApiError::Http {
            endpoint: "client_init".into(),
            source: e,
        })
}

/// Send a request and return the raw response when its status is 2xx
pub(crate) async fn send(
    endpoint: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ApiError> {
    tracing::debug!(endpoint, "sending request");
    let resp = request.send().await.map_err(|e| ApiError::Http {
        endpoint: endpoint.into(),
        source: e,
    })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(endpoint, status, "request failed");
        return Err(ApiError::Status {
            endpoint: endpoint.into(),
            status,
            body,
        });
    }

    Ok(resp)
}

/// Send a request and decode its JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(
    endpoint: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, ApiError> {
    send(endpoint, request)
        .await?
        .json()
        .await
        .map_err(|e| ApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
}

/// Join a relative route onto a base URL, keeping any base path
pub(crate) fn join(base: &url::Url, route: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}
