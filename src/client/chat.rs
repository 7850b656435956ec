// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Client for the chat / document-processing service
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/chat/create-session/` | Open a chat session on one document |
//! | POST | `/chat/query/` | Ask a question inside a session |
//! | POST | `/chat/database-query/` | Natural-language query over the catalog |
//! | POST | `/chat/login/` | Chatbot login |
//! | POST | `/upload-pdf/` | Multipart PDF upload |
//! | POST | `/save-feedback/` | Site feedback |

use super::normalize::scalar_to_string;
use super::{send, send_json, ApiError};
use crate::config::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use url::Url;

const STATUS_SUCCESS: &str = "success";

/// An open chat session bound to one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Session identifier issued by the service
    pub session_id: String,
    /// Document the session was opened on
    pub document_id: String,
}

/// Kind of answer returned by a database query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// The answer is a number of matching documents
    Count,
    /// The answer lists documents, referenced by `document_ids`
    Display,
}

/// Answer to a natural-language database query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseAnswer {
    /// Human-readable answer
    pub answer: String,
    /// Count or display
    pub query_type: QueryType,
    /// Documents referenced by a display answer
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    document_id: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    session_id: &'a str,
    question: &'a str,
}

#[derive(Debug, Serialize)]
struct DatabaseQueryRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct FeedbackRequest<'a> {
    email: &'a str,
    feedback: &'a str,
}

/// Client for the chat service
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ChatClient {
    /// Create a client for `base_url`
    pub fn new(base_url: Url, timeout_secs: u32) -> Result<Self, ApiError> {
        Ok(Self {
            http: super::http_client(timeout_secs, reqwest::header::HeaderMap::new())?,
            base_url,
        })
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_url()?, config.timeout_secs)
    }

    /// Open a chat session on a document
    pub async fn create_session(&self, document_id: &str) -> Result<ChatSession, ApiError> {
        let endpoint = "POST /chat/create-session/";
        let url = super::join(&self.base_url, "chat/create-session/");
        let body: Value = send_json(
            endpoint,
            self.http.post(&url).json(&CreateSessionRequest { document_id }),
        )
        .await?;

        ensure_success(endpoint, &body)?;
        let session_id = body
            .get("session_id")
            .and_then(scalar_to_string)
            .ok_or_else(|| malformed(endpoint, "missing session_id"))?;

        info!(document_id, %session_id, "chat session created");
        Ok(ChatSession {
            session_id,
            document_id: document_id.to_string(),
        })
    }

    /// Ask a question in an open session; returns the answer text
    pub async fn query(&self, session: &ChatSession, question: &str) -> Result<String, ApiError> {
        let endpoint = "POST /chat/query/";
        let url = super::join(&self.base_url, "chat/query/");
        let body: Value = send_json(
            endpoint,
            self.http.post(&url).json(&QueryRequest {
                session_id: &session.session_id,
                question,
            }),
        )
        .await?;

        body.get("answer")
            .or_else(|| body.get("response"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed(endpoint, "missing answer"))
    }

    /// Ask a natural-language question about the whole catalog
    pub async fn database_query(&self, question: &str) -> Result<DatabaseAnswer, ApiError> {
        let endpoint = "POST /chat/database-query/";
        let url = super::join(&self.base_url, "chat/database-query/");
        let body: Value = send_json(
            endpoint,
            self.http.post(&url).json(&DatabaseQueryRequest { question }),
        )
        .await?;

        ensure_success(endpoint, &body)?;
        let answer = body
            .get("answer")
            .and_then(scalar_to_string)
            .ok_or_else(|| malformed(endpoint, "missing answer"))?;
        let query_type = body
            .get("query_type")
            .cloned()
            .map(serde_json::from_value::<QueryType>)
            .transpose()
            .map_err(|e| malformed(endpoint, &e.to_string()))?
            .ok_or_else(|| malformed(endpoint, "missing query_type"))?;
        let document_ids = body
            .get("document_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(scalar_to_string).collect())
            .unwrap_or_default();

        Ok(DatabaseAnswer {
            answer,
            query_type,
            document_ids,
        })
    }

    /// Log in to the chatbot; returns the service message on success
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let endpoint = "POST /chat/login/";
        let url = super::join(&self.base_url, "chat/login/");
        let request = self.http.post(&url).json(&LoginRequest { email, password });
        let body: Value = match send_json(endpoint, request).await {
            Err(ApiError::Status { status: 401 | 403, body, .. }) => {
                return Err(ApiError::Authentication(body));
            }
            other => other?,
        };

        let message = body
            .get("message")
            .and_then(scalar_to_string)
            .unwrap_or_default();
        if status_of(&body) == Some(STATUS_SUCCESS) {
            Ok(message)
        } else {
            Err(ApiError::Authentication(message))
        }
    }

    /// Upload a PDF; returns the document id assigned by the service
    pub async fn upload_pdf(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let endpoint = "POST /upload-pdf/";
        let url = super::join(&self.base_url, "upload-pdf/");
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let body: Value = send_json(endpoint, self.http.post(&url).multipart(form)).await?;
        ensure_success(endpoint, &body)?;
        let document_id = body
            .get("document_id")
            .and_then(scalar_to_string)
            .ok_or_else(|| malformed(endpoint, "missing document_id"))?;

        info!(file_name, %document_id, "PDF uploaded");
        Ok(document_id)
    }

    /// Send site feedback; the email is optional and sent empty when absent
    ///
    /// Any 2xx answer counts as accepted, whatever its body.
    pub async fn save_feedback(&self, email: Option<&str>, feedback: &str) -> Result<(), ApiError> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(ApiError::Validation(vec!["El campo comentarios es obligatorio".into()]));
        }
        let email = email.map_or("", str::trim);

        let url = super::join(&self.base_url, "save-feedback/");
        send(
            "POST /save-feedback/",
            self.http.post(&url).json(&FeedbackRequest { email, feedback }),
        )
        .await?;
        info!(with_email = !email.is_empty(), "feedback sent");
        Ok(())
    }
}

fn status_of(body: &Value) -> Option<&str> {
    body.get("status").and_then(Value::as_str)
}

fn ensure_success(endpoint: &str, body: &Value) -> Result<(), ApiError> {
    match status_of(body) {
        Some(STATUS_SUCCESS) => Ok(()),
        other => Err(ApiError::Rejected {
            endpoint: endpoint.into(),
            message: body
                .get("message")
                .or_else(|| body.get("detail"))
                .and_then(scalar_to_string)
                .unwrap_or_else(|| format!("status {}", other.unwrap_or("missing"))),
        }),
    }
}

fn malformed(endpoint: &str, message: &str) -> ApiError {
    ApiError::Malformed {
        endpoint: endpoint.into(),
        message: message.into(),
    }
}
