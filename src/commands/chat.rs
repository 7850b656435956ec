// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Chat commands - document questions, catalog questions, login, upload and feedback

use super::AppContext;
use crate::client::chat::QueryType;
use crate::client::ChatClient;
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Shown when feedback could not be delivered
pub const FEEDBACK_FAILED: &str = "No se pudo enviar el feedback. Intenta de nuevo.";

fn client(ctx: &AppContext) -> Result<ChatClient> {
    ChatClient::from_config(&ctx.config).context("Failed to create chat client")
}

/// Ask a question about one document
pub async fn run_chat(ctx: &AppContext, document_id: &str, question: &str) -> Result<()> {
    let chat = client(ctx)?;
    let session = chat
        .create_session(document_id)
        .await
        .with_context(|| format!("Failed to open a chat session on document {document_id}"))?;
    let answer = chat
        .query(&session, question)
        .await
        .context("Chat query failed")?;

    if ctx.json {
        return ctx.print_json(&json!({
            "session_id": session.session_id,
            "document_id": session.document_id,
            "answer": answer,
        }));
    }
    println!("{answer}");
    Ok(())
}

/// Ask a natural-language question about the whole catalog
pub async fn run_ask(ctx: &AppContext, question: &str) -> Result<()> {
    let answer = client(ctx)?
        .database_query(question)
        .await
        .context("Catalog query failed")?;

    if ctx.json {
        return ctx.print_json(&answer);
    }
    println!("{}", answer.answer);
    if answer.query_type == QueryType::Display && !answer.document_ids.is_empty() {
        println!(
            "{}",
            ctx.dim(&format!("Documentos: {}", answer.document_ids.join(", ")))
        );
    }
    Ok(())
}

/// Log in to the chatbot
pub async fn run_login(ctx: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        bail!("A password is required (use --password or DATALEX_CHAT_PASSWORD)");
    };
    let message = client(ctx)?
        .login(email, &password)
        .await
        .context("Login failed")?;
    info!(email, "chat login succeeded");
    println!("{}", if message.is_empty() { "Sesión iniciada" } else { message.as_str() });
    Ok(())
}

/// Upload a PDF to the document service
pub async fn run_upload(ctx: &AppContext, path: &Path) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;
    if !file_name.to_lowercase().ends_with(".pdf") {
        bail!("Only PDF files can be uploaded: {}", path.display());
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let document_id = client(ctx)?
        .upload_pdf(file_name, bytes)
        .await
        .context("Upload failed")?;

    if ctx.json {
        return ctx.print_json(&json!({ "document_id": document_id }));
    }
    println!("Documento subido: {document_id}");
    Ok(())
}

/// Send site feedback
pub async fn run_feedback(ctx: &AppContext, email: Option<&str>, feedback: &str) -> Result<()> {
    client(ctx)?
        .save_feedback(email, feedback)
        .await
        .context(FEEDBACK_FAILED)?;

    if ctx.json {
        return ctx.print_json(&json!({ "sent": true }));
    }
    println!("¡Gracias por tu feedback!");
    Ok(())
}
