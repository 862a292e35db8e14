//! HTTP client for the document REST backend.
//!
//! Every call carries W3C trace headers. Failures come back as
//! [`BackendError`]; callers decide whether to log, render, or surface them.

use crate::config::BackendSettings;
use crate::models::{Document, DocumentFile, NewDocument};
use axum::body::Bytes;
use reqwest::{multipart, Client, Response, StatusCode, Url};
use service_core::observability::TracedClientExt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

const DEFAULT_VIEW_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to document backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("document backend responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unreadable response from document backend: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),
}

/// Binary content of a stored document copy.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub content_type: String,
    pub bytes: Bytes,
}

pub struct BackendClient {
    client: Client,
    base: Url,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base = Url::parse(&settings.url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", settings.url, e)))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(settings.url));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Base url with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /documents`: the whole collection.
    pub async fn list_documents(&self) -> Result<Vec<Document>, BackendError> {
        let url = self.endpoint(&["documents"])?;

        let response = self
            .client
            .traced_get(url.as_str())
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET request to {}: {}", url, e);
                BackendError::Transport(e)
            })?;

        let body = ensure_success(response).await?.bytes().await?;
        let documents: Vec<Document> = serde_json::from_slice(&body).map_err(BackendError::Decode)?;

        tracing::debug!(count = documents.len(), "Fetched document list");
        Ok(documents)
    }

    /// `GET /document/{id}/view`: the attached copy.
    pub async fn view_document(&self, document_id: &str) -> Result<DocumentContent, BackendError> {
        let url = self.endpoint(&["document", document_segment(document_id)?, "view"])?;

        let response = self.client.traced_get(url.as_str()).send().await.map_err(|e| {
            tracing::error!(document_id = %document_id, "Failed to send GET request to {}: {}", url, e);
            BackendError::Transport(e)
        })?;
        let response = ensure_success(response).await?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_VIEW_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?;

        Ok(DocumentContent {
            content_type,
            bytes,
        })
    }

    /// `POST /document/new`: multipart with the six form fields and the
    /// `documentCopy` file. Returns the backend's JSON reply.
    pub async fn create_document(
        &self,
        document: &NewDocument,
        file: &DocumentFile,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint(&["document", "new"])?;

        let mut form = multipart::Form::new();
        for (name, value) in document.parts() {
            form = form.text(name, value.to_string());
        }
        let copy = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        form = form.part("documentCopy", copy);

        let response = self
            .client
            .traced_post(url.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                BackendError::Transport(e)
            })?;

        let body = ensure_success(response).await?.bytes().await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&body).map_err(BackendError::Decode)
    }

    /// `DELETE /admin/document/delete/{id}`.
    pub async fn delete_document(&self, document_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["admin", "document", "delete", document_segment(document_id)?])?;

        let response = self.client.traced_delete(url.as_str()).send().await.map_err(|e| {
            tracing::error!(document_id = %document_id, "Failed to send DELETE request to {}: {}", url, e);
            BackendError::Transport(e)
        })?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// Ids are opaque but must name exactly one path segment.
fn document_segment(document_id: &str) -> Result<&str, BackendError> {
    match document_id {
        "" | "." | ".." => Err(BackendError::InvalidDocumentId(document_id.to_string())),
        id => Ok(id),
    }
}

/// Turn a non-2xx response into [`BackendError::Status`], keeping the body.
async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(BackendError::Status { status, body })
}

/// Run a backend call until it finishes or `token` is cancelled.
pub async fn until_cancelled<T, F>(token: &CancellationToken, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(BackendError::Cancelled),
        result = call => result,
    }
}
