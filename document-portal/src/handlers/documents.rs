use crate::export::{build_workbook, export_rows, XLSX_CONTENT_TYPE};
use crate::models::{AdminSession, Document, PortalSession};
use crate::services::{BackendError, DocumentListController};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use metrics::counter;
use serde::Deserialize;
use service_core::error::AppError;
use std::sync::Arc;

/// One rendered line of the document list.
pub struct DocumentRow {
    pub id: String,
    pub number: String,
    pub uploader_name: String,
    pub document_type: String,
    pub description: String,
}

impl From<&Document> for DocumentRow {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            number: doc
                .document_number
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            uploader_name: doc.uploader_name.clone().unwrap_or_default(),
            document_type: doc.document_type.clone().unwrap_or_default(),
            description: doc.description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "documents.html")]
pub struct DocumentsTemplate {
    pub is_admin: bool,
    pub signin_failed: bool,
    pub loading: bool,
    pub keyword: String,
    pub count: usize,
    pub rows: Vec<DocumentRow>,
}

/// Query string of `GET /`; `error=signin` after a rejected access key.
#[derive(Deserialize, Default)]
pub struct HomeQuery {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub keyword: String,
}

/// Replace this browser's list view with a fresh one.
async fn mount_view(
    state: &AppState,
    session: &PortalSession,
) -> Result<Arc<DocumentListController>, AppError> {
    if let Some(previous) = session.list_view_id().await? {
        state.list_views.remove(&previous);
    }

    let controller = Arc::new(DocumentListController::new(state.backend.clone()));
    let view_id = state.list_views.insert(controller.clone());
    session.set_list_view_id(view_id).await?;

    tracing::debug!(view_id = %view_id, "Mounted document list view");
    Ok(controller)
}

/// This browser's list view, mounting and loading one if it has none.
async fn current_view(
    state: &AppState,
    session: &PortalSession,
) -> Result<Arc<DocumentListController>, AppError> {
    if let Some(view_id) = session.list_view_id().await? {
        if let Some(controller) = state.list_views.get(&view_id) {
            return Ok(controller);
        }
    }

    let controller = mount_view(state, session).await?;
    controller.load().await;
    Ok(controller)
}

async fn render_list(controller: &DocumentListController, is_admin: bool) -> DocumentsTemplate {
    let list = controller.snapshot().await;

    DocumentsTemplate {
        is_admin,
        signin_failed: false,
        loading: list.is_loading(),
        keyword: list.keyword().to_string(),
        count: list.filtered().len(),
        rows: list.filtered().iter().map(DocumentRow::from).collect(),
    }
}

/// `GET /`: a fresh view, fetched from the backend.
pub async fn mount_documents_page(
    State(state): State<AppState>,
    session: PortalSession,
    Query(query): Query<HomeQuery>,
) -> Result<DocumentsTemplate, AppError> {
    let controller = mount_view(&state, &session).await?;
    controller.load().await;

    let mut page = render_list(&controller, session.is_admin()).await;
    page.signin_failed = !page.is_admin && query.error.as_deref() == Some("signin");
    Ok(page)
}

/// `GET /documents`: the current view as it stands.
pub async fn documents_page(
    State(state): State<AppState>,
    session: PortalSession,
) -> Result<DocumentsTemplate, AppError> {
    let controller = current_view(&state, &session).await?;
    Ok(render_list(&controller, session.is_admin()).await)
}

/// `POST /search`
pub async fn search_handler(
    State(state): State<AppState>,
    session: PortalSession,
    Form(form): Form<SearchForm>,
) -> Result<DocumentsTemplate, AppError> {
    let controller = current_view(&state, &session).await?;
    controller.search(&form.keyword).await;
    Ok(render_list(&controller, session.is_admin()).await)
}

/// `GET /documents/:id/view`: stream the stored copy for inline display.
pub async fn view_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Response, AppError> {
    let content = state
        .backend
        .view_document(&document_id)
        .await
        .map_err(|e| {
            counter!("portal_backend_errors_total", "operation" => "view").increment(1);
            tracing::error!(document_id = %document_id, error = %e, "Error viewing document");
            match e {
                BackendError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                    AppError::NotFound(anyhow::anyhow!("Document {} not found", document_id))
                }
                BackendError::InvalidDocumentId(_) => {
                    AppError::NotFound(anyhow::anyhow!("Document {:?} not found", document_id))
                }
                other => AppError::BadGateway(other.to_string()),
            }
        })?;

    let content_type = HeaderValue::from_str(&content.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, HeaderValue::from_static("inline")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        content.bytes,
    )
        .into_response())
}

/// `POST /documents/:id/delete` (admin). Failures are logged and the list is
/// shown unchanged.
pub async fn delete_document(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(document_id): Path<String>,
) -> Result<Redirect, AppError> {
    let controller = current_view(&state, &session).await?;

    match controller.delete(&document_id).await {
        Ok(removed) => {
            tracing::info!(document_id = %document_id, removed, "Document deleted");
        }
        Err(e) => {
            tracing::error!(document_id = %document_id, "Error deleting document: {}", e);
        }
    }

    Ok(Redirect::to("/documents"))
}

/// `GET /documents/export` (admin): the filtered list as `.xlsx`.
pub async fn export_documents(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Response, AppError> {
    let controller = current_view(&state, &session).await?;
    let rows = export_rows(controller.snapshot().await.filtered());
    let export = &state.settings.export;

    let workbook = build_workbook(&rows, &export.sheet_name)
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

    counter!("portal_exports_total").increment(1);
    tracing::info!(rows = rows.len(), file_name = %export.file_name, "Exported document list");

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.file_name.replace('"', "")
    ))
    .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        workbook,
    )
        .into_response())
}
