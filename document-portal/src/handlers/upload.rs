use crate::models::{DocumentFile, NewDocument, PortalSession};
use crate::services::UploadDraft;
use crate::workflow::{UploadState, UploadWorkflow, WorkflowError, MISSING_FIELDS_NOTICE};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use service_core::error::AppError;
use std::sync::Arc;

const FILE_FIELD: &str = "documentCopy";

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    pub is_admin: bool,
    pub form: NewDocument,
    pub selected_file: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "upload_confirm.html")]
pub struct UploadConfirmTemplate {
    pub is_admin: bool,
    pub form: NewDocument,
    pub file_name: String,
}

#[derive(Template)]
#[template(path = "upload_success.html")]
pub struct UploadSuccessTemplate {
    pub is_admin: bool,
    pub form: NewDocument,
}

fn upload_form(is_admin: bool, workflow: &UploadWorkflow, notice: Option<String>) -> UploadTemplate {
    UploadTemplate {
        is_admin,
        form: workflow.form().clone(),
        selected_file: workflow.file().map(|file| file.file_name.clone()),
        notice,
    }
}

/// This browser's draft, if it still has one.
async fn existing_draft(
    state: &AppState,
    session: &PortalSession,
) -> Result<Option<Arc<UploadDraft>>, AppError> {
    Ok(session
        .upload_draft_id()
        .await?
        .and_then(|id| state.upload_drafts.get(&id)))
}

/// The current draft, or a new one registered for this browser.
async fn editable_draft(state: &AppState, session: &PortalSession) -> Result<Arc<UploadDraft>, AppError> {
    if let Some(draft) = existing_draft(state, session).await? {
        return Ok(draft);
    }

    let draft = Arc::new(UploadDraft::new());
    let id = state.upload_drafts.insert(draft.clone());
    session.set_upload_draft_id(id).await?;
    Ok(draft)
}

/// `GET /upload`
pub async fn upload_page(
    State(state): State<AppState>,
    session: PortalSession,
) -> Result<UploadTemplate, AppError> {
    let workflow = match existing_draft(&state, &session).await? {
        Some(draft) => draft.snapshot().await,
        None => UploadWorkflow::new(),
    };

    Ok(upload_form(session.is_admin(), &workflow, None))
}

/// Read the six text fields and the optional file from the upload form.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(NewDocument, Option<DocumentFile>), AppError> {
    let mut form = NewDocument::default();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))?;

            // Browsers send an empty, unnamed part when no file was picked
            if !file_name.is_empty() {
                file = Some(DocumentFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))?;
            form.set_wire_field(&name, value);
        }
    }

    Ok((form, file))
}

/// `POST /upload`: validate, then ask for confirmation.
pub async fn upload_handler(
    State(state): State<AppState>,
    session: PortalSession,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (form, file) = read_upload_form(multipart).await?;
    let draft = editable_draft(&state, &session).await?;

    match draft.review(form, file).await {
        Ok(()) => {
            let workflow = draft.snapshot().await;
            Ok(UploadConfirmTemplate {
                is_admin: session.is_admin(),
                form: workflow.form().clone(),
                file_name: workflow
                    .file()
                    .map(|file| file.file_name.clone())
                    .unwrap_or_default(),
            }
            .into_response())
        }
        Err(WorkflowError::MissingFields {
            fields,
            file_missing,
        }) => {
            tracing::info!(?fields, file_missing, "Upload blocked by missing fields");
            let workflow = draft.snapshot().await;
            Ok(upload_form(
                session.is_admin(),
                &workflow,
                Some(MISSING_FIELDS_NOTICE.to_string()),
            )
            .into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Upload form submitted out of order");
            Ok(Redirect::to("/upload").into_response())
        }
    }
}

/// `POST /upload/cancel`: back to the form with everything kept.
pub async fn cancel_upload(
    State(state): State<AppState>,
    session: PortalSession,
) -> Result<Redirect, AppError> {
    if let Some(draft) = existing_draft(&state, &session).await? {
        if let Err(e) = draft.cancel_confirmation().await {
            tracing::debug!(error = %e, "Nothing to cancel");
        }
    }
    Ok(Redirect::to("/upload"))
}

/// `POST /upload/confirm`: submit to the backend.
pub async fn confirm_upload(
    State(state): State<AppState>,
    session: PortalSession,
) -> Result<Response, AppError> {
    let Some(draft) = existing_draft(&state, &session).await? else {
        return Ok(Redirect::to("/upload").into_response());
    };

    match draft.submit(&state.backend).await {
        Ok(UploadState::Succeeded) => {
            let workflow = draft.snapshot().await;
            if let Some(id) = session.upload_draft_id().await? {
                state.upload_drafts.remove(&id);
            }
            session.clear_upload_draft_id().await?;

            Ok(UploadSuccessTemplate {
                is_admin: session.is_admin(),
                form: workflow.form().clone(),
            }
            .into_response())
        }
        Ok(_) => {
            let workflow = draft.snapshot().await;
            Ok(upload_form(session.is_admin(), &workflow, None).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Upload confirmed out of order");
            Ok(Redirect::to("/upload").into_response())
        }
    }
}
