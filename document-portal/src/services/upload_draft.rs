use crate::models::{DocumentFile, NewDocument};
use crate::services::backend_client::{until_cancelled, BackendClient, BackendError};
use crate::services::registry::Cancellable;
use crate::workflow::{UploadState, UploadWorkflow, WorkflowError};
use metrics::counter;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// One browser's upload in progress.
///
/// The workflow lock is held for the whole submission, so a second confirm
/// waits and then finds the workflow no longer `Confirming`.
pub struct UploadDraft {
    workflow: Mutex<UploadWorkflow>,
    cancel: CancellationToken,
}

impl Default for UploadDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadDraft {
    pub fn new() -> Self {
        Self {
            workflow: Mutex::new(UploadWorkflow::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Current workflow, for rendering.
    pub async fn snapshot(&self) -> UploadWorkflow {
        self.workflow.lock().await.clone()
    }

    /// Take the submitted form and move to confirmation if it is complete.
    pub async fn review(
        &self,
        form: NewDocument,
        file: Option<DocumentFile>,
    ) -> Result<(), WorkflowError> {
        let mut workflow = self.workflow.lock().await;
        workflow.edit(form, file)?;
        workflow.request_confirmation()
    }

    pub async fn cancel_confirmation(&self) -> Result<(), WorkflowError> {
        self.workflow.lock().await.cancel()
    }

    /// Confirm and post to the backend. Backend failures are logged and send
    /// the workflow back to `Editing`; the resulting state is returned.
    pub async fn submit(&self, backend: &BackendClient) -> Result<UploadState, WorkflowError> {
        let mut workflow = self.workflow.lock().await;
        let submission = workflow.confirm()?;

        let result = until_cancelled(
            &self.cancel,
            backend.create_document(&submission.document, &submission.file),
        )
        .await;

        match result {
            Ok(created) => {
                counter!("portal_uploads_total", "outcome" => "succeeded").increment(1);
                tracing::info!(
                    document_type = %submission.document.document_type,
                    document_number = %submission.document.document_number,
                    file_name = %submission.file.file_name,
                    response = %created,
                    "Document added successfully"
                );
                workflow.submission_succeeded()?;
            }
            Err(BackendError::Cancelled) => {
                tracing::debug!("Document upload cancelled");
                workflow.submission_failed()?;
            }
            Err(e) => {
                counter!("portal_uploads_total", "outcome" => "failed").increment(1);
                tracing::error!(
                    file_name = %submission.file.file_name,
                    error = %e,
                    "Error adding document"
                );
                workflow.submission_failed()?;
            }
        }

        Ok(workflow.state())
    }
}

impl Cancellable for UploadDraft {
    fn cancel(&self) {
        self.cancel.cancel();
    }
}
