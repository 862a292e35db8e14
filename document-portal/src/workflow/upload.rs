//! Upload workflow: `Editing -> Confirming -> Submitting -> {Succeeded, Editing}`.
//!
//! Pure state machine; the network submission lives in
//! [`crate::services::upload_draft`].

use crate::models::{DocumentFile, FormField, NewDocument, FORM_FIELDS};
use thiserror::Error;
use validator::Validate;

pub const MISSING_FIELDS_NOTICE: &str = "Please fill in all fields and select a file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Editing,
    Confirming,
    Submitting,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{}", MISSING_FIELDS_NOTICE)]
    MissingFields {
        fields: Vec<&'static str>,
        file_missing: bool,
    },

    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: UploadState,
    },
}

/// Everything the backend needs for one upload.
#[derive(Debug, Clone)]
pub struct Submission {
    pub document: NewDocument,
    pub file: DocumentFile,
}

#[derive(Debug, Clone)]
pub struct UploadWorkflow {
    state: UploadState,
    form: NewDocument,
    file: Option<DocumentFile>,
}

impl Default for UploadWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadWorkflow {
    pub fn new() -> Self {
        Self {
            state: UploadState::Editing,
            form: NewDocument::default(),
            file: None,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn form(&self) -> &NewDocument {
        &self.form
    }

    pub fn file(&self) -> Option<&DocumentFile> {
        self.file.as_ref()
    }

    fn guard(&self, action: &'static str, allowed: &[UploadState]) -> Result<(), WorkflowError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    /// Replace the typed fields. `file` replaces the selected copy only when
    /// one was chosen; otherwise the previous selection is kept.
    ///
    /// Editing a form awaiting confirmation sends it back to `Editing`.
    pub fn edit(&mut self, form: NewDocument, file: Option<DocumentFile>) -> Result<(), WorkflowError> {
        self.guard("edit", &[UploadState::Editing, UploadState::Confirming])?;
        self.form = form;
        if file.is_some() {
            self.file = file;
        }
        self.state = UploadState::Editing;
        Ok(())
    }

    /// Fields left blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static FormField> {
        match self.form.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let field_errors = errors.field_errors();
                FORM_FIELDS
                    .iter()
                    .filter(|field| field_errors.contains_key(field.key))
                    .collect()
            }
        }
    }

    /// `Editing -> Confirming`, only when all six fields are filled in and a
    /// non-empty file is selected. Otherwise stays in `Editing`.
    pub fn request_confirmation(&mut self) -> Result<(), WorkflowError> {
        self.guard("request confirmation", &[UploadState::Editing])?;

        let missing = self.missing_fields();
        let file_missing = self.file.as_ref().map_or(true, |file| file.bytes.is_empty());
        if !missing.is_empty() || file_missing {
            return Err(WorkflowError::MissingFields {
                fields: missing.iter().map(|field| field.label).collect(),
                file_missing,
            });
        }

        self.state = UploadState::Confirming;
        Ok(())
    }

    /// `Confirming -> Editing`, keeping everything entered.
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        self.guard("cancel", &[UploadState::Confirming])?;
        self.state = UploadState::Editing;
        Ok(())
    }

    /// `Confirming -> Submitting`, handing out the payload to send.
    pub fn confirm(&mut self) -> Result<Submission, WorkflowError> {
        self.guard("confirm", &[UploadState::Confirming])?;

        let file = self.file.clone().ok_or(WorkflowError::InvalidTransition {
            action: "confirm",
            state: self.state,
        })?;

        self.state = UploadState::Submitting;
        Ok(Submission {
            document: self.form.clone(),
            file,
        })
    }

    /// `Submitting -> Succeeded`.
    pub fn submission_succeeded(&mut self) -> Result<(), WorkflowError> {
        self.guard("complete submission", &[UploadState::Submitting])?;
        self.state = UploadState::Succeeded;
        Ok(())
    }

    /// `Submitting -> Editing`; the form is kept for another attempt.
    pub fn submission_failed(&mut self) -> Result<(), WorkflowError> {
        self.guard("fail submission", &[UploadState::Submitting])?;
        self.state = UploadState::Editing;
        Ok(())
    }
}
