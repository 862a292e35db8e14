pub mod upload;

pub use upload::{Submission, UploadState, UploadWorkflow, WorkflowError, MISSING_FIELDS_NOTICE};
