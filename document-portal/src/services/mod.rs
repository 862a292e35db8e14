pub mod backend_client;
pub mod document_list;
pub mod metrics;
pub mod registry;
pub mod upload_draft;

pub use backend_client::{BackendClient, BackendError, DocumentContent};
pub use document_list::{filter_documents, DocumentList, DocumentListController, DocumentListError};
pub use registry::{Cancellable, ViewRegistry};
pub use upload_draft::UploadDraft;
