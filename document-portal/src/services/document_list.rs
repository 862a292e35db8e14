//! Document list view: the fetched collection, its filtered subset, and the
//! operations that change them.

use crate::models::Document;
use crate::services::backend_client::{until_cancelled, BackendClient, BackendError};
use crate::services::registry::Cancellable;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Documents whose uploader name, type, or description contains `keyword`,
/// ignoring case. An empty keyword keeps everything.
pub fn filter_documents(documents: &[Document], keyword: &str) -> Vec<Document> {
    let keyword = keyword.to_lowercase();
    documents
        .iter()
        .filter(|doc| matches_keyword(doc, &keyword))
        .cloned()
        .collect()
}

fn matches_keyword(doc: &Document, lowercase_keyword: &str) -> bool {
    [&doc.uploader_name, &doc.document_type, &doc.description]
        .into_iter()
        .any(|field| {
            field
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(lowercase_keyword)
        })
}

/// In-memory state of one list view.
///
/// `filtered` is always a subset of `documents`.
#[derive(Debug, Clone, Default)]
pub struct DocumentList {
    documents: Vec<Document>,
    filtered: Vec<Document>,
    keyword: String,
    loading: bool,
}

impl DocumentList {
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn filtered(&self) -> &[Document] {
        &self.filtered
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Take a freshly fetched collection; the filter is reset.
    pub fn replace(&mut self, documents: Vec<Document>) {
        self.filtered = documents.clone();
        self.documents = documents;
        self.keyword.clear();
    }

    /// Narrow `filtered` to the documents matching `keyword`.
    pub fn search(&mut self, keyword: &str) {
        self.filtered = filter_documents(&self.documents, keyword);
        self.keyword = keyword.to_string();
    }

    /// Remove `id` from both collections. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.id != id);
        self.filtered.retain(|doc| doc.id != id);
        self.documents.len() != before
    }
}

#[derive(Debug, Error)]
pub enum DocumentListError {
    #[error("Failed to delete document: {payload}")]
    DeleteRejected { payload: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Server-side controller for one browser's list view.
///
/// `load` and `delete` share one mutation lane, so a refresh and a delete
/// never interleave. Cancelling the view aborts whichever call is in flight.
pub struct DocumentListController {
    backend: Arc<BackendClient>,
    state: RwLock<DocumentList>,
    mutations: Mutex<()>,
    cancel: CancellationToken,
}

impl DocumentListController {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self {
            backend,
            state: RwLock::new(DocumentList::default()),
            mutations: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    /// Fetch the full collection. Failures are logged and leave the list
    /// as it was.
    pub async fn load(&self) {
        let _lane = self.mutations.lock().await;
        self.state.write().await.loading = true;

        let result = until_cancelled(&self.cancel, self.backend.list_documents()).await;

        let mut state = self.state.write().await;
        match result {
            Ok(documents) => {
                counter!("portal_documents_loaded_total").increment(documents.len() as u64);
                tracing::info!(count = documents.len(), "Document list loaded");
                state.replace(documents);
            }
            Err(BackendError::Cancelled) => {
                tracing::debug!("Document list fetch cancelled");
            }
            Err(e) => {
                counter!("portal_backend_errors_total", "operation" => "list").increment(1);
                tracing::error!(error = %e, "Error fetching documents");
            }
        }
        state.loading = false;
    }

    /// Apply a keyword search over the fetched collection.
    pub async fn search(&self, keyword: &str) {
        let mut state = self.state.write().await;
        state.search(keyword);
        tracing::debug!(
            keyword = %keyword,
            matches = state.filtered().len(),
            "Document search applied"
        );
    }

    /// Delete on the backend, then drop the id locally. Nothing changes
    /// locally unless the backend confirms.
    pub async fn delete(&self, document_id: &str) -> Result<bool, DocumentListError> {
        let _lane = self.mutations.lock().await;

        match until_cancelled(&self.cancel, self.backend.delete_document(document_id)).await {
            Ok(()) => {
                counter!("portal_documents_deleted_total").increment(1);
                Ok(self.state.write().await.remove(document_id))
            }
            Err(BackendError::Status { body, .. }) => {
                counter!("portal_backend_errors_total", "operation" => "delete").increment(1);
                Err(DocumentListError::DeleteRejected {
                    payload: compact_payload(&body),
                })
            }
            Err(e) => {
                counter!("portal_backend_errors_total", "operation" => "delete").increment(1);
                Err(e.into())
            }
        }
    }

    /// Copy of the current state for rendering.
    pub async fn snapshot(&self) -> DocumentList {
        self.state.read().await.clone()
    }
}

impl Cancellable for DocumentListController {
    fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Error bodies are JSON; re-serialize compactly, fall back to the raw text.
fn compact_payload(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|value| value.to_string())
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, name: Option<&str>, kind: Option<&str>, description: Option<&str>) -> Document {
        Document {
            id: id.to_string(),
            document_type: kind.map(str::to_string),
            document_number: None,
            uploader_name: name.map(str::to_string),
            description: description.map(str::to_string),
            date_acquired: None,
            quantity: None,
        }
    }

    fn sample() -> Vec<Document> {
        vec![
            doc("1", Some("Alice"), Some("ICS"), Some("chair")),
            doc("2", Some("Bob"), Some("PAR"), Some("desk")),
        ]
    }

    #[test]
    fn test_keyword_matches_type_case_insensitively() {
        let result = filter_documents(&sample(), "ics");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_empty_keyword_keeps_everything() {
        let docs = sample();
        assert_eq!(filter_documents(&docs, ""), docs);
    }

    #[test]
    fn test_keyword_matches_name_and_description() {
        assert_eq!(filter_documents(&sample(), "BO")[0].id, "2");
        assert_eq!(filter_documents(&sample(), "Ai")[0].id, "1");
        assert!(filter_documents(&sample(), "table").is_empty());
    }

    #[test]
    fn test_missing_fields_count_as_empty() {
        let docs = vec![doc("3", None, None, None), doc("4", None, Some("PAR"), None)];

        assert_eq!(filter_documents(&docs, "").len(), 2);
        let result = filter_documents(&docs, "par");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "4");
    }

    #[test]
    fn test_filter_result_is_subset_that_matches() {
        let docs = vec![
            doc("1", Some("Maria Santos"), Some("ICS"), Some("Office chair")),
            doc("2", Some("Jose"), Some("PAR"), Some("Laptop")),
            doc("3", Some("Ana"), Some("ics"), None),
            doc("4", None, Some("PAR"), Some("Chairs, stackable")),
        ];

        for keyword in ["chair", "IC", "a", "zzz", "par"] {
            let result = filter_documents(&docs, keyword);
            let lowered = keyword.to_lowercase();
            for found in &result {
                assert!(docs.contains(found));
                assert!(matches_keyword(found, &lowered));
            }
            let expected = docs.iter().filter(|d| matches_keyword(d, &lowered)).count();
            assert_eq!(result.len(), expected);
        }
    }

    #[test]
    fn test_search_runs_over_full_collection() {
        let mut list = DocumentList::default();
        list.replace(sample());

        list.search("alice");
        assert_eq!(list.filtered().len(), 1);

        list.search("bob");
        assert_eq!(list.filtered().len(), 1);
        assert_eq!(list.filtered()[0].id, "2");
        assert_eq!(list.keyword(), "bob");
    }

    #[test]
    fn test_remove_drops_id_from_both_collections() {
        let mut list = DocumentList::default();
        list.replace(sample());
        list.search("");

        assert!(list.remove("1"));
        assert_eq!(list.documents().len(), 1);
        assert_eq!(list.filtered().len(), 1);
        assert!(list.filtered().iter().all(|d| d.id != "1"));
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut list = DocumentList::default();
        list.replace(sample());
        list.search("desk");

        assert!(!list.remove("missing"));
        assert_eq!(list.documents().len(), 2);
        assert_eq!(list.filtered().len(), 1);
    }

    #[test]
    fn test_replace_resets_filter() {
        let mut list = DocumentList::default();
        list.replace(sample());
        list.search("alice");

        list.replace(sample());

        assert_eq!(list.filtered().len(), 2);
        assert_eq!(list.keyword(), "");
    }

    #[test]
    fn test_compact_payload() {
        assert_eq!(
            compact_payload("{ \"message\": \"not found\" }"),
            "{\"message\":\"not found\"}"
        );
        assert_eq!(compact_payload("Bad Gateway"), "Bad Gateway");
    }
}
