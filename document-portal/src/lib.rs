pub mod config;
pub mod export;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod workflow;

use config::Settings;
use services::{BackendClient, BackendError, DocumentListController, UploadDraft, ViewRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state: the backend client plus the per-browser views.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub backend: Arc<BackendClient>,
    pub list_views: Arc<ViewRegistry<DocumentListController>>,
    pub upload_drafts: Arc<ViewRegistry<UploadDraft>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, BackendError> {
        let backend = Arc::new(BackendClient::new(settings.backend.clone())?);
        let idle_timeout = Duration::from_secs(settings.views.idle_timeout_secs);

        Ok(Self {
            settings: Arc::new(settings),
            backend,
            list_views: Arc::new(ViewRegistry::new(idle_timeout)),
            upload_drafts: Arc::new(ViewRegistry::new(idle_timeout)),
        })
    }
}
