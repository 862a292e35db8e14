use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::observability::extract_request_id;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    admin::{sign_in_handler, sign_out_handler},
    app::health_check,
    documents::{
        delete_document, documents_page, export_documents, mount_documents_page, search_handler,
        view_document,
    },
    metrics::metrics,
    upload::{cancel_upload, confirm_upload, upload_handler, upload_page},
};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            state.settings.views.idle_timeout_secs as i64,
        )));

    let max_upload_bytes = state.settings.server.max_upload_bytes;

    Router::new()
        .route("/", get(mount_documents_page))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/documents", get(documents_page))
        .route("/search", post(search_handler))
        .route("/documents/export", get(export_documents))
        .route("/documents/:id/view", get(view_document))
        .route("/documents/:id/delete", post(delete_document))
        .route(
            "/upload",
            get(upload_page)
                .post(upload_handler)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/upload/confirm", post(confirm_upload))
        .route("/upload/cancel", post(cancel_upload))
        .route("/admin/signin", post(sign_in_handler))
        .route("/admin/signout", post(sign_out_handler))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id =
                    extract_request_id(request.headers()).unwrap_or_else(|| "-".to_string());

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
