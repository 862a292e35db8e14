use document_portal::config::get_configuration;
use document_portal::startup::build_router;
use document_portal::AppState;
use dotenvy::dotenv;
use service_core::observability::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "document-portal",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    document_portal::services::metrics::init_metrics()?;

    if !configuration.admin.is_enabled() {
        tracing::warn!("APP_ADMIN__ACCESS_KEY is not set; admin sign-in is disabled");
    }

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );

    let state = AppState::new(configuration).map_err(|e| {
        tracing::error!("Failed to build document backend client: {}", e);
        anyhow::anyhow!("Backend client error: {}", e)
    })?;
    info!(backend = %state.backend.base_url(), "Using document backend");

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting document-portal on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
