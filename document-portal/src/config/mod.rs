use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub admin: AdminSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub views: ViewSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload form, file included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the document REST backend, without trailing slash.
    pub url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Deserialize, Clone)]
pub struct AdminSettings {
    /// Shared key that unlocks the admin actions for a browser session.
    pub access_key: Secret<String>,
}

impl AdminSettings {
    /// Sign-in is only possible once a non-empty key is configured.
    pub fn is_enabled(&self) -> bool {
        !self.access_key.expose_secret().is_empty()
    }
}

#[derive(Deserialize, Clone)]
pub struct ExportSettings {
    #[serde(default = "default_export_file_name")]
    pub file_name: String,
    #[serde(default = "default_export_sheet_name")]
    pub sheet_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
            sheet_name: default_export_sheet_name(),
        }
    }
}

fn default_export_file_name() -> String {
    "[ASI-EMS] Uploaded-Documents.xlsx".to_string()
}

fn default_export_sheet_name() -> String {
    "Uploaded Documents".to_string()
}

#[derive(Deserialize, Clone)]
pub struct ViewSettings {
    /// List views and upload drafts untouched for this long are dropped.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    24 * 60 * 60
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint (e.g., http://tempo:4317). Spans are only
    /// exported when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;

    // Check if we're already in document-portal directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("document-portal") {
        base_path.join("config")
    } else {
        base_path.join("document-portal").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
