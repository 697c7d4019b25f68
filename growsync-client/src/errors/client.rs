use config::ConfigError;

use growsync_api::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Settings error: {0}")]
    SettingsError(#[from] ConfigError),

    #[error("Endpoint template error: {0}")]
    TemplateError(#[from] TemplateError),

    #[error("Session store error: {0}")]
    SessionStoreError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Environment controller has stopped")]
    ControllerClosed,
}
