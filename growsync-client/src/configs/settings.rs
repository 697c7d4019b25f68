use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use growsync_api::{Endpoints, PollConfig, RETRY_TIMEOUT_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

/// Whether a successful fetch clears a previously raised banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    #[default]
    SuppressOnRecovery,
    RaiseOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    pub retry_timeout_ms: u64,
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub alert_policy: AlertPolicy,
}

impl Controller {
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            retry_timeout_ms: RETRY_TIMEOUT_MS,
            request_timeout_ms: 10000,
            alert_policy: AlertPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub state_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub id: String,
    pub name: Option<String>,
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub endpoints: Endpoints,
    pub poll: PollConfig,
    #[serde(default)]
    pub controller: Controller,
    pub session: Session,
    #[serde(default)]
    pub environments: Vec<EnvironmentEntry>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::from_sources(
            Config::builder()
                .add_source(File::with_name("configs/default"))
                .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
                .add_source(Environment::with_prefix("GROWSYNC").separator("__")),
        )
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::from_sources(Config::builder().add_source(File::from_str(content, config::FileFormat::Toml)))
    }

    fn from_sources(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;

        settings
            .endpoints
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }
}
