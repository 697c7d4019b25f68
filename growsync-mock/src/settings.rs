use std::error::Error;

use serde::{Deserialize, Serialize};

use growsync_api::MAX_DATAPOINTS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Light,
    Humidity,
    Temperature,
    /// Noise around `base`
    Flat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub curve: Curve,
    #[serde(default)]
    pub base: f64,
    /// Desired value written when a recipe starts
    pub desired: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub environments: Vec<String>,
    pub interval_ms: u64,
    /// Readings generated into the past on startup
    pub history_points: usize,
    /// Probability of answering a view query with 503
    pub failure_ratio: f64,
    pub recipe_id: String,
    /// Measured readings kept per environment
    #[serde(default = "default_retention")]
    pub retention: usize,
    pub variables: Vec<Variable>,
}

fn default_retention() -> usize {
    4 * MAX_DATAPOINTS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub server: Server,
    pub database: Database,
    pub simulation: Simulation,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let settings = Self::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/mock.toml"
        )))?;

        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
