use serde::{Deserialize, Serialize};

/// Variable name carried by records that mark the start of a recipe.
pub const RECIPE_START: &str = "recipe_start";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    /// Sensor or metric name, e.g. `air_temperature`
    pub variable: String,
    /// Epoch-like time of the reading
    pub timestamp: f64,
    /// Setpoint rather than a measured value
    pub is_desired: bool,
    /// Numeric reading, `NaN` when the transport value was not a number
    pub value: f64,
    /// Document id, only meaningful on recipe-start records
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Datapoint {
    pub fn new<S: Into<String>>(variable: S, timestamp: f64, is_desired: bool, value: f64) -> Self {
        Self {
            variable: variable.into(),
            timestamp,
            is_desired,
            value,
            id: None,
        }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Records are the same reading when they agree on everything but the value.
    pub fn same_reading(&self, other: &Datapoint) -> bool {
        self.variable == other.variable
            && self.is_desired == other.is_desired
            && self.timestamp == other.timestamp
    }
}

/// A row `value` as it arrives from the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDatapoint {
    pub variable: String,
    #[serde(default)]
    pub is_desired: bool,
    pub timestamp: f64,
    pub value: serde_json::Value,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRow {
    pub value: RawDatapoint,
}

/// Body of a `latest` or `range` view query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub rows: Vec<ViewRow>,
}

/// Most recent recipe start found in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStart {
    /// Id of the recipe-start document
    pub id: String,
    pub timestamp: f64,
}
