use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::store::{DataStore, KeyRange, Row};

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Database does not exist.")]
    NotFound,

    #[error("Invalid value for `{0}`.")]
    BadKey(&'static str),

    #[error("Simulated outage.")]
    Unavailable,
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ViewError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ViewError::BadKey(_) => (StatusCode::BAD_REQUEST, "query_parse_error"),
            ViewError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        };

        (status, Json(json!({ "error": error, "reason": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    /// JSON encoded key
    pub startkey: Option<String>,
    /// JSON encoded key
    pub endkey: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub descending: bool,
}

impl ViewQuery {
    fn key_range(&self) -> Result<KeyRange, ViewError> {
        Ok(KeyRange {
            startkey: parse_key(&self.startkey, "startkey")?,
            endkey: parse_key(&self.endkey, "endkey")?,
            descending: self.descending,
        })
    }
}

fn parse_key(raw: &Option<String>, name: &'static str) -> Result<Option<Value>, ViewError> {
    raw.as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|_| ViewError::BadKey(name))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub rows: Vec<Row>,
}

#[derive(Clone)]
pub struct ViewState {
    pub store: Arc<RwLock<DataStore>>,
    pub database: String,
    pub failure_ratio: f64,
}

impl ViewState {
    fn check(&self, database: &str) -> Result<(), ViewError> {
        if database != self.database {
            return Err(ViewError::NotFound);
        }

        let ratio = self.failure_ratio.clamp(0.0, 1.0);
        if ratio > 0.0 && rand::rng().random_bool(ratio) {
            tracing::debug!("injecting failure for {}", database);
            return Err(ViewError::Unavailable);
        }

        Ok(())
    }
}

pub async fn get_latest(
    Path(database): Path<String>,
    Query(query): Query<ViewQuery>,
    State(state): State<ViewState>,
) -> Result<Json<ViewResponse>, ViewError> {
    state.check(&database)?;
    let range = query.key_range()?;

    let rows = state.store.read().await.latest(&range);

    Ok(Json(ViewResponse {
        total_rows: None,
        offset: None,
        rows,
    }))
}

pub async fn get_by_timestamp(
    Path(database): Path<String>,
    Query(query): Query<ViewQuery>,
    State(state): State<ViewState>,
) -> Result<Json<ViewResponse>, ViewError> {
    state.check(&database)?;
    let range = query.key_range()?;

    let store = state.store.read().await;
    let rows = store.by_timestamp(&range, query.limit);

    Ok(Json(ViewResponse {
        total_rows: Some(store.len()),
        offset: Some(0),
        rows,
    }))
}
