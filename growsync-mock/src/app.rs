use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::handles::{ViewState, get_by_timestamp, get_latest};
use crate::settings::Settings;
use crate::store::DataStore;

pub fn create_app(settings: &Settings, store: Arc<RwLock<DataStore>>) -> Router {
    let views = Router::new()
        .route("/latest", get(get_latest))
        .route("/by_timestamp", get(get_by_timestamp))
        .with_state(ViewState {
            store,
            database: settings.database.name.clone(),
            failure_ratio: settings.simulation.failure_ratio,
        });

    Router::new()
        .nest("/:database/_design/openag/_view", views)
        .layer(CorsLayer::permissive())
}
