use std::sync::Arc;
use std::time::Duration;

use crate::app::App;
use crate::configs::Settings;
use crate::errors::ClientError;
use crate::services::HttpRequestClient;

pub mod app;
pub mod configs;
pub mod errors;
pub mod services;

/// How often the binary logs the state of every environment.
const REPORT_INTERVAL: Duration = Duration::from_secs(30);

pub async fn run(settings: &Arc<Settings>) -> Result<(), ClientError> {
    let client = Arc::new(HttpRequestClient::new(settings.controller.request_timeout())?);
    let app = App::create(settings, client).await?;

    tracing::info!("watching {} environments", app.views.len());

    let mut interval = tokio::time::interval(REPORT_INTERVAL);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => app.report().await,
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    tracing::info!("shutting down");

    app.shutdown().await
}
