use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use growsync_api::models::{Datapoint, RecipeStart};
use growsync_api::ChartBuffer;

use crate::errors::FetchError;

/// Consumer of the time ordered data stream.
#[async_trait]
pub trait ChartSink: Send + Sync {
    async fn add_data(&self, data: Vec<Datapoint>);

    async fn set_loading(&self, loading: bool);
}

#[async_trait]
pub trait DashboardSink: Send + Sync {
    async fn set_recipe_start(&self, recipe_start: RecipeStart);
}

/// Connectivity banner.
#[async_trait]
pub trait AlertBanner: Send + Sync {
    async fn raise(&self, error: &FetchError);

    async fn suppress(&self);
}

/// Chart buffer shared between the controller and whoever renders it.
#[derive(Clone, Default)]
pub struct SharedChart {
    buffer: Arc<RwLock<ChartBuffer>>,
}

impl SharedChart {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(ChartBuffer::new(capacity))),
        }
    }

    pub async fn len(&self) -> usize {
        self.buffer.read().await.len()
    }

    pub async fn is_loading(&self) -> bool {
        self.buffer.read().await.is_loading()
    }

    pub async fn snapshot(&self) -> Vec<Datapoint> {
        self.buffer.read().await.iter().cloned().collect()
    }

    /// Newest measured value of every variable held.
    pub async fn latest_values(&self) -> Vec<Datapoint> {
        let buffer = self.buffer.read().await;

        buffer
            .variables()
            .into_iter()
            .filter_map(|variable| buffer.latest(variable).cloned())
            .collect()
    }
}

#[async_trait]
impl ChartSink for SharedChart {
    async fn add_data(&self, data: Vec<Datapoint>) {
        let inserted = self.buffer.write().await.add_data(&data);

        tracing::trace!("chart received {} points, {} new", data.len(), inserted);
    }

    async fn set_loading(&self, loading: bool) {
        self.buffer.write().await.set_loading(loading);
    }
}

/// Dashboard stand-in that reports recipe starts through the log.
pub struct LogDashboard {
    environment: String,
}

impl LogDashboard {
    pub fn new<S: Into<String>>(environment: S) -> Self {
        Self {
            environment: environment.into(),
        }
    }
}

#[async_trait]
impl DashboardSink for LogDashboard {
    async fn set_recipe_start(&self, recipe_start: RecipeStart) {
        tracing::info!(
            environment = %self.environment,
            recipe = %recipe_start.id,
            "recipe started at {}",
            recipe_start.timestamp
        );
    }
}

/// Banner stand-in that logs raises and the first suppress after each raise.
pub struct LogAlertBanner {
    environment: String,
    shown: RwLock<bool>,
}

impl LogAlertBanner {
    pub fn new<S: Into<String>>(environment: S) -> Self {
        Self {
            environment: environment.into(),
            shown: RwLock::new(false),
        }
    }

    pub async fn is_shown(&self) -> bool {
        *self.shown.read().await
    }
}

#[async_trait]
impl AlertBanner for LogAlertBanner {
    async fn raise(&self, error: &FetchError) {
        *self.shown.write().await = true;

        tracing::error!(environment = %self.environment, "connection problem: {}", error);
    }

    async fn suppress(&self) {
        let mut shown = self.shown.write().await;

        if *shown {
            *shown = false;
            tracing::info!(environment = %self.environment, "connection restored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_chart_orders_and_reports_latest() {
        let chart = SharedChart::new(10);

        chart.set_loading(true).await;
        chart
            .add_data(vec![
                Datapoint::new("air_temperature", 1.0, false, 20.0),
                Datapoint::new("air_temperature", 3.0, false, 22.0),
                Datapoint::new("air_humidity", 2.0, false, 55.0),
            ])
            .await;
        chart.add_data(vec![Datapoint::new("air_humidity", 0.5, false, 50.0)]).await;

        assert!(chart.is_loading().await);
        assert_eq!(chart.len().await, 4);

        let stamps: Vec<f64> = chart.snapshot().await.iter().map(|d| d.timestamp).collect();
        assert_eq!(stamps, vec![0.5, 1.0, 2.0, 3.0]);

        let latest = chart.latest_values().await;
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].variable, "air_humidity");
        assert_eq!(latest[0].value, 55.0);
        assert_eq!(latest[1].value, 22.0);
    }

    #[tokio::test]
    async fn test_log_banner_tracks_visibility() {
        let banner = LogAlertBanner::new("env1");
        assert!(!banner.is_shown().await);

        banner
            .raise(&FetchError::Timeout {
                url: "http://x".to_string(),
            })
            .await;
        assert!(banner.is_shown().await);

        banner.suppress().await;
        assert!(!banner.is_shown().await);
    }
}
