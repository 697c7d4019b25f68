#![allow(dead_code)]

pub mod mock_client;
pub mod mock_sinks;

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::task::JoinHandle;

use growsync_api::models::{Datapoint, EnvironmentSession, RECIPE_START};
use growsync_api::Endpoints;
use growsync_client::errors::FetchError;
use growsync_client::services::{Collaborators, ControllerPolicy, EnvironmentController, EnvironmentHandle};

use mock_client::ScriptedClient;
use mock_sinks::{RecordingAlert, RecordingChart, RecordingDashboard};

pub const ORIGIN: &str = "http://couch.test/environmental_data_point";

pub struct MockEnvironment {
    pub handle: EnvironmentHandle,
    pub client: Arc<ScriptedClient>,
    pub chart: Arc<RecordingChart>,
    pub dashboard: Arc<RecordingDashboard>,
    pub alert: Arc<RecordingAlert>,
    pub endpoints: Arc<Endpoints>,
    pub task: JoinHandle<()>,
}

impl MockEnvironment {
    pub fn new(policy: ControllerPolicy) -> Self {
        Self::spawn(policy, true)
    }

    /// Global dashboard wiring: the chart recorder is never handed to the controller.
    pub fn dashboard_only(policy: ControllerPolicy) -> Self {
        Self::spawn(policy, false)
    }

    fn spawn(policy: ControllerPolicy, with_chart: bool) -> Self {
        let client = Arc::new(ScriptedClient::default());
        let chart = Arc::new(RecordingChart::default());
        let dashboard = Arc::new(RecordingDashboard::default());
        let alert = Arc::new(RecordingAlert::default());
        let endpoints = Arc::new(Endpoints::default());

        let collaborators = if with_chart {
            Collaborators::environment(chart.clone(), dashboard.clone(), alert.clone())
        } else {
            Collaborators::dashboard_only(dashboard.clone(), alert.clone())
        };

        let (controller, handle) = EnvironmentController::new(
            EnvironmentSession::new("env1"),
            Arc::clone(&endpoints),
            policy,
            Arc::clone(&client),
            collaborators,
        );

        Self {
            handle,
            client,
            chart,
            dashboard,
            alert,
            endpoints,
            task: controller.spawn(),
        }
    }

    pub fn configure(&self, id: &str) {
        self.handle.configure(ORIGIN, id, None).unwrap();
    }
}

/// Let spawned fetch tasks finish and their completions be handled.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

pub fn point(variable: &str, timestamp: f64, value: f64) -> Datapoint {
    Datapoint::new(variable, timestamp, false, value)
}

pub fn recipe_start(id: &str, timestamp: f64) -> Datapoint {
    Datapoint::new(RECIPE_START, timestamp, false, 0.0).with_id(id)
}

pub fn unavailable(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}
