use std::sync::Mutex;

use async_trait::async_trait;

use growsync_api::models::{Datapoint, RecipeStart};
use growsync_client::errors::FetchError;
use growsync_client::services::{AlertBanner, ChartSink, DashboardSink};

#[derive(Default)]
pub struct RecordingChart {
    pub batches: Mutex<Vec<Vec<Datapoint>>>,
    pub loading: Mutex<Vec<bool>>,
}

impl RecordingChart {
    pub fn batches(&self) -> Vec<Vec<Datapoint>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn loading(&self) -> Vec<bool> {
        self.loading.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChartSink for RecordingChart {
    async fn add_data(&self, data: Vec<Datapoint>) {
        self.batches.lock().unwrap().push(data);
    }

    async fn set_loading(&self, loading: bool) {
        self.loading.lock().unwrap().push(loading);
    }
}

#[derive(Default)]
pub struct RecordingDashboard {
    pub recipe_starts: Mutex<Vec<RecipeStart>>,
}

impl RecordingDashboard {
    pub fn recipe_starts(&self) -> Vec<RecipeStart> {
        self.recipe_starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DashboardSink for RecordingDashboard {
    async fn set_recipe_start(&self, recipe_start: RecipeStart) {
        self.recipe_starts.lock().unwrap().push(recipe_start);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    Raised(FetchError),
    Suppressed,
}

#[derive(Default)]
pub struct RecordingAlert {
    pub events: Mutex<Vec<AlertEvent>>,
}

impl RecordingAlert {
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn raised(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, AlertEvent::Raised(_)))
            .count()
    }
}

#[async_trait]
impl AlertBanner for RecordingAlert {
    async fn raise(&self, error: &FetchError) {
        self.events.lock().unwrap().push(AlertEvent::Raised(error.clone()));
    }

    async fn suppress(&self) {
        self.events.lock().unwrap().push(AlertEvent::Suppressed);
    }
}
