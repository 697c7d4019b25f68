use std::sync::Arc;

use tokio::task::JoinHandle;

use growsync_api::models::{EnvironmentSession, PersistedSession, RECIPE_START};
use growsync_api::Endpoints;

use crate::configs::{EnvironmentEntry, Settings};
use crate::errors::ClientError;
use crate::services::*;

/// One running environment and the shared chart it feeds.
pub struct EnvironmentView {
    pub session: EnvironmentSession,
    pub handle: EnvironmentHandle,
    pub chart: SharedChart,
    pub alert: Arc<LogAlertBanner>,
    task: JoinHandle<()>,
}

pub struct App {
    pub views: Vec<EnvironmentView>,
    store: SessionStore,
}

impl App {
    pub async fn create<R: RequestClient>(settings: &Settings, client: Arc<R>) -> Result<Self, ClientError> {
        let store = SessionStore::new(&settings.session.state_path);
        let restored = match store.load().await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("could not restore sessions from {}: {}", store.path().display(), e);
                Vec::new()
            }
        };

        let endpoints = Arc::new(settings.endpoints.clone());
        let policy = ControllerPolicy::from_settings(settings);

        let views = merge_sessions(&settings.environments, restored)
            .into_iter()
            .map(|session| create_view(session, &endpoints, &policy, &client))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { views, store })
    }

    pub fn persisted(&self) -> Vec<PersistedSession> {
        self.views.iter().map(|view| view.session.persisted()).collect()
    }

    /// Log the newest reading of every variable per environment.
    pub async fn report(&self) {
        for view in &self.views {
            let latest = view.chart.latest_values().await;
            let points = view.chart.len().await;
            let alert = view.alert.is_shown().await;
            let summary = latest
                .iter()
                .filter(|d| d.variable != RECIPE_START)
                .map(|d| format!("{}={:.2}", d.variable, d.value))
                .collect::<Vec<_>>()
                .join(" ");

            tracing::info!(
                environment = %view.session.id,
                points,
                alert,
                "{}",
                summary
            );
        }
    }

    pub async fn shutdown(self) -> Result<(), ClientError> {
        let persisted = self.persisted();

        for view in self.views {
            let _ = view.handle.shutdown();
            let _ = view.task.await;
        }

        self.store.save(&persisted).await
    }
}

fn create_view<R: RequestClient>(
    session: EnvironmentSession,
    endpoints: &Arc<Endpoints>,
    policy: &ControllerPolicy,
    client: &Arc<R>,
) -> Result<EnvironmentView, ClientError> {
    let chart = SharedChart::new(endpoints.limit);
    let alert = Arc::new(LogAlertBanner::new(session.id.clone()));
    let collaborators = Collaborators::environment(
        Arc::new(chart.clone()),
        Arc::new(LogDashboard::new(session.id.clone())),
        alert.clone(),
    );

    let (controller, handle) = EnvironmentController::new(
        EnvironmentSession::new(session.id.clone()),
        Arc::clone(endpoints),
        policy.clone(),
        Arc::clone(client),
        collaborators,
    );
    let task = controller.spawn();

    match &session.origin {
        Some(origin) => handle.configure(origin.clone(), session.id.clone(), session.name.clone())?,
        None => tracing::warn!(environment = %session.id, "restored without an origin, waiting for configuration"),
    }

    Ok(EnvironmentView {
        session,
        handle,
        chart,
        alert,
        task,
    })
}

/// Configured environments first, then restored ones that are no longer configured.
pub fn merge_sessions(configured: &[EnvironmentEntry], restored: Vec<PersistedSession>) -> Vec<EnvironmentSession> {
    let mut sessions: Vec<EnvironmentSession> = configured
        .iter()
        .map(|entry| {
            let restored_name = restored
                .iter()
                .find(|persisted| persisted.id == entry.id)
                .and_then(|persisted| persisted.name.clone());

            EnvironmentSession {
                id: entry.id.clone(),
                origin: entry.origin.clone(),
                name: entry.name.clone().or(restored_name),
                ..Default::default()
            }
        })
        .collect();

    for persisted in restored {
        if !sessions.iter().any(|session| session.id == persisted.id) {
            sessions.push(persisted.into());
        }
    }

    sessions
}
