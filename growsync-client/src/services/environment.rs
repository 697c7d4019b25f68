use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use growsync_api::models::{Datapoint, EnvironmentSession, ViewTab};
use growsync_api::{find_recipe_start, Endpoints, PollConfig, PollHealth, PollTimer};

use crate::configs::{AlertPolicy, Settings};
use crate::errors::{ClientError, FetchError};
use crate::services::collaborators::{AlertBanner, ChartSink, DashboardSink};
use crate::services::request::RequestClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Origin or id unknown, fetches are skipped
    Unconfigured,
    BacklogPending,
    /// Latest data is polled on every ping
    Steady,
    /// Backlog failed, a retry is scheduled
    RetryingBacklog,
}

#[derive(Debug, Clone)]
pub struct ControllerPolicy {
    pub alert_policy: AlertPolicy,
    pub retry_timeout: Duration,
    pub poll: PollConfig,
}

impl ControllerPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            alert_policy: settings.controller.alert_policy,
            retry_timeout: settings.controller.retry_timeout(),
            poll: settings.poll.clone(),
        }
    }
}

impl Default for ControllerPolicy {
    fn default() -> Self {
        Self {
            alert_policy: AlertPolicy::default(),
            retry_timeout: Duration::from_millis(growsync_api::RETRY_TIMEOUT_MS),
            poll: PollConfig::default(),
        }
    }
}

/// Where a controller forwards its effects.
#[derive(Clone)]
pub struct Collaborators {
    pub chart: Option<Arc<dyn ChartSink>>,
    pub dashboard: Option<Arc<dyn DashboardSink>>,
    pub alert: Arc<dyn AlertBanner>,
}

impl Collaborators {
    /// Environment view: chart and dashboard both receive data.
    pub fn environment(
        chart: Arc<dyn ChartSink>,
        dashboard: Arc<dyn DashboardSink>,
        alert: Arc<dyn AlertBanner>,
    ) -> Self {
        Self {
            chart: Some(chart),
            dashboard: Some(dashboard),
            alert,
        }
    }

    /// Global dashboard: only recipe starts and alerts are forwarded.
    pub fn dashboard_only(dashboard: Arc<dyn DashboardSink>, alert: Arc<dyn AlertBanner>) -> Self {
        Self {
            chart: None,
            dashboard: Some(dashboard),
            alert,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    pub session: EnvironmentSession,
    pub generation: u64,
    pub backlog_in_flight: bool,
    pub latest_in_flight: bool,
    pub retry_scheduled: bool,
    pub poll_health: PollHealth,
    pub consecutive_misses: u32,
    pub last_success_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Backlog,
    Latest,
}

enum Command {
    Configure {
        origin: String,
        id: String,
        name: Option<String>,
    },
    GetBacklog,
    FetchLatest,
    ActivateState(ViewTab),
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Shutdown,
}

/// Completions posted back by fetch and retry tasks.
enum Completion {
    Fetched {
        kind: FetchKind,
        generation: u64,
        result: Result<Vec<Datapoint>, FetchError>,
    },
    RetryBacklog {
        generation: u64,
    },
}

#[derive(Clone)]
pub struct EnvironmentHandle {
    sender: mpsc::UnboundedSender<Command>,
}

impl EnvironmentHandle {
    pub fn configure<O, I>(&self, origin: O, id: I, name: Option<String>) -> Result<(), ClientError>
    where
        O: Into<String>,
        I: Into<String>,
    {
        self.send(Command::Configure {
            origin: origin.into(),
            id: id.into(),
            name,
        })
    }

    pub fn get_backlog(&self) -> Result<(), ClientError> {
        self.send(Command::GetBacklog)
    }

    pub fn fetch_latest(&self) -> Result<(), ClientError> {
        self.send(Command::FetchLatest)
    }

    pub fn activate_state(&self, view: ViewTab) -> Result<(), ClientError> {
        self.send(Command::ActivateState(view))
    }

    pub async fn snapshot(&self) -> Result<ControllerSnapshot, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;

        rx.await.map_err(|_| ClientError::ControllerClosed)
    }

    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<(), ClientError> {
        self.sender
            .send(command)
            .map_err(|_| ClientError::ControllerClosed)
    }
}

/// Backlog/latest reconciliation for one environment session.
///
/// Every command and completion is handled to the end before the next one is
/// taken, so the effects of a single reaction never interleave with another.
pub struct EnvironmentController<R: RequestClient> {
    session: EnvironmentSession,
    endpoints: Arc<Endpoints>,
    policy: ControllerPolicy,
    client: Arc<R>,
    collaborators: Collaborators,
    poll: PollTimer,
    state: ControllerState,
    generation: u64,
    backlog_in_flight: bool,
    latest_in_flight: bool,
    tasks: Vec<JoinHandle<()>>,
    retry: Option<JoinHandle<()>>,
    last_success_at: Option<OffsetDateTime>,
    started: Instant,
    commands: mpsc::UnboundedReceiver<Command>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl<R: RequestClient> EnvironmentController<R> {
    pub fn new(
        session: EnvironmentSession,
        endpoints: Arc<Endpoints>,
        policy: ControllerPolicy,
        client: Arc<R>,
        collaborators: Collaborators,
    ) -> (Self, EnvironmentHandle) {
        let (sender, commands) = mpsc::unbounded_channel();
        let (completion_tx, completions) = mpsc::unbounded_channel();

        let controller = Self {
            session,
            endpoints,
            poll: PollTimer::new(policy.poll.clone()),
            policy,
            client,
            collaborators,
            state: ControllerState::Unconfigured,
            generation: 0,
            backlog_in_flight: false,
            latest_in_flight: false,
            tasks: Vec::new(),
            retry: None,
            last_success_at: None,
            started: Instant::now(),
            commands,
            completion_tx,
            completions,
        };

        (controller, EnvironmentHandle { sender })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until `shutdown` is requested or every handle is dropped.
    pub async fn run(mut self) {
        loop {
            let deadline = self
                .poll
                .next_deadline()
                .map(|due_at| self.started + Duration::from_millis(due_at));

            tokio::select! {
                biased;

                Some(completion) = self.completions.recv() => self.handle_completion(completion).await,
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                _ = wait_until(deadline) => self.handle_tick().await,
            }
        }

        self.abort_tasks();

        tracing::debug!(environment = %self.session.id, "environment controller stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Configure { origin, id, name } => self.configure(origin, id, name).await,
            Command::GetBacklog => self.get_backlog().await,
            Command::FetchLatest => {
                self.fetch_latest();
            }
            Command::ActivateState(view) => {
                self.session.view = view;
                tracing::debug!(environment = %self.session.id, "view switched to {:?}", view);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Fetched {
                kind,
                generation,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(
                        environment = %self.session.id,
                        "ignoring stale {:?} result from generation {}",
                        kind,
                        generation
                    );
                    return;
                }

                match kind {
                    FetchKind::Backlog => self.on_backlog(result).await,
                    FetchKind::Latest => self.on_latest(result).await,
                }
            }
            Completion::RetryBacklog { generation } => {
                if generation == self.generation && self.state == ControllerState::RetryingBacklog {
                    self.retry = None;
                    self.get_backlog().await;
                }
            }
        }
    }

    async fn handle_tick(&mut self) {
        let now = self.now_ms();

        if self.poll.poll(now).is_some() {
            tracing::trace!(environment = %self.session.id, "poll ping");

            if !self.fetch_latest() {
                // A ping must always be answered
                self.poll.miss(now);
            }
        }
    }

    async fn configure(&mut self, origin: String, id: String, name: Option<String>) {
        self.generation += 1;
        self.abort_tasks();
        self.backlog_in_flight = false;
        self.latest_in_flight = false;
        self.poll.reset();

        self.session.origin = Some(origin);
        self.session.id = id;
        self.session.name = name;

        if !self.session.is_configured() {
            self.state = ControllerState::Unconfigured;
        }

        tracing::info!(
            environment = %self.session.id,
            "configured with origin {}",
            self.session.origin.as_deref().unwrap_or_default()
        );

        self.get_backlog().await;
    }

    async fn get_backlog(&mut self) {
        let Some(origin) = self.configured_origin() else {
            tracing::warn!("backlog requested before the environment is configured");
            return;
        };

        if self.backlog_in_flight {
            tracing::debug!(environment = %self.session.id, "backlog fetch already in flight");
            return;
        }

        if let Some(retry) = self.retry.take() {
            retry.abort();
        }

        let url = self.endpoints.range_url(&origin, &self.session.id);
        self.state = ControllerState::BacklogPending;

        if let Some(chart) = &self.collaborators.chart {
            chart.set_loading(true).await;
        }

        tracing::info!(environment = %self.session.id, "fetching backlog");

        self.backlog_in_flight = true;
        self.issue(FetchKind::Backlog, url);
    }

    /// Returns whether a latest fetch is now in flight.
    fn fetch_latest(&mut self) -> bool {
        let Some(origin) = self.configured_origin() else {
            tracing::warn!("latest data requested before the environment is configured");
            return false;
        };

        if self.latest_in_flight {
            tracing::debug!(environment = %self.session.id, "latest fetch already in flight");
            return true;
        }

        let url = self.endpoints.latest_url(&origin, &self.session.id);

        self.latest_in_flight = true;
        self.issue(FetchKind::Latest, url);

        true
    }

    async fn on_backlog(&mut self, result: Result<Vec<Datapoint>, FetchError>) {
        self.backlog_in_flight = false;

        match result {
            Ok(data) => {
                tracing::info!(environment = %self.session.id, "backlog loaded with {} datapoints", data.len());

                self.state = ControllerState::Steady;
                self.apply_batch(data).await;

                if let Some(chart) = &self.collaborators.chart {
                    chart.set_loading(false).await;
                }

                self.fetch_latest();
            }
            Err(error) => {
                tracing::warn!(
                    environment = %self.session.id,
                    "backlog fetch failed, retrying in {:?}: {}",
                    self.policy.retry_timeout,
                    error
                );

                self.state = ControllerState::RetryingBacklog;
                self.collaborators.alert.raise(&error).await;
                self.schedule_retry();
            }
        }
    }

    async fn on_latest(&mut self, result: Result<Vec<Datapoint>, FetchError>) {
        self.latest_in_flight = false;
        let now = self.now_ms();

        match result {
            Ok(data) => {
                tracing::debug!(environment = %self.session.id, "latest fetch returned {} datapoints", data.len());

                self.apply_batch(data).await;
                self.poll.pong(now);
            }
            Err(error) => {
                let health = self.poll.miss(now);
                self.collaborators.alert.raise(&error).await;

                if health == PollHealth::Stale {
                    tracing::warn!(
                        environment = %self.session.id,
                        "{} consecutive polls missed: {}",
                        self.poll.consecutive_misses(),
                        error
                    );
                } else {
                    tracing::debug!(environment = %self.session.id, "latest fetch failed: {}", error);
                }
            }
        }
    }

    /// Suppress, append, forward recipe start. Runs as one reaction.
    async fn apply_batch(&mut self, data: Vec<Datapoint>) {
        if self.policy.alert_policy == AlertPolicy::SuppressOnRecovery {
            self.collaborators.alert.suppress().await;
        }

        let recipe_start = find_recipe_start(&data);

        if let Some(chart) = &self.collaborators.chart {
            if !data.is_empty() {
                chart.add_data(data).await;
            }
        }

        if let (Some(recipe_start), Some(dashboard)) = (recipe_start, &self.collaborators.dashboard) {
            dashboard.set_recipe_start(recipe_start).await;
        }

        self.last_success_at = Some(OffsetDateTime::now_utc());
    }

    fn issue(&mut self, kind: FetchKind, url: String) {
        let client = Arc::clone(&self.client);
        let completion_tx = self.completion_tx.clone();
        let generation = self.generation;

        self.prune_tasks();
        self.tasks.push(tokio::spawn(async move {
            let result = client.get_datapoints(&url).await;
            let _ = completion_tx.send(Completion::Fetched {
                kind,
                generation,
                result,
            });
        }));
    }

    fn schedule_retry(&mut self) {
        let completion_tx = self.completion_tx.clone();
        let generation = self.generation;
        let delay = self.policy.retry_timeout;

        if let Some(previous) = self.retry.replace(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = completion_tx.send(Completion::RetryBacklog { generation });
        })) {
            previous.abort();
        }
    }

    fn configured_origin(&self) -> Option<String> {
        if self.session.is_configured() {
            self.session.origin.clone()
        } else {
            None
        }
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            session: self.session.clone(),
            generation: self.generation,
            backlog_in_flight: self.backlog_in_flight,
            latest_in_flight: self.latest_in_flight,
            retry_scheduled: self.retry.is_some(),
            poll_health: self.poll.health(),
            consecutive_misses: self.poll.consecutive_misses(),
            last_success_at: self.last_success_at,
        }
    }

    fn prune_tasks(&mut self) {
        self.tasks.retain(|task| !task.is_finished());
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..).chain(self.retry.take()) {
            task.abort();
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
