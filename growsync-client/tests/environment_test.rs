use std::time::Duration;

use growsync_api::models::{RecipeStart, ViewTab};
use growsync_api::{PollConfig, PollHealth};
use growsync_client::configs::AlertPolicy;
use growsync_client::errors::ClientError;
use growsync_client::services::{ControllerPolicy, ControllerState};

mod common;
use common::mock_sinks::AlertEvent;
use common::{MockEnvironment, ORIGIN, point, recipe_start, settle, unavailable};

fn raise_only() -> ControllerPolicy {
    ControllerPolicy {
        alert_policy: AlertPolicy::RaiseOnly,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_unconfigured_requests_are_ignored() {
    let env = MockEnvironment::new(ControllerPolicy::default());

    env.handle.get_backlog().unwrap();
    env.handle.fetch_latest().unwrap();
    settle().await;

    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::Unconfigured);
    assert!(env.client.calls().is_empty());
    assert!(env.chart.loading().is_empty());
    assert!(env.alert.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_configure_loads_backlog_then_latest() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    let backlog = vec![point("air_temperature", 5.0, 21.0), point("air_temperature", 10.0, 21.5)];
    env.client.push_backlog(Ok(backlog.clone()));
    env.client.push_latest(Ok(vec![point("air_temperature", 20.0, 22.0)]));

    env.configure("env1");
    settle().await;

    let calls = env.client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], env.endpoints.range_url(ORIGIN, "env1"));
    assert_eq!(calls[1], env.endpoints.latest_url(ORIGIN, "env1"));

    let batches = env.chart.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], backlog);
    assert_eq!(batches[1][0].timestamp, 20.0);
    assert_eq!(env.chart.loading(), vec![true, false]);

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::Steady);
    assert_eq!(snapshot.generation, 1);
    assert!(!snapshot.backlog_in_flight);
    assert!(!snapshot.latest_in_flight);
    assert!(snapshot.last_success_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_latest_failure_misses_and_raises() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client.push_backlog(Ok(vec![point("water_level", 1.0, 0.4)]));
    env.client.push_latest(Err(unavailable("latest")));

    env.configure("env1");
    settle().await;

    assert_eq!(env.chart.batches().len(), 1);
    assert_eq!(
        env.alert.events().last(),
        Some(&AlertEvent::Raised(unavailable("latest")))
    );

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::Steady);
    assert_eq!(snapshot.consecutive_misses, 1);
    assert_eq!(snapshot.poll_health, PollHealth::Healthy);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_misses_turn_stale() {
    let policy = ControllerPolicy {
        poll: PollConfig {
            interval_ms: 1000,
            miss_threshold: 2,
        },
        ..Default::default()
    };
    let env = MockEnvironment::new(policy);
    env.client.push_latest(Err(unavailable("latest")));
    env.client.push_latest(Err(unavailable("latest")));

    env.configure("env1");
    settle().await;
    tokio::time::advance(Duration::from_millis(1000)).await;
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(env.client.latest_calls(), 2);
    assert_eq!(snapshot.consecutive_misses, 2);
    assert_eq!(snapshot.poll_health, PollHealth::Stale);

    // An empty answer still counts as a successful poll
    tokio::time::advance(Duration::from_millis(1000)).await;
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.poll_health, PollHealth::Healthy);
    assert_eq!(env.alert.events().last(), Some(&AlertEvent::Suppressed));
}

#[tokio::test(start_paused = true)]
async fn test_backlog_failure_retries_once_per_timeout() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client.push_backlog(Err(unavailable("range")));
    env.client.push_backlog(Ok(vec![point("air_temperature", 1.0, 20.0)]));

    env.configure("env1");
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::RetryingBacklog);
    assert!(snapshot.retry_scheduled);
    assert_eq!(env.client.backlog_calls(), 1);
    assert_eq!(env.client.latest_calls(), 0);
    assert_eq!(env.alert.raised(), 1);
    assert!(env.chart.batches().is_empty());

    tokio::time::advance(Duration::from_millis(3900)).await;
    settle().await;
    assert_eq!(env.client.backlog_calls(), 1);

    tokio::time::advance(Duration::from_millis(100)).await;
    settle().await;
    assert_eq!(env.client.backlog_calls(), 2);

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::Steady);
    assert!(!snapshot.retry_scheduled);
    assert_eq!(env.chart.batches().len(), 1);
    assert_eq!(env.client.latest_calls(), 1);

    tokio::time::advance(Duration::from_millis(4000)).await;
    settle().await;
    assert_eq!(env.client.backlog_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_backlog_failure_schedules_one_retry() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    for _ in 0..3 {
        env.client.push_backlog(Err(unavailable("range")));
    }

    env.configure("env1");
    settle().await;
    assert_eq!(env.client.backlog_calls(), 1);
    assert_eq!(env.alert.raised(), 1);

    for round in 2..=3 {
        tokio::time::advance(Duration::from_millis(3999)).await;
        settle().await;
        assert_eq!(env.client.backlog_calls(), round - 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;

        let snapshot = env.handle.snapshot().await.unwrap();
        assert_eq!(env.client.backlog_calls(), round);
        assert_eq!(env.alert.raised(), round);
        assert_eq!(snapshot.state, ControllerState::RetryingBacklog);
        assert!(snapshot.retry_scheduled);
    }

    tokio::time::advance(Duration::from_millis(4000)).await;
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(env.client.backlog_calls(), 4);
    assert_eq!(env.alert.raised(), 3);
    assert_eq!(snapshot.state, ControllerState::Steady);
    assert!(!snapshot.retry_scheduled);
}

#[tokio::test(start_paused = true)]
async fn test_empty_origin_leaves_controller_unconfigured() {
    let env = MockEnvironment::new(ControllerPolicy::default());

    env.configure("env1");
    settle().await;
    assert_eq!(env.handle.snapshot().await.unwrap().state, ControllerState::Steady);

    env.handle.configure("", "env1", None).unwrap();
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::Unconfigured);
    assert!(!snapshot.session.is_configured());

    let calls = env.client.calls().len();
    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(env.client.calls().len(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_only_forwards_recipe_start() {
    let env = MockEnvironment::dashboard_only(ControllerPolicy::default());
    env.client.push_backlog(Ok(vec![
        point("air_temperature", 1.0, 20.0),
        recipe_start("recipe-a", 2.0),
    ]));
    env.client.push_latest(Ok(vec![point("air_temperature", 3.0, 21.0)]));

    env.configure("env1");
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ControllerState::Steady);
    assert_eq!(env.client.backlog_calls(), 1);
    assert_eq!(env.client.latest_calls(), 1);
    assert_eq!(
        env.dashboard.recipe_starts(),
        vec![RecipeStart {
            id: "recipe-a".to_string(),
            timestamp: 2.0,
        }]
    );
    assert!(env.chart.batches().is_empty());
    assert!(env.chart.loading().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_fetches_backlog_again() {
    let env = MockEnvironment::new(ControllerPolicy::default());

    env.configure("env1");
    settle().await;
    env.handle.snapshot().await.unwrap();

    env.configure("env1");
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(env.client.backlog_calls(), 2);
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.session.origin.as_deref(), Some(ORIGIN));
    assert_eq!(snapshot.state, ControllerState::Steady);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_results_are_dropped() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client
        .push_backlog_delayed(Duration::from_millis(1000), Ok(vec![point("air_temperature", 1.0, 10.0)]));
    env.client.push_backlog(Ok(vec![point("air_temperature", 2.0, 20.0)]));

    env.configure("env1");
    settle().await;
    env.configure("env2");
    settle().await;

    tokio::time::advance(Duration::from_millis(2000)).await;
    settle().await;

    let batches = env.chart.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].value, 20.0);

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.session.id, "env2");
    assert_eq!(snapshot.state, ControllerState::Steady);
}

#[tokio::test(start_paused = true)]
async fn test_latest_fetches_never_overlap() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client
        .push_latest_delayed(Duration::from_millis(1000), Ok(vec![point("water_level", 3.0, 0.5)]));

    env.configure("env1");
    settle().await;

    env.handle.fetch_latest().unwrap();
    env.handle.fetch_latest().unwrap();
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert!(snapshot.latest_in_flight);
    assert_eq!(env.client.latest_calls(), 1);

    tokio::time::advance(Duration::from_millis(1000)).await;
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert!(!snapshot.latest_in_flight);
    assert_eq!(env.client.latest_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ping_drives_latest_polling() {
    let env = MockEnvironment::new(ControllerPolicy::default());

    env.configure("env1");
    settle().await;
    assert_eq!(env.client.latest_calls(), 1);

    tokio::time::advance(Duration::from_millis(4900)).await;
    settle().await;
    assert_eq!(env.client.latest_calls(), 1);

    tokio::time::advance(Duration::from_millis(100)).await;
    settle().await;
    assert_eq!(env.client.latest_calls(), 2);

    tokio::time::advance(Duration::from_millis(5000)).await;
    settle().await;
    assert_eq!(env.client.latest_calls(), 3);
    assert_eq!(env.client.backlog_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_newest_recipe_start_is_forwarded() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client.push_backlog(Ok(vec![
        recipe_start("recipe-a", 100.0),
        point("air_temperature", 150.0, 20.0),
        recipe_start("recipe-b", 200.0),
    ]));
    env.client.push_latest(Ok(vec![point("air_temperature", 300.0, 21.0)]));

    env.configure("env1");
    settle().await;

    assert_eq!(
        env.dashboard.recipe_starts(),
        vec![RecipeStart {
            id: "recipe-b".to_string(),
            timestamp: 200.0,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_success_suppresses_alert_by_default() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client.push_backlog(Err(unavailable("range")));

    env.configure("env1");
    settle().await;
    tokio::time::advance(Duration::from_millis(4000)).await;
    settle().await;

    let events = env.alert.events();
    assert_eq!(events[0], AlertEvent::Raised(unavailable("range")));
    assert_eq!(events[1], AlertEvent::Suppressed);
}

#[tokio::test(start_paused = true)]
async fn test_raise_only_never_suppresses() {
    let env = MockEnvironment::new(raise_only());
    env.client.push_backlog(Err(unavailable("range")));

    env.configure("env1");
    settle().await;
    tokio::time::advance(Duration::from_millis(4000)).await;
    settle().await;

    assert_eq!(env.client.latest_calls(), 1);
    assert_eq!(env.alert.events(), vec![AlertEvent::Raised(unavailable("range"))]);
}

#[tokio::test(start_paused = true)]
async fn test_activate_state_has_no_side_effects() {
    let env = MockEnvironment::new(ControllerPolicy::default());

    env.configure("env1");
    settle().await;
    let calls = env.client.calls().len();

    env.handle.activate_state(ViewTab::Chart).unwrap();
    settle().await;

    let snapshot = env.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.session.view, ViewTab::Chart);
    assert_eq!(env.client.calls().len(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_the_handle() {
    let env = MockEnvironment::new(ControllerPolicy::default());
    env.client
        .push_backlog_delayed(Duration::from_millis(1000), Ok(vec![point("air_temperature", 1.0, 10.0)]));

    env.configure("env1");
    settle().await;

    env.handle.shutdown().unwrap();
    env.task.await.unwrap();

    assert!(matches!(env.handle.get_backlog(), Err(ClientError::ControllerClosed)));
    assert!(matches!(env.handle.snapshot().await, Err(ClientError::ControllerClosed)));

    tokio::time::advance(Duration::from_millis(2000)).await;
    settle().await;
    assert!(env.chart.batches().is_empty());
}
