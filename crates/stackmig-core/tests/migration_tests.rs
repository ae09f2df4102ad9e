use pretty_assertions::assert_eq;
use serde_json::json;
use stackmig_core::{
    AppId, AppMigration, Application, HealthWait, MigrationOutcome, MigrationState, RunState,
    StackId, WaitError,
};
use stackmig_platform::{endpoints, ControlPlane};
use stackmig_test_utils::{
    healthy_instances, staging_instances, FakeControlPlane, RecordingTransitions,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn started(id: &str) -> Application {
    Application::new(AppId::new(id), format!("app-{id}"), StackId::new("s-lucid"), RunState::Started)
}

fn stopped(id: &str) -> Application {
    Application::new(AppId::new(id), format!("app-{id}"), StackId::new("s-lucid"), RunState::Stopped)
}

fn migration(fake: &Arc<FakeControlPlane>) -> AppMigration {
    let plane: Arc<dyn ControlPlane> = fake.clone();
    AppMigration::new(plane, StackId::new("s-fs2"), HealthWait::default())
}

#[tokio::test(start_paused = true)]
async fn test_started_app_restarts_healthy() {
    let fake = FakeControlPlane::new()
        .with_instance_reports("a1", vec![staging_instances(), staging_instances(), healthy_instances()])
        .into_shared();
    let events = RecordingTransitions::new();

    let outcome = migration(&fake).run(started("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::Restarted);
    assert!(events.problems_of("a1").is_empty());
    assert_eq!(
        events.path_of("a1"),
        vec![
            MigrationState::Selected,
            MigrationState::Updating,
            MigrationState::Restarting,
            MigrationState::Restarted,
        ]
    );
    assert_eq!(
        fake.updates_for("a1"),
        vec![
            json!({"stack_guid": "s-fs2", "state": "STOPPED"}),
            json!({"state": "STARTED"}),
        ]
    );
    assert_eq!(fake.count_gets(&endpoints::app_instances("a1")), 3);
}

#[tokio::test]
async fn test_stopped_app_only_changes_stack() {
    let fake = FakeControlPlane::new().into_shared();
    let events = RecordingTransitions::new();

    let outcome = migration(&fake).run(stopped("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::Updated);
    assert_eq!(
        events.path_of("a1"),
        vec![MigrationState::Selected, MigrationState::Updating, MigrationState::Updated]
    );
    assert_eq!(fake.updates_for("a1"), vec![json!({"stack_guid": "s-fs2"})]);
    assert!(fake.gets().is_empty());
}

#[tokio::test]
async fn test_rejected_update_skips_restart() {
    let fake = FakeControlPlane::new()
        .fail_app_updates("a1", "CF-AppInvalid")
        .into_shared();
    let events = RecordingTransitions::new();

    let outcome = migration(&fake).run(started("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::UpdateFailed);
    assert_eq!(
        events.path_of("a1"),
        vec![MigrationState::Selected, MigrationState::Updating, MigrationState::UpdateFailed]
    );
    assert_eq!(fake.updates_for("a1").len(), 1);
    assert!(fake.gets().is_empty());

    let problems = events.problems_of("a1");
    assert_eq!(problems.len(), 1);
    assert!(problems[0].starts_with("Error updating stack for app 'app-a1' (a1)"));
    assert!(problems[0].contains("CF-AppInvalid"));
}

#[tokio::test]
async fn test_rejected_start_is_error_restarting() {
    let fake = FakeControlPlane::new()
        .on_app_updates("a1", vec![Ok(()), Err("insufficient memory")])
        .into_shared();
    let events = RecordingTransitions::new();

    let outcome = migration(&fake).run(started("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::ErrorRestarting);
    assert_eq!(events.path_of("a1").last(), Some(&MigrationState::ErrorRestarting));
    assert!(outcome.stack_changed());
    assert!(fake.gets().is_empty());
    assert!(events.problems_of("a1")[0].contains("insufficient memory"));
}

#[tokio::test(start_paused = true)]
async fn test_unhealthy_instances_time_out() {
    let fake = FakeControlPlane::new()
        .with_instance_reports("a1", vec![staging_instances()])
        .into_shared();
    let events = RecordingTransitions::new();
    let started_at = Instant::now();

    let outcome = migration(&fake).run(started("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::TimeoutRestarting);
    assert!(started_at.elapsed() >= Duration::from_secs(600));
    assert!(started_at.elapsed() < Duration::from_secs(610));
    // One poll every 5s over 600s
    assert_eq!(fake.count_gets(&endpoints::app_instances("a1")), 120);
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_stops_waiting() {
    let fake = FakeControlPlane::new()
        .fail_get(&endpoints::app_instances("a1"), "502 bad gateway")
        .into_shared();
    let events = RecordingTransitions::new();
    let started_at = Instant::now();

    let outcome = migration(&fake).run(started("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::TimeoutRestarting);
    assert_eq!(started_at.elapsed(), Duration::ZERO);
    assert_eq!(fake.count_gets(&endpoints::app_instances("a1")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_instance_report_still_times_out() {
    let fake = FakeControlPlane::new()
        .hang_get(&endpoints::app_instances("a1"))
        .into_shared();
    let wait = HealthWait::default();
    assert_eq!(wait.timeout(), Duration::from_secs(600));

    let result = tokio::time::timeout(
        Duration::from_secs(3600),
        wait.wait_until_healthy(fake.as_ref(), &AppId::new("a1")),
    )
    .await
    .expect("wait must end at its own deadline");

    match result {
        Err(WaitError::TimedOut { elapsed, .. }) => {
            assert_eq!(elapsed, Duration::from_secs(600));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_poll_releases_the_migration() {
    let fake = FakeControlPlane::new()
        .hang_get(&endpoints::app_instances("a1"))
        .into_shared();
    let events = RecordingTransitions::new();
    let started_at = Instant::now();

    let migration = migration(&fake);
    assert_eq!(migration.target_stack(), &StackId::new("s-fs2"));
    let outcome = migration.run(started("a1"), &events).await;

    assert_eq!(outcome, MigrationOutcome::TimeoutRestarting);
    assert_eq!(started_at.elapsed(), Duration::from_secs(600));
    assert!(events.problems_of("a1")[0].contains("did not come back healthy"));
}

#[tokio::test(start_paused = true)]
async fn test_health_wait_reports_last_problem() {
    let fake = FakeControlPlane::new()
        .with_instance_reports("a1", vec![staging_instances()])
        .into_shared();
    let wait = HealthWait::new(Duration::from_secs(10), Duration::from_secs(30));

    let err = wait
        .wait_until_healthy(fake.as_ref(), &AppId::new("a1"))
        .await
        .unwrap_err();

    match err {
        WaitError::TimedOut {
            elapsed,
            last_problem,
        } => {
            assert_eq!(elapsed, Duration::from_secs(30));
            assert_eq!(last_problem.as_deref(), Some("App has not finished staging"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(fake.count_gets(&endpoints::app_instances("a1")), 3);
}

#[tokio::test]
async fn test_malformed_instance_report_is_a_probe_error() {
    let fake = FakeControlPlane::new()
        .on_get_raw(&endpoints::app_instances("a1"), b"<html>oops</html>")
        .into_shared();

    let err = HealthWait::default()
        .wait_until_healthy(fake.as_ref(), &AppId::new("a1"))
        .await
        .unwrap_err();

    assert!(matches!(err, WaitError::Probe(ref e) if e.is_decode()));
}
