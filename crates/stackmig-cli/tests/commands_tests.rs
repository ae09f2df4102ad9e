use pretty_assertions::assert_eq;
use stackmig_cli::commands::{change, list};
use stackmig_cli::settings::Settings;
use stackmig_cli::{ChangeArgs, ScopeArgs};
use stackmig_core::{AppId, MigrationError, MigrationOutcome};
use stackmig_platform::{endpoints, ControlPlane};
use stackmig_test_utils::{app, frame_lines, last_table, FakeControlPlane, RecordingSink};
use std::sync::Arc;

fn platform() -> Arc<FakeControlPlane> {
    FakeControlPlane::with_default_stacks()
        .with_apps(
            endpoints::APPS,
            vec![
                app("a1", "web", "s-lucid", "STOPPED"),
                app("a2", "api", "s-fs2", "STARTED"),
                app("a3", "worker", "s-lucid", "STOPPED"),
            ],
        )
        .into_shared()
}

#[tokio::test]
async fn test_list_prints_count_and_table() {
    let fake = platform();
    let plane: Arc<dyn ControlPlane> = fake.clone();
    let (sink, frames) = RecordingSink::new();

    list(&ScopeArgs::default(), &Settings::default(), plane, Box::new(sink))
        .await
        .unwrap();

    assert_eq!(
        frame_lines(&frames),
        vec![
            "Getting all apps with lucid64 stack...",
            "OK",
            "",
            "Total 2 found ...",
        ]
    );
    let names: Vec<String> = last_table(&frames).into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["web", "worker"]);
    assert!(fake.updates().is_empty());
}

#[tokio::test]
async fn test_change_uses_configured_batch_size() {
    let fake = platform();
    let plane: Arc<dyn ControlPlane> = fake.clone();
    let (sink, _) = RecordingSink::new();
    let mut settings = Settings::default();
    settings.migration.batch_size = 1;

    let args = ChangeArgs {
        scope: ScopeArgs::default(),
        parallel: None,
    };
    let summary = change(&args, &settings, plane, Box::new(sink)).await.unwrap();

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.outcome_of(&AppId::new("a1")), Some(MigrationOutcome::Updated));
    assert_eq!(summary.outcome_of(&AppId::new("a3")), Some(MigrationOutcome::Updated));
    assert!(fake.updates_for("a2").is_empty());
}

#[tokio::test]
async fn test_change_rejects_out_of_range_parallel() {
    let fake = platform();
    let plane: Arc<dyn ControlPlane> = fake.clone();
    let (sink, _) = RecordingSink::new();

    let args = ChangeArgs {
        scope: ScopeArgs::default(),
        parallel: Some(101),
    };
    let err = change(&args, &Settings::default(), plane, Box::new(sink))
        .await
        .unwrap_err();

    let err = err.downcast::<MigrationError>().unwrap();
    assert!(matches!(err, MigrationError::InvalidBatchSize(101)));
    assert!(err.to_string().contains("1 - 100"));
    assert!(fake.calls().is_empty());
}
