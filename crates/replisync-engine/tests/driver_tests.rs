use std::fs;
use std::sync::Arc;
use std::time::Duration;

use replisync_engine::{
    ActionKind, ErrorPolicy, RecordingReporter, SyncConfig, SyncDriver, SyncError, SyncTarget,
    TreeReconciler,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn driver_for(
    temp: &TempDir,
    reporter: Arc<RecordingReporter>,
) -> SyncDriver<Arc<RecordingReporter>> {
    SyncDriver::new(
        SyncTarget::new(temp.path().join("source"), temp.path().join("replica")),
        Duration::from_millis(10),
        TreeReconciler::new(reporter),
    )
}

#[tokio::test]
async fn test_missing_source_stops_before_loop() {
    let temp = TempDir::new().unwrap();
    let driver = driver_for(&temp, Arc::new(RecordingReporter::new()));

    let err = driver.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, SyncError::SourceMissing { .. }));
    assert!(!temp.path().join("replica").exists());
}

#[tokio::test]
async fn test_replica_containing_source_is_refused() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("precious.txt"), "keep me").unwrap();

    let reporter = Arc::new(RecordingReporter::new());
    let driver = SyncDriver::new(
        SyncTarget::new(&source, temp.path()),
        Duration::from_millis(10),
        TreeReconciler::new(Arc::clone(&reporter)),
    )
    .with_error_policy(ErrorPolicy::SkipCycle);

    let err = driver.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, SyncError::InvalidConfig { .. }));
    assert_eq!(
        fs::read_to_string(source.join("precious.txt")).unwrap(),
        "keep me"
    );
    assert!(reporter.actions().is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start_runs_no_pass() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("source")).unwrap();
    fs::write(temp.path().join("source/a.txt"), "hello").unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = driver_for(&temp, Arc::new(RecordingReporter::new()))
        .run(cancel)
        .await
        .unwrap();

    assert_eq!(summary.cycles, 0);
    assert!(!temp.path().join("replica").exists());
}

#[tokio::test]
async fn test_runs_until_cancelled() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("source")).unwrap();
    fs::write(temp.path().join("source/a.txt"), "hello").unwrap();

    let reporter = Arc::new(RecordingReporter::new());
    let driver = driver_for(&temp, Arc::clone(&reporter));
    let cancel = CancellationToken::new();

    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { driver.run(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    let summary = handle.await.unwrap().unwrap();

    assert!(summary.cycles >= 2, "only {} cycles ran", summary.cycles);
    assert_eq!(summary.actions, 1);
    assert_eq!(summary.failed_cycles, 0);
    assert_eq!(
        fs::read_to_string(temp.path().join("replica/a.txt")).unwrap(),
        "hello"
    );

    let actions = reporter.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionKind::FileCreated);
}

#[tokio::test]
async fn test_picks_up_changes_between_cycles() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    fs::create_dir(&source).unwrap();

    let reporter = Arc::new(RecordingReporter::new());
    let driver = driver_for(&temp, Arc::clone(&reporter));
    let cancel = CancellationToken::new();

    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { driver.run(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(source.join("late.txt"), "late").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join("replica/late.txt")).unwrap(),
        "late"
    );
    assert!(
        reporter
            .actions()
            .iter()
            .any(|a| a.kind == ActionKind::FileCreated && a.path.ends_with("late.txt"))
    );
}

#[tokio::test]
async fn test_abort_policy_returns_pass_error() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("source")).unwrap();
    // A replica root that is a file fails every pass.
    fs::write(temp.path().join("replica"), "in the way").unwrap();

    let err = driver_for(&temp, Arc::new(RecordingReporter::new()))
        .run(CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::NotADirectory { .. }));
}

#[tokio::test]
async fn test_skip_cycle_policy_keeps_running() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("source")).unwrap();
    fs::write(temp.path().join("replica"), "in the way").unwrap();

    let driver = driver_for(&temp, Arc::new(RecordingReporter::new()))
        .with_error_policy(ErrorPolicy::SkipCycle);
    let cancel = CancellationToken::new();

    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { driver.run(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(60)).await;
    cancel.cancel();
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(summary.cycles, 0);
    assert!(summary.failed_cycles >= 2);
}

#[tokio::test]
async fn test_from_config() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("source")).unwrap();
    fs::write(temp.path().join("source/a.txt"), "hello").unwrap();

    let config = SyncConfig::builder()
        .source(temp.path().join("source"))
        .replica(temp.path().join("replica"))
        .interval(Duration::from_secs(3600))
        .hash_block_size(16usize)
        .build()
        .unwrap();
    let reporter = Arc::new(RecordingReporter::new());
    let driver = SyncDriver::from_config(&config, Arc::clone(&reporter));
    let cancel = CancellationToken::new();

    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { driver.run(cancel).await })
    };

    // The first pass runs immediately; cancellation cuts the long sleep short.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(summary.cycles, 1);
    assert_eq!(reporter.actions().len(), 1);
}
