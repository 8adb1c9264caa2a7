use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::oneshot;

use hotrun::driver::Driver;
use hotrun::fs::mock::MockFileSystem;
use hotrun::supervisor::restart;
use hotrun::watch::{ChangeDetector, IgnoreRules};
use hotrun_test_utils::fake_lifecycle::{Call, FakeLifecycle};
use hotrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

fn mock_tree() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("./main.go", at(100));
    fs.add_file("./pkg/util.go", at(100));
    fs
}

fn detector(fs: &MockFileSystem) -> ChangeDetector {
    ChangeDetector::with_fs(".", IgnoreRules::hidden_only(), Arc::new(fs.clone()))
}

#[tokio::test]
async fn restart_kills_then_starts() -> TestResult {
    init_tracing();
    let mut fake = FakeLifecycle::new();
    restart(&mut fake).await?;
    assert_eq!(fake.calls(), vec![Call::Kill, Call::Start]);
    Ok(())
}

#[tokio::test]
async fn failed_kill_never_starts() {
    init_tracing();
    let mut fake = FakeLifecycle::new().failing_kill();
    let err = restart(&mut fake).await.unwrap_err();
    assert!(err.to_string().contains("failed to kill process group"));
    assert_eq!(fake.calls(), vec![Call::Kill]);
    assert_eq!(fake.count(Call::Start), 0);
}

#[tokio::test]
async fn failed_start_is_surfaced() {
    init_tracing();
    let mut fake = FakeLifecycle::new().failing_start();
    let err = restart(&mut fake).await.unwrap_err();
    assert!(err.to_string().contains("failed to launch"));
    assert_eq!(fake.calls(), vec![Call::Kill, Call::Start]);
}

#[tokio::test]
async fn poll_without_changes_does_nothing() -> TestResult {
    init_tracing();
    let fs = mock_tree();
    let fake = FakeLifecycle::new();
    let calls = fake.calls_handle();
    let mut driver =
        Driver::new(detector(&fs), fake, Duration::from_millis(10)).with_threshold(at(200));

    assert!(!driver.poll().await?);
    assert_eq!(driver.threshold(), at(200));
    assert!(calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn one_change_means_one_restart() -> TestResult {
    init_tracing();
    let fs = mock_tree();
    let fake = FakeLifecycle::new();
    let mut driver =
        Driver::new(detector(&fs), fake, Duration::from_millis(10)).with_threshold(at(200));

    fs.set_modified("./pkg/util.go", at(300));
    assert!(driver.poll().await?);
    assert!(driver.threshold() > at(200));

    // Same state of the tree: no second restart.
    assert!(!driver.poll().await?);
    assert_eq!(driver.task().calls(), vec![Call::Kill, Call::Start]);
    Ok(())
}

#[tokio::test]
async fn hidden_changes_do_not_restart() -> TestResult {
    init_tracing();
    let fs = mock_tree();
    fs.add_file("./.git/index", at(9_999));
    let mut driver = Driver::new(detector(&fs), FakeLifecycle::new(), Duration::from_millis(10))
        .with_threshold(at(200));

    assert!(!driver.poll().await?);
    assert!(driver.task().calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn threshold_advances_even_when_restart_fails() -> TestResult {
    init_tracing();
    let fs = mock_tree();
    let fake = FakeLifecycle::new().failing_start();
    let mut driver =
        Driver::new(detector(&fs), fake, Duration::from_millis(10)).with_threshold(at(200));

    fs.set_modified("./main.go", at(300));
    assert!(driver.poll().await.is_err());
    assert!(driver.threshold() > at(200));

    // The failed attempt is not retried for the same change.
    assert!(!driver.poll().await?);
    assert_eq!(driver.task().count(Call::Start), 1);
    Ok(())
}

#[tokio::test]
async fn run_until_starts_polls_and_stops() -> TestResult {
    init_tracing();
    let fs = mock_tree();
    let fake = FakeLifecycle::new();
    let calls = fake.calls_handle();
    let driver =
        Driver::new(detector(&fs), fake, Duration::from_millis(10)).with_threshold(at(200));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(driver.run_until(async move {
        let _ = stop_rx.await;
    }));

    // Wait for the initial start.
    with_timeout(async {
        while !calls.lock().unwrap().contains(&Call::Start) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    fs.set_modified("./main.go", at(300));
    with_timeout(async {
        while calls.lock().unwrap().iter().filter(|c| **c == Call::Start).count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    let _ = stop_tx.send(());
    let task = with_timeout(handle).await??;

    assert_eq!(
        task.calls(),
        vec![Call::Kill, Call::Start, Call::Kill, Call::Start, Call::Kill]
    );
    Ok(())
}
