// tests/engine_maker.rs
mod common;
use crate::common::{Recorder, RecordingTask, combined_pipeline, init_tracing, with_timeout};

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use flue::engine::{BuildReport, Maker};
use flue::errors::FlueError;
use flue::exec::Task;
use flue::watch::{WatchOptions, WatchOutcome};
use tempfile::TempDir;

#[test]
fn make_reports_every_task() {
    init_tracing();
    let recorder = Recorder::new();
    let maker = Maker::with_jobs(combined_pipeline(&recorder), 2).unwrap();

    let report = maker.make().unwrap();

    assert!(report.is_success());
    assert_eq!(report.total(), 3);
    assert_eq!(report.to_string(), "3 succeeded, 0 failed");
    assert_eq!(recorder.total_runs(), 3);
}

#[test]
fn make_counts_failures_without_stopping_dependents() {
    let recorder = Recorder::new();
    let tasks: Vec<Arc<dyn Task>> = vec![
        RecordingTask::new("app.js", &["app.coffee"], &recorder)
            .failing()
            .into_task(),
        RecordingTask::new("app.min.js", &["app.js"], &recorder).into_task(),
        RecordingTask::new("site.css", &["site.scss"], &recorder).into_task(),
    ];
    let maker = Maker::with_jobs(tasks, 2).unwrap();

    let report = maker.make().unwrap();

    assert_eq!(
        report,
        BuildReport {
            succeeded: vec!["app.min.js".to_string(), "site.css".to_string()],
            failed: vec!["app.js".to_string()],
            unfinished: vec![],
        }
    );
    assert!(!report.is_success());
}

#[test]
fn make_rejects_cycles() {
    let recorder = Recorder::new();
    let tasks: Vec<Arc<dyn Task>> = vec![
        RecordingTask::new("a.js", &["b.js"], &recorder).into_task(),
        RecordingTask::new("b.js", &["a.js"], &recorder).into_task(),
    ];
    let maker = Maker::with_jobs(tasks, 1).unwrap();

    assert!(matches!(
        maker.make(),
        Err(FlueError::CyclicDependency { .. })
    ));
    assert_eq!(recorder.total_runs(), 0);
}

#[test]
fn passes_can_repeat_on_one_executor() {
    let recorder = Recorder::new();
    let maker = Maker::with_jobs(combined_pipeline(&recorder), 2).unwrap();

    maker.make().unwrap();
    maker.make().unwrap();

    assert_eq!(recorder.runs_of("combined.min.js"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn make_async_waits_off_the_runtime() {
    with_timeout(async {
        let recorder = Recorder::new();
        let tasks: Vec<Arc<dyn Task>> = vec![
            RecordingTask::new("slow.js", &[], &recorder)
                .with_delay(Duration::from_millis(50))
                .into_task(),
        ];
        let maker = Maker::with_jobs(tasks, 1).unwrap();

        let (runners, report) = maker.make_async().await.unwrap();
        assert!(runners["slow.js"].is_done());
        assert!(report.is_success());

        maker.close().await.unwrap();
        assert!(maker.executor().is_shutdown());
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interrupt_during_initial_pass_stops_watching() {
    with_timeout(async {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::new();
        let tasks: Vec<Arc<dyn Task>> = vec![
            RecordingTask::new("slow.js", &["slow.coffee"], &recorder)
                .with_delay(Duration::from_millis(300))
                .into_task(),
        ];
        let maker = Maker::with_jobs(tasks, 1).unwrap();
        let options = WatchOptions {
            root: dir.path().to_path_buf(),
            ..WatchOptions::default()
        };

        let outcome = maker.watch(&options, async {}).await.unwrap();

        assert_eq!(outcome, WatchOutcome::StopWatching);
        assert!(maker.executor().is_shutdown());
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watch_rebuilds_a_modified_source() {
    with_timeout(async {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let source = root.join("app.coffee");
        fs::write(&source, "a = 1\n").unwrap();

        let recorder = Recorder::new();
        let tasks: Vec<Arc<dyn Task>> = vec![
            RecordingTask::new("app.js", &["app.coffee"], &recorder).into_task(),
            RecordingTask::new("other.js", &["other.coffee"], &recorder).into_task(),
        ];
        let maker = Maker::with_jobs(tasks, 2).unwrap();
        let options = WatchOptions {
            root: root.clone(),
            poll_interval: Duration::from_millis(20),
            ..WatchOptions::default()
        };

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let driver = {
            let recorder = Arc::clone(&recorder);
            tokio::spawn(async move {
                // Initial pass first, then one edit.
                while recorder.total_runs() < 2 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                fs::write(&source, "a = 2\n").unwrap();

                for _ in 0..150 {
                    if recorder.runs_of("app.js") >= 2 {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                let _ = stop_tx.send(());
            })
        };

        let outcome = maker
            .watch(&options, async {
                let _ = stop_rx.await;
            })
            .await
            .unwrap();
        driver.await.unwrap();

        assert_eq!(outcome, WatchOutcome::StopWatching);
        assert_eq!(recorder.runs_of("app.js"), 2);
        assert_eq!(recorder.runs_of("other.js"), 1);
    })
    .await
}
