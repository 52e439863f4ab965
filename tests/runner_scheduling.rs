// tests/runner_scheduling.rs
mod common;
use crate::common::{Recorder, RecordingTask, combined_pipeline, init_tracing};

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flue::dag::{Runner, RunnerState, Scheduler, schedule_all};
use flue::exec::{Executor, TaskOutcome};

#[test]
fn chain_completes_through_callbacks_alone() {
    init_tracing();
    let recorder = Recorder::new();
    let executor = Executor::new(2).unwrap();

    let a = Runner::new(RecordingTask::new("A", &[], &recorder).into_task());
    let b = Runner::with_dependencies(
        RecordingTask::new("B", &["A"], &recorder).into_task(),
        vec![Arc::clone(&a)],
    );
    let c = Runner::with_dependencies(
        RecordingTask::new("C", &["B"], &recorder).into_task(),
        vec![Arc::clone(&b)],
    );

    c.schedule(&executor).unwrap();
    b.schedule(&executor).unwrap();
    assert_eq!(c.state(), RunnerState::Waiting);
    assert_eq!(b.state(), RunnerState::Waiting);
    assert!(!b.is_done());
    assert!(!c.is_done());
    assert_eq!(recorder.total_runs(), 0);

    a.schedule(&executor).unwrap();
    executor.wait();

    assert!(a.is_done() && b.is_done() && c.is_done());
    assert_eq!(c.state(), RunnerState::Done);
    assert_eq!(recorder.finished(), vec!["A", "B", "C"]);
}

#[test]
fn scheduling_a_done_runner_is_a_no_op() {
    let recorder = Recorder::new();
    let executor = Executor::new(1).unwrap();
    let a = Runner::new(RecordingTask::new("A", &[], &recorder).into_task());

    a.schedule(&executor).unwrap();
    executor.wait();
    assert_eq!(a.outcome(), Some(TaskOutcome::Success));

    a.schedule(&executor).unwrap();
    a.schedule(&executor).unwrap();
    executor.wait();

    assert_eq!(recorder.runs_of("A"), 1);
}

#[test]
fn concurrent_schedule_submits_once() {
    let recorder = Recorder::new();
    let executor = Executor::new(4).unwrap();

    let deps: Vec<Arc<Runner>> = (0..8)
        .map(|i| {
            let id = format!("dep{i}");
            Runner::new(
                RecordingTask::new(&id, &[], &recorder)
                    .with_delay(Duration::from_millis(5))
                    .into_task(),
            )
        })
        .collect();
    let sources: Vec<String> = (0..8).map(|i| format!("dep{i}")).collect();
    let source_refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    let target = Runner::with_dependencies(
        RecordingTask::new("target", &source_refs, &recorder).into_task(),
        deps.clone(),
    );

    // Hammer the target from several threads while its dependencies finish.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let target = Arc::clone(&target);
            let executor = Arc::clone(&executor);
            thread::spawn(move || {
                for _ in 0..50 {
                    target.schedule(&executor).unwrap();
                }
            })
        })
        .collect();
    for dep in &deps {
        dep.schedule(&executor).unwrap();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    executor.wait();

    assert_eq!(recorder.runs_of("target"), 1);
    let target_start = recorder.started_at("target").unwrap();
    for source in &sources {
        assert!(recorder.finished_at(source).unwrap() < target_start);
    }
}

#[test]
fn combined_min_waits_on_exactly_two_runners() {
    let recorder = Recorder::new();
    let runners = Scheduler::new()
        .load(combined_pipeline(&recorder))
        .run()
        .unwrap();

    assert_eq!(runners.len(), 3);
    let min = &runners["combined.min.js"];
    let mut waits: Vec<&str> = min.wait_for().iter().map(|r| r.artifact()).collect();
    waits.sort();
    assert_eq!(waits, vec!["combined.js", "other.js"]);

    assert!(runners["combined.js"].wait_for().is_empty());
    assert!(runners["other.js"].wait_for().is_empty());
    assert!(runners.values().all(|r| r.state() == RunnerState::Pending));
}

#[test]
fn full_build_runs_every_task_once_with_consumer_last() {
    init_tracing();
    let recorder = Recorder::new();
    let executor = Executor::new(4).unwrap();

    let runners = Scheduler::new()
        .load(combined_pipeline(&recorder))
        .run()
        .unwrap();
    schedule_all(&runners, &executor).unwrap();
    executor.wait();

    for id in ["combined.js", "other.js", "combined.min.js"] {
        assert_eq!(recorder.runs_of(id), 1, "{id} should run exactly once");
    }
    assert_eq!(
        recorder.finished().last().map(String::as_str),
        Some("combined.min.js")
    );
    let min_start = recorder.started_at("combined.min.js").unwrap();
    assert!(recorder.finished_at("combined.js").unwrap() < min_start);
    assert!(recorder.finished_at("other.js").unwrap() < min_start);
}

#[test]
fn failed_dependency_does_not_block_dependents() {
    let recorder = Recorder::new();
    let executor = Executor::new(2).unwrap();

    let tasks = vec![
        RecordingTask::new("lib.js", &["lib.coffee"], &recorder)
            .failing()
            .into_task(),
        RecordingTask::new("lib.min.js", &["lib.js"], &recorder).into_task(),
    ];
    let runners = Scheduler::new().load(tasks).run().unwrap();
    schedule_all(&runners, &executor).unwrap();
    executor.wait();

    assert_eq!(runners["lib.js"].outcome(), Some(TaskOutcome::Failed));
    assert_eq!(runners["lib.min.js"].outcome(), Some(TaskOutcome::Success));
    assert_eq!(recorder.finished(), vec!["lib.js", "lib.min.js"]);
}

#[test]
fn panicking_task_is_contained() {
    let recorder = Recorder::new();
    let executor = Executor::new(1).unwrap();

    let tasks = vec![
        RecordingTask::new("boom.js", &[], &recorder)
            .panicking()
            .into_task(),
        RecordingTask::new("after.js", &["boom.js"], &recorder).into_task(),
    ];
    let runners = Scheduler::new().load(tasks).run().unwrap();
    schedule_all(&runners, &executor).unwrap();
    executor.wait();

    assert_eq!(runners["boom.js"].outcome(), Some(TaskOutcome::Failed));
    assert_eq!(runners["after.js"].outcome(), Some(TaskOutcome::Success));
    // The single worker survived the panic and ran the dependent.
    assert_eq!(executor.started_workers(), 1);
}

#[test]
fn cyclic_tasks_fail_before_any_runner_exists() {
    let recorder = Recorder::new();
    let tasks = vec![
        RecordingTask::new("a.js", &["b.js"], &recorder).into_task(),
        RecordingTask::new("b.js", &["a.js"], &recorder).into_task(),
    ];

    let err = Scheduler::new().load(tasks).run().unwrap_err();
    assert!(matches!(
        err,
        flue::errors::FlueError::CyclicDependency { .. }
    ));
    assert_eq!(recorder.total_runs(), 0);
}
