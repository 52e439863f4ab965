#![allow(dead_code)]

use std::sync::Arc;

use flue::exec::Task;

pub use flue_test_utils::builders;
pub use flue_test_utils::recording::{Event, Recorder, RecordingTask};
pub use flue_test_utils::{init_tracing, wait_until, with_timeout};

/// The three-task pipeline used throughout the tests:
///
/// - `combined.js` from `a.coffee`, `b.coffee`
/// - `other.js` from `c.coffee`, `d.coffee`
/// - `combined.min.js` from `combined.js`, `other.js`
pub fn combined_pipeline(recorder: &Arc<Recorder>) -> Vec<Arc<dyn Task>> {
    vec![
        RecordingTask::new("combined.js", &["a.coffee", "b.coffee"], recorder).into_task(),
        RecordingTask::new("other.js", &["c.coffee", "d.coffee"], recorder).into_task(),
        RecordingTask::new("combined.min.js", &["combined.js", "other.js"], recorder).into_task(),
    ]
}

/// Artifact ids in the order `toposort` yields them.
pub fn topo_order(tasks: &[Arc<dyn Task>]) -> flue::errors::Result<Vec<String>> {
    let mut graph = flue::dag::DependencyGraph::new();
    for task in tasks {
        graph.add(Arc::clone(task));
    }
    graph
        .toposort()
        .map(|task| task.map(|t| t.artifact().to_string()))
        .collect()
}
