// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, trace};

use crate::errors::{FlueError, Result};
use crate::exec::{ArtifactId, Task};

/// Mapping from artifact id to the ids it is built from.
///
/// Every source id that appears in an edge set is also a key, so leaf sources
/// (files nobody produces) take part in ordering without being scheduled.
#[derive(Default)]
pub struct DependencyGraph {
    edges: BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
    tasks: HashMap<ArtifactId, Arc<dyn Task>>,
}

impl fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task: its artifact becomes a key and its declared sources
    /// are unioned into that key's edge set.
    pub fn add(&mut self, task: Arc<dyn Task>) {
        let key = task.artifact().to_string();
        let sources: Vec<ArtifactId> = task.sources().to_vec();

        self.edges
            .entry(key.clone())
            .or_default()
            .extend(sources.iter().cloned());

        for source in sources {
            self.edges.entry(source).or_default();
        }

        if self.tasks.insert(key.clone(), task).is_some() {
            debug!(artifact = %key, "task re-registered; later definition wins");
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The task producing `id`, if any.
    pub fn task(&self, id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(id)
    }

    /// Direct dependencies recorded for `id`.
    pub fn dependencies_of(&self, id: &str) -> Option<&BTreeSet<ArtifactId>> {
        self.edges.get(id)
    }

    /// Lazily order the tasks so that every producer comes before its
    /// consumers.
    ///
    /// Each call starts from a fresh copy of the graph. Within one ready
    /// layer the order is unspecified; callers must not rely on it.
    /// A cycle surfaces as a single `Err(FlueError::CyclicDependency)` item
    /// after every orderable task has been yielded.
    pub fn toposort(&self) -> TopoSort<'_> {
        let mut remaining = self.edges.clone();
        for (id, deps) in remaining.iter_mut() {
            deps.remove(id);
        }

        TopoSort {
            graph: self,
            remaining,
            layer: Vec::new(),
            finished: false,
        }
    }
}

/// Iterator returned by [`DependencyGraph::toposort`].
pub struct TopoSort<'a> {
    graph: &'a DependencyGraph,
    remaining: BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
    /// Tasks from the current ready layer not yet handed out.
    layer: Vec<Arc<dyn Task>>,
    finished: bool,
}

impl TopoSort<'_> {
    /// Peel off the next ready layer. Returns `Ok(false)` when the graph is
    /// exhausted.
    fn advance_layer(&mut self) -> Result<bool> {
        loop {
            let ready: BTreeSet<ArtifactId> = self
                .remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(id, _)| id.clone())
                .collect();

            if ready.is_empty() {
                if self.remaining.is_empty() {
                    return Ok(false);
                }
                return Err(cycle_error(&self.remaining));
            }

            trace!(layer = ?ready, "topological layer ready");

            for id in &ready {
                self.remaining.remove(id);
            }
            for deps in self.remaining.values_mut() {
                deps.retain(|d| !ready.contains(d));
            }

            // Reverse so `pop` hands tasks out in key order.
            self.layer = ready
                .iter()
                .rev()
                .filter_map(|id| self.graph.tasks.get(id).cloned())
                .collect();

            // A layer made only of leaf sources yields nothing; keep going.
            if !self.layer.is_empty() {
                return Ok(true);
            }
        }
    }
}

impl Iterator for TopoSort<'_> {
    type Item = Result<Arc<dyn Task>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(task) = self.layer.pop() {
            return Some(Ok(task));
        }
        if self.finished {
            return None;
        }

        match self.advance_layer() {
            Ok(true) => self.layer.pop().map(Ok),
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Name the ids that sit on a cycle among the unorderable remainder.
fn cycle_error(remaining: &BTreeMap<ArtifactId, BTreeSet<ArtifactId>>) -> FlueError {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (id, deps) in remaining {
        graph.add_node(id.as_str());
        for dep in deps {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    let mut involved: Vec<String> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .flatten()
        .map(str::to_string)
        .collect();

    // Nodes merely downstream of a cycle are left out; if that somehow
    // leaves nothing, report the whole remainder.
    if involved.is_empty() {
        involved = remaining.keys().cloned().collect();
    }
    involved.sort();

    FlueError::CyclicDependency { involved }
}
