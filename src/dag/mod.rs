// src/dag/mod.rs

//! Dependency graph and dependency-gated scheduling.
//!
//! - [`graph`] maps artifacts to their sources and orders them layer by
//!   layer, detecting cycles.
//! - [`runner`] wraps one task with a one-shot completion signal and the
//!   list of runners it waits for.
//! - [`scheduler`] builds the runner graph for a single build pass.

pub mod graph;
pub mod runner;
pub mod scheduler;

pub use graph::{DependencyGraph, TopoSort};
pub use runner::{Completion, Runner, RunnerState};
pub use scheduler::{RunnerMap, Scheduler, schedule_all};
