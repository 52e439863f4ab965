// src/engine/mod.rs

//! Build orchestration for flue.
//!
//! A [`Maker`] owns the task list of one configuration and the shared
//! executor. It drives:
//! - one-shot build passes (`make`), reported as a [`BuildReport`]
//! - watch sessions (`watch`): a build pass followed by the polling loop
//!   of [`crate::watch::WatchSession`]
//!
//! The outer reload loop lives in [`crate::run`]: on
//! [`crate::watch::WatchOutcome::Reload`] it re-reads the configuration and
//! builds a new `Maker` around the same executor.

pub mod maker;
pub mod report;

pub use maker::Maker;
pub use report::BuildReport;
