// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task`] defines the [`Task`] contract every build backend implements,
//!   and the boundary where task failures are contained.
//! - [`pool`] is the bounded worker pool that executes runners.
//! - [`process`] runs external commands and captures their output.
//! - [`compilers`] holds the concrete backends (coffee, uglify, compass and
//!   plain shell commands).
//! - [`flags`] validates backend-specific command-line flags.

pub mod compilers;
pub mod flags;
pub mod pool;
pub mod process;
pub mod task;

pub use compilers::{Compiler, CompilerKind};
pub use flags::{Arguments, Flag, FlagError};
pub use pool::{Executor, default_jobs};
pub use process::{CommandOutput, local, local_with_env};
pub use task::{ArtifactId, Task, TaskOutcome, invoke};
