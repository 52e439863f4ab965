// src/exec/process.rs

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::errors::TaskExecutionError;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run `args[0]` with the remaining arguments in `cwd`, capturing its output.
///
/// A non-zero exit is returned as a [`TaskExecutionError`] carrying the
/// command line and everything the process printed.
pub fn local(args: &[String], cwd: &Path) -> Result<CommandOutput> {
    local_with_env(args, cwd, &[])
}

/// Like [`local`], with extra environment variables for the child.
pub fn local_with_env(
    args: &[String],
    cwd: &Path,
    envs: &[(&str, String)],
) -> Result<CommandOutput> {
    let Some((program, rest)) = args.split_first() else {
        bail!("cannot run an empty command");
    };

    info!("{}", args.join(" "));

    let output = Command::new(program)
        .args(rest)
        .current_dir(cwd)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("spawning '{program}'"))?;

    debug!(
        program = %program,
        exit_code = ?output.status.code(),
        "command exited"
    );

    if !output.status.success() {
        return Err(TaskExecutionError {
            command: args.to_vec(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(CommandOutput {
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Platform shell invocation for a free-form command string.
pub fn shell_args(cmd: &str) -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".to_string(), "/C".to_string(), cmd.to_string()]
    } else {
        vec!["sh".to_string(), "-c".to_string(), cmd.to_string()]
    }
}
