//! Interpreter subprocess execution.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::script::Invocation;

/// Captured result of one interpreter run. A non-zero exit is a normal
/// outcome here; the classifier decides what it means.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub exit_ok: bool,
    pub stdout: String,
    pub stderr: String,
}

/// The only two ways execution itself can fail; everything else comes
/// back as an `ExecutionOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("interpreter run exceeded {0:?}")]
    Timeout(Duration),
}

/// Run a framed invocation under the interpreter binary, draining both
/// streams to completion. No incremental streaming; the caller awaits the
/// whole run.
pub async fn run_invocation(
    interpreter: &Path,
    invocation: &Invocation,
    limit: Option<Duration>,
) -> Result<ExecutionOutcome, ExecError> {
    let mut cmd = Command::new(interpreter);
    match invocation {
        Invocation::Inline(body) => {
            cmd.arg("-e").arg(body);
        }
        Invocation::ScriptFile(path) => {
            cmd.arg(path);
        }
    }
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    // A timed-out run must not leave the interpreter behind.
    cmd.kill_on_drop(true);

    debug!(interpreter = %interpreter.display(), "launching interpreter");

    let child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: interpreter.display().to_string(),
        source,
    })?;

    let output = match limit {
        Some(dur) => timeout(dur, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout(dur))?,
        None => child.wait_with_output().await,
    }
    .map_err(|source| ExecError::Spawn {
        program: interpreter.display().to_string(),
        source,
    })?;

    Ok(ExecutionOutcome {
        exit_ok: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
