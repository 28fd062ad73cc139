//! Outcome classification: from captured streams and the artifact on
//! disk to a single typed result.
//!
//! R reports most failures as free text. The generated script funnels
//! them through two tagged diagnostics (`ERROR LOADING FILE:`,
//! `ERROR IN R CODE:`) plus stage markers, which is as structured as the
//! interpreter side gets; the stderr substring heuristic stays as the
//! fallback for anything that escapes the boundaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::exec::{ExecError, ExecutionOutcome};
use crate::script::{
    MARK_LIBRARY_ATTACHED, MARK_ROUTINE_SOURCED, MARK_SESSION_LOADED, TAG_LOAD_ERROR,
    TAG_ROUTINE_ERROR,
};
use crate::verify::{verify_artifact, ArtifactState};

/// Terminal failure taxonomy for one plot request. Every internal failure
/// converts into exactly one of these; the caller surfaces the message
/// verbatim.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("required field missing: {0}")]
    Validation(String),
    #[error("failed to load session file: {0}")]
    SessionLoad(String),
    #[error("failed to attach the JAMS library: {0}")]
    LibraryAttach(String),
    #[error("failed to source the plotting routine: {0}")]
    RoutineSource(String),
    #[error("failed to open the PDF device: {0}")]
    DeviceOpen(String),
    #[error("R error: {0}")]
    Interpreter(String),
    #[error("{0}")]
    Spawn(String),
    #[error("interpreter run exceeded {0:?}")]
    Timeout(Duration),
    #[error("output file was not created")]
    OutputMissing,
    #[error("output file was created but is empty")]
    OutputEmpty,
}

impl From<ExecError> for PlotError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Timeout(dur) => PlotError::Timeout(dur),
            spawn => PlotError::Spawn(spawn.to_string()),
        }
    }
}

/// Successful invocation: the routine's stdout and the verified artifact.
#[derive(Debug, Clone)]
pub struct PlotOutput {
    pub stdout: String,
    pub artifact_path: PathBuf,
}

/// Fatal unless it only carries warnings; `error` outranks `warning` when
/// both appear.
fn stderr_is_fatal(stderr: &str) -> bool {
    if stderr.trim().is_empty() {
        return false;
    }
    let lower = stderr.to_lowercase();
    lower.contains("error") || !lower.contains("warning")
}

/// Text following `tag` on its line, e.g. the `conditionMessage` the
/// script cat-ed after `ERROR IN R CODE:`.
fn tag_message(stdout: &str, tag: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.split_once(tag).map(|(_, rest)| rest.trim().to_string()))
}

/// Attribute an outer-boundary failure to a stage by the furthest
/// progress marker that made it to stdout.
fn outer_error(stdout: &str, detail: String) -> PlotError {
    if stdout.contains(MARK_ROUTINE_SOURCED) {
        PlotError::DeviceOpen(detail)
    } else if stdout.contains(MARK_LIBRARY_ATTACHED) {
        PlotError::RoutineSource(detail)
    } else if stdout.contains(MARK_SESSION_LOADED) {
        PlotError::LibraryAttach(detail)
    } else {
        PlotError::SessionLoad(detail)
    }
}

/// Decide the final result for a completed interpreter run.
pub fn resolve(outcome: &ExecutionOutcome, artifact: &Path) -> Result<PlotOutput, PlotError> {
    if !outcome.exit_ok {
        let detail = if outcome.stderr.trim().is_empty() {
            "interpreter exited with failure".to_string()
        } else {
            format!("interpreter exited with failure: {}", outcome.stderr.trim())
        };
        return Err(PlotError::Spawn(detail));
    }

    if stderr_is_fatal(&outcome.stderr) {
        return Err(PlotError::Interpreter(outcome.stderr.trim().to_string()));
    }
    if !outcome.stderr.trim().is_empty() {
        warn!(stderr = %outcome.stderr.trim(), "interpreter diagnostics (warnings only)");
    }

    if let Some(detail) = tag_message(&outcome.stdout, TAG_LOAD_ERROR) {
        return Err(outer_error(&outcome.stdout, detail));
    }
    if let Some(detail) = tag_message(&outcome.stdout, TAG_ROUTINE_ERROR) {
        return Err(PlotError::Interpreter(detail));
    }

    match verify_artifact(artifact) {
        ArtifactState::Missing => Err(PlotError::OutputMissing),
        ArtifactState::Empty => Err(PlotError::OutputEmpty),
        ArtifactState::Present(_) => Ok(PlotOutput {
            stdout: outcome.stdout.clone(),
            artifact_path: artifact.to_path_buf(),
        }),
    }
}
