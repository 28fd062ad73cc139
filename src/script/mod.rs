//! R invocation script assembly.
//!
//! The generated program has two failure boundaries: an outer `tryCatch`
//! around session load / library attach / routine source / device open,
//! and an inner one around the routine call itself so a plotting failure
//! still closes the PDF device. Progress markers are `cat`-ed after each
//! stage; the classifier attributes outer-boundary failures to a stage by
//! the furthest marker seen.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::params::quote_r_string;

pub const MARK_SESSION_LOADED: &str = "session loaded";
pub const MARK_LIBRARY_ATTACHED: &str = "JAMS library loaded";
pub const MARK_ROUTINE_SOURCED: &str = "source function loaded";
pub const MARK_DEVICE_OPENED: &str = "PDF device opened";
pub const MARK_DEVICE_CLOSED: &str = "PDF device closed";
/// Inner boundary diagnostic: the routine call failed but the outer flow
/// (device close) continued.
pub const TAG_ROUTINE_ERROR: &str = "ERROR IN R CODE:";
/// Outer boundary diagnostic: load/attach/source/open failed and the
/// device stages were skipped.
pub const TAG_LOAD_ERROR: &str = "ERROR LOADING FILE:";

/// How the session file deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// `.rds`: a single serialized object, read into a bound variable.
    SerializedObject,
    /// `.rdata`/`.rda`: an image loaded into the ambient namespace.
    TabularBinary,
}

impl SessionKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if ext == "rds" {
            SessionKind::SerializedObject
        } else {
            SessionKind::TabularBinary
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Everything needed to run one plotting routine. Built once per request,
/// consumed once by the executor.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    pub routine: String,
    /// Serialized argument list from `params::serialize`.
    pub args: String,
    pub session_path: PathBuf,
    pub session_kind: SessionKind,
    pub routine_script: PathBuf,
    pub artifact_path: PathBuf,
    pub temp_script_path: PathBuf,
    pub platform: Platform,
}

/// Platform framing for the assembled script. Both carry the same script
/// body; very long inline argument strings are unreliable on Windows, so
/// that family runs from a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Pass the body as a single `-e` argument.
    Inline(String),
    /// Run the body from a script file written for this invocation.
    ScriptFile(PathBuf),
}

fn load_command(spec: &InvocationSpec) -> String {
    let path = quote_r_string(&spec.session_path.to_string_lossy());
    match spec.session_kind {
        SessionKind::SerializedObject => format!("obj <- readRDS({})", path),
        SessionKind::TabularBinary => format!("load({})", path),
    }
}

/// Render the script body shared by both platform framings.
pub fn render_body(spec: &InvocationSpec) -> String {
    let load = load_command(spec);
    let source_path = quote_r_string(&spec.routine_script.to_string_lossy());
    let artifact_path = quote_r_string(&spec.artifact_path.to_string_lossy());
    let routine = &spec.routine;
    let args = &spec.args;

    format!(
        r#"suppressPackageStartupMessages({{
suppressWarnings({{
  options(encoding = "UTF-8");
  tryCatch({{
    {load}
    cat("{MARK_SESSION_LOADED}\n")
    library(JAMS);
    cat("{MARK_LIBRARY_ATTACHED}\n")
    source({source_path});
    cat("{MARK_ROUTINE_SOURCED}\n")
    pdf({artifact_path});
    cat("{MARK_DEVICE_OPENED}\n")
    tryCatch({{
      cat("attempting to run {routine}...\n")
      {routine}({args})
      cat("{routine} completed successfully\n")
    }}, error = function(e) {{
      cat("{TAG_ROUTINE_ERROR} ", conditionMessage(e), "\n")
    }})
    dev.off();
    cat("{MARK_DEVICE_CLOSED}\n")
  }}, error = function(e) {{
    cat("{TAG_LOAD_ERROR} ", conditionMessage(e), "\n")
  }})
}})
}})
"#
    )
}

/// Frame the body for the spec's platform, writing the per-run temp
/// script file when the platform requires one.
pub fn build(spec: &InvocationSpec) -> io::Result<Invocation> {
    let body = render_body(spec);
    match spec.platform {
        Platform::Unix => Ok(Invocation::Inline(body)),
        Platform::Windows => {
            fs::write(&spec.temp_script_path, body)?;
            Ok(Invocation::ScriptFile(spec.temp_script_path.clone()))
        }
    }
}

/// Minimal device check run before the main invocation to catch a broken
/// R installation early. Diagnostic only; its result never gates the run.
pub fn smoke_test_body(scratch_pdf: &Path) -> String {
    format!(
        "pdf({}); plot(1:10); dev.off(); cat(\"smoke test PDF created\\n\")",
        quote_r_string(&scratch_pdf.to_string_lossy())
    )
}
