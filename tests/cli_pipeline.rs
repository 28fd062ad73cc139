//! End-to-end runs of the jamsdesk binary against a fake interpreter.
//!
//! The fake is a shell script standing in for Rscript: it extracts the
//! pdf() target from the generated script body, writes bytes there, and
//! prints the stage markers the real invocation would.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;

const FAKE_OK: &str = r#"#!/bin/sh
body="$2"
path=$(printf '%s' "$body" | sed -n 's/.*pdf("\([^"]*\)").*/\1/p' | head -n 1)
if [ -n "$path" ]; then printf 'fake-pdf-bytes' > "$path"; fi
printf 'session loaded\n'
printf 'JAMS library loaded\n'
printf 'source function loaded\n'
printf 'PDF device opened\n'
printf 'routine completed successfully\n'
printf 'PDF device closed\n'
"#;

const FAKE_FATAL_STDERR: &str = r#"#!/bin/sh
printf 'Error in library(JAMS) : there is no package called JAMS\n' >&2
"#;

const FAKE_LISTER: &str = r#"#!/bin/sh
printf 'expvec$LKT\n'
printf 'expvec$Product\n'
"#;

struct Sandbox {
    dir: TempDir,
    fake_rscript: PathBuf,
}

impl Sandbox {
    fn new(fake_body: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let fake_rscript = dir.path().join("fake-rscript");
        fs::write(&fake_rscript, fake_body)?;
        fs::set_permissions(&fake_rscript, fs::Permissions::from_mode(0o755))?;
        fs::write(dir.path().join("session.rdata"), b"not a real session")?;
        Ok(Self { dir, fake_rscript })
    }

    fn session(&self) -> PathBuf {
        self.dir.path().join("session.rdata")
    }

    fn output_dir(&self) -> PathBuf {
        self.dir.path().join("assets")
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let out = Command::new(env!("CARGO_BIN_EXE_jamsdesk"))
            .args(args)
            .env("RSCRIPT_PATH", &self.fake_rscript)
            .env("OUTPUT_PATH", self.output_dir())
            .env("ROUTINE_DIR", self.dir.path().join("R"))
            .env("RUN_TIMEOUT", "30")
            .env("SKIP_SMOKE_TEST", "true")
            .output()?;
        Ok(out)
    }
}

fn stdout_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn heatmap_run_renders_and_records_artifact() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_OK)?;
    let session = sandbox.session();
    let out = sandbox.run(&[
        "--plot",
        "heatmap",
        "--session",
        session.to_str().unwrap(),
        "--object",
        "expvec$LKT",
        "--param",
        "glomby=Genus",
        "--param",
        "threshPA=0",
        "--show-args",
    ])?;

    let stdout = stdout_of(&out);
    assert!(
        out.status.success(),
        "run failed: {}",
        stderr_of(&out)
    );
    assert!(stdout.contains("ExpObj = expvec$LKT, glomby=\"Genus\", threshPA=0"));
    assert!(stdout.contains("plot rendered:"));

    // Per-run-unique artifact under the output dir, pointed to by latest.json.
    let artifacts: Vec<_> = fs::read_dir(sandbox.output_dir())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("heatmap-") && name.ends_with(".pdf"))
        .collect();
    assert_eq!(artifacts.len(), 1);

    let latest = fs::read_to_string(sandbox.output_dir().join("latest.json"))?;
    assert!(latest.contains("heatmap"));
    assert!(latest.contains(&artifacts[0]));
    Ok(())
}

#[test]
fn two_runs_never_share_an_artifact_path() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_OK)?;
    let session = sandbox.session();
    for _ in 0..2 {
        let out = sandbox.run(&[
            "--plot",
            "ordination",
            "--session",
            session.to_str().unwrap(),
            "--object",
            "expvec$LKT",
        ])?;
        assert!(out.status.success(), "run failed: {}", stderr_of(&out));
    }
    let artifacts: Vec<_> = fs::read_dir(sandbox.output_dir())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("ordination-") && name.ends_with(".pdf"))
        .collect();
    assert_eq!(artifacts.len(), 2);
    Ok(())
}

#[test]
fn fatal_interpreter_stderr_fails_the_request() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_FATAL_STDERR)?;
    let session = sandbox.session();
    let out = sandbox.run(&[
        "--plot",
        "heatmap",
        "--session",
        session.to_str().unwrap(),
        "--object",
        "expvec$LKT",
    ])?;
    assert!(!out.status.success());
    assert!(stderr_of(&out).contains("no package called JAMS"));
    Ok(())
}

#[test]
fn missing_required_fields_fail_before_execution() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_OK)?;
    let session = sandbox.session();
    let out = sandbox.run(&["--plot", "heatmap", "--session", session.to_str().unwrap()])?;
    assert!(!out.status.success());
    assert!(stderr_of(&out).contains("required field missing"));
    Ok(())
}

#[test]
fn request_file_drives_a_run() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_OK)?;
    let request = sandbox.dir.path().join("request.json");
    fs::write(
        &request,
        format!(
            r#"{{
  "sessionFilePath": "{}",
  "sessionObjectRef": "expvec$LKT",
  "samplesToKeep": "",
  "asPPM": true
}}"#,
            sandbox.session().display()
        ),
    )?;
    let out = sandbox.run(&[
        "--plot",
        "relabund-features",
        "--request",
        request.to_str().unwrap(),
        "--show-args",
    ])?;
    assert!(out.status.success(), "run failed: {}", stderr_of(&out));
    assert!(stdout_of(&out).contains("ExpObj = expvec$LKT, samplesToKeep=NULL, asPPM=TRUE"));
    Ok(())
}

#[test]
fn list_objects_prints_references() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_LISTER)?;
    let session = sandbox.session();
    let out = sandbox.run(&["--list-objects", session.to_str().unwrap()])?;
    assert!(out.status.success(), "run failed: {}", stderr_of(&out));
    let stdout = stdout_of(&out);
    assert!(stdout.contains("expvec$LKT"));
    assert!(stdout.contains("expvec$Product"));
    Ok(())
}

#[test]
fn open_without_prior_run_is_an_error() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_OK)?;
    let out = sandbox.run(&["--open", "alpha-diversity"])?;
    assert!(!out.status.success());
    assert!(stderr_of(&out).contains("no alphaDiversity artifact recorded yet"));
    Ok(())
}

// The sed extraction in FAKE_OK mirrors what the real interpreter does
// with the generated body: the pdf() target is the only path it writes.
#[test]
fn fake_interpreter_extracts_the_device_path() -> Result<()> {
    let sandbox = Sandbox::new(FAKE_OK)?;
    let target = sandbox.dir.path().join("probe.pdf");
    let body = format!("pdf(\"{}\");\ndev.off();", target.display());
    let out = Command::new(&sandbox.fake_rscript)
        .arg("-e")
        .arg(&body)
        .output()?;
    assert!(out.status.success());
    assert!(target.exists());
    assert_eq!(fs::read(&target)?, b"fake-pdf-bytes");
    Ok(())
}
