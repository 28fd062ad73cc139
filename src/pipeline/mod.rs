//! The generic invocation pipeline: validate, serialize, build, execute,
//! classify. One code path serves every plot type; the per-type
//! differences live entirely in `plots::PlotSpec`.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::{self, PlotError, PlotOutput};
use crate::config::Config;
use crate::exec;
use crate::params::{self, ParamValue, ParameterSet, SessionReference};
use crate::plots::{LatestArtifacts, PlotKind};
use crate::script::{self, InvocationSpec, Invocation, Platform, SessionKind};

/// One user-initiated plot request. Consumed by a single pipeline run.
#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub plot: PlotKind,
    pub session_path: PathBuf,
    pub object_ref: String,
    pub params: ParameterSet,
}

impl PlotRequest {
    /// The argument list exactly as it will appear in the routine call;
    /// surfaced by `--show-args` for inspection.
    pub fn serialized_args(&self) -> String {
        let session = SessionReference::parse(&self.object_ref);
        params::serialize(&session, &self.params)
    }

    /// Decode the request payload shape used by the desktop front end:
    /// `{"sessionFilePath": ..., "sessionObjectRef": "container$member",
    /// ...named parameters}`. Parameter order follows the object's key
    /// order. `filePath`/`ExpObj` are accepted as aliases and
    /// `advancedSettings` is ignored.
    pub fn from_json(plot: PlotKind, payload: &Value) -> Result<Self, PlotError> {
        let obj = payload
            .as_object()
            .ok_or_else(|| PlotError::Validation("request must be a JSON object".into()))?;

        let session_path = obj
            .get("sessionFilePath")
            .or_else(|| obj.get("filePath"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PlotError::Validation("R data file".into()))?;
        let object_ref = obj
            .get("sessionObjectRef")
            .or_else(|| obj.get("ExpObj"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PlotError::Validation("Summarized Experiment Object".into()))?;

        let mut params = ParameterSet::new();
        for (key, value) in obj {
            if matches!(
                key.as_str(),
                "sessionFilePath" | "filePath" | "sessionObjectRef" | "ExpObj" | "advancedSettings"
            ) {
                continue;
            }
            params.insert(key.clone(), ParamValue::from_json(value));
        }

        Ok(Self {
            plot,
            session_path: PathBuf::from(session_path),
            object_ref: object_ref.to_string(),
            params,
        })
    }
}

fn validate(req: &PlotRequest) -> Result<(), PlotError> {
    if req.session_path.as_os_str().is_empty() {
        return Err(PlotError::Validation("R data file".into()));
    }
    if req.object_ref.trim().is_empty() {
        return Err(PlotError::Validation("Summarized Experiment Object".into()));
    }
    if !req.session_path.exists() {
        return Err(PlotError::SessionLoad(format!(
            "no such file: {}",
            req.session_path.display()
        )));
    }
    Ok(())
}

/// Run the trivial device check once before the main invocation. Purely
/// diagnostic: a broken R installation shows up here with a clear log
/// line instead of a confusing downstream failure, but the main run
/// proceeds either way.
async fn smoke_test(cfg: &Config, out_dir: &std::path::Path) {
    let scratch = out_dir.join("smoke-test.pdf");
    let invocation = Invocation::Inline(script::smoke_test_body(&scratch));
    match exec::run_invocation(&cfg.rscript_path(), &invocation, cfg.run_timeout()).await {
        Ok(outcome) if outcome.exit_ok => {
            debug!(stdout = %outcome.stdout.trim(), "smoke test passed");
        }
        Ok(outcome) => {
            warn!(stderr = %outcome.stderr.trim(), "smoke test failed; R installation may be broken");
        }
        Err(err) => {
            warn!(error = %err, "smoke test could not run");
        }
    }
}

/// Execute one plot request end to end and record the artifact pointer on
/// success. Steps are strictly sequential; the subprocess runs to
/// completion (or the configured timeout) before a result exists.
pub async fn run(cfg: &Config, req: PlotRequest) -> Result<PlotOutput, PlotError> {
    validate(&req)?;

    let spec = req.plot.spec();
    let args = req.serialized_args();
    debug!(routine = spec.routine, args = %args, "serialized routine arguments");

    let out_dir = cfg.output_path();
    fs::create_dir_all(&out_dir)
        .map_err(|e| PlotError::DeviceOpen(format!("cannot create {}: {}", out_dir.display(), e)))?;

    // Per-run-unique paths: concurrent runs of one plot type never share
    // an artifact or temp script.
    let run_id = Uuid::new_v4().simple().to_string();
    let artifact_path = out_dir.join(format!("{}-{}.pdf", spec.stem, &run_id[..8]));
    let temp_script_path = out_dir.join(format!("{}-{}.R", spec.stem, &run_id[..8]));

    if !cfg.skip_smoke_test() {
        smoke_test(cfg, &out_dir).await;
    }

    let invocation_spec = InvocationSpec {
        routine: spec.routine.to_string(),
        args,
        session_path: req.session_path.clone(),
        session_kind: SessionKind::from_path(&req.session_path),
        routine_script: cfg.routine_dir().join(spec.script_file),
        artifact_path: artifact_path.clone(),
        temp_script_path: temp_script_path.clone(),
        platform: Platform::current(),
    };

    let invocation = script::build(&invocation_spec)
        .map_err(|e| PlotError::Spawn(format!("cannot write invocation script: {}", e)))?;

    info!(routine = spec.routine, artifact = %artifact_path.display(), "running plotting routine");
    let result = exec::run_invocation(&cfg.rscript_path(), &invocation, cfg.run_timeout()).await;

    if let Invocation::ScriptFile(path) = &invocation {
        if !cfg.keep_run_scripts() {
            let _ = fs::remove_file(path);
        }
    }

    let outcome = result.map_err(PlotError::from)?;
    debug!(stdout = %outcome.stdout.trim(), "interpreter finished");

    let output = classify::resolve(&outcome, &artifact_path)?;

    let mut latest = LatestArtifacts::load(&out_dir);
    if let Err(err) = latest.record(req.plot, &output.artifact_path) {
        // The plot itself succeeded; a stale pointer only degrades
        // open-last behavior.
        warn!(error = %err, "could not update latest-artifact pointer");
    }
    info!(artifact = %output.artifact_path.display(), "plot rendered");

    Ok(output)
}
