//! Plot handler: assemble a request from CLI flags and/or a JSON request
//! file, run the pipeline, and surface the result.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::params::{ParamValue, ParameterSet};
use crate::pipeline::{self, PlotRequest};
use crate::plots::PlotKind;

pub async fn run(
    cfg: &Config,
    plot: PlotKind,
    session: Option<&str>,
    object: Option<&str>,
    request_file: Option<&str>,
    params: &[String],
    show_args: bool,
) -> Result<()> {
    let mut request = match request_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading request file {}", path))?;
            let payload = serde_json::from_str(&text)
                .with_context(|| format!("parsing request file {}", path))?;
            PlotRequest::from_json(plot, &payload).map_err(|e| anyhow!(e.to_string()))?
        }
        None => PlotRequest {
            plot,
            session_path: PathBuf::new(),
            object_ref: String::new(),
            params: ParameterSet::new(),
        },
    };

    // CLI flags override the request file.
    if let Some(session) = session {
        request.session_path = PathBuf::from(session);
    }
    if let Some(object) = object {
        request.object_ref = object.to_string();
    }
    for pair in params {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("--param expects key=value, got '{}'", pair))?;
        request.params.insert(key, ParamValue::classify(value));
    }

    if show_args {
        println!("{}", request.serialized_args());
    }

    let output = pipeline::run(cfg, request)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    let trimmed = output.stdout.trim();
    if !trimmed.is_empty() {
        println!("{}", trimmed);
    }
    println!(
        "{} {}",
        "plot rendered:".green(),
        output.artifact_path.display().bold()
    );
    Ok(())
}
