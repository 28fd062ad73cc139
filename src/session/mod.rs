//! Session inspection: enumerate `container$member` references for the
//! list-like objects inside a session file, to drive ExpObj selection.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::config::Config;
use crate::exec;
use crate::params::quote_r_string;
use crate::script::{Invocation, SessionKind};

/// One-liner R program that loads the session and writes one
/// `container$member` line per member of every list-like object found.
fn listing_script(session_path: &Path) -> String {
    let path = quote_r_string(&session_path.to_string_lossy());
    let load = match SessionKind::from_path(session_path) {
        SessionKind::SerializedObject => format!("obj <- readRDS({})", path),
        SessionKind::TabularBinary => format!("load({})", path),
    };
    format!(
        "{load}; list_objs <- ls(); \
         list_objs <- list_objs[sapply(list_objs, function(x) is.list(get(x)))]; \
         for (lo in list_objs) {{ writeLines(paste(lo, names(get(lo)), sep='$'), stdout()) }}"
    )
}

/// Lazily yield the non-empty reference lines of a listing run.
fn parse_listing(stdout: &str) -> impl Iterator<Item = String> + '_ {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// Run the lister against a session file. An empty listing is a valid
/// result (no list-like objects); warnings on stderr are tolerated.
pub async fn list_objects(cfg: &Config, session_path: &Path) -> Result<Vec<String>> {
    if !session_path.exists() {
        bail!("session file does not exist: {}", session_path.display());
    }

    let invocation = Invocation::Inline(listing_script(session_path));
    let outcome = exec::run_invocation(&cfg.rscript_path(), &invocation, cfg.run_timeout())
        .await
        .with_context(|| format!("inspecting {}", session_path.display()))?;

    if !outcome.exit_ok {
        bail!("R error: {}", outcome.stderr.trim());
    }
    if !outcome.stderr.trim().is_empty() {
        if outcome.stderr.to_lowercase().contains("warning") {
            warn!(stderr = %outcome.stderr.trim(), "session inspection warnings");
        } else {
            bail!("R error: {}", outcome.stderr.trim());
        }
    }

    let objects: Vec<String> = parse_listing(&outcome.stdout).collect();
    debug!(count = objects.len(), "session objects listed");
    Ok(objects)
}
