//! Open the most recent artifact for a plot type in the default viewer.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::plots::{LatestArtifacts, PlotKind};
use crate::utils;

pub fn run(cfg: &Config, kind: PlotKind) -> Result<()> {
    let latest = LatestArtifacts::load(&cfg.output_path());
    let Some(artifact) = latest.get(kind) else {
        bail!(
            "no {} artifact recorded yet; generate one with --plot first",
            kind.spec().stem
        );
    };
    if !artifact.exists() {
        bail!("recorded artifact no longer exists: {}", artifact.display());
    }
    utils::open_path(artifact)
}
