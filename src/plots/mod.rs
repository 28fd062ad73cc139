//! The four plotting routines as configuration, plus the "latest
//! artifact" pointer store behind the open-artifact command.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One row of configuration per plot type; the pipeline itself is
/// generic over these.
#[derive(Debug, Clone, Copy)]
pub struct PlotSpec {
    /// R function invoked with the serialized argument list.
    pub routine: &'static str,
    /// Routine definition file under ROUTINE_DIR.
    pub script_file: &'static str,
    /// Artifact and temp-script base name.
    pub stem: &'static str,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PlotKind {
    Heatmap,
    Ordination,
    AlphaDiversity,
    RelabundFeatures,
}

impl PlotKind {
    pub const ALL: [PlotKind; 4] = [
        PlotKind::Heatmap,
        PlotKind::Ordination,
        PlotKind::AlphaDiversity,
        PlotKind::RelabundFeatures,
    ];

    pub fn spec(self) -> &'static PlotSpec {
        // The relabund form submits its boolean toggles as text
        // ("true"/"false") because of a long-standing field-name typo in
        // its checkbox check; routines tolerate the quoted form, so those
        // values are left text-encoded rather than promoted to logicals.
        match self {
            PlotKind::Heatmap => &PlotSpec {
                routine: "plot_relabund_heatmap",
                script_file: "plot_relabund_heatmap.R",
                stem: "heatmap",
            },
            PlotKind::Ordination => &PlotSpec {
                routine: "plot_Ordination",
                script_file: "plot_Ordination.R",
                stem: "ordination",
            },
            PlotKind::AlphaDiversity => &PlotSpec {
                routine: "plot_alpha_diversity",
                script_file: "plot_alpha_diversity.R",
                stem: "alphaDiversity",
            },
            PlotKind::RelabundFeatures => &PlotSpec {
                routine: "plot_relabund_features",
                script_file: "plot_relabund_features.R",
                stem: "relabundFeatures",
            },
        }
    }
}

const LATEST_FILE: &str = "latest.json";

/// Pointer file mapping plot type to the most recent successful artifact.
/// Runs write unique artifact paths, so "open the last heatmap" needs an
/// explicitly updated pointer instead of a well-known filename.
#[derive(Debug, Clone)]
pub struct LatestArtifacts {
    path: PathBuf,
    entries: BTreeMap<PlotKind, PathBuf>,
}

impl LatestArtifacts {
    /// Load the pointer file from the output directory; absent or
    /// unreadable state starts empty.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(LATEST_FILE);
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    pub fn get(&self, kind: PlotKind) -> Option<&Path> {
        self.entries.get(&kind).map(PathBuf::as_path)
    }

    /// Record a verified artifact and persist. Written to a sibling temp
    /// file and renamed so concurrent runs land on last-writer-wins
    /// rather than a torn file.
    pub fn record(&mut self, kind: PlotKind, artifact: &Path) -> Result<()> {
        self.entries.insert(kind, artifact.to_path_buf());
        let text = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .with_context(|| format!("updating {}", self.path.display()))?;
        Ok(())
    }
}
