//! Output artifact verification.

use std::fs;
use std::path::Path;

/// State of the expected artifact after a run. `Empty` is distinct from
/// `Missing`: the device opened but nothing was rendered into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Missing,
    Empty,
    Present(u64),
}

pub fn verify_artifact(path: &Path) -> ArtifactState {
    match fs::metadata(path) {
        Err(_) => ArtifactState::Missing,
        Ok(meta) if meta.len() == 0 => ArtifactState::Empty,
        Ok(meta) => ArtifactState::Present(meta.len()),
    }
}
