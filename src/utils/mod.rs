//! Utilities (platform viewer dispatch).

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Hand a rendered artifact to the platform's default viewer.
///
/// On Windows: `cmd /C start`; on macOS: `open`; elsewhere: `xdg-open`.
pub fn open_path(path: &Path) -> Result<()> {
    let status = if cfg!(windows) {
        // The empty quoted argument is start's window title slot; without
        // it the path itself would be consumed as the title.
        Command::new("cmd.exe")
            .args(["/C", "start", ""])
            .arg(path)
            .status()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(path).status()
    } else {
        Command::new("xdg-open").arg(path).status()
    };

    let status = status.with_context(|| format!("opening {}", path.display()))?;
    if !status.success() {
        bail!("viewer exited with failure for {}", path.display());
    }
    Ok(())
}
