//! Session inspection handler: print one object reference per line.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::session;

pub async fn run(cfg: &Config, session_path: &Path) -> Result<()> {
    let objects = session::list_objects(cfg, session_path).await?;
    if objects.is_empty() {
        eprintln!("no list-like objects found in {}", session_path.display());
        return Ok(());
    }
    for reference in objects {
        println!("{}", reference);
    }
    Ok(())
}
