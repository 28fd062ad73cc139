mod cli;
mod classify;
mod config;
mod exec;
mod handlers;
mod params;
mod pipeline;
mod plots;
mod script;
mod session;
mod utils;
mod verify;

use std::path::Path;

use anyhow::{bail, Result};
use config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_from_env("JAMSDESK_LOG"))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();

    // Apply CLI overrides before loading config; env keys take precedence
    // over the rc file there.
    if let Some(rscript) = &args.rscript {
        std::env::set_var("RSCRIPT_PATH", rscript);
    }
    if let Some(dir) = &args.routine_dir {
        std::env::set_var("ROUTINE_DIR", dir);
    }
    if let Some(secs) = args.timeout {
        std::env::set_var("RUN_TIMEOUT", secs.to_string());
    }
    if args.keep_script {
        std::env::set_var("KEEP_RUN_SCRIPTS", "true");
    }
    if args.no_smoke_test {
        std::env::set_var("SKIP_SMOKE_TEST", "true");
    }

    let cfg = Config::load();

    if let Some(file) = &args.list_objects {
        return handlers::objects::run(&cfg, Path::new(file)).await;
    }
    if let Some(kind) = args.open {
        return handlers::open::run(&cfg, kind);
    }
    if let Some(kind) = args.plot {
        return handlers::plot::run(
            &cfg,
            kind,
            args.session.as_deref(),
            args.object.as_deref(),
            args.request.as_deref(),
            &args.param,
            args.show_args,
        )
        .await;
    }

    // clap's mode group guarantees one of the arms above matched.
    bail!("no mode selected");
}
