use clap::{ArgGroup, Parser};

use crate::plots::PlotKind;

#[derive(Parser, Debug, Clone)]
#[command(name = "jamsdesk", about = "JAMS plotting companion CLI", version)]
#[command(group(ArgGroup::new("mode").args(["plot", "list_objects", "open"]).multiple(false).required(true)))]
pub struct Cli {
    /// Generate a plot of the given type.
    #[arg(long, value_enum)]
    pub plot: Option<PlotKind>,

    /// Session file (.rdata/.rda/.rds) holding the summarized experiment.
    #[arg(long)]
    pub session: Option<String>,

    /// Object reference inside the session, e.g. 'expvec$LKT'.
    #[arg(long)]
    pub object: Option<String>,

    /// Routine parameter as key=value. Can be used multiple times;
    /// values are classified the same way form fields are (NULL, c(...)
    /// expressions, numbers, quoted text).
    #[arg(long = "param", action = clap::ArgAction::Append)]
    pub param: Vec<String>,

    /// JSON request file with sessionFilePath, sessionObjectRef and named
    /// parameters; --session/--object/--param override its entries.
    #[arg(long)]
    pub request: Option<String>,

    /// Print the serialized argument list before running.
    #[arg(long = "show-args")]
    pub show_args: bool,

    /// List container$member references in a session file.
    #[arg(long = "list-objects", value_name = "FILE")]
    pub list_objects: Option<String>,

    /// Open the most recent artifact for a plot type.
    #[arg(long, value_enum, value_name = "PLOT")]
    pub open: Option<PlotKind>,

    /// Override the Rscript interpreter path.
    #[arg(long)]
    pub rscript: Option<String>,

    /// Override the directory holding the plotting routine .R files.
    #[arg(long = "routine-dir")]
    pub routine_dir: Option<String>,

    /// Wall-clock timeout for one interpreter run, in seconds (0 disables).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Keep the per-run temp script for debugging.
    #[arg(long = "keep-script")]
    pub keep_script: bool,

    /// Skip the PDF device smoke test before the main run.
    #[arg(long = "no-smoke-test")]
    pub no_smoke_test: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
