use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
pub struct DaemonArgs {
    /// Stay in the foreground instead of detaching.
    #[arg(long)]
    pub force: bool,
    /// Application directory holding logs and the default document.
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Document to sample into. Defaults to `<dir>/worktally.json`.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
