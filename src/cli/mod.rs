pub mod config;
pub mod daemon_path;
pub mod dates;
pub mod palette;
pub mod process;
pub mod render;
pub mod report;
pub mod summary;
pub mod tag;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::process_config_command;
use palette::Palette;
use process::{daemon_executable, kill_previous_servers, restart_server};
use report::{process_report_command, ReportCommand};
use summary::process_summary_command;
use tag::{process_label_command, process_tags_command, LabelCommand, LabelKind};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::start_daemon,
    store::{entities::ConfigUpdate, JsonStoreFile},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir, DOCUMENT_NAME},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "worktally", version, long_about = None)]
#[command(about = "Tracks working and idle time in 5 minute buckets", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/worktally or $HOME/.local/state/worktally"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Document to read and write. By default <dir>/worktally.json")]
    file: Option<PathBuf>,
    #[arg(long = "no-color", global = true, help = "Print without colors")]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts the sampling daemon, replacing a running one")]
    Start {},
    #[command(about = "Stops the running daemon")]
    Stop {},
    #[command(about = "Runs the sampling loop in the current console")]
    Serve {},
    #[command(about = "Prints the timeline of a day or the totals of a week, month or year")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Prints the dashboard")]
    Summary {
        #[arg(long, short, help = "Refresh every 30 seconds until interrupted")]
        watch: bool,
    },
    #[command(about = "Shows settings, or changes one: dailygoal=HH:MM, workdays=Mon-Fri or workdays=Mon,Wed,Fri")]
    Config { update: Option<ConfigUpdate> },
    #[command(about = "Tags a block of the timeline")]
    Tag {
        #[command(flatten)]
        command: LabelCommand,
    },
    #[command(about = "Attaches a note to a block of the timeline")]
    Note {
        #[command(flatten)]
        command: LabelCommand,
    },
    #[command(about = "Lists previously used tags")]
    Tags {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;
    let app_dir = std::path::absolute(app_dir)?;
    let logging_level = args.log.then_some(LevelFilter::TRACE);
    enable_logging(CLI_PREFIX, &app_dir.join("logs"), logging_level, args.log)?;

    let file = std::path::absolute(args.file.unwrap_or_else(|| app_dir.join(DOCUMENT_NAME)))?;
    let repository = JsonStoreFile::new(file.clone());
    let palette = if args.no_color {
        Palette::plain()
    } else {
        #[cfg(windows)]
        let _ = ansi_term::enable_ansi_support();
        Palette::colored()
    };

    match args.commands {
        Commands::Start {} => {
            restart_server(&app_dir, &file)?;
            println!("Started daemon writing to {}", file.display());
            Ok(())
        }
        Commands::Stop {} => {
            let stopped = kill_previous_servers(&daemon_executable()?)?;
            println!("Stopped {stopped} daemon(s)");
            Ok(())
        }
        Commands::Serve {} => start_daemon(file).await,
        Commands::Report { command } => process_report_command(command, repository, palette).await,
        Commands::Summary { watch } => {
            process_summary_command(watch, repository, palette, DefaultClock).await
        }
        Commands::Config { update } => process_config_command(update, repository).await,
        Commands::Tag { command } => {
            process_label_command(command, LabelKind::Tag, repository).await
        }
        Commands::Note { command } => {
            process_label_command(command, LabelKind::Note, repository).await
        }
        Commands::Tags {} => process_tags_command(repository).await,
    }
}
