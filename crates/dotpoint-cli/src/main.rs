//! dotpoint CLI: question bank sync, dev-server bootstrap and progress stats.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use dotpoint_core::report::SyncMode;

mod commands;

#[derive(Parser)]
#[command(name = "dotpoint", version, about = "Study app tooling: question banks, dev server, progress")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatsFormat {
    Text,
    Json,
    Html,
}

#[derive(Subcommand)]
enum Commands {
    /// Push question bank CSV files into spreadsheet tabs
    Sync {
        /// overwrite: header and rows from A1; append: rows after existing data
        #[arg(long)]
        mode: SyncMode,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the run report here (.html for HTML, JSON otherwise)
        #[arg(long)]
        report: Option<PathBuf>,

        /// CSV files to sync (default: the files listed in the config)
        files: Vec<PathBuf>,
    },

    /// Check question bank CSV files for authoring mistakes
    Validate {
        /// CSV file or directory of CSV files
        path: PathBuf,
    },

    /// Install dependencies if needed, free the port and start the Vite dev server
    Dev {
        /// Web app directory
        #[arg(long)]
        project_dir: Option<PathBuf>,

        /// Package whose presence in node_modules means dependencies are installed
        #[arg(long)]
        marker: Option<String>,
    },

    /// Show progress stats for one dotpoint
    Stats {
        /// Progress store (JSON object of key -> JSON string)
        #[arg(long)]
        store: PathBuf,

        /// Dotpoint identifier
        #[arg(long)]
        dotpoint: String,

        /// Learn activity completed
        #[arg(long)]
        learn: bool,

        /// Quiz activity completed
        #[arg(long)]
        quiz: bool,

        /// Practice activity completed
        #[arg(long)]
        practice: bool,

        /// Dotpoint title
        #[arg(long)]
        title: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: StatsFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Move legacy progress keys to the canonical key format
    MigrateProgress {
        /// Progress store (JSON object of key -> JSON string)
        #[arg(long)]
        store: PathBuf,
    },

    /// Create a starter dotpoint.toml and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dotpoint=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            mode,
            config,
            report,
            files,
        } => commands::sync::execute(mode, config, report, files).await,
        Commands::Validate { path } => commands::validate::execute(path),
        Commands::Dev {
            project_dir,
            marker,
        } => commands::dev::execute(project_dir, marker).await,
        Commands::Stats {
            store,
            dotpoint,
            learn,
            quiz,
            practice,
            title,
            format,
            output,
        } => commands::stats::execute(
            store,
            dotpoint,
            dotpoint_core::progress::CompletionFlags {
                learn,
                quiz,
                practice,
            },
            title,
            format,
            output,
        ),
        Commands::MigrateProgress { store } => commands::migrate_progress::execute(store),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
