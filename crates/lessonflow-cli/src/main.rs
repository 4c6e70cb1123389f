//! lessonflow CLI — study course modules from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "lessonflow",
    version,
    about = "Module progression and assessment engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and a sample module
    Init,

    /// Check module content files for authoring defects
    Validate {
        /// Content file or directory of content files
        #[arg(long)]
        path: PathBuf,
    },

    /// List catalog modules with stored progress
    Modules {
        /// Only show this course
        #[arg(long)]
        course: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show stored progress for a module
    Progress {
        /// Module identifier (e.g. CM_INTRO)
        #[arg(long)]
        module: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Clear stored progress for a module
    Reset {
        /// Module identifier
        #[arg(long)]
        module: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Study a module interactively, reading commands from stdin
    Study {
        /// Module identifier
        #[arg(long)]
        module: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lessonflow=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { path } => commands::validate::execute(path),
        Commands::Modules { course, config } => commands::modules::execute(course, config),
        Commands::Progress {
            module,
            json,
            config,
        } => commands::progress::execute(module, json, config),
        Commands::Reset { module, config } => commands::reset::execute(module, config),
        Commands::Study { module, config } => commands::study::execute(module, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
