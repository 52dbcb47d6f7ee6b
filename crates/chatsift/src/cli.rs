use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatsift")]
#[command(version)]
#[command(about = "Incremental insight extraction and reporting for chat exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Config overrides shared by commands that talk to the model
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model to summarize with
    #[arg(short, long)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process the newest export in a chat folder and refresh its report
    Run {
        /// Chat folder holding exports and state
        folder: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Records per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Leave processed export files in place
        #[arg(long)]
        keep_exports: bool,
    },

    /// Regenerate the report from stored insights
    Report {
        folder: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Regenerate even if a valid report exists
        #[arg(long)]
        force: bool,
    },

    /// Show stored progress for a chat folder
    Status { folder: PathBuf },

    /// View run history
    History {
        folder: PathBuf,

        /// Show statistics summary
        #[arg(long)]
        stats: bool,
    },

    /// Print version information
    Version,
}
