mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            folder,
            config,
            chunk_size,
            keep_exports,
        } => commands::run::run(&folder, &config, chunk_size, keep_exports),
        Commands::Report {
            folder,
            config,
            force,
        } => commands::report::run(&folder, &config, force),
        Commands::Status { folder } => commands::status::run(&folder),
        Commands::History { folder, stats } => commands::history::run(&folder, stats),
        Commands::Version => commands::version::run(),
    }
}
