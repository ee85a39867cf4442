use anyhow::{Context, Result};
use clap::Parser;
use evtrust::{
    cli::commands::{
        asset::{AssetCommand, AssetStep},
        build::BuildCommand,
        index::IndexCommand,
        inspect::InspectCommand,
        keychain::KeychainCommand,
        validate::ValidateCommand,
        CommandHandler,
    },
    cli::{Cli, Commands, LogLevel},
    config::PipelineSettings,
    engine::Pipeline,
};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn initialize_tracing(log_level: LogLevel, json: bool) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr) // stdout carries command output
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let working_dir =
        std::env::current_dir().context("Failed to determine the working directory")?;
    let settings =
        PipelineSettings::resolve(cli.settings.as_deref(), &working_dir, &cli.overrides())?;
    if cli.command.runs_tools() {
        debug!(
            "External tool timeout for '{}': {}s",
            cli.command.name(),
            settings.tools.timeout_seconds
        );
    }
    let pipeline = Pipeline::with_system_tools(settings);

    let handler: Box<dyn CommandHandler> = match cli.command {
        Commands::Build => Box::new(BuildCommand),
        Commands::Keychain => Box::new(KeychainCommand),
        Commands::Index => Box::new(IndexCommand),
        Commands::Stage { .. } => Box::new(AssetCommand::new(AssetStep::Stage)),
        Commands::Sign { .. } => Box::new(AssetCommand::new(AssetStep::Sign)),
        Commands::Asset { .. } => Box::new(AssetCommand::new(AssetStep::Publish)),
        Commands::Validate { format } => Box::new(ValidateCommand::new(format)),
        Commands::Inspect { path, format } => Box::new(InspectCommand::new(path, format)),
    };

    debug!("Running command '{}'", handler.name());
    handler
        .execute(&pipeline)
        .await
        .with_context(|| format!("{} failed", handler.name()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
