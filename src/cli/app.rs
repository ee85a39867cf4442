use crate::config::SettingsOverrides;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// evtrust: EV roots keychain, trust database and trust asset builder
#[derive(Parser, Debug)]
#[command(name = "evtrust")]
#[command(version)]
#[command(about = "Builds the EV roots keychain and the EV OID fingerprint trust database")]
#[command(
    long_about = "evtrust turns the EV policy configuration and the roots directory into a legacy keychain and a verified OID to SHA-1 fingerprint trust database, and stages and signs the trust asset bundle."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: ./evtrust.yaml when present)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// EV policy configuration file
    #[arg(long, global = true)]
    pub ev_config: Option<PathBuf>,

    /// Directory of DER root certificates
    #[arg(long, global = true)]
    pub roots_dir: Option<PathBuf>,

    /// Directory receiving the keychain and trust database
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Set log level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the keychain and the trust database
    Build,

    /// Build only the keychain (Phase 1)
    Keychain,

    /// Build only the trust database (Phase 2)
    Index,

    /// Assemble the asset tree and stage it
    Stage {
        /// Directory holding the pre-built asset inputs
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Staging directory handed to the asset tool
        #[arg(long)]
        staging_dir: Option<PathBuf>,
    },

    /// Sign a staged asset
    Sign {
        /// Staging directory produced by `stage`
        #[arg(long)]
        staging_dir: Option<PathBuf>,
    },

    /// Stage then sign the asset
    Asset {
        /// Directory holding the pre-built asset inputs
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Staging directory handed to the asset tool
        #[arg(long)]
        staging_dir: Option<PathBuf>,
    },

    /// Check the EV config and the roots directory without writing anything
    Validate {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the contents of a trust database
    Inspect {
        /// Trust database file (default: the configured output)
        path: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Log levels
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Settings overrides carried by the global flags and the subcommand
    pub fn overrides(&self) -> SettingsOverrides {
        let mut overrides = SettingsOverrides {
            ev_config: self.ev_config.clone(),
            roots_dir: self.roots_dir.clone(),
            output_dir: self.output_dir.clone(),
            ..Default::default()
        };

        match &self.command {
            Commands::Stage {
                input_dir,
                staging_dir,
            }
            | Commands::Asset {
                input_dir,
                staging_dir,
            } => {
                overrides.asset_input_dir = input_dir.clone();
                overrides.staging_dir = staging_dir.clone();
            }
            Commands::Sign { staging_dir } => {
                overrides.staging_dir = staging_dir.clone();
            }
            _ => {}
        }
        overrides
    }
}

impl Commands {
    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Build => "build",
            Commands::Keychain => "keychain",
            Commands::Index => "index",
            Commands::Stage { .. } => "stage",
            Commands::Sign { .. } => "sign",
            Commands::Asset { .. } => "asset",
            Commands::Validate { .. } => "validate",
            Commands::Inspect { .. } => "inspect",
        }
    }

    /// Check if this command runs external tools
    pub fn runs_tools(&self) -> bool {
        !matches!(self, Commands::Validate { .. } | Commands::Inspect { .. })
    }
}
