// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # lytech
//!
//! Command line front end for layout technology registries.
//!
//! ## Commands
//!
//! - `lytech tech list|show|export|validate|import` - Technology operations
//! - `lytech config show|validate|generate` - Configuration management
//!
//! Technologies are loaded from the `spec.technology_paths` directories of the
//! registry configuration (see `lytech config show --paths`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use lytech_core::domain::registry_config::RegistryConfigManifest;

mod commands;

use commands::{ConfigCommand, TechCommand};

/// Layout technology registry tool
#[derive(Parser)]
#[command(name = "lytech")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LYTECH_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Technology operations
    #[command(name = "tech")]
    Tech {
        #[command(subcommand)]
        command: TechCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration is resolved before logging so its log level can apply
    let config = RegistryConfigManifest::load_or_default(cli.config.clone());

    let (level, json) = match &config {
        Ok(config) => (
            cli.log_level
                .clone()
                .or_else(|| config.log_level().map(str::to_string)),
            config
                .spec
                .observability
                .as_ref()
                .and_then(|o| o.logging.as_ref())
                .is_some_and(|l| l.format == "json"),
        ),
        Err(_) => (cli.log_level.clone(), false),
    };
    init_logging(level.as_deref().unwrap_or("warn"), json)?;

    match cli.command {
        Some(Commands::Tech { command }) => {
            let config = config.context("Failed to load configuration")?;
            commands::tech::handle_command(command, &config)
        }
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config),
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging. Logs go to stderr so command
/// output on stdout stays machine readable.
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
