// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # VORTEX Engine CLI
//!
//! The `vortex` binary hosts the inference engine and drives it over HTTP.
//!
//! ## Commands
//!
//! - `vortex serve [--ephemeral]` - Run the engine HTTP server
//! - `vortex models list|show|register|deregister|stats|preload|unload` - Model registry
//! - `vortex infer <MODEL_ID>` - Run one inference
//! - `vortex agents show|mode` - Agent learning state
//! - `vortex endpoints list|set` - Provider endpoints
//! - `vortex checkpoint` - Persist engine state now
//! - `vortex config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use vortex_core::domain::engine_config::EngineConfigManifest;
use vortex_engine::client::EngineClient;
use vortex_engine::commands::{
    self, AgentsCommand, ConfigCommand, EndpointsCommand, InferArgs, ModelsCommand,
};
use vortex_engine::server::{self, ServeOptions};

/// VORTEX Engine - generative model registry and inference dispatcher
#[derive(Parser)]
#[command(name = "vortex")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "VORTEX_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Server host for client commands, bind address for `serve`
    #[arg(long, global = true, env = "VORTEX_HOST")]
    host: Option<String>,

    /// Server port for client commands, listen port for `serve`
    #[arg(long, global = true, env = "VORTEX_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VORTEX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine HTTP server
    #[command(name = "serve")]
    Serve {
        /// Keep registry and learning state in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Model registry operations
    #[command(name = "models")]
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Run one inference
    #[command(name = "infer")]
    Infer(InferArgs),

    /// Agent learning state
    #[command(name = "agents")]
    Agents {
        #[command(subcommand)]
        command: AgentsCommand,
    },

    /// Provider endpoints
    #[command(name = "endpoints")]
    Endpoints {
        #[command(subcommand)]
        command: EndpointsCommand,
    },

    /// Persist engine state immediately
    #[command(name = "checkpoint")]
    Checkpoint,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    };

    match command {
        Commands::Serve { ephemeral } => {
            let config = EngineConfigManifest::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            server::run(
                config,
                ServeOptions {
                    host: cli.host,
                    port: cli.port,
                    ephemeral,
                },
            )
            .await
        }
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Models { command } => {
            let client = client_for(cli.config, cli.host, cli.port)?;
            commands::models::handle_command(command, client).await
        }
        Commands::Infer(args) => {
            let client = client_for(cli.config, cli.host, cli.port)?;
            commands::infer::handle_command(args, client).await
        }
        Commands::Agents { command } => {
            let client = client_for(cli.config, cli.host, cli.port)?;
            commands::agents::handle_command(command, client).await
        }
        Commands::Endpoints { command } => {
            let client = client_for(cli.config, cli.host, cli.port)?;
            commands::endpoints::handle_command(command, client).await
        }
        Commands::Checkpoint => {
            let client = client_for(cli.config, cli.host, cli.port)?;
            client.checkpoint().await?;
            println!("{}", "✓ Checkpoint written".green());
            Ok(())
        }
    }
}

/// Client for the configured server, with CLI flags taking precedence
fn client_for(config: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<EngineClient> {
    let (host, port) = match (host, port) {
        (Some(host), Some(port)) => (host, port),
        (host, port) => {
            let config = EngineConfigManifest::load_or_default(config)
                .context("Failed to load configuration")?;
            (
                host.unwrap_or(config.spec.api.bind_address),
                port.unwrap_or(config.spec.api.port),
            )
        }
    };
    EngineClient::for_address(&host, port)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
