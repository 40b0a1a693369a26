// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provider endpoint commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::{Map, Value};

use crate::client::EngineClient;

#[derive(Subcommand)]
pub enum EndpointsCommand {
    /// List provider endpoints (credentials are never shown)
    List,

    /// Update an endpoint's credentials or connection settings
    Set {
        #[arg(value_name = "NAME")]
        name: String,

        /// API key; an empty string deactivates the endpoint
        #[arg(long, env = "VORTEX_ENDPOINT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        timeout_seconds: Option<u64>,
    },
}

pub async fn handle_command(command: EndpointsCommand, client: EngineClient) -> Result<()> {
    match command {
        EndpointsCommand::List => {
            let endpoints = client.list_endpoints().await?;
            if endpoints.is_empty() {
                println!("{}", "No provider endpoints configured".yellow());
                return Ok(());
            }

            println!("{:<16} {:<12} {:<40} {}", "NAME", "PROVIDER", "BASE URL", "STATUS");
            for endpoint in endpoints {
                let status = if endpoint.active { "active".green() } else { "inactive".red() };
                println!(
                    "{:<16} {:<12} {:<40} {}",
                    endpoint.name.bold(),
                    endpoint.provider.to_string(),
                    endpoint.base_url,
                    status
                );
            }
            Ok(())
        }
        EndpointsCommand::Set {
            name,
            api_key,
            base_url,
            timeout_seconds,
        } => {
            let mut update = Map::new();
            if let Some(key) = api_key {
                update.insert("api_key".into(), Value::String(key));
            }
            if let Some(url) = base_url {
                update.insert("base_url".into(), Value::String(url));
            }
            if let Some(timeout) = timeout_seconds {
                update.insert("timeout_seconds".into(), Value::from(timeout));
            }
            if update.is_empty() {
                anyhow::bail!("Nothing to update; pass --api-key, --base-url or --timeout-seconds");
            }

            let endpoint = client.update_endpoint(&name, Value::Object(update)).await?;
            let status = if endpoint.active { "active".green() } else { "inactive".yellow() };
            println!("{}", format!("✓ Endpoint '{}' updated", endpoint.name).green());
            println!("  Status: {}", status);
            Ok(())
        }
    }
}
