// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use vortex_core::domain::engine_config::EngineConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Write the default configuration as YAML
    Generate {
        /// Output path (default: ./vortex-config.yaml)
        #[arg(short, long, default_value = "./vortex-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = EngineConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;
    let spec = &config.spec;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. VORTEX_CONFIG_PATH: {}",
            std::env::var("VORTEX_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./vortex-config.yaml");
        println!("  4. ~/.vortex/config.yaml");
        println!("  5. /etc/vortex/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Provider Endpoints:".bold());
    for endpoint in spec.resolved_endpoints() {
        let status = if endpoint.is_active() { "active".green() } else { "inactive".red() };
        println!("  {} ({}) {}", endpoint.name.bold(), endpoint.provider, status);
        println!("    Base URL: {}", endpoint.base_url);
        println!("    Timeout: {}s", endpoint.timeout_seconds);
    }
    println!();

    println!("{}", "Models:".bold());
    println!("  Default catalog: {}", spec.include_default_catalog);
    println!("  Models dir: {}", spec.models_dir);
    for model in spec.initial_models()? {
        let source = if model.is_remote() {
            format!("→ {}", model.api_endpoint)
        } else {
            model.path.clone()
        };
        println!("  - {} [{}] {}", model.id, model.model_type, source.dimmed());
    }
    println!();

    println!("{}", "Storage:".bold());
    println!(
        "  State: {}",
        spec.storage.state_path.as_deref().unwrap_or("(in-memory)")
    );
    println!("  Artifacts: {}", spec.storage.artifact_dir);
    if let Some(base) = &spec.storage.artifact_base_url {
        println!("  Artifact URL prefix: {}", base);
    }
    println!("  Checkpoint interval: {}s", spec.checkpoint_interval_seconds);
    println!();

    println!("{}", "Learning:".bold());
    println!("  Progress rate: {}", spec.learning.progress_rate);
    println!("  Default mode: {:?}", spec.learning.default_mode);
    println!("  History capacity: {}", spec.stats.history_capacity);
    println!();

    println!("{}", "API:".bold());
    println!("  Listen: {}:{}", spec.api.bind_address, spec.api.port);
    if let Some(port) = spec.observability.as_ref().and_then(|o| o.metrics_port) {
        println!("  Metrics: 0.0.0.0:{}", port);
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = EngineConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    let sample = serde_yaml::to_string(&EngineConfigManifest::default())
        .context("Failed to render default configuration")?;

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generated_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("vortex-config.yaml");

        generate(output.clone()).await.unwrap();

        let loaded = EngineConfigManifest::from_yaml_file(&output).unwrap();
        loaded.validate().unwrap();
        assert!(loaded.spec.include_default_catalog);
    }

    #[tokio::test]
    async fn test_validate_rejects_unknown_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            r#"
apiVersion: vortex.ai/v1
kind: EngineConfig
metadata:
  name: bad
spec:
  include_default_catalog: false
  providers: []
  models:
    - id: cloe_curator
      name: Curator
      type: curation
      api_endpoint: nowhere
"#,
        )
        .unwrap();

        assert!(validate(Some(path)).await.is_err());
    }
}
