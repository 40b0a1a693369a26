// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Model registry commands
//!
//! Commands: list, show, register, deregister, stats, preload, unload

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use vortex_core::domain::model::{DescriptorDraft, MemoryRequirement, ModelType};

use crate::client::EngineClient;

#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List registered models
    List,

    /// Show a model descriptor (YAML)
    Show {
        #[arg(value_name = "MODEL_ID")]
        id: String,
    },

    /// Register or replace a model
    Register {
        #[arg(value_name = "MODEL_ID")]
        id: String,

        /// Descriptor YAML file; flags below override its fields
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        #[arg(long)]
        name: Option<String>,

        /// Model type (text2img, img2img, inpainting, analyzer, ...)
        #[arg(long = "type", value_parser = parse_serde::<ModelType>)]
        model_type: Option<ModelType>,

        /// Local resource path
        #[arg(long, conflicts_with = "endpoint")]
        path: Option<String>,

        /// Provider endpoint name for remote models
        #[arg(long)]
        endpoint: Option<String>,

        /// Provider-side model or engine identifier
        #[arg(long)]
        remote_model: Option<String>,

        /// Descriptor version (default 1.0.0)
        #[arg(long = "model-version")]
        version: Option<String>,

        /// low, medium or high
        #[arg(long, value_parser = parse_serde::<MemoryRequirement>)]
        memory: Option<MemoryRequirement>,

        /// Register the model as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Remove a model from the registry
    Deregister {
        #[arg(value_name = "MODEL_ID")]
        id: String,
    },

    /// Show execution statistics for a model
    Stats {
        #[arg(value_name = "MODEL_ID")]
        id: String,

        /// Number of recent executions to show
        #[arg(short = 'n', long, default_value = "10")]
        recent: usize,
    },

    /// Load a local model into memory
    Preload {
        #[arg(value_name = "MODEL_ID")]
        id: String,
    },

    /// Release a loaded model
    Unload {
        #[arg(value_name = "MODEL_ID")]
        id: String,
    },
}

/// clap value parser for snake/lowercase serde enums
pub fn parse_serde<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("invalid value '{}'", value))
}

pub async fn handle_command(command: ModelsCommand, client: EngineClient) -> Result<()> {
    match command {
        ModelsCommand::List => list(&client).await,
        ModelsCommand::Show { id } => show(&client, &id).await,
        ModelsCommand::Register {
            id,
            file,
            name,
            model_type,
            path,
            endpoint,
            remote_model,
            version,
            memory,
            inactive,
        } => {
            let mut draft = match file {
                Some(file) => load_draft(&file)?,
                None => DescriptorDraft::default(),
            };
            draft.name = name.or(draft.name);
            draft.model_type = model_type.or(draft.model_type);
            draft.path = path.or(draft.path);
            draft.api_endpoint = endpoint.or(draft.api_endpoint);
            draft.remote_model = remote_model.or(draft.remote_model);
            draft.version = version.or(draft.version);
            draft.memory_requirement = memory.or(draft.memory_requirement);
            if inactive {
                draft.active = Some(false);
            }
            register(&client, &id, draft).await
        }
        ModelsCommand::Deregister { id } => {
            client.deregister_model(&id).await?;
            println!("{}", format!("✓ Model '{}' deregistered", id).green());
            Ok(())
        }
        ModelsCommand::Stats { id, recent } => stats(&client, &id, recent).await,
        ModelsCommand::Preload { id } => {
            if client.preload(&id).await? {
                println!("{}", format!("✓ Model '{}' loaded", id).green());
            } else {
                println!(
                    "{}",
                    format!("Model '{}' is remote or inactive; nothing to load", id).yellow()
                );
            }
            Ok(())
        }
        ModelsCommand::Unload { id } => {
            client.unload(&id).await?;
            println!("{}", format!("✓ Model '{}' unloaded", id).green());
            Ok(())
        }
    }
}

fn load_draft(path: &PathBuf) -> Result<DescriptorDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor file {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Invalid descriptor file {:?}", path))
}

async fn list(client: &EngineClient) -> Result<()> {
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("{}", "No models registered".yellow());
        return Ok(());
    }

    println!("{} models registered:", models.len());
    println!(
        "{:<26} {:<16} {:<14} {:<10} {}",
        "ID", "TYPE", "SOURCE", "RUNS", "STATUS"
    );

    for model in models {
        let d = &model.descriptor;
        let source = if d.is_remote() { d.api_endpoint.as_str() } else { "local" };
        let status = if model.loaded {
            "loaded".green()
        } else if model.available {
            "available".normal()
        } else {
            "unavailable".red()
        };
        println!(
            "{:<26} {:<16} {:<14} {:<10} {}",
            d.id.as_str().bold(),
            d.model_type.as_str(),
            source,
            d.statistics.execution_count,
            status
        );
    }

    Ok(())
}

async fn show(client: &EngineClient, id: &str) -> Result<()> {
    let model = client
        .list_models()
        .await?
        .into_iter()
        .find(|m| m.descriptor.id.as_str() == id)
        .with_context(|| format!("Model '{}' is not registered", id))?;

    println!("{}", serde_yaml::to_string(&model.descriptor)?);
    Ok(())
}

async fn register(client: &EngineClient, id: &str, draft: DescriptorDraft) -> Result<()> {
    let model = client.register_model(id, &draft).await?;

    println!("{}", format!("✓ Model '{}' registered", id).green());
    println!("  Type: {}", model.descriptor.model_type);
    if model.descriptor.is_remote() {
        println!("  Endpoint: {}", model.descriptor.api_endpoint);
    } else {
        println!("  Path: {}", model.descriptor.path);
    }
    if !model.available {
        println!(
            "{}",
            "  ⚠ Model is registered but not currently available".yellow()
        );
    }
    Ok(())
}

async fn stats(client: &EngineClient, id: &str, recent: usize) -> Result<()> {
    let stats = client.model_stats(id).await?;
    let s = &stats.statistics;

    println!("{}", format!("Statistics for {}:", id).bold());
    println!("  Executions:   {}", s.execution_count);
    println!("  Errors:       {}", s.error_count);
    println!("  Success rate: {:.1}%", s.success_rate);
    println!("  Avg duration: {:.3}s", s.avg_duration);
    match s.last_execution {
        Some(at) => println!("  Last run:     {}", at.to_rfc3339()),
        None => println!("  Last run:     {}", "(never)".dimmed()),
    }

    if !stats.recent.is_empty() && recent > 0 {
        println!();
        println!("{}", "Recent executions:".bold());
        for record in stats.recent.iter().take(recent) {
            let outcome = if record.success { "ok".green() } else { "failed".red() };
            println!(
                "  {}  {:>8.3}s  {:>10} bytes  {}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.duration_seconds,
                record.result_size_bytes,
                outcome
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serde_enums() {
        assert_eq!(parse_serde::<ModelType>("text2img").unwrap(), ModelType::Text2Img);
        assert_eq!(parse_serde::<ModelType>("style_transfer").unwrap(), ModelType::StyleTransfer);
        assert_eq!(parse_serde::<MemoryRequirement>("high").unwrap(), MemoryRequirement::High);
        assert!(parse_serde::<ModelType>("nope").is_err());
    }
}
