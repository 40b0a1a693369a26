// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `vortex infer` - run one inference against a running server

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Args;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::client::EngineClient;

#[derive(Args)]
pub struct InferArgs {
    #[arg(value_name = "MODEL_ID")]
    pub model: String,

    /// Text prompt
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Seed; negative or omitted means random
    #[arg(long)]
    pub seed: Option<i64>,

    /// Extra input as KEY=VALUE; VALUE is parsed as JSON when possible
    #[arg(short = 'i', long = "input", value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,

    /// JSON file with the full input object; flags override its keys
    #[arg(long, value_name = "FILE")]
    pub inputs_file: Option<PathBuf>,

    /// Write the decoded artifact to this path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the raw JSON result
    #[arg(long)]
    pub json: bool,
}

/// Assemble the canonical input object from flags
pub fn build_inputs(args: &InferArgs) -> Result<Value> {
    let mut inputs = match &args.inputs_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read inputs file {:?}", path))?;
            match serde_json::from_str::<Value>(&content)
                .with_context(|| format!("Invalid JSON in {:?}", path))?
            {
                Value::Object(map) => map,
                _ => anyhow::bail!("Inputs file {:?} must contain a JSON object", path),
            }
        }
        None => Map::new(),
    };

    for pair in &args.inputs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", pair))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        inputs.insert(key.trim().to_string(), value);
    }

    if let Some(prompt) = &args.prompt {
        inputs.insert("prompt".into(), Value::String(prompt.clone()));
    }
    if let Some(seed) = args.seed {
        inputs.insert("seed".into(), Value::from(seed));
    }

    Ok(Value::Object(inputs))
}

pub async fn handle_command(args: InferArgs, client: EngineClient) -> Result<()> {
    let inputs = build_inputs(&args)?;
    let result = client.infer(&args.model, inputs).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", format!("✓ Inference complete ({:.2}s)", result.duration_seconds).green());
        println!("  Image ID:  {}", result.image_id);
        println!("  Image URL: {}", result.image_url);
        if result.seed >= 0 {
            println!("  Seed:      {}", result.seed);
        }
        if let Some(analysis) = &result.analysis {
            println!("{}", "Analysis:".bold());
            println!("{}", serde_json::to_string_pretty(analysis)?);
        }
    }

    if let Some(path) = &args.output {
        let bytes = STANDARD
            .decode(&result.image_data)
            .context("Server returned artifact data that is not valid base64")?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write artifact to {:?}", path))?;
        println!("{}", format!("✓ Artifact written to {}", path.display()).green());
    }

    Ok(())
}
