// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use vortex_core::domain::agent::{AgentId, AgentLearningState, LearningMode};

use crate::client::EngineClient;

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// Show learning state for one agent, or all agents
    Show {
        /// HURAII, CLOE or BusinessStrategist
        #[arg(value_name = "AGENT")]
        agent: Option<AgentId>,
    },

    /// Change an agent's learning mode
    Mode {
        #[arg(value_name = "AGENT")]
        agent: AgentId,

        /// active, passive or disabled
        #[arg(value_name = "MODE")]
        mode: LearningMode,
    },
}

pub async fn handle_command(command: AgentsCommand, client: EngineClient) -> Result<()> {
    match command {
        AgentsCommand::Show { agent: Some(agent) } => {
            print_state(&client.agent(agent).await?);
        }
        AgentsCommand::Show { agent: None } => {
            for agent in AgentId::ALL {
                print_state(&client.agent(agent).await?);
                println!();
            }
        }
        AgentsCommand::Mode { agent, mode } => {
            let state = client.set_learning_mode(agent, mode).await?;
            println!(
                "{}",
                format!("✓ {} learning mode set to {:?}", state.agent_id, state.learning_mode).green()
            );
        }
    }
    Ok(())
}

fn print_state(state: &AgentLearningState) {
    let mode = match state.learning_mode {
        LearningMode::Active => "active".green(),
        LearningMode::Passive => "passive".yellow(),
        LearningMode::Disabled => "disabled".red(),
    };

    println!("{}", state.agent_id.to_string().bold());
    println!("  Mode:       {}", mode);
    println!("  Executions: {}", state.model_execution_count);
    println!("  Progress:   {:.2}%", state.learning_progress * 100.0);
    println!("  Updated:    {}", state.last_update.to_rfc3339());
    if !state.specializations.is_empty() {
        println!("  Specializations:");
        for (skill, proficiency) in &state.specializations {
            println!("    {:<24} {:.2}", skill, proficiency);
        }
    }
}
