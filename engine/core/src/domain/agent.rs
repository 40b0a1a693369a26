// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agents and Learning State
//!
//! Three fixed agents consume model outputs:
//!
//! | Agent | Owns |
//! |-------|------|
//! | `HURAII` | generation and image transform models |
//! | `CLOE` | curation, recommendation and trend models |
//! | `BusinessStrategist` | market, valuation and business models |
//!
//! [`attribute_agent`] decides which agent owns a call, and
//! [`AgentLearningState::apply`] is the state machine driven by dispatcher
//! notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::model::{ModelId, ModelType};

/// Default diminishing-returns increment applied per successful execution
pub const DEFAULT_PROGRESS_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentId {
    #[serde(rename = "HURAII")]
    Huraii,
    #[serde(rename = "CLOE")]
    Cloe,
    #[serde(rename = "BusinessStrategist")]
    BusinessStrategist,
}

impl AgentId {
    pub const ALL: [AgentId; 3] = [AgentId::Huraii, AgentId::Cloe, AgentId::BusinessStrategist];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Huraii => "HURAII",
            AgentId::Cloe => "CLOE",
            AgentId::BusinessStrategist => "BusinessStrategist",
        }
    }

    /// Model id namespace owned by this agent
    fn prefixes(&self) -> &'static [&'static str] {
        match self {
            AgentId::Huraii => &["huraii_"],
            AgentId::Cloe => &["cloe_"],
            AgentId::BusinessStrategist => &["strategist_", "bs_"],
        }
    }

    fn default_specializations(&self) -> BTreeMap<String, f64> {
        let skills: &[(&str, f64)] = match self {
            AgentId::Huraii => &[
                ("image_generation", 0.5),
                ("style_transfer", 0.4),
                ("seed_art_analysis", 0.3),
            ],
            AgentId::Cloe => &[
                ("curation", 0.5),
                ("trend_analysis", 0.4),
                ("recommendation", 0.4),
            ],
            AgentId::BusinessStrategist => &[
                ("market_analysis", 0.5),
                ("valuation", 0.4),
                ("business_planning", 0.3),
            ],
        };
        skills.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "huraii" => Ok(AgentId::Huraii),
            "cloe" => Ok(AgentId::Cloe),
            "businessstrategist" | "business_strategist" | "strategist" => {
                Ok(AgentId::BusinessStrategist)
            }
            other => Err(format!("unknown agent '{}'", other)),
        }
    }
}

/// Resolve the agent that owns an inference call.
///
/// A namespace prefix on the model id wins outright; otherwise the model type
/// decides. Returns `None` when neither matches.
pub fn attribute_agent(model_id: &ModelId, model_type: ModelType) -> Option<AgentId> {
    let id = model_id.as_str().to_ascii_lowercase();
    if let Some(agent) = AgentId::ALL
        .iter()
        .find(|agent| agent.prefixes().iter().any(|p| id.starts_with(p)))
    {
        return Some(*agent);
    }

    match model_type {
        ModelType::Text2Img
        | ModelType::Img2Img
        | ModelType::Inpainting
        | ModelType::StyleTransfer
        | ModelType::Upscale
        | ModelType::Analyzer => Some(AgentId::Huraii),
        ModelType::Curation | ModelType::Recommendation | ModelType::TrendAnalysis => {
            Some(AgentId::Cloe)
        }
        ModelType::MarketAnalysis | ModelType::Valuation | ModelType::BusinessStrategy => {
            Some(AgentId::BusinessStrategist)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningMode {
    #[default]
    Active,
    Passive,
    Disabled,
}

impl FromStr for LearningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(LearningMode::Active),
            "passive" => Ok(LearningMode::Passive),
            "disabled" => Ok(LearningMode::Disabled),
            other => Err(format!("unknown learning mode '{}'", other)),
        }
    }
}

/// Dispatcher notification that drives the learning state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum LearningTransition {
    PreExecution {
        model_id: ModelId,
        input_size: u64,
    },
    ExecutionComplete {
        model_id: ModelId,
        duration_seconds: f64,
        output_size: u64,
    },
    ExecutionFailed {
        model_id: ModelId,
        error_kind: String,
    },
}

impl LearningTransition {
    pub fn name(&self) -> &'static str {
        match self {
            LearningTransition::PreExecution { .. } => "pre_execution",
            LearningTransition::ExecutionComplete { .. } => "execution_complete",
            LearningTransition::ExecutionFailed { .. } => "execution_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLearningState {
    pub agent_id: AgentId,
    pub active: bool,
    pub learning_mode: LearningMode,
    pub last_update: DateTime<Utc>,
    pub model_execution_count: u64,
    /// In [0, 1]
    pub learning_progress: f64,
    pub specializations: BTreeMap<String, f64>,
}

impl AgentLearningState {
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            active: true,
            learning_mode: LearningMode::Active,
            last_update: Utc::now(),
            model_execution_count: 0,
            learning_progress: 0.0,
            specializations: agent_id.default_specializations(),
        }
    }

    /// Merge a persisted record over the defaults. Specializations present in
    /// both keep the persisted proficiency; new default skills are retained.
    pub fn merge_persisted(&mut self, persisted: AgentLearningState) {
        self.active = persisted.active;
        self.learning_mode = persisted.learning_mode;
        self.last_update = persisted.last_update;
        self.model_execution_count = persisted.model_execution_count;
        self.learning_progress = persisted.learning_progress.clamp(0.0, 1.0);
        for (skill, proficiency) in persisted.specializations {
            self.specializations.insert(skill, proficiency.clamp(0.0, 1.0));
        }
    }

    /// Apply one transition. Progress only moves on a completed execution in
    /// active mode; failures never change it.
    pub fn apply(&mut self, transition: &LearningTransition, rate: f64, now: DateTime<Utc>) {
        self.last_update = now;

        if let LearningTransition::ExecutionComplete { .. } = transition {
            self.model_execution_count += 1;
            if self.learning_mode == LearningMode::Active {
                let next = self.learning_progress + rate * (1.0 - self.learning_progress);
                self.learning_progress = next.min(1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> LearningTransition {
        LearningTransition::ExecutionComplete {
            model_id: ModelId::from("huraii_sd"),
            duration_seconds: 0.5,
            output_size: 128,
        }
    }

    #[test]
    fn test_prefix_wins_over_type() {
        assert_eq!(
            attribute_agent(&ModelId::from("cloe_sd"), ModelType::Text2Img),
            Some(AgentId::Cloe)
        );
        assert_eq!(
            attribute_agent(&ModelId::from("bs_forecast"), ModelType::Text2Img),
            Some(AgentId::BusinessStrategist)
        );
    }

    #[test]
    fn test_type_table() {
        let id = ModelId::from("model");
        assert_eq!(attribute_agent(&id, ModelType::Img2Img), Some(AgentId::Huraii));
        assert_eq!(attribute_agent(&id, ModelType::TrendAnalysis), Some(AgentId::Cloe));
        assert_eq!(
            attribute_agent(&id, ModelType::Valuation),
            Some(AgentId::BusinessStrategist)
        );
    }

    #[test]
    fn test_attribution_is_deterministic() {
        let id = ModelId::from("sd");
        let first = attribute_agent(&id, ModelType::Curation);
        for _ in 0..100 {
            assert_eq!(attribute_agent(&id, ModelType::Curation), first);
        }
    }

    #[test]
    fn test_progress_increases_and_stays_bounded() {
        let mut state = AgentLearningState::new(AgentId::Huraii);
        let mut previous = state.learning_progress;

        for _ in 0..1000 {
            state.apply(&complete(), 0.25, Utc::now());
            assert!(state.learning_progress >= previous);
            assert!(state.learning_progress <= 1.0);
            previous = state.learning_progress;
        }
        assert_eq!(state.model_execution_count, 1000);
    }

    #[test]
    fn test_passive_and_disabled_keep_progress() {
        for mode in [LearningMode::Passive, LearningMode::Disabled] {
            let mut state = AgentLearningState::new(AgentId::Cloe);
            state.learning_mode = mode;
            state.learning_progress = 0.3;

            state.apply(&complete(), DEFAULT_PROGRESS_RATE, Utc::now());

            assert_eq!(state.learning_progress, 0.3);
            assert_eq!(state.model_execution_count, 1);
        }
    }

    #[test]
    fn test_failure_only_touches_last_update() {
        let mut state = AgentLearningState::new(AgentId::Huraii);
        state.learning_progress = 0.2;
        let before = state.clone();
        let later = before.last_update + chrono::Duration::seconds(5);

        state.apply(
            &LearningTransition::ExecutionFailed {
                model_id: ModelId::from("huraii_sd"),
                error_kind: "api_error".into(),
            },
            DEFAULT_PROGRESS_RATE,
            later,
        );

        assert_eq!(state.learning_progress, before.learning_progress);
        assert_eq!(state.model_execution_count, before.model_execution_count);
        assert_eq!(state.last_update, later);
    }

    #[test]
    fn test_agent_id_parsing() {
        assert_eq!("HURAII".parse::<AgentId>().unwrap(), AgentId::Huraii);
        assert_eq!("business_strategist".parse::<AgentId>().unwrap(), AgentId::BusinessStrategist);
        assert!("nobody".parse::<AgentId>().is_err());
    }
}
