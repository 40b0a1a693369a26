// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Learning State Manager
//
// One mutex per agent so notifications for different agents never contend.
// The set of agents is fixed at construction.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::agent::{AgentId, AgentLearningState, LearningMode, LearningTransition};
use crate::domain::events::{EngineEvent, EventEmitter, LearningEvent};

pub struct LearningStateManager {
    states: HashMap<AgentId, Mutex<AgentLearningState>>,
    progress_rate: f64,
    events: Arc<dyn EventEmitter>,
}

impl LearningStateManager {
    pub fn new(progress_rate: f64, default_mode: LearningMode, events: Arc<dyn EventEmitter>) -> Self {
        let states = AgentId::ALL
            .iter()
            .map(|agent| {
                let mut state = AgentLearningState::new(*agent);
                state.learning_mode = default_mode;
                (*agent, Mutex::new(state))
            })
            .collect();

        Self {
            states,
            progress_rate: progress_rate.clamp(0.0, 1.0),
            events,
        }
    }

    /// Merge persisted agent records over the defaults
    pub fn restore(&self, persisted: Vec<AgentLearningState>) {
        for record in persisted {
            match self.states.get(&record.agent_id) {
                Some(state) => state.lock().merge_persisted(record),
                None => warn!("Ignoring persisted state for unknown agent {}", record.agent_id),
            }
        }
    }

    /// Apply a dispatcher notification and publish the new state
    pub fn notify(&self, agent: AgentId, transition: LearningTransition) -> AgentLearningState {
        let now = Utc::now();
        let updated = {
            let mut state = self.state(agent).lock();
            state.apply(&transition, self.progress_rate, now);
            state.clone()
        };

        debug!(
            "Agent {} {} (executions: {}, progress: {:.4})",
            agent,
            transition.name(),
            updated.model_execution_count,
            updated.learning_progress
        );

        self.events.emit(EngineEvent::Learning(LearningEvent::AgentLearningStateUpdated {
            agent_id: agent,
            transition: transition.name().to_string(),
            state: updated.clone(),
            updated_at: now,
        }));

        updated
    }

    pub fn get_agent_state(&self, agent: AgentId) -> AgentLearningState {
        self.state(agent).lock().clone()
    }

    pub fn set_learning_mode(&self, agent: AgentId, mode: LearningMode) -> AgentLearningState {
        let mut state = self.state(agent).lock();
        if state.learning_mode != mode {
            info!("Agent {} learning mode: {:?} -> {:?}", agent, state.learning_mode, mode);
            state.learning_mode = mode;
            state.last_update = Utc::now();
        }
        state.clone()
    }

    /// All agents in a stable order
    pub fn snapshot(&self) -> Vec<AgentLearningState> {
        AgentId::ALL.iter().map(|agent| self.get_agent_state(*agent)).collect()
    }

    fn state(&self, agent: AgentId) -> &Mutex<AgentLearningState> {
        // Every AgentId variant is inserted in `new`
        &self.states[&agent]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ModelId;
    use crate::infrastructure::event_bus::EventBus;

    fn complete() -> LearningTransition {
        LearningTransition::ExecutionComplete {
            model_id: ModelId::from("huraii_sd"),
            duration_seconds: 0.1,
            output_size: 64,
        }
    }

    #[tokio::test]
    async fn test_notify_publishes_state_update() {
        let bus = Arc::new(EventBus::new(16));
        let mut receiver = bus.subscribe();
        let manager = LearningStateManager::new(0.5, LearningMode::Active, bus.clone());

        let state = manager.notify(AgentId::Huraii, complete());

        assert_eq!(state.model_execution_count, 1);
        assert!((state.learning_progress - 0.5).abs() < f64::EPSILON);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name(), "agent_learning_state_updated");
    }

    #[test]
    fn test_agents_are_independent() {
        let manager = LearningStateManager::new(0.5, LearningMode::Active, Arc::new(EventBus::new(16)));

        manager.notify(AgentId::Cloe, complete());

        assert_eq!(manager.get_agent_state(AgentId::Cloe).model_execution_count, 1);
        assert_eq!(manager.get_agent_state(AgentId::Huraii).model_execution_count, 0);
    }

    #[test]
    fn test_restore_merges_persisted_records() {
        let manager = LearningStateManager::new(0.001, LearningMode::Active, Arc::new(EventBus::new(16)));
        let mut persisted = AgentLearningState::new(AgentId::BusinessStrategist);
        persisted.model_execution_count = 42;
        persisted.learning_progress = 0.7;
        persisted.learning_mode = LearningMode::Passive;

        manager.restore(vec![persisted]);

        let state = manager.get_agent_state(AgentId::BusinessStrategist);
        assert_eq!(state.model_execution_count, 42);
        assert_eq!(state.learning_mode, LearningMode::Passive);
        assert_eq!(manager.snapshot().len(), 3);
    }

    #[test]
    fn test_set_learning_mode() {
        let manager = LearningStateManager::new(0.5, LearningMode::Active, Arc::new(EventBus::new(16)));
        manager.set_learning_mode(AgentId::Huraii, LearningMode::Disabled);

        let state = manager.notify(AgentId::Huraii, complete());

        assert_eq!(state.learning_progress, 0.0);
        assert_eq!(state.model_execution_count, 1);
    }
}
