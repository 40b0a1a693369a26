// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Execution Stats Tracker
//
// Keeps a bounded, insertion-ordered history of execution records and folds
// each record into the owning descriptor's aggregate. Also mirrors every
// record into the `metrics` facade for the Prometheus exporter.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::application::registry::ModelRegistry;
use crate::domain::execution::{ExecutionRecord, DEFAULT_HISTORY_CAPACITY};
use crate::domain::model::{ExecutionAggregate, ModelId};

pub struct ExecutionStatsTracker {
    registry: Arc<ModelRegistry>,
    history: Mutex<VecDeque<ExecutionRecord>>,
    capacity: usize,
}

impl ExecutionStatsTracker {
    pub fn new(registry: Arc<ModelRegistry>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            registry,
            history: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY))),
            capacity,
        }
    }

    /// Append a record, evicting the oldest when full, and update the
    /// model's aggregate.
    pub fn record(&self, record: ExecutionRecord) {
        let outcome = if record.success { "success" } else { "failure" };
        metrics::counter!(
            "vortex_model_executions_total",
            "model" => record.model_id.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "vortex_model_execution_duration_seconds",
            "model" => record.model_id.to_string()
        )
        .record(record.duration_seconds);

        if !self
            .registry
            .record_execution(&record.model_id, record.duration_seconds, record.success)
        {
            debug!("Execution recorded for unregistered model '{}'", record.model_id);
        }

        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(record);
    }

    /// Most recent records first
    pub fn recent(&self, limit: usize) -> Vec<ExecutionRecord> {
        self.history.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn history_for(&self, model_id: &ModelId) -> Vec<ExecutionRecord> {
        self.history
            .lock()
            .iter()
            .filter(|r| &r.model_id == model_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_execution_stats(&self, model_id: &ModelId) -> Option<ExecutionAggregate> {
        self.registry.statistics(model_id)
    }
}
