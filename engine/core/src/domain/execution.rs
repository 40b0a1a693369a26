// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::ModelId;

/// Default number of execution records kept in memory
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// One inference call as observed by the stats tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub model_id: ModelId,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub success: bool,
    pub result_size_bytes: u64,
    /// Estimated, the simulated backends do not measure real memory
    pub memory_peak_bytes: u64,
}

impl ExecutionRecord {
    pub fn success(model_id: ModelId, duration_seconds: f64, result_size_bytes: u64, memory_peak_bytes: u64) -> Self {
        Self {
            model_id,
            timestamp: Utc::now(),
            duration_seconds,
            success: true,
            result_size_bytes,
            memory_peak_bytes,
        }
    }

    pub fn failure(model_id: ModelId, duration_seconds: f64, memory_peak_bytes: u64) -> Self {
        Self {
            model_id,
            timestamp: Utc::now(),
            duration_seconds,
            success: false,
            result_size_bytes: 0,
            memory_peak_bytes,
        }
    }
}
