// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Model Descriptors
//!
//! A [`ModelDescriptor`] is the configuration record for one invokable AI
//! capability. Local models carry a `path` to a resource on disk; remote models
//! carry the name of a [`ProviderEndpoint`](crate::domain::provider::ProviderEndpoint)
//! in `api_endpoint`. Routing is decided solely by which of the two is set.
//!
//! Every descriptor embeds its own [`ExecutionAggregate`], which the stats
//! tracker updates after each call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::error::InferenceError;

/// Unique string key of a registered model (e.g. `huraii_sd`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    #[serde(rename = "text2img")]
    Text2Img,
    #[serde(rename = "img2img")]
    Img2Img,
    Analyzer,
    Inpainting,
    StyleTransfer,
    Upscale,
    Curation,
    Recommendation,
    TrendAnalysis,
    MarketAnalysis,
    Valuation,
    BusinessStrategy,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Text2Img => "text2img",
            ModelType::Img2Img => "img2img",
            ModelType::Analyzer => "analyzer",
            ModelType::Inpainting => "inpainting",
            ModelType::StyleTransfer => "style_transfer",
            ModelType::Upscale => "upscale",
            ModelType::Curation => "curation",
            ModelType::Recommendation => "recommendation",
            ModelType::TrendAnalysis => "trend_analysis",
            ModelType::MarketAnalysis => "market_analysis",
            ModelType::Valuation => "valuation",
            ModelType::BusinessStrategy => "business_strategy",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryRequirement {
    Low,
    #[default]
    Medium,
    High,
}

/// Running aggregate of every execution against one model.
///
/// `avg_duration` and `success_rate` are derived and recomputed on each
/// [`record`](ExecutionAggregate::record) call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionAggregate {
    pub execution_count: u64,
    pub total_duration: f64,
    pub avg_duration: f64,
    pub error_count: u64,
    /// Percentage in [0, 100]
    pub success_rate: f64,
    pub last_execution: Option<DateTime<Utc>>,
}

impl ExecutionAggregate {
    pub fn record(&mut self, duration_seconds: f64, success: bool, at: DateTime<Utc>) {
        self.execution_count += 1;
        self.total_duration += duration_seconds;
        self.avg_duration = self.total_duration / self.execution_count as f64;
        if !success {
            self.error_count += 1;
        }
        self.success_rate = 100.0 * (self.execution_count - self.error_count) as f64
            / self.execution_count as f64;
        self.last_execution = Some(at);
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: ModelId,

    pub name: String,

    #[serde(rename = "type")]
    pub model_type: ModelType,

    /// Local resource locator; empty for remote models
    #[serde(default)]
    pub path: String,

    /// Name of the provider endpoint; empty for local models
    #[serde(default)]
    pub api_endpoint: String,

    /// Provider-side model or engine identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_model: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub memory_requirement: MemoryRequirement,

    #[serde(default)]
    pub capabilities: BTreeSet<String>,

    #[serde(default)]
    pub statistics: ExecutionAggregate,
}

impl ModelDescriptor {
    pub fn local(
        id: impl Into<String>,
        name: impl Into<String>,
        model_type: ModelType,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: ModelId::new(id),
            name: name.into(),
            model_type,
            path: path.into(),
            api_endpoint: String::new(),
            remote_model: None,
            active: true,
            version: default_version(),
            memory_requirement: MemoryRequirement::default(),
            capabilities: BTreeSet::new(),
            statistics: ExecutionAggregate::default(),
        }
    }

    pub fn remote(
        id: impl Into<String>,
        name: impl Into<String>,
        model_type: ModelType,
        api_endpoint: impl Into<String>,
        remote_model: Option<String>,
    ) -> Self {
        Self {
            id: ModelId::new(id),
            name: name.into(),
            model_type,
            path: String::new(),
            api_endpoint: api_endpoint.into(),
            remote_model,
            active: true,
            version: default_version(),
            memory_requirement: MemoryRequirement::default(),
            capabilities: BTreeSet::new(),
            statistics: ExecutionAggregate::default(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_memory_requirement(mut self, requirement: MemoryRequirement) -> Self {
        self.memory_requirement = requirement;
        self
    }

    pub fn is_remote(&self) -> bool {
        !self.api_endpoint.trim().is_empty()
    }

    pub fn is_local(&self) -> bool {
        !self.is_remote()
    }
}

/// Registration payload as submitted by operators or the HTTP API.
///
/// Optional fields are filled with defaults by [`DescriptorDraft::into_descriptor`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub model_type: Option<ModelType>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub remote_model: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub memory_requirement: Option<MemoryRequirement>,
    #[serde(default)]
    pub capabilities: Option<BTreeSet<String>>,
}

impl DescriptorDraft {
    /// Validate required fields and apply defaults.
    ///
    /// `name` and `type` are always required. A model must also name either a
    /// local `path` or a remote `api_endpoint`, and not both.
    pub fn into_descriptor(self, id: &ModelId) -> Result<ModelDescriptor, InferenceError> {
        if id.as_str().trim().is_empty() {
            return Err(InferenceError::InvalidDescriptor("model id cannot be empty".into()));
        }

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| InferenceError::InvalidDescriptor(format!("{}: missing name", id)))?;

        let model_type = self
            .model_type
            .ok_or_else(|| InferenceError::InvalidDescriptor(format!("{}: missing type", id)))?;

        let path = self.path.unwrap_or_default().trim().to_string();
        let api_endpoint = self.api_endpoint.unwrap_or_default().trim().to_string();

        match (path.is_empty(), api_endpoint.is_empty()) {
            (true, true) => {
                return Err(InferenceError::InvalidDescriptor(format!(
                    "{}: missing path (or api_endpoint for remote models)",
                    id
                )))
            }
            (false, false) => {
                return Err(InferenceError::InvalidDescriptor(format!(
                    "{}: path and api_endpoint are mutually exclusive",
                    id
                )))
            }
            _ => {}
        }

        Ok(ModelDescriptor {
            id: id.clone(),
            name,
            model_type,
            path,
            api_endpoint,
            remote_model: self.remote_model.filter(|m| !m.is_empty()),
            active: self.active.unwrap_or(true),
            version: self.version.unwrap_or_else(default_version),
            memory_requirement: self.memory_requirement.unwrap_or_default(),
            capabilities: self.capabilities.unwrap_or_default(),
            statistics: ExecutionAggregate::default(),
        })
    }
}

impl From<ModelDescriptor> for DescriptorDraft {
    fn from(descriptor: ModelDescriptor) -> Self {
        Self {
            name: Some(descriptor.name),
            model_type: Some(descriptor.model_type),
            path: Some(descriptor.path),
            api_endpoint: Some(descriptor.api_endpoint),
            remote_model: descriptor.remote_model,
            active: Some(descriptor.active),
            version: Some(descriptor.version),
            memory_requirement: Some(descriptor.memory_requirement),
            capabilities: Some(descriptor.capabilities),
        }
    }
}

/// Ephemeral marker that a model has been preloaded in this process
#[derive(Debug, Clone, Serialize)]
pub struct LoadedModelHandle {
    pub loaded_at: DateTime<Utc>,
    pub config: ModelDescriptor,
    pub ready: bool,
}

impl LoadedModelHandle {
    pub fn new(config: ModelDescriptor) -> Self {
        Self {
            loaded_at: Utc::now(),
            config,
            ready: true,
        }
    }
}
