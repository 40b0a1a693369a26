// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Canonical inference shapes
//!
//! Provider-agnostic request and response types. Every backend, local or
//! remote, consumes [`CanonicalInputs`] and produces a [`GeneratedArtifact`];
//! the dispatcher turns the artifact into a [`CanonicalResult`] once the
//! artifact store has persisted it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::InferenceError;
use crate::domain::model::ModelId;

/// Seed reported when a backend does not expose one
pub const UNKNOWN_SEED: i64 = -1;

/// Free-form inference inputs keyed by name (`prompt`, `negative_prompt`,
/// `init_image`, `strength`, `width`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalInputs(pub Map<String, Value>);

impl CanonicalInputs {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn prompt(&self) -> Option<&str> {
        self.get_str("prompt")
    }

    pub fn require_str(&self, key: &str) -> Result<&str, InferenceError> {
        self.get_str(key)
            .ok_or_else(|| InferenceError::InvalidInput(format!("missing required input '{}'", key)))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Rough byte size of the inputs, see [`estimate_payload_size`]
    pub fn estimated_size(&self) -> u64 {
        self.0.values().map(estimate_payload_size).sum()
    }
}

impl TryFrom<Value> for CanonicalInputs {
    type Error = InferenceError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(InferenceError::InvalidInput(format!(
                "inputs must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Estimate the in-memory size of a JSON payload.
///
/// Strings count their byte length, numbers 8 bytes, booleans 1 byte and
/// containers the sum of their elements.
pub fn estimate_payload_size(value: &Value) -> u64 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 8,
        Value::String(s) => s.len() as u64,
        Value::Array(items) => items.iter().map(estimate_payload_size).sum(),
        Value::Object(map) => map.values().map(estimate_payload_size).sum(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Png,
    Jpeg,
    Webp,
    Svg,
    Json,
}

impl ArtifactKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactKind::Png => "image/png",
            ArtifactKind::Jpeg => "image/jpeg",
            ArtifactKind::Webp => "image/webp",
            ArtifactKind::Svg => "image/svg+xml",
            ArtifactKind::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Png => "png",
            ArtifactKind::Jpeg => "jpg",
            ArtifactKind::Webp => "webp",
            ArtifactKind::Svg => "svg",
            ArtifactKind::Json => "json",
        }
    }

    /// Guess an image kind from magic bytes, defaulting to PNG
    pub fn sniff_image(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ArtifactKind::Jpeg
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            ArtifactKind::Webp
        } else if bytes.starts_with(b"<svg") || bytes.starts_with(b"<?xml") {
            ArtifactKind::Svg
        } else {
            ArtifactKind::Png
        }
    }
}

/// Raw output of a backend before it is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifact {
    pub bytes: Vec<u8>,
    pub kind: ArtifactKind,
    pub seed: Option<i64>,
    /// Structured output for analyzer-style models
    pub analysis: Option<Value>,
}

impl GeneratedArtifact {
    pub fn image(bytes: Vec<u8>, seed: Option<i64>) -> Self {
        let kind = ArtifactKind::sniff_image(&bytes);
        Self { bytes, kind, seed, analysis: None }
    }
}

/// Provider-agnostic inference result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub model_id: ModelId,
    pub image_url: String,
    pub image_id: String,
    /// Base64 encoded artifact bytes
    pub image_data: String,
    pub seed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
    pub duration_seconds: f64,
}

impl CanonicalResult {
    /// Rough byte size of the result as seen by callers
    pub fn estimated_size(&self) -> u64 {
        self.image_url.len() as u64
            + self.image_id.len() as u64
            + self.image_data.len() as u64
            + 8
            + self.analysis.as_ref().map(estimate_payload_size).unwrap_or(0)
    }
}
