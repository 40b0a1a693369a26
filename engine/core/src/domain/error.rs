// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Inference Error Taxonomy
//
// Registry and dispatcher errors are returned to the caller unwrapped.
// Telemetry failures never surface here; they are logged where they occur.

use serde::Serialize;
use std::time::Duration;

use crate::domain::model::{ModelId, ModelType};

/// Errors that can occur while registering models or running inference
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    #[error("Invalid model descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(ModelId),

    #[error("Model failed to load: {0}")]
    ModelLoadFailed(String),

    #[error("Unsupported model type: {0}")]
    UnsupportedModelType(ModelType),

    #[error("Provider endpoint inactive: {0}")]
    ProviderInactive(String),

    #[error("API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    #[error("Empty response from provider")]
    EmptyResponse,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Inference cancelled before dispatch")]
    Cancelled,

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

/// How the host should present an error at its boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserHint {
    /// The chosen model cannot serve requests right now
    TryAnotherModel,
    /// Transient upstream condition
    TryAgain,
    /// Configuration problem for operators, not end users
    OperatorAction,
    /// The request itself must change
    FixRequest,
}

impl InferenceError {
    pub fn user_hint(&self) -> UserHint {
        match self {
            InferenceError::ModelUnavailable(_)
            | InferenceError::ProviderInactive(_)
            | InferenceError::UnsupportedModelType(_)
            | InferenceError::ModelLoadFailed(_) => UserHint::TryAnotherModel,
            InferenceError::ApiError { .. }
            | InferenceError::EmptyResponse
            | InferenceError::Network(_)
            | InferenceError::Timeout(_)
            | InferenceError::ProviderError(_)
            | InferenceError::MissingArtifact(_) => UserHint::TryAgain,
            InferenceError::InvalidDescriptor(_) | InferenceError::PersistenceFailure(_) => {
                UserHint::OperatorAction
            }
            InferenceError::InvalidInput(_) | InferenceError::Cancelled => UserHint::FixRequest,
        }
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::InvalidDescriptor(_) => "invalid_descriptor",
            InferenceError::ModelUnavailable(_) => "model_unavailable",
            InferenceError::ModelLoadFailed(_) => "model_load_failed",
            InferenceError::UnsupportedModelType(_) => "unsupported_model_type",
            InferenceError::ProviderInactive(_) => "provider_inactive",
            InferenceError::ApiError { .. } => "api_error",
            InferenceError::ProviderError(_) => "provider_error",
            InferenceError::MissingArtifact(_) => "missing_artifact",
            InferenceError::EmptyResponse => "empty_response",
            InferenceError::InvalidInput(_) => "invalid_input",
            InferenceError::Network(_) => "network",
            InferenceError::Timeout(_) => "timeout",
            InferenceError::Cancelled => "cancelled",
            InferenceError::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

impl From<crate::domain::repository::PersistenceError> for InferenceError {
    fn from(err: crate::domain::repository::PersistenceError) -> Self {
        InferenceError::PersistenceFailure(err.to_string())
    }
}
