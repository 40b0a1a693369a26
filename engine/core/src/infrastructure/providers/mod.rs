// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Remote Image Provider Adapters
//
// One adapter per API family. Every adapter performs exactly one HTTP round
// trip per call with the endpoint timeout; there are no retries and no
// fallback between providers.

pub mod huggingface;
pub mod openai;
pub mod registry;
pub mod stability;

pub use huggingface::HuggingFaceAdapter;
pub use openai::OpenAIAdapter;
pub use registry::ProviderRegistry;
pub use stability::StabilityAdapter;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::debug;

use crate::domain::error::InferenceError;
use crate::domain::inference::{CanonicalInputs, GeneratedArtifact};
use crate::domain::model::ModelDescriptor;
use crate::domain::provider::{ImageProvider, ProviderEndpoint, ProviderRequest};

/// Build, send and parse one provider request
pub(crate) async fn round_trip(
    provider: &dyn ImageProvider,
    client: &reqwest::Client,
    descriptor: &ModelDescriptor,
    inputs: &CanonicalInputs,
    headers: &[(&str, &str)],
) -> Result<GeneratedArtifact, InferenceError> {
    let request = provider.build_request(
        descriptor.model_type,
        descriptor.remote_model.as_deref(),
        inputs,
    )?;
    let body = post_json(client, provider.endpoint(), &request, headers).await?;
    provider.parse_response(descriptor.model_type, &body)
}

/// POST a JSON payload and return the raw body of a 2xx response
pub(crate) async fn post_json(
    client: &reqwest::Client,
    endpoint: &ProviderEndpoint,
    request: &ProviderRequest,
    headers: &[(&str, &str)],
) -> Result<Bytes, InferenceError> {
    let url = format!("{}{}", endpoint.base_url.trim_end_matches('/'), request.path);
    let timeout = endpoint.timeout();
    debug!("POST {} via endpoint '{}'", url, endpoint.name);

    let mut builder = client
        .post(&url)
        .bearer_auth(&endpoint.api_key)
        .timeout(timeout)
        .json(&request.body);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            InferenceError::Timeout(timeout)
        } else {
            InferenceError::Network(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(InferenceError::ApiError {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            InferenceError::Timeout(timeout)
        } else {
            InferenceError::Network(e.to_string())
        }
    })?;

    if bytes.is_empty() {
        return Err(InferenceError::EmptyResponse);
    }
    Ok(bytes)
}

/// Decode a base64 image, accepting an optional `data:` URL prefix
pub(crate) fn decode_base64_image(encoded: &str) -> Result<Vec<u8>, InferenceError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| InferenceError::ProviderError(format!("invalid base64 image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_image() {
        assert_eq!(decode_base64_image("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64_image("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(matches!(
            decode_base64_image("not base64!"),
            Err(InferenceError::ProviderError(_))
        ));
    }
}
