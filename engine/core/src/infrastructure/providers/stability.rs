// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Stability AI v1 Generation API Adapter
//
// text2img: POST {base_url}/v1/generation/{engine}/text-to-image
// img2img:  POST {base_url}/v1/generation/{engine}/image-to-image
//
// Both read `artifacts[0].base64` and `artifacts[0].seed` from the response.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{decode_base64_image, round_trip};
use crate::domain::error::InferenceError;
use crate::domain::inference::{CanonicalInputs, GeneratedArtifact, UNKNOWN_SEED};
use crate::domain::model::{ModelDescriptor, ModelType};
use crate::domain::provider::{ImageProvider, ProviderEndpoint, ProviderKind, ProviderRequest};

pub const DEFAULT_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
pub const DEFAULT_CFG_SCALE: f64 = 7.0;
pub const DEFAULT_STEPS: u64 = 30;
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// Optional inputs forwarded verbatim when present
const PASSTHROUGH: &[&str] = &["width", "height", "seed", "samples", "sampler", "style_preset"];

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    artifacts: Vec<GenerationArtifact>,
}

#[derive(Deserialize)]
struct GenerationArtifact {
    base64: Option<String>,
    seed: Option<i64>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

pub struct StabilityAdapter {
    client: reqwest::Client,
    endpoint: ProviderEndpoint,
}

impl StabilityAdapter {
    pub fn new(client: reqwest::Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl ImageProvider for StabilityAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stability
    }

    fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    fn build_request(
        &self,
        model_type: ModelType,
        remote_model: Option<&str>,
        inputs: &CanonicalInputs,
    ) -> Result<ProviderRequest, InferenceError> {
        let engine = remote_model.unwrap_or(DEFAULT_ENGINE);
        let prompt = inputs.require_str("prompt")?;

        let mut text_prompts = vec![json!({"text": prompt, "weight": 1.0})];
        if let Some(negative) = inputs.get_str("negative_prompt") {
            text_prompts.push(json!({"text": negative, "weight": -1.0}));
        }

        let mut body = json!({
            "text_prompts": text_prompts,
            "cfg_scale": inputs.get_f64("cfg_scale").unwrap_or(DEFAULT_CFG_SCALE),
            "steps": inputs.get_u64("steps").unwrap_or(DEFAULT_STEPS),
        });
        for key in PASSTHROUGH {
            if let Some(value) = inputs.get(key) {
                body[*key] = value.clone();
            }
        }

        let operation = match model_type {
            ModelType::Text2Img => "text-to-image",
            ModelType::Img2Img => {
                let init_image = inputs.require_str("init_image")?;
                let strength = inputs.get_f64("strength").unwrap_or(DEFAULT_STRENGTH);
                body["init_image"] = Value::from(init_image);
                body["init_image_mode"] = Value::from("IMAGE_STRENGTH");
                body["image_strength"] = Value::from(1.0 - strength);
                "image-to-image"
            }
            other => return Err(InferenceError::UnsupportedModelType(other)),
        };

        Ok(ProviderRequest {
            path: format!("/v1/generation/{}/{}", engine, operation),
            body,
        })
    }

    fn parse_response(
        &self,
        _model_type: ModelType,
        raw_body: &[u8],
    ) -> Result<GeneratedArtifact, InferenceError> {
        let response: GenerationResponse = serde_json::from_slice(raw_body).map_err(|e| {
            InferenceError::ProviderError(format!("Failed to parse response: {}", e))
        })?;

        let artifact = response
            .artifacts
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::MissingArtifact("no artifacts returned".into()))?;

        if artifact.finish_reason.as_deref() == Some("ERROR") {
            return Err(InferenceError::ProviderError("generation finished with ERROR".into()));
        }

        let encoded = artifact
            .base64
            .ok_or_else(|| InferenceError::MissingArtifact("artifact has no image data".into()))?;

        Ok(GeneratedArtifact::image(
            decode_base64_image(&encoded)?,
            Some(artifact.seed.unwrap_or(UNKNOWN_SEED)),
        ))
    }

    async fn generate(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        round_trip(
            self,
            &self.client,
            descriptor,
            inputs,
            &[("Accept", "application/json")],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> StabilityAdapter {
        StabilityAdapter::new(
            reqwest::Client::new(),
            ProviderEndpoint {
                name: "stability".into(),
                provider: ProviderKind::Stability,
                base_url: "https://api.stability.ai".into(),
                api_key: "sk-test".into(),
                timeout_seconds: 60,
            },
        )
    }

    #[test]
    fn test_text_to_image_defaults() {
        let inputs = CanonicalInputs::new()
            .with("prompt", "a castle")
            .with("negative_prompt", "fog");

        let request = adapter().build_request(ModelType::Text2Img, None, &inputs).unwrap();

        assert_eq!(request.path, format!("/v1/generation/{}/text-to-image", DEFAULT_ENGINE));
        assert_eq!(request.body["cfg_scale"], 7.0);
        assert_eq!(request.body["steps"], 30);
        assert_eq!(request.body["text_prompts"][0]["weight"], 1.0);
        assert_eq!(request.body["text_prompts"][1]["text"], "fog");
        assert_eq!(request.body["text_prompts"][1]["weight"], -1.0);
    }

    #[test]
    fn test_image_to_image_inverts_strength() {
        let inputs = CanonicalInputs::new()
            .with("prompt", "a castle")
            .with("init_image", "aGVsbG8=")
            .with("strength", 0.8)
            .with("steps", 50);

        let request = adapter()
            .build_request(ModelType::Img2Img, Some("sd-v1-6"), &inputs)
            .unwrap();

        assert_eq!(request.path, "/v1/generation/sd-v1-6/image-to-image");
        assert!((request.body["image_strength"].as_f64().unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(request.body["steps"], 50);
    }

    #[test]
    fn test_image_to_image_default_strength() {
        let inputs = CanonicalInputs::new().with("prompt", "x").with("init_image", "aGVsbG8=");
        let request = adapter().build_request(ModelType::Img2Img, None, &inputs).unwrap();
        assert_eq!(request.body["image_strength"], 0.5);
    }

    #[test]
    fn test_parse_response() {
        let adapter = adapter();

        let artifact = adapter
            .parse_response(ModelType::Text2Img, br#"{"artifacts":[{"base64":"aGVsbG8=","seed":1234,"finishReason":"SUCCESS"}]}"#)
            .unwrap();
        assert_eq!(artifact.bytes, b"hello");
        assert_eq!(artifact.seed, Some(1234));

        let artifact = adapter
            .parse_response(ModelType::Text2Img, br#"{"artifacts":[{"base64":"aGVsbG8="}]}"#)
            .unwrap();
        assert_eq!(artifact.seed, Some(UNKNOWN_SEED));

        assert!(matches!(
            adapter.parse_response(ModelType::Text2Img, br#"{"artifacts":[]}"#),
            Err(InferenceError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_unsupported_model_type() {
        let inputs = CanonicalInputs::new().with("prompt", "x");
        assert!(matches!(
            adapter().build_request(ModelType::Analyzer, None, &inputs),
            Err(InferenceError::UnsupportedModelType(ModelType::Analyzer))
        ));
    }
}
