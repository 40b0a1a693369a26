// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Simulated local backend
//!
//! Stands in for an on-device ML runtime. Outputs are deterministic for a
//! given model, prompt and seed: images are SVG placeholders whose palette
//! and layout derive from a SHA-256 digest, and the analyzer returns a JSON
//! report derived from the digest of the submitted image.
//!
//! | Type | Required inputs |
//! |------|-----------------|
//! | `text2img` | `prompt` |
//! | `img2img` | `init_image` |
//! | `inpainting` | `init_image`, `mask` |
//! | `analyzer` | `image` |

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::debug;

use crate::domain::backend::LocalBackend;
use crate::domain::error::InferenceError;
use crate::domain::inference::{ArtifactKind, CanonicalInputs, GeneratedArtifact};
use crate::domain::model::{ModelDescriptor, ModelType};

pub const DEFAULT_IMAGE_SIZE: u64 = 512;
pub const MIN_IMAGE_SIZE: u64 = 64;
pub const MAX_IMAGE_SIZE: u64 = 2048;

#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend;

impl SimulatedBackend {
    pub fn new() -> Self {
        Self
    }

    fn text_to_image(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        let prompt = inputs.require_str("prompt")?;
        let seed = resolve_seed(inputs);
        let (width, height) = dimensions(inputs)?;

        let digest = digest(&[
            descriptor.id.as_str().as_bytes(),
            prompt.as_bytes(),
            inputs.get_str("negative_prompt").unwrap_or("").as_bytes(),
            &seed.to_le_bytes(),
        ]);

        Ok(GeneratedArtifact {
            bytes: render_svg(&digest, width, height, prompt).into_bytes(),
            kind: ArtifactKind::Svg,
            seed: Some(seed),
            analysis: None,
        })
    }

    fn image_to_image(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
        require_mask: bool,
    ) -> Result<GeneratedArtifact, InferenceError> {
        let init_image = inputs.require_str("init_image")?;
        let mask = if require_mask {
            inputs.require_str("mask")?
        } else {
            ""
        };
        let prompt = inputs.prompt().unwrap_or("");
        let strength = inputs.get_f64("strength").unwrap_or(0.5);
        if !(0.0..=1.0).contains(&strength) {
            return Err(InferenceError::InvalidInput(format!(
                "strength must be within [0, 1], got {}",
                strength
            )));
        }
        let seed = resolve_seed(inputs);
        let (width, height) = dimensions(inputs)?;

        let digest = digest(&[
            descriptor.id.as_str().as_bytes(),
            init_image.as_bytes(),
            mask.as_bytes(),
            prompt.as_bytes(),
            &strength.to_le_bytes(),
            &seed.to_le_bytes(),
        ]);

        Ok(GeneratedArtifact {
            bytes: render_svg(&digest, width, height, prompt).into_bytes(),
            kind: ArtifactKind::Svg,
            seed: Some(seed),
            analysis: None,
        })
    }

    fn analyze(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        let image = inputs.require_str("image")?;
        let d = digest(&[descriptor.id.as_str().as_bytes(), image.as_bytes()]);
        let score = |byte: u8| (byte as f64 / 255.0 * 100.0).round() / 100.0;

        let report = json!({
            "model_id": descriptor.id,
            "image_hash": hex::encode(&d[..8]),
            "composition": {
                "balance": score(d[0]),
                "rule_of_thirds": score(d[1]),
                "focal_points": 1 + d[2] % 4,
            },
            "color": {
                "harmony": score(d[3]),
                "dominant": palette(&d).iter().take(3).collect::<Vec<_>>(),
            },
            "technique": {
                "detail": score(d[4]),
                "contrast": score(d[5]),
            },
            "seed_art_score": score(d[6]),
        });

        let bytes = serde_json::to_vec_pretty(&report)
            .map_err(|e| InferenceError::ProviderError(e.to_string()))?;

        Ok(GeneratedArtifact {
            bytes,
            kind: ArtifactKind::Json,
            seed: None,
            analysis: Some(report),
        })
    }
}

#[async_trait]
impl LocalBackend for SimulatedBackend {
    async fn generate_local(
        &self,
        descriptor: &ModelDescriptor,
        inputs: &CanonicalInputs,
    ) -> Result<GeneratedArtifact, InferenceError> {
        debug!("Simulating {} model '{}'", descriptor.model_type, descriptor.id);

        match descriptor.model_type {
            ModelType::Text2Img => self.text_to_image(descriptor, inputs),
            ModelType::Img2Img => self.image_to_image(descriptor, inputs, false),
            ModelType::Inpainting => self.image_to_image(descriptor, inputs, true),
            ModelType::Analyzer => self.analyze(descriptor, inputs),
            other => Err(InferenceError::UnsupportedModelType(other)),
        }
    }
}

/// Caller-provided non-negative seed, otherwise a random one
fn resolve_seed(inputs: &CanonicalInputs) -> i64 {
    inputs
        .get_i64("seed")
        .filter(|s| *s >= 0)
        .unwrap_or_else(|| rand::rng().random_range(0..=u32::MAX as i64))
}

fn dimensions(inputs: &CanonicalInputs) -> Result<(u64, u64), InferenceError> {
    let read = |key: &str| -> Result<u64, InferenceError> {
        let value = match inputs.get(key) {
            None => return Ok(DEFAULT_IMAGE_SIZE),
            Some(v) => v.as_u64().ok_or_else(|| {
                InferenceError::InvalidInput(format!("{} must be a positive integer", key))
            })?,
        };
        if !(MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&value) {
            return Err(InferenceError::InvalidInput(format!(
                "{} must be between {} and {}, got {}",
                key, MIN_IMAGE_SIZE, MAX_IMAGE_SIZE, value
            )));
        }
        Ok(value)
    };
    Ok((read("width")?, read("height")?))
}

fn digest(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn palette(digest: &[u8; 32]) -> Vec<String> {
    digest
        .chunks_exact(3)
        .take(5)
        .map(|rgb| format!("#{}", hex::encode(rgb)))
        .collect()
}

fn render_svg(digest: &[u8; 32], width: u64, height: u64, title: &str) -> String {
    let colors = palette(digest);
    let mut svg = String::new();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    let _ = write!(svg, "<title>{}</title>", escape_xml(title));
    let _ = write!(svg, r#"<rect width="100%" height="100%" fill="{}"/>"#, colors[0]);

    for (i, color) in colors.iter().enumerate().skip(1) {
        let cx = digest[16 + i] as u64 * width / 255;
        let cy = digest[20 + i] as u64 * height / 255;
        let r = (digest[24 + i] as u64 % 64 + 16) * width.min(height) / 256;
        let _ = write!(
            svg,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="0.7"/>"#,
            cx, cy, r, color
        );
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
