// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end inference scenarios through the Engine facade.
//!
//! Remote providers are exercised against mockito servers; local models use
//! the simulated backend with a temporary directory as their resource path.

mod common;

use base64::Engine as _;
use common::{endpoint, engine_with};
use vortex_core::domain::agent::AgentId;
use vortex_core::domain::error::InferenceError;
use vortex_core::domain::inference::CanonicalInputs;
use vortex_core::domain::model::{ModelId, ModelType};
use vortex_core::domain::provider::ProviderKind;

#[tokio::test]
async fn test_local_text_to_image() {
    let t = engine_with(vec![]).await;
    let id = t.register_local("huraii_sd", ModelType::Text2Img).await;

    let result = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap();

    assert!(result.seed >= 0);
    assert!(!result.image_url.is_empty());
    assert!(!result.image_id.is_empty());
    assert!(t.artifacts.get(&result.image_id).is_some());

    let agent = t.engine.get_agent_state(AgentId::Huraii);
    assert_eq!(agent.model_execution_count, 1);
    assert!(agent.learning_progress > 0.0);

    let stats = t.engine.get_execution_stats(&id).unwrap();
    assert_eq!(stats.execution_count, 1);
    assert_eq!(stats.error_count, 0);
    assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_inactive_endpoint_makes_no_http_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let t = engine_with(vec![endpoint("openai", ProviderKind::OpenAI, &server.url(), "")]).await;
    let id = t.register_remote("huraii_dalle", "openai", "dall-e-3").await;

    let err = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::ModelUnavailable(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stability_empty_artifacts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/generation/sdxl/text-to-image")
        .match_header("authorization", "Bearer sk-test")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"artifacts": []}"#)
        .expect(1)
        .create_async()
        .await;

    let t = engine_with(vec![endpoint("stability", ProviderKind::Stability, &server.url(), "sk-test")]).await;
    let id = t.register_remote("huraii_sdxl_stability", "stability", "sdxl").await;
    let progress_before = t.engine.get_agent_state(AgentId::Huraii).learning_progress;

    let err = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::MissingArtifact(_)));
    let stats = t.engine.get_execution_stats(&id).unwrap();
    assert_eq!(stats.execution_count, 1);
    assert_eq!(stats.error_count, 1);
    assert_eq!(
        t.engine.get_agent_state(AgentId::Huraii).learning_progress,
        progress_before
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stability_success_reports_seed() {
    let mut server = mockito::Server::new_async().await;
    let png = b"\x89PNG\r\n\x1a\nfake";
    let body = serde_json::json!({
        "artifacts": [{
            "base64": base64::engine::general_purpose::STANDARD.encode(png),
            "seed": 1234,
            "finishReason": "SUCCESS"
        }]
    });
    server
        .mock("POST", "/v1/generation/sdxl/text-to-image")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "cfg_scale": 7.0,
            "steps": 30,
            "text_prompts": [{"text": "a cat", "weight": 1.0}]
        })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let t = engine_with(vec![endpoint("stability", ProviderKind::Stability, &server.url(), "sk-test")]).await;
    let id = t.register_remote("huraii_sdxl_stability", "stability", "sdxl").await;

    let result = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap();

    assert_eq!(result.seed, 1234);
    let decoded = base64::engine::general_purpose::STANDARD.decode(&result.image_data).unwrap();
    assert_eq!(decoded, png);
}

#[tokio::test]
async fn test_provider_error_status_is_preserved() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/images/generations")
        .with_status(429)
        .with_body(r#"{"error":{"message":"rate limited"}}"#)
        .create_async()
        .await;

    let t = engine_with(vec![endpoint("openai", ProviderKind::OpenAI, &server.url(), "sk-test")]).await;
    let id = t.register_remote("huraii_dalle", "openai", "dall-e-3").await;

    let err = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap_err();

    match err {
        InferenceError::ApiError { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_body_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/stabilityai/sdxl")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let t = engine_with(vec![endpoint("huggingface", ProviderKind::HuggingFace, &server.url(), "hf_test")]).await;
    let id = t.register_remote("huraii_sdxl_hf", "huggingface", "stabilityai/sdxl").await;

    let err = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::EmptyResponse));
}

#[tokio::test]
async fn test_huggingface_raw_image() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/stabilityai/sdxl")
        .match_header("authorization", "Bearer hf_test")
        .match_body(mockito::Matcher::Json(serde_json::json!({"prompt": "a cat", "seed": 9})))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02])
        .create_async()
        .await;

    let t = engine_with(vec![endpoint("huggingface", ProviderKind::HuggingFace, &server.url(), "hf_test")]).await;
    let id = t.register_remote("huraii_sdxl_hf", "huggingface", "stabilityai/sdxl").await;

    let result = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat").with("seed", 9))
        .await
        .unwrap();

    assert_eq!(result.seed, -1);
    assert!(result.image_url.ends_with(".jpg"));
}

#[tokio::test]
async fn test_analyzer_returns_structured_report() {
    let t = engine_with(vec![]).await;
    let id = t.register_local("huraii_seed_analyzer", ModelType::Analyzer).await;

    let result = t
        .engine
        .run_inference(&id, CanonicalInputs::new().with("image", "aGVsbG8="))
        .await
        .unwrap();

    let analysis = result.analysis.expect("analysis report");
    assert!(analysis.get("composition").is_some());
    assert_eq!(result.seed, -1);
}

#[tokio::test]
async fn test_attribution_falls_back_to_model_type() {
    let t = engine_with(vec![]).await;
    let id = t.register_local("generic_sd", ModelType::Text2Img).await;

    t.engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "x"))
        .await
        .unwrap();

    assert_eq!(t.engine.get_agent_state(AgentId::Huraii).model_execution_count, 1);
    assert_eq!(t.engine.get_agent_state(AgentId::Cloe).model_execution_count, 0);
}

#[tokio::test]
async fn test_concurrent_inference_on_distinct_models() {
    let t = engine_with(vec![]).await;
    let ids: Vec<ModelId> = register_models(&t).await;
    const CALLS: usize = 8;

    let mut handles = Vec::new();
    for id in &ids {
        for i in 0..CALLS {
            let engine = t.engine.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .run_inference(&id, CanonicalInputs::new().with("prompt", format!("p{}", i)))
                    .await
            }));
        }
    }
    for outcome in futures::future::join_all(handles).await {
        outcome.unwrap().unwrap();
    }

    for id in &ids {
        let stats = t.engine.get_execution_stats(id).unwrap();
        assert_eq!(stats.execution_count, CALLS as u64, "count for {}", id);
        assert_eq!(stats.error_count, 0);
    }
    assert_eq!(
        t.engine.get_agent_state(AgentId::Huraii).model_execution_count,
        (ids.len() * CALLS) as u64
    );
    assert_eq!(t.engine.stats().len(), ids.len() * CALLS);
}

async fn register_models(t: &common::TestEngine) -> Vec<ModelId> {
    let mut ids = Vec::new();
    for name in ["huraii_a", "huraii_b", "huraii_c", "huraii_d"] {
        ids.push(t.register_local(name, ModelType::Text2Img).await);
    }
    ids
}

#[tokio::test]
async fn test_stats_are_monotonic() {
    let t = engine_with(vec![]).await;
    let id = t.register_local("huraii_sd", ModelType::Text2Img).await;
    let mut previous = t.engine.get_execution_stats(&id).unwrap();

    for i in 0..20 {
        // Every third call omits the prompt and fails validation
        let inputs = if i % 3 == 0 {
            CanonicalInputs::new()
        } else {
            CanonicalInputs::new().with("prompt", "a cat")
        };
        let _ = t.engine.run_inference(&id, inputs).await;

        let current = t.engine.get_execution_stats(&id).unwrap();
        assert!(current.execution_count > previous.execution_count);
        assert!(current.total_duration >= previous.total_duration);
        assert!(current.error_count >= previous.error_count);
        assert!((0.0..=100.0).contains(&current.success_rate));
        previous = current;
    }

    assert_eq!(previous.execution_count, 20);
    assert_eq!(previous.error_count, 7);

    let history = t.engine.stats().history_for(&id);
    assert_eq!(history.len(), 20);
    assert_eq!(history.iter().filter(|r| !r.success).count(), 7);
    let summed: f64 = history.iter().map(|r| r.duration_seconds).sum();
    assert!((previous.total_duration - summed).abs() < 1e-9);
    assert!((previous.avg_duration - previous.total_duration / 20.0).abs() < 1e-12);
    assert!((previous.success_rate - 65.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_events_are_published() {
    let t = engine_with(vec![]).await;
    let id = t.register_local("huraii_sd", ModelType::Text2Img).await;
    let mut receiver = t.events.subscribe_model(id.clone());

    t.engine
        .run_inference(&id, CanonicalInputs::new().with("prompt", "a cat"))
        .await
        .unwrap();

    let event = receiver.recv().await.unwrap();
    assert_eq!(event.name(), "model_execution_complete");
}
