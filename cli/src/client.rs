// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for a running engine server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use vortex_core::domain::agent::{AgentId, AgentLearningState, LearningMode};
use vortex_core::domain::execution::ExecutionRecord;
use vortex_core::domain::inference::CanonicalResult;
use vortex_core::domain::model::{DescriptorDraft, ExecutionAggregate, ModelDescriptor};
use vortex_core::domain::provider::ProviderKind;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSummary {
    #[serde(flatten)]
    pub descriptor: ModelDescriptor,
    pub available: bool,
    pub loaded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelStats {
    pub statistics: ExecutionAggregate,
    pub recent: Vec<ExecutionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSummary {
    pub name: String,
    pub provider: ProviderKind,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct EngineClient {
    client: Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // No global timeout; remote inference may take minutes
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn for_address(host: &str, port: u16) -> Result<Self> {
        Self::new(format!("http://{}:{}", host, port))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<Value> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .context("Engine server is not reachable")?;
        parse(response, "health check").await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        let response = self
            .client
            .get(self.url("/v1/models"))
            .send()
            .await
            .context("Failed to list models")?;
        parse(response, "list models").await
    }

    pub async fn register_model(&self, id: &str, draft: &DescriptorDraft) -> Result<ModelSummary> {
        #[derive(Serialize)]
        struct RegisterRequest<'a> {
            id: &'a str,
            #[serde(flatten)]
            descriptor: &'a DescriptorDraft,
        }

        let response = self
            .client
            .post(self.url("/v1/models"))
            .json(&RegisterRequest { id, descriptor: draft })
            .send()
            .await
            .context("Failed to register model")?;
        parse(response, "register model").await
    }

    pub async fn deregister_model(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/models/{}", id)))
            .send()
            .await
            .context("Failed to deregister model")?;
        ensure_success(response, "deregister model").await.map(|_| ())
    }

    pub async fn model_stats(&self, id: &str) -> Result<ModelStats> {
        let response = self
            .client
            .get(self.url(&format!("/v1/models/{}/stats", id)))
            .send()
            .await
            .context("Failed to fetch model statistics")?;
        parse(response, "model statistics").await
    }

    pub async fn preload(&self, id: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.url(&format!("/v1/models/{}/preload", id)))
            .send()
            .await
            .context("Failed to preload model")?;
        let body: Value = parse(response, "preload").await?;
        Ok(body["loaded"].as_bool().unwrap_or(false))
    }

    pub async fn unload(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/v1/models/{}/unload", id)))
            .send()
            .await
            .context("Failed to unload model")?;
        ensure_success(response, "unload").await.map(|_| ())
    }

    pub async fn infer(&self, id: &str, inputs: Value) -> Result<CanonicalResult> {
        let response = self
            .client
            .post(self.url(&format!("/v1/models/{}/inference", id)))
            .json(&json!({ "inputs": inputs }))
            .send()
            .await
            .context("Failed to run inference")?;
        parse(response, "inference").await
    }

    pub async fn agent(&self, agent: AgentId) -> Result<AgentLearningState> {
        let response = self
            .client
            .get(self.url(&format!("/v1/agents/{}", agent)))
            .send()
            .await
            .context("Failed to fetch agent state")?;
        parse(response, "agent state").await
    }

    pub async fn set_learning_mode(&self, agent: AgentId, mode: LearningMode) -> Result<AgentLearningState> {
        let response = self
            .client
            .put(self.url(&format!("/v1/agents/{}/mode", agent)))
            .json(&json!({ "mode": mode }))
            .send()
            .await
            .context("Failed to set learning mode")?;
        parse(response, "set learning mode").await
    }

    pub async fn list_endpoints(&self) -> Result<Vec<EndpointSummary>> {
        let response = self
            .client
            .get(self.url("/v1/endpoints"))
            .send()
            .await
            .context("Failed to list endpoints")?;
        parse(response, "list endpoints").await
    }

    pub async fn update_endpoint(&self, name: &str, update: Value) -> Result<EndpointSummary> {
        let response = self
            .client
            .put(self.url(&format!("/v1/endpoints/{}", name)))
            .json(&update)
            .send()
            .await
            .context("Failed to update endpoint")?;
        parse(response, "update endpoint").await
    }

    pub async fn executions(&self, model: Option<&str>, limit: usize) -> Result<Vec<ExecutionRecord>> {
        let mut request = self
            .client
            .get(self.url("/v1/executions"))
            .query(&[("limit", limit.to_string())]);
        if let Some(model) = model {
            request = request.query(&[("model", model)]);
        }

        let response = request.send().await.context("Failed to list executions")?;
        parse(response, "list executions").await
    }

    pub async fn checkpoint(&self) -> Result<()> {
        let response = self
            .client
            .post(self.url("/v1/checkpoint"))
            .send()
            .await
            .context("Failed to request checkpoint")?;
        ensure_success(response, "checkpoint").await.map(|_| ())
    }
}

/// Turn a non-2xx response into an error carrying the server's message and hint
async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| {
            let error = body.get("error")?;
            let message = error.get("message")?.as_str()?.to_string();
            Some(match error.get("hint").and_then(Value::as_str) {
                Some(hint) => format!("{} (hint: {})", message, hint),
                None => message,
            })
        })
        .unwrap_or(text);

    anyhow::bail!("{} failed ({}): {}", action, status.as_u16(), detail)
}

async fn parse<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
    ensure_success(response, action)
        .await?
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", action))
}
