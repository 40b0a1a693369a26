// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Provider Registry - Adapter construction and caching
//
// Adapters are cached per endpoint name and rebuilt whenever the endpoint
// configuration changes (e.g. a rotated API key). All adapters share one
// connection pool.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use super::{HuggingFaceAdapter, OpenAIAdapter, StabilityAdapter};
use crate::domain::provider::{ImageProvider, ProviderEndpoint, ProviderFactory, ProviderKind};

pub struct ProviderRegistry {
    client: reqwest::Client,
    adapters: DashMap<String, Arc<dyn ImageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            adapters: DashMap::new(),
        }
    }

    fn create_adapter(&self, endpoint: &ProviderEndpoint) -> Arc<dyn ImageProvider> {
        let client = self.client.clone();
        let endpoint = endpoint.clone();
        match endpoint.provider {
            ProviderKind::HuggingFace => Arc::new(HuggingFaceAdapter::new(client, endpoint)),
            ProviderKind::Stability => Arc::new(StabilityAdapter::new(client, endpoint)),
            ProviderKind::OpenAI => Arc::new(OpenAIAdapter::new(client, endpoint)),
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for ProviderRegistry {
    fn adapter(&self, endpoint: &ProviderEndpoint) -> Arc<dyn ImageProvider> {
        let cached = self
            .adapters
            .get(&endpoint.name)
            .filter(|adapter| adapter.endpoint() == endpoint)
            .map(|adapter| Arc::clone(adapter.value()));
        if let Some(adapter) = cached {
            return adapter;
        }

        info!("Initializing {} adapter for endpoint '{}'", endpoint.provider, endpoint.name);
        let adapter = self.create_adapter(endpoint);
        self.adapters.insert(endpoint.name.clone(), Arc::clone(&adapter));
        adapter
    }
}
