// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Engine Configuration Types
//
// Defines the configuration schema for a VORTEX engine process:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Provider endpoints and their credentials ("env:VAR_NAME" supported)
// - Additional or overriding model descriptors
// - Learning, stats history, storage and HTTP API settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::agent::{LearningMode, DEFAULT_PROGRESS_RATE};
use crate::domain::execution::DEFAULT_HISTORY_CAPACITY;
use crate::domain::model::{DescriptorDraft, MemoryRequirement, ModelDescriptor, ModelId, ModelType};
use crate::domain::provider::{ProviderEndpoint, ProviderKind, DEFAULT_PROVIDER_TIMEOUT_SECS};

pub const API_VERSION: &str = "vortex.ai/v1";
pub const KIND: &str = "EngineConfig";

/// Top-level Kubernetes-style engine configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigManifest {
    /// API version (must be "vortex.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "EngineConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: EngineConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigSpec {
    /// Remote provider endpoints
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderEndpointConfig>,

    /// Register the built-in HURAII model catalog at startup
    #[serde(default = "default_true")]
    pub include_default_catalog: bool,

    /// Directory holding local model resources
    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    /// Extra models, or overrides of catalog entries with the same id
    #[serde(default)]
    pub models: Vec<ModelConfigEntry>,

    #[serde(default)]
    pub learning: LearningConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    /// Periodic checkpoint interval for long-running processes
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval_seconds: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpointConfig {
    /// Unique endpoint name referenced by model descriptors
    pub name: String,

    #[serde(rename = "type")]
    pub provider_type: ProviderKind,

    pub base_url: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl ProviderEndpointConfig {
    /// Resolve credentials into a runtime endpoint. A missing environment
    /// variable leaves the endpoint inactive rather than failing startup.
    pub fn resolve(&self) -> ProviderEndpoint {
        ProviderEndpoint {
            name: self.name.clone(),
            provider: self.provider_type,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: resolve_api_key(self.api_key.as_deref()),
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Resolve API key from config (supports "env:VAR_NAME" syntax)
pub fn resolve_api_key(key: Option<&str>) -> String {
    match key {
        Some(k) if k.starts_with("env:") => {
            let var_name = &k["env:".len()..];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!("Environment variable not set: {} (endpoint stays inactive)", var_name);
                    String::new()
                }
            }
        }
        Some(k) => k.to_string(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigEntry {
    pub id: String,

    #[serde(flatten)]
    pub descriptor: DescriptorDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Diminishing-returns increment per successful execution
    #[serde(default = "default_progress_rate")]
    pub progress_rate: f64,

    /// Mode applied to agents without a persisted state
    #[serde(default)]
    pub default_mode: LearningMode,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            progress_rate: default_progress_rate(),
            default_mode: LearningMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Ring buffer capacity of recent execution records
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { history_capacity: default_history_capacity() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sled database directory; in-memory state when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<String>,

    /// Directory receiving generated artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Public URL prefix for artifacts; `file://` URLs when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            artifact_dir: default_artifact_dir(),
            artifact_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus exporter port; disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

fn default_models_dir() -> String {
    "./models".to_string()
}

fn default_progress_rate() -> f64 {
    DEFAULT_PROGRESS_RATE
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_artifact_dir() -> String {
    "./artifacts".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8400
}

fn default_checkpoint_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_providers() -> Vec<ProviderEndpointConfig> {
    vec![
        ProviderEndpointConfig {
            name: "huggingface".to_string(),
            provider_type: ProviderKind::HuggingFace,
            base_url: "https://api-inference.huggingface.co".to_string(),
            api_key: Some("env:VORTEX_HUGGINGFACE_API_KEY".to_string()),
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECS,
        },
        ProviderEndpointConfig {
            name: "stability".to_string(),
            provider_type: ProviderKind::Stability,
            base_url: "https://api.stability.ai".to_string(),
            api_key: Some("env:VORTEX_STABILITY_API_KEY".to_string()),
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECS,
        },
        ProviderEndpointConfig {
            name: "openai".to_string(),
            provider_type: ProviderKind::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: Some("env:VORTEX_OPENAI_API_KEY".to_string()),
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECS,
        },
    ]
}

impl Default for EngineConfigSpec {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            include_default_catalog: true,
            models_dir: default_models_dir(),
            models: Vec::new(),
            learning: LearningConfig::default(),
            stats: StatsConfig::default(),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            checkpoint_interval_seconds: default_checkpoint_interval(),
            observability: None,
        }
    }
}

impl EngineConfigSpec {
    /// Built-in HURAII catalog. Local entries resolve under `models_dir`.
    pub fn default_catalog(&self) -> Vec<ModelDescriptor> {
        let dir = Path::new(&self.models_dir);
        let local = |sub: &str| dir.join(sub).to_string_lossy().into_owned();

        vec![
            ModelDescriptor::local("huraii_sd", "HURAII Stable Diffusion", ModelType::Text2Img, local("huraii-sd"))
                .with_capabilities(["text_to_image", "seed_art"]),
            ModelDescriptor::local("huraii_img2img", "HURAII Image Transform", ModelType::Img2Img, local("huraii-img2img"))
                .with_capabilities(["image_to_image", "style_transfer"]),
            ModelDescriptor::local("huraii_inpainting", "HURAII Inpainting", ModelType::Inpainting, local("huraii-inpainting"))
                .with_capabilities(["inpainting"])
                .with_memory_requirement(MemoryRequirement::High),
            ModelDescriptor::local("huraii_seed_analyzer", "HURAII Seed Art Analyzer", ModelType::Analyzer, local("huraii-analyzer"))
                .with_capabilities(["composition_analysis", "color_analysis", "seed_art"])
                .with_memory_requirement(MemoryRequirement::Low),
            ModelDescriptor::remote(
                "huraii_sdxl_hf",
                "SDXL via Hugging Face",
                ModelType::Text2Img,
                "huggingface",
                Some("stabilityai/stable-diffusion-xl-base-1.0".to_string()),
            )
            .with_capabilities(["text_to_image"]),
            ModelDescriptor::remote(
                "huraii_sdxl_stability",
                "SDXL via Stability",
                ModelType::Text2Img,
                "stability",
                Some("stable-diffusion-xl-1024-v1-0".to_string()),
            )
            .with_capabilities(["text_to_image", "image_to_image"]),
            ModelDescriptor::remote(
                "huraii_dalle",
                "DALL-E via OpenAI",
                ModelType::Text2Img,
                "openai",
                Some("dall-e-3".to_string()),
            )
            .with_capabilities(["text_to_image"]),
        ]
    }

    /// Catalog (if enabled) followed by configured models, later entries
    /// replacing earlier ones with the same id
    pub fn initial_models(&self) -> anyhow::Result<Vec<ModelDescriptor>> {
        let mut models: Vec<ModelDescriptor> = if self.include_default_catalog {
            self.default_catalog()
        } else {
            Vec::new()
        };

        for entry in &self.models {
            let id = ModelId::new(entry.id.clone());
            let descriptor = entry
                .descriptor
                .clone()
                .into_descriptor(&id)
                .map_err(|e| anyhow::anyhow!("Invalid model '{}' in configuration: {}", entry.id, e))?;
            models.retain(|m| m.id != id);
            models.push(descriptor);
        }

        Ok(models)
    }

    pub fn resolved_endpoints(&self) -> Vec<ProviderEndpoint> {
        self.providers.iter().map(ProviderEndpointConfig::resolve).collect()
    }
}

impl Default for EngineConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "vortex-engine".to_string(),
                version: None,
                labels: None,
            },
            spec: EngineConfigSpec::default(),
        }
    }
}

impl EngineConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. VORTEX_CONFIG_PATH environment variable
    /// 2. ./vortex-config.yaml (working directory)
    /// 3. ~/.vortex/config.yaml (user home)
    /// 4. /etc/vortex/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VORTEX_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./vortex-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vortex").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/vortex/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VORTEX_STATE_PATH") {
            tracing::info!("Environment override: VORTEX_STATE_PATH={}", val);
            self.spec.storage.state_path = Some(val);
        }

        if let Ok(val) = std::env::var("VORTEX_ARTIFACT_DIR") {
            tracing::info!("Environment override: VORTEX_ARTIFACT_DIR={}", val);
            self.spec.storage.artifact_dir = val;
        }

        if let Ok(val) = std::env::var("VORTEX_MODELS_DIR") {
            tracing::info!("Environment override: VORTEX_MODELS_DIR={}", val);
            self.spec.models_dir = val;
        }

        if let Ok(val) = std::env::var("VORTEX_LEARNING_MODE") {
            match val.parse::<LearningMode>() {
                Ok(mode) => {
                    tracing::info!("Environment override: VORTEX_LEARNING_MODE={}", val);
                    self.spec.learning.default_mode = mode;
                }
                Err(e) => {
                    tracing::warn!("Invalid value for VORTEX_LEARNING_MODE: {}. Ignoring.", e);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.spec.providers {
            if provider.name.is_empty() {
                anyhow::bail!("Provider name cannot be empty");
            }
            if provider.base_url.is_empty() {
                anyhow::bail!("Provider base_url cannot be empty for: {}", provider.name);
            }
            if !seen.insert(provider.name.as_str()) {
                anyhow::bail!("Duplicate provider name: {}", provider.name);
            }
        }

        let models = self.spec.initial_models()?;
        for model in models.iter().filter(|m| m.is_remote()) {
            if !self.spec.providers.iter().any(|p| p.name == model.api_endpoint) {
                anyhow::bail!(
                    "Model '{}' references unknown provider endpoint '{}'",
                    model.id,
                    model.api_endpoint
                );
            }
        }

        if !(0.0..=1.0).contains(&self.spec.learning.progress_rate) {
            anyhow::bail!("learning.progress_rate must be within [0, 1]");
        }

        if self.spec.stats.history_capacity == 0 {
            anyhow::bail!("stats.history_capacity must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = EngineConfigManifest::default();
        assert_eq!(manifest.api_version, "vortex.ai/v1");
        assert_eq!(manifest.kind, "EngineConfig");
        assert_eq!(manifest.spec.providers.len(), 3);
        assert_eq!(manifest.spec.stats.history_capacity, 1000);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_parsing_with_models() {
        let yaml = r#"
apiVersion: vortex.ai/v1
kind: EngineConfig
metadata:
  name: studio
spec:
  include_default_catalog: false
  providers:
    - name: stability
      type: stability
      base_url: https://api.stability.ai/
      api_key: sk-literal
  models:
    - id: cloe_trends
      name: CLOE Trend Scanner
      type: trend_analysis
      api_endpoint: stability
    - id: sd
      name: Local SD
      type: text2img
      path: /models/sd
      memory_requirement: low
"#;
        let manifest = EngineConfigManifest::from_yaml_str(yaml).unwrap();
        assert!(manifest.validate().is_ok());

        let models = manifest.spec.initial_models().unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].memory_requirement, MemoryRequirement::Low);

        let endpoints = manifest.spec.resolved_endpoints();
        assert_eq!(endpoints[0].base_url, "https://api.stability.ai");
        assert!(endpoints[0].is_active());
    }

    #[test]
    fn test_config_models_override_catalog() {
        let mut spec = EngineConfigSpec::default();
        spec.models.push(ModelConfigEntry {
            id: "huraii_sd".to_string(),
            descriptor: DescriptorDraft {
                name: Some("Custom SD".into()),
                model_type: Some(ModelType::Text2Img),
                path: Some("/opt/sd".into()),
                ..Default::default()
            },
        });

        let models = spec.initial_models().unwrap();
        let sd: Vec<_> = models.iter().filter(|m| m.id.as_str() == "huraii_sd").collect();
        assert_eq!(sd.len(), 1);
        assert_eq!(sd[0].path, "/opt/sd");
    }

    #[test]
    fn test_validation() {
        let mut manifest = EngineConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "WrongKind".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        // Catalog references an endpoint that no longer exists
        manifest.spec.providers.retain(|p| p.name != "openai");
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_missing_env_key_leaves_endpoint_inactive() {
        let config = ProviderEndpointConfig {
            name: "openai".into(),
            provider_type: ProviderKind::OpenAI,
            base_url: "https://api.openai.com/v1".into(),
            api_key: Some("env:VORTEX_TEST_KEY_THAT_IS_NEVER_SET".into()),
            timeout_seconds: 60,
        };
        assert!(!config.resolve().is_active());
    }
}
