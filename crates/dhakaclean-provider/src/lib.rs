pub mod gemini;
pub mod types;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiProvider;
pub use types::*;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}

// ============================================================
// Provider Configuration
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Gemini,
    /// Offline echo model, no network
    Stub,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type", default)]
    pub provider_type: ProviderType,
    /// Inline key; takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(ProviderType::Gemini)
    }
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            model: default_model(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Inline key, then `api_key_env`, then `GEMINI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        [self.api_key_env.as_str(), "GEMINI_API_KEY"]
            .into_iter()
            .filter(|name| !name.is_empty())
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }
}

/// Build the shared model handle. Called once at startup.
pub fn create_model(config: &ProviderConfig) -> Result<Arc<dyn GenerativeModel>> {
    let model: Arc<dyn GenerativeModel> = match config.provider_type {
        ProviderType::Gemini => {
            let key = config.resolve_api_key().ok_or_else(|| {
                anyhow!(
                    "gemini requires api_key (set {} or GEMINI_API_KEY)",
                    config.api_key_env
                )
            })?;
            match config.base_url.as_deref() {
                Some(base_url) => Arc::new(GeminiProvider::with_base_url(key, base_url)),
                None => Arc::new(GeminiProvider::new(key)),
            }
        }
        ProviderType::Stub => Arc::new(StubModel),
    };
    tracing::info!(
        "Model provider ready: {:?} ({})",
        config.provider_type,
        config.model
    );
    Ok(model)
}

pub struct StubModel;

#[async_trait]
impl GenerativeModel for StubModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let user_text = request
            .contents
            .last()
            .map(|t| t.text())
            .unwrap_or_default();
        Ok(GenerateResponse {
            text: format!("[stub:{}] {}", request.model, user_text),
            grounding_chunks: vec![],
            input_tokens: None,
            output_tokens: None,
            stop_reason: Some("end_turn".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_model_echoes_last_turn() {
        let req = GenerateRequest::simple("my-model", None, "ping");
        let resp = StubModel.generate(req).await.unwrap();
        assert_eq!(resp.text, "[stub:my-model] ping");
        assert_eq!(resp.stop_reason.as_deref(), Some("end_turn"));
    }

    #[tokio::test]
    async fn stub_model_empty_contents() {
        let req = GenerateRequest::new("m", vec![]);
        let resp = StubModel.generate(req).await.unwrap();
        assert_eq!(resp.text, "[stub:m] ");
    }

    #[test]
    fn inline_key_wins() {
        let config = ProviderConfig::new(ProviderType::Gemini).with_api_key("inline");
        assert_eq!(config.resolve_api_key().as_deref(), Some("inline"));
    }

    #[test]
    fn gemini_without_key_fails() {
        let mut config = ProviderConfig::new(ProviderType::Gemini);
        config.api_key_env = "DHAKACLEAN_TEST_UNSET_KEY".into();
        if std::env::var("GEMINI_API_KEY").is_ok() {
            return;
        }
        let err = create_model(&config).err().unwrap();
        assert!(err.to_string().contains("gemini requires api_key"));
    }

    #[test]
    fn stub_needs_no_key() {
        let config = ProviderConfig::new(ProviderType::Stub);
        assert!(create_model(&config).is_ok());
    }

    #[test]
    fn provider_config_yaml_defaults() {
        let config: ProviderConfig = serde_json::from_str(r#"{"type": "gemini"}"#).unwrap();
        assert_eq!(config.provider_type, ProviderType::Gemini);
        assert_eq!(config.api_key_env, "API_KEY");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.base_url.is_none());
    }
}
