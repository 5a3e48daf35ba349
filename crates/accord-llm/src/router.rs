//! LLM Router - selects and holds the configured provider

use std::sync::Arc;

use crate::providers::*;
use crate::types::*;

/// Default provider when `ACCORD_LLM_PROVIDER` is unset
pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::OpenAI;

/// The LLM Router selects a provider based on configuration
#[derive(Clone)]
pub struct LLMRouter {
    provider: Arc<dyn LLMProvider>,
    kind: ProviderKind,
}

impl LLMRouter {
    /// Create a router with a specific provider
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        let kind = provider.kind();
        Self { provider, kind }
    }

    /// Create a router from environment variables
    ///
    /// Reads `ACCORD_LLM_PROVIDER` to select the provider:
    /// - `openai` (default): OpenAI API, needs `OPENAI_API_KEY`
    /// - `anthropic`: Anthropic Claude API, needs `ANTHROPIC_API_KEY`
    /// - `ollama`: Local Ollama instance
    /// - `openai_compat`: OpenAI-compatible local server
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore errors)
        let _ = dotenvy::dotenv();

        let kind = match std::env::var("ACCORD_LLM_PROVIDER") {
            Ok(name) => ProviderKind::from_str(&name).ok_or_else(|| {
                LLMError::ConfigurationError {
                    message: format!("unknown provider '{}'", name),
                }
            })?,
            Err(_) => DEFAULT_PROVIDER,
        };

        Self::from_kind(kind)
    }

    /// Create a router for a specific provider kind
    pub fn from_kind(kind: ProviderKind) -> Result<Self> {
        let provider: Arc<dyn LLMProvider> = match kind {
            ProviderKind::Ollama => Arc::new(OllamaProvider::from_env()),
            ProviderKind::OpenAICompat => Arc::new(OpenAICompatProvider::from_env()),
            ProviderKind::OpenAI => Arc::new(OpenAIProvider::from_env().ok_or_else(|| {
                LLMError::ConfigurationError {
                    message: "OPENAI_API_KEY is not set".to_string(),
                }
            })?),
            ProviderKind::Anthropic => {
                Arc::new(AnthropicProvider::from_env().ok_or_else(|| {
                    LLMError::ConfigurationError {
                        message: "ANTHROPIC_API_KEY is not set".to_string(),
                    }
                })?)
            }
        };

        tracing::debug!(provider = %kind, "LLM provider selected");
        Ok(Self { provider, kind })
    }

    /// Get the current provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get the provider kind
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Check if the provider is available
    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from_str("ollama"), Some(ProviderKind::Ollama));
        assert_eq!(
            ProviderKind::from_str("anthropic"),
            Some(ProviderKind::Anthropic)
        );
        assert_eq!(
            ProviderKind::from_str("claude"),
            Some(ProviderKind::Anthropic)
        );
        assert_eq!(ProviderKind::from_str("OpenAI"), Some(ProviderKind::OpenAI));
        assert_eq!(ProviderKind::from_str("unknown"), None);
    }

    #[test]
    fn test_local_providers_need_no_keys() {
        let router = LLMRouter::from_kind(ProviderKind::Ollama).unwrap();
        assert_eq!(router.kind(), ProviderKind::Ollama);
        assert_eq!(router.provider().name(), "Ollama");

        let router = LLMRouter::from_kind(ProviderKind::OpenAICompat).unwrap();
        assert_eq!(router.provider().name(), "OpenAI-Compatible");
    }

    #[test]
    fn test_missing_cloud_key_is_configuration_error() {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("ANTHROPIC_API_KEY");

        match LLMRouter::from_kind(ProviderKind::OpenAI) {
            Err(LLMError::ConfigurationError { message }) => {
                assert!(message.contains("OPENAI_API_KEY"))
            }
            Err(other) => panic!("expected ConfigurationError, got {:?}", other),
            Ok(_) => panic!("expected ConfigurationError, got a router"),
        }
        assert!(matches!(
            LLMRouter::from_kind(ProviderKind::Anthropic),
            Err(LLMError::ConfigurationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_explicit_openai_is_available_with_key() {
        let router = LLMRouter::new(Arc::new(OpenAIProvider::new(OpenAIConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
        })));
        assert!(router.is_available().await);
    }
}
