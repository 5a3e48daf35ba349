//! Text-generation provider implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Trait for text-generation providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Get the provider kind
    fn kind(&self) -> ProviderKind;

    /// Check if the provider is reachable / configured
    async fn is_available(&self) -> bool;

    /// Complete a conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// `complete(system_persona, user_prompt) -> raw_text` over any provider.
///
/// Unset fields in `options` fall back to the provider's own defaults.
pub async fn complete_text(
    provider: &dyn LLMProvider,
    system_persona: &str,
    user_prompt: &str,
    options: &TextOptions,
) -> Result<String> {
    let mut request =
        CompletionRequest::new(vec![Message::user(user_prompt)]).with_system(system_persona);
    if let Some(ref model) = options.model {
        request = request.with_model(model.clone());
    }
    if let Some(temperature) = options.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    Ok(provider.complete(request).await?.content)
}

/// Map a non-success HTTP response onto an [`LLMError`].
async fn error_for_status(response: reqwest::Response) -> LLMError {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_seconds = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        return LLMError::RateLimited {
            retry_after_seconds,
        };
    }
    let body = response.text().await.unwrap_or_default();
    LLMError::RequestFailed {
        message: format!("HTTP {}: {}", status, body),
    }
}

fn network_error(e: reqwest::Error) -> LLMError {
    LLMError::NetworkError {
        message: e.to_string(),
    }
}

fn invalid_response(e: reqwest::Error) -> LLMError {
    LLMError::InvalidResponse {
        message: e.to_string(),
    }
}

// ============================================================================
// Ollama Provider (Local)
// ============================================================================

/// Configuration for Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ACCORD_OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("ACCORD_OLLAMA_MODEL")
                .unwrap_or_else(|_| "llama3.1:8b".to_string()),
        }
    }
}

/// Ollama local LLM provider
pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(OllamaConfig::default())
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let prompt = request
            .messages
            .iter()
            .map(|m| match m.role {
                MessageRole::User => format!("User: {}", m.content),
                MessageRole::Assistant => format!("Assistant: {}", m.content),
                MessageRole::System => format!("System: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
            + "\n\nAssistant:";

        let model = request.model.unwrap_or_else(|| self.config.model.clone());
        let ollama_request = OllamaRequest {
            model: model.clone(),
            prompt,
            stream: false,
            system: request.system,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(invalid_response)?;

        Ok(CompletionResponse {
            content: ollama_response.response.trim().to_string(),
            usage: TokenUsage::default(),
            model: Some(model),
        })
    }
}

// ============================================================================
// Chat-completions wire format (OpenAI and compatible servers)
// ============================================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl ChatRequest {
    fn from_completion(request: CompletionRequest, default_model: &str) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system),
            });
        }
        messages.extend(request.messages.into_iter().map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: Some(m.content),
        }));

        Self {
            model: request.model.unwrap_or_else(|| default_model.to_string()),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }
}

async fn send_chat(
    request: reqwest::RequestBuilder,
    chat_request: &ChatRequest,
) -> Result<CompletionResponse> {
    let response = request
        .json(chat_request)
        .send()
        .await
        .map_err(network_error)?;

    if !response.status().is_success() {
        return Err(error_for_status(response).await);
    }

    let chat_response: ChatResponse = response.json().await.map_err(invalid_response)?;

    // An empty choice list is passed through as empty text; the caller's parser rejects it.
    let content = chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    let usage = chat_response.usage.unwrap_or_default();

    Ok(CompletionResponse {
        content,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
        model: Some(chat_request.model.clone()),
    })
}

// ============================================================================
// OpenAI-Compatible Provider
// ============================================================================

/// Configuration for OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for OpenAICompatConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ACCORD_OPENAI_COMPAT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/v1".to_string()),
            api_key: std::env::var("ACCORD_OPENAI_COMPAT_API_KEY").ok(),
            model: std::env::var("ACCORD_OPENAI_COMPAT_MODEL")
                .unwrap_or_else(|_| "default".to_string()),
        }
    }
}

/// OpenAI-compatible API provider (vLLM, llama.cpp, etc.)
pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(config: OpenAICompatConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(OpenAICompatConfig::default())
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatProvider {
    fn name(&self) -> &'static str {
        "OpenAI-Compatible"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAICompat
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.base_url);
        let mut req = self.client.get(&url);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }
        req.send().await.is_ok()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let chat_request = ChatRequest::from_completion(request, &self.config.model);

        let url = format!("{}/chat/completions", self.config.base_url);
        let mut req = self.client.post(&url);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }

        send_chat(req, &chat_request).await
    }
}

// ============================================================================
// OpenAI Provider
// ============================================================================

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
}

impl OpenAIConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_key: std::env::var("OPENAI_API_KEY").ok()?,
            model: std::env::var("ACCORD_OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        })
    }
}

/// OpenAI API provider
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        Some(Self::new(OpenAIConfig::from_env()?))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let chat_request = ChatRequest::from_completion(request, &self.config.model);
        let req = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.config.api_key);

        send_chat(req, &chat_request).await
    }
}

// ============================================================================
// Anthropic Provider
// ============================================================================

/// Configuration for Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
}

impl AnthropicConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok()?,
            model: std::env::var("ACCORD_ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string()),
        })
    }
}

/// Anthropic Claude API provider
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        Some(Self::new(AnthropicConfig::from_env()?))
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "Anthropic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let messages = request
            .messages
            .iter()
            .filter_map(|msg| {
                let role = match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    // System goes in the top-level field
                    MessageRole::System => return None,
                };
                Some(AnthropicMessage {
                    role,
                    content: msg.content.clone(),
                })
            })
            .collect();

        let model = request.model.unwrap_or_else(|| self.config.model.clone());
        let anthropic_request = AnthropicRequest {
            model: model.clone(),
            max_tokens: request.max_tokens.unwrap_or(1024),
            system: request.system,
            temperature: request.temperature,
            messages,
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        let anthropic_response: AnthropicResponse =
            response.json().await.map_err(invalid_response)?;

        let content = anthropic_response
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: anthropic_response.usage.input_tokens,
                completion_tokens: anthropic_response.usage.output_tokens,
                total_tokens: anthropic_response.usage.input_tokens
                    + anthropic_response.usage.output_tokens,
            },
            model: Some(model),
        })
    }
}
