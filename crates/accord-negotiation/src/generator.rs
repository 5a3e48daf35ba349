//! Proposal generation
//!
//! A [`ProposalGenerator`] turns (role, shared context, peer proposal) into a
//! fresh [`Proposal`]. The LLM-backed implementation makes exactly one
//! outbound call per proposal and never retries.

use std::sync::Arc;

use accord_llm::{complete_text, LLMProvider, LLMRouter, TextOptions};
use async_trait::async_trait;

use crate::error::{NegotiationError, Result};
use crate::parser::ResponseParser;
use crate::proposal::{Proposal, Role};

/// Produces one proposal for a role.
#[async_trait]
pub trait ProposalGenerator: Send + Sync {
    async fn generate(
        &self,
        role: Role,
        context: &str,
        peer: Option<&Proposal>,
    ) -> Result<Proposal>;
}

/// Build the user prompt for `role`.
pub fn build_prompt(role: Role, context: &str, peer: Option<&Proposal>) -> String {
    let mut prompt = format!(
        "You are {}, {}. Based on the item description: \"{}\",",
        role.label(),
        role.expertise(),
        context
    );
    if let Some(peer) = peer {
        // Proposal serialization cannot fail: plain integers and a string.
        let peer_json = serde_json::to_string(peer).unwrap_or_default();
        prompt.push_str(&format!(
            " and considering the previous recommendation from {}: {},",
            role.peer().label(),
            peer_json
        ));
    }
    prompt.push_str(
        " generate a JSON object with the keys \"licensingCost\" (licensing cost in whole dollars), \
         \"royaltiesPercent\" (royalty percentage, 0-100) and \"rationale\" (a brief description \
         of your reasoning). Respond using markdown code fences containing valid JSON.",
    );
    prompt
}

/// [`ProposalGenerator`] backed by a text-generation provider
pub struct LlmProposalGenerator {
    provider: Arc<dyn LLMProvider>,
    parser: ResponseParser,
    options: TextOptions,
}

impl LlmProposalGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            parser: ResponseParser::default(),
            options: TextOptions::default(),
        }
    }

    pub fn from_router(router: &LLMRouter) -> Self {
        Self::new(router.provider().clone())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }
}

#[async_trait]
impl ProposalGenerator for LlmProposalGenerator {
    async fn generate(
        &self,
        role: Role,
        context: &str,
        peer: Option<&Proposal>,
    ) -> Result<Proposal> {
        let prompt = build_prompt(role, context, peer);
        let raw = complete_text(self.provider.as_ref(), role.persona(), &prompt, &self.options)
            .await
            .map_err(NegotiationError::Generation)?;

        tracing::debug!(role = %role, raw = %raw, "generation returned");

        self.parser.parse(&raw).map_err(|e| {
            tracing::warn!(role = %role, candidate = %e.candidate, "proposal parsing failed");
            NegotiationError::Parse(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_llm::{CompletionRequest, CompletionResponse, ProviderKind};
    use std::sync::Mutex;

    /// Keeps the last request and answers with a fixed proposal.
    #[derive(Default)]
    struct Recording {
        last: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl LLMProvider for Recording {
        fn name(&self) -> &'static str {
            "Recording"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAICompat
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> accord_llm::Result<CompletionResponse> {
            *self.last.lock().unwrap() = Some(request);
            Ok(CompletionResponse::new(
                r#"{"licensingCost": 700, "royaltiesPercent": 9}"#,
            ))
        }
    }

    #[tokio::test]
    async fn test_generate_sends_persona_prompt_and_overrides() {
        let provider = Arc::new(Recording::default());
        let generator = LlmProposalGenerator::new(provider.clone())
            .with_model("gpt-4o")
            .with_temperature(0.3);

        let peer = Proposal::new(500, 12, "");
        let proposal = generator
            .generate(Role::B, "song", Some(&peer))
            .await
            .unwrap();
        assert_eq!(proposal, Proposal::new(700, 9, ""));

        let request = provider.last.lock().unwrap().take().unwrap();
        assert_eq!(request.system.as_deref(), Some(Role::B.persona()));
        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(
            request.messages[0].content,
            build_prompt(Role::B, "song", Some(&peer))
        );
    }

    #[test]
    fn test_prompt_without_peer() {
        let prompt = build_prompt(Role::A, "monthly listeners = 100000", None);
        assert!(prompt.starts_with("You are Agent A"));
        assert!(prompt.contains("monthly listeners = 100000"));
        assert!(!prompt.contains("previous recommendation"));
        assert!(prompt.contains("licensingCost"));
        assert!(prompt.contains("code fences"));
    }

    #[test]
    fn test_prompt_with_peer_names_other_role() {
        let peer = Proposal::new(500, 12, "x");
        let prompt = build_prompt(Role::B, "song", Some(&peer));
        assert!(prompt.contains("previous recommendation from Agent A"));
        assert!(prompt.contains(r#""licensingCost":500"#));
    }
}
