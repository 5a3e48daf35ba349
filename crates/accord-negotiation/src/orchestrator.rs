//! Negotiation orchestrator
//!
//! ```text
//! Start -> RoundA -> RoundB -> CheckConverged -> Finalize -> Done
//!            ^                       |
//!            +------- NextRound -----+
//! ```
//!
//! Every negotiation runs at least one full A-then-B round. Hitting the round
//! budget without convergence still finalizes on the last pair; any
//! generation, parse or timeout error aborts with no settlement.

use std::future::Future;
use std::sync::Arc;

use accord_llm::{LLMError, LLMRouter};
use serde::{Deserialize, Serialize};

use crate::config::NegotiationConfig;
use crate::convergence::converged;
use crate::error::{NegotiationError, Result, TimeoutKind};
use crate::generator::{LlmProposalGenerator, ProposalGenerator};
use crate::proposal::{Proposal, Role, Settlement};
use crate::transcript::NegotiationTranscript;

/// Orchestrator state, updated once at the end of each round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiationState {
    round: u32,
    last_a: Option<Proposal>,
    last_b: Option<Proposal>,
    converged: bool,
}

impl NegotiationState {
    /// Completed rounds
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn last_a(&self) -> Option<&Proposal> {
        self.last_a.as_ref()
    }

    pub fn last_b(&self) -> Option<&Proposal> {
        self.last_b.as_ref()
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    fn end_round(&mut self, a: Proposal, b: Proposal, converged: bool) {
        self.round += 1;
        self.last_a = Some(a);
        self.last_b = Some(b);
        self.converged = converged;
    }
}

/// Internal phases. Data-carrying variants keep the freshly produced
/// proposals in hand, so finalizing without a full pair cannot be expressed.
enum Phase {
    Start,
    RoundA,
    RoundB { a: Proposal },
    CheckConverged { a: Proposal, b: Proposal },
    Finalize { a: Proposal, b: Proposal },
}

/// Result of a negotiation with its audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    pub settlement: Settlement,
    /// Full rounds performed
    pub rounds: u32,
    /// False when the round budget ran out first
    pub converged: bool,
    pub transcript: NegotiationTranscript,
}

/// Drives two roles toward agreement
pub struct Negotiator {
    generator: Arc<dyn ProposalGenerator>,
    config: NegotiationConfig,
}

impl Negotiator {
    pub fn new(generator: Arc<dyn ProposalGenerator>, config: NegotiationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { generator, config })
    }

    /// LLM-backed negotiator configured entirely from the environment
    pub fn from_env() -> Result<Self> {
        let config = NegotiationConfig::from_env()?;
        let router = LLMRouter::from_env().map_err(|e| match e {
            LLMError::ConfigurationError { message } => NegotiationError::config(message),
            other => NegotiationError::Generation(other),
        })?;
        Self::with_router(&router, config)
    }

    pub fn with_router(router: &LLMRouter, config: NegotiationConfig) -> Result<Self> {
        let mut generator =
            LlmProposalGenerator::from_router(router).with_temperature(config.temperature);
        if let Some(ref model) = config.model {
            generator = generator.with_model(model.clone());
        }
        Self::new(Arc::new(generator), config)
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Negotiate and return only the settlement.
    pub async fn negotiate_terms(&self, context: &str) -> Result<Settlement> {
        Ok(self.negotiate(context).await?.settlement)
    }

    /// Negotiate, returning the settlement together with the transcript.
    #[tracing::instrument(
        name = "negotiate",
        skip(self, context),
        fields(
            context_len = context.len(),
            max_rounds = self.config.max_rounds,
            tolerance = self.config.tolerance,
        )
    )]
    pub async fn negotiate(&self, context: &str) -> Result<NegotiationOutcome> {
        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run(context))
                .await
                .map_err(|_| {
                    tracing::warn!(?deadline, "negotiation deadline exceeded");
                    NegotiationError::Timeout {
                        kind: TimeoutKind::Deadline,
                        after: deadline,
                    }
                })?,
            None => self.run(context).await,
        }
    }

    async fn run(&self, context: &str) -> Result<NegotiationOutcome> {
        let mut state = NegotiationState::default();
        let mut transcript = NegotiationTranscript::new(context);
        let mut phase = Phase::Start;

        let settlement = loop {
            phase = match phase {
                Phase::Start => Phase::RoundA,
                Phase::RoundA => {
                    let a = self.propose(Role::A, context, state.last_b()).await?;
                    Phase::RoundB { a }
                }
                Phase::RoundB { a } => {
                    let b = self.propose(Role::B, context, Some(&a)).await?;
                    Phase::CheckConverged { a, b }
                }
                Phase::CheckConverged { a, b } => {
                    let agreed = converged(&a, &b, self.config.tolerance);
                    state.end_round(a.clone(), b.clone(), agreed);
                    transcript.record(a.clone(), b.clone(), agreed);

                    tracing::info!(
                        round = state.round(),
                        a_cost = a.licensing_cost,
                        a_royalty = a.royalties_percent,
                        b_cost = b.licensing_cost,
                        b_royalty = b.royalties_percent,
                        converged = agreed,
                        "round complete"
                    );

                    if agreed {
                        Phase::Finalize { a, b }
                    } else if state.round() >= self.config.max_rounds {
                        tracing::warn!(
                            rounds = state.round(),
                            "round budget exhausted without convergence, settling on last pair"
                        );
                        Phase::Finalize { a, b }
                    } else {
                        Phase::RoundA
                    }
                }
                Phase::Finalize { a, b } => break Settlement::between(&a, &b),
            };
        };

        tracing::info!(
            licensing_cost = settlement.licensing_cost,
            royalties_percent = settlement.royalties_percent,
            rounds = state.round(),
            converged = state.converged(),
            "negotiation settled"
        );

        Ok(NegotiationOutcome {
            settlement,
            rounds: state.round(),
            converged: state.converged(),
            transcript,
        })
    }

    async fn propose(&self, role: Role, context: &str, peer: Option<&Proposal>) -> Result<Proposal> {
        tracing::debug!(role = %role, has_peer = peer.is_some(), "requesting proposal");
        with_call_timeout(
            self.config.call_timeout,
            self.generator.generate(role, context, peer),
        )
        .await
    }
}

async fn with_call_timeout<F>(limit: Option<std::time::Duration>, call: F) -> Result<Proposal>
where
    F: Future<Output = Result<Proposal>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| NegotiationError::Timeout {
                kind: TimeoutKind::Call,
                after: limit,
            })?,
        None => call.await,
    }
}

/// Negotiate terms for `context` with a negotiator built from the environment.
pub async fn negotiate_terms(context: &str) -> Result<Settlement> {
    Negotiator::from_env()?.negotiate_terms(context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Role A always offers `a`, role B always offers `b`.
    struct Fixed {
        a: Proposal,
        b: Proposal,
    }

    #[async_trait]
    impl ProposalGenerator for Fixed {
        async fn generate(&self, role: Role, _: &str, _: Option<&Proposal>) -> Result<Proposal> {
            Ok(match role {
                Role::A => self.a.clone(),
                Role::B => self.b.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_immediate_convergence_takes_one_round() {
        let negotiator = Negotiator::new(
            Arc::new(Fixed {
                a: Proposal::new(100, 10, ""),
                b: Proposal::new(103, 11, ""),
            }),
            NegotiationConfig::default(),
        )
        .unwrap();

        let outcome = negotiator.negotiate("song").await.unwrap();

        assert_eq!(outcome.rounds, 1);
        assert!(outcome.converged);
        assert_eq!(
            outcome.settlement,
            Settlement {
                licensing_cost: 102,
                royalties_percent: 11
            }
        );
    }

    #[tokio::test]
    async fn test_state_end_round() {
        let mut state = NegotiationState::default();
        assert_eq!(state.round(), 0);
        assert!(state.last_a().is_none() && state.last_b().is_none());

        state.end_round(Proposal::new(1, 1, ""), Proposal::new(9, 9, ""), false);
        assert_eq!(state.round(), 1);
        assert_eq!(state.last_b().map(|p| p.licensing_cost), Some(9));
        assert!(!state.converged());
    }

    #[test]
    fn test_zero_round_config_rejected() {
        let result = Negotiator::new(
            Arc::new(Fixed {
                a: Proposal::new(1, 1, ""),
                b: Proposal::new(1, 1, ""),
            }),
            NegotiationConfig::default().with_max_rounds(0),
        );
        assert!(matches!(result, Err(NegotiationError::Config { .. })));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        std::env::set_var("ACCORD_LLM_PROVIDER", "carrier-pigeon");
        let result = Negotiator::from_env();
        std::env::remove_var("ACCORD_LLM_PROVIDER");

        match result {
            Err(NegotiationError::Config { message }) => {
                assert!(message.contains("carrier-pigeon"))
            }
            Err(other) => panic!("expected Config error, got {:?}", other),
            Ok(_) => panic!("expected Config error, got a negotiator"),
        }
    }
}
