//! Accord Negotiation - two-role licensing negotiation
//!
//! Two roles exchange proposals for a flat licensing cost and a royalty
//! percentage until their latest offers converge or the round budget runs
//! out, then the last pair is averaged into a [`Settlement`].
//!
//! - [`ResponseParser`]: pulls a [`Proposal`] out of noisy generated text
//! - [`ProposalGenerator`]: produces one proposal for a [`Role`]
//! - [`converged`]: tolerance check between two proposals
//! - [`Negotiator`]: drives the rounds and finalizes
//!
//! ```no_run
//! # async fn run() -> accord_negotiation::Result<()> {
//! let settlement = accord_negotiation::negotiate_terms(
//!     "this song is great, monthly listeners = 100000",
//! )
//! .await?;
//! println!("{} / {}%", settlement.licensing_cost, settlement.royalties_percent);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convergence;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod parser;
pub mod proposal;
pub mod transcript;

pub use config::NegotiationConfig;
pub use convergence::{converged, DEFAULT_TOLERANCE};
pub use error::{NegotiationError, ParseError, Result, TimeoutKind};
pub use generator::{build_prompt, LlmProposalGenerator, ProposalGenerator};
pub use orchestrator::{negotiate_terms, NegotiationOutcome, NegotiationState, Negotiator};
pub use parser::{ExtractionStrategy, ResponseParser};
pub use proposal::{Proposal, Role, Settlement};
pub use transcript::{NegotiationTranscript, RoundRecord};
