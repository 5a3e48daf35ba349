//! Accord LLM - text-generation capability used by the negotiation core
//!
//! One trait, [`LLMProvider`], fronts every backend:
//!
//! ## Local Providers (no API keys required)
//! - Ollama: `http://localhost:11434`
//! - OpenAI-compatible: vLLM, llama.cpp, etc.
//!
//! ## Cloud Providers
//! - OpenAI (default, `gpt-4o-mini`)
//! - Anthropic (Claude)
//!
//! Providers return raw text only. Turning that text into a structured
//! proposal is the caller's job; nothing here retries or falls back.

pub mod providers;
pub mod router;
pub mod types;

pub use providers::*;
pub use router::*;
pub use types::*;
