//! Proposal extraction from generated text
//!
//! Generated text is untrusted and rarely pure JSON: it may carry prose,
//! several fenced blocks, or a fence that was opened but never closed. The
//! parser narrows the text with an ordered list of [`ExtractionStrategy`]s,
//! each applied to the output of the previous one when it matches, then
//! decodes and validates what is left.
//!
//! 1. [`ExtractionStrategy::FencedBlock`]: first fenced block (optionally
//!    tagged `json`) whose body opens with `{`
//! 2. [`ExtractionStrategy::LeadingFence`]: text that starts with a fence
//!    marker has the leading and (if present) trailing marker stripped
//! 3. [`ExtractionStrategy::FirstObject`]: the first balanced `{...}`
//!
//! Only the first object is ever considered.

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::proposal::Proposal;

const FENCE: &str = "```";

/// Keys accepted for the free-text reasoning, in priority order
const RATIONALE_KEYS: [&str; 3] = ["rationale", "description", "reasoning"];

/// One narrowing step of the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    FencedBlock,
    LeadingFence,
    FirstObject,
}

impl ExtractionStrategy {
    /// Default pipeline order
    pub const ORDERED: [ExtractionStrategy; 3] =
        [Self::FencedBlock, Self::LeadingFence, Self::FirstObject];

    /// Apply this strategy alone. `None` means it did not match.
    pub fn apply(self, text: &str) -> Option<&str> {
        match self {
            Self::FencedBlock => fenced_object(text),
            Self::LeadingFence => strip_leading_fence(text),
            Self::FirstObject => first_object(text),
        }
    }
}

/// Extracts and validates a [`Proposal`] from generated text
#[derive(Debug, Clone)]
pub struct ResponseParser {
    strategies: Vec<ExtractionStrategy>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self {
            strategies: ExtractionStrategy::ORDERED.to_vec(),
        }
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser running only the given strategies, in the given order
    pub fn with_strategies(strategies: impl Into<Vec<ExtractionStrategy>>) -> Self {
        Self {
            strategies: strategies.into(),
        }
    }

    pub fn strategies(&self) -> &[ExtractionStrategy] {
        &self.strategies
    }

    /// Narrow `text` down to the candidate payload.
    pub fn extract<'a>(&self, text: &'a str) -> &'a str {
        let mut cleaned = text.trim();
        for strategy in &self.strategies {
            if let Some(narrowed) = strategy.apply(cleaned) {
                tracing::trace!(?strategy, "extraction strategy matched");
                cleaned = narrowed.trim();
            }
        }
        cleaned
    }

    /// Extract, decode and validate a proposal.
    pub fn parse(&self, text: &str) -> Result<Proposal, ParseError> {
        decode(self.extract(text))
    }
}

/// Decode a candidate payload into a [`Proposal`].
pub fn decode(candidate: &str) -> Result<Proposal, ParseError> {
    if !candidate.contains('{') {
        return Err(ParseError::new(candidate, "no brace-delimited payload found"));
    }

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| ParseError::new(candidate, format!("invalid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| ParseError::new(candidate, "payload is not a JSON object"))?;

    let licensing_cost = whole_number(object, "licensingCost", candidate)?;
    let royalties_percent = whole_number(object, "royaltiesPercent", candidate)?;
    if royalties_percent > 100 {
        return Err(ParseError::new(
            candidate,
            format!("royaltiesPercent {} is outside 0..=100", royalties_percent),
        ));
    }

    let rationale = RATIONALE_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    Ok(Proposal {
        licensing_cost,
        royalties_percent: royalties_percent as u8,
        rationale,
    })
}

/// Read a required non-negative number, rounding fractional values half away from zero.
fn whole_number(object: &Map<String, Value>, key: &str, candidate: &str) -> Result<u64, ParseError> {
    let value = object
        .get(key)
        .ok_or_else(|| ParseError::new(candidate, format!("missing field {}", key)))?;

    if let Some(n) = value.as_u64() {
        return Ok(n);
    }

    match value.as_f64() {
        // u64::MAX as f64 rounds up to 2^64, which is already out of range.
        Some(f) if f.is_finite() && f >= 0.0 && f.round() < u64::MAX as f64 => Ok(f.round() as u64),
        Some(f) if f.is_finite() && f >= 0.0 => Err(ParseError::new(
            candidate,
            format!("field {} is out of range: {}", key, f),
        )),
        Some(f) => Err(ParseError::new(
            candidate,
            format!("field {} must be a non-negative number, got {}", key, f),
        )),
        None => Err(ParseError::new(
            candidate,
            format!("field {} is not numeric", key),
        )),
    }
}

/// Strip an optional, case-insensitive `json` tag after a fence marker.
fn skip_json_tag(text: &str) -> &str {
    match text.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &text[4..],
        _ => text,
    }
}

fn fenced_object(text: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(found) = text[offset..].find(FENCE) {
        let body_start = offset + found + FENCE.len();
        let body = skip_json_tag(&text[body_start..]).trim_start();
        if body.starts_with('{') {
            if let Some(object) = first_object(body) {
                return Some(object);
            }
        }
        offset = body_start;
    }
    None
}

fn strip_leading_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    let rest = skip_json_tag(rest).trim();
    Some(rest.strip_suffix(FENCE).map(str::trim).unwrap_or(rest))
}

/// First `{...}` whose braces balance, ignoring braces inside JSON strings.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
