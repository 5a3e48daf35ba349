//! Per-round negotiation transcript for audit and display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proposal::Proposal;

/// Both proposals of one completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number
    pub round: u32,
    pub role_a: Proposal,
    pub role_b: Proposal,
    pub converged: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationTranscript {
    pub context: String,
    pub started_at: DateTime<Utc>,
    pub rounds: Vec<RoundRecord>,
}

impl NegotiationTranscript {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            started_at: Utc::now(),
            rounds: Vec::new(),
        }
    }

    pub fn record(&mut self, role_a: Proposal, role_b: Proposal, converged: bool) {
        self.rounds.push(RoundRecord {
            round: self.rounds.len() as u32 + 1,
            role_a,
            role_b,
            converged,
            recorded_at: Utc::now(),
        });
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    /// Same proposals in the same order, ignoring timestamps.
    pub fn same_exchange_as(&self, other: &NegotiationTranscript) -> bool {
        self.rounds.len() == other.rounds.len()
            && self.rounds.iter().zip(other.rounds.iter()).all(|(a, b)| {
                a.role_a == b.role_a && a.role_b == b.role_b && a.converged == b.converged
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_numbered_from_one() {
        let mut transcript = NegotiationTranscript::new("song");
        transcript.record(Proposal::new(1, 1, ""), Proposal::new(2, 2, ""), false);
        transcript.record(Proposal::new(3, 3, ""), Proposal::new(3, 3, ""), true);

        assert_eq!(transcript.rounds[0].round, 1);
        assert_eq!(transcript.last().map(|r| r.round), Some(2));
        assert!(transcript.last().unwrap().converged);
    }

    #[test]
    fn test_same_exchange_ignores_time() {
        let mut a = NegotiationTranscript::new("song");
        let mut b = NegotiationTranscript::new("song");
        a.record(Proposal::new(1, 1, "r"), Proposal::new(2, 2, "s"), false);
        b.record(Proposal::new(1, 1, "r"), Proposal::new(2, 2, "s"), false);
        assert!(a.same_exchange_as(&b));

        b.record(Proposal::new(2, 2, ""), Proposal::new(2, 2, ""), true);
        assert!(!a.same_exchange_as(&b));
    }
}
