//! Proposal, role and settlement types

use serde::{Deserialize, Serialize};

/// One role's offer for one round. Wire names follow the prompt contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Flat licensing cost in dollars
    pub licensing_cost: u64,
    /// Royalty percentage, 0..=100
    pub royalties_percent: u8,
    #[serde(default)]
    pub rationale: String,
}

impl Proposal {
    pub fn new(licensing_cost: u64, royalties_percent: u8, rationale: impl Into<String>) -> Self {
        Self {
            licensing_cost,
            royalties_percent,
            rationale: rationale.into(),
        }
    }
}

/// The two negotiating roles. Same output contract, different persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Artist-profile and song analyst
    A,
    /// Royalties negotiator
    B,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Self::A => "Agent A",
            Self::B => "Agent B",
        }
    }

    /// The other role
    pub fn peer(&self) -> Role {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// System persona sent with every call for this role
    pub fn persona(&self) -> &'static str {
        match self {
            Self::A => "You are Agent A, a music analysis expert.",
            Self::B => "You are Agent B, a royalties negotiation expert.",
        }
    }

    /// How the role is introduced in the user prompt
    pub fn expertise(&self) -> &'static str {
        match self {
            Self::A => {
                "widely considered the best analyzer when it comes to artists' profiles and songs"
            }
            Self::B => "widely considered the best royalties negotiator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The averaged outcome handed to downstream collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub licensing_cost: u64,
    pub royalties_percent: u8,
}

impl Settlement {
    /// Average both fields, rounding halves up.
    pub fn between(a: &Proposal, b: &Proposal) -> Self {
        Self {
            licensing_cost: midpoint_half_up(a.licensing_cost, b.licensing_cost),
            // Both inputs are <= 100, so the midpoint is too.
            royalties_percent: midpoint_half_up(
                u64::from(a.royalties_percent),
                u64::from(b.royalties_percent),
            ) as u8,
        }
    }
}

fn midpoint_half_up(a: u64, b: u64) -> u64 {
    ((u128::from(a) + u128::from(b) + 1) / 2) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_rounds_half_up() {
        let a = Proposal::new(100, 10, "");
        let b = Proposal::new(103, 11, "");

        let settlement = Settlement::between(&a, &b);

        assert_eq!(settlement.licensing_cost, 102);
        assert_eq!(settlement.royalties_percent, 11);
    }

    #[test]
    fn test_settlement_exact_midpoint() {
        let settlement = Settlement::between(&Proposal::new(400, 8, ""), &Proposal::new(600, 12, ""));
        assert_eq!(settlement, Settlement { licensing_cost: 500, royalties_percent: 10 });
    }

    #[test]
    fn test_settlement_no_overflow() {
        let a = Proposal::new(u64::MAX, 100, "");
        let settlement = Settlement::between(&a, &a);
        assert_eq!(settlement.licensing_cost, u64::MAX);
        assert_eq!(settlement.royalties_percent, 100);
    }

    #[test]
    fn test_proposal_wire_names() {
        let json = serde_json::to_value(Proposal::new(500, 12, "x")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"licensingCost": 500, "royaltiesPercent": 12, "rationale": "x"})
        );
    }

    #[test]
    fn test_role_peer() {
        assert_eq!(Role::A.peer(), Role::B);
        assert_eq!(Role::B.peer(), Role::A);
        assert_ne!(Role::A.persona(), Role::B.persona());
    }
}
