//! Convergence check between two proposals

use crate::proposal::Proposal;

/// Default tolerance, applied to both the dollar cost and the percentage.
pub const DEFAULT_TOLERANCE: u64 = 5;

/// True when both numeric fields differ by at most `tolerance`.
pub fn converged(a: &Proposal, b: &Proposal, tolerance: u64) -> bool {
    a.licensing_cost.abs_diff(b.licensing_cost) <= tolerance
        && u64::from(a.royalties_percent.abs_diff(b.royalties_percent)) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(cost: u64, royalty: u8) -> Proposal {
        Proposal::new(cost, royalty, "")
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(converged(&offer(100, 10), &offer(105, 10), DEFAULT_TOLERANCE));
        assert!(!converged(&offer(100, 10), &offer(106, 10), DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_royalty_alone_can_block() {
        assert!(!converged(&offer(100, 10), &offer(100, 16), DEFAULT_TOLERANCE));
        assert!(converged(&offer(100, 10), &offer(100, 15), DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_symmetric() {
        let samples = [offer(0, 0), offer(5, 5), offer(100, 10), offer(106, 17), offer(2000, 100)];
        for tolerance in [0, 1, 5, 50, u64::MAX] {
            for a in &samples {
                for b in &samples {
                    assert_eq!(converged(a, b, tolerance), converged(b, a, tolerance));
                }
            }
        }
    }

    #[test]
    fn test_zero_tolerance_requires_equality() {
        assert!(converged(&offer(100, 10), &offer(100, 10), 0));
        assert!(!converged(&offer(100, 10), &offer(101, 10), 0));
    }
}
