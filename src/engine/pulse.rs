//! Quarterly Pulse: the staged-capital lifecycle.
//!
//! ```text
//!   advance        advance        advance
//! [1 staging] ──► [2 staging] ──► [3 staging] ──► [3 strike]
//!      ▲                                              │
//!      └──────────────── advance / reset ─────────────┘
//! ```
//!
//! `advance` while struck restarts the cycle instead of being a no-op, so
//! callers that want "stay struck" must check [`PulseState::is_strike`] first.

use serde::{Deserialize, Serialize};

use super::require_amount;

/// Staging horizon in periods.
pub const HORIZON: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulsePhase {
    Staging,
    Strike,
}

impl PulsePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PulsePhase::Staging => "staging",
            PulsePhase::Strike => "strike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseState {
    /// 1..=HORIZON
    pub period_index: u8,
    pub total_staged: f64,
    pub phase: PulsePhase,
}

/// Result of a single `advance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseTransition {
    pub state: PulseState,
    /// True only on the staging -> strike edge.
    pub crossed_to_strike: bool,
}

impl PulseState {
    pub fn initial() -> Self {
        Self {
            period_index: 1,
            total_staged: 0.0,
            phase: PulsePhase::Staging,
        }
    }

    pub fn is_strike(&self) -> bool {
        self.phase == PulsePhase::Strike
    }

    /// Stage one period's contribution.
    pub fn advance(&self, contribution: f64) -> PulseTransition {
        require_amount(contribution);

        if self.is_strike() {
            return PulseTransition {
                state: Self::initial(),
                crossed_to_strike: false,
            };
        }

        let next_index = self.period_index + 1;
        let total_staged = self.total_staged + contribution;
        assert!(
            total_staged.is_finite(),
            "staged total overflowed: {} + {}",
            self.total_staged,
            contribution
        );

        if next_index > HORIZON {
            PulseTransition {
                state: Self {
                    period_index: HORIZON,
                    total_staged,
                    phase: PulsePhase::Strike,
                },
                crossed_to_strike: true,
            }
        } else {
            PulseTransition {
                state: Self {
                    period_index: next_index,
                    total_staged,
                    phase: PulsePhase::Staging,
                },
                crossed_to_strike: false,
            }
        }
    }

    /// Unconditional return to the initial state (new cycle or abort).
    pub fn reset(&self) -> Self {
        Self::initial()
    }
}

impl Default for PulseState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_advances_reach_strike() {
        let p0 = PulseState::initial();

        let t1 = p0.advance(1000.0);
        assert_eq!(t1.state.period_index, 2);
        assert_eq!(t1.state.total_staged, 1000.0);
        assert_eq!(t1.state.phase, PulsePhase::Staging);
        assert!(!t1.crossed_to_strike);

        let t2 = t1.state.advance(1000.0);
        assert_eq!(t2.state.period_index, 3);
        assert_eq!(t2.state.total_staged, 2000.0);
        assert_eq!(t2.state.phase, PulsePhase::Staging);
        assert!(!t2.crossed_to_strike);

        let t3 = t2.state.advance(1000.0);
        assert_eq!(t3.state.period_index, 3);
        assert_eq!(t3.state.total_staged, 3000.0);
        assert_eq!(t3.state.phase, PulsePhase::Strike);
        assert!(t3.crossed_to_strike);
    }

    #[test]
    fn test_advance_while_struck_restarts() {
        let mut p = PulseState::initial();
        for _ in 0..3 {
            p = p.advance(500.0).state;
        }
        assert!(p.is_strike());

        for amount in [0.0, 1.0, 99_999.0] {
            let t = p.advance(amount);
            assert_eq!(t.state, PulseState::initial());
            assert!(!t.crossed_to_strike);
        }
    }

    #[test]
    fn test_total_never_decreases_within_cycle() {
        let mut p = PulseState::initial();
        let mut last = 0.0;
        for amount in [0.0, 250.0, 10.0] {
            p = p.advance(amount).state;
            assert!(p.total_staged >= last);
            last = p.total_staged;
        }
        assert!(p.is_strike());
    }

    #[test]
    fn test_reset_from_any_state() {
        let p = PulseState::initial().advance(700.0).state;
        assert_eq!(p.reset(), PulseState::initial());
    }

    #[test]
    #[should_panic]
    fn test_negative_contribution_fails_fast() {
        PulseState::initial().advance(-5.0);
    }

    #[test]
    #[should_panic(expected = "staged total overflowed")]
    fn test_advance_rejects_overflowing_total() {
        let p = PulseState::initial().advance(f64::MAX).state;
        p.advance(f64::MAX);
    }

}
