//! Execution: turn a struck pulse plus an authorized guard result into
//! holdings, a decision-log entry, and a fresh pulse.
//!
//! Precondition, not a runtime check: the guard result is authorized (or
//! the caller's reflection policy has overridden it). The orchestrator
//! trusts its caller the same way the reducer trusts the guard.

use super::events::Timestamp;
use super::guard::{EmotionalState, GuardResult};
use super::pulse::PulseState;
use super::split::ASSET_ALLOCATION;
use super::state::{AppState, DecisionLogEntry, Holdings, Outcome};
use super::trend::TrendAssessment;

/// Everything an execution changes, computed without touching state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Increment to add to holdings
    pub holdings_delta: Holdings,
    /// Liquid share of the staged capital; not tracked in holdings
    pub unallocated: f64,
    pub log_entry: DecisionLogEntry,
    pub next_pulse: PulseState,
}

/// Apportion the staged capital across the fixed allocation.
pub fn apportion(total_staged: f64) -> (Holdings, f64) {
    let pct = |p: u8| total_staged * f64::from(p) / 100.0;
    (
        Holdings {
            equity: pct(ASSET_ALLOCATION.equity),
            crypto: pct(ASSET_ALLOCATION.crypto),
            esg: pct(ASSET_ALLOCATION.esg),
        },
        pct(ASSET_ALLOCATION.liquid),
    )
}

pub fn execute(
    pulse: &PulseState,
    guard: &GuardResult,
    emotional_state: EmotionalState,
    trend: Option<&TrendAssessment>,
    ts: Timestamp,
) -> ExecutionOutcome {
    let (holdings_delta, unallocated) = apportion(pulse.total_staged);

    ExecutionOutcome {
        holdings_delta,
        unallocated,
        log_entry: DecisionLogEntry {
            timestamp: ts,
            emotional_state,
            composite_score: guard.composite_score,
            market_signal: trend.map(|t| t.entry_signal),
            outcome: Outcome::Executed,
        },
        next_pulse: pulse.reset(),
    }
}

/// Commit an execution to state. Returns the decision-log entry evicted to
/// make room, if any.
pub fn apply(state: &mut AppState, outcome: ExecutionOutcome) -> Option<DecisionLogEntry> {
    state.holdings.add(&outcome.holdings_delta);
    state.streak.increment();
    state.pulse = outcome.next_pulse;
    state.trend = None;
    state.decisions.push(outcome.log_entry)
}
