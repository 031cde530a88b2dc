//! Events fed into the reducer and commands it emits.

use serde::{Deserialize, Serialize};

use super::guard::{EmotionalState, RiskProfile};
use super::split::SalarySplit;
use super::state::DecisionLogEntry;
use super::trend::TrendAssessment;

/// Milliseconds since epoch, supplied by the caller.
pub type Timestamp = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Stage one period's contribution. `None` derives it from salary and split.
    Stage { ts: Timestamp, amount: Option<f64> },
    /// Authorization attempt on a struck pulse.
    Approve {
        ts: Timestamp,
        emotional_state: EmotionalState,
        /// When the reflection cooldown for this selection began, if any
        reflection_started: Option<Timestamp>,
    },
    BreakStreak { ts: Timestamp },
    /// Abort the current cycle.
    ResetPulse { ts: Timestamp },
    SetSalary { ts: Timestamp, salary: f64 },
    SetRiskProfile { ts: Timestamp, profile: RiskProfile },
    SetSplit { ts: Timestamp, split: SalarySplit },
}

impl Event {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Event::Stage { ts, .. }
            | Event::Approve { ts, .. }
            | Event::BreakStreak { ts }
            | Event::ResetPulse { ts }
            | Event::SetSalary { ts, .. }
            | Event::SetRiskProfile { ts, .. }
            | Event::SetSplit { ts, .. } => *ts,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Stage { .. } => "stage",
            Event::Approve { .. } => "approve",
            Event::BreakStreak { .. } => "break_streak",
            Event::ResetPulse { .. } => "reset_pulse",
            Event::SetSalary { .. } => "set_salary",
            Event::SetRiskProfile { .. } => "set_risk_profile",
            Event::SetSplit { .. } => "set_split",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Log { level: LogLevel, msg: String },
    /// Staging -> strike edge crossed; assessment already cached in state.
    TrendSynthesized { assessment: TrendAssessment },
    /// A decision was appended to the log.
    Decision { entry: DecisionLogEntry },
    /// Persisted state changed and should be saved.
    Persist,
}
