//! Triple Guard: composite authorization gate.
//!
//! Three independent guards, each a fixed mapping:
//!
//! | Guard       | Input                  | Score                                       |
//! |-------------|------------------------|---------------------------------------------|
//! | Emotional   | reported emotional state | calm 1.0, stressed/fomo 0.4               |
//! | Discipline  | streak active          | active 1.0, broken 0.5                      |
//! | Risk        | risk profile           | conservative 0.8, balanced 0.9, aggressive 1.0 |
//!
//! Weighted 0.4 / 0.3 / 0.3, rounded to two decimals, authorized at >= 0.75.
//! Aggressive profiles authorize more easily; that is product policy.
//!
//! ## Reflection cooldown
//!
//! A non-calm selection can start a caller-side reflection timer
//! ([`ReflectionCooldown`]). Whether a completed reflection substitutes for a
//! failed score is decided by the reducer's `reflection_override` policy, not
//! here: [`evaluate`] never looks at the timer.

use serde::{Deserialize, Serialize};

use super::round_to;

pub const AUTHORIZATION_THRESHOLD: f64 = 0.75;

pub const EMOTION_WEIGHT: f64 = 0.4;
pub const DISCIPLINE_WEIGHT: f64 = 0.3;
pub const RISK_WEIGHT: f64 = 0.3;

/// Default reflection delay for stressed/fomo selections.
pub const REFLECTION_MS: u64 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    Calm,
    Stressed,
    Fomo,
}

impl EmotionalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Calm => "calm",
            EmotionalState::Stressed => "stressed",
            EmotionalState::Fomo => "fomo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calm" => Some(EmotionalState::Calm),
            "stressed" => Some(EmotionalState::Stressed),
            "fomo" => Some(EmotionalState::Fomo),
            _ => None,
        }
    }

    /// Non-calm selections must reflect before they count as waited.
    pub fn needs_reflection(&self) -> bool {
        !matches!(self, EmotionalState::Calm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl RiskProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Some(RiskProfile::Conservative),
            "balanced" => Some(RiskProfile::Balanced),
            "aggressive" => Some(RiskProfile::Aggressive),
            _ => None,
        }
    }
}

/// Constructed fresh for each authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardInput {
    pub emotional_state: EmotionalState,
    pub discipline_streak_active: bool,
    pub risk_profile: RiskProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardResult {
    pub composite_score: f64,
    pub authorized: bool,
}

pub fn emotion_score(state: EmotionalState) -> f64 {
    match state {
        EmotionalState::Calm => 1.0,
        EmotionalState::Stressed | EmotionalState::Fomo => 0.4,
    }
}

pub fn discipline_score(streak_active: bool) -> f64 {
    if streak_active {
        1.0
    } else {
        0.5
    }
}

pub fn risk_score(profile: RiskProfile) -> f64 {
    match profile {
        RiskProfile::Conservative => 0.8,
        RiskProfile::Balanced => 0.9,
        RiskProfile::Aggressive => 1.0,
    }
}

/// Evaluate all three guards. Pure and idempotent.
pub fn evaluate(input: &GuardInput) -> GuardResult {
    let raw = emotion_score(input.emotional_state) * EMOTION_WEIGHT
        + discipline_score(input.discipline_streak_active) * DISCIPLINE_WEIGHT
        + risk_score(input.risk_profile) * RISK_WEIGHT;
    let composite_score = round_to(raw, 2);

    GuardResult {
        composite_score,
        authorized: composite_score >= AUTHORIZATION_THRESHOLD,
    }
}

/// Caller-side reflection timer for non-calm emotional selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionCooldown {
    pub duration_ms: u64,
    started_ms: Option<u64>,
    calm: bool,
}

impl ReflectionCooldown {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            started_ms: None,
            calm: false,
        }
    }

    /// Record a selection. Calm counts as waited immediately; any other
    /// selection restarts the timer from `now_ms`.
    pub fn begin(&mut self, state: EmotionalState, now_ms: u64) {
        if state.needs_reflection() {
            self.calm = false;
            self.started_ms = Some(now_ms);
        } else {
            self.calm = true;
            self.started_ms = None;
        }
    }

    /// Back out of the selection entirely.
    pub fn cancel(&mut self) {
        self.calm = false;
        self.started_ms = None;
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.started_ms {
            Some(start) => self.duration_ms.saturating_sub(now_ms.saturating_sub(start)),
            None if self.calm => 0,
            None => self.duration_ms,
        }
    }

    pub fn has_waited(&self, now_ms: u64) -> bool {
        self.calm || (self.started_ms.is_some() && self.remaining_ms(now_ms) == 0)
    }
}

impl Default for ReflectionCooldown {
    fn default() -> Self {
        Self::new(REFLECTION_MS)
    }
}
