//! Application state with deterministic hashing for replay validation.
//!
//! Everything the surrounding application persists lives here: pulse,
//! cached trend, holdings, discipline streak, decision log, and the salary
//! inputs that feed contributions. The reducer is the only writer.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::events::Timestamp;
use super::guard::{EmotionalState, RiskProfile};
use super::pulse::PulseState;
use super::split::SalarySplit;
use super::sustainability::MixEntry;
use super::tax::AssetClass;
use super::trend::{EntrySignal, TrendAssessment};

/// Decision-log retention when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Last logical time seen by the reducer
    pub now: Timestamp,
    /// Sequence number for determinism
    pub seq: u64,

    pub pulse: PulseState,
    /// Cached at the strike edge, cleared when the pulse resets
    pub trend: Option<TrendAssessment>,

    pub holdings: Holdings,
    pub streak: DisciplineStreak,
    pub decisions: DecisionLog,

    pub salary: Option<f64>,
    pub split: SalarySplit,
    pub risk_profile: Option<RiskProfile>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            now: 0,
            seq: 0,
            pulse: PulseState::initial(),
            trend: None,
            holdings: Holdings::default(),
            streak: DisciplineStreak::default(),
            decisions: DecisionLog::new(capacity),
            salary: None,
            split: SalarySplit::default(),
            risk_profile: None,
        }
    }

    /// Risk profile used by the guard when the user has not picked one.
    pub fn effective_risk_profile(&self) -> RiskProfile {
        self.risk_profile.unwrap_or_default()
    }

    /// False when any monetary field has overflowed. JSON has no encoding
    /// for non-finite floats, so such a state cannot be snapshotted.
    pub fn is_finite(&self) -> bool {
        self.pulse.total_staged.is_finite()
            && self.holdings.is_finite()
            && self.salary.map_or(true, f64::is_finite)
            && self.trend.map_or(true, |t| t.volatility.is_finite())
    }

    /// Compute deterministic state hash for replay validation
    pub fn hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut h = DefaultHasher::new();

        self.now.hash(&mut h);
        self.seq.hash(&mut h);

        // Monetary values quantized to avoid float comparison issues
        self.pulse.period_index.hash(&mut h);
        quantize(self.pulse.total_staged).hash(&mut h);
        self.pulse.phase.hash(&mut h);

        if let Some(t) = &self.trend {
            t.confidence.hash(&mut h);
            quantize(t.volatility).hash(&mut h);
            t.entry_signal.hash(&mut h);
        }

        quantize(self.holdings.equity).hash(&mut h);
        quantize(self.holdings.crypto).hash(&mut h);
        quantize(self.holdings.esg).hash(&mut h);

        self.streak.count.hash(&mut h);
        self.streak.last_blocked.hash(&mut h);

        self.decisions.len().hash(&mut h);
        if let Some(latest) = self.decisions.latest() {
            latest.timestamp.hash(&mut h);
            latest.outcome.hash(&mut h);
        }

        h.finish()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn quantize(v: f64) -> i64 {
    (v * 1e8) as i64
}

/// Invested amounts per asset class. Only ever incremented.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Holdings {
    pub equity: f64,
    pub crypto: f64,
    pub esg: f64,
}

impl Holdings {
    pub fn total(&self) -> f64 {
        self.equity + self.crypto + self.esg
    }

    pub fn get(&self, asset: AssetClass) -> f64 {
        match asset {
            AssetClass::Equity => self.equity,
            AssetClass::Crypto => self.crypto,
            AssetClass::Esg => self.esg,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.equity.is_finite() && self.crypto.is_finite() && self.esg.is_finite()
    }

    /// Sum with `delta`, or None if any class would overflow.
    pub fn checked_add(&self, delta: &Holdings) -> Option<Holdings> {
        let sum = Holdings {
            equity: self.equity + delta.equity,
            crypto: self.crypto + delta.crypto,
            esg: self.esg + delta.esg,
        };
        sum.is_finite().then_some(sum)
    }

    /// Additive merge. Panics on overflow; callers check with `checked_add`.
    pub fn add(&mut self, delta: &Holdings) {
        *self = self
            .checked_add(delta)
            .unwrap_or_else(|| panic!("holdings overflow adding {:?}", delta));
    }

    /// Current holdings expressed as allocation fractions.
    pub fn mix(&self) -> Vec<MixEntry> {
        let total = self.total();
        if total <= 0.0 {
            return Vec::new();
        }
        AssetClass::ALL
            .iter()
            .map(|&asset| MixEntry::new(asset, self.get(asset) / total))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisciplineStreak {
    pub count: u32,
    pub last_blocked: bool,
}

impl DisciplineStreak {
    pub fn is_active(&self) -> bool {
        !self.last_blocked
    }

    pub fn increment(&mut self) {
        self.count += 1;
        self.last_blocked = false;
    }

    pub fn mark_blocked(&mut self) {
        self.last_blocked = true;
    }

    pub fn break_streak(&mut self) {
        self.count = 0;
        self.last_blocked = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Executed,
    Blocked,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Executed => "Executed",
            Outcome::Blocked => "Blocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub timestamp: Timestamp,
    pub emotional_state: EmotionalState,
    pub composite_score: f64,
    /// None when no trend was synthesized for the cycle
    pub market_signal: Option<EntrySignal>,
    pub outcome: Outcome,
}

/// Append-only, newest-first. Oldest entries are evicted past `capacity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLog {
    capacity: usize,
    entries: VecDeque<DecisionLogEntry>,
}

impl DecisionLog {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "decision log capacity must be positive");
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    /// Prepend `entry`; returns the evicted entry if the log was full.
    pub fn push(&mut self, entry: DecisionLogEntry) -> Option<DecisionLogEntry> {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    pub fn latest(&self) -> Option<&DecisionLogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the retention bound, dropping the oldest entries that no
    /// longer fit. Returns how many were dropped.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        assert!(capacity > 0, "decision log capacity must be positive");
        self.capacity = capacity;
        let excess = self.entries.len().saturating_sub(capacity);
        self.entries.truncate(capacity);
        excess
    }
}
