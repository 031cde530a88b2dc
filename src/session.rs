//! The orchestrating caller: owns state, store, and trend RNG.
//!
//! Load on start, reduce one event at a time, dispatch the reducer's
//! commands to logging, save on mutate. `&mut self` on every mutating call
//! keeps one mutation in flight per session.

use anyhow::Result;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::engine::events::{Command, Event, LogLevel, Timestamp};
use crate::engine::guard::{EmotionalState, RiskProfile, AUTHORIZATION_THRESHOLD};
use crate::engine::reducer::{reduce, ReducerConfig, ReducerOutput};
use crate::engine::split::SalarySplit;
use crate::engine::state::{AppState, DecisionLogEntry};
use crate::engine::trend::TrendSynthesizer;
use crate::logging::{self, Domain};
use crate::storage::StateStore;

pub struct Session {
    state: AppState,
    store: StateStore,
    synth: TrendSynthesizer<StdRng>,
    reducer_cfg: ReducerConfig,
    storage_key: String,
}

impl Session {
    pub fn open(cfg: &Config) -> Result<Self> {
        let store = StateStore::new(&cfg.sqlite_path)?;
        Self::with_store(cfg, store)
    }

    pub fn with_store(cfg: &Config, mut store: StateStore) -> Result<Self> {
        store.init()?;
        let state = match store.load(&cfg.storage_key)? {
            Some(mut state) => {
                let dropped = state.decisions.set_capacity(cfg.decision_log_capacity);
                let msg = format!(
                    "restored '{}' with {} decisions (capacity {}, dropped {})",
                    cfg.storage_key,
                    state.decisions.len(),
                    cfg.decision_log_capacity,
                    dropped
                );
                logging::log_message(LogLevel::Info, Domain::Storage, "loaded", &msg);
                state
            }
            None => AppState::with_log_capacity(cfg.decision_log_capacity),
        };
        let synth = match cfg.trend_seed {
            Some(seed) => TrendSynthesizer::seeded(seed),
            None => TrendSynthesizer::from_entropy(),
        };
        Ok(Self {
            state,
            store,
            synth,
            reducer_cfg: cfg.reducer_config(),
            storage_key: cfg.storage_key.clone(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn reducer_config(&self) -> &ReducerConfig {
        &self.reducer_cfg
    }

    pub fn trend_invocations(&self) -> u64 {
        self.synth.invocations()
    }

    /// Reduce one event, log its commands, and persist if state changed.
    pub fn apply(&mut self, event: Event) -> Result<ReducerOutput> {
        let name = event.name();
        let ts = event.timestamp();
        let out = reduce(&mut self.state, event, &self.reducer_cfg, &mut self.synth);

        let mut appended: Vec<DecisionLogEntry> = Vec::new();
        for cmd in &out.commands {
            match cmd {
                Command::Log { level, msg } => {
                    logging::log_message(*level, domain_for(name), name, msg);
                }
                Command::TrendSynthesized { assessment } => logging::log_trend(assessment),
                Command::Decision { entry } => {
                    logging::log_execution(entry);
                    appended.push(entry.clone());
                }
                Command::Persist => {}
            }
        }
        if let Some(result) = &out.guard {
            logging::log_guard_decision(result, AUTHORIZATION_THRESHOLD);
        }
        if matches!(name, "stage" | "reset_pulse" | "approve") {
            logging::log_transition(name, &self.state.pulse, out.state_hash);
        }

        if out.persisted() {
            let digest = self.store.save(&self.storage_key, ts, &self.state, &appended)?;
            logging::log_checkpoint(&self.storage_key, &digest, out.state_hash, self.state.decisions.len());
        }
        Ok(out)
    }

    pub fn stage(&mut self, ts: Timestamp, amount: Option<f64>) -> Result<ReducerOutput> {
        self.apply(Event::Stage { ts, amount })
    }

    pub fn approve(
        &mut self,
        ts: Timestamp,
        emotional_state: EmotionalState,
        reflection_started: Option<Timestamp>,
    ) -> Result<ReducerOutput> {
        self.apply(Event::Approve { ts, emotional_state, reflection_started })
    }

    pub fn break_streak(&mut self, ts: Timestamp) -> Result<ReducerOutput> {
        self.apply(Event::BreakStreak { ts })
    }

    pub fn reset_pulse(&mut self, ts: Timestamp) -> Result<ReducerOutput> {
        self.apply(Event::ResetPulse { ts })
    }

    pub fn set_salary(&mut self, ts: Timestamp, salary: f64) -> Result<ReducerOutput> {
        self.apply(Event::SetSalary { ts, salary })
    }

    pub fn set_risk_profile(&mut self, ts: Timestamp, profile: RiskProfile) -> Result<ReducerOutput> {
        self.apply(Event::SetRiskProfile { ts, profile })
    }

    pub fn set_split(&mut self, ts: Timestamp, split: SalarySplit) -> Result<ReducerOutput> {
        self.apply(Event::SetSplit { ts, split })
    }
}

fn domain_for(event: &str) -> Domain {
    match event {
        "stage" | "reset_pulse" => Domain::Pulse,
        "approve" | "break_streak" => Domain::Guard,
        _ => Domain::System,
    }
}
