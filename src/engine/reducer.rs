//! Pure reducer: (State, Event) -> (State, Vec<Command>)
//!
//! All state transitions happen here. The only impurity is the trend RNG,
//! which is injected and consulted exactly once per staging -> strike edge.
//!
//! ## Flow
//!
//! | Event      | Effect                                                        |
//! |------------|---------------------------------------------------------------|
//! | `Stage`    | advance the pulse; on the strike edge synthesize and cache a trend |
//! | `Approve`  | evaluate the guard; execute on pass, log `Blocked` on fail    |
//! | `BreakStreak` | reset the discipline streak                                |
//! | `ResetPulse`  | abort the cycle and drop the cached trend                  |
//!
//! Approve is refused outright unless the pulse is struck.

use rand::Rng;

use super::events::*;
use super::guard::{
    evaluate, EmotionalState, GuardInput, GuardResult, AUTHORIZATION_THRESHOLD, REFLECTION_MS,
};
use super::orchestrator;
use super::split::monthly_contribution;
use super::state::*;
use super::trend::TrendSynthesizer;
use super::require_amount;

/// Configuration for the reducer
#[derive(Debug, Clone)]
pub struct ReducerConfig {
    /// A completed reflection cooldown on a non-calm selection authorizes
    /// execution even when the composite score is below threshold.
    pub reflection_override: bool,
    /// Minimum gap between `reflection_started` and the approval timestamp
    /// before the override applies
    pub reflection_ms: u64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            reflection_override: false,
            reflection_ms: REFLECTION_MS,
        }
    }
}

/// Result of processing an event
#[derive(Debug)]
pub struct ReducerOutput {
    pub commands: Vec<Command>,
    /// Set for approval attempts that reached the guard
    pub guard: Option<GuardResult>,
    pub state_hash: u64,
}

impl ReducerOutput {
    pub fn persisted(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::Persist))
    }

    pub fn decision(&self) -> Option<&DecisionLogEntry> {
        self.commands.iter().find_map(|c| match c {
            Command::Decision { entry } => Some(entry),
            _ => None,
        })
    }
}

/// Pure reducer function
pub fn reduce<R: Rng>(
    state: &mut AppState,
    event: Event,
    cfg: &ReducerConfig,
    trend: &mut TrendSynthesizer<R>,
) -> ReducerOutput {
    let mut commands = Vec::new();
    let mut guard = None;

    // Update logical time
    state.now = state.now.max(event.timestamp());
    state.seq += 1;

    match event {
        Event::Stage { amount, .. } => {
            handle_stage(state, amount, trend, &mut commands);
        }
        Event::Approve { ts, emotional_state, reflection_started } => {
            let reflected = reflection_started
                .map_or(false, |start| ts.saturating_sub(start) >= cfg.reflection_ms);
            guard = handle_approve(state, ts, emotional_state, reflected, cfg, &mut commands);
        }
        Event::BreakStreak { .. } => {
            let previous = state.streak.count;
            state.streak.break_streak();
            commands.push(Command::Log {
                level: LogLevel::Warn,
                msg: format!("streak broken after {} executions", previous),
            });
            commands.push(Command::Persist);
        }
        Event::ResetPulse { .. } => {
            state.pulse = state.pulse.reset();
            state.trend = None;
            commands.push(Command::Log {
                level: LogLevel::Info,
                msg: "pulse reset".to_string(),
            });
            commands.push(Command::Persist);
        }
        Event::SetSalary { salary, .. } => {
            require_amount(salary);
            state.salary = Some(salary);
            commands.push(Command::Persist);
        }
        Event::SetRiskProfile { profile, .. } => {
            state.risk_profile = Some(profile);
            commands.push(Command::Persist);
        }
        Event::SetSplit { split, .. } => {
            state.split = split;
            commands.push(Command::Persist);
        }
    }

    ReducerOutput {
        commands,
        guard,
        state_hash: state.hash(),
    }
}

fn handle_stage<R: Rng>(
    state: &mut AppState,
    amount: Option<f64>,
    trend: &mut TrendSynthesizer<R>,
    commands: &mut Vec<Command>,
) {
    let contribution = match amount {
        Some(a) => a,
        None => {
            if state.salary.is_none() {
                commands.push(Command::Log {
                    level: LogLevel::Warn,
                    msg: "no salary set; staging a zero contribution".to_string(),
                });
            }
            monthly_contribution(state.salary.unwrap_or(0.0), &state.split)
        }
    };

    let restarted = state.pulse.is_strike();
    if !restarted && !(state.pulse.total_staged + contribution).is_finite() {
        commands.push(Command::Log {
            level: LogLevel::Error,
            msg: format!(
                "contribution {} rejected: staged total {} would overflow",
                contribution, state.pulse.total_staged
            ),
        });
        return;
    }
    let transition = state.pulse.advance(contribution);
    state.pulse = transition.state;

    if restarted {
        state.trend = None;
        commands.push(Command::Log {
            level: LogLevel::Info,
            msg: "advance on struck pulse: new cycle started".to_string(),
        });
    } else {
        commands.push(Command::Log {
            level: LogLevel::Info,
            msg: format!(
                "staged {:.2}: period {} total {:.2} {}",
                contribution,
                state.pulse.period_index,
                state.pulse.total_staged,
                state.pulse.phase.as_str()
            ),
        });
    }

    if transition.crossed_to_strike {
        let assessment = trend.synthesize();
        state.trend = Some(assessment);
        commands.push(Command::TrendSynthesized { assessment });
    }

    commands.push(Command::Persist);
}

fn handle_approve(
    state: &mut AppState,
    ts: Timestamp,
    emotional_state: EmotionalState,
    reflected: bool,
    cfg: &ReducerConfig,
    commands: &mut Vec<Command>,
) -> Option<GuardResult> {
    if !state.pulse.is_strike() {
        commands.push(Command::Log {
            level: LogLevel::Warn,
            msg: format!(
                "approval refused: pulse still staging (period {})",
                state.pulse.period_index
            ),
        });
        return None;
    }

    let (delta, _) = orchestrator::apportion(state.pulse.total_staged);
    if state.holdings.checked_add(&delta).is_none() {
        commands.push(Command::Log {
            level: LogLevel::Error,
            msg: format!(
                "approval refused: holdings would overflow adding {:.2}",
                state.pulse.total_staged
            ),
        });
        return None;
    }

    let input = GuardInput {
        emotional_state,
        discipline_streak_active: state.streak.is_active(),
        risk_profile: state.effective_risk_profile(),
    };
    let result = evaluate(&input);

    let overridden = !result.authorized
        && cfg.reflection_override
        && reflected
        && emotional_state.needs_reflection();

    if result.authorized || overridden {
        let staged = state.pulse.total_staged;
        let outcome = orchestrator::execute(
            &state.pulse,
            &result,
            emotional_state,
            state.trend.as_ref(),
            ts,
        );
        let entry = outcome.log_entry.clone();
        let evicted = orchestrator::apply(state, outcome);

        commands.push(Command::Log {
            level: LogLevel::Info,
            msg: format!(
                "executed {:.2} score={:.2}{} streak={}",
                staged,
                result.composite_score,
                if overridden { " (reflection override)" } else { "" },
                state.streak.count
            ),
        });
        if let Some(old) = evicted {
            commands.push(Command::Log {
                level: LogLevel::Debug,
                msg: format!("decision log full; evicted entry at {}", old.timestamp),
            });
        }
        commands.push(Command::Decision { entry });
    } else {
        let entry = DecisionLogEntry {
            timestamp: ts,
            emotional_state,
            composite_score: result.composite_score,
            market_signal: state.trend.map(|t| t.entry_signal),
            outcome: Outcome::Blocked,
        };
        state.decisions.push(entry.clone());
        state.streak.mark_blocked();

        commands.push(Command::Log {
            level: LogLevel::Warn,
            msg: format!(
                "blocked: score {:.2} below {:.2}",
                result.composite_score,
                AUTHORIZATION_THRESHOLD
            ),
        });
        commands.push(Command::Decision { entry });
    }

    commands.push(Command::Persist);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::guard::RiskProfile;
    use crate::engine::pulse::{PulsePhase, PulseState};

    fn stage(state: &mut AppState, synth: &mut TrendSynthesizer<rand::rngs::StdRng>, amount: f64) -> ReducerOutput {
        let ts = state.now + 1;
        reduce(state, Event::Stage { ts, amount: Some(amount) }, &ReducerConfig::default(), synth)
    }

    fn strike(state: &mut AppState, synth: &mut TrendSynthesizer<rand::rngs::StdRng>, amount: f64) {
        for _ in 0..3 {
            stage(state, synth, amount);
        }
        assert!(state.pulse.is_strike());
    }

    #[test]
    fn test_trend_only_on_strike_edge() {
        let mut state = AppState::new();
        let mut synth = TrendSynthesizer::seeded(1);

        let out = stage(&mut state, &mut synth, 1000.0);
        assert!(!out.commands.iter().any(|c| matches!(c, Command::TrendSynthesized { .. })));
        stage(&mut state, &mut synth, 1000.0);
        assert_eq!(synth.invocations(), 0);
        assert!(state.trend.is_none());

        let out = stage(&mut state, &mut synth, 1000.0);
        assert!(out.commands.iter().any(|c| matches!(c, Command::TrendSynthesized { .. })));
        assert_eq!(synth.invocations(), 1);
        assert!(state.trend.is_some());
        assert_eq!(state.pulse.total_staged, 3000.0);
    }

    #[test]
    fn test_stage_on_strike_restarts_and_clears_trend() {
        let mut state = AppState::new();
        let mut synth = TrendSynthesizer::seeded(2);
        strike(&mut state, &mut synth, 100.0);

        stage(&mut state, &mut synth, 5000.0);
        assert_eq!(state.pulse, PulseState::initial());
        assert!(state.trend.is_none());
        assert_eq!(synth.invocations(), 1);
    }

    #[test]
    fn test_stage_without_amount_uses_salary_split() {
        let mut state = AppState::new();
        let mut synth = TrendSynthesizer::seeded(3);
        let cfg = ReducerConfig::default();
        reduce(&mut state, Event::SetSalary { ts: 1, salary: 50_000.0 }, &cfg, &mut synth);
        reduce(&mut state, Event::Stage { ts: 2, amount: None }, &cfg, &mut synth);
        assert_eq!(state.pulse.total_staged, 10_000.0);
    }

    #[test]
    fn test_approve_refused_while_staging() {
        let mut state = AppState::new();
        let mut synth = TrendSynthesizer::seeded(4);
        stage(&mut state, &mut synth, 1000.0);
        let before = state.clone();

        let out = reduce(
            &mut state,
            Event::Approve { ts: 10, emotional_state: EmotionalState::Calm, reflection_started: None },
            &ReducerConfig::default(),
            &mut synth,
        );
        assert!(out.guard.is_none());
        assert!(!out.persisted());
        assert_eq!(state.pulse, before.pulse);
        assert!(state.decisions.is_empty());
    }

    #[test]
    fn test_authorized_approval_executes() {
        let mut state = AppState::new();
        state.risk_profile = Some(RiskProfile::Aggressive);
        let mut synth = TrendSynthesizer::seeded(5);
        strike(&mut state, &mut synth, 10_000.0 / 3.0);
        state.pulse.total_staged = 10_000.0;

        let out = reduce(
            &mut state,
            Event::Approve { ts: 99, emotional_state: EmotionalState::Calm, reflection_started: None },
            &ReducerConfig::default(),
            &mut synth,
        );
        let guard = out.guard.unwrap();
        assert_eq!(guard.composite_score, 1.0);
        assert_eq!(out.decision().unwrap().outcome, Outcome::Executed);
        assert_eq!(state.holdings, Holdings { equity: 4000.0, crypto: 2500.0, esg: 2000.0 });
        assert_eq!(state.streak.count, 1);
        assert_eq!(state.pulse.phase, PulsePhase::Staging);
        assert!(state.trend.is_none());
    }

    #[test]
    fn test_blocked_approval_marks_streak() {
        let mut state = AppState::new();
        state.risk_profile = Some(RiskProfile::Conservative);
        state.streak.count = 4;
        let mut synth = TrendSynthesizer::seeded(6);
        strike(&mut state, &mut synth, 1000.0);

        let out = reduce(
            &mut state,
            Event::Approve { ts: 50, emotional_state: EmotionalState::Stressed, reflection_started: Some(0) },
            &ReducerConfig::default(),
            &mut synth,
        );
        assert!(!out.guard.unwrap().authorized);
        assert_eq!(out.decision().unwrap().outcome, Outcome::Blocked);
        assert_eq!(state.holdings, Holdings::default());
        assert!(state.pulse.is_strike());
        assert!(!state.streak.is_active());
        assert_eq!(state.streak.count, 4);
        assert!(state.trend.is_some());
    }

    #[test]
    fn test_reflection_override_is_opt_in() {
        let cfg = ReducerConfig { reflection_override: true, ..Default::default() };
        let mut state = AppState::new();
        state.risk_profile = Some(RiskProfile::Conservative);
        let mut synth = TrendSynthesizer::seeded(7);
        strike(&mut state, &mut synth, 1000.0);

        // No reflection at all: still blocked.
        let out = reduce(
            &mut state,
            Event::Approve { ts: 60, emotional_state: EmotionalState::Fomo, reflection_started: None },
            &cfg,
            &mut synth,
        );
        assert_eq!(out.decision().unwrap().outcome, Outcome::Blocked);

        // Cooldown started but not yet elapsed: still blocked.
        let out = reduce(
            &mut state,
            Event::Approve { ts: 14_000, emotional_state: EmotionalState::Fomo, reflection_started: Some(0) },
            &cfg,
            &mut synth,
        );
        assert_eq!(out.decision().unwrap().outcome, Outcome::Blocked);

        let out = reduce(
            &mut state,
            Event::Approve { ts: 15_000, emotional_state: EmotionalState::Fomo, reflection_started: Some(0) },
            &cfg,
            &mut synth,
        );
        let entry = out.decision().unwrap();
        assert_eq!(entry.outcome, Outcome::Executed);
        assert!(entry.composite_score < 0.75);
        assert_eq!(state.decisions.len(), 3);
    }

    #[test]
    fn test_overflowing_stage_is_rejected() {
        let mut state = AppState::new();
        let mut synth = TrendSynthesizer::seeded(12);
        let cfg = ReducerConfig::default();
        stage(&mut state, &mut synth, 1e308);
        let before = state.pulse;

        let out = reduce(&mut state, Event::Stage { ts: 20, amount: Some(1e308) }, &cfg, &mut synth);
        assert!(!out.persisted());
        assert!(out
            .commands
            .iter()
            .any(|c| matches!(c, Command::Log { level: LogLevel::Error, .. })));
        assert_eq!(state.pulse, before);
        assert!(state.is_finite());
    }

    #[test]
    fn test_overflowing_execution_is_refused() {
        let mut state = AppState::new();
        state.holdings.equity = f64::MAX;
        let mut synth = TrendSynthesizer::seeded(13);
        strike(&mut state, &mut synth, 1e300);

        let out = reduce(
            &mut state,
            Event::Approve { ts: 30, emotional_state: EmotionalState::Calm, reflection_started: None },
            &ReducerConfig::default(),
            &mut synth,
        );
        assert!(out.guard.is_none());
        assert!(!out.persisted());
        assert!(state.pulse.is_strike());
        assert!(state.decisions.is_empty());
        assert!(state.is_finite());
    }

    #[test]
    fn test_break_streak_and_reset_pulse() {
        let mut state = AppState::new();
        state.streak.count = 3;
        let mut synth = TrendSynthesizer::seeded(8);
        let cfg = ReducerConfig::default();
        strike(&mut state, &mut synth, 10.0);

        reduce(&mut state, Event::BreakStreak { ts: 70 }, &cfg, &mut synth);
        assert_eq!(state.streak.count, 0);

        reduce(&mut state, Event::ResetPulse { ts: 71 }, &cfg, &mut synth);
        assert_eq!(state.pulse, PulseState::initial());
        assert!(state.trend.is_none());
    }

    #[test]
    fn test_deterministic_replay() {
        let events = vec![
            Event::SetRiskProfile { ts: 1, profile: RiskProfile::Balanced },
            Event::Stage { ts: 2, amount: Some(1500.0) },
            Event::Stage { ts: 3, amount: Some(1500.0) },
            Event::Stage { ts: 4, amount: Some(1500.0) },
            Event::Approve { ts: 5, emotional_state: EmotionalState::Calm, reflection_started: None },
        ];
        let run = |seed| {
            let mut state = AppState::new();
            let mut synth = TrendSynthesizer::seeded(seed);
            let cfg = ReducerConfig::default();
            events
                .iter()
                .cloned()
                .map(|e| reduce(&mut state, e, &cfg, &mut synth).state_hash)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
