//! Seeded multi-cycle simulation of the staging/guard loop.
//!
//! Usage: pulse_sim [cycles] [monthly_contribution] [seed]

use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use salarypilot::engine::events::Event;
use salarypilot::engine::guard::{EmotionalState, RiskProfile};
use salarypilot::engine::reducer::{reduce, ReducerConfig};
use salarypilot::engine::state::{AppState, Outcome};
use salarypilot::engine::sustainability::compute_impact;
use salarypilot::engine::trend::TrendSynthesizer;
use salarypilot::logging::{log, obj, v_num, Domain, Level};

const PERIOD_MS: u64 = 30 * 86_400_000;

fn pick_emotion(rng: &mut StdRng) -> EmotionalState {
    match rng.gen_range(0..10) {
        0..=5 => EmotionalState::Calm,
        6..=7 => EmotionalState::Stressed,
        _ => EmotionalState::Fomo,
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cycles: u32 = args.get(1).map(|v| v.parse()).transpose().map_err(|_| anyhow!("cycles must be an integer"))?.unwrap_or(8);
    let contribution: f64 = args.get(2).map(|v| v.parse()).transpose().map_err(|_| anyhow!("contribution must be a number"))?.unwrap_or(10_000.0);
    let seed: u64 = args.get(3).map(|v| v.parse()).transpose().map_err(|_| anyhow!("seed must be an integer"))?.unwrap_or(42);
    if !contribution.is_finite() || contribution < 0.0 {
        return Err(anyhow!("contribution must be non-negative"));
    }

    let cfg = ReducerConfig::default();
    let mut state = AppState::new();
    state.risk_profile = Some(RiskProfile::Balanced);
    let mut synth = TrendSynthesizer::seeded(seed);
    let mut moods = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut ts = 0u64;

    let (mut executed, mut blocked) = (0u32, 0u32);

    for cycle in 1..=cycles {
        for _ in 0..3 {
            ts += PERIOD_MS;
            reduce(&mut state, Event::Stage { ts, amount: Some(contribution) }, &cfg, &mut synth);
        }
        let signal = state.trend.map(|t| t.entry_signal.as_str()).unwrap_or("-");

        // retry once per cycle after a block, then abandon the cycle
        let mut outcome = Outcome::Blocked;
        for _ in 0..2 {
            ts += 1;
            let emotional_state = pick_emotion(&mut moods);
            let out = reduce(&mut state, Event::Approve { ts, emotional_state, reflection_started: None }, &cfg, &mut synth);
            let (Some(guard), Some(entry)) = (out.guard, out.decision()) else { break };
            println!(
                "cycle {:>3} signal {:<8} {:<8} score {:.2} -> {}",
                cycle,
                signal,
                emotional_state.as_str(),
                guard.composite_score,
                entry.outcome.as_str()
            );
            outcome = entry.outcome;
            if outcome == Outcome::Executed {
                break;
            }
        }
        match outcome {
            Outcome::Executed => executed += 1,
            Outcome::Blocked => {
                blocked += 1;
                reduce(&mut state, Event::ResetPulse { ts }, &cfg, &mut synth);
            }
        }
    }

    let impact = compute_impact(state.holdings.total(), &state.holdings.mix(), state.streak.is_active());
    println!(
        "cycles={} executed={} blocked={} trends={} equity={:.2} crypto={:.2} esg={:.2} impact={:.3}",
        cycles,
        executed,
        blocked,
        synth.invocations(),
        state.holdings.equity,
        state.holdings.crypto,
        state.holdings.esg,
        impact
    );
    log(
        Level::Info,
        Domain::System,
        "simulation_summary",
        obj(&[
            ("cycles", v_num(f64::from(cycles))),
            ("executed", v_num(f64::from(executed))),
            ("blocked", v_num(f64::from(blocked))),
            ("trends", v_num(synth.invocations() as f64)),
            ("streak", v_num(f64::from(state.streak.count))),
        ]),
    );
    if synth.invocations() != u64::from(cycles) {
        return Err(anyhow!(
            "expected one trend per cycle: {} trends over {} cycles",
            synth.invocations(),
            cycles
        ));
    }
    Ok(())
}
