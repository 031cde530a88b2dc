use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

use salarypilot::config::Config;
use salarypilot::engine::guard::{EmotionalState, ReflectionCooldown, RiskProfile};
use salarypilot::engine::split::{monthly_contribution, SalarySplit};
use salarypilot::engine::sustainability::compute_impact;
use salarypilot::engine::tax;
use salarypilot::logging::{log, obj, ts_epoch_ms, v_str, Domain, Level};
use salarypilot::session::Session;

const USAGE: &str = "usage: salarypilot <command>
  status                      pulse, trend, holdings, streak
  salary <amount>             set monthly salary
  risk <conservative|balanced|aggressive>
  split <needs> <wants> | split recommended
  stage [amount]              stage one period (defaults to salary split)
  approve <calm|stressed|fomo>
  break-streak
  reset                       abort the current cycle
  tax [amount]                net-return preview per asset
  impact                      sustainability score of holdings
  log [n]                     most recent decisions";

fn parse_amount(arg: Option<&String>) -> Result<Option<f64>> {
    match arg {
        None => Ok(None),
        Some(s) => {
            let v: f64 = s.parse().map_err(|_| anyhow!("not a number: {}", s))?;
            if !v.is_finite() || v < 0.0 {
                bail!("amount must be non-negative: {}", s);
            }
            Ok(Some(v))
        }
    }
}

fn fmt_ts(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn print_status(session: &Session) {
    let s = session.state();
    println!(
        "pulse: period {}/3 staged {:.2} [{}]",
        s.pulse.period_index,
        s.pulse.total_staged,
        s.pulse.phase.as_str()
    );
    match &s.trend {
        Some(t) => println!(
            "trend: confidence {}% volatility {:.2} signal {}",
            t.confidence,
            t.volatility,
            t.entry_signal.as_str()
        ),
        None => println!("trend: none"),
    }
    println!(
        "holdings: equity {:.2} crypto {:.2} esg {:.2}",
        s.holdings.equity, s.holdings.crypto, s.holdings.esg
    );
    println!(
        "streak: {} ({})",
        s.streak.count,
        if s.streak.is_active() { "active" } else { "broken" }
    );
    let profile = s.effective_risk_profile();
    println!(
        "profile: {}{} split {}/{}/{}",
        profile.as_str(),
        if s.risk_profile.is_none() { " (default)" } else { "" },
        s.split.needs,
        s.split.wants,
        s.split.investments
    );
    if let Some(salary) = s.salary {
        println!("monthly contribution: {:.2}", monthly_contribution(salary, &s.split));
    }
}

fn approve(session: &mut Session, emotion: EmotionalState) -> Result<()> {
    let cfg = session.reducer_config().clone();
    let mut reflection_started = None;

    if emotion.needs_reflection() && cfg.reflection_override && session.state().pulse.is_strike() {
        let started = ts_epoch_ms();
        let mut cooldown = ReflectionCooldown::new(cfg.reflection_ms);
        cooldown.begin(emotion, started);
        println!("reflecting for {}s before this selection counts", cfg.reflection_ms / 1000);
        while !cooldown.has_waited(ts_epoch_ms()) {
            std::thread::sleep(Duration::from_millis(cooldown.remaining_ms(ts_epoch_ms()).min(1000)));
        }
        reflection_started = Some(started);
    }

    let out = session.approve(ts_epoch_ms(), emotion, reflection_started)?;
    match (out.guard, out.decision()) {
        (Some(guard), Some(entry)) => println!(
            "{}: composite {:.2} (threshold 0.75)",
            entry.outcome.as_str(),
            guard.composite_score
        ),
        _ => println!("approval refused"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(cmd) = args.get(1) else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    let cfg = Config::from_env();
    let mut session = Session::open(&cfg)?;
    log(
        Level::Debug,
        Domain::System,
        "start",
        obj(&[("command", v_str(cmd)), ("sqlite_path", v_str(&cfg.sqlite_path))]),
    );

    let now = ts_epoch_ms();
    match cmd.as_str() {
        "status" => print_status(&session),
        "salary" => {
            let salary = parse_amount(args.get(2))?.ok_or_else(|| anyhow!("salary needs an amount"))?;
            session.set_salary(now, salary)?;
            print_status(&session);
        }
        "risk" => {
            let arg = args.get(2).ok_or_else(|| anyhow!("risk needs a profile"))?;
            let profile = RiskProfile::parse(arg).ok_or_else(|| anyhow!("unknown risk profile: {}", arg))?;
            session.set_risk_profile(now, profile)?;
            print_status(&session);
        }
        "split" => {
            let split = match (args.get(2).map(String::as_str), args.get(3)) {
                (Some("recommended"), _) => SalarySplit::recommended(session.state().effective_risk_profile()),
                (Some(needs), Some(wants)) => {
                    let needs: u8 = needs.parse().map_err(|_| anyhow!("needs must be 0-100"))?;
                    let wants: u8 = wants.parse().map_err(|_| anyhow!("wants must be 0-100"))?;
                    if u16::from(needs) + u16::from(wants) > 100 {
                        bail!("needs + wants exceeds 100");
                    }
                    SalarySplit::new(needs, wants)
                }
                _ => bail!("split needs <needs> <wants> or 'recommended'"),
            };
            session.set_split(now, split)?;
            print_status(&session);
        }
        "stage" => {
            let amount = parse_amount(args.get(2))?;
            let out = session.stage(now, amount)?;
            print_status(&session);
            if out.commands.iter().any(|c| matches!(c, salarypilot::engine::events::Command::TrendSynthesized { .. })) {
                println!("strike reached: run 'approve <emotion>' to execute");
            }
        }
        "approve" => {
            let arg = args.get(2).ok_or_else(|| anyhow!("approve needs an emotional state"))?;
            let emotion = EmotionalState::parse(arg).ok_or_else(|| anyhow!("unknown emotional state: {}", arg))?;
            approve(&mut session, emotion)?;
            print_status(&session);
        }
        "break-streak" => {
            session.break_streak(now)?;
            print_status(&session);
        }
        "reset" => {
            session.reset_pulse(now)?;
            print_status(&session);
        }
        "tax" => {
            let amount = parse_amount(args.get(2))?.unwrap_or(10_000.0);
            for (asset, r) in tax::preview(amount) {
                println!(
                    "{:<7} gross {:>12.2} tax {:>10.2} ({:>5.1}%) net {:>12.2}",
                    asset.as_str(),
                    r.gross,
                    r.tax,
                    r.tax_rate * 100.0,
                    r.net
                );
            }
        }
        "impact" => {
            let s = session.state();
            let score = compute_impact(s.holdings.total(), &s.holdings.mix(), s.streak.is_active());
            println!("sustainability impact: {:.3}", score);
        }
        "log" => {
            let n: usize = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(10);
            for e in session.state().decisions.iter().take(n) {
                println!(
                    "{} {:<8} {:<8} score {:.2} signal {}",
                    fmt_ts(e.timestamp),
                    e.outcome.as_str(),
                    e.emotional_state.as_str(),
                    e.composite_score,
                    e.market_signal.map(|s| s.as_str()).unwrap_or("-")
                );
            }
        }
        other => {
            eprintln!("unknown command: {}\n{}", other, USAGE);
            std::process::exit(1);
        }
    }

    Ok(())
}
