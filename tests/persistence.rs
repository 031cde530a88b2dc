//! Session persistence: load-on-start, save-on-mutate.

use salarypilot::config::Config;
use salarypilot::engine::guard::{EmotionalState, RiskProfile};
use salarypilot::engine::state::Outcome;
use salarypilot::session::Session;
use salarypilot::storage::StateStore;

fn config(path: &str) -> Config {
    Config {
        sqlite_path: path.to_string(),
        storage_key: "salary-pilot-storage".to_string(),
        reflection_secs: 15,
        reflection_override: false,
        decision_log_capacity: 50,
        trend_seed: Some(17),
    }
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.sqlite");
    let cfg = config(path.to_str().unwrap());

    {
        let mut session = Session::open(&cfg).unwrap();
        session.set_salary(1, 60_000.0).unwrap();
        session.set_risk_profile(2, RiskProfile::Aggressive).unwrap();
        session.stage(3, None).unwrap();
        session.stage(4, None).unwrap();
    }

    let mut session = Session::open(&cfg).unwrap();
    assert_eq!(session.state().pulse.period_index, 3);
    assert_eq!(session.state().pulse.total_staged, 24_000.0);
    assert_eq!(session.state().salary, Some(60_000.0));

    session.stage(5, None).unwrap();
    assert!(session.state().pulse.is_strike());
    assert!(session.state().trend.is_some());

    let out = session.approve(6, EmotionalState::Calm, None).unwrap();
    assert_eq!(out.decision().unwrap().outcome, Outcome::Executed);
    drop(session);

    let session = Session::open(&cfg).unwrap();
    let s = session.state();
    assert_eq!(s.streak.count, 1);
    assert_eq!(s.holdings.equity, 14_400.0);
    assert_eq!(s.decisions.len(), 1);
    assert!(!s.pulse.is_strike());

    let store = StateStore::new(path.to_str().unwrap()).unwrap();
    assert_eq!(store.decision_count("salary-pilot-storage").unwrap(), 1);
}

#[test]
fn separate_storage_keys_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.sqlite");
    let a = config(path.to_str().unwrap());
    let mut b = config(path.to_str().unwrap());
    b.storage_key = "other-user".to_string();

    Session::open(&a).unwrap().stage(1, Some(500.0)).unwrap();
    let other = Session::open(&b).unwrap();
    assert_eq!(other.state().pulse.total_staged, 0.0);
}

#[test]
fn reopen_applies_configured_log_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.sqlite");
    let cfg = config(path.to_str().unwrap());

    {
        let mut session = Session::open(&cfg).unwrap();
        for cycle in 0..3u64 {
            let ts = cycle * 10;
            for period in 1..=3 {
                session.stage(ts + period, Some(100.0)).unwrap();
            }
            session.approve(ts + 4, EmotionalState::Calm, None).unwrap();
        }
        assert_eq!(session.state().decisions.len(), 3);
        assert_eq!(session.state().decisions.capacity(), 50);
    }

    let mut small = cfg.clone();
    small.decision_log_capacity = 2;
    let session = Session::open(&small).unwrap();
    let log = &session.state().decisions;
    assert_eq!(log.capacity(), 2);
    let ts: Vec<_> = log.iter().map(|e| e.timestamp).collect();
    assert_eq!(ts, vec![24, 14]);
}

#[test]
fn overflowing_contribution_leaves_store_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.sqlite");
    let mut cfg = config(path.to_str().unwrap());
    cfg.storage_key = "k".to_string();

    {
        let mut session = Session::open(&cfg).unwrap();
        session.stage(1, Some(1e308)).unwrap();
        let out = session.stage(2, Some(1e308)).unwrap();
        assert!(!out.persisted());
        assert!(session.state().pulse.total_staged.is_finite());
    }

    let session = Session::open(&cfg).unwrap();
    assert_eq!(session.state().pulse.total_staged, 1e308);
    assert_eq!(session.state().pulse.period_index, 2);
}
