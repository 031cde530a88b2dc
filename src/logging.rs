//! Structured logging for the staging/guard lifecycle.
//!
//! Design goals:
//! 1. Multi-level granularity (TRACE → FATAL)
//! 2. Domain-specific categories for filtering
//! 3. Replay/audit support via sequence numbers and state hashes
//!
//! Every record is one JSON line on stderr. When `LOG_DIR` is set, records
//! are also appended to `<LOG_DIR>/<run_id>/events.jsonl`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::engine::events::LogLevel;
use crate::engine::guard::GuardResult;
use crate::engine::pulse::PulseState;
use crate::engine::state::DecisionLogEntry;
use crate::engine::trend::TrendAssessment;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Pulse,   // Staging periods, strike edge
    Guard,   // Triple Guard scores and decisions
    Trend,   // Trend synthesis
    Exec,    // Holdings updates
    Storage, // Snapshot load/save
    System,  // Startup, shutdown
    Audit,   // Replay/audit trail entries
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Pulse => "pulse",
            Domain::Guard => "guard",
            Domain::Trend => "trend",
            Domain::Exec => "exec",
            Domain::Storage => "storage",
            Domain::System => "system",
            Domain::Audit => "audit",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Sequence counter and run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let events = std::env::var("LOG_DIR").ok().and_then(|base| {
            let mut run_dir = PathBuf::from(base);
            run_dir.push(&run_id);
            if let Err(err) = create_dir_all(&run_dir) {
                eprintln!("[log] failed to create run dir: {}", err);
                return None;
            }
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(run_dir.join("events.jsonl"))
            {
                Ok(f) => Some(Mutex::new(BufWriter::new(f))),
                Err(err) => {
                    eprintln!("[log] failed to open events log: {}", err);
                    None
                }
            }
        });
        RunContext { run_id, events }
    })
}

pub fn run_id() -> &'static str {
    &ensure_run_context().run_id
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let min_level = Level::from_env();
    if level < min_level || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain, event, fields);
}

fn build_record(level: Level, domain: Domain, event: &str, mut fields: Map<String, Value>) -> Value {
    let ctx = ensure_run_context();
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));
    Value::Object(entry)
}

fn emit_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let line = build_record(level, domain, event, fields).to_string();
    if let Some(writer) = &ensure_run_context().events {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
    eprintln!("{}", line);
}

// =============================================================================
// Domain logs
// =============================================================================

/// Log a reducer message routed to a domain
pub fn log_message(level: LogLevel, domain: Domain, event: &str, msg: &str) {
    log(level.into(), domain, event, obj(&[("msg", v_str(msg))]));
}

pub fn log_transition(event: &str, pulse: &PulseState, state_hash: u64) {
    log(
        Level::Info,
        Domain::Pulse,
        "transition",
        obj(&[
            ("cause", v_str(event)),
            ("period", json!(pulse.period_index)),
            ("total_staged", v_num(pulse.total_staged)),
            ("phase", v_str(pulse.phase.as_str())),
            ("state_hash", v_str(&format!("{:016x}", state_hash))),
        ]),
    );
}

pub fn log_trend(assessment: &TrendAssessment) {
    log(
        Level::Info,
        Domain::Trend,
        "synthesized",
        obj(&[
            ("confidence", json!(assessment.confidence)),
            ("volatility", v_num(assessment.volatility)),
            ("entry_signal", v_str(assessment.entry_signal.as_str())),
        ]),
    );
}

/// Log a guard decision with the threshold it was judged against
pub fn log_guard_decision(result: &GuardResult, threshold: f64) {
    log(
        if result.authorized { Level::Info } else { Level::Warn },
        Domain::Guard,
        "decision",
        obj(&[
            ("composite_score", v_num(result.composite_score)),
            ("threshold", v_num(threshold)),
            ("authorized", Value::Bool(result.authorized)),
        ]),
    );
}

pub fn log_execution(entry: &DecisionLogEntry) {
    log(
        Level::Info,
        Domain::Exec,
        "decision_logged",
        obj(&[
            ("ts_ms", json!(entry.timestamp)),
            ("emotional_state", v_str(entry.emotional_state.as_str())),
            ("composite_score", v_num(entry.composite_score)),
            (
                "market_signal",
                entry.market_signal.map(|s| v_str(s.as_str())).unwrap_or(Value::Null),
            ),
            ("outcome", v_str(entry.outcome.as_str())),
        ]),
    );
}

/// Log a snapshot checkpoint for recovery
pub fn log_checkpoint(storage_key: &str, digest: &str, state_hash: u64, decisions: usize) {
    log(
        Level::Debug,
        Domain::Audit,
        "checkpoint",
        obj(&[
            ("storage_key", v_str(storage_key)),
            ("digest", v_str(digest)),
            ("state_hash", v_str(&format!("{:016x}", state_hash))),
            ("decisions", json!(decisions)),
        ]),
    );
}

// =============================================================================
// Helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}
