use crate::engine::guard::REFLECTION_MS;
use crate::engine::reducer::ReducerConfig;
use crate::engine::state::DEFAULT_LOG_CAPACITY;

#[derive(Debug, Clone)]
pub struct Config {
    pub sqlite_path: String,
    /// Row key the application state is saved under
    pub storage_key: String,
    pub reflection_secs: u64,
    pub reflection_override: bool,
    pub decision_log_capacity: usize,
    /// Fixed seed for trend synthesis; entropy when unset
    pub trend_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values fall back to
    /// defaults.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            sqlite_path: var("SQLITE_PATH").unwrap_or_else(|| "./salarypilot.sqlite".to_string()),
            storage_key: var("STORAGE_KEY").unwrap_or_else(|| "salary-pilot-storage".to_string()),
            reflection_secs: var("REFLECTION_SECS").and_then(|v| v.parse().ok()).unwrap_or(REFLECTION_MS / 1000),
            reflection_override: var("REFLECTION_OVERRIDE").map(|v| parse_flag(&v)).unwrap_or(false),
            decision_log_capacity: var("DECISION_LOG_CAPACITY")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_LOG_CAPACITY),
            trend_seed: var("TREND_SEED").and_then(|v| v.parse().ok()),
        }
    }

    pub fn reducer_config(&self) -> ReducerConfig {
        ReducerConfig {
            reflection_override: self.reflection_override,
            reflection_ms: self.reflection_secs * 1000,
        }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
