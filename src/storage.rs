use anyhow::{anyhow, bail, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use sha2::{Digest, Sha256};

use crate::engine::state::{AppState, DecisionLogEntry};

/// SQLite-backed snapshot store keyed by a fixed storage name.
pub struct StateStore {
    conn: Connection,
}

pub fn digest(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

impl StateStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS snapshots (
                name TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                digest TEXT NOT NULL,
                updated_ts INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS decisions (
                name TEXT NOT NULL,
                ts INTEGER NOT NULL,
                emotional_state TEXT NOT NULL,
                composite_score REAL NOT NULL,
                market_signal TEXT,
                outcome TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Load the snapshot for `name`, verifying its digest.
    pub fn load(&self, name: &str) -> Result<Option<AppState>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, digest FROM snapshots WHERE name = ?1",
                params![name],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let Some((payload, stored)) = row else {
            return Ok(None);
        };
        let actual = digest(&payload);
        if actual != stored {
            bail!("snapshot '{}' digest mismatch: stored {} computed {}", name, stored, actual);
        }
        let state = serde_json::from_str(&payload)
            .map_err(|e| anyhow!("snapshot '{}' is not valid state: {}", name, e))?;
        Ok(Some(state))
    }

    /// Save the whole state under `name`, recording `appended` in the
    /// decision audit table. Single writer: the transaction takes the write
    /// lock up front.
    pub fn save(
        &mut self,
        name: &str,
        ts: u64,
        state: &AppState,
        appended: &[DecisionLogEntry],
    ) -> Result<String> {
        if !state.is_finite() {
            bail!("refusing to save '{}': state holds a non-finite amount", name);
        }
        let payload = serde_json::to_string(state)?;
        let hash = digest(&payload);

        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO snapshots (name, payload, digest, updated_ts) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET payload = excluded.payload,
                digest = excluded.digest, updated_ts = excluded.updated_ts",
            params![name, payload, hash, ts as i64],
        )?;
        for entry in appended {
            tx.execute(
                "INSERT INTO decisions (name, ts, emotional_state, composite_score, market_signal, outcome)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    name,
                    entry.timestamp as i64,
                    entry.emotional_state.as_str(),
                    entry.composite_score,
                    entry.market_signal.map(|s| s.as_str()),
                    entry.outcome.as_str()
                ],
            )?;
        }
        tx.commit()?;
        Ok(hash)
    }

    /// Rows in the decision audit table for `name`.
    pub fn decision_count(&self, name: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM decisions WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM snapshots WHERE name = ?1", params![name])?;
        tx.execute("DELETE FROM decisions WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(())
    }
}
