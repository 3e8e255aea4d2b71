//! SQLite sink for derived feature rows.
//!
//! RULE: Only store.rs talks to the database.
//! The deriver never performs I/O; callers hand finished tables here.

use crate::{
    config::FeatureConfig,
    error::{FeatureError, FeatureResult},
    feature::{FeatureRow, FeatureTable},
};
use rusqlite::{params, Connection};

pub struct FeatureStore {
    conn: Connection,
}

impl FeatureStore {
    /// Open (or create) the feature database at `path`.
    pub fn open(path: &str) -> FeatureResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> FeatureResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> FeatureResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_features.sql"))?;
        Ok(())
    }

    /// Write every row of `table` under `config`'s group, version and lag.
    /// Re-inserting a (tid, lag) pair replaces the earlier row.
    ///
    /// The table must have been derived with `config.lag`, otherwise the
    /// rows would be filed under a lag the same config never reads.
    pub fn insert_features(&self, config: &FeatureConfig, table: &FeatureTable) -> FeatureResult<usize> {
        if table.lag != config.lag {
            return Err(FeatureError::input(format!(
                "table derived with lag {} cannot be stored under config lag {}",
                table.lag, config.lag
            )));
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO card_activity_features
                 (feature_group, version, lag, tid, datetime, cc_num, amount, loc_delta, time_delta)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in &table.rows {
                stmt.execute(params![
                    config.feature_group,
                    config.version,
                    config.lag.get() as i64,
                    row.tid,
                    row.datetime,
                    row.cc_num,
                    row.amount,
                    row.loc_delta,
                    row.time_delta,
                ])?;
            }
        }
        tx.commit()?;
        log::info!(
            "store: wrote {} rows to {} (lag={})",
            table.len(),
            config.qualified_name(),
            config.lag
        );
        Ok(table.len())
    }

    /// Number of stored rows for `config`'s group, version and lag.
    pub fn feature_count(&self, config: &FeatureConfig) -> FeatureResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM card_activity_features
             WHERE feature_group = ?1 AND version = ?2 AND lag = ?3",
            params![config.feature_group, config.version, config.lag.get() as i64],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// One card's stored rows, oldest first.
    pub fn features_for_card(&self, config: &FeatureConfig, cc_num: &str) -> FeatureResult<Vec<FeatureRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT tid, datetime, cc_num, amount, loc_delta, time_delta
             FROM card_activity_features
             WHERE feature_group = ?1 AND version = ?2 AND lag = ?3 AND cc_num = ?4
             ORDER BY datetime ASC, tid ASC",
        )?;
        let rows = stmt
            .query_map(
                params![config.feature_group, config.version, config.lag.get() as i64, cc_num],
                |row| {
                    Ok(FeatureRow {
                        tid:        row.get(0)?,
                        datetime:   row.get(1)?,
                        cc_num:     row.get(2)?,
                        amount:     row.get(3)?,
                        loc_delta:  row.get(4)?,
                        time_delta: row.get(5)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
