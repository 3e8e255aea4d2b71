//! Derived feature rows and the output table.

use crate::{
    deriver::Lag,
    error::FeatureResult,
    record::Record,
    types::{CardNumber, EpochMillis, TransactionId},
};
use serde::{Deserialize, Serialize};

/// One output row. Column names for the two deltas depend on the lag and
/// live on `FeatureTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub tid:        TransactionId,
    pub datetime:   EpochMillis,
    pub cc_num:     CardNumber,
    pub amount:     f64,
    /// Central angle in radians to the neighbour transaction.
    pub loc_delta:  f64,
    /// Days from this transaction to the neighbour transaction.
    pub time_delta: f64,
}

/// The deriver's output, in global (datetime, cc_num) order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub lag:  Lag,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(lag: Lag, rows: Vec<FeatureRow>) -> Self {
        Self { lag, rows }
    }

    pub fn loc_delta_column(&self) -> String {
        format!("loc_delta_t_minus_{}", self.lag)
    }

    pub fn time_delta_column(&self) -> String {
        format!("time_delta_t_minus_{}", self.lag)
    }

    /// Output columns, in order.
    pub fn column_names(&self) -> Vec<String> {
        vec![
            "tid".to_string(),
            "datetime".to_string(),
            "cc_num".to_string(),
            "amount".to_string(),
            self.loc_delta_column(),
            self.time_delta_column(),
        ]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, tid: &str) -> Option<&FeatureRow> {
        self.rows.iter().find(|r| r.tid == tid)
    }

    /// Render rows as records keyed by `column_names()`.
    pub fn to_records(&self) -> Vec<Record> {
        let loc = self.loc_delta_column();
        let time = self.time_delta_column();
        self.rows
            .iter()
            .map(|r| {
                Record::new()
                    .with("tid", r.tid.clone())
                    .with("datetime", r.datetime)
                    .with("cc_num", r.cc_num.clone())
                    .with("amount", r.amount)
                    .with(&loc, r.loc_delta)
                    .with(&time, r.time_delta)
            })
            .collect()
    }

    /// One JSON object per line, trailing newline included.
    pub fn to_json_lines(&self) -> FeatureResult<String> {
        let mut out = String::new();
        for record in self.to_records() {
            out.push_str(&serde_json::to_string(&record)?);
            out.push('\n');
        }
        Ok(out)
    }
}
