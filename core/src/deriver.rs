//! The feature deriver: per-card location and time deltas.
//!
//! PIPELINE (fixed order):
//!   1. Coordinates are already radians (converted once, in `record`).
//!   2. Stable sort by (datetime, cc_num).
//!   3. Partition by cc_num; each partition keeps the global order.
//!   4. For position i the neighbour is position i + lag, i.e. `lag` rows
//!      LATER in time. Missing neighbours yield 0 for both features.
//!   5. Project to the output columns with epoch-millisecond datetimes.
//!
//! The `_t_minus_<lag>` column names predate the forward neighbour lookup.
//! Downstream models are trained on these semantics; keep them.

use crate::{
    error::{FeatureError, FeatureResult},
    feature::{FeatureRow, FeatureTable},
    geo::haversine_distance,
    record::{Record, Transaction, TransactionTable},
    timestamp::{date_to_timestamp, time_delta_to_days},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Row offset within a card's chronological ordering. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Lag(usize);

impl Lag {
    pub fn new(lag: i64) -> FeatureResult<Self> {
        if lag <= 0 {
            return Err(FeatureError::input(format!("lag must be a positive integer, got {lag}")));
        }
        usize::try_from(lag)
            .map(Self)
            .map_err(|_| FeatureError::input(format!("lag {lag} does not fit this platform")))
    }

    /// Read a lag from a configuration value. Floats, even integral ones
    /// such as `1.0`, are rejected.
    pub fn from_json(value: &Value) -> FeatureResult<Self> {
        match value.as_i64() {
            Some(lag) => Self::new(lag),
            None => Err(FeatureError::input(format!("lag must be a positive integer, got {value}"))),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Lag {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Lag {
    type Error = FeatureError;

    fn try_from(lag: i64) -> FeatureResult<Self> {
        Self::new(lag)
    }
}

impl From<Lag> for i64 {
    fn from(lag: Lag) -> Self {
        lag.0 as i64
    }
}

/// Derives `loc_delta_t_minus_<lag>` and `time_delta_t_minus_<lag>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver {
    lag: Lag,
}

impl FeatureDeriver {
    pub fn new(lag: Lag) -> Self {
        Self { lag }
    }

    pub fn lag(&self) -> Lag {
        self.lag
    }

    /// Consume a validated table and return the derived one.
    pub fn derive(&self, table: TransactionTable) -> FeatureTable {
        let mut txns = table.transactions;
        if txns.is_empty() {
            log::warn!("derive: empty transaction table, nothing to do");
            return FeatureTable::new(self.lag, Vec::new());
        }

        // slice::sort_by is stable: equal keys keep their input order.
        txns.sort_by(|a, b| {
            a.datetime
                .cmp(&b.datetime)
                .then_with(|| a.cc_num.cmp(&b.cc_num))
        });

        let lag = self.lag.get();
        let (deltas, card_count) = {
            let partitions = partition_by_card(&txns);
            let mut deltas = vec![(0.0, 0.0); txns.len()];
            for positions in partitions.values() {
                for (i, &current) in positions.iter().enumerate() {
                    let Some(&next) = i.checked_add(lag).and_then(|j| positions.get(j)) else {
                        break;
                    };
                    deltas[current] = neighbour_deltas(&txns[current], &txns[next]);
                }
            }
            (deltas, partitions.len())
        };

        log::debug!(
            "derive: lag={} rows={} cards={card_count}",
            self.lag,
            txns.len()
        );

        let rows = txns
            .into_iter()
            .zip(deltas)
            .map(|(txn, (loc_delta, time_delta))| FeatureRow {
                tid: txn.tid,
                datetime: date_to_timestamp(txn.datetime),
                cc_num: txn.cc_num,
                amount: txn.amount,
                loc_delta,
                time_delta,
            })
            .collect();

        FeatureTable::new(self.lag, rows)
    }
}

/// Validate raw records and derive features for them.
///
/// Fails with `FeatureError::Input` for a non-positive lag and with
/// `FeatureError::Schema` for the first record missing a required column
/// or holding a badly typed cell.
pub fn derive_features(records: &[Record], lag: i64) -> FeatureResult<FeatureTable> {
    let lag = Lag::new(lag)?;
    let table = TransactionTable::from_records(records)?;
    Ok(FeatureDeriver::new(lag).derive(table))
}

/// Positions of each card's transactions, in the order of `txns`.
fn partition_by_card(txns: &[Transaction]) -> HashMap<&str, Vec<usize>> {
    let mut partitions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, txn) in txns.iter().enumerate() {
        partitions.entry(txn.cc_num.as_str()).or_default().push(idx);
    }
    partitions
}

/// (central angle, days) from `current` to `neighbour`. The time delta is
/// neighbour minus current.
fn neighbour_deltas(current: &Transaction, neighbour: &Transaction) -> (f64, f64) {
    let loc = haversine_distance(&current.location, &neighbour.location);
    let days = time_delta_to_days(neighbour.datetime.signed_duration_since(current.datetime));
    (loc, days)
}
