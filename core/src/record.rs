//! Untyped input records and their validation into transactions.
//!
//! RULE: Nothing downstream of this module sees an untyped cell.
//! Validation fails fast on the first bad cell; there is no partial table.

use crate::{
    error::{FeatureError, FeatureResult},
    geo::GeoPoint,
    timestamp::{date_to_timestamp, parse_datetime},
    types::{CardNumber, TransactionId, REQUIRED_COLUMNS},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One raw row as handed over by the data loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.data.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

/// A validated transaction. Coordinates are already in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tid:      TransactionId,
    pub datetime: DateTime<Utc>,
    pub cc_num:   CardNumber,
    pub amount:   f64,
    pub location: GeoPoint,
}

impl Transaction {
    /// Validate a raw record. `row` is only used for error reporting.
    pub fn from_record(row: usize, record: &Record) -> FeatureResult<Self> {
        let missing = missing_columns(record);
        if let Some(first) = missing.first() {
            let reason = if missing.len() == 1 {
                "missing required column".to_string()
            } else {
                format!("missing required columns {}", missing.join(", "))
            };
            return Err(FeatureError::schema(row, first, reason));
        }

        let cell = |column: &str| {
            record
                .get(column)
                .filter(|v| !v.is_null())
                .ok_or_else(|| FeatureError::schema(row, column, "missing required column"))
        };

        let tid = identifier(cell("tid")?).map_err(|r| FeatureError::schema(row, "tid", r))?;
        let cc_num =
            identifier(cell("cc_num")?).map_err(|r| FeatureError::schema(row, "cc_num", r))?;
        let datetime =
            parse_datetime(cell("datetime")?).map_err(|r| FeatureError::schema(row, "datetime", r))?;
        let amount = number(cell("amount")?).map_err(|r| FeatureError::schema(row, "amount", r))?;
        let longitude = coordinate(cell("longitude")?, 180.0)
            .map_err(|r| FeatureError::schema(row, "longitude", r))?;
        let latitude = coordinate(cell("latitude")?, 90.0)
            .map_err(|r| FeatureError::schema(row, "latitude", r))?;

        Ok(Self {
            tid,
            datetime,
            cc_num,
            amount,
            location: GeoPoint::from_degrees(longitude, latitude),
        })
    }
}

impl From<&Transaction> for Record {
    /// Render back into the loader's shape, coordinates in degrees.
    fn from(txn: &Transaction) -> Self {
        Record::new()
            .with("tid", txn.tid.clone())
            .with("datetime", date_to_timestamp(txn.datetime))
            .with("cc_num", txn.cc_num.clone())
            .with("amount", txn.amount)
            .with("longitude", txn.location.longitude.to_degrees())
            .with("latitude", txn.location.latitude.to_degrees())
    }
}

/// An ordered sequence of validated transactions, not assumed sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTable {
    pub transactions: Vec<Transaction>,
}

impl TransactionTable {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Validate every record, failing on the first schema violation.
    pub fn from_records(records: &[Record]) -> FeatureResult<Self> {
        let transactions = records
            .iter()
            .enumerate()
            .map(|(row, record)| Transaction::from_record(row, record))
            .collect::<FeatureResult<Vec<_>>>()?;
        Ok(Self { transactions })
    }

    /// Parse newline-delimited JSON objects. Blank lines are skipped.
    pub fn from_json_lines(input: &str) -> FeatureResult<Self> {
        let records = input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<Record>)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_records(&records)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Column names absent from a record, in canonical order.
pub fn missing_columns(record: &Record) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| record.get(c).map_or(true, Value::is_null))
        .collect()
}

fn identifier(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::String(_) => Err("empty identifier".to_string()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        other => Err(format!("expected string or integer identifier, got {other}")),
    }
}

fn number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("expected a finite number, got {value}"))
}

fn coordinate(value: &Value, bound: f64) -> Result<f64, String> {
    let degrees = number(value)?;
    if degrees.abs() > bound {
        return Err(format!("{degrees} degrees is outside [-{bound}, {bound}]"));
    }
    Ok(degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        Record::new()
            .with("tid", "t-1")
            .with("datetime", "2022-01-01 00:00:00")
            .with("cc_num", 4_444_037_300_542_691u64)
            .with("amount", 12.5)
            .with("longitude", -73.98)
            .with("latitude", 40.75)
    }

    #[test]
    fn integer_card_numbers_become_strings() {
        let txn = Transaction::from_record(0, &sample()).unwrap();
        assert_eq!(txn.cc_num, "4444037300542691");
    }

    #[test]
    fn null_cells_count_as_missing() {
        let record = sample().with("amount", Value::Null);
        let err = Transaction::from_record(3, &record).unwrap_err();
        match err {
            FeatureError::Schema { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "amount");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn fractional_card_number_is_wrong_type() {
        let record = sample().with("cc_num", 1.5);
        assert!(matches!(
            Transaction::from_record(0, &record),
            Err(FeatureError::Schema { .. })
        ));
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let record = sample().with("latitude", 91.0);
        assert!(Transaction::from_record(0, &record).is_err());
    }

    #[test]
    fn missing_columns_lists_in_canonical_order() {
        let mut record = sample();
        record.data.remove("latitude");
        record.data.remove("tid");
        assert_eq!(missing_columns(&record), vec!["tid", "latitude"]);
    }

    #[test]
    fn json_lines_skip_blank_lines() {
        let line = serde_json::to_string(&sample()).unwrap();
        let input = format!("{line}\n\n{}\n", line.replace("t-1", "t-2"));
        let table = TransactionTable::from_json_lines(&input).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.transactions[1].tid, "t-2");
    }

    #[test]
    fn record_round_trip_keeps_degrees() {
        let txn = Transaction::from_record(0, &sample()).unwrap();
        let back = Record::from(&txn);
        let lon = back.get("longitude").and_then(Value::as_f64).unwrap();
        assert!((lon + 73.98).abs() < 1e-9);
        assert_eq!(back.get("cc_num"), Some(&json!("4444037300542691")));
    }
}
