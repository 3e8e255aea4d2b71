//! Shared primitive types used across the feature pipeline.

/// A stable, unique identifier for a transaction.
pub type TransactionId = String;

/// A card number. The grouping key for every per-card feature.
pub type CardNumber = String;

/// Milliseconds since the Unix epoch, UTC.
pub type EpochMillis = i64;

/// Names of the columns every input record must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = ["tid", "datetime", "cc_num", "amount", "longitude", "latitude"];
