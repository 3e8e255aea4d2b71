//! Per-card activity features for card transaction fraud models.
//!
//! The heart of the crate is `deriver::derive_features`: for each
//! transaction it computes the great-circle angle and the elapsed days to
//! the transaction `lag` rows later on the same card.

pub mod config;
pub mod deriver;
pub mod error;
pub mod feature;
pub mod generator;
pub mod geo;
pub mod record;
pub mod rng;
pub mod store;
pub mod timestamp;
pub mod types;

pub use deriver::{derive_features, FeatureDeriver, Lag};
pub use error::{FeatureError, FeatureResult};
pub use feature::{FeatureRow, FeatureTable};
pub use record::{Record, Transaction, TransactionTable};
