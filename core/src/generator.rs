//! Deterministic synthetic card transactions.
//!
//! Used for dry runs of the feature pipeline and as test fixtures.
//! Same seed = same records, in the same (shuffled) order.

use crate::{
    error::FeatureResult,
    record::{Record, TransactionTable},
    rng::FeatureRng,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::{seq::SliceRandom, Rng, RngCore};
use std::collections::HashSet;
use uuid::Builder;

const HOME_RADIUS_DEG: f64 = 0.5;
const TRAVEL_PROBABILITY: f64 = 0.15;
const MAX_AMOUNT: f64 = 5_000.0;
const CARD_SUFFIX_SPACE: u64 = 1_000_000_000_000_000;

// Continental US bounding box.
const LON_RANGE: (f64, f64) = (-124.7, -67.0);
const LAT_RANGE: (f64, f64) = (25.1, 49.3);

pub struct TransactionGenerator {
    seed:        u64,
    start:       DateTime<Utc>,
    window_days: i64,
}

impl TransactionGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start: Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            window_days: 30,
        }
    }

    /// `cards * per_card` raw records, shuffled so the input is unsorted.
    pub fn generate(&self, cards: usize, per_card: usize) -> Vec<Record> {
        let mut seen_cards = HashSet::with_capacity(cards);
        let mut records = Vec::with_capacity(cards * per_card);

        for card_idx in 0..cards {
            let mut rng = FeatureRng::fork(self.seed, card_idx as u64);
            let cc_num = loop {
                let candidate = format!("4{:015}", rng.gen_range(0..CARD_SUFFIX_SPACE));
                if seen_cards.insert(candidate.clone()) {
                    break candidate;
                }
            };
            let home = (rng.gen_range(LON_RANGE.0..LON_RANGE.1), rng.gen_range(LAT_RANGE.0..LAT_RANGE.1));

            for _ in 0..per_card {
                records.push(self.transaction(&mut rng, &cc_num, home));
            }
        }

        records.shuffle(&mut FeatureRng::fork(self.seed, u64::MAX));
        log::debug!(
            "generator: seed={} cards={cards} records={}",
            self.seed,
            records.len()
        );
        records
    }

    /// Same as `generate`, validated into a table.
    pub fn generate_table(&self, cards: usize, per_card: usize) -> FeatureResult<TransactionTable> {
        TransactionTable::from_records(&self.generate(cards, per_card))
    }

    fn transaction(&self, rng: &mut FeatureRng, cc_num: &str, home: (f64, f64)) -> Record {
        let mut tid_bytes = [0u8; 16];
        rng.fill_bytes(&mut tid_bytes);
        let tid = Builder::from_random_bytes(tid_bytes).into_uuid().to_string();

        let offset = rng.gen_range(0..self.window_days * 86_400);
        let datetime = self.start + TimeDelta::seconds(offset);

        let (longitude, latitude) = if rng.gen_bool(TRAVEL_PROBABILITY) {
            (rng.gen_range(LON_RANGE.0..LON_RANGE.1), rng.gen_range(LAT_RANGE.0..LAT_RANGE.1))
        } else {
            (
                home.0 + rng.gen_range(-HOME_RADIUS_DEG..HOME_RADIUS_DEG),
                home.1 + rng.gen_range(-HOME_RADIUS_DEG..HOME_RADIUS_DEG),
            )
        };

        let amount = (rng.pareto(5.0, 1.5).min(MAX_AMOUNT) * 100.0).round() / 100.0;

        Record::new()
            .with("tid", tid)
            .with("datetime", datetime.format("%Y-%m-%d %H:%M:%S").to_string())
            .with("cc_num", cc_num)
            .with("amount", amount)
            .with("longitude", longitude)
            .with("latitude", latitude)
    }
}
