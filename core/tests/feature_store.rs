//! SQLite sink for derived rows.

use ccfraud_core::{
    config::FeatureConfig, derive_features, store::FeatureStore, FeatureError, Lag, Record,
};

fn store() -> FeatureStore {
    let store = FeatureStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn records() -> Vec<Record> {
    let txn = |tid: &str, ms: i64, card: &str| {
        Record::new()
            .with("tid", tid)
            .with("datetime", ms)
            .with("cc_num", card)
            .with("amount", 25.0)
            .with("longitude", -73.98)
            .with("latitude", 40.75)
    };
    vec![
        txn("a1", 86_400_000, "4000111122223333"),
        txn("a0", 0, "4000111122223333"),
        txn("b0", 3_600_000, "4000999988887777"),
    ]
}

#[test]
fn stored_rows_read_back_in_time_order() {
    let store = store();
    let config = FeatureConfig::default();
    let table = derive_features(&records(), 1).unwrap();

    assert_eq!(store.insert_features(&config, &table).unwrap(), 3);
    assert_eq!(store.feature_count(&config).unwrap(), 3);

    let card = store.features_for_card(&config, "4000111122223333").unwrap();
    assert_eq!(card.len(), 2);
    assert_eq!(card[0].tid, "a0");
    assert_eq!(card[0].time_delta, 1.0);
    assert_eq!(card[1].time_delta, 0.0);
    assert_eq!(&card[0], table.row("a0").unwrap());
}

#[test]
fn reinserting_replaces_rows() {
    let store = store();
    let config = FeatureConfig::default();
    let table = derive_features(&records(), 1).unwrap();

    store.insert_features(&config, &table).unwrap();
    store.insert_features(&config, &table).unwrap();
    assert_eq!(store.feature_count(&config).unwrap(), 3);
}

#[test]
fn lags_are_stored_side_by_side() {
    let store = store();
    let lag1 = FeatureConfig::default();
    let lag2 = FeatureConfig {
        lag: Lag::new(2).unwrap(),
        ..FeatureConfig::default()
    };

    store
        .insert_features(&lag1, &derive_features(&records(), 1).unwrap())
        .unwrap();
    store
        .insert_features(&lag2, &derive_features(&records(), 2).unwrap())
        .unwrap();

    assert_eq!(store.feature_count(&lag1).unwrap(), 3);
    assert_eq!(store.feature_count(&lag2).unwrap(), 3);

    let card = store.features_for_card(&lag2, "4000111122223333").unwrap();
    assert!(card.iter().all(|r| r.time_delta == 0.0));
}

#[test]
fn unknown_card_has_no_rows() {
    let store = store();
    let rows = store
        .features_for_card(&FeatureConfig::default(), "0000")
        .unwrap();
    assert!(rows.is_empty());
}

/// A table derived with one lag cannot be filed under a config with another.
#[test]
fn lag_mismatch_is_rejected_and_writes_nothing() {
    let store = store();
    let config = FeatureConfig::default();
    let table = derive_features(&records(), 2).unwrap();

    assert!(matches!(
        store.insert_features(&config, &table),
        Err(FeatureError::Input { .. })
    ));
    assert_eq!(store.feature_count(&config).unwrap(), 0);

    let lag2 = FeatureConfig {
        lag: Lag::new(2).unwrap(),
        ..FeatureConfig::default()
    };
    assert_eq!(store.feature_count(&lag2).unwrap(), 0);
}
