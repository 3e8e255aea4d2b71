//! feature-runner: headless feature derivation for card transactions.
//!
//! Usage:
//!   feature-runner --input trans.jsonl --lag 1 --output features.jsonl
//!   feature-runner --synthetic-cards 50 --per-card 20 --seed 42 --db features.db
//!   feature-runner --input trans.jsonl --config features.json

use anyhow::{Context, Result};
use ccfraud_core::{
    config::FeatureConfig, generator::TransactionGenerator, store::FeatureStore, FeatureDeriver,
    FeatureTable, Lag, TransactionTable,
};
use std::env;
use std::fs;
use std::io::{self, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut config = match flag_value(&args, "--config") {
        Some(path) => FeatureConfig::load(path)?,
        None => FeatureConfig::default(),
    };
    if let Some(lag) = parse_arg::<i64>(&args, "--lag")? {
        config.lag = Lag::new(lag)?;
    }

    let table = load_input(&args)?;
    let input_rows = table.len();

    let features = FeatureDeriver::new(config.lag).derive(table);

    match flag_value(&args, "--output") {
        Some(path) => fs::write(path, features.to_json_lines()?)
            .with_context(|| format!("Cannot write {path}"))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(features.to_json_lines()?.as_bytes())?;
            stdout.flush()?;
        }
    }

    if let Some(db) = flag_value(&args, "--db") {
        let store = FeatureStore::open(db)?;
        store.migrate()?;
        store.insert_features(&config, &features)?;
    }

    print_summary(&config, input_rows, &features);
    Ok(())
}

fn load_input(args: &[String]) -> Result<TransactionTable> {
    if let Some(path) = flag_value(args, "--input") {
        let content = fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
        return Ok(TransactionTable::from_json_lines(&content)?);
    }

    let cards = parse_arg(args, "--synthetic-cards")?.unwrap_or(0usize);
    if cards == 0 {
        anyhow::bail!("either --input <file> or --synthetic-cards <n> is required");
    }
    let per_card = parse_arg(args, "--per-card")?.unwrap_or(20usize);
    let seed = parse_arg(args, "--seed")?.unwrap_or(42u64);
    log::info!("runner: synthesising {cards} cards x {per_card} transactions (seed {seed})");
    Ok(TransactionGenerator::new(seed).generate_table(cards, per_card)?)
}

fn print_summary(config: &FeatureConfig, input_rows: usize, features: &FeatureTable) {
    let non_zero = non_zero_rows(features);

    eprintln!("=== FEATURE RUN ===");
    eprintln!("  feature group:  {}", config.qualified_name());
    eprintln!("  lag:            {}", config.lag);
    eprintln!("  input rows:     {input_rows}");
    eprintln!("  output rows:    {}", features.len());
    eprintln!("  non-zero rows:  {non_zero}");
    eprintln!("  columns:        {}", features.column_names().join(", "));
}

/// Rows where either derived column is non-zero. A neighbour at the same
/// place and instant counts as zero.
fn non_zero_rows(features: &FeatureTable) -> usize {
    features
        .rows
        .iter()
        .filter(|r| r.time_delta != 0.0 || r.loc_delta != 0.0)
        .count()
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `None` when the flag is absent, an error when its value does not parse.
fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    flag_value(args, flag)
        .map(|raw| {
            raw.parse()
                .map_err(|_| anyhow::anyhow!("{flag} expects an integer, got '{raw}'"))
        })
        .transpose()
}
