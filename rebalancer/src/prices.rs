//! Price table loading (`Ticker,Price` CSV).

use std::path::Path;

use driftbook::{Decimal, StaticPrices, Ticker};
use log::debug;
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::input::read_records;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    #[serde(rename = "Ticker")]
    ticker: Ticker,
    #[serde(rename = "Price", with = "rust_decimal::serde::str")]
    price: Decimal,
}

/// Load a price table.
///
/// Prices are not range-checked here: a non-positive price fails the run
/// only if a weighted or held ticker actually uses it.
pub fn load_prices(path: &Path) -> Result<StaticPrices> {
    let records: Vec<PriceRecord> = read_records(path)?;

    let mut seen = FxHashSet::default();
    let mut prices = StaticPrices::new();
    for record in records {
        if record.ticker.as_str().is_empty() {
            return Err(Error::input(path, "empty ticker"));
        }
        if !seen.insert(record.ticker.clone()) {
            return Err(Error::input(
                path,
                format!("duplicate price for {}", record.ticker),
            ));
        }
        prices.insert(record.ticker, record.price);
    }

    debug!("Loaded {} prices from {}", prices.len(), path.display());
    Ok(prices)
}
