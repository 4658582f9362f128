//! Price sources.
//!
//! The rebalancer never fetches prices itself. Callers inject a
//! [`PriceSource`]; [`PriceMemo`] wraps it so every distinct ticker is quoted
//! once and priced consistently for the lifetime of the memo.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::Ticker;

/// Anything that can quote a ticker.
///
/// Implementations return [`Error::PriceUnavailable`] for unknown tickers and
/// must never substitute a default price.
pub trait PriceSource {
    fn price(&mut self, ticker: &Ticker) -> Result<Decimal>;
}

impl<S: PriceSource + ?Sized> PriceSource for &mut S {
    fn price(&mut self, ticker: &Ticker) -> Result<Decimal> {
        (**self).price(ticker)
    }
}

impl<S: PriceSource + ?Sized> PriceSource for Box<S> {
    fn price(&mut self, ticker: &Ticker) -> Result<Decimal> {
        (**self).price(ticker)
    }
}

/// Fixed in-memory price table.
#[derive(Clone, Debug, Default)]
pub struct StaticPrices {
    prices: FxHashMap<Ticker, Decimal>,
}

impl StaticPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<Ticker>, price: Decimal) -> Option<Decimal> {
        self.prices.insert(ticker.into(), price)
    }

    pub fn with(mut self, ticker: impl Into<Ticker>, price: Decimal) -> Self {
        self.insert(ticker, price);
        self
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl<T: Into<Ticker>> FromIterator<(T, Decimal)> for StaticPrices {
    fn from_iter<I: IntoIterator<Item = (T, Decimal)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().map(|(t, p)| (t.into(), p)).collect(),
        }
    }
}

impl PriceSource for StaticPrices {
    fn price(&mut self, ticker: &Ticker) -> Result<Decimal> {
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| Error::PriceUnavailable {
                ticker: ticker.clone(),
                reason: "not in price table".into(),
            })
    }
}

/// Memoizing wrapper: each ticker hits the inner source at most once.
///
/// Non-positive quotes are rejected here so nothing downstream divides by a
/// zero price. Failed lookups are not cached.
#[derive(Debug)]
pub struct PriceMemo<S> {
    source: S,
    cache: FxHashMap<Ticker, Decimal>,
    lookups: usize,
}

impl<S: PriceSource> PriceMemo<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: FxHashMap::default(),
            lookups: 0,
        }
    }

    /// Number of times the inner source was queried.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Cached quote, if the ticker has been priced.
    pub fn cached(&self, ticker: &Ticker) -> Option<Decimal> {
        self.cache.get(ticker).copied()
    }

    /// Drop every cached quote so the next lookup re-queries the source.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl<S: PriceSource> PriceSource for PriceMemo<S> {
    fn price(&mut self, ticker: &Ticker) -> Result<Decimal> {
        if let Some(&price) = self.cache.get(ticker) {
            return Ok(price);
        }
        self.lookups += 1;
        let price = self.source.price(ticker)?;
        if price <= Decimal::ZERO {
            return Err(Error::NonPositivePrice {
                ticker: ticker.clone(),
                price,
            });
        }
        self.cache.insert(ticker.clone(), price);
        Ok(price)
    }
}
