//! Target share counts and the no-trade threshold.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::event::RebalanceEvent;
use crate::model::Weight;
use crate::state::CurrentState;
use crate::types::Ticker;

/// Default relative-deviation tolerance (5%).
pub const DEFAULT_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Desired share count per weighted ticker.
///
/// Tickers that are held but absent from the weights have no entry here,
/// which marks them for full liquidation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetState {
    shares: FxHashMap<Ticker, Decimal>,
}

impl TargetState {
    /// `trunc(cash_weight × total_value / price)` for every weight.
    ///
    /// Rounds toward zero so a target never costs more than its weight's
    /// share of the portfolio. Fails with [`Error::Overflow`] when the share
    /// count does not fit in a `Decimal` (a huge weight or a tiny price).
    pub fn compute(state: &CurrentState, weights: &[Weight]) -> Result<Self> {
        let total_value = state.total_value();
        let mut shares = FxHashMap::default();
        for w in weights {
            let Some(price) = state.price(&w.ticker) else {
                continue;
            };
            let target = w
                .cash_weight
                .checked_mul(total_value)
                .and_then(|value| value.checked_div(price))
                .ok_or_else(|| Error::Overflow {
                    ticker: w.ticker.clone(),
                })?;
            shares.insert(w.ticker.clone(), target.trunc());
        }
        Ok(Self { shares })
    }

    pub fn get(&self, ticker: &Ticker) -> Option<Decimal> {
        self.shares.get(ticker).copied()
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.shares.contains_key(ticker)
    }

    pub fn set(&mut self, ticker: Ticker, shares: Decimal) {
        self.shares.insert(ticker, shares);
    }

    /// Targeted tickers, sorted.
    pub fn tickers(&self) -> Vec<&Ticker> {
        let mut tickers: Vec<&Ticker> = self.shares.keys().collect();
        tickers.sort();
        tickers
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// Relative deviation `|current − target| / current` between two values.
///
/// `None` when `current_value` is zero (a position being opened). A ratio
/// too large for `Decimal` saturates at `Decimal::MAX`.
pub fn relative_deviation(current_value: Decimal, target_value: Decimal) -> Option<Decimal> {
    if current_value.is_zero() {
        return None;
    }
    let gap = (current_value - target_value).abs();
    Some(gap.checked_div(current_value).unwrap_or(Decimal::MAX))
}

/// Pin targets that sit within `threshold` of the current holding.
///
/// A ticker with no current value is never pinned: its whole target must be
/// bought. Otherwise a relative deviation strictly below `threshold` sets the
/// target to the current share count. Returns one event per targeted ticker,
/// in ticker order.
pub fn apply_threshold(
    targets: &mut TargetState,
    state: &CurrentState,
    threshold: Decimal,
) -> Vec<RebalanceEvent> {
    let mut events = Vec::with_capacity(targets.len());
    let tickers: Vec<Ticker> = targets.tickers().into_iter().cloned().collect();

    for ticker in tickers {
        let (Some(target_shares), Some(price)) = (targets.get(&ticker), state.price(&ticker))
        else {
            continue;
        };
        let current_shares = state.total_shares(&ticker);
        let current_value = current_shares * price;
        let target_value = target_shares * price;

        match relative_deviation(current_value, target_value) {
            None => events.push(RebalanceEvent::NewPosition {
                ticker,
                target_shares,
            }),
            Some(deviation) if deviation < threshold => {
                targets.set(ticker.clone(), current_shares);
                events.push(RebalanceEvent::ThresholdPinned { ticker, deviation });
            }
            Some(deviation) => {
                events.push(RebalanceEvent::ThresholdExceeded { ticker, deviation });
            }
        }
    }

    events
}
