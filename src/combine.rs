//! Merge order fragments and impose the final deterministic ordering.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::event::RebalanceEvent;
use crate::model::Weight;
use crate::order::Order;
use crate::state::CurrentState;
use crate::types::{AccountType, Ticker};

/// Lookups the final sort needs: ticker volatility and account type.
pub struct OrderRanking<'a> {
    volatility: FxHashMap<&'a Ticker, Decimal>,
    state: &'a CurrentState,
}

impl<'a> OrderRanking<'a> {
    pub fn new(weights: &'a [Weight], state: &'a CurrentState) -> Self {
        Self {
            volatility: weights.iter().map(|w| (&w.ticker, w.volatility)).collect(),
            state,
        }
    }

    /// Volatility of `ticker`; zero when it has no weight.
    pub fn volatility(&self, ticker: &Ticker) -> Decimal {
        self.volatility.get(ticker).copied().unwrap_or(Decimal::ZERO)
    }

    fn account_preference(&self, account: &str) -> u8 {
        self.state
            .account(account)
            .map(|a| a.kind)
            .unwrap_or(AccountType::Taxable)
            .preference()
    }

    /// Composite order comparison:
    ///
    /// 1. sells before buys
    /// 2. volatility, highest first
    /// 3. ticker, alphabetically
    /// 4. tax-advantaged accounts before taxable
    /// 5. account name, alphabetically
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        a.action
            .priority()
            .cmp(&b.action.priority())
            .then_with(|| self.volatility(&b.ticker).cmp(&self.volatility(&a.ticker)))
            .then_with(|| a.ticker.cmp(&b.ticker))
            .then_with(|| {
                self.account_preference(&a.account)
                    .cmp(&self.account_preference(&b.account))
            })
            .then_with(|| a.account.cmp(&b.account))
    }
}

/// Merge fragments into one order per (ticker, account) and sort them.
///
/// Fragments for the same key and action are summed. The first action seen
/// for a key wins: a later fragment with the opposite action is dropped and
/// reported as [`RebalanceEvent::ConflictDropped`]. Feed sells before buys so
/// any conflict resolves to the sell. Zero-share results are removed.
pub fn combine_orders(
    fragments: Vec<Order>,
    ranking: &OrderRanking<'_>,
    events: &mut Vec<RebalanceEvent>,
) -> Vec<Order> {
    let mut merged: Vec<Order> = Vec::with_capacity(fragments.len());
    let mut index: FxHashMap<(Ticker, String), usize> = FxHashMap::default();

    for fragment in fragments {
        let key = (fragment.ticker.clone(), fragment.account.clone());
        match index.get(&key).copied() {
            Some(i) if merged[i].action == fragment.action => {
                merged[i].shares += fragment.shares;
            }
            Some(_) => events.push(RebalanceEvent::ConflictDropped {
                ticker: fragment.ticker,
                account: fragment.account,
                action: fragment.action,
                shares: fragment.shares,
            }),
            None => {
                index.insert(key, merged.len());
                merged.push(fragment);
            }
        }
    }

    merged.retain(|o| o.shares > 0);
    merged.sort_by(|a, b| ranking.compare(a, b));
    merged
}
