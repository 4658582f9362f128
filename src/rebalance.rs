//! The rebalance pipeline: state → target → threshold → sells → buys → combine.
//!
//! Each stage takes the values it needs and hands back the values it
//! produces; nothing is kept between runs except the price memo owned by a
//! [`Rebalancer`].

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::action::Action;
use crate::allocate::{allocate_buys, allocate_sells};
use crate::combine::{OrderRanking, combine_orders};
use crate::error::Result;
use crate::event::RebalanceEvent;
use crate::model::{Account, Holding, Weight};
use crate::order::Order;
use crate::price::{PriceMemo, PriceSource};
use crate::state::CurrentState;
use crate::target::{DEFAULT_THRESHOLD, TargetState, apply_threshold};
use crate::types::Ticker;

/// Outcome of one rebalance run.
#[derive(Clone, Debug)]
pub struct RebalancePlan {
    /// Orders to place, sells first, in deterministic order.
    pub orders: Vec<Order>,
    /// Decisions taken while planning, in the order they were made.
    pub events: Vec<RebalanceEvent>,
    /// Portfolio value before trading.
    pub total_value: Decimal,
    /// Targets after the threshold filter.
    pub targets: TargetState,
    /// Portfolio as it would stand once every order fills at the run's prices.
    pub projected: CurrentState,
}

impl RebalancePlan {
    /// True when the portfolio already matches its targets.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RebalanceEvent> {
        self.events.iter().filter(|e| e.is_warning())
    }

    pub fn sells(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.action == Action::Sell)
    }

    pub fn buys(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.action == Action::Buy)
    }
}

/// Plans rebalances against an injected price source.
///
/// ```
/// use driftbook::{Account, Rebalancer, StaticPrices, Weight};
/// use rust_decimal::Decimal;
///
/// let prices = StaticPrices::new().with("VTI", Decimal::from(100));
/// let mut rebalancer = Rebalancer::new(prices);
///
/// let weights = [Weight::new("VTI", Decimal::ONE, Decimal::new(1, 1))];
/// let accounts = [Account::taxable("Brokerage", Decimal::from(10_000))];
///
/// let plan = rebalancer.rebalance(&weights, &accounts, &[]).unwrap();
/// assert_eq!(plan.orders.len(), 1);
/// assert_eq!(plan.orders[0].shares, 100);
/// ```
#[derive(Debug)]
pub struct Rebalancer<S> {
    prices: PriceMemo<S>,
    threshold: Decimal,
}

impl<S: PriceSource> Rebalancer<S> {
    pub fn new(source: S) -> Self {
        Self {
            prices: PriceMemo::new(source),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Override the no-trade threshold (relative deviation, e.g. `0.05`).
    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// The price memo, for inspection.
    pub fn prices(&self) -> &PriceMemo<S> {
        &self.prices
    }

    /// Forget memoized prices; the next run re-quotes every ticker.
    pub fn clear_prices(&mut self) {
        self.prices.clear();
    }

    /// Build the current state only (no orders).
    pub fn current_state(
        &mut self,
        weights: &[Weight],
        accounts: &[Account],
        holdings: &[Holding],
    ) -> Result<CurrentState> {
        CurrentState::build(weights, accounts, holdings, &mut self.prices)
    }

    /// Compute the orders that move `holdings` toward `weights`.
    ///
    /// Fails when a price cannot be resolved, the inputs are inconsistent
    /// (unknown or duplicate accounts, duplicate weights), or a value
    /// overflows `Decimal`.
    pub fn rebalance(
        &mut self,
        weights: &[Weight],
        accounts: &[Account],
        holdings: &[Holding],
    ) -> Result<RebalancePlan> {
        let state = self.current_state(weights, accounts, holdings)?;
        plan(state, weights, self.threshold)
    }
}

/// Run every stage after state calculation.
pub fn plan(
    mut state: CurrentState,
    weights: &[Weight],
    threshold: Decimal,
) -> Result<RebalancePlan> {
    let total_value = state.total_value();

    let mut targets = TargetState::compute(&state, weights)?;
    let mut events = apply_threshold(&mut targets, &state, threshold);

    let mut fragments = Vec::new();
    execute_sells(&mut state, &targets, &mut fragments, &mut events);
    execute_buys(&mut state, &targets, weights, &mut fragments, &mut events);

    let orders = {
        let ranking = OrderRanking::new(weights, &state);
        combine_orders(fragments, &ranking, &mut events)
    };

    Ok(RebalancePlan {
        orders,
        events,
        total_value,
        targets,
        projected: state,
    })
}

/// Sell unweighted tickers in full and trim those above target.
fn execute_sells(
    state: &mut CurrentState,
    targets: &TargetState,
    fragments: &mut Vec<Order>,
    events: &mut Vec<RebalanceEvent>,
) {
    let held: Vec<Ticker> = state.held_tickers().into_iter().cloned().collect();

    for ticker in held {
        let current = state.total_shares(&ticker);
        let to_sell = match targets.get(&ticker) {
            Some(target) => current - target,
            None => {
                if current >= Decimal::ONE {
                    events.push(RebalanceEvent::Liquidation {
                        ticker: ticker.clone(),
                        shares: current,
                    });
                }
                current
            }
        };
        if to_sell >= Decimal::ONE {
            allocate_sells(state, &ticker, to_sell, fragments, events);
        }
    }
}

/// Buy tickers below target, highest volatility first.
fn execute_buys(
    state: &mut CurrentState,
    targets: &TargetState,
    weights: &[Weight],
    fragments: &mut Vec<Order>,
    events: &mut Vec<RebalanceEvent>,
) {
    let mut wanted: Vec<(&Weight, Decimal)> = weights
        .iter()
        .filter_map(|w| {
            let target = targets.get(&w.ticker)?;
            let to_buy = target - state.total_shares(&w.ticker);
            (to_buy >= Decimal::ONE).then_some((w, to_buy))
        })
        .collect();
    wanted.sort_by(|(a, _), (b, _)| by_volatility(a, b));

    for (weight, to_buy) in wanted {
        allocate_buys(state, &weight.ticker, to_buy, fragments, events);
    }
}

fn by_volatility(a: &Weight, b: &Weight) -> Ordering {
    b.volatility
        .cmp(&a.volatility)
        .then_with(|| a.ticker.cmp(&b.ticker))
}
