//! # driftbook
//!
//! Deterministic multi-account portfolio rebalancing.
//!
//! Given target weights, a set of accounts with idle cash, and the current
//! holdings in those accounts, `driftbook` computes the whole-share buy and
//! sell orders that move the portfolio toward its targets.
//!
//! ## Features
//!
//! - **Exact arithmetic**: cash, prices, and share counts are [`Decimal`], never `f64`
//! - **No-trade threshold**: tickers within 5% of target (configurable) are left alone
//! - **Tax-aware allocation**: sells drain tax-advantaged accounts first; buys
//!   prefer tax-advantaged accounts, then the largest cash pool
//! - **Sell-then-buy**: sale proceeds fund buys in the same run
//! - **Deterministic output**: a fixed composite ordering, independent of input order
//! - **Typed decisions**: threshold pins, liquidations, and shortfalls are
//!   reported as [`RebalanceEvent`]s instead of log lines
//!
//! ## Quick Start
//!
//! ```
//! use driftbook::{Account, Action, Holding, Rebalancer, StaticPrices, Weight};
//! use rust_decimal::Decimal;
//!
//! let d = |s: &str| s.parse::<Decimal>().unwrap();
//!
//! let prices = StaticPrices::new()
//!     .with("VTI", d("100"))
//!     .with("BND", d("80"));
//!
//! let weights = [
//!     Weight::new("VTI", d("0.6"), d("0.1")),
//!     Weight::new("BND", d("0.4"), d("0.03")),
//! ];
//! let accounts = [
//!     Account::taxable("Brokerage", d("1000")),
//!     Account::tax_advantaged("IRA", d("0")),
//! ];
//! let holdings = [
//!     Holding::new("VTI", "Brokerage", d("50")),
//!     Holding::new("BND", "IRA", d("100")),
//! ];
//!
//! let mut rebalancer = Rebalancer::new(prices);
//! let plan = rebalancer.rebalance(&weights, &accounts, &holdings).unwrap();
//!
//! // Total value 14,000: BND is trimmed to 70 shares inside the IRA, and the
//! // proceeds plus the brokerage cash buy VTI up to 84 shares.
//! assert_eq!(plan.orders.len(), 3);
//! assert_eq!(plan.orders[0].action, Action::Sell);
//! assert_eq!(plan.orders[0].shares, 30);
//! assert_eq!(plan.orders[1].account, "IRA");
//! assert_eq!(plan.orders[1].shares, 24);
//! assert_eq!(plan.orders[2].account, "Brokerage");
//! assert_eq!(plan.orders[2].shares, 10);
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Function |
//! |-------|----------|
//! | Current state | [`CurrentState::build`] |
//! | Targets | [`TargetState::compute`] |
//! | Threshold | [`apply_threshold`] |
//! | Sells | [`allocate_sells`] |
//! | Buys | [`allocate_buys`] |
//! | Combine | [`combine_orders`] |
//!
//! [`Rebalancer::rebalance`] runs them in order. Every stage is public so it
//! can be exercised on its own.
//!
//! ## Order Ordering
//!
//! Plans list orders by:
//!
//! 1. sells before buys
//! 2. ticker volatility, highest first (unweighted tickers count as zero)
//! 3. ticker, alphabetically
//! 4. tax-advantaged accounts before taxable
//! 5. account name, alphabetically

mod action;
pub mod allocate;
pub mod combine;
mod error;
mod event;
mod model;
mod order;
pub mod price;
pub mod rebalance;
pub mod state;
pub mod target;
mod types;

// Re-export public API
pub use action::Action;
pub use allocate::{allocate_buys, allocate_sells};
pub use combine::{OrderRanking, combine_orders};
pub use error::{Error, Result};
pub use event::RebalanceEvent;
pub use model::{Account, Holding, Weight};
pub use order::Order;
pub use price::{PriceMemo, PriceSource, StaticPrices};
pub use rebalance::{RebalancePlan, Rebalancer};
pub use rust_decimal::Decimal;
pub use state::{AccountState, CurrentState};
pub use target::{DEFAULT_THRESHOLD, TargetState, apply_threshold};
pub use types::{AccountType, Quantity, Ticker};
