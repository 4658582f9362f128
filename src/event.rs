//! Decision events recorded during a rebalance run.
//!
//! Every branch the pipeline takes that a caller may want to audit is
//! recorded as a typed event on the [`RebalancePlan`](crate::RebalancePlan),
//! in the order the decisions were made. Tests assert on these directly.

use std::fmt;

use rust_decimal::Decimal;

use crate::action::Action;
use crate::types::{Quantity, Ticker};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RebalanceEvent {
    /// Weighted ticker with no current value: the full target is bought.
    NewPosition { ticker: Ticker, target_shares: Decimal },
    /// Relative deviation under the threshold: target pinned to current shares.
    ThresholdPinned { ticker: Ticker, deviation: Decimal },
    /// Relative deviation at or above the threshold: computed target kept.
    ThresholdExceeded { ticker: Ticker, deviation: Decimal },
    /// Held ticker with no weight: sold in full.
    Liquidation { ticker: Ticker, shares: Decimal },
    /// Accounts ran out of shares before the sell request was met.
    SellShortfall {
        ticker: Ticker,
        requested: Decimal,
        unfilled: Decimal,
    },
    /// Accounts ran out of cash before the buy request was met.
    BuyShortfall {
        ticker: Ticker,
        requested: Decimal,
        unfilled: Decimal,
    },
    /// Fragment whose action contradicts an earlier one for the same key.
    ConflictDropped {
        ticker: Ticker,
        account: String,
        action: Action,
        shares: Quantity,
    },
}

impl RebalanceEvent {
    /// Short machine name, stable across releases.
    pub fn name(&self) -> &'static str {
        match self {
            RebalanceEvent::NewPosition { .. } => "new_position",
            RebalanceEvent::ThresholdPinned { .. } => "threshold_pinned",
            RebalanceEvent::ThresholdExceeded { .. } => "threshold_exceeded",
            RebalanceEvent::Liquidation { .. } => "liquidation",
            RebalanceEvent::SellShortfall { .. } => "sell_shortfall",
            RebalanceEvent::BuyShortfall { .. } => "buy_shortfall",
            RebalanceEvent::ConflictDropped { .. } => "conflict_dropped",
        }
    }

    /// True for outcomes where the plan falls short of the targets.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RebalanceEvent::SellShortfall { .. }
                | RebalanceEvent::BuyShortfall { .. }
                | RebalanceEvent::ConflictDropped { .. }
        )
    }
}

impl fmt::Display for RebalanceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceEvent::NewPosition {
                ticker,
                target_shares,
            } => write!(f, "{ticker}: new position, target {target_shares} shares"),
            RebalanceEvent::ThresholdPinned { ticker, deviation } => write!(
                f,
                "{ticker}: deviation {:.2}% within threshold, no trade",
                deviation * Decimal::ONE_HUNDRED
            ),
            RebalanceEvent::ThresholdExceeded { ticker, deviation } => write!(
                f,
                "{ticker}: deviation {:.2}% exceeds threshold, rebalancing",
                deviation * Decimal::ONE_HUNDRED
            ),
            RebalanceEvent::Liquidation { ticker, shares } => {
                write!(f, "{ticker}: no target weight, liquidating {shares} shares")
            }
            RebalanceEvent::SellShortfall {
                ticker,
                requested,
                unfilled,
            } => write!(
                f,
                "{ticker}: could not sell {unfilled} of {requested} requested shares"
            ),
            RebalanceEvent::BuyShortfall {
                ticker,
                requested,
                unfilled,
            } => write!(
                f,
                "{ticker}: insufficient cash, {unfilled} of {requested} requested shares not bought"
            ),
            RebalanceEvent::ConflictDropped {
                ticker,
                account,
                action,
                shares,
            } => write!(
                f,
                "{ticker}/{account}: dropped conflicting {action} of {shares} shares"
            ),
        }
    }
}
