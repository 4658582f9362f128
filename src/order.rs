//! Rebalance orders and share-count helpers.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::action::Action;
use crate::types::{Quantity, Ticker};

/// A single order produced by a rebalance run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct Order {
    pub ticker: Ticker,
    pub account: String,
    pub shares: Quantity,
    pub action: Action,
}

impl Order {
    pub fn new(ticker: Ticker, account: impl Into<String>, shares: Quantity, action: Action) -> Self {
        Self {
            ticker,
            account: account.into(),
            shares,
            action,
        }
    }

    pub fn sell(ticker: Ticker, account: impl Into<String>, shares: Quantity) -> Self {
        Self::new(ticker, account, shares, Action::Sell)
    }

    pub fn buy(ticker: Ticker, account: impl Into<String>, shares: Quantity) -> Self {
        Self::new(ticker, account, shares, Action::Buy)
    }

    /// Cash value of the order at `price`.
    pub fn notional(&self, price: Decimal) -> Decimal {
        Decimal::from(self.shares) * price
    }

    /// Signed share delta: negative for sells.
    pub fn signed_shares(&self) -> Decimal {
        match self.action {
            Action::Buy => Decimal::from(self.shares),
            Action::Sell => -Decimal::from(self.shares),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} in {}",
            self.action, self.shares, self.ticker, self.account
        )
    }
}

/// Whole shares contained in `amount`, rounded toward zero.
///
/// Negative or out-of-range amounts yield zero.
pub(crate) fn whole_shares(amount: Decimal) -> Quantity {
    if amount <= Decimal::ZERO {
        return 0;
    }
    amount.trunc().to_u64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn whole_shares_truncates() {
        assert_eq!(whole_shares(dec!(111.11)), 111);
        assert_eq!(whole_shares(dec!(0.999)), 0);
        assert_eq!(whole_shares(dec!(-3)), 0);
        assert_eq!(whole_shares(dec!(250)), 250);
    }

    #[test]
    fn notional_and_sign() {
        let sell = Order::sell(Ticker::new("BND"), "Taxable", 95);
        assert_eq!(sell.notional(dec!(80)), dec!(7600));
        assert_eq!(sell.signed_shares(), dec!(-95));

        let buy = Order::buy(Ticker::new("VTI"), "IRA", 3);
        assert_eq!(buy.signed_shares(), dec!(3));
    }

    #[test]
    fn display() {
        let order = Order::buy(Ticker::new("VXUS"), "IRA", 600);
        assert_eq!(order.to_string(), "buy 600 VXUS in IRA");
    }
}
