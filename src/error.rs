//! Errors that abort a rebalance run.
//!
//! Cash and share shortfalls are not errors: they surface as
//! [`RebalanceEvent`](crate::RebalanceEvent)s on the returned plan.

use rust_decimal::Decimal;

use crate::types::Ticker;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("price unavailable for {ticker}: {reason}")]
    PriceUnavailable { ticker: Ticker, reason: String },

    #[error("price for {ticker} must be positive, got {price}")]
    NonPositivePrice { ticker: Ticker, price: Decimal },

    #[error("holding of {ticker} references unknown account '{account}'")]
    UnknownAccount { account: String, ticker: Ticker },

    #[error("duplicate account: {0}")]
    DuplicateAccount(String),

    #[error("duplicate weight for ticker: {0}")]
    DuplicateWeight(Ticker),

    #[error("invalid account type '{0}' (expected Taxable or Tax-Advantaged)")]
    InvalidAccountType(String),

    /// A value derived from `ticker` left the range of `Decimal`.
    #[error("arithmetic overflow while valuing {ticker}")]
    Overflow { ticker: Ticker },

    #[error("arithmetic overflow while summing idle cash of account '{account}'")]
    CashOverflow { account: String },
}

pub type Result<T> = std::result::Result<T, Error>;
