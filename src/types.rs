//! Core types: Ticker, Quantity, AccountType

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Security identifier used to key holdings, weights, and prices.
///
/// Tickers compare and sort alphabetically; that ordering is part of the
/// final order-list tie-break.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ticker(String);

impl Ticker {
    pub fn new(s: impl Into<String>) -> Self {
        Ticker(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Ticker::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Ticker(s)
    }
}

/// Whole number of shares on an order. Always positive once emitted.
pub type Quantity = u64;

/// Tax treatment of an account.
///
/// Sells prefer tax-advantaged accounts (no realized gains); buys also prefer
/// them before falling back to taxable cash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccountType {
    Taxable,
    #[cfg_attr(feature = "serde", serde(rename = "Tax-Advantaged"))]
    TaxAdvantaged,
}

impl AccountType {
    #[inline]
    pub fn is_tax_advantaged(self) -> bool {
        matches!(self, AccountType::TaxAdvantaged)
    }

    /// Sort rank: tax-advantaged accounts come first.
    #[inline]
    pub(crate) fn preference(self) -> u8 {
        match self {
            AccountType::TaxAdvantaged => 0,
            AccountType::Taxable => 1,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Taxable => f.pad("Taxable"),
            AccountType::TaxAdvantaged => f.pad("Tax-Advantaged"),
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Taxable" => Ok(AccountType::Taxable),
            "Tax-Advantaged" => Ok(AccountType::TaxAdvantaged),
            other => Err(Error::InvalidAccountType(other.to_string())),
        }
    }
}
