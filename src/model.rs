//! Input records: target weights, accounts, and current holdings.
//!
//! With the `serde` feature these deserialize straight from the flat record
//! layout (`Ticker`, `Cash_Weight`, `Vol`, `Account`, `Type`, `Idle_Cash`,
//! `Shares`) used by weight, account, and allocation files. Decimal fields
//! are read from their text so no value passes through `f64`.

use rust_decimal::Decimal;

use crate::types::{AccountType, Ticker};

/// Target allocation for one ticker.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weight {
    #[cfg_attr(feature = "serde", serde(rename = "Ticker"))]
    pub ticker: Ticker,
    /// Fraction of total portfolio value (0..=1).
    #[cfg_attr(
        feature = "serde",
        serde(rename = "Cash_Weight", with = "rust_decimal::serde::str")
    )]
    pub cash_weight: Decimal,
    /// Ordering key: higher volatility is bought and listed first.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "Vol", with = "rust_decimal::serde::str")
    )]
    pub volatility: Decimal,
    #[cfg_attr(feature = "serde", serde(rename = "Asset_Class", default))]
    pub asset_class: Option<String>,
    #[cfg_attr(feature = "serde", serde(rename = "Sub_Class", default))]
    pub sub_class: Option<String>,
}

impl Weight {
    pub fn new(ticker: impl Into<Ticker>, cash_weight: Decimal, volatility: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            cash_weight,
            volatility,
            asset_class: None,
            sub_class: None,
        }
    }

    pub fn with_class(mut self, asset_class: &str, sub_class: &str) -> Self {
        self.asset_class = Some(asset_class.to_string());
        self.sub_class = Some(sub_class.to_string());
        self
    }
}

/// A brokerage account with its uninvested cash.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    #[cfg_attr(feature = "serde", serde(rename = "Account"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "Type"))]
    pub kind: AccountType,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "Idle_Cash", with = "rust_decimal::serde::str")
    )]
    pub idle_cash: Decimal,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountType, idle_cash: Decimal) -> Self {
        Self {
            name: name.into(),
            kind,
            idle_cash,
        }
    }

    pub fn taxable(name: impl Into<String>, idle_cash: Decimal) -> Self {
        Self::new(name, AccountType::Taxable, idle_cash)
    }

    pub fn tax_advantaged(name: impl Into<String>, idle_cash: Decimal) -> Self {
        Self::new(name, AccountType::TaxAdvantaged, idle_cash)
    }
}

/// Shares of one ticker held in one account.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    #[cfg_attr(feature = "serde", serde(rename = "Ticker"))]
    pub ticker: Ticker,
    #[cfg_attr(feature = "serde", serde(rename = "Account"))]
    pub account: String,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "Shares", with = "rust_decimal::serde::str")
    )]
    pub shares: Decimal,
}

impl Holding {
    pub fn new(ticker: impl Into<Ticker>, account: impl Into<String>, shares: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            account: account.into(),
            shares,
        }
    }
}
