//! CSV record loading and validation.
//!
//! Three files describe a portfolio:
//!
//! | File | Columns |
//! |------|---------|
//! | weights | `Ticker,Cash_Weight,Vol[,Asset_Class,Sub_Class]` |
//! | accounts | `Account,Type,Idle_Cash` |
//! | allocations | `Ticker,Account,Shares` |
//!
//! Structural problems (negative numbers, duplicate keys, unknown accounts)
//! are rejected here with the offending file named. Weights that do not sum
//! to one are only warned about.

use std::path::Path;

use driftbook::{Account, Decimal, Holding, Weight};
use log::{debug, warn};
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Error, Result};

/// Weight sums further than this from 1 are reported.
const WEIGHT_SUM_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The three record collections a rebalance runs on.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub weights: Vec<Weight>,
    pub accounts: Vec<Account>,
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    /// Load every record file named in `config`.
    pub fn load(config: &Config) -> Result<Self> {
        let weights = load_weights(&config.weights_path())?;
        let accounts = load_accounts(&config.accounts_path())?;
        let holdings = load_holdings(&config.allocations_path(), &accounts)?;
        debug!(
            "Loaded {} weights, {} accounts, {} holdings",
            weights.len(),
            accounts.len(),
            holdings.len()
        );
        Ok(Self {
            weights,
            accounts,
            holdings,
        })
    }
}

/// Read every row of a headed CSV file.
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let read_err = |source| Error::InputRead {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(read_err)
}

/// Load and validate target weights.
pub fn load_weights(path: &Path) -> Result<Vec<Weight>> {
    let weights: Vec<Weight> = read_records(path)?;
    validate_weights(&weights).map_err(|message| Error::input(path, message))?;

    if let Some(sum) = weight_sum_drift(&weights) {
        warn!(
            "Cash weights in {} sum to {sum}, not 1; targets are applied as given",
            path.display()
        );
    }
    Ok(weights)
}

/// Load and validate accounts.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    let accounts: Vec<Account> = read_records(path)?;
    validate_accounts(&accounts).map_err(|message| Error::input(path, message))?;
    Ok(accounts)
}

/// Load holdings and check each references one of `accounts`.
pub fn load_holdings(path: &Path, accounts: &[Account]) -> Result<Vec<Holding>> {
    let holdings: Vec<Holding> = read_records(path)?;
    validate_holdings(&holdings, accounts).map_err(|message| Error::input(path, message))?;
    Ok(holdings)
}

fn validate_weights(weights: &[Weight]) -> std::result::Result<(), String> {
    if weights.is_empty() {
        return Err("no weights".into());
    }
    let mut seen = FxHashSet::default();
    for w in weights {
        if w.ticker.as_str().is_empty() {
            return Err("empty ticker".into());
        }
        if !seen.insert(&w.ticker) {
            return Err(format!("duplicate ticker: {}", w.ticker));
        }
        if w.cash_weight < Decimal::ZERO || w.cash_weight > Decimal::ONE {
            return Err(format!(
                "cash weight for {} ({}) must be in [0, 1]",
                w.ticker, w.cash_weight
            ));
        }
        if w.volatility < Decimal::ZERO {
            return Err(format!(
                "volatility for {} ({}) is negative",
                w.ticker, w.volatility
            ));
        }
    }
    Ok(())
}

fn validate_accounts(accounts: &[Account]) -> std::result::Result<(), String> {
    if accounts.is_empty() {
        return Err("no accounts".into());
    }
    let mut seen = FxHashSet::default();
    for a in accounts {
        if a.name.is_empty() {
            return Err("empty account name".into());
        }
        if !seen.insert(a.name.as_str()) {
            return Err(format!("duplicate account: {}", a.name));
        }
        if a.idle_cash < Decimal::ZERO {
            return Err(format!(
                "idle cash for {} ({}) is negative",
                a.name, a.idle_cash
            ));
        }
    }
    Ok(())
}

fn validate_holdings(holdings: &[Holding], accounts: &[Account]) -> std::result::Result<(), String> {
    let known: FxHashSet<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
    for h in holdings {
        if h.ticker.as_str().is_empty() {
            return Err("empty ticker".into());
        }
        if !known.contains(h.account.as_str()) {
            return Err(format!(
                "{} is held in unknown account {}",
                h.ticker, h.account
            ));
        }
        if h.shares < Decimal::ZERO {
            return Err(format!(
                "{} in {} has negative shares ({})",
                h.ticker, h.account, h.shares
            ));
        }
    }
    Ok(())
}

/// The weight sum, when it is further than 0.01 from 1.
pub fn weight_sum_drift(weights: &[Weight]) -> Option<Decimal> {
    let sum: Decimal = weights.iter().map(|w| w.cash_weight).sum();
    ((sum - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE).then_some(sum)
}
