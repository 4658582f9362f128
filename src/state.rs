//! Current portfolio state: holdings per account, idle cash, and total value.

use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::model::{Account, Holding, Weight};
use crate::price::PriceSource;
use crate::types::{AccountType, Quantity, Ticker};

/// Per-account cash and type, mutated as orders are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountState {
    pub name: String,
    pub kind: AccountType,
    pub idle_cash: Decimal,
}

/// Snapshot of what the portfolio holds right now.
///
/// Built once per run, then updated in place as sells execute so their
/// proceeds fund the buys that follow.
#[derive(Clone, Debug)]
pub struct CurrentState {
    holdings: FxHashMap<Ticker, FxHashMap<String, Decimal>>,
    accounts: FxHashMap<String, AccountState>,
    prices: FxHashMap<Ticker, Decimal>,
    total_value: Decimal,
}

impl CurrentState {
    /// Derive the current state from raw inputs.
    ///
    /// Prices every held and every weighted ticker through `prices`.
    /// `total_value` is the exact sum of idle cash plus `shares × price` over
    /// all holdings; a sum outside the range of `Decimal` is an error.
    pub fn build<P: PriceSource>(
        weights: &[Weight],
        accounts: &[Account],
        holdings: &[Holding],
        prices: &mut P,
    ) -> Result<Self> {
        let mut account_map: FxHashMap<String, AccountState> = FxHashMap::default();
        let mut total_value = Decimal::ZERO;

        for account in accounts {
            if account_map.contains_key(&account.name) {
                return Err(Error::DuplicateAccount(account.name.clone()));
            }
            total_value = total_value
                .checked_add(account.idle_cash)
                .ok_or_else(|| Error::CashOverflow {
                    account: account.name.clone(),
                })?;
            account_map.insert(
                account.name.clone(),
                AccountState {
                    name: account.name.clone(),
                    kind: account.kind,
                    idle_cash: account.idle_cash,
                },
            );
        }

        let mut state = Self {
            holdings: FxHashMap::default(),
            accounts: account_map,
            prices: FxHashMap::default(),
            total_value: Decimal::ZERO,
        };

        for holding in holdings {
            if !state.accounts.contains_key(&holding.account) {
                return Err(Error::UnknownAccount {
                    account: holding.account.clone(),
                    ticker: holding.ticker.clone(),
                });
            }
            let price = state.resolve_price(&holding.ticker, prices)?;
            total_value = holding
                .shares
                .checked_mul(price)
                .and_then(|value| total_value.checked_add(value))
                .ok_or_else(|| Error::Overflow {
                    ticker: holding.ticker.clone(),
                })?;
            *state.shares_mut(&holding.ticker, &holding.account) += holding.shares;
        }

        let mut seen: FxHashSet<&Ticker> = FxHashSet::default();
        for weight in weights {
            if !seen.insert(&weight.ticker) {
                return Err(Error::DuplicateWeight(weight.ticker.clone()));
            }
            state.resolve_price(&weight.ticker, prices)?;
        }

        state.total_value = total_value;
        Ok(state)
    }

    fn resolve_price<P: PriceSource>(&mut self, ticker: &Ticker, source: &mut P) -> Result<Decimal> {
        if let Some(&price) = self.prices.get(ticker) {
            return Ok(price);
        }
        let price = source.price(ticker)?;
        if price <= Decimal::ZERO {
            return Err(Error::NonPositivePrice {
                ticker: ticker.clone(),
                price,
            });
        }
        self.prices.insert(ticker.clone(), price);
        Ok(price)
    }

    // === Queries ===

    /// Total value at the start of the run (cash + holdings).
    #[inline]
    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    /// Value of the portfolio as it stands now, at the run's prices.
    ///
    /// Equals [`total_value`](Self::total_value) after any sequence of
    /// applied orders, since trades only swap cash for shares.
    pub fn market_value(&self) -> Decimal {
        let cash: Decimal = self.accounts.values().map(|a| a.idle_cash).sum();
        let invested: Decimal = self
            .holdings
            .iter()
            .map(|(ticker, by_account)| {
                let price = self.price(ticker).unwrap_or(Decimal::ZERO);
                by_account.values().copied().sum::<Decimal>() * price
            })
            .sum();
        cash + invested
    }

    /// Price resolved for `ticker` during this run.
    pub fn price(&self, ticker: &Ticker) -> Option<Decimal> {
        self.prices.get(ticker).copied()
    }

    /// Shares of `ticker` in `account`; zero when nothing is held.
    pub fn shares(&self, ticker: &Ticker, account: &str) -> Decimal {
        self.holdings
            .get(ticker)
            .and_then(|by_account| by_account.get(account))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Shares of `ticker` summed across every account.
    pub fn total_shares(&self, ticker: &Ticker) -> Decimal {
        self.holdings
            .get(ticker)
            .map(|by_account| by_account.values().copied().sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// Tickers with any recorded holding, sorted.
    pub fn held_tickers(&self) -> Vec<&Ticker> {
        let mut tickers: Vec<&Ticker> = self.holdings.keys().collect();
        tickers.sort();
        tickers
    }

    /// Non-zero holdings of `ticker` as (account, shares), sorted by account.
    pub fn holdings_of(&self, ticker: &Ticker) -> Vec<(&str, Decimal)> {
        let mut rows: Vec<(&str, Decimal)> = self
            .holdings
            .get(ticker)
            .map(|by_account| {
                by_account
                    .iter()
                    .filter(|(_, shares)| !shares.is_zero())
                    .map(|(account, shares)| (account.as_str(), *shares))
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }

    pub fn account(&self, name: &str) -> Option<&AccountState> {
        self.accounts.get(name)
    }

    /// Idle cash of `account`; zero for unknown accounts.
    pub fn idle_cash(&self, account: &str) -> Decimal {
        self.accounts
            .get(account)
            .map(|a| a.idle_cash)
            .unwrap_or(Decimal::ZERO)
    }

    /// All accounts, unordered.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountState> {
        self.accounts.values()
    }

    // === Mutation ===

    /// Entry for (ticker, account), inserted at zero on first access.
    fn shares_mut(&mut self, ticker: &Ticker, account: &str) -> &mut Decimal {
        self.holdings
            .entry(ticker.clone())
            .or_default()
            .entry(account.to_string())
            .or_default()
    }

    /// Record an executed sell: shares leave the account, proceeds land in its cash.
    pub fn apply_sell(&mut self, ticker: &Ticker, account: &str, shares: Quantity) {
        let qty = Decimal::from(shares);
        let price = self.price(ticker).unwrap_or(Decimal::ZERO);
        *self.shares_mut(ticker, account) -= qty;
        if let Some(acct) = self.accounts.get_mut(account) {
            acct.idle_cash += qty * price;
        }
    }

    /// Record an executed buy: cash leaves the account, shares land in it.
    pub fn apply_buy(&mut self, ticker: &Ticker, account: &str, shares: Quantity) {
        let qty = Decimal::from(shares);
        let price = self.price(ticker).unwrap_or(Decimal::ZERO);
        *self.shares_mut(ticker, account) += qty;
        if let Some(acct) = self.accounts.get_mut(account) {
            acct.idle_cash -= qty * price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::StaticPrices;
    use rust_decimal_macros::dec;

    fn prices() -> StaticPrices {
        StaticPrices::new()
            .with("VTI", dec!(100))
            .with("VXUS", dec!(50))
            .with("BND", dec!(80))
    }

    fn accounts() -> Vec<Account> {
        vec![
            Account::taxable("Taxable", dec!(5000)),
            Account::tax_advantaged("IRA", dec!(3000)),
        ]
    }

    #[test]
    fn total_value_sums_cash_and_holdings() {
        let holdings = vec![
            Holding::new("VTI", "Taxable", dec!(100)),
            Holding::new("VXUS", "IRA", dec!(50)),
            Holding::new("BND", "Taxable", dec!(200)),
        ];
        let state = CurrentState::build(&[], &accounts(), &holdings, &mut prices()).unwrap();

        // 8,000 cash + 10,000 + 2,500 + 16,000
        assert_eq!(state.total_value(), dec!(36500));
        assert_eq!(state.market_value(), state.total_value());
        assert_eq!(state.shares(&Ticker::new("VTI"), "Taxable"), dec!(100));
        assert_eq!(state.shares(&Ticker::new("VTI"), "IRA"), Decimal::ZERO);
    }

    #[test]
    fn fractional_shares_are_exact() {
        let holdings = vec![Holding::new("VTI", "IRA", dec!(0.1))];
        let mut prices = StaticPrices::new().with("VTI", dec!(0.3));
        let state = CurrentState::build(&[], &accounts(), &holdings, &mut prices).unwrap();
        assert_eq!(state.total_value(), dec!(8000.03));
    }

    #[test]
    fn duplicate_holdings_accumulate() {
        let holdings = vec![
            Holding::new("VTI", "IRA", dec!(10)),
            Holding::new("VTI", "IRA", dec!(5)),
        ];
        let state = CurrentState::build(&[], &accounts(), &holdings, &mut prices()).unwrap();
        assert_eq!(state.total_shares(&Ticker::new("VTI")), dec!(15));
    }

    #[test]
    fn unknown_account_is_an_error() {
        let holdings = vec![Holding::new("VTI", "Roth", dec!(10))];
        let err = CurrentState::build(&[], &accounts(), &holdings, &mut prices()).unwrap_err();
        assert!(matches!(err, Error::UnknownAccount { ref account, .. } if account == "Roth"));
    }

    #[test]
    fn missing_price_for_weight_is_an_error() {
        let weights = vec![Weight::new("GLD", dec!(0.1), dec!(0.15))];
        let err = CurrentState::build(&weights, &accounts(), &[], &mut prices()).unwrap_err();
        assert!(matches!(err, Error::PriceUnavailable { ref ticker, .. } if ticker.as_str() == "GLD"));
    }

    #[test]
    fn duplicate_account_is_an_error() {
        let mut accts = accounts();
        accts.push(Account::taxable("IRA", dec!(1)));
        let err = CurrentState::build(&[], &accts, &[], &mut prices()).unwrap_err();
        assert_eq!(err, Error::DuplicateAccount("IRA".into()));
    }

    #[test]
    fn duplicate_weight_is_an_error() {
        let weights = vec![
            Weight::new("VTI", dec!(0.5), dec!(0.1)),
            Weight::new("VTI", dec!(0.5), dec!(0.1)),
        ];
        let err = CurrentState::build(&weights, &accounts(), &[], &mut prices()).unwrap_err();
        assert_eq!(err, Error::DuplicateWeight(Ticker::new("VTI")));
    }

    #[test]
    fn holding_value_beyond_decimal_range_is_an_error() {
        let holdings = vec![Holding::new("VTI", "Taxable", dec!(1000000000000000000000000000))];
        let err = CurrentState::build(&[], &accounts(), &holdings, &mut prices()).unwrap_err();
        assert_eq!(
            err,
            Error::Overflow {
                ticker: Ticker::new("VTI")
            }
        );
    }

    #[test]
    fn idle_cash_beyond_decimal_range_is_an_error() {
        let accts = vec![
            Account::taxable("A", Decimal::MAX),
            Account::taxable("B", dec!(1)),
        ];
        let err = CurrentState::build(&[], &accts, &[], &mut prices()).unwrap_err();
        assert_eq!(err, Error::CashOverflow { account: "B".into() });
    }

    #[test]
    fn apply_sell_and_buy_move_cash() {
        let holdings = vec![Holding::new("BND", "Taxable", dec!(200))];
        let mut state = CurrentState::build(&[], &accounts(), &holdings, &mut prices()).unwrap();
        let bnd = Ticker::new("BND");

        state.apply_sell(&bnd, "Taxable", 109);
        assert_eq!(state.shares(&bnd, "Taxable"), dec!(91));
        assert_eq!(state.idle_cash("Taxable"), dec!(13720));

        state.apply_buy(&bnd, "IRA", 10);
        assert_eq!(state.shares(&bnd, "IRA"), dec!(10));
        assert_eq!(state.idle_cash("IRA"), dec!(2200));
        assert_eq!(state.market_value(), state.total_value());
    }
}
