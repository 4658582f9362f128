//! Sell and buy allocation across accounts.
//!
//! Sells drain tax-advantaged accounts first (no realized gains), then taxable
//! ones, each group by account name. Buys also start with tax-advantaged
//! accounts and, within a type, spend from the largest cash pool first to
//! keep positions from fragmenting.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::event::RebalanceEvent;
use crate::order::{Order, whole_shares};
use crate::state::{AccountState, CurrentState};
use crate::types::Ticker;

/// Account visiting order for sells: tax-advantaged first, then by name.
fn sell_order(a: &AccountState, b: &AccountState) -> Ordering {
    a.kind
        .preference()
        .cmp(&b.kind.preference())
        .then_with(|| a.name.cmp(&b.name))
}

/// Account visiting order for buys: tax-advantaged first, then most idle
/// cash, then by name.
fn buy_order(a: &AccountState, b: &AccountState) -> Ordering {
    a.kind
        .preference()
        .cmp(&b.kind.preference())
        .then_with(|| b.idle_cash.cmp(&a.idle_cash))
        .then_with(|| a.name.cmp(&b.name))
}

/// Split a sell of `shares_to_sell` shares of `ticker` across accounts.
///
/// Each account gives up `trunc(min(remaining, held))` shares, emitted only
/// when that is at least one share. Every emitted sell is applied to `state`
/// immediately so the proceeds are available to later buys. Orders are
/// appended to `orders`; a shortfall of one share or more is reported as a
/// [`RebalanceEvent::SellShortfall`].
pub fn allocate_sells(
    state: &mut CurrentState,
    ticker: &Ticker,
    shares_to_sell: Decimal,
    orders: &mut Vec<Order>,
    events: &mut Vec<RebalanceEvent>,
) {
    let mut accounts: Vec<AccountState> = state.accounts().cloned().collect();
    accounts.sort_by(sell_order);

    let mut remaining = shares_to_sell;
    for account in &accounts {
        if remaining < Decimal::ONE {
            break;
        }
        let held = state.shares(ticker, &account.name);
        let shares = whole_shares(remaining.min(held));
        if shares == 0 {
            continue;
        }
        state.apply_sell(ticker, &account.name, shares);
        orders.push(Order::sell(ticker.clone(), account.name.clone(), shares));
        remaining -= Decimal::from(shares);
    }

    if remaining >= Decimal::ONE {
        events.push(RebalanceEvent::SellShortfall {
            ticker: ticker.clone(),
            requested: shares_to_sell,
            unfilled: remaining,
        });
    }
}

/// Split a buy of `shares_to_buy` shares of `ticker` across accounts.
///
/// Each account buys `trunc(min(remaining, floor(idle_cash / price)))`
/// shares, emitted only when that is at least one share; its cash is debited
/// in place. Running out of cash is a partial fill, reported as a
/// [`RebalanceEvent::BuyShortfall`], never an error.
pub fn allocate_buys(
    state: &mut CurrentState,
    ticker: &Ticker,
    shares_to_buy: Decimal,
    orders: &mut Vec<Order>,
    events: &mut Vec<RebalanceEvent>,
) {
    let Some(price) = state.price(ticker) else {
        return;
    };

    let mut accounts: Vec<AccountState> = state.accounts().cloned().collect();
    accounts.sort_by(buy_order);

    let mut remaining = shares_to_buy;
    for account in &accounts {
        if remaining < Decimal::ONE {
            break;
        }
        // A quotient past the range of Decimal covers whatever is left.
        let affordable = state
            .idle_cash(&account.name)
            .checked_div(price)
            .map_or(remaining, |q| q.floor());
        let shares = whole_shares(remaining.min(affordable));
        if shares == 0 {
            continue;
        }
        state.apply_buy(ticker, &account.name, shares);
        orders.push(Order::buy(ticker.clone(), account.name.clone(), shares));
        remaining -= Decimal::from(shares);
    }

    if remaining >= Decimal::ONE {
        events.push(RebalanceEvent::BuyShortfall {
            ticker: ticker.clone(),
            requested: shares_to_buy,
            unfilled: remaining,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::model::{Account, Holding};
    use crate::price::StaticPrices;
    use rust_decimal_macros::dec;

    fn vti() -> Ticker {
        Ticker::new("VTI")
    }

    fn build(accounts: &[Account], holdings: &[Holding]) -> CurrentState {
        let mut prices = StaticPrices::new().with("VTI", dec!(100));
        CurrentState::build(&[], accounts, holdings, &mut prices).unwrap()
    }

    #[test]
    fn sells_drain_tax_advantaged_first() {
        let accounts = vec![
            Account::taxable("Brokerage", dec!(0)),
            Account::tax_advantaged("Roth", dec!(0)),
            Account::tax_advantaged("IRA", dec!(0)),
        ];
        let holdings = vec![
            Holding::new("VTI", "Brokerage", dec!(50)),
            Holding::new("VTI", "Roth", dec!(20)),
            Holding::new("VTI", "IRA", dec!(10)),
        ];
        let mut state = build(&accounts, &holdings);
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_sells(&mut state, &vti(), dec!(45), &mut orders, &mut events);

        assert_eq!(
            orders,
            vec![
                Order::sell(vti(), "IRA", 10),
                Order::sell(vti(), "Roth", 20),
                Order::sell(vti(), "Brokerage", 15),
            ]
        );
        assert!(events.is_empty());
        assert_eq!(state.shares(&vti(), "Brokerage"), dec!(35));
        assert_eq!(state.idle_cash("IRA"), dec!(1000));
        assert_eq!(state.idle_cash("Brokerage"), dec!(1500));
    }

    #[test]
    fn sells_skip_fractional_remainders() {
        let accounts = vec![Account::taxable("Taxable", dec!(0))];
        let holdings = vec![Holding::new("VTI", "Taxable", dec!(30.5))];
        let mut state = build(&accounts, &holdings);
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_sells(&mut state, &vti(), dec!(30.5), &mut orders, &mut events);

        assert_eq!(orders, vec![Order::sell(vti(), "Taxable", 30)]);
        assert!(events.is_empty());
        assert_eq!(state.shares(&vti(), "Taxable"), dec!(0.5));
    }

    #[test]
    fn oversized_sell_reports_shortfall() {
        let accounts = vec![Account::taxable("Taxable", dec!(0))];
        let holdings = vec![Holding::new("VTI", "Taxable", dec!(10))];
        let mut state = build(&accounts, &holdings);
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_sells(&mut state, &vti(), dec!(12), &mut orders, &mut events);

        assert_eq!(orders, vec![Order::sell(vti(), "Taxable", 10)]);
        assert_eq!(
            events,
            vec![RebalanceEvent::SellShortfall {
                ticker: vti(),
                requested: dec!(12),
                unfilled: dec!(2),
            }]
        );
    }

    #[test]
    fn buys_prefer_tax_advantaged_then_largest_cash() {
        let accounts = vec![
            Account::taxable("Taxable", dec!(50000)),
            Account::tax_advantaged("IRA", dec!(3000)),
            Account::tax_advantaged("401k", dec!(20000)),
        ];
        let mut state = build(&accounts, &[]);
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_buys(&mut state, &vti(), dec!(400), &mut orders, &mut events);

        assert_eq!(
            orders,
            vec![
                Order::buy(vti(), "401k", 200),
                Order::buy(vti(), "IRA", 30),
                Order::buy(vti(), "Taxable", 170),
            ]
        );
        assert!(events.is_empty());
        assert_eq!(state.idle_cash("Taxable"), dec!(33000));
    }

    #[test]
    fn buys_never_exceed_floor_of_cash() {
        let accounts = vec![Account::taxable("Taxable", dec!(5040))];
        let mut state = build(&accounts, &[]);
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_buys(&mut state, &vti(), dec!(100), &mut orders, &mut events);

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].shares, 50);
        assert_eq!(orders[0].action, Action::Buy);
        assert_eq!(state.idle_cash("Taxable"), dec!(40));
        assert_eq!(
            events,
            vec![RebalanceEvent::BuyShortfall {
                ticker: vti(),
                requested: dec!(100),
                unfilled: dec!(50),
            }]
        );
    }

    #[test]
    fn huge_cash_at_tiny_price_buys_the_request() {
        let accounts = vec![Account::taxable("Taxable", dec!(100000000000000000000))];
        let mut prices = StaticPrices::new().with("VTI", dec!(0.0000000001));
        let mut state = CurrentState::build(&[], &accounts, &[], &mut prices).unwrap();
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_buys(&mut state, &vti(), dec!(1000), &mut orders, &mut events);

        assert_eq!(orders, vec![Order::buy(vti(), "Taxable", 1000)]);
        assert!(events.is_empty());
        assert_eq!(state.idle_cash("Taxable"), dec!(99999999999999999999.9999999));
    }

    #[test]
    fn equal_cash_breaks_ties_by_name() {
        let accounts = vec![
            Account::tax_advantaged("Roth", dec!(1000)),
            Account::tax_advantaged("HSA", dec!(1000)),
        ];
        let mut state = build(&accounts, &[]);
        let mut orders = Vec::new();
        let mut events = Vec::new();

        allocate_buys(&mut state, &vti(), dec!(15), &mut orders, &mut events);

        assert_eq!(
            orders,
            vec![Order::buy(vti(), "HSA", 10), Order::buy(vti(), "Roth", 5)]
        );
    }
}
