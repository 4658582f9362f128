//! Console and file reports: current holdings, order plans, projections.

use std::fmt;
use std::io::Write;

use driftbook::{AccountType, CurrentState, Decimal, RebalancePlan, Ticker, Weight};
use rust_decimal::prelude::ToPrimitive;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::error::Result;

fn weight_of(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        value / total
    }
}

fn pct(weight: Decimal) -> Decimal {
    weight * Decimal::ONE_HUNDRED
}

// ============================================================================
// Holdings
// ============================================================================

/// Current holdings priced at the run's prices.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingsReport {
    pub rows: Vec<HoldingRow>,
    pub cash: Vec<CashRow>,
    pub total_value: Decimal,
}

/// One (ticker, account) position.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingRow {
    pub ticker: Ticker,
    pub account: String,
    pub shares: Decimal,
    pub price: Decimal,
    pub value: Decimal,
    pub weight: Decimal,
}

/// Idle cash held by one account.
#[derive(Debug, Clone, Serialize)]
pub struct CashRow {
    pub account: String,
    pub kind: AccountType,
    pub idle_cash: Decimal,
}

impl HoldingsReport {
    pub fn from_state(state: &CurrentState) -> Self {
        let total_value = state.market_value();

        let mut rows = Vec::new();
        for ticker in state.held_tickers() {
            let price = state.price(ticker).unwrap_or(Decimal::ZERO);
            for (account, shares) in state.holdings_of(ticker) {
                let value = shares * price;
                rows.push(HoldingRow {
                    ticker: ticker.clone(),
                    account: account.to_string(),
                    shares,
                    price,
                    value,
                    weight: weight_of(value, total_value),
                });
            }
        }

        let mut cash: Vec<CashRow> = state
            .accounts()
            .map(|a| CashRow {
                account: a.name.clone(),
                kind: a.kind,
                idle_cash: a.idle_cash,
            })
            .collect();
        cash.sort_by(|a, b| a.account.cmp(&b.account));

        Self {
            rows,
            cash,
            total_value,
        }
    }
}

impl fmt::Display for HoldingsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HOLDINGS:")?;
        if self.rows.is_empty() {
            writeln!(f, "  No positions.")?;
        } else {
            writeln!(
                f,
                "  {:8} {:16} {:>12} {:>10} {:>14} {:>8}",
                "Ticker", "Account", "Shares", "Price", "Value", "Weight"
            )?;
            for r in &self.rows {
                writeln!(
                    f,
                    "  {:8} {:16} {:>12} {:>10.2} {:>14.2} {:>7.2}%",
                    r.ticker,
                    r.account,
                    r.shares,
                    r.price,
                    r.value,
                    pct(r.weight),
                )?;
            }
        }

        writeln!(f, "\nCASH:")?;
        for c in &self.cash {
            writeln!(f, "  {:16} {:16} {:>14.2}", c.account, c.kind, c.idle_cash)?;
        }
        writeln!(f, "\n  Total value: {:.2}", self.total_value)?;
        Ok(())
    }
}

// ============================================================================
// Order plan
// ============================================================================

/// Table rendering of a plan's orders and warnings.
pub struct PlanTable<'a> {
    plan: &'a RebalancePlan,
}

impl<'a> PlanTable<'a> {
    pub fn new(plan: &'a RebalancePlan) -> Self {
        Self { plan }
    }
}

impl fmt::Display for PlanTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        if plan.is_empty() {
            writeln!(f, "No rebalancing needed: portfolio is within threshold of its targets.")?;
        } else {
            writeln!(f, "REBALANCE ORDERS:")?;
            writeln!(
                f,
                "  {:>3}  {:6} {:8} {:16} {:>8} {:>10} {:>14}",
                "#", "Action", "Ticker", "Account", "Shares", "Price", "Notional"
            )?;
            for (i, order) in plan.orders.iter().enumerate() {
                let price = plan.projected.price(&order.ticker).unwrap_or(Decimal::ZERO);
                writeln!(
                    f,
                    "  {:>3}  {:6} {:8} {:16} {:>8} {:>10.2} {:>14.2}",
                    i + 1,
                    order.action,
                    order.ticker,
                    order.account,
                    order.shares,
                    price,
                    order.notional(price),
                )?;
            }
        }

        let warnings: Vec<_> = plan.warnings().collect();
        if !warnings.is_empty() {
            writeln!(f, "\nWARNINGS:")?;
            for w in warnings {
                writeln!(f, "  {w}")?;
            }
        }
        Ok(())
    }
}

/// Write the plan's orders to `out` in `format`.
///
/// CSV and JSON carry the orders only, with the `Ticker,Account,Shares,Action`
/// field names.
pub fn write_orders(plan: &RebalancePlan, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Table => write!(out, "{}", PlanTable::new(plan))?,
        OutputFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut *out);
            writer.write_record(["Ticker", "Account", "Shares", "Action"])?;
            for order in &plan.orders {
                writer.serialize(order)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &plan.orders)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

// ============================================================================
// Projection
// ============================================================================

/// Allocation the portfolio would have once every order fills.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionReport {
    pub entries: Vec<ProjectionEntry>,
    pub leftover_cash: Vec<CashRow>,
    pub total_value: Decimal,
    /// Root-mean-square weight deviation, in percent.
    pub tracking_error_pct: f64,
}

/// One ticker's target versus projected allocation.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionEntry {
    pub ticker: Ticker,
    pub target_weight: Decimal,
    pub projected_weight: Decimal,
    pub diff_weight: Decimal,
    pub target_shares: Decimal,
    pub projected_shares: Decimal,
}

impl ProjectionReport {
    /// Compare the plan's projected holdings against `weights`.
    pub fn build(plan: &RebalancePlan, weights: &[Weight]) -> Self {
        let state = &plan.projected;
        let total_value = plan.total_value;
        let target_map: FxHashMap<&Ticker, Decimal> =
            weights.iter().map(|w| (&w.ticker, w.cash_weight)).collect();

        let mut tickers: Vec<&Ticker> = weights.iter().map(|w| &w.ticker).collect();
        let weighted: FxHashSet<&Ticker> = tickers.iter().copied().collect();
        tickers.extend(
            state
                .held_tickers()
                .into_iter()
                .filter(|t| !weighted.contains(t) && !state.total_shares(t).is_zero()),
        );
        tickers.sort();

        let mut entries = Vec::with_capacity(tickers.len());
        let mut sum_sq_diff = 0.0_f64;

        for ticker in tickers {
            let price = state.price(ticker).unwrap_or(Decimal::ZERO);
            let projected_shares = state.total_shares(ticker);
            let target_weight = target_map.get(ticker).copied().unwrap_or(Decimal::ZERO);
            let projected_weight = weight_of(projected_shares * price, total_value);
            let diff_weight = projected_weight - target_weight;

            let diff = diff_weight.to_f64().unwrap_or(0.0);
            sum_sq_diff += diff * diff;

            entries.push(ProjectionEntry {
                ticker: ticker.clone(),
                target_weight,
                projected_weight,
                diff_weight,
                target_shares: plan.targets.get(ticker).unwrap_or(Decimal::ZERO),
                projected_shares,
            });
        }

        let tracking_error_pct = (sum_sq_diff / entries.len().max(1) as f64).sqrt() * 100.0;

        let mut leftover_cash: Vec<CashRow> = state
            .accounts()
            .map(|a| CashRow {
                account: a.name.clone(),
                kind: a.kind,
                idle_cash: a.idle_cash,
            })
            .collect();
        leftover_cash.sort_by(|a, b| a.account.cmp(&b.account));

        Self {
            entries,
            leftover_cash,
            total_value,
            tracking_error_pct,
        }
    }

    pub fn leftover_total(&self) -> Decimal {
        self.leftover_cash.iter().map(|c| c.idle_cash).sum()
    }

    /// Leftover cash sitting in tax-advantaged accounts.
    pub fn leftover_tax_advantaged(&self) -> Decimal {
        self.leftover_cash
            .iter()
            .filter(|c| c.kind.is_tax_advantaged())
            .map(|c| c.idle_cash)
            .sum()
    }
}

impl fmt::Display for ProjectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PROJECTED ALLOCATION:")?;
        writeln!(
            f,
            "  {:8} {:>10} {:>10} {:>10} {:>12} {:>12}",
            "Ticker", "Target%", "After%", "Diff%", "TargetQty", "AfterQty"
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "  {:8} {:>9.2}% {:>9.2}% {:>+9.2}% {:>12} {:>12}",
                e.ticker,
                pct(e.target_weight),
                pct(e.projected_weight),
                pct(e.diff_weight),
                e.target_shares,
                e.projected_shares,
            )?;
        }

        writeln!(f, "\nLEFTOVER CASH:")?;
        for c in &self.leftover_cash {
            writeln!(f, "  {:16} {:>14.2}", c.account, c.idle_cash)?;
        }
        writeln!(f, "  {:16} {:>14.2}", "Total", self.leftover_total())?;
        writeln!(
            f,
            "  {:16} {:>14.2}",
            "Tax-advantaged",
            self.leftover_tax_advantaged()
        )?;
        writeln!(f, "\n  Tracking error: {:.3}%", self.tracking_error_pct)?;
        Ok(())
    }
}
