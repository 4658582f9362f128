//! Command workflows: load → price → plan → report, with an audit trail.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use driftbook::{CurrentState, RebalancePlan, Rebalancer, StaticPrices};
use log::{info, warn};

use crate::audit::{self, AuditLog};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::input::Portfolio;
use crate::prices::load_prices;
use crate::report::{HoldingsReport, ProjectionReport, write_orders};

/// Options for the `plan` command. CLI flags override the config file.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl PlanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            format: config.output.format,
            output: config.output_path(),
        }
    }
}

/// Loaded inputs plus a rebalancer primed with the price table.
struct Session {
    portfolio: Portfolio,
    rebalancer: Rebalancer<StaticPrices>,
    audit: AuditLog,
}

impl Session {
    fn open(config: &Config, command: &str, config_file: &Path) -> Result<Self> {
        let mut audit = AuditLog::open(&config.audit_path())?;
        audit::log_run_started(&mut audit, command, config_file)?;

        let portfolio = Portfolio::load(config)?;
        let prices = load_prices(&config.prices_path())?;
        let rebalancer = Rebalancer::new(prices).with_threshold(config.rebalance.threshold);

        Ok(Self {
            portfolio,
            rebalancer,
            audit,
        })
    }

    fn current_state(&mut self) -> Result<CurrentState> {
        let p = &self.portfolio;
        let state = self
            .rebalancer
            .current_state(&p.weights, &p.accounts, &p.holdings)?;
        audit::log_state_computed(&mut self.audit, &state)?;
        info!("Portfolio value: {:.2}", state.total_value());
        Ok(state)
    }

    fn plan(&mut self) -> Result<RebalancePlan> {
        let state = self.current_state()?;
        let threshold = self.rebalancer.threshold();
        let plan = driftbook::rebalance::plan(state, &self.portfolio.weights, threshold)?;

        audit::log_decisions(&mut self.audit, &plan.events)?;
        for event in &plan.events {
            if event.is_warning() {
                warn!("{event}");
            } else {
                info!("{event}");
            }
        }
        audit::log_plan(&mut self.audit, &plan)?;
        info!(
            "{} orders ({} sells, {} buys)",
            plan.orders.len(),
            plan.sells().count(),
            plan.buys().count()
        );
        Ok(plan)
    }
}

/// Compute the order plan and write it to `opts.output` or `out`.
pub fn plan(
    config: &Config,
    config_file: &Path,
    opts: &PlanOptions,
    out: &mut dyn Write,
) -> Result<RebalancePlan> {
    let mut session = Session::open(config, "plan", config_file)?;
    let plan = session.plan()?;

    match &opts.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = BufWriter::new(File::create(path)?);
            write_orders(&plan, opts.format, &mut file)?;
            file.flush()?;
            info!("Wrote {} orders to {}", plan.orders.len(), path.display());
        }
        None => write_orders(&plan, opts.format, out)?,
    }

    audit::log_run_completed(&mut session.audit, plan.orders.len(), opts.output.as_deref())?;
    Ok(plan)
}

/// Show current holdings and total value.
pub fn holdings(config: &Config, config_file: &Path, out: &mut dyn Write) -> Result<HoldingsReport> {
    let mut session = Session::open(config, "holdings", config_file)?;
    let state = session.current_state()?;

    let report = HoldingsReport::from_state(&state);
    write!(out, "{report}")?;

    audit::log_run_completed(&mut session.audit, 0, None)?;
    Ok(report)
}

/// Compute the plan and show the allocation it would produce.
pub fn project(config: &Config, config_file: &Path, out: &mut dyn Write) -> Result<ProjectionReport> {
    let mut session = Session::open(config, "project", config_file)?;
    let plan = session.plan()?;

    let report = ProjectionReport::build(&plan, &session.portfolio.weights);
    write!(out, "{report}")?;

    audit::log_run_completed(&mut session.audit, plan.orders.len(), None)?;
    Ok(report)
}
