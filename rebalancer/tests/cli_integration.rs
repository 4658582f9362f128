//! End-to-end tests: CSV files on disk → config → plan/holdings/project.

use std::path::{Path, PathBuf};
use std::process::Command;

use driftbook_rebalancer::config::{Config, OutputFormat};
use driftbook_rebalancer::error::Error;
use driftbook_rebalancer::run::{self, PlanOptions};
use rust_decimal_macros::dec;

const WEIGHTS: &str = "\
Ticker,Cash_Weight,Vol,Asset_Class,Sub_Class
VTI,0.6,0.1,Equity,US Total Market
BND,0.4,0.03,Fixed Income,US Aggregate
";

const ACCOUNTS: &str = "\
Account,Type,Idle_Cash
Brokerage,Taxable,1000
IRA,Tax-Advantaged,0
";

const ALLOCATIONS: &str = "\
Ticker,Account,Shares
VTI,Brokerage,50
BND,IRA,100
GLD,Brokerage,2
";

const PRICES: &str = "\
Ticker,Price
VTI,100
BND,80
GLD,150
";

const CONFIG: &str = r#"
[inputs]
weights = "weights.csv"
accounts = "accounts.csv"
allocations = "allocations.csv"
prices = "prices.csv"

[output]
format = "csv"

[logging]
dir = "logs"
"#;

/// Write the standard portfolio into a fresh directory and return the
/// config path.
fn setup(dir: &Path) -> PathBuf {
    for (name, contents) in [
        ("weights.csv", WEIGHTS),
        ("accounts.csv", ACCOUNTS),
        ("allocations.csv", ALLOCATIONS),
        ("prices.csv", PRICES),
        ("rebalance.toml", CONFIG),
    ] {
        std::fs::write(dir.join(name), contents).unwrap();
    }
    dir.join("rebalance.toml")
}

fn audit_lines(dir: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(dir.join("logs").join("audit.jsonl"))
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// Total 14,300. BND trims 100 → 71 in the IRA, GLD is liquidated, and the
// proceeds buy 35 VTI: 23 in the IRA, 12 in the brokerage account.
const EXPECTED_CSV: &str = "\
Ticker,Account,Shares,Action
BND,IRA,29,sell
GLD,Brokerage,2,sell
VTI,IRA,23,buy
VTI,Brokerage,12,buy
";

// ============================================================================
// plan
// ============================================================================

#[test]
fn plan_writes_csv_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    let config = Config::load(&config_path).unwrap();

    let mut out = Vec::new();
    let plan = run::plan(
        &config,
        &config_path,
        &PlanOptions::from_config(&config),
        &mut out,
    )
    .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), EXPECTED_CSV);
    assert_eq!(plan.total_value, dec!(14300));
    assert_eq!(plan.projected.idle_cash("IRA"), dec!(20));
    assert_eq!(plan.projected.idle_cash("Brokerage"), dec!(100));
}

#[test]
fn plan_writes_audit_trail() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    let config = Config::load(&config_path).unwrap();

    run::plan(
        &config,
        &config_path,
        &PlanOptions::from_config(&config),
        &mut Vec::new(),
    )
    .unwrap();

    let lines = audit_lines(dir.path());
    let events: Vec<&str> = lines.iter().map(|l| l["event"].as_str().unwrap()).collect();
    assert_eq!(
        events,
        vec![
            "run_started",
            "state_computed",
            "decision",
            "decision",
            "decision",
            "plan_computed",
            "run_completed",
        ]
    );
    assert_eq!(lines[0]["command"], "plan");
    assert_eq!(lines[1]["total_value"], "14300");
    assert!(lines.iter().any(|l| l["kind"] == "liquidation" && l["ticker"] == "GLD"));
    assert_eq!(lines[5]["orders"].as_array().unwrap().len(), 4);
    assert_eq!(lines[6]["orders"], 4);
}

#[test]
fn plan_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    let config = Config::load(&config_path).unwrap();

    let target = dir.path().join("out").join("orders.json");
    let opts = PlanOptions {
        format: OutputFormat::Json,
        output: Some(target.clone()),
    };
    let mut out = Vec::new();
    run::plan(&config, &config_path, &opts, &mut out).unwrap();

    assert!(out.is_empty());
    let orders: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 4);
    assert_eq!(orders[2]["Account"], "IRA");
    assert_eq!(orders[2]["Shares"], 23);
}

#[test]
fn threshold_from_config_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    let wide = CONFIG.to_string() + "\n[rebalance]\nthreshold = 0.9\n";
    std::fs::write(&config_path, wide).unwrap();
    let config = Config::load(&config_path).unwrap();

    let mut out = Vec::new();
    let plan = run::plan(
        &config,
        &config_path,
        &PlanOptions::from_config(&config),
        &mut out,
    )
    .unwrap();

    // VTI (70% off) and BND (29% off) sit inside a 90% band; only the liquidation trades.
    assert_eq!(plan.orders.len(), 1);
    assert_eq!(plan.orders[0].ticker.as_str(), "GLD");
}

#[test]
fn missing_price_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    std::fs::write(dir.path().join("prices.csv"), "Ticker,Price\nVTI,100\nBND,80\n").unwrap();
    let config = Config::load(&config_path).unwrap();

    let err = run::plan(
        &config,
        &config_path,
        &PlanOptions::from_config(&config),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Rebalance(driftbook::Error::PriceUnavailable { .. })
    ));
}

#[test]
fn unknown_account_fails_before_pricing() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    std::fs::write(
        dir.path().join("allocations.csv"),
        "Ticker,Account,Shares\nVTI,Roth,5\n",
    )
    .unwrap();
    let config = Config::load(&config_path).unwrap();

    let err = run::plan(
        &config,
        &config_path,
        &PlanOptions::from_config(&config),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Input { .. }));
}

// ============================================================================
// holdings / project
// ============================================================================

#[test]
fn holdings_reports_total_value() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    let config = Config::load(&config_path).unwrap();

    let mut out = Vec::new();
    let report = run::holdings(&config, &config_path, &mut out).unwrap();

    assert_eq!(report.total_value, dec!(14300));
    assert_eq!(report.rows.len(), 3);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Total value: 14300.00"));
}

#[test]
fn project_shows_leftover_cash() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());
    let config = Config::load(&config_path).unwrap();

    let mut out = Vec::new();
    let report = run::project(&config, &config_path, &mut out).unwrap();

    assert_eq!(report.leftover_total(), dec!(120));
    assert_eq!(report.leftover_tax_advantaged(), dec!(20));
    let vti = report
        .entries
        .iter()
        .find(|e| e.ticker.as_str() == "VTI")
        .unwrap();
    assert_eq!(vti.projected_shares, dec!(85));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("PROJECTED ALLOCATION"));
    let sheltered = text
        .lines()
        .find(|l| l.trim_start().starts_with("Tax-advantaged"))
        .unwrap();
    assert!(sheltered.ends_with(" 20.00"));
}

// ============================================================================
// binary
// ============================================================================

#[test]
fn binary_prints_plan() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = setup(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_rebalancer"))
        .arg("--config")
        .arg(&config_path)
        .arg("plan")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), EXPECTED_CSV);
}

#[test]
fn binary_exits_nonzero_on_bad_config() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rebalancer"))
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("holdings")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr).unwrap().contains("Error loading config"));
}
