//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use driftbook::{CurrentState, RebalanceEvent, RebalancePlan};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Log a run start event.
pub fn log_run_started(audit: &mut AuditLog, command: &str, config_file: &Path) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "command": command,
            "config": config_file.display().to_string(),
        }),
    )
}

/// Log the priced starting position: total value and cash per account.
pub fn log_state_computed(audit: &mut AuditLog, state: &CurrentState) -> Result<()> {
    let mut cash: Vec<_> = state
        .accounts()
        .map(|a| {
            serde_json::json!({
                "account": a.name,
                "type": a.kind.to_string(),
                "idle_cash": a.idle_cash.to_string(),
            })
        })
        .collect();
    cash.sort_by(|a, b| a["account"].as_str().cmp(&b["account"].as_str()));

    audit.log(
        "state_computed",
        serde_json::json!({
            "total_value": state.total_value().to_string(),
            "tickers": state.held_tickers().len(),
            "accounts": cash,
        }),
    )
}

/// Log one `decision` line per planning event.
pub fn log_decisions(audit: &mut AuditLog, events: &[RebalanceEvent]) -> Result<()> {
    for event in events {
        audit.log("decision", serde_json::to_value(event)?)?;
    }
    Ok(())
}

/// Log the computed order list.
pub fn log_plan(audit: &mut AuditLog, plan: &RebalancePlan) -> Result<()> {
    audit.log(
        "plan_computed",
        serde_json::json!({
            "orders": plan.orders,
            "warnings": plan.warnings().count(),
        }),
    )
}

/// Log run completion.
pub fn log_run_completed(audit: &mut AuditLog, orders: usize, output: Option<&Path>) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "orders": orders,
            "output": output.map(|p| p.display().to_string()),
        }),
    )
}
