//! driftbook-rebalancer: command-line front end for the driftbook engine.
//!
//! Reads weights, accounts, allocations, and prices from CSV files named in a
//! TOML config, computes the whole-share order plan, renders it as a table,
//! CSV, or JSON, and appends every decision to a JSONL audit trail.

pub mod audit;
pub mod config;
pub mod error;
pub mod input;
pub mod prices;
pub mod report;
pub mod run;
