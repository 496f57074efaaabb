//! mNAV fair-value engine for bitcoin treasury companies.
//!
//! - NAV-per-share and factor-weighted mNAV multiplier
//! - Share dilution from funding future bitcoin purchases
//! - GBM price paths and a parallel Monte Carlo fair-value distribution
//! - Point-in-time projection and historical backtest
//! - JSON HTTP API for the dashboard

pub mod backtest;
pub mod config;
pub mod data;
pub mod errors;
pub mod models;
pub mod server;
pub mod simulation;
pub mod state;
