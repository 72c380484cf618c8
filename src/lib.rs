//! GAVEL — Autonomous Vault Auction Bidding Agent
//!
//! Library crate exposing all modules for use by integration tests
//! and the two binary entry points (bid-and-watch, scan-and-rank).

pub mod config;
pub mod types;
pub mod ledger;
pub mod valuation;
pub mod strategy;
pub mod engine;
