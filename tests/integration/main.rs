//! Integration test harness.

mod mock_ledger;
mod simulation;
