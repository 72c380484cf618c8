//! Run engines.
//!
//! `orchestrator` drives the block-synchronized bidding loop for one
//! auction batch; `ranker` scores every open batch in a single scan pass.
//! Both lean on the same ledger client and valuation engine.

pub mod orchestrator;
pub mod ranker;
pub mod retry;
pub mod submitter;
