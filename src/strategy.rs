//! Bid decision engine.
//!
//! Pure function of the last observed highest-bid snapshot and the run's
//! policy limits: no network, no state. The orchestrator calls `decide`
//! once per block with a fresh snapshot.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::BidConfig;
use crate::types::{BidAction, BidDecision, HighestBid};

/// The caller's bidding limits, carved out of the run config so the
/// decision engine doesn't see orchestration settings.
#[derive(Debug, Clone)]
pub struct BidPolicy {
    pub min_bid: Decimal,
    pub max_bid: Decimal,
    /// Multiplier > 1 applied to the standing highest bid.
    pub raise_factor: Decimal,
    pub bid_token: String,
    pub wallet_address: String,
}

impl BidPolicy {
    pub fn from_config(cfg: &BidConfig) -> Self {
        Self {
            min_bid: cfg.min_bid,
            max_bid: cfg.max_bid,
            raise_factor: cfg.bid_raise,
            bid_token: cfg.bid_token.clone(),
            wallet_address: cfg.wallet_address.clone(),
        }
    }
}

/// The amount the caller would have to bid next: the policy minimum when
/// the batch has no bid yet, otherwise the standing bid times the raise
/// factor.
pub fn next_bid(highest: Option<&HighestBid>, policy: &BidPolicy) -> Decimal {
    match highest {
        None => policy.min_bid,
        Some(bid) => bid.amount.amount * policy.raise_factor,
    }
}

/// Compute this cycle's bid and whether to submit it.
///
/// Skips when the caller already holds the highest bid, or when the
/// computed raise would exceed the policy ceiling.
pub fn decide(highest: Option<&HighestBid>, policy: &BidPolicy) -> BidDecision {
    let amount = next_bid(highest, policy);

    let already_winning = highest
        .map(|bid| bid.owner == policy.wallet_address)
        .unwrap_or(false);
    let over_ceiling = amount > policy.max_bid;

    let action = if already_winning || over_ceiling {
        debug!(
            %amount,
            already_winning,
            over_ceiling,
            "skipping this round"
        );
        BidAction::Skip
    } else {
        BidAction::Submit
    };

    BidDecision {
        amount,
        token: policy.bid_token.clone(),
        action,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
