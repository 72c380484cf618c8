//! Bid submitter.
//!
//! Sends one SUBMIT decision to the ledger and classifies the outcome.
//! A rejected submission ends the current round only — the chain state
//! may already have moved, so the same bid is never re-attempted.

use tracing::info;

use crate::config::BidConfig;
use crate::ledger::{LedgerClient, PlaceAuctionBid};
use crate::types::{BidAction, BidDecision, GavelError};

pub struct BidSubmitter<'a> {
    ledger: &'a dyn LedgerClient,
}

impl<'a> BidSubmitter<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self { ledger }
    }

    /// Place the decided bid on chain and return the transaction id.
    ///
    /// Must only be called for `BidAction::Submit` decisions; any failure
    /// comes back as `BidSubmission`.
    pub async fn submit(
        &self,
        decision: &BidDecision,
        cfg: &BidConfig,
    ) -> Result<String, GavelError> {
        debug_assert_eq!(decision.action, BidAction::Submit);

        let params = PlaceAuctionBid {
            vault_id: cfg.vault_id.clone(),
            index: cfg.batch_index,
            from: cfg.wallet_address.clone(),
            amount: decision.to_chain_string(),
        };

        let tx_id = self
            .ledger
            .place_auction_bid(params)
            .await
            .map_err(|e| match e {
                rejected @ GavelError::BidSubmission(_) => rejected,
                other => GavelError::BidSubmission(other.to_string()),
            })?;

        info!(
            vault_id = %cfg.vault_id,
            batch_index = cfg.batch_index,
            amount = %decision.to_chain_string(),
            tx_id = %tx_id,
            "bid placed"
        );

        Ok(tx_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
