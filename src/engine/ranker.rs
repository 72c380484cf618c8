//! Opportunity ranker.
//!
//! Enumerates open auction batches across all vaults, prices each one in
//! the reference currency, and ranks the survivors by profit margin.
//! A batch that cannot be priced is dropped from the ranking — an
//! unpriced lot is unknown, not worthless.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::ledger::LedgerClient;
use crate::types::{AuctionBatch, GavelError, RankedOpportunity};
use crate::valuation::Valuer;

/// Premium over loan value a bidder must open with (5%).
pub const OPENING_PREMIUM: Decimal = dec!(1.05);

/// Premium over the standing bid required by the minimum raise (1%).
pub const MIN_RAISE_PREMIUM: Decimal = dec!(1.01);

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

/// Cutoff below which an opportunity is not worth reporting. Two
/// historical variants, consolidated: filter on margin (percent) or on
/// the absolute reference-currency reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankThreshold {
    MinMargin(Decimal),
    MinReward(Decimal),
}

impl RankThreshold {
    pub fn keeps(&self, opp: &RankedOpportunity) -> bool {
        match self {
            RankThreshold::MinMargin(min) => opp.margin >= *min,
            RankThreshold::MinReward(min) => opp.diff >= *min,
        }
    }
}

/// Stable descending sort by margin. Ties keep input order, so ranking
/// an already-ranked sequence is idempotent.
pub fn sort_by_margin(opportunities: &mut [RankedOpportunity]) {
    opportunities.sort_by(|a, b| b.margin.cmp(&a.margin));
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

pub struct Ranker<'a> {
    ledger: &'a dyn LedgerClient,
    cfg: &'a ScanConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, cfg: &'a ScanConfig) -> Self {
        Self { ledger, cfg }
    }

    /// Score every open batch and return the ranked survivors.
    pub async fn rank(&self) -> Result<Vec<RankedOpportunity>, GavelError> {
        let vaults = self.ledger.list_auctions(self.cfg.num_of_auctions).await?;
        let batches: Vec<AuctionBatch> =
            vaults.into_iter().flat_map(|v| v.batches).collect();
        info!(count = batches.len(), "open auction batches enumerated");

        let valuer = Valuer::new(self.ledger);
        let cooldown = Duration::from_millis(self.cfg.cooldown_ms);
        let mut opportunities = Vec::new();

        for (i, batch) in batches.iter().enumerate() {
            // Rate-limit courtesy pause between batches.
            if i > 0 && !cooldown.is_zero() {
                tokio::time::sleep(cooldown).await;
            }

            match self.score_batch(&valuer, batch).await {
                Ok(Some(opp)) => {
                    if self.cfg.threshold.keeps(&opp) {
                        debug!(url = %opp.url, margin = %opp.margin, "opportunity kept");
                        opportunities.push(opp);
                    } else {
                        debug!(url = %opp.url, margin = %opp.margin, "below threshold");
                    }
                }
                Ok(None) => warn!(
                    vault_id = %batch.vault_id,
                    batch_index = batch.index,
                    "non-positive starting bid, dropping batch"
                ),
                Err(e) => warn!(
                    vault_id = %batch.vault_id,
                    batch_index = batch.index,
                    error = %e,
                    "batch left unpriced"
                ),
            }
        }

        sort_by_margin(&mut opportunities);
        info!(ranked = opportunities.len(), "scan complete");
        Ok(opportunities)
    }

    /// Price one batch: the bid a newcomer would need to win it, and the
    /// reference value of the collateral they'd take home.
    async fn score_batch(
        &self,
        valuer: &Valuer<'_>,
        batch: &AuctionBatch,
    ) -> Result<Option<RankedOpportunity>, GavelError> {
        let starting_bid = match &batch.highest_bid {
            None => {
                let loan_value = valuer
                    .price_in_reference(batch.loan.amount, &batch.loan.symbol)
                    .await?;
                loan_value * OPENING_PREMIUM
            }
            Some(bid) => {
                let bid_value = valuer
                    .price_in_reference(bid.amount.amount, &bid.amount.symbol)
                    .await?;
                bid_value * MIN_RAISE_PREMIUM
            }
        };

        let mut reward = Decimal::ZERO;
        for collateral in &batch.collaterals {
            reward += valuer
                .price_in_reference(collateral.amount, &collateral.symbol)
                .await?;
        }

        Ok(RankedOpportunity::score(
            opportunity_url(batch),
            starting_bid,
            reward,
        ))
    }
}

fn opportunity_url(batch: &AuctionBatch) -> String {
    format!(
        "https://defiscan.live/vaults/{}/auctions/{}",
        batch.vault_id, batch.index
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
