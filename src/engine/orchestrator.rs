//! Block-synchronized bidding orchestrator.
//!
//! A state machine that advances one blockchain block at a time: wait for
//! the target window, then run one bid decision per block until the
//! auction's closing height, then look the result up in auction history.
//! Every transition is driven by exactly one external call's response, so
//! a round for block N always completes before the wait for N+1 begins.
//!
//! Error policy: timeouts during block waits are retried on the bounded
//! backoff schedule in [`RetryPolicy`]; any other error aborts the run.
//! A rejected bid submission is the one non-fatal failure — it ends the
//! round and the loop moves on to the next block.

use tracing::{debug, error, info, warn};

use super::retry::RetryPolicy;
use super::submitter::BidSubmitter;
use crate::config::BidConfig;
use crate::ledger::{AuctionHistoryRecord, LedgerClient};
use crate::strategy::{self, BidPolicy};
use crate::types::{BidAction, GavelError};

/// History query used by the reporting step.
const HISTORY_SCOPE: &str = "all";
const HISTORY_LIMIT: usize = 20_000;

/// The orchestrator's states. One external call per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    AwaitingTarget,
    BiddingRound,
    AwaitingNextBlock,
    Reporting,
    Done,
}

/// Which block wait the retry loop is driving.
#[derive(Debug, Clone, Copy)]
enum WaitKind {
    Height(u64),
    NextBlock,
}

pub struct Orchestrator<'a> {
    ledger: &'a dyn LedgerClient,
    cfg: &'a BidConfig,
    policy: BidPolicy,
    retry: RetryPolicy,
    submitter: BidSubmitter<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, cfg: &'a BidConfig) -> Self {
        Self {
            ledger,
            cfg,
            policy: BidPolicy::from_config(cfg),
            retry: RetryPolicy::from_settings(&cfg.retry),
            submitter: BidSubmitter::new(ledger),
        }
    }

    /// Drive the state machine to completion.
    ///
    /// Returns the settled auction-history record for the configured
    /// vault/batch, or `None` if the chain has no such record yet.
    pub async fn run(&self) -> Result<Option<AuctionHistoryRecord>, GavelError> {
        let target = self.cfg.max_block_height - self.cfg.block_delta;
        info!(
            vault_id = %self.cfg.vault_id,
            batch_index = self.cfg.batch_index,
            target,
            closing = self.cfg.max_block_height,
            "starting bid-and-watch run"
        );

        let mut state = EngineState::AwaitingTarget;
        let mut outcome = None;

        loop {
            state = match state {
                EngineState::AwaitingTarget => {
                    let height = self.wait(WaitKind::Height(target)).await?;
                    info!(height, "target window reached");
                    EngineState::BiddingRound
                }
                EngineState::BiddingRound => {
                    self.bidding_round().await?;
                    EngineState::AwaitingNextBlock
                }
                EngineState::AwaitingNextBlock => {
                    let height = self.wait(WaitKind::NextBlock).await?;
                    debug!(height, "new block observed");
                    if height >= self.cfg.max_block_height {
                        EngineState::Reporting
                    } else {
                        EngineState::BiddingRound
                    }
                }
                EngineState::Reporting => {
                    outcome = self.report().await?;
                    EngineState::Done
                }
                EngineState::Done => break,
            };
        }

        Ok(outcome)
    }

    /// One decision cycle against a fresh auction snapshot.
    async fn bidding_round(&self) -> Result<(), GavelError> {
        let vault = self.ledger.get_vault(&self.cfg.vault_id).await?;
        let batch = vault.batch(self.cfg.batch_index).ok_or_else(|| {
            GavelError::VaultLookup {
                vault_id: self.cfg.vault_id.clone(),
                message: format!("no auction batch at index {}", self.cfg.batch_index),
            }
        })?;

        let highest = batch.highest_bid.as_ref();
        info!(
            highest_bid = highest.map(|h| h.amount.to_string()),
            highest_owner = highest.map(|h| h.owner.as_str()),
            "auction snapshot"
        );

        let decision = strategy::decide(highest, &self.policy);
        match decision.action {
            BidAction::Submit => {
                // A rejection ends this round only; the next block gets a
                // fresh snapshot and a fresh decision.
                if let Err(e) = self.submitter.submit(&decision, self.cfg).await {
                    error!(error = %e, "bid submission failed, continuing to next block");
                }
            }
            BidAction::Skip => {
                info!(amount = %decision.amount, "holding back this round");
            }
        }

        Ok(())
    }

    /// Run one block wait under the retry policy. Only timeouts earn
    /// another attempt; anything else aborts the run.
    async fn wait(&self, kind: WaitKind) -> Result<u64, GavelError> {
        let mut attempt = 1u32;
        loop {
            let result = match kind {
                WaitKind::Height(height) => {
                    self.ledger
                        .wait_for_block_height(height, self.cfg.api_timeout_ms)
                        .await
                }
                WaitKind::NextBlock => {
                    self.ledger.wait_for_new_block(self.cfg.api_timeout_ms).await
                }
            };

            match result {
                Ok(tip) => return Ok(tip.height),
                Err(e) if e.is_timeout() && attempt < self.retry.max_attempts => {
                    let backoff = self.retry.backoff_for(attempt);
                    debug!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "block wait timed out, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(error = %e, attempt, "block wait failed");
                    return Err(e);
                }
            }
        }
    }

    /// Locate the settled record for the configured vault/batch.
    async fn report(&self) -> Result<Option<AuctionHistoryRecord>, GavelError> {
        let history = self
            .ledger
            .list_auction_history(HISTORY_SCOPE, HISTORY_LIMIT)
            .await?;

        let record = history.into_iter().find(|r| {
            r.vault_id == self.cfg.vault_id && r.batch_index == self.cfg.batch_index
        });

        match &record {
            Some(_) => info!(
                vault_id = %self.cfg.vault_id,
                batch_index = self.cfg.batch_index,
                "auction record located"
            ),
            None => warn!(
                vault_id = %self.cfg.vault_id,
                batch_index = self.cfg.batch_index,
                "no auction history record for this batch"
            ),
        }

        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
