//! Ledger client boundary.
//!
//! Defines the `LedgerClient` trait — the full surface this agent needs
//! from the lending protocol's node — and the JSON-RPC implementation.
//! Wallet custody, signing and consensus all live on the other side of
//! this boundary.

pub mod rpc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AuctionBatch, GavelError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A vault snapshot with its open liquidation batches.
#[derive(Debug, Clone)]
pub struct Vault {
    pub vault_id: String,
    pub batches: Vec<AuctionBatch>,
}

impl Vault {
    /// The batch at the given ordinal, if the vault has one.
    pub fn batch(&self, index: u32) -> Option<&AuctionBatch> {
        self.batches.iter().find(|b| b.index == index)
    }
}

/// A settled-auction record from the chain's auction history.
///
/// Only the match keys are typed; the rest of the record is carried
/// verbatim so the final report can emit whatever the node returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionHistoryRecord {
    pub vault_id: String,
    pub batch_index: u32,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Reserve ratios of a two-asset liquidity pool, in both orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPair {
    /// Units of token A per unit of token B.
    pub reserve_ab: Decimal,
    /// Units of token B per unit of token A.
    pub reserve_ba: Decimal,
}

/// The chain tip observed after a block wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTip {
    pub height: u64,
}

/// Parameters for a bid-placement call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAuctionBid {
    pub vault_id: String,
    pub index: u32,
    pub from: String,
    /// On-chain `amount@token` encoding, already ceiling-rounded.
    pub amount: String,
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Abstraction over the ledger node's RPC surface.
///
/// All chain reads and writes go through this trait; engines never touch
/// the transport directly, which keeps them testable against mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch a vault and its open auction batches.
    /// Fails with `VaultLookup` if the id is unknown or the node is down.
    async fn get_vault(&self, vault_id: &str) -> Result<Vault, GavelError>;

    /// Enumerate vaults currently under auction, up to `limit`.
    async fn list_auctions(&self, limit: usize) -> Result<Vec<Vault>, GavelError>;

    /// Query settled auction history for `scope` (e.g. "all" or an address).
    async fn list_auction_history(
        &self,
        scope: &str,
        limit: usize,
    ) -> Result<Vec<AuctionHistoryRecord>, GavelError>;

    /// Place a bid on a batch. Fails with `BidSubmission` on rejection.
    async fn place_auction_bid(&self, bid: PlaceAuctionBid) -> Result<String, GavelError>;

    /// Block until the chain reaches `height`, or fail with `Timeout`
    /// after `timeout_ms`.
    async fn wait_for_block_height(
        &self,
        height: u64,
        timeout_ms: u64,
    ) -> Result<BlockTip, GavelError>;

    /// Block until a new block arrives, or fail with `Timeout`.
    async fn wait_for_new_block(&self, timeout_ms: u64) -> Result<BlockTip, GavelError>;

    /// Look up a liquidity pool by pair name (e.g. "DUSD-DFI").
    /// Fails with `PoolNotFound` if the pair does not exist.
    async fn get_pool_pair(&self, pair: &str) -> Result<PoolPair, GavelError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
