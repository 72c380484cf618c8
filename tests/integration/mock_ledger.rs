//! Mock ledger for integration testing.
//!
//! Provides a deterministic `LedgerClient` implementation backed by
//! in-memory state: a scripted sequence of block tips, a mutable vault
//! snapshot, and a pool table — no network, no node.
//!
//! Placed bids are applied to the vault snapshot, so the next decision
//! cycle observes its own bid as the standing highest, the way a real
//! chain would show it one block later.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Mutex;

use gavel::ledger::{
    AuctionHistoryRecord, BlockTip, LedgerClient, PlaceAuctionBid, PoolPair, Vault,
};
use gavel::types::{GavelError, HighestBid, TokenAmount};

/// A mock ledger node for deterministic testing.
///
/// All state is in-memory and fully controllable from test code.
pub struct MockLedger {
    /// Tip heights handed out by the block waits, one per call.
    heights: Mutex<VecDeque<u64>>,
    vaults: Mutex<Vec<Vault>>,
    bids: Mutex<Vec<PlaceAuctionBid>>,
    history: Mutex<Vec<AuctionHistoryRecord>>,
    pools: Mutex<HashMap<String, PoolPair>>,
    /// If set, all operations will return this error.
    force_error: Mutex<Option<String>>,
}

impl MockLedger {
    pub fn new(vaults: Vec<Vault>, heights: impl IntoIterator<Item = u64>) -> Self {
        Self {
            heights: Mutex::new(heights.into_iter().collect()),
            vaults: Mutex::new(vaults),
            bids: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            pools: Mutex::new(HashMap::new()),
            force_error: Mutex::new(None),
        }
    }

    pub fn add_pool(&self, pair: &str, pool: PoolPair) {
        self.pools.lock().unwrap().insert(pair.to_string(), pool);
    }

    pub fn add_history(&self, record: AuctionHistoryRecord) {
        self.history.lock().unwrap().push(record);
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Bids placed so far, in order.
    pub fn placed_bids(&self) -> Vec<PlaceAuctionBid> {
        self.bids.lock().unwrap().clone()
    }

    fn check_error(&self, method: &str) -> Result<(), GavelError> {
        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(GavelError::Rpc {
                method: method.to_string(),
                message: msg.clone(),
            });
        }
        Ok(())
    }

    fn next_height(&self, operation: &str) -> Result<BlockTip, GavelError> {
        self.heights
            .lock()
            .unwrap()
            .pop_front()
            .map(|height| BlockTip { height })
            .ok_or_else(|| GavelError::Timeout {
                operation: operation.to_string(),
            })
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_vault(&self, vault_id: &str) -> Result<Vault, GavelError> {
        self.check_error("getvault")?;
        self.vaults
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.vault_id == vault_id)
            .cloned()
            .ok_or_else(|| GavelError::VaultLookup {
                vault_id: vault_id.to_string(),
                message: "Vault <id> not found".to_string(),
            })
    }

    async fn list_auctions(&self, limit: usize) -> Result<Vec<Vault>, GavelError> {
        self.check_error("listauctions")?;
        let vaults = self.vaults.lock().unwrap();
        Ok(vaults.iter().take(limit).cloned().collect())
    }

    async fn list_auction_history(
        &self,
        _scope: &str,
        limit: usize,
    ) -> Result<Vec<AuctionHistoryRecord>, GavelError> {
        self.check_error("listauctionhistory")?;
        let history = self.history.lock().unwrap();
        Ok(history.iter().take(limit).cloned().collect())
    }

    async fn place_auction_bid(&self, bid: PlaceAuctionBid) -> Result<String, GavelError> {
        self.check_error("placeauctionbid")?;

        // Apply the bid to the snapshot so the next round sees it standing.
        let amount = TokenAmount::from_str(&bid.amount)
            .map_err(|e| GavelError::BidSubmission(e.to_string()))?;
        let mut vaults = self.vaults.lock().unwrap();
        let batch = vaults
            .iter_mut()
            .find(|v| v.vault_id == bid.vault_id)
            .and_then(|v| v.batches.iter_mut().find(|b| b.index == bid.index))
            .ok_or_else(|| GavelError::BidSubmission("no such batch".to_string()))?;
        batch.highest_bid = Some(HighestBid {
            amount,
            owner: bid.from.clone(),
        });

        let mut bids = self.bids.lock().unwrap();
        bids.push(bid);
        Ok(format!("txid-{}", bids.len()))
    }

    async fn wait_for_block_height(
        &self,
        height: u64,
        _timeout_ms: u64,
    ) -> Result<BlockTip, GavelError> {
        self.check_error("waitforblockheight")?;
        let tip = self.next_height("waitforblockheight")?;
        if tip.height < height {
            return Err(GavelError::Timeout {
                operation: "waitforblockheight".to_string(),
            });
        }
        Ok(tip)
    }

    async fn wait_for_new_block(&self, _timeout_ms: u64) -> Result<BlockTip, GavelError> {
        self.check_error("waitfornewblock")?;
        self.next_height("waitfornewblock")
    }

    async fn get_pool_pair(&self, pair: &str) -> Result<PoolPair, GavelError> {
        self.check_error("getpoolpair")?;
        self.pools
            .lock()
            .unwrap()
            .get(pair)
            .copied()
            .ok_or_else(|| GavelError::PoolNotFound {
                pair: pair.to_string(),
            })
    }
}
