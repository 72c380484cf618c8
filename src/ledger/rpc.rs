//! JSON-RPC implementation of `LedgerClient`.
//!
//! Speaks the node's JSON-RPC 1.0 dialect over HTTP. Responsible for all
//! transport concerns and for classifying failures into the domain error
//! taxonomy: transport timeouts and expired block waits become `Timeout`,
//! unknown pools become `PoolNotFound`, vault reads and bid placements map
//! to `VaultLookup` and `BidSubmission`, and anything else surfaces as
//! `Rpc` with the method name attached.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    AuctionHistoryRecord, BlockTip, LedgerClient, PlaceAuctionBid, PoolPair, Vault,
};
use crate::types::{AuctionBatch, GavelError, HighestBid, TokenAmount};

/// Slack added on top of the RPC-level wait timeout so the server can
/// answer before the transport gives up.
const TRANSPORT_SLACK: Duration = Duration::from_secs(5);

/// Default timeout for plain (non-waiting) calls.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Raw wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcEnvelope<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVault {
    vault_id: String,
    #[serde(default)]
    batches: Vec<RawBatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBatch {
    index: u32,
    loan: String,
    #[serde(default)]
    collaterals: Vec<String>,
    #[serde(default)]
    highest_bid: Option<RawHighestBid>,
}

#[derive(Debug, Deserialize)]
struct RawHighestBid {
    owner: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct RawPoolPairInfo {
    #[serde(rename = "reserveA/reserveB")]
    reserve_ab: Decimal,
    #[serde(rename = "reserveB/reserveA")]
    reserve_ba: Decimal,
}

#[derive(Debug, Deserialize)]
struct RawBlockTip {
    height: u64,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn batch_from_raw(vault_id: &str, raw: RawBatch) -> Result<AuctionBatch, GavelError> {
    let highest_bid = match raw.highest_bid {
        Some(hb) => Some(HighestBid {
            amount: hb.amount.parse::<TokenAmount>()?,
            owner: hb.owner,
        }),
        None => None,
    };
    Ok(AuctionBatch {
        vault_id: vault_id.to_string(),
        index: raw.index,
        loan: raw.loan.parse()?,
        collaterals: raw
            .collaterals
            .into_iter()
            .map(|c| c.parse())
            .collect::<Result<_, _>>()?,
        highest_bid,
    })
}

fn vault_from_raw(raw: RawVault) -> Result<Vault, GavelError> {
    let vault_id = raw.vault_id;
    let batches = raw
        .batches
        .into_iter()
        .map(|b| batch_from_raw(&vault_id, b))
        .collect::<Result<_, _>>()?;
    Ok(Vault { vault_id, batches })
}

/// The node keys the pool-pair result by internal pool id; the single
/// entry carries both reserve orientations.
fn pool_pair_from_map(
    pair: &str,
    map: BTreeMap<String, RawPoolPairInfo>,
) -> Result<PoolPair, GavelError> {
    let info = map
        .into_values()
        .next()
        .ok_or_else(|| GavelError::PoolNotFound {
            pair: pair.to_string(),
        })?;
    Ok(PoolPair {
        reserve_ab: info.reserve_ab,
        reserve_ba: info.reserve_ba,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// JSON-RPC ledger client.
pub struct JsonRpcLedger {
    http: Client,
    url: String,
    /// Last tip height seen by a block wait. The node answers
    /// `waitfornewblock` with the current tip even when the wait expired,
    /// so an unchanged height is how a timeout manifests.
    last_height: Mutex<Option<u64>>,
}

impl JsonRpcLedger {
    pub fn new(url: impl Into<String>) -> Result<Self, GavelError> {
        let http = Client::builder()
            .user_agent("GAVEL/0.1.0 (vault-auction-agent)")
            .build()
            .map_err(|e| GavelError::Rpc {
                method: "client".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            url: url.into(),
            last_height: Mutex::new(None),
        })
    }

    /// Issue one JSON-RPC call and unwrap the response envelope.
    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<R, GavelError> {
        let body = serde_json::json!({
            "jsonrpc": "1.0",
            "id": "gavel",
            "method": method,
            "params": params,
        });

        debug!(method, "ledger rpc call");

        let resp = self
            .http
            .post(&self.url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GavelError::Timeout {
                        operation: method.to_string(),
                    }
                } else {
                    GavelError::Rpc {
                        method: method.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let envelope: RpcEnvelope<R> = resp.json().await.map_err(|e| GavelError::Rpc {
            method: method.to_string(),
            message: format!("malformed response: {e}"),
        })?;

        if let Some(err) = envelope.error {
            warn!(method, code = err.code, message = %err.message, "ledger rpc error");
            return Err(GavelError::Rpc {
                method: method.to_string(),
                message: err.message,
            });
        }

        envelope.result.ok_or_else(|| GavelError::Rpc {
            method: method.to_string(),
            message: "empty result".to_string(),
        })
    }

    fn record_height(&self, height: u64) {
        *self.last_height.lock().unwrap() = Some(height);
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn get_vault(&self, vault_id: &str) -> Result<Vault, GavelError> {
        let raw: RawVault = self
            .call("getvault", serde_json::json!([vault_id]), CALL_TIMEOUT)
            .await
            .map_err(|e| GavelError::VaultLookup {
                vault_id: vault_id.to_string(),
                message: e.to_string(),
            })?;
        vault_from_raw(raw)
    }

    async fn list_auctions(&self, limit: usize) -> Result<Vec<Vault>, GavelError> {
        let raw: Vec<RawVault> = self
            .call(
                "listauctions",
                serde_json::json!([{ "limit": limit }]),
                CALL_TIMEOUT,
            )
            .await?;
        raw.into_iter().map(vault_from_raw).collect()
    }

    async fn list_auction_history(
        &self,
        scope: &str,
        limit: usize,
    ) -> Result<Vec<AuctionHistoryRecord>, GavelError> {
        self.call(
            "listauctionhistory",
            serde_json::json!([scope, { "limit": limit }]),
            CALL_TIMEOUT,
        )
        .await
    }

    async fn place_auction_bid(&self, bid: PlaceAuctionBid) -> Result<String, GavelError> {
        self.call(
            "placeauctionbid",
            serde_json::json!([bid.vault_id, bid.index, bid.from, bid.amount]),
            CALL_TIMEOUT,
        )
        .await
        .map_err(|e| GavelError::BidSubmission(e.to_string()))
    }

    async fn wait_for_block_height(
        &self,
        height: u64,
        timeout_ms: u64,
    ) -> Result<BlockTip, GavelError> {
        let transport = Duration::from_millis(timeout_ms) + TRANSPORT_SLACK;
        let tip: RawBlockTip = self
            .call(
                "waitforblockheight",
                serde_json::json!([height, timeout_ms]),
                transport,
            )
            .await?;

        self.record_height(tip.height);

        // The node replies with the current tip when the wait expires
        // before the target is reached.
        if tip.height < height {
            return Err(GavelError::Timeout {
                operation: "waitforblockheight".to_string(),
            });
        }
        Ok(BlockTip { height: tip.height })
    }

    async fn wait_for_new_block(&self, timeout_ms: u64) -> Result<BlockTip, GavelError> {
        let transport = Duration::from_millis(timeout_ms) + TRANSPORT_SLACK;
        let tip: RawBlockTip = self
            .call(
                "waitfornewblock",
                serde_json::json!([timeout_ms]),
                transport,
            )
            .await?;

        let previous = *self.last_height.lock().unwrap();
        self.record_height(tip.height);

        if previous == Some(tip.height) {
            return Err(GavelError::Timeout {
                operation: "waitfornewblock".to_string(),
            });
        }
        Ok(BlockTip { height: tip.height })
    }

    async fn get_pool_pair(&self, pair: &str) -> Result<PoolPair, GavelError> {
        let result: Result<BTreeMap<String, RawPoolPairInfo>, GavelError> = self
            .call("getpoolpair", serde_json::json!([pair]), CALL_TIMEOUT)
            .await;

        match result {
            Ok(map) => pool_pair_from_map(pair, map),
            Err(GavelError::Rpc { message, .. }) if message.contains("Pool not found") => {
                Err(GavelError::PoolNotFound {
                    pair: pair.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
