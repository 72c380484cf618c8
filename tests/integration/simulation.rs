//! End-to-end simulation of both run modes against the mock ledger.
//!
//! Bid mode: drive the orchestrator through a scripted block sequence
//! and check what lands on chain. Scan mode: rank a small set of open
//! auctions through real pool pricing.

use rust_decimal_macros::dec;

use gavel::config::{BidConfig, RetrySettings, ScanConfig};
use gavel::engine::orchestrator::Orchestrator;
use gavel::engine::ranker::{RankThreshold, Ranker};
use gavel::ledger::{PoolPair, Vault};
use gavel::types::{AuctionBatch, GavelError, HighestBid, TokenAmount};

use crate::mock_ledger::MockLedger;

fn bid_cfg() -> BidConfig {
    BidConfig {
        endpoint_url: "http://127.0.0.1:8554".into(),
        max_block_height: 1000,
        block_delta: 5,
        api_timeout_ms: 50,
        vault_id: "vault-abc".into(),
        batch_index: 0,
        wallet_address: "df1qme".into(),
        min_bid: dec!(100),
        max_bid: dec!(150),
        bid_token: "DFI".into(),
        bid_raise: dec!(1.05),
        retry: RetrySettings {
            max_attempts: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        },
    }
}

fn auction_vault(highest_bid: Option<HighestBid>) -> Vault {
    Vault {
        vault_id: "vault-abc".into(),
        batches: vec![AuctionBatch {
            vault_id: "vault-abc".into(),
            index: 0,
            loan: TokenAmount::new(dec!(50), "DUSD"),
            collaterals: vec![TokenAmount::new(dec!(30), "DFI")],
            highest_bid,
        }],
    }
}

fn rival_bid(amount: rust_decimal::Decimal) -> HighestBid {
    HighestBid {
        amount: TokenAmount::new(amount, "DFI"),
        owner: "df1qrival".into(),
    }
}

// ---------------------------------------------------------------------------
// Bid mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bid_run_opens_once_then_defends_until_close() {
    let cfg = bid_cfg();
    // Target window 995; blocks 996..=999 each get a round, 1000 settles.
    let ledger = MockLedger::new(
        vec![auction_vault(None)],
        [995, 996, 997, 998, 999, 1000],
    );
    ledger.add_history(
        serde_json::from_value(serde_json::json!({
            "vaultId": "vault-abc",
            "batchIndex": 0,
            "winner": "df1qme",
            "auctionBid": "100.00000000@DFI",
        }))
        .unwrap(),
    );

    let record = Orchestrator::new(&ledger, &cfg)
        .run()
        .await
        .unwrap()
        .expect("settled record");

    // The opening bid lands once; every later round observes our own bid
    // standing and holds.
    let bids = ledger.placed_bids();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].amount, "100.00000000@DFI");
    assert_eq!(bids[0].from, "df1qme");
    assert_eq!(bids[0].vault_id, "vault-abc");

    assert_eq!(record.vault_id, "vault-abc");
    assert_eq!(record.details["winner"], "df1qme");
}

#[tokio::test]
async fn test_contested_auction_is_raised_by_factor() {
    let cfg = bid_cfg();
    let ledger = MockLedger::new(vec![auction_vault(Some(rival_bid(dec!(100))))], [999, 1000]);

    let record = Orchestrator::new(&ledger, &cfg).run().await.unwrap();
    assert!(record.is_none()); // no history scripted

    let bids = ledger.placed_bids();
    assert_eq!(bids.len(), 1);
    // 100 × 1.05, ceiling-rounded to 8 places
    assert_eq!(bids[0].amount, "105.00000000@DFI");
}

#[tokio::test]
async fn test_rival_bid_above_ceiling_is_never_chased() {
    let cfg = bid_cfg();
    // 160 × 1.05 = 168 > MAX_BID 150
    let ledger = MockLedger::new(vec![auction_vault(Some(rival_bid(dec!(160))))], [999, 1000]);

    Orchestrator::new(&ledger, &cfg).run().await.unwrap();
    assert!(ledger.placed_bids().is_empty());
}

#[tokio::test]
async fn test_exhausted_block_waits_end_the_run_with_timeout() {
    let cfg = bid_cfg(); // 2 wait attempts
    let ledger = MockLedger::new(vec![auction_vault(None)], []);

    let err = Orchestrator::new(&ledger, &cfg).run().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(ledger.placed_bids().is_empty());
}

#[tokio::test]
async fn test_node_failure_mid_run_aborts() {
    let cfg = bid_cfg();
    let ledger = MockLedger::new(vec![auction_vault(None)], [995, 996, 997]);
    ledger.set_error("connection refused");

    let err = Orchestrator::new(&ledger, &cfg).run().await.unwrap_err();
    assert!(matches!(err, GavelError::Rpc { .. }));
}

// ---------------------------------------------------------------------------
// Scan mode
// ---------------------------------------------------------------------------

fn scan_cfg(threshold: RankThreshold) -> ScanConfig {
    ScanConfig {
        endpoint_url: "http://127.0.0.1:8554".into(),
        num_of_auctions: 100,
        cooldown_ms: 0,
        threshold,
    }
}

fn scan_vault(vault_id: &str, loan: TokenAmount, collaterals: Vec<TokenAmount>) -> Vault {
    Vault {
        vault_id: vault_id.into(),
        batches: vec![AuctionBatch {
            vault_id: vault_id.into(),
            index: 0,
            loan,
            collaterals,
            highest_bid: None,
        }],
    }
}

#[tokio::test]
async fn test_scan_ranks_by_margin_across_pricing_routes() {
    let cfg = scan_cfg(RankThreshold::MinMargin(dec!(0)));
    let ledger = MockLedger::new(
        vec![
            // Reference-token batch: 50 DUSD loan, 60 DUSD collateral
            scan_vault(
                "v-dusd",
                TokenAmount::new(dec!(50), "DUSD"),
                vec![TokenAmount::new(dec!(60), "DUSD")],
            ),
            // Base-token collateral priced through DUSD-DFI
            scan_vault(
                "v-dfi",
                TokenAmount::new(dec!(50), "DUSD"),
                vec![TokenAmount::new(dec!(40), "DFI")],
            ),
            // No direct TSLA-DUSD pool: priced two-hop through DFI
            scan_vault(
                "v-tsla",
                TokenAmount::new(dec!(50), "DUSD"),
                vec![TokenAmount::new(dec!(10), "TSLA")],
            ),
        ],
        [],
    );
    ledger.add_pool(
        "DUSD-DFI",
        PoolPair {
            reserve_ab: dec!(2.5),
            reserve_ba: dec!(0.4),
        },
    );
    ledger.add_pool(
        "TSLA-DFI",
        PoolPair {
            reserve_ab: dec!(0.25),
            reserve_ba: dec!(4),
        },
    );

    let ranked = Ranker::new(&ledger, &cfg).rank().await.unwrap();
    assert_eq!(ranked.len(), 3);

    // All three open at 50 × 1.05 = 52.5; rewards 60, 100 and 100.
    // v-dfi: 40 DFI × 2.5 = 100. v-tsla: 10 × 4 × 2.5 = 100.
    assert_eq!(ranked[0].starting_bid, dec!(52.50));
    assert_eq!(ranked[0].reward, dec!(100));
    assert_eq!(ranked[1].reward, dec!(100));
    assert_eq!(ranked[2].reward, dec!(60));
    // Equal margins keep enumeration order
    assert!(ranked[0].url.contains("v-dfi"));
    assert!(ranked[1].url.contains("v-tsla"));
    assert!(ranked[0].margin > ranked[2].margin);
    assert!(ranked[2].url.contains("v-dusd"));
}

#[tokio::test]
async fn test_scan_drops_unpriceable_batches_and_filters_threshold() {
    let cfg = scan_cfg(RankThreshold::MinReward(dec!(5)));
    let ledger = MockLedger::new(
        vec![
            // diff = 7.5 → kept
            scan_vault(
                "v-good",
                TokenAmount::new(dec!(50), "DUSD"),
                vec![TokenAmount::new(dec!(60), "DUSD")],
            ),
            // diff = 2.5 → below MIN_REWARD
            scan_vault(
                "v-thin",
                TokenAmount::new(dec!(50), "DUSD"),
                vec![TokenAmount::new(dec!(55), "DUSD")],
            ),
            // No GHOST pools at all: unpriceable, dropped
            scan_vault(
                "v-ghost",
                TokenAmount::new(dec!(50), "DUSD"),
                vec![TokenAmount::new(dec!(1), "GHOST")],
            ),
        ],
        [],
    );

    let ranked = Ranker::new(&ledger, &cfg).rank().await.unwrap();
    assert_eq!(ranked.len(), 1);
    assert!(ranked[0].url.contains("v-good"));
    assert_eq!(ranked[0].diff, dec!(7.50));
}
