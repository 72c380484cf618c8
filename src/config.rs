//! Configuration loading from environment variables.
//!
//! Every run mode builds one immutable config struct at startup and passes
//! it by parameter into the engines — there is no global configuration.
//! All required values are validated present before any network activity;
//! a missing or unparsable value fails fast with `GavelError::Config`
//! naming the offending key.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

use crate::engine::ranker::RankThreshold;
use crate::types::GavelError;

// Defaults for the block-wait retry policy (overridable via env).
const DEFAULT_RETRY_ATTEMPTS: u32 = 240;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const DEFAULT_RETRY_BACKOFF_CAP_MS: u64 = 15_000;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Settings for bid-and-watch mode. Read-only for the whole run.
#[derive(Debug, Clone)]
pub struct BidConfig {
    pub endpoint_url: String,
    /// Block height at which the auction settles and bidding stops.
    pub max_block_height: u64,
    /// Safety margin: start bidding this many blocks before the target.
    pub block_delta: u64,
    /// Per-call timeout for block waits, in milliseconds.
    pub api_timeout_ms: u64,
    pub vault_id: String,
    pub batch_index: u32,
    pub wallet_address: String,
    pub min_bid: Decimal,
    pub max_bid: Decimal,
    pub bid_token: String,
    /// Multiplier applied to the current highest bid (> 1, e.g. 1.05).
    pub bid_raise: Decimal,
    pub retry: RetrySettings,
}

/// Bounds for the block-wait retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

/// Settings for scan-and-rank mode.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub endpoint_url: String,
    /// Maximum number of open auctions to enumerate.
    pub num_of_auctions: usize,
    /// Pause between per-batch pricing passes, in milliseconds.
    pub cooldown_ms: u64,
    pub threshold: RankThreshold,
}

// ---------------------------------------------------------------------------
// Environment lookup helpers
// ---------------------------------------------------------------------------

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn required(lookup: Lookup, key: &str) -> Result<String, GavelError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GavelError::Config(key.to_string()))
}

fn required_parsed<T: FromStr>(lookup: Lookup, key: &str) -> Result<T, GavelError> {
    required(lookup, key)?
        .trim()
        .parse()
        .map_err(|_| GavelError::Config(key.to_string()))
}

fn optional_parsed<T: FromStr>(
    lookup: Lookup,
    key: &str,
    default: T,
) -> Result<T, GavelError> {
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| GavelError::Config(key.to_string())),
        _ => Ok(default),
    }
}

fn retry_settings(lookup: Lookup) -> Result<RetrySettings, GavelError> {
    Ok(RetrySettings {
        max_attempts: optional_parsed(lookup, "WAIT_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
        initial_backoff_ms: optional_parsed(
            lookup,
            "WAIT_RETRY_BACKOFF_MS",
            DEFAULT_RETRY_BACKOFF_MS,
        )?,
        max_backoff_ms: optional_parsed(
            lookup,
            "WAIT_RETRY_BACKOFF_CAP_MS",
            DEFAULT_RETRY_BACKOFF_CAP_MS,
        )?,
    })
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl BidConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, GavelError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Split out so the parsing and
    /// validation rules are testable without mutating the process env.
    pub fn from_lookup(lookup: Lookup) -> Result<Self, GavelError> {
        let cfg = Self {
            endpoint_url: required(lookup, "CLIENT_ENDPOINT_URL")?,
            max_block_height: required_parsed(lookup, "MAX_BLOCK_NUMBER")?,
            block_delta: required_parsed(lookup, "BLOCK_DELTA")?,
            api_timeout_ms: required_parsed(lookup, "API_TIMEOUT")?,
            vault_id: required(lookup, "VAULT_ID")?,
            batch_index: required_parsed(lookup, "BATCH_INDEX")?,
            wallet_address: required(lookup, "MY_WALLET_ADDRESS")?,
            min_bid: required_parsed(lookup, "MIN_BID")?,
            max_bid: required_parsed(lookup, "MAX_BID")?,
            bid_token: required(lookup, "BID_TOKEN")?,
            bid_raise: required_parsed(lookup, "NEW_BID_RAISE")?,
            retry: retry_settings(lookup)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), GavelError> {
        if self.min_bid > self.max_bid {
            return Err(GavelError::Config(
                "MIN_BID exceeds MAX_BID".to_string(),
            ));
        }
        if self.bid_raise <= dec!(1) {
            return Err(GavelError::Config(
                "NEW_BID_RAISE must be greater than 1".to_string(),
            ));
        }
        if self.block_delta >= self.max_block_height {
            return Err(GavelError::Config(
                "BLOCK_DELTA not below MAX_BLOCK_NUMBER".to_string(),
            ));
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, GavelError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self, GavelError> {
        // Two historical filter variants: margin-based and reward-based.
        // MIN_MARGIN wins when both are set.
        let threshold = if let Some(margin) = lookup("MIN_MARGIN").filter(|v| !v.trim().is_empty())
        {
            RankThreshold::MinMargin(
                margin
                    .trim()
                    .parse()
                    .map_err(|_| GavelError::Config("MIN_MARGIN".to_string()))?,
            )
        } else if let Some(reward) = lookup("MIN_REWARD").filter(|v| !v.trim().is_empty()) {
            RankThreshold::MinReward(
                reward
                    .trim()
                    .parse()
                    .map_err(|_| GavelError::Config("MIN_REWARD".to_string()))?,
            )
        } else {
            return Err(GavelError::Config("MIN_MARGIN".to_string()));
        };

        Ok(Self {
            endpoint_url: required(lookup, "CLIENT_ENDPOINT_URL")?,
            num_of_auctions: required_parsed(lookup, "NUM_OF_AUCTIONS")?,
            cooldown_ms: required_parsed(lookup, "COOL_DOWN")?,
            threshold,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
