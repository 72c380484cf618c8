//! Shared types for the GAVEL agent.
//!
//! These types form the data model used across all modules. Quantities are
//! `rust_decimal::Decimal` throughout — never binary floats — so repeated
//! raise-factor multiplications do not drift.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Fractional digits carried by on-chain amounts.
pub const CHAIN_DECIMALS: u32 = 8;

// ---------------------------------------------------------------------------
// TokenAmount
// ---------------------------------------------------------------------------

/// An exact quantity of a named token, the unit every bid, loan and
/// collateral value is expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    pub amount: Decimal,
    pub symbol: String,
}

impl TokenAmount {
    pub fn new(amount: Decimal, symbol: impl Into<String>) -> Self {
        Self {
            amount,
            symbol: symbol.into(),
        }
    }

    /// Render as the on-chain `amount@symbol` encoding.
    ///
    /// The quantity is ceiling-rounded to 8 fractional digits: a submitted
    /// bid must never come out fractionally short of the intended raise, so
    /// truncation and round-to-nearest are both off the table.
    pub fn to_chain_string(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(CHAIN_DECIMALS, RoundingStrategy::ToPositiveInfinity);
        format!("{rounded:.8}@{}", self.symbol)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.amount, self.symbol)
    }
}

impl FromStr for TokenAmount {
    type Err = GavelError;

    /// Parse the `amount@symbol` encoding used on the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, symbol) = s
            .split_once('@')
            .ok_or_else(|| GavelError::MalformedAmount(s.to_string()))?;
        if symbol.is_empty() {
            return Err(GavelError::MalformedAmount(s.to_string()));
        }
        let amount = Decimal::from_str(amount)
            .map_err(|_| GavelError::MalformedAmount(s.to_string()))?;
        Ok(TokenAmount::new(amount, symbol))
    }
}

// ---------------------------------------------------------------------------
// Auction snapshot
// ---------------------------------------------------------------------------

/// The best standing bid on a batch, with the bidder's address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighestBid {
    pub amount: TokenAmount,
    pub owner: String,
}

/// One liquidation lot inside a vault, as observed at a single point in
/// time. Re-read on every decision cycle — it can change between blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionBatch {
    pub vault_id: String,
    /// Ordinal of this batch within its vault.
    pub index: u32,
    pub loan: TokenAmount,
    pub collaterals: Vec<TokenAmount>,
    pub highest_bid: Option<HighestBid>,
}

// ---------------------------------------------------------------------------
// Bid decision
// ---------------------------------------------------------------------------

/// Whether a computed bid should be sent to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BidAction {
    Submit,
    Skip,
}

impl fmt::Display for BidAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidAction::Submit => write!(f, "SUBMIT"),
            BidAction::Skip => write!(f, "SKIP"),
        }
    }
}

/// Outcome of the bid decision engine for one cycle. Ephemeral —
/// recomputed every block, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidDecision {
    pub amount: Decimal,
    pub token: String,
    pub action: BidAction,
}

impl BidDecision {
    /// The on-chain encoding of this bid (ceiling-rounded to 8 places).
    pub fn to_chain_string(&self) -> String {
        TokenAmount::new(self.amount, self.token.clone()).to_chain_string()
    }
}

impl fmt::Display for BidDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}@{}", self.action, self.amount, self.token)
    }
}

// ---------------------------------------------------------------------------
// Ranked opportunity
// ---------------------------------------------------------------------------

/// One scored auction batch from a scan run, valued in the reference
/// currency. `margin` is the percentage return on the starting bid.
#[derive(Debug, Clone, Serialize)]
pub struct RankedOpportunity {
    pub url: String,
    pub starting_bid: Decimal,
    pub reward: Decimal,
    /// reward − starting_bid
    pub diff: Decimal,
    /// diff / starting_bid × 100. Only defined for starting_bid > 0.
    pub margin: Decimal,
}

impl RankedOpportunity {
    /// Build an opportunity from its priced legs.
    ///
    /// Returns `None` for a non-positive starting bid — that is a data
    /// error, not a valid auction state, and the margin is undefined.
    pub fn score(url: String, starting_bid: Decimal, reward: Decimal) -> Option<Self> {
        if starting_bid <= Decimal::ZERO {
            return None;
        }
        let diff = reward - starting_bid;
        let margin = diff / starting_bid * dec!(100);
        Some(Self {
            url,
            starting_bid,
            reward,
            diff,
            margin,
        })
    }
}

impl fmt::Display for RankedOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | bid={:.4} reward={:.4} diff={:.4} margin={:.2}%",
            self.url, self.starting_bid, self.reward, self.diff, self.margin,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error taxonomy for GAVEL.
///
/// `Timeout` is the only class that the block-wait loop retries; everything
/// else aborts the run or, in the ranker, drops the affected opportunity.
#[derive(Debug, thiserror::Error)]
pub enum GavelError {
    #[error("timed out waiting on {operation}")]
    Timeout { operation: String },

    #[error("vault lookup failed ({vault_id}): {message}")]
    VaultLookup { vault_id: String, message: String },

    #[error("pool pair not found: {pair}")]
    PoolNotFound { pair: String },

    #[error("valuation failed for {symbol}: {message}")]
    Valuation { symbol: String, message: String },

    #[error("bid submission rejected: {0}")]
    BidSubmission(String),

    #[error("missing or invalid config value: {0}")]
    Config(String),

    #[error("malformed token amount: {0}")]
    MalformedAmount(String),

    #[error("ledger rpc error ({method}): {message}")]
    Rpc { method: String, message: String },
}

impl GavelError {
    /// Whether this error is the expected-under-polling timeout class.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GavelError::Timeout { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
