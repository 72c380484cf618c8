//! Valuation engine.
//!
//! Converts a token quantity into the reference currency using AMM pool
//! reserve ratios. The base fee token and the reference token have a
//! shared pool; every other token is priced through its direct pool
//! against the reference, falling back to a two-hop route through the
//! base token when no direct pool exists. Ratios are already decimal, so
//! no rounding happens here — rounding is an on-chain-amount concern.

use rust_decimal::Decimal;
use tracing::debug;

use crate::ledger::LedgerClient;
use crate::types::GavelError;

/// The stable-value token every loan and collateral is compared in.
pub const REFERENCE_TOKEN: &str = "DUSD";

/// The network's base fee token.
pub const BASE_TOKEN: &str = "DFI";

/// Pool holding the reference and base tokens. Orientation: reserve A is
/// the reference token, so `reserveA/reserveB` is reference-per-base.
fn reference_base_pair() -> String {
    format!("{REFERENCE_TOKEN}-{BASE_TOKEN}")
}

fn valuation_error(symbol: &str, e: GavelError) -> GavelError {
    GavelError::Valuation {
        symbol: symbol.to_string(),
        message: e.to_string(),
    }
}

/// Prices token amounts in the reference currency via pool reserve ratios.
pub struct Valuer<'a> {
    ledger: &'a dyn LedgerClient,
}

impl<'a> Valuer<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self { ledger }
    }

    /// Convert `amount` of `symbol` into the reference currency.
    ///
    /// Any failure other than the direct pool being missing propagates as
    /// `Valuation`; callers must treat the affected amount as unpriced,
    /// never as zero.
    pub async fn price_in_reference(
        &self,
        amount: Decimal,
        symbol: &str,
    ) -> Result<Decimal, GavelError> {
        // Reference amounts are already in the reference currency. The
        // pools only quote other tokens against it.
        if symbol == REFERENCE_TOKEN {
            return Ok(amount);
        }

        if symbol == BASE_TOKEN {
            let pool = self
                .ledger
                .get_pool_pair(&reference_base_pair())
                .await
                .map_err(|e| valuation_error(symbol, e))?;
            return Ok(pool.reserve_ab * amount);
        }

        let direct = format!("{symbol}-{REFERENCE_TOKEN}");
        match self.ledger.get_pool_pair(&direct).await {
            Ok(pool) => Ok(pool.reserve_ba * amount),
            Err(GavelError::PoolNotFound { .. }) => {
                debug!(symbol, "no direct pool, pricing through base token");
                self.two_hop(amount, symbol).await
            }
            Err(e) => Err(valuation_error(symbol, e)),
        }
    }

    /// Two-hop route: symbol→base, then base→reference. The two pool
    /// lookups are independent and issued concurrently; the result only
    /// combines them after both return.
    async fn two_hop(&self, amount: Decimal, symbol: &str) -> Result<Decimal, GavelError> {
        let base_pair = format!("{symbol}-{BASE_TOKEN}");
        let reference_pair = reference_base_pair();
        let (base_leg, reference_leg) = tokio::join!(
            self.ledger.get_pool_pair(&base_pair),
            self.ledger.get_pool_pair(&reference_pair),
        );
        let base_leg = base_leg.map_err(|e| valuation_error(symbol, e))?;
        let reference_leg = reference_leg.map_err(|e| valuation_error(symbol, e))?;

        Ok(base_leg.reserve_ba * amount * reference_leg.reserve_ab)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
