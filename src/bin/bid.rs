//! GAVEL bid-and-watch mode.
//!
//! Entry point. Loads configuration from the environment, initialises
//! structured logging, and drives the block-synchronized bidding loop
//! for one auction batch until its closing height. The settled auction
//! record (if the chain has one) is printed as JSON on stdout.

use anyhow::{Context, Result};
use tracing::{info, warn};

use gavel::config::BidConfig;
use gavel::engine::orchestrator::Orchestrator;
use gavel::ledger::rpc::JsonRpcLedger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = BidConfig::from_env().context("loading bid configuration")?;
    info!(
        endpoint = %cfg.endpoint_url,
        vault_id = %cfg.vault_id,
        batch_index = cfg.batch_index,
        closing = cfg.max_block_height,
        "GAVEL bid mode starting"
    );

    let ledger =
        JsonRpcLedger::new(cfg.endpoint_url.clone()).context("building ledger client")?;

    let orchestrator = Orchestrator::new(&ledger, &cfg);
    let outcome = orchestrator.run().await.context("bid-and-watch run")?;

    match outcome {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        None => {
            warn!("auction closed with no history record for this batch");
            println!("null");
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gavel=info"));

    if std::env::var("GAVEL_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
