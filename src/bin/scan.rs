//! GAVEL scan-and-rank mode.
//!
//! Entry point. Enumerates every open auction batch, prices each one in
//! the reference currency, and prints the opportunities that clear the
//! configured threshold as a JSON array on stdout, best margin first.

use anyhow::{Context, Result};
use tracing::info;

use gavel::config::ScanConfig;
use gavel::engine::ranker::Ranker;
use gavel::ledger::rpc::JsonRpcLedger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = ScanConfig::from_env().context("loading scan configuration")?;
    info!(
        endpoint = %cfg.endpoint_url,
        num_of_auctions = cfg.num_of_auctions,
        "GAVEL scan mode starting"
    );

    let ledger =
        JsonRpcLedger::new(cfg.endpoint_url.clone()).context("building ledger client")?;

    let ranker = Ranker::new(&ledger, &cfg);
    let ranked = ranker.rank().await.context("scan-and-rank run")?;

    for opp in &ranked {
        info!("{opp}");
    }
    println!("{}", serde_json::to_string_pretty(&ranked)?);

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
