//! Wallet server binary
//!
//! Reads newline-delimited JSON envelopes `{"token": ..., "request": {...}}`
//! from stdin and writes one JSON response per line to stdout. Logs go to
//! stderr, ending with a Prometheus text snapshot of the ledger metrics.

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_settlement::{Config, LoggingConfig, WalletService};

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WALLET_CONFIG").ok());

    let mut config = match path {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => Config::default(),
    };
    config.apply_env().context("invalid environment override")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging)?;

    info!(
        service = %config.ledger.service_name,
        version = %config.ledger.service_version,
        backend = ?config.ledger.storage.backend,
        "Starting wallet server"
    );

    let service = Arc::new(WalletService::from_config(&config).context("failed to open wallet")?);
    info!("Wallet opened, reading requests from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };

        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = service.handle_line(&line).await;
        let mut encoded = serde_json::to_vec(&response).context("failed to encode response")?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    match service.metrics().encode_text() {
        Ok(text) => info!(metrics = %text, "Final metrics snapshot"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    info!("Shutting down wallet server");
    Ok(())
}
