//! Record store HTTP server binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use records::server::{CliArgs, RecordServer, RecordServerConfig};
use records::{Authenticator, RecordStore};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> records::Result<()> {
    let mut config = args.to_config()?;
    let server_config = RecordServerConfig::from(&args);

    let authenticator = Authenticator::new(std::mem::take(&mut config.authorized_users))?;
    if authenticator.is_empty() {
        tracing::warn!("No authorized users configured; every record request will be rejected");
    } else {
        tracing::info!("Loaded {} authorized token(s)", authenticator.len());
    }

    tracing::info!("Opening record store with storage config: {:?}", config.storage);
    let store = RecordStore::open(config).await?;

    let server = RecordServer::new(Arc::new(store), authenticator, server_config);
    server.run().await
}
