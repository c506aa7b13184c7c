//! Pair Address Service
//!
//! Standalone service that warms the pair-address cache by enumerating the
//! factory, then keeps resolving on demand until shutdown. Can be run as a
//! separate process or integrated into other services.

use anyhow::Result;
use pair_address_adapter::{PairAddressConfig, PairAddressResolver};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pair_address_adapter=debug".parse()?),
        )
        .init();

    info!("Starting Pair Address Service");

    let config = PairAddressConfig {
        primary_rpc: std::env::var("ETH_RPC_URL")
            .unwrap_or_else(|_| "https://eth.llamarpc.com".to_string()),
        cache_dir: PathBuf::from("./data/pair_cache"),
        ..Default::default()
    };
    let cache_dir = config.cache_dir.clone();

    let resolver = PairAddressResolver::with_web3(config)?;
    info!(
        "Resolver initialized, {} pairs already cached, cache at {:?}",
        resolver.cached_pairs(),
        cache_dir
    );

    match resolver.discover_all_pairs().await {
        Ok(count) => info!("Warm-up complete, {} pairs enumerated", count),
        Err(e) => warn!("Warm-up enumeration failed: {}", e),
    }

    info!("Service running. Press Ctrl+C to stop.");
    signal::ctrl_c().await?;

    info!("Shutting down Pair Address Service");
    resolver.save_cache()?;
    info!("Cache saved. Service stopped.");

    Ok(())
}
