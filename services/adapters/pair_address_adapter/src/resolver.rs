//! Pair address resolver.
//!
//! Implements the core's `AddressBook` seam: pair construction asks it for
//! a cached authoritative address and hands over a live handle. On a cache
//! miss the pair keeps its provisional CREATE2 address while a background
//! task queries the factory; once the authoritative address lands it is
//! cached permanently and every registered handle is patched. Last
//! resolution wins.

use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use ethereum_types::H160;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use pair::{AddressBook, Deployment, PairLiquidityAddress};

use crate::cache::PairAddressCache;
use crate::config::PairAddressConfig;
use crate::factory_client::{FactoryClient, Web3FactoryClient};

#[derive(Debug, Default, Clone)]
pub struct ResolverMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub resolutions: u64,
    pub failures: u64,
}

#[derive(Debug)]
struct RateLimiter {
    requests_per_second: u32,
    last_request: std::time::Instant,
}

impl RateLimiter {
    fn new(requests_per_second: u32) -> Self {
        Self {
            requests_per_second: requests_per_second.max(1),
            last_request: std::time::Instant::now(),
        }
    }

    async fn wait_if_needed(&mut self) {
        let min_interval = Duration::from_millis(1000 / self.requests_per_second as u64);
        let elapsed = self.last_request.elapsed();

        if elapsed < min_interval {
            sleep(min_interval - elapsed).await;
        }

        self.last_request = std::time::Instant::now();
    }
}

fn canonical(a: H160, b: H160) -> (H160, H160) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential retry backoff, saturating at [`MAX_BACKOFF`].
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let millis = 1000u64.saturating_mul(2u64.saturating_pow(attempt.min(16)));
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

#[derive(Clone)]
pub struct PairAddressResolver {
    config: PairAddressConfig,

    /// Permanent pair address cache
    cache: Arc<PairAddressCache>,

    /// Chain-side collaborator
    client: Arc<dyn FactoryClient>,

    /// Live handles registered by pair construction, keyed canonically
    handles: Arc<DashMap<(H160, H160), Vec<PairLiquidityAddress>>>,

    /// Rate limiter
    rate_limiter: Arc<Mutex<RateLimiter>>,

    /// Metrics
    metrics: Arc<RwLock<ResolverMetrics>>,
}

impl PairAddressResolver {
    /// Create a resolver with an explicit factory client (tests inject a
    /// mock here).
    pub fn new(config: PairAddressConfig, client: Arc<dyn FactoryClient>) -> Result<Self> {
        let cache = Arc::new(
            PairAddressCache::new(config.cache_dir.clone(), config.enable_disk_cache)
                .context("Failed to initialize pair address cache")?,
        );

        let rate_limiter = Arc::new(Mutex::new(RateLimiter::new(config.rate_limit_per_sec)));

        info!(
            "Pair address resolver initialized with {} cached pairs",
            cache.len()
        );

        Ok(Self {
            config,
            cache,
            client,
            handles: Arc::new(DashMap::new()),
            rate_limiter,
            metrics: Arc::new(RwLock::new(ResolverMetrics::default())),
        })
    }

    /// Create a resolver backed by the configured RPC endpoints.
    pub fn with_web3(config: PairAddressConfig) -> Result<Self> {
        let client = Arc::new(Web3FactoryClient::new(&config)?);
        Self::new(config, client)
    }

    pub fn metrics(&self) -> ResolverMetrics {
        self.metrics.read().clone()
    }

    pub fn cached_pairs(&self) -> usize {
        self.cache.len()
    }

    /// Force save cache to disk
    pub fn save_cache(&self) -> Result<()> {
        self.cache.force_snapshot()
    }

    /// Resolve one pair against the factory, updating the cache and any
    /// registered handles. `Ok(None)` means the factory has no such pair.
    pub async fn resolve_pair(&self, token_a: H160, token_b: H160) -> Result<Option<H160>> {
        let (token0, token1) = canonical(token_a, token_b);

        self.rate_limiter.lock().await.wait_if_needed().await;

        match self.client.pair_for(token0, token1).await {
            Ok(Some(address)) => {
                self.apply_resolution(token0, token1, address);
                self.metrics.write().resolutions += 1;
                Ok(Some(address))
            }
            Ok(None) => {
                debug!(
                    "Factory has no pair for 0x{}/0x{}",
                    hex::encode(token0),
                    hex::encode(token1)
                );
                Ok(None)
            }
            Err(e) => {
                self.metrics.write().failures += 1;
                Err(e)
            }
        }
    }

    /// Enumerate every pair the factory has deployed, caching all of them
    /// and patching any registered handles. Returns the number of pairs.
    pub async fn discover_all_pairs(&self) -> Result<usize> {
        let listings = self.client.all_pairs().await?;
        let count = listings.len();

        for listing in listings {
            let (token0, token1) = canonical(listing.token0, listing.token1);
            self.apply_resolution(token0, token1, listing.pair);
        }

        info!("Discovered {} pairs from factory", count);
        Ok(count)
    }

    fn apply_resolution(&self, token0: H160, token1: H160, address: H160) {
        if let Err(e) = self.cache.insert(token0, token1, address) {
            warn!("Failed to persist pair address: {}", e);
        }

        if let Some(registered) = self.handles.get(&(token0, token1)) {
            for handle in registered.iter() {
                handle.resolve(address);
            }
            debug!(
                "Patched {} live handle(s) for pair 0x{}",
                registered.len(),
                hex::encode(address)
            );
        }
    }

    /// Resolve in the background with retry and exponential backoff.
    ///
    /// A terminal failure leaves the provisional address in place; the
    /// arithmetic layer never sees an error from this path.
    fn spawn_background_resolution(&self, token0: H160, token1: H160) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No tokio runtime, skipping background pair resolution");
            return;
        };

        let resolver = self.clone();
        let max_attempts = self.config.max_retries;
        runtime.spawn(async move {
            for attempt in 1..=max_attempts {
                match resolver.resolve_pair(token0, token1).await {
                    Ok(Some(address)) => {
                        info!(
                            "Resolved pair 0x{}/0x{} to 0x{}",
                            hex::encode(token0),
                            hex::encode(token1),
                            hex::encode(address)
                        );
                        return;
                    }
                    Ok(None) => {
                        warn!(
                            "Factory has no pair for 0x{}/0x{}, keeping provisional address",
                            hex::encode(token0),
                            hex::encode(token1)
                        );
                        return;
                    }
                    Err(e) => {
                        warn!(
                            "Pair resolution failed (attempt {}/{}): {}",
                            attempt, max_attempts, e
                        );
                        if attempt < max_attempts {
                            sleep(backoff_delay(attempt)).await;
                        }
                    }
                }
            }
            warn!(
                "Giving up on pair 0x{}/0x{}, provisional address stays",
                hex::encode(token0),
                hex::encode(token1)
            );
        });
    }
}

impl AddressBook for PairAddressResolver {
    fn lookup(&self, chain_id: u64, token0: H160, token1: H160) -> Option<H160> {
        if chain_id != self.config.chain_id {
            debug!(
                "Lookup for chain {} on a chain-{} resolver",
                chain_id, self.config.chain_id
            );
            return None;
        }

        match self.cache.get(token0, token1) {
            Some(address) => {
                self.metrics.write().cache_hits += 1;
                Some(address)
            }
            None => {
                self.metrics.write().cache_misses += 1;
                None
            }
        }
    }

    fn deployment(&self) -> Deployment {
        Deployment {
            factory: self.config.factory_address,
            init_code_hash: self.config.init_code_hash,
        }
    }

    fn register(&self, chain_id: u64, token0: H160, token1: H160, handle: PairLiquidityAddress) {
        if chain_id != self.config.chain_id {
            return;
        }

        let key = canonical(token0, token1);
        self.handles.entry(key).or_default().push(handle.clone());

        if let Some(address) = self.cache.get(token0, token1) {
            handle.resolve(address);
        } else if !self.config.deterministic {
            self.spawn_background_resolution(key.0, key.1);
        }
    }
}
