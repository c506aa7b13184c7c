//! Pair-address caching with persistent storage.
//!
//! A token pair's contract address never changes once the pair exists, so
//! entries are permanent: in-memory lookups backed by a JSON file that
//! survives restarts. Keys are the canonical (lower, higher) ordering of
//! the two token addresses; lookups accept either ordering.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dashmap::DashMap;
use ethereum_types::H160;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One resolved pair, as persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPair {
    pub token0: H160,
    pub token1: H160,
    pub pair: H160,
}

/// Thread-safe pair address cache
pub struct PairAddressCache {
    cache: DashMap<(H160, H160), H160>,

    /// Path to persistent cache file
    cache_file: PathBuf,

    /// Whether disk persistence is enabled
    persist_to_disk: bool,
}

fn canonical(a: H160, b: H160) -> (H160, H160) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PairAddressCache {
    pub fn new(cache_dir: PathBuf, persist_to_disk: bool) -> Result<Self> {
        if persist_to_disk {
            fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;
        }

        let cache = Self {
            cache: DashMap::new(),
            cache_file: cache_dir.join("pair_addresses.json"),
            persist_to_disk,
        };

        if persist_to_disk {
            cache.load_from_disk()?;
        }

        Ok(cache)
    }

    /// Cached pair address for two tokens, in either order.
    pub fn get(&self, token_a: H160, token_b: H160) -> Option<H160> {
        self.cache.get(&canonical(token_a, token_b)).map(|e| *e)
    }

    pub fn insert(&self, token_a: H160, token_b: H160, pair: H160) -> Result<()> {
        self.cache.insert(canonical(token_a, token_b), pair);

        if self.persist_to_disk {
            self.save_to_disk()?;
        }

        Ok(())
    }

    pub fn contains(&self, token_a: H160, token_b: H160) -> bool {
        self.cache.contains_key(&canonical(token_a, token_b))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn load_from_disk(&self) -> Result<()> {
        if !self.cache_file.exists() {
            info!("No existing cache file found at {:?}", self.cache_file);
            return Ok(());
        }

        let data = fs::read_to_string(&self.cache_file).context("Failed to read cache file")?;

        let pairs: Vec<CachedPair> =
            serde_json::from_str(&data).context("Failed to parse cache file")?;

        for entry in pairs {
            self.cache
                .insert(canonical(entry.token0, entry.token1), entry.pair);
        }

        info!("Loaded {} pair addresses from disk cache", self.cache.len());
        Ok(())
    }

    fn save_to_disk(&self) -> Result<()> {
        let pairs: Vec<CachedPair> = self
            .cache
            .iter()
            .map(|entry| CachedPair {
                token0: entry.key().0,
                token1: entry.key().1,
                pair: *entry.value(),
            })
            .collect();

        let data = serde_json::to_string_pretty(&pairs).context("Failed to serialize cache")?;

        fs::write(&self.cache_file, data).context("Failed to write cache file")?;

        debug!("Saved {} pair addresses to disk cache", pairs.len());
        Ok(())
    }

    /// Force a snapshot to disk (for graceful shutdown)
    pub fn force_snapshot(&self) -> Result<()> {
        if self.persist_to_disk {
            self.save_to_disk()?;
        }
        Ok(())
    }
}
