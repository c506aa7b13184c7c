//! Configuration for the pair address resolver.

use std::path::PathBuf;

use ethereum_types::{H160, H256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairAddressConfig {
    /// Primary RPC endpoint
    pub primary_rpc: String,

    /// Fallback RPC endpoints
    pub fallback_rpcs: Vec<String>,

    /// Chain ID this resolver serves
    pub chain_id: u64,

    /// Factory contract that deploys pair contracts
    pub factory_address: H160,

    /// keccak256 of the pair creation bytecode
    pub init_code_hash: H256,

    /// Cache directory path
    pub cache_dir: PathBuf,

    /// Maximum retries for failed RPC calls
    pub max_retries: u32,

    /// Rate limit (requests per second)
    pub rate_limit_per_sec: u32,

    /// Enable persistent disk cache
    pub enable_disk_cache: bool,

    /// Chains with trustworthy CREATE2 derivation skip background
    /// resolution entirely; the computed address is final.
    pub deterministic: bool,
}

impl Default for PairAddressConfig {
    fn default() -> Self {
        Self {
            primary_rpc: "https://eth.llamarpc.com".to_string(),
            fallback_rpcs: vec!["https://rpc.ankr.com/eth".to_string()],
            chain_id: 1,
            factory_address: pair::FACTORY_ADDRESS,
            init_code_hash: pair::INIT_CODE_HASH,
            cache_dir: PathBuf::from("./data/pair_cache"),
            max_retries: 3,
            rate_limit_per_sec: 10,
            enable_disk_cache: true,
            deterministic: true,
        }
    }
}
