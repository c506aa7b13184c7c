//! Factory contract client.
//!
//! All communication with blockchain nodes lives here: resolving a single
//! pair address via the factory's `getPair`, and enumerating every
//! deployed pair for bulk cache warm-up. Endpoint failover across the
//! configured RPC urls.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethereum_types::{H160, U256};
use tracing::{debug, warn};
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::Address;
use web3::Web3;

use crate::config::PairAddressConfig;

/// Factory ABI for getPair(), allPairsLength() and allPairs()
const FACTORY_ABI: &str = r#"[
    {"constant":true,"inputs":[{"name":"","type":"address"},{"name":"","type":"address"}],"name":"getPair","outputs":[{"name":"","type":"address"}],"type":"function"},
    {"constant":true,"inputs":[],"name":"allPairsLength","outputs":[{"name":"","type":"uint256"}],"type":"function"},
    {"constant":true,"inputs":[{"name":"","type":"uint256"}],"name":"allPairs","outputs":[{"name":"","type":"address"}],"type":"function"}
]"#;

/// Pair ABI for token0() and token1()
const PAIR_ABI: &str = r#"[
    {"constant":true,"inputs":[],"name":"token0","outputs":[{"name":"","type":"address"}],"type":"function"},
    {"constant":true,"inputs":[],"name":"token1","outputs":[{"name":"","type":"address"}],"type":"function"}
]"#;

/// One pair as listed by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairListing {
    pub token0: H160,
    pub token1: H160,
    pub pair: H160,
}

/// Chain-side collaborator that answers pair-address queries.
#[async_trait]
pub trait FactoryClient: Send + Sync {
    /// The factory's registered address for a token pair, `None` if the
    /// pair has not been deployed.
    async fn pair_for(&self, token0: H160, token1: H160) -> Result<Option<H160>>;

    /// Every pair the factory has deployed.
    async fn all_pairs(&self) -> Result<Vec<PairListing>>;
}

pub struct Web3FactoryClient {
    factory: H160,
    web3_clients: Vec<Web3<Http>>,
}

impl Web3FactoryClient {
    /// Create a client with the configured endpoints.
    pub fn new(config: &PairAddressConfig) -> Result<Self> {
        let mut web3_clients = Vec::new();

        let transport = Http::new(&config.primary_rpc)?;
        web3_clients.push(Web3::new(transport));

        for rpc_url in &config.fallback_rpcs {
            if let Ok(transport) = Http::new(rpc_url) {
                web3_clients.push(Web3::new(transport));
            }
        }

        if web3_clients.is_empty() {
            return Err(anyhow!("No valid RPC endpoints configured"));
        }

        Ok(Self {
            factory: config.factory_address,
            web3_clients,
        })
    }

    fn factory_contract(&self, web3: &Web3<Http>) -> Result<Contract<Http>> {
        Contract::from_json(web3.eth(), self.factory, FACTORY_ABI.as_bytes())
            .context("Invalid factory ABI")
    }

    async fn pair_for_with_client(
        &self,
        web3: &Web3<Http>,
        token0: H160,
        token1: H160,
    ) -> Result<Option<H160>> {
        let contract = self.factory_contract(web3)?;
        let pair: Address = contract
            .query("getPair", (token0, token1), None, Options::default(), None)
            .await
            .context("Failed to query getPair")?;

        if pair.is_zero() {
            Ok(None)
        } else {
            Ok(Some(pair))
        }
    }

    async fn all_pairs_with_client(&self, web3: &Web3<Http>) -> Result<Vec<PairListing>> {
        let contract = self.factory_contract(web3)?;
        let length: U256 = contract
            .query("allPairsLength", (), None, Options::default(), None)
            .await
            .context("Failed to query allPairsLength")?;

        let mut listings = Vec::new();
        let mut index = U256::zero();
        while index < length {
            let pair: Address = contract
                .query("allPairs", (index,), None, Options::default(), None)
                .await
                .context("Failed to query allPairs")?;

            let pair_contract = Contract::from_json(web3.eth(), pair, PAIR_ABI.as_bytes())
                .context("Invalid pair ABI")?;
            let token0: Address = pair_contract
                .query("token0", (), None, Options::default(), None)
                .await
                .context("Failed to query token0")?;
            let token1: Address = pair_contract
                .query("token1", (), None, Options::default(), None)
                .await
                .context("Failed to query token1")?;

            listings.push(PairListing {
                token0,
                token1,
                pair,
            });
            index += U256::one();
        }

        debug!("Enumerated {} pairs from factory", listings.len());
        Ok(listings)
    }
}

#[async_trait]
impl FactoryClient for Web3FactoryClient {
    async fn pair_for(&self, token0: H160, token1: H160) -> Result<Option<H160>> {
        for (idx, web3) in self.web3_clients.iter().enumerate() {
            match self.pair_for_with_client(web3, token0, token1).await {
                Ok(pair) => {
                    debug!("Resolved pair via RPC endpoint {}", idx);
                    return Ok(pair);
                }
                Err(e) => {
                    warn!("RPC endpoint {} failed: {}", idx, e);
                }
            }
        }
        Err(anyhow!("All RPC endpoints failed for pair resolution"))
    }

    async fn all_pairs(&self) -> Result<Vec<PairListing>> {
        for (idx, web3) in self.web3_clients.iter().enumerate() {
            match self.all_pairs_with_client(web3).await {
                Ok(listings) => return Ok(listings),
                Err(e) => {
                    warn!("RPC endpoint {} failed during enumeration: {}", idx, e);
                }
            }
        }
        Err(anyhow!("All RPC endpoints failed for pair enumeration"))
    }
}
