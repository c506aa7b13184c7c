//! Deterministic pair-address derivation and the resolution seam.
//!
//! The factory deploys every pair contract with CREATE2, so a pair's
//! address is a pure function of the two token addresses, the factory
//! address and the init code hash (EIP-1014). Chains where the factory
//! predates deterministic deployment go through an [`AddressBook`]
//! implementation instead, which may hand back a provisional computed
//! address until the authoritative one has been fetched.

use std::sync::Arc;

use ethereum_types::{H160, H256};
use parking_lot::RwLock;
use sha3::{Digest, Keccak256};

use crate::error::Result;
use crate::token::Token;

/// Factory contract this deployment derives pair addresses against.
pub const FACTORY_ADDRESS: H160 = H160([
    0x5c, 0x69, 0xbe, 0xe7, 0x01, 0xef, 0x81, 0x4a, 0x2b, 0x6a, 0x3e, 0xdd, 0x4b, 0x16, 0x52,
    0xcb, 0x9c, 0xc8, 0xaa, 0x6f,
]);

/// keccak256 of the pair contract creation bytecode.
///
/// Fixed at factory deployment; changing it would move every derived
/// address.
pub const INIT_CODE_HASH: H256 = H256([
    0x96, 0xe8, 0xac, 0x42, 0x77, 0x19, 0x8f, 0xf8, 0xb6, 0xf7, 0x85, 0x47, 0x8a, 0xa9, 0xa3,
    0x9f, 0x40, 0x3c, 0xb7, 0x68, 0xdd, 0x02, 0xcb, 0xe5, 0x04, 0x18, 0xf0, 0xd9, 0xd7, 0xc0,
    0xe4, 0xdf,
]);

/// A factory deployment: the inputs CREATE2 derivation is parameterized
/// over. Defaults to the crate's mainnet constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub factory: H160,
    pub init_code_hash: H256,
}

impl Default for Deployment {
    fn default() -> Self {
        Self {
            factory: FACTORY_ADDRESS,
            init_code_hash: INIT_CODE_HASH,
        }
    }
}

pub fn keccak256(bytes: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    H256::from_slice(&hasher.finalize())
}

/// Fixed-width packing of two 20-byte addresses, as Solidity's
/// `abi.encodePacked(address, address)`.
pub fn pack_addresses(a: H160, b: H160) -> [u8; 40] {
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(a.as_bytes());
    packed[20..].copy_from_slice(b.as_bytes());
    packed
}

/// EIP-1014: `keccak256(0xff ++ deployer ++ salt ++ init_code_hash)[12..]`.
pub fn create2_address(deployer: H160, salt: H256, init_code_hash: H256) -> H160 {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(deployer.as_bytes());
    preimage[21..53].copy_from_slice(salt.as_bytes());
    preimage[53..85].copy_from_slice(init_code_hash.as_bytes());
    H160::from_slice(&keccak256(&preimage).as_bytes()[12..])
}

/// Deterministic pair address for two tokens under a given factory.
///
/// Canonicalizes token order first, so argument order never changes the
/// result. Errors propagate from the token ordering (chain mismatch,
/// identical addresses).
pub fn compute_pair_address(
    factory: H160,
    init_code_hash: H256,
    token_a: &Token,
    token_b: &Token,
) -> Result<H160> {
    let (token0, token1) = if token_a.sorts_before(token_b)? {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };
    let salt = keccak256(&pack_addresses(token0.address(), token1.address()));
    Ok(create2_address(factory, salt, init_code_hash))
}

/// Resolution state of a pair's liquidity-token address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressState {
    /// Deterministically computed, not yet confirmed by the factory.
    Provisional(H160),
    /// Authoritative address.
    Resolved(H160),
}

impl AddressState {
    pub fn address(&self) -> H160 {
        match *self {
            AddressState::Provisional(addr) | AddressState::Resolved(addr) => addr,
        }
    }
}

/// Shared handle to a pair's liquidity-token address.
///
/// Every snapshot of a pair clones the same handle, so a later resolution
/// is observed by all holders at once. Writes are serialized by the inner
/// lock; the last resolution wins, which is sufficient because a token
/// pair's on-chain address never changes once known.
#[derive(Debug, Clone)]
pub struct PairLiquidityAddress {
    state: Arc<RwLock<AddressState>>,
}

impl PairLiquidityAddress {
    pub fn provisional(address: H160) -> Self {
        Self {
            state: Arc::new(RwLock::new(AddressState::Provisional(address))),
        }
    }

    pub fn resolved(address: H160) -> Self {
        Self {
            state: Arc::new(RwLock::new(AddressState::Resolved(address))),
        }
    }

    pub fn current(&self) -> H160 {
        self.state.read().address()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.read(), AddressState::Resolved(_))
    }

    /// Record the authoritative address. Observed by every clone.
    pub fn resolve(&self, address: H160) {
        *self.state.write() = AddressState::Resolved(address);
    }
}

/// Address-resolution collaborator consumed by pair construction.
///
/// Implementations own the persistent cache and whatever background
/// machinery confirms addresses against the chain; the core only asks two
/// things of them. Keys are always the canonical `(token0, token1)`
/// ordering.
pub trait AddressBook: Send + Sync {
    /// A previously resolved pair address, if any.
    fn lookup(&self, chain_id: u64, token0: H160, token1: H160) -> Option<H160>;

    /// Hand over a live handle so a later resolution can patch it.
    fn register(&self, chain_id: u64, token0: H160, token1: H160, handle: PairLiquidityAddress);

    /// Factory deployment this book resolves against. Provisional CREATE2
    /// derivation uses these constants, so the computed address agrees
    /// with what the book will eventually confirm.
    fn deployment(&self) -> Deployment {
        Deployment::default()
    }
}
