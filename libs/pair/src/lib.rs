//! # Pair - Constant-Product Pair Engine
//!
//! ## Purpose
//!
//! Exact arithmetic and address derivation for constant-product (Uniswap V2
//! style) trading pairs. Every computation is bit-exact with the on-chain
//! reference contracts: 256-bit reserves with 512-bit intermediates, fee
//! 997/1000, truncating division in the contract's operation order, and
//! byte-level CREATE2 address derivation per EIP-1014.
//!
//! ## Integration Points
//!
//! - **Input Sources**: already-validated token identities and reserve
//!   snapshots fetched by collaborators (event collectors, RPC adapters)
//! - **Output Destinations**: routers, quoting services, liquidity
//!   accounting
//! - **Address Resolution**: the [`address::AddressBook`] seam lets an
//!   external resolver supply authoritative pair addresses on chains where
//!   CREATE2 derivation is not trusted; see the `pair-address-adapter`
//!   service for the implementation
//!
//! ## Architecture Role
//!
//! This crate is a pure value-transformation layer. Pairs are immutable
//! snapshots: swap quotes return a new snapshot instead of mutating, so
//! concurrent readers never need locking. The only shared mutable state is
//! the liquidity-token address handle, updated in one place by a resolver
//! and observed by every snapshot.

pub mod address;
pub mod amount;
pub mod error;
mod math;
pub mod pair;
pub mod price;
pub mod token;

pub use address::{
    compute_pair_address, create2_address, keccak256, pack_addresses, AddressBook, AddressState,
    Deployment, PairLiquidityAddress, FACTORY_ADDRESS, INIT_CODE_HASH,
};
pub use amount::TokenAmount;
pub use error::{PairError, Result};
pub use pair::{Pair, FEE_DENOMINATOR, FEE_NUMERATOR, MINIMUM_LIQUIDITY};
pub use price::Price;
pub use token::Token;

/// Re-exported numeric types used throughout the public API.
pub use ethereum_types::{H160, H256, U256};
