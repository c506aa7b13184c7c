//! Pair Address Adapter
//!
//! Resolves authoritative pair-contract addresses for the core pair
//! engine. All RPC communication with the factory contract lives behind
//! this adapter, maintaining the boundary that only adapters talk to
//! external systems.
//!
//! Features:
//! - Implements the core `AddressBook` seam consumed by pair construction
//! - Permanent caching with JSON disk persistence
//! - Background resolution with retry and backoff; pairs keep a
//!   provisional CREATE2 address until the authoritative one lands
//! - Bulk pair enumeration for cache warm-up

pub mod cache;
pub mod config;
pub mod factory_client;
pub mod resolver;

pub use cache::{CachedPair, PairAddressCache};
pub use config::PairAddressConfig;
pub use factory_client::{FactoryClient, PairListing, Web3FactoryClient};
pub use resolver::{PairAddressResolver, ResolverMetrics};
