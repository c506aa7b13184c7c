//! Token identity: chain id plus canonical 20-byte contract address.
//!
//! Two tokens are the same token iff chain id and address match; decimals,
//! symbol and name are metadata and never participate in equality or
//! ordering. The byte-wise address ordering defined here is what fixes a
//! pair's canonical `(token0, token1)` orientation.

use std::hash::{Hash, Hasher};

use ethereum_types::H160;

use crate::error::{PairError, Result};

#[derive(Debug, Clone)]
pub struct Token {
    chain_id: u64,
    address: H160,
    decimals: u8,
    symbol: Option<String>,
    name: Option<String>,
}

impl Token {
    pub fn new(chain_id: u64, address: H160, decimals: u8) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: None,
            name: None,
        }
    }

    /// Attach display metadata. Metadata has no effect on identity.
    pub fn with_metadata(mut self, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self.name = Some(name.into());
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn address(&self) -> H160 {
        self.address
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Total order used to canonicalize pair orientation.
    ///
    /// Errors on cross-chain comparison and on comparing a token with
    /// itself; both indicate a caller bug, not an orderable state.
    pub fn sorts_before(&self, other: &Token) -> Result<bool> {
        if self.chain_id != other.chain_id {
            return Err(PairError::ChainMismatch(self.chain_id, other.chain_id));
        }
        if self.address == other.address {
            return Err(PairError::IdenticalAddresses);
        }
        Ok(self.address < other.address)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> H160 {
        H160([byte; 20])
    }

    #[test]
    fn equality_ignores_metadata() {
        let a = Token::new(1, addr(0x11), 18).with_metadata("WETH", "Wrapped Ether");
        let b = Token::new(1, addr(0x11), 6);
        assert_eq!(a, b);
    }

    #[test]
    fn equality_requires_same_chain() {
        let a = Token::new(1, addr(0x11), 18);
        let b = Token::new(137, addr(0x11), 18);
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_bytewise_on_addresses() {
        let low = Token::new(1, addr(0x01), 18);
        let high = Token::new(1, addr(0xff), 18);
        assert!(low.sorts_before(&high).unwrap());
        assert!(!high.sorts_before(&low).unwrap());
    }

    #[test]
    fn ordering_rejects_cross_chain() {
        let a = Token::new(1, addr(0x01), 18);
        let b = Token::new(137, addr(0x02), 18);
        assert_eq!(
            a.sorts_before(&b).unwrap_err(),
            PairError::ChainMismatch(1, 137)
        );
    }

    #[test]
    fn ordering_rejects_self() {
        let a = Token::new(1, addr(0x01), 18);
        let b = Token::new(1, addr(0x01), 6);
        assert_eq!(a.sorts_before(&b).unwrap_err(), PairError::IdenticalAddresses);
    }
}
