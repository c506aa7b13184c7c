//! Exact token quantities.
//!
//! A `TokenAmount` is a non-negative U256 tagged with the token it
//! denominates. Arithmetic is only defined between amounts of the same
//! token and always goes through checked operations; every operation
//! returns a new value.

use std::cmp::Ordering;

use ethereum_types::U256;

use crate::error::{PairError, Result};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    token: Token,
    raw: U256,
}

impl TokenAmount {
    pub fn new(token: Token, raw: impl Into<U256>) -> Self {
        Self {
            token,
            raw: raw.into(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn checked_add(&self, other: &TokenAmount) -> Result<TokenAmount> {
        self.require_same_token(other)?;
        let raw = self
            .raw
            .checked_add(other.raw)
            .ok_or(PairError::Overflow)?;
        Ok(TokenAmount::new(self.token.clone(), raw))
    }

    pub fn checked_sub(&self, other: &TokenAmount) -> Result<TokenAmount> {
        self.require_same_token(other)?;
        let raw = self
            .raw
            .checked_sub(other.raw)
            .ok_or(PairError::Underflow)?;
        Ok(TokenAmount::new(self.token.clone(), raw))
    }

    pub fn checked_cmp(&self, other: &TokenAmount) -> Result<Ordering> {
        self.require_same_token(other)?;
        Ok(self.raw.cmp(&other.raw))
    }

    fn require_same_token(&self, other: &TokenAmount) -> Result<()> {
        if self.token != other.token {
            return Err(PairError::TokenMismatch);
        }
        Ok(())
    }
}
