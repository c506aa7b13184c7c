//! Exact rational spot prices.
//!
//! A price is a ratio of raw reserve integers and is never evaluated to a
//! float. Comparisons cross-multiply in 512-bit width, so two prices are
//! equal exactly when their rationals are equal, independent of reduction.

use ethereum_types::U256;

use crate::error::{PairError, Result};
use crate::math::truncate;
use crate::token::Token;

/// Price of `base` denominated in `quote`: `numerator / denominator` units
/// of quote per unit of base (in raw token units).
#[derive(Debug, Clone)]
pub struct Price {
    base: Token,
    quote: Token,
    numerator: U256,
    denominator: U256,
}

impl Price {
    pub fn new(base: Token, quote: Token, numerator: U256, denominator: U256) -> Self {
        Self {
            base,
            quote,
            numerator,
            denominator,
        }
    }

    pub fn base(&self) -> &Token {
        &self.base
    }

    pub fn quote(&self) -> &Token {
        &self.quote
    }

    pub fn numerator(&self) -> U256 {
        self.numerator
    }

    pub fn denominator(&self) -> U256 {
        self.denominator
    }

    pub fn invert(&self) -> Price {
        Price::new(
            self.quote.clone(),
            self.base.clone(),
            self.denominator,
            self.numerator,
        )
    }

    /// Compose two prices: `A/B * B/C = A/C`. The quote of `self` must be
    /// the base of `other`.
    pub fn checked_mul(&self, other: &Price) -> Result<Price> {
        if self.quote != other.base {
            return Err(PairError::TokenMismatch);
        }
        let numerator = truncate(self.numerator.full_mul(other.numerator))?;
        let denominator = truncate(self.denominator.full_mul(other.denominator))?;
        Ok(Price::new(
            self.base.clone(),
            other.quote.clone(),
            numerator,
            denominator,
        ))
    }

    /// True when the rational reduces to exactly one.
    pub fn is_unity(&self) -> bool {
        !self.numerator.is_zero() && self.numerator == self.denominator
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.quote == other.quote
            && self.numerator.full_mul(other.denominator)
                == other.numerator.full_mul(self.denominator)
    }
}

impl Eq for Price {}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H160;

    fn token(byte: u8) -> Token {
        Token::new(1, H160([byte; 20]), 18)
    }

    #[test]
    fn equality_is_cross_multiplied() {
        let a = Price::new(token(1), token(2), U256::from(2u64), U256::from(4u64));
        let b = Price::new(token(1), token(2), U256::from(3u64), U256::from(6u64));
        assert_eq!(a, b);
        let c = Price::new(token(1), token(2), U256::from(3u64), U256::from(5u64));
        assert_ne!(a, c);
    }

    #[test]
    fn composed_reciprocals_are_unity() {
        let forward = Price::new(token(1), token(2), U256::from(1234u64), U256::from(77u64));
        let product = forward.checked_mul(&forward.invert()).unwrap();
        assert!(product.is_unity());
    }

    #[test]
    fn mul_requires_matching_legs() {
        let a = Price::new(token(1), token(2), U256::one(), U256::one());
        let b = Price::new(token(3), token(4), U256::one(), U256::one());
        assert_eq!(a.checked_mul(&b).unwrap_err(), PairError::TokenMismatch);
    }
}
