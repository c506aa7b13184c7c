//! Integer helpers for 256-bit reserve math.
//!
//! Products of two U256 values are carried in U512 so no intermediate ever
//! truncates; division is the native truncating (round toward zero)
//! semantics, matching the on-chain contracts.

use ethereum_types::{U256, U512};

use crate::error::{PairError, Result};

/// floor((a * b) / denominator) with a full-width intermediate product.
pub(crate) fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(PairError::InsufficientReserves);
    }
    let product = a.full_mul(b);
    truncate(product / U512::from(denominator))
}

/// Narrow a U512 back to U256, failing rather than silently dropping bits.
pub(crate) fn truncate(value: U512) -> Result<U256> {
    if (value >> 256).is_zero() {
        let mut bytes = [0u8; 64];
        value.to_little_endian(&mut bytes);
        Ok(U256::from_little_endian(&bytes[..32]))
    } else {
        Err(PairError::Overflow)
    }
}

/// Largest x with x * x <= value (Babylonian method).
///
/// The square root of a 512-bit value always fits in 256 bits.
pub(crate) fn isqrt(value: U512) -> U256 {
    // For values up to 3 the iteration below cannot descend to the root
    // (the initial guess for 2 is already 2), so answer directly.
    if value <= U512::from(3u64) {
        return if value.is_zero() {
            U256::zero()
        } else {
            U256::one()
        };
    }
    let mut z = value;
    let mut y = (value >> 1) + U512::one();
    while y < z {
        z = y;
        y = (value / y + y) >> 1;
    }
    truncate(z).unwrap_or_default()
}
