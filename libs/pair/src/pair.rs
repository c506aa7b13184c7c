//! The constant-product trading pair.
//!
//! A `Pair` is an immutable snapshot of two canonically-ordered reserves.
//! Swap quotes never mutate the pair; they return the quoted amount plus a
//! new snapshot reflecting the post-trade reserves. Every snapshot of the
//! same pair shares one liquidity-token address handle, so an address
//! resolution landing later is observed by all of them.
//!
//! All formulas are bit-exact with the on-chain reference contracts:
//! full-width intermediate products, truncating division, fee 997/1000.

use ethereum_types::{U256, U512};
use tracing::debug;

use crate::address::{
    compute_pair_address, AddressBook, PairLiquidityAddress, FACTORY_ADDRESS, INIT_CODE_HASH,
};
use crate::amount::TokenAmount;
use crate::error::{PairError, Result};
use crate::math::{isqrt, mul_div, truncate};
use crate::price::Price;
use crate::token::Token;

/// Swap fee applied to every trade: input counts at 997/1000.
pub const FEE_NUMERATOR: U256 = U256([997, 0, 0, 0]);
pub const FEE_DENOMINATOR: U256 = U256([1000, 0, 0, 0]);

/// Liquidity permanently locked at pool genesis.
pub const MINIMUM_LIQUIDITY: U256 = U256([1000, 0, 0, 0]);

/// Protocol fee denominator share: 1/6 of growth via `rootK * 5 + rootKLast`.
const PROTOCOL_FEE_SHARE: U256 = U256([5, 0, 0, 0]);

const LIQUIDITY_TOKEN_DECIMALS: u8 = 18;
const LIQUIDITY_TOKEN_SYMBOL: &str = "UNI-V2";
const LIQUIDITY_TOKEN_NAME: &str = "Uniswap V2";

#[derive(Debug, Clone)]
pub struct Pair {
    // Invariant: reserves[0].token sorts before reserves[1].token.
    reserves: [TokenAmount; 2],
    liquidity_address: PairLiquidityAddress,
}

impl Pair {
    /// Build a pair from two reserves in either order.
    ///
    /// The liquidity-token address is derived deterministically (CREATE2)
    /// and starts out resolved.
    pub fn new(amount_a: TokenAmount, amount_b: TokenAmount) -> Result<Pair> {
        let (reserve0, reserve1) = Self::sort_amounts(amount_a, amount_b)?;
        let address =
            compute_pair_address(FACTORY_ADDRESS, INIT_CODE_HASH, reserve0.token(), reserve1.token())?;
        Ok(Pair {
            reserves: [reserve0, reserve1],
            liquidity_address: PairLiquidityAddress::resolved(address),
        })
    }

    /// Build a pair consulting an address book.
    ///
    /// A cached resolution wins; otherwise CREATE2 derivation against the
    /// book's deployment constants supplies a provisional address and the
    /// pair's handle is registered so the book's resolver can patch it
    /// once the authoritative address is known.
    pub fn with_address_book(
        amount_a: TokenAmount,
        amount_b: TokenAmount,
        book: &dyn AddressBook,
    ) -> Result<Pair> {
        let (reserve0, reserve1) = Self::sort_amounts(amount_a, amount_b)?;
        let chain_id = reserve0.token().chain_id();
        let token0 = reserve0.token().address();
        let token1 = reserve1.token().address();

        let liquidity_address = match book.lookup(chain_id, token0, token1) {
            Some(resolved) => PairLiquidityAddress::resolved(resolved),
            None => {
                let deployment = book.deployment();
                let computed = compute_pair_address(
                    deployment.factory,
                    deployment.init_code_hash,
                    reserve0.token(),
                    reserve1.token(),
                )?;
                debug!(
                    chain_id,
                    ?token0,
                    ?token1,
                    address = ?computed,
                    "no cached pair address, using provisional CREATE2 result"
                );
                PairLiquidityAddress::provisional(computed)
            }
        };
        book.register(chain_id, token0, token1, liquidity_address.clone());

        Ok(Pair {
            reserves: [reserve0, reserve1],
            liquidity_address,
        })
    }

    fn sort_amounts(a: TokenAmount, b: TokenAmount) -> Result<(TokenAmount, TokenAmount)> {
        if a.token().sorts_before(b.token())? {
            Ok((a, b))
        } else {
            Ok((b, a))
        }
    }

    /// New snapshot with updated reserves, sharing this pair's address
    /// handle.
    fn with_reserves(&self, a: TokenAmount, b: TokenAmount) -> Pair {
        let (reserve0, reserve1) = if a.token() == self.token0() { (a, b) } else { (b, a) };
        Pair {
            reserves: [reserve0, reserve1],
            liquidity_address: self.liquidity_address.clone(),
        }
    }

    pub fn token0(&self) -> &Token {
        self.reserves[0].token()
    }

    pub fn token1(&self) -> &Token {
        self.reserves[1].token()
    }

    pub fn reserve0(&self) -> &TokenAmount {
        &self.reserves[0]
    }

    pub fn reserve1(&self) -> &TokenAmount {
        &self.reserves[1]
    }

    pub fn chain_id(&self) -> u64 {
        self.token0().chain_id()
    }

    /// Shared handle to the liquidity-token address, including its
    /// provisional/resolved state.
    pub fn liquidity_address(&self) -> &PairLiquidityAddress {
        &self.liquidity_address
    }

    /// The pair's liquidity token at the handle's current address.
    pub fn liquidity_token(&self) -> Token {
        Token::new(
            self.chain_id(),
            self.liquidity_address.current(),
            LIQUIDITY_TOKEN_DECIMALS,
        )
        .with_metadata(LIQUIDITY_TOKEN_SYMBOL, LIQUIDITY_TOKEN_NAME)
    }

    pub fn involves(&self, token: &Token) -> bool {
        token == self.token0() || token == self.token1()
    }

    pub fn reserve_of(&self, token: &Token) -> Result<&TokenAmount> {
        if token == self.token0() {
            Ok(&self.reserves[0])
        } else if token == self.token1() {
            Ok(&self.reserves[1])
        } else {
            Err(PairError::TokenNotInPair)
        }
    }

    fn other_token(&self, token: &Token) -> Result<&Token> {
        if token == self.token0() {
            Ok(self.token1())
        } else if token == self.token1() {
            Ok(self.token0())
        } else {
            Err(PairError::TokenNotInPair)
        }
    }

    /// Spot price of token0 in units of token1: `reserve1 / reserve0`.
    pub fn token0_price(&self) -> Price {
        Price::new(
            self.token0().clone(),
            self.token1().clone(),
            self.reserves[1].raw(),
            self.reserves[0].raw(),
        )
    }

    /// Spot price of token1 in units of token0: `reserve0 / reserve1`.
    pub fn token1_price(&self) -> Price {
        Price::new(
            self.token1().clone(),
            self.token0().clone(),
            self.reserves[0].raw(),
            self.reserves[1].raw(),
        )
    }

    pub fn price_of(&self, token: &Token) -> Result<Price> {
        if token == self.token0() {
            Ok(self.token0_price())
        } else if token == self.token1() {
            Ok(self.token1_price())
        } else {
            Err(PairError::TokenNotInPair)
        }
    }

    /// Quote the output for an exact input.
    ///
    /// `out = floor(in * 997 * reserve_out / (reserve_in * 1000 + in * 997))`.
    /// Returns the output amount and the post-trade snapshot.
    pub fn output_amount(&self, input: &TokenAmount) -> Result<(TokenAmount, Pair)> {
        if !self.involves(input.token()) {
            return Err(PairError::TokenNotInPair);
        }
        if self.reserves[0].is_zero() || self.reserves[1].is_zero() {
            return Err(PairError::InsufficientReserves);
        }

        let input_reserve = self.reserve_of(input.token())?;
        let output_token = self.other_token(input.token())?.clone();
        let output_reserve = self.reserve_of(&output_token)?;

        let amount_in_with_fee: U512 = input.raw().full_mul(FEE_NUMERATOR);
        let numerator = amount_in_with_fee
            .checked_mul(U512::from(output_reserve.raw()))
            .ok_or(PairError::Overflow)?;
        let denominator = input_reserve
            .raw()
            .full_mul(FEE_DENOMINATOR)
            .checked_add(amount_in_with_fee)
            .ok_or(PairError::Overflow)?;

        // Quotient is strictly below reserve_out, so it always fits U256.
        let output = TokenAmount::new(output_token, truncate(numerator / denominator)?);
        if output.is_zero() {
            return Err(PairError::InsufficientInputAmount);
        }

        let next_input_side = input_reserve.checked_add(input)?;
        let next_output_side = output_reserve.checked_sub(&output)?;
        let snapshot = self.with_reserves(next_input_side, next_output_side);
        Ok((output, snapshot))
    }

    /// Quote the input required for an exact output.
    ///
    /// `in = floor(reserve_in * out * 1000 / ((reserve_out - out) * 997)) + 1`.
    /// The round-up guarantees the pool stays solvent after the trade.
    pub fn input_amount(&self, output: &TokenAmount) -> Result<(TokenAmount, Pair)> {
        if !self.involves(output.token()) {
            return Err(PairError::TokenNotInPair);
        }
        let output_reserve = self.reserve_of(output.token())?;
        if self.reserves[0].is_zero()
            || self.reserves[1].is_zero()
            || output.raw() >= output_reserve.raw()
        {
            return Err(PairError::InsufficientReserves);
        }

        let input_token = self.other_token(output.token())?.clone();
        let input_reserve = self.reserve_of(&input_token)?;

        let numerator = input_reserve
            .raw()
            .full_mul(output.raw())
            .checked_mul(U512::from(FEE_DENOMINATOR))
            .ok_or(PairError::Overflow)?;
        let denominator = (output_reserve.raw() - output.raw()).full_mul(FEE_NUMERATOR);

        let input_raw = truncate(numerator / denominator)?
            .checked_add(U256::one())
            .ok_or(PairError::Overflow)?;
        let input = TokenAmount::new(input_token, input_raw);

        let next_input_side = input_reserve.checked_add(&input)?;
        let next_output_side = output_reserve.checked_sub(output)?;
        let snapshot = self.with_reserves(next_input_side, next_output_side);
        Ok((input, snapshot))
    }

    /// Liquidity tokens minted for a deposit of both reserve tokens.
    ///
    /// Genesis mints `isqrt(amount0 * amount1) - MINIMUM_LIQUIDITY`; later
    /// deposits mint proportionally to the smaller side.
    pub fn liquidity_minted(
        &self,
        total_supply: &TokenAmount,
        amount_a: &TokenAmount,
        amount_b: &TokenAmount,
    ) -> Result<TokenAmount> {
        let liquidity_token = self.liquidity_token();
        if total_supply.token() != &liquidity_token {
            return Err(PairError::TokenMismatch);
        }
        let (amount0, amount1) = if amount_a.token().sorts_before(amount_b.token())? {
            (amount_a, amount_b)
        } else {
            (amount_b, amount_a)
        };
        if amount0.token() != self.token0() || amount1.token() != self.token1() {
            return Err(PairError::TokenMismatch);
        }

        let liquidity = if total_supply.is_zero() {
            let root = isqrt(amount0.raw().full_mul(amount1.raw()));
            root.checked_sub(MINIMUM_LIQUIDITY)
                .ok_or(PairError::InsufficientInputAmount)?
        } else {
            let share0 = mul_div(amount0.raw(), total_supply.raw(), self.reserves[0].raw())?;
            let share1 = mul_div(amount1.raw(), total_supply.raw(), self.reserves[1].raw())?;
            share0.min(share1)
        };

        if liquidity.is_zero() {
            return Err(PairError::InsufficientInputAmount);
        }
        Ok(TokenAmount::new(liquidity_token, liquidity))
    }

    /// Value of a liquidity position in one of the reserve tokens.
    ///
    /// With `fee_on`, the effective total supply is first diluted by the
    /// pending protocol fee computed from reserve-product growth since the
    /// `k_last` checkpoint.
    pub fn liquidity_value(
        &self,
        token: &Token,
        total_supply: &TokenAmount,
        liquidity: &TokenAmount,
        fee_on: bool,
        k_last: Option<U256>,
    ) -> Result<TokenAmount> {
        if !self.involves(token) {
            return Err(PairError::TokenNotInPair);
        }
        let liquidity_token = self.liquidity_token();
        if total_supply.token() != &liquidity_token || liquidity.token() != &liquidity_token {
            return Err(PairError::TokenMismatch);
        }
        if liquidity.raw() > total_supply.raw() {
            return Err(PairError::InsufficientReserves);
        }

        let total_supply_adjusted = if fee_on {
            let k_last = k_last.ok_or(PairError::MissingKLast)?;
            self.fee_adjusted_supply(total_supply.raw(), k_last)?
        } else {
            total_supply.raw()
        };

        let value = mul_div(
            liquidity.raw(),
            self.reserve_of(token)?.raw(),
            total_supply_adjusted,
        )?;
        Ok(TokenAmount::new(token.clone(), value))
    }

    fn fee_adjusted_supply(&self, total_supply: U256, k_last: U256) -> Result<U256> {
        if k_last.is_zero() {
            return Ok(total_supply);
        }
        let root_k = isqrt(self.reserves[0].raw().full_mul(self.reserves[1].raw()));
        let root_k_last = isqrt(U512::from(k_last));
        if root_k <= root_k_last {
            return Ok(total_supply);
        }
        let numerator = total_supply.full_mul(root_k - root_k_last);
        let denominator = root_k
            .full_mul(PROTOCOL_FEE_SHARE)
            .checked_add(U512::from(root_k_last))
            .ok_or(PairError::Overflow)?;
        let fee_liquidity = truncate(numerator / denominator)?;
        total_supply
            .checked_add(fee_liquidity)
            .ok_or(PairError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H160;

    fn token_a() -> Token {
        Token::new(1, H160([0x11; 20]), 18).with_metadata("TKA", "Token A")
    }

    fn token_b() -> Token {
        Token::new(1, H160([0x22; 20]), 18).with_metadata("TKB", "Token B")
    }

    fn pair(reserve_a: u64, reserve_b: u64) -> Pair {
        Pair::new(
            TokenAmount::new(token_a(), reserve_a),
            TokenAmount::new(token_b(), reserve_b),
        )
        .unwrap()
    }

    #[test]
    fn constructor_canonicalizes_order() {
        let forward = pair(100, 200);
        let backward = Pair::new(
            TokenAmount::new(token_b(), 200u64),
            TokenAmount::new(token_a(), 100u64),
        )
        .unwrap();

        assert_eq!(forward.token0(), backward.token0());
        assert_eq!(forward.token1(), backward.token1());
        assert_eq!(
            forward.liquidity_address().current(),
            backward.liquidity_address().current()
        );
        assert_eq!(forward.reserve0().raw(), backward.reserve0().raw());
    }

    #[test]
    fn constructor_rejects_cross_chain_amounts() {
        let foreign = Token::new(137, H160([0x22; 20]), 18);
        let err = Pair::new(
            TokenAmount::new(token_a(), 1u64),
            TokenAmount::new(foreign, 1u64),
        )
        .unwrap_err();
        assert_eq!(err, PairError::ChainMismatch(1, 137));
    }

    #[test]
    fn reserve_of_and_price_of_reject_foreign_token() {
        let p = pair(100, 200);
        let foreign = Token::new(1, H160([0x33; 20]), 18);
        assert_eq!(p.reserve_of(&foreign).unwrap_err(), PairError::TokenNotInPair);
        assert_eq!(p.price_of(&foreign).unwrap_err(), PairError::TokenNotInPair);
    }

    #[test]
    fn spot_prices_are_reserve_ratios() {
        let p = pair(100, 200);
        let price0 = p.price_of(p.token0()).unwrap();
        let (r0, r1) = (p.reserve0().raw(), p.reserve1().raw());
        assert_eq!(price0.numerator(), r1);
        assert_eq!(price0.denominator(), r0);
        assert_eq!(price0.invert(), p.token1_price());
    }

    #[test]
    fn output_amount_matches_reference_example() {
        // reserves 1000/1000, input 100:
        // floor(100*997*1000 / (1000*1000 + 100*997)) = 90
        let p = pair(1000, 1000);
        let (out, next) = p
            .output_amount(&TokenAmount::new(token_a(), 100u64))
            .unwrap();
        assert_eq!(out.raw(), U256::from(90u64));
        assert_eq!(out.token(), &token_b());

        assert_eq!(next.reserve_of(&token_a()).unwrap().raw(), U256::from(1100u64));
        assert_eq!(next.reserve_of(&token_b()).unwrap().raw(), U256::from(910u64));
        // Original snapshot untouched.
        assert_eq!(p.reserve_of(&token_a()).unwrap().raw(), U256::from(1000u64));
    }

    #[test]
    fn output_amount_fails_on_empty_reserves() {
        let p = pair(0, 1000);
        assert_eq!(
            p.output_amount(&TokenAmount::new(token_a(), 100u64))
                .unwrap_err(),
            PairError::InsufficientReserves
        );
    }

    #[test]
    fn output_amount_fails_when_output_rounds_to_zero() {
        let p = pair(1_000_000, 1);
        assert_eq!(
            p.output_amount(&TokenAmount::new(token_a(), 1u64)).unwrap_err(),
            PairError::InsufficientInputAmount
        );
    }

    #[test]
    fn input_amount_rounds_up() {
        // reserves 1100/910 (post-trade of the reference example), want 90
        // out: floor(1100*90*1000 / (820*997)) + 1 = 121 + 1 = 122
        let p = pair(1100, 910);
        let (input, next) = p
            .input_amount(&TokenAmount::new(token_b(), 90u64))
            .unwrap();
        assert_eq!(input.raw(), U256::from(122u64));
        assert_eq!(input.token(), &token_a());
        assert_eq!(next.reserve_of(&token_b()).unwrap().raw(), U256::from(820u64));
    }

    #[test]
    fn input_amount_fails_when_output_exhausts_reserve() {
        let p = pair(1000, 1000);
        assert_eq!(
            p.input_amount(&TokenAmount::new(token_b(), 1000u64))
                .unwrap_err(),
            PairError::InsufficientReserves
        );
    }

    #[test]
    fn genesis_liquidity_at_minimum_is_rejected() {
        // isqrt(1000 * 1000) - 1000 = 0
        let p = pair(0, 0);
        let supply = TokenAmount::new(p.liquidity_token(), 0u64);
        let err = p
            .liquidity_minted(
                &supply,
                &TokenAmount::new(token_a(), 1000u64),
                &TokenAmount::new(token_b(), 1000u64),
            )
            .unwrap_err();
        assert_eq!(err, PairError::InsufficientInputAmount);
    }

    #[test]
    fn genesis_liquidity_above_minimum() {
        let p = pair(0, 0);
        let supply = TokenAmount::new(p.liquidity_token(), 0u64);
        let minted = p
            .liquidity_minted(
                &supply,
                &TokenAmount::new(token_a(), 1_000_000u64),
                &TokenAmount::new(token_b(), 1_000_000u64),
            )
            .unwrap();
        // isqrt(10^12) - 1000
        assert_eq!(minted.raw(), U256::from(999_000u64));
        assert_eq!(minted.token(), &p.liquidity_token());
    }

    #[test]
    fn proportional_liquidity_takes_smaller_side() {
        let p = pair(1000, 2000);
        let supply = TokenAmount::new(p.liquidity_token(), 10_000u64);
        let minted = p
            .liquidity_minted(
                &supply,
                &TokenAmount::new(token_a(), 100u64),
                &TokenAmount::new(token_b(), 100u64),
            )
            .unwrap();
        // min(100*10000/1000, 100*10000/2000) = min(1000, 500)
        assert_eq!(minted.raw(), U256::from(500u64));
    }

    #[test]
    fn liquidity_minted_rejects_foreign_supply_token() {
        let p = pair(1000, 2000);
        let bogus_supply = TokenAmount::new(token_a(), 10_000u64);
        let err = p
            .liquidity_minted(
                &bogus_supply,
                &TokenAmount::new(token_a(), 100u64),
                &TokenAmount::new(token_b(), 100u64),
            )
            .unwrap_err();
        assert_eq!(err, PairError::TokenMismatch);
    }

    #[test]
    fn liquidity_value_without_fee() {
        let p = pair(1000, 2000);
        let supply = TokenAmount::new(p.liquidity_token(), 1000u64);
        let position = TokenAmount::new(p.liquidity_token(), 250u64);
        let value = p
            .liquidity_value(&token_a(), &supply, &position, false, None)
            .unwrap();
        assert_eq!(value.raw(), U256::from(250u64));
        let value_b = p
            .liquidity_value(&token_b(), &supply, &position, false, None)
            .unwrap();
        assert_eq!(value_b.raw(), U256::from(500u64));
    }

    #[test]
    fn liquidity_value_requires_k_last_when_fee_on() {
        let p = pair(1000, 2000);
        let supply = TokenAmount::new(p.liquidity_token(), 1000u64);
        let position = TokenAmount::new(p.liquidity_token(), 250u64);
        assert_eq!(
            p.liquidity_value(&token_a(), &supply, &position, true, None)
                .unwrap_err(),
            PairError::MissingKLast
        );
    }

    #[test]
    fn liquidity_value_dilutes_by_protocol_fee() {
        // reserves grew from k_last = 1_000_000 (rootKLast = 1000) to
        // 4000 * 4000 (rootK = 4000):
        // fee = 1000 * (4000-1000) / (4000*5 + 1000) = 142
        let p = pair(4000, 4000);
        let supply = TokenAmount::new(p.liquidity_token(), 1000u64);
        let position = TokenAmount::new(p.liquidity_token(), 1000u64);
        let value = p
            .liquidity_value(
                &token_a(),
                &supply,
                &position,
                true,
                Some(U256::from(1_000_000u64)),
            )
            .unwrap();
        // 1000 * 4000 / 1142 = 3502
        assert_eq!(value.raw(), U256::from(3502u64));
    }

    #[test]
    fn liquidity_value_with_zero_k_last_is_unadjusted() {
        let p = pair(4000, 4000);
        let supply = TokenAmount::new(p.liquidity_token(), 1000u64);
        let position = TokenAmount::new(p.liquidity_token(), 1000u64);
        let value = p
            .liquidity_value(&token_a(), &supply, &position, true, Some(U256::zero()))
            .unwrap();
        assert_eq!(value.raw(), U256::from(4000u64));
    }

    #[test]
    fn liquidity_value_rejects_position_above_supply() {
        let p = pair(1000, 2000);
        let supply = TokenAmount::new(p.liquidity_token(), 100u64);
        let position = TokenAmount::new(p.liquidity_token(), 101u64);
        assert_eq!(
            p.liquidity_value(&token_a(), &supply, &position, false, None)
                .unwrap_err(),
            PairError::InsufficientReserves
        );
    }
}
