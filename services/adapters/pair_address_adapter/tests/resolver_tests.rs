//! End-to-end tests: pair construction through the resolver, cache
//! persistence across restarts.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ethereum_types::{H160, H256};

use pair::{compute_pair_address, Pair, Token, TokenAmount};
use pair_address_adapter::{
    FactoryClient, PairAddressConfig, PairAddressResolver, PairListing,
};

struct StaticFactoryClient {
    listings: Vec<PairListing>,
}

#[async_trait]
impl FactoryClient for StaticFactoryClient {
    async fn pair_for(&self, token0: H160, token1: H160) -> Result<Option<H160>> {
        Ok(self
            .listings
            .iter()
            .find(|l| l.token0 == token0 && l.token1 == token1)
            .map(|l| l.pair))
    }

    async fn all_pairs(&self) -> Result<Vec<PairListing>> {
        Ok(self.listings.clone())
    }
}

fn token_a() -> Token {
    Token::new(1, H160([0x11; 20]), 18).with_metadata("TKA", "Token A")
}

fn token_b() -> Token {
    Token::new(1, H160([0x22; 20]), 6).with_metadata("TKB", "Token B")
}

fn factory_entry() -> PairListing {
    PairListing {
        token0: token_a().address(),
        token1: token_b().address(),
        pair: H160([0xab; 20]),
    }
}

fn config(dir: &std::path::Path, persist: bool) -> PairAddressConfig {
    PairAddressConfig {
        cache_dir: dir.to_path_buf(),
        enable_disk_cache: persist,
        deterministic: false,
        rate_limit_per_sec: 1000,
        ..Default::default()
    }
}

#[tokio::test]
async fn pair_starts_provisional_and_observes_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticFactoryClient {
        listings: vec![factory_entry()],
    });
    let resolver = PairAddressResolver::new(config(dir.path(), false), client).unwrap();

    let pair = Pair::with_address_book(
        TokenAmount::new(token_a(), 1000u64),
        TokenAmount::new(token_b(), 1000u64),
        &resolver,
    )
    .unwrap();

    assert!(!pair.liquidity_address().is_resolved());
    let provisional = pair.liquidity_address().current();

    // Drive the resolution deterministically (the background task races
    // with test teardown, so tests call the same path inline).
    let resolved = resolver
        .resolve_pair(token_a().address(), token_b().address())
        .await
        .unwrap();

    assert_eq!(resolved, Some(H160([0xab; 20])));
    assert!(pair.liquidity_address().is_resolved());
    assert_eq!(pair.liquidity_address().current(), H160([0xab; 20]));
    assert_ne!(provisional, pair.liquidity_address().current());
    assert_eq!(pair.liquidity_token().address(), H160([0xab; 20]));
}

#[tokio::test]
async fn second_construction_hits_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticFactoryClient {
        listings: vec![factory_entry()],
    });
    let resolver = PairAddressResolver::new(config(dir.path(), false), client).unwrap();
    resolver
        .resolve_pair(token_a().address(), token_b().address())
        .await
        .unwrap();

    // Either argument order, resolved from the start.
    let pair = Pair::with_address_book(
        TokenAmount::new(token_b(), 500u64),
        TokenAmount::new(token_a(), 700u64),
        &resolver,
    )
    .unwrap();

    assert!(pair.liquidity_address().is_resolved());
    assert_eq!(pair.liquidity_address().current(), H160([0xab; 20]));
    assert!(resolver.metrics().cache_hits >= 1);
}

#[tokio::test]
async fn cache_persists_across_resolver_restarts() {
    let dir = tempfile::tempdir().unwrap();

    {
        let client = Arc::new(StaticFactoryClient {
            listings: vec![factory_entry()],
        });
        let resolver = PairAddressResolver::new(config(dir.path(), true), client).unwrap();
        resolver.discover_all_pairs().await.unwrap();
        assert_eq!(resolver.cached_pairs(), 1);
        resolver.save_cache().unwrap();
    }

    // Fresh resolver over an empty factory: only the disk cache can answer.
    let client = Arc::new(StaticFactoryClient { listings: vec![] });
    let resolver = PairAddressResolver::new(config(dir.path(), true), client).unwrap();
    assert_eq!(resolver.cached_pairs(), 1);

    let pair = Pair::with_address_book(
        TokenAmount::new(token_a(), 1u64),
        TokenAmount::new(token_b(), 1u64),
        &resolver,
    )
    .unwrap();
    assert!(pair.liquidity_address().is_resolved());
    assert_eq!(pair.liquidity_address().current(), H160([0xab; 20]));
}

#[tokio::test]
async fn provisional_derivation_uses_configured_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticFactoryClient { listings: vec![] });

    let mut cfg = config(dir.path(), false);
    cfg.factory_address = H160([0x77; 20]);
    cfg.init_code_hash = H256([0x88; 32]);
    let expected = compute_pair_address(
        cfg.factory_address,
        cfg.init_code_hash,
        &token_a(),
        &token_b(),
    )
    .unwrap();
    let resolver = PairAddressResolver::new(cfg, client).unwrap();

    let pair = Pair::with_address_book(
        TokenAmount::new(token_a(), 1000u64),
        TokenAmount::new(token_b(), 1000u64),
        &resolver,
    )
    .unwrap();

    // Provisional address comes from the resolver's factory, not the
    // built-in constants.
    assert!(!pair.liquidity_address().is_resolved());
    assert_eq!(pair.liquidity_address().current(), expected);
    assert_ne!(
        pair.liquidity_address().current(),
        Pair::new(
            TokenAmount::new(token_a(), 1000u64),
            TokenAmount::new(token_b(), 1000u64),
        )
        .unwrap()
        .liquidity_address()
        .current()
    );
}

#[tokio::test]
async fn unresolvable_pair_keeps_provisional_address() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticFactoryClient { listings: vec![] });
    let resolver = PairAddressResolver::new(config(dir.path(), false), client).unwrap();

    let pair = Pair::with_address_book(
        TokenAmount::new(token_a(), 1000u64),
        TokenAmount::new(token_b(), 1000u64),
        &resolver,
    )
    .unwrap();
    let provisional = pair.liquidity_address().current();

    let resolved = resolver
        .resolve_pair(token_a().address(), token_b().address())
        .await
        .unwrap();

    assert_eq!(resolved, None);
    assert!(!pair.liquidity_address().is_resolved());
    assert_eq!(pair.liquidity_address().current(), provisional);
}
