//! Integration tests for the vaultUSD engine.
//!
//! These tests verify the complete lifecycle of positions against the
//! in-memory reference collaborators: deposit, mint, burn, withdraw, and
//! liquidation, plus the oracle failure modes.

use vaultusd::core::asset::{AssetBank, InMemoryAssetBank};
use vaultusd::core::config::CollateralConfig;
use vaultusd::core::engine::{Engine, SharedEngine};
use vaultusd::core::token::{InMemoryToken, LiabilityToken};
use vaultusd::core::types::{Address, AssetId, FeedId};
use vaultusd::error::Error;
use vaultusd::events::EngineEvent;
use vaultusd::oracle::adapter::Clock;
use vaultusd::oracle::fixed::{FixedPriceFeed, ManualClock};
use vaultusd::utils::constants::{MAX_PRICE_AGE_SECS, MIN_HEALTH_FACTOR, PRECISION};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

type TestEngine = Engine<FixedPriceFeed, InMemoryToken, InMemoryAssetBank>;

const T0: u64 = 1_700_000_000;

fn user(tag: u8) -> Address {
    Address::new([tag; 32])
}

fn weth() -> AssetId {
    AssetId::new("WETH")
}

fn wbtc() -> AssetId {
    AssetId::new("WBTC")
}

fn weth_feed() -> FeedId {
    FeedId::new("WETH/USD")
}

fn wbtc_feed() -> FeedId {
    FeedId::new("WBTC/USD")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// WETH at $2,000 and WBTC at $30,000 on 8-decimal feeds; each numbered
/// user is seeded with 100 WETH and 2 WBTC.
fn setup(users: &[Address]) -> (TestEngine, ManualClock) {
    init_tracing();
    let config =
        CollateralConfig::new(vec![weth(), wbtc()], vec![weth_feed(), wbtc_feed()]).unwrap();

    let mut oracle = FixedPriceFeed::new();
    oracle.set_price(&weth_feed(), 2_000_00000000, T0, 8);
    oracle.set_price(&wbtc_feed(), 30_000_00000000, T0, 8);

    let mut bank = InMemoryAssetBank::new();
    for &who in users {
        bank.credit(&weth(), who, 100 * PRECISION);
        bank.credit(&wbtc(), who, 2 * PRECISION);
    }

    let clock = ManualClock::at(T0);
    let engine = Engine::with_clock(
        config,
        oracle,
        InMemoryToken::new(),
        bank,
        Box::new(clock.clone()),
    );
    (engine, clock)
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSITION LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_position_lifecycle() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);

    // Deposit 10 WETH ($20,000) and mint $8,000 of vUSD.
    engine.deposit(alice, &weth(), 10 * PRECISION).unwrap();
    engine.mint_debt(alice, 8_000 * PRECISION).unwrap();

    assert_eq!(engine.collateral_of(&alice, &weth()), 10 * PRECISION);
    assert_eq!(engine.debt_of(&alice), 8_000 * PRECISION);
    assert_eq!(engine.token().balance_of(&alice), 8_000 * PRECISION);
    assert!(engine.health_factor_of(&alice).unwrap() >= MIN_HEALTH_FACTOR);

    // Repay half, then the rest.
    engine.burn_debt(alice, 4_000 * PRECISION).unwrap();
    assert_eq!(engine.debt_of(&alice), 4_000 * PRECISION);

    engine.burn_debt(alice, 4_000 * PRECISION).unwrap();
    assert_eq!(engine.debt_of(&alice), 0);
    assert_eq!(engine.token().total_supply(), 0);

    // Debt-free: the full deposit can leave.
    engine.withdraw(alice, &weth(), 10 * PRECISION).unwrap();
    assert_eq!(engine.collateral_of(&alice, &weth()), 0);
    assert_eq!(engine.bank().balance_of(&weth(), &alice), 100 * PRECISION);
    assert_eq!(engine.bank().balance_of(&weth(), &Address::ENGINE), 0);
}

#[test]
fn test_valuation_of_known_deposit() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);

    // 10 units at $2,000/unit value to $20,000.
    engine.deposit(alice, &weth(), 10 * PRECISION).unwrap();
    assert_eq!(
        engine.total_collateral_value(&alice).unwrap(),
        20_000 * PRECISION
    );
}

#[test]
fn test_mint_limit_is_half_of_collateral_value() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);
    engine.deposit(alice, &weth(), 10 * PRECISION).unwrap();

    // Up to the 50%-adjusted limit succeeds; one unit over fails.
    engine.mint_debt(alice, 10_000 * PRECISION).unwrap();
    let err = engine.mint_debt(alice, 1).unwrap_err();
    assert!(matches!(err, Error::HealthFactorBroken { .. }));
}

#[test]
fn test_withdrawal_rules_depend_on_debt() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);
    engine.deposit(alice, &weth(), 10 * PRECISION).unwrap();

    // With debt outstanding, a solvency-breaking withdrawal is rejected.
    engine.mint_debt(alice, 9_000 * PRECISION).unwrap();
    let err = engine.withdraw(alice, &weth(), 2 * PRECISION).unwrap_err();
    assert!(matches!(err, Error::HealthFactorBroken { .. }));

    // A withdrawal that keeps the position solvent passes.
    engine.withdraw(alice, &weth(), PRECISION).unwrap();
    assert!(engine.health_factor_of(&alice).unwrap() >= MIN_HEALTH_FACTOR);
}

#[test]
fn test_unsupported_asset_is_rejected() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);
    assert_eq!(
        engine.deposit(alice, &AssetId::new("DOGE"), PRECISION).unwrap_err(),
        Error::UnsupportedAsset("DOGE".into())
    );
}

#[test]
fn test_multi_asset_position() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);

    engine.deposit(alice, &weth(), 10 * PRECISION).unwrap();
    engine.deposit(alice, &wbtc(), PRECISION).unwrap();

    // $20,000 + $30,000 backs up to $25,000 of debt.
    assert_eq!(
        engine.total_collateral_value(&alice).unwrap(),
        50_000 * PRECISION
    );
    engine.mint_debt(alice, 25_000 * PRECISION).unwrap();
    assert_eq!(
        engine.health_factor_of(&alice).unwrap(),
        MIN_HEALTH_FACTOR
    );
}

#[test]
fn test_composite_operations() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);

    engine
        .deposit_and_mint(alice, &weth(), 10 * PRECISION, 10_000 * PRECISION)
        .unwrap();
    assert_eq!(engine.health_factor_of(&alice).unwrap(), MIN_HEALTH_FACTOR);

    engine
        .burn_and_withdraw(alice, &weth(), 10 * PRECISION, 10_000 * PRECISION)
        .unwrap();
    assert_eq!(engine.debt_of(&alice), 0);
    assert_eq!(engine.collateral_of(&alice, &weth()), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE FAILURE MODES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_stale_oracle_blocks_valuation_but_not_ledger() {
    let alice = user(0x01);
    let (mut engine, clock) = setup(&[alice]);
    engine
        .deposit_and_mint(alice, &weth(), 10 * PRECISION, 5_000 * PRECISION)
        .unwrap();

    clock.advance(MAX_PRICE_AGE_SECS + 1);

    // Valuation-dependent operations fail with StalePrice...
    assert!(matches!(
        engine.value_of(&weth(), PRECISION).unwrap_err(),
        Error::StalePrice { .. }
    ));
    assert!(matches!(
        engine.mint_debt(alice, PRECISION).unwrap_err(),
        Error::StalePrice { .. }
    ));
    assert!(matches!(
        engine.withdraw(alice, &weth(), PRECISION).unwrap_err(),
        Error::StalePrice { .. }
    ));

    // ...deposits need no valuation, and raw ledger reads keep working.
    engine.deposit(alice, &weth(), PRECISION).unwrap();
    assert_eq!(engine.collateral_of(&alice, &weth()), 11 * PRECISION);
    assert_eq!(engine.debt_of(&alice), 5_000 * PRECISION);

    // A fresh quote restores full service.
    clock.advance(10);
    engine
        .oracle_mut()
        .set_price(&weth_feed(), 2_000_00000000, clock.now(), 8);
    engine.mint_debt(alice, PRECISION).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_liquidation_end_to_end() {
    let alice = user(0x01);
    let bob = user(0x02);
    let (mut engine, _clock) = setup(&[alice, bob]);

    engine
        .deposit_and_mint(alice, &weth(), 10 * PRECISION, 10_000 * PRECISION)
        .unwrap();
    engine
        .deposit_and_mint(bob, &wbtc(), 2 * PRECISION, 10_000 * PRECISION)
        .unwrap();

    // Healthy targets cannot be liquidated.
    assert_eq!(
        engine
            .liquidate(bob, &weth(), alice, 1_000 * PRECISION)
            .unwrap_err(),
        Error::HealthFactorOk
    );

    // WETH crashes to $1,500: alice's $15,000 backs $10,000 of debt.
    engine
        .oracle_mut()
        .set_price(&weth_feed(), 1_500_00000000, T0, 8);
    let starting = engine.health_factor_of(&alice).unwrap();
    assert!(starting < MIN_HEALTH_FACTOR);

    let outcome = engine
        .liquidate(bob, &weth(), alice, 6_000 * PRECISION)
        .unwrap();

    // The target's health strictly improved and the liquidator was paid
    // the covered quantity plus the 10% bonus.
    assert!(outcome.ending_health > outcome.starting_health);
    assert!(engine.health_factor_of(&alice).unwrap() > starting);
    assert_eq!(
        engine.bank().balance_of(&weth(), &bob),
        100 * PRECISION + outcome.collateral_seized
    );
    assert_eq!(engine.debt_of(&alice), 4_000 * PRECISION);
    assert_eq!(engine.token().balance_of(&bob), 4_000 * PRECISION);
    assert_eq!(engine.token().total_supply(), 14_000 * PRECISION);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYSTEM PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_global_backing_holds_through_operations() {
    let alice = user(0x01);
    let bob = user(0x02);
    let (mut engine, _clock) = setup(&[alice, bob]);

    engine
        .deposit_and_mint(alice, &weth(), 20 * PRECISION, 15_000 * PRECISION)
        .unwrap();
    engine
        .deposit_and_mint(bob, &wbtc(), 2 * PRECISION, 20_000 * PRECISION)
        .unwrap();
    engine.burn_debt(alice, 5_000 * PRECISION).unwrap();
    engine.withdraw(bob, &wbtc(), PRECISION / 2).unwrap();

    // The supply is unit-pegged, so its value is the supply itself; it must
    // never exceed the value of engine-held collateral.
    let stats = engine.statistics().unwrap();
    assert!(engine.token().total_supply() <= stats.total_collateral_value);
    assert_eq!(stats.undercollateralized, 0);
}

#[test]
fn test_event_trail_records_all_collateral_movement() {
    let alice = user(0x01);
    let (mut engine, _clock) = setup(&[alice]);

    engine.deposit(alice, &weth(), 5 * PRECISION).unwrap();
    engine.withdraw(alice, &weth(), 2 * PRECISION).unwrap();

    let events = engine.events().all();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        EngineEvent::CollateralDeposited {
            user: alice,
            asset: weth(),
            amount: 5 * PRECISION,
        }
    );
    assert_eq!(
        events[1],
        EngineEvent::CollateralRedeemed {
            from: alice,
            to: alice,
            asset: weth(),
            amount: 2 * PRECISION,
        }
    );

    // The trail is exportable for external observers.
    let json = engine.events().to_json().unwrap();
    assert!(json.contains("CollateralDeposited"));
}

#[test]
fn test_shared_engine_lifecycle() {
    let alice = user(0x01);
    let (engine, _clock) = setup(&[alice]);
    let shared = SharedEngine::new(engine);

    shared
        .deposit_and_mint(alice, &weth(), 10 * PRECISION, 5_000 * PRECISION)
        .unwrap();
    shared.burn_debt(alice, 5_000 * PRECISION).unwrap();
    shared.withdraw(alice, &weth(), 10 * PRECISION).unwrap();

    let (debt, value) = shared
        .with_snapshot(|e| e.account_information(&alice))
        .unwrap()
        .unwrap();
    assert_eq!(debt, 0);
    assert_eq!(value, 0);
}
