mod common;

use cardledger::error::LedgerError;
use common::{ledger, seed_card};
use rust_decimal_macros::dec;

const CARD_A: &str = "1111 1111 1111 1111";
const CARD_B: &str = "2222 2222 2222 2222";
const CARD_C: &str = "3333 3333 3333 3333";
const CARD_D: &str = "4444 4444 4444 4444";

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_thousand_concurrent_unit_transfers_drain_exactly() {
    let lg = ledger().await;
    seed_card(&lg, CARD_A, &lg.alice, dec!(1000)).await;
    seed_card(&lg, CARD_B, &lg.alice, dec!(0)).await;

    let mut handles = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let engine = lg.engine.clone();
        let alice = lg.alice.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(CARD_A, CARD_B, dec!(1), &alice).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // No lost updates, no negative excursion: exact drain.
    assert_eq!(
        lg.engine.get_balance(CARD_A, &lg.alice).await.unwrap(),
        dec!(0)
    );
    assert_eq!(
        lg.engine.get_balance(CARD_B, &lg.alice).await.unwrap(),
        dec!(1000)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_overdraw_race_settles_at_zero_not_below() {
    let lg = ledger().await;
    seed_card(&lg, CARD_A, &lg.alice, dec!(50)).await;
    seed_card(&lg, CARD_B, &lg.alice, dec!(0)).await;

    // 100 racing unit transfers against 50 units of funds: exactly 50 succeed.
    let mut handles = Vec::new();
    for _ in 0..100 {
        let engine = lg.engine.clone();
        let alice = lg.alice.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(CARD_A, CARD_B, dec!(1), &alice).await
        }));
    }

    let mut ok = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(LedgerError::InsufficientFunds) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 50);
    assert_eq!(insufficient, 50);

    assert_eq!(
        lg.engine.get_balance(CARD_A, &lg.alice).await.unwrap(),
        dec!(0)
    );
    assert_eq!(
        lg.engine.get_balance(CARD_B, &lg.alice).await.unwrap(),
        dec!(50)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_disjoint_pairs_and_opposing_directions() {
    let lg = ledger().await;
    seed_card(&lg, CARD_A, &lg.alice, dec!(500)).await;
    seed_card(&lg, CARD_B, &lg.alice, dec!(500)).await;
    seed_card(&lg, CARD_C, &lg.bob, dec!(500)).await;
    seed_card(&lg, CARD_D, &lg.bob, dec!(500)).await;

    // Two disjoint pairs transferred concurrently, each in both directions.
    // Opposing directions over the same pair exercise the canonical lock
    // order; totals per pair must be conserved.
    let mut handles = Vec::new();
    for _ in 0..100 {
        let engine = lg.engine.clone();
        let alice = lg.alice.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(CARD_A, CARD_B, dec!(2), &alice).await
        }));
        let engine = lg.engine.clone();
        let alice = lg.alice.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(CARD_B, CARD_A, dec!(1), &alice).await
        }));
        let engine = lg.engine.clone();
        let bob = lg.bob.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(CARD_C, CARD_D, dec!(3), &bob).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let a = lg.engine.get_balance(CARD_A, &lg.alice).await.unwrap();
    let b = lg.engine.get_balance(CARD_B, &lg.alice).await.unwrap();
    assert_eq!(a, dec!(400));
    assert_eq!(b, dec!(600));
    assert_eq!(a + b, dec!(1000));

    let c = lg.engine.get_balance(CARD_C, &lg.bob).await.unwrap();
    let d = lg.engine.get_balance(CARD_D, &lg.bob).await.unwrap();
    assert_eq!(c, dec!(200));
    assert_eq!(d, dec!(800));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_block_races_with_transfers_without_partial_effects() {
    let lg = ledger().await;
    seed_card(&lg, CARD_A, &lg.alice, dec!(100)).await;
    seed_card(&lg, CARD_B, &lg.alice, dec!(0)).await;

    let mut transfers = Vec::new();
    for _ in 0..100 {
        let engine = lg.engine.clone();
        let alice = lg.alice.clone();
        transfers.push(tokio::spawn(async move {
            engine.transfer(CARD_A, CARD_B, dec!(1), &alice).await
        }));
    }
    let blocker = {
        let engine = lg.engine.clone();
        let alice = lg.alice.clone();
        tokio::spawn(async move { engine.block_card(CARD_A, &alice).await })
    };

    let mut moved = 0;
    for handle in transfers {
        if handle.await.unwrap().is_ok() {
            moved += 1;
        }
    }
    blocker.await.unwrap().unwrap();

    // Whatever interleaving happened, money moved one whole unit at a time.
    lg.engine.activate_card(CARD_A, &lg.admin).await.unwrap();
    let a = lg.engine.get_balance(CARD_A, &lg.alice).await.unwrap();
    let b = lg.engine.get_balance(CARD_B, &lg.alice).await.unwrap();
    assert_eq!(b, rust_decimal::Decimal::from(moved));
    assert_eq!(a + b, dec!(100));
}
