mod support;

use storefront_engine::{db_types::Money, traits::StorefrontError, LedgerApi, StorefrontDatabase};
use support::prepare_db;

#[tokio::test]
async fn concurrent_debits_never_overdraw() {
    let db = prepare_db().await;
    let ledger = LedgerApi::new(db.clone());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();

    // Eight simultaneous rushes at a balance that covers only two of them. The
    // guarded update serializes them: exactly two may win, and the rest must fail
    // without ever driving the balance negative.
    let mut attempts = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        attempts.push(tokio::spawn(async move { db.debit_balance(42, Money::from_units(4)).await.unwrap() }));
    }
    let mut succeeded = 0;
    for attempt in attempts {
        if attempt.await.unwrap().is_some() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 2);
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(2));
}

#[tokio::test]
async fn concurrent_credits_are_never_lost() {
    let db = prepare_db().await;
    let ledger = LedgerApi::new(db.clone());
    ledger.fetch_or_create_account(42).await.unwrap();

    let mut credits = Vec::new();
    for _ in 0..10 {
        let ledger = ledger.clone();
        credits.push(tokio::spawn(async move { ledger.adjust_credit(42, Money::from_units(1)).await.unwrap() }));
    }
    for credit in credits {
        credit.await.unwrap();
    }
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(10));
}

#[tokio::test]
async fn adjust_debit_reports_the_post_attempt_balance() {
    let db = prepare_db().await;
    let ledger = LedgerApi::new(db.clone());
    ledger.adjust_credit(7, Money::from_units(3)).await.unwrap();

    let err = ledger.adjust_debit(7, Money::from_units(4)).await.unwrap_err();
    let StorefrontError::InsufficientFunds { needed, balance } = err else {
        panic!("Expected an insufficient-funds error");
    };
    assert_eq!(needed, Money::from_units(4));
    assert_eq!(balance, Money::from_units(3));

    // Success hands back the balance from the update itself.
    let new_balance = ledger.adjust_debit(7, Money::from_units(3)).await.unwrap();
    assert_eq!(new_balance, Money::from_units(0));
}
