mod support;

use storefront_engine::{
    db_types::{Money, OrderStatusType},
    events::EventProducers,
    traits::{
        AccountManagement,
        ProviderError,
        StorefrontError,
        SubmissionReceipt,
        SubmitResponse,
    },
    LedgerApi,
    OrderFlowApi,
};
use support::{mock_provider::MockProvider, prepare_db, uc_product};

#[tokio::test]
async fn accepted_submission_debits_and_tracks_the_order() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();

    let receipt = api.submit_order(42, &uc_product(), 1, vec!["player-1".to_string()]).await.unwrap();
    let SubmissionReceipt::Accepted { correlation_id, provider_order_id, charged } = receipt else {
        panic!("Expected an accepted receipt");
    };
    assert_eq!(charged, Money::from_units(4));
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(6));

    let order = db.fetch_remote_order_by_correlation_id(&correlation_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.provider_order_id.as_deref(), Some(provider_order_id.as_str()));
    assert!(!order.notified);
}

#[tokio::test]
async fn insufficient_funds_fails_before_the_provider_is_called() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());

    let err = api.submit_order(7, &uc_product(), 1, vec![]).await.unwrap_err();
    assert!(matches!(err, StorefrontError::InsufficientFunds { .. }));
    assert!(provider.submissions().is_empty());
    assert!(db.fetch_pending_remote_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn reservation_failure_rolls_back_the_debit() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();

    // Storage fails between the debit and the reservation write.
    sqlx::query("DROP TABLE remote_orders").execute(db.pool()).await.unwrap();

    let err = api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap_err();
    assert!(matches!(err, StorefrontError::DatabaseError(_)));
    // The charge rolled back with the failed reservation, and nothing reached the
    // provider.
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(10));
    assert!(provider.submissions().is_empty());
}

#[tokio::test]
async fn banned_accounts_cannot_purchase() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(9, Money::from_units(10)).await.unwrap();
    ledger.set_banned(9, true).await.unwrap();

    let err = api.submit_order(9, &uc_product(), 1, vec![]).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
    assert_eq!(ledger.balance(9).await.unwrap(), Money::from_units(10));
}

#[tokio::test]
async fn explicit_rejection_refunds_immediately() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();
    provider.script_submit(Ok(SubmitResponse::Rejected { code: 42, reason: "player not found".to_string() }));

    let err = api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap_err();
    assert!(matches!(err, StorefrontError::ProviderRejected { code: 42, .. }));
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(10));

    let cid = provider.submissions().pop().unwrap();
    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Rejected);
    assert!(order.notified);
}

#[tokio::test]
async fn timeout_keeps_the_charge_and_the_pending_order() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();
    provider.script_submit(Err(ProviderError::Timeout("deadline exceeded".to_string())));

    let receipt = api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap();
    let SubmissionReceipt::OutcomeUnknown { correlation_id, charged } = receipt else {
        panic!("Expected an unknown-outcome receipt");
    };
    assert_eq!(charged, Money::from_units(4));
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(6));
    let order = db.fetch_remote_order_by_correlation_id(&correlation_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[tokio::test]
async fn capacity_exhaustion_queues_a_local_order() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();
    provider.script_submit(Ok(SubmitResponse::CapacityExhausted { code: 100, reason: "provider balance".to_string() }));

    let receipt = api.submit_order(42, &uc_product(), 1, vec!["player-1".to_string()]).await.unwrap();
    let SubmissionReceipt::QueuedLocally { order_id, charged } = receipt else {
        panic!("Expected a queued-locally receipt");
    };
    assert_eq!(charged, Money::from_units(4));
    // The debit carries over to the local order.
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(6));

    let order = db.fetch_local_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.total_price(), Money::from_units(4));
    assert_eq!(order.inputs(), vec!["player-1".to_string()]);

    // The reservation is closed out without a refund.
    let cid = provider.submissions().pop().unwrap();
    let remote = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(remote.status, OrderStatusType::Rejected);
    assert!(db.fetch_pending_remote_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn local_order_decisions_apply_at_most_once() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();
    provider.script_submit(Ok(SubmitResponse::CapacityExhausted { code: 105, reason: "out of stock".to_string() }));
    let SubmissionReceipt::QueuedLocally { order_id, .. } =
        api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap()
    else {
        panic!("Expected a queued-locally receipt");
    };

    let (_, refund, new_balance) = api.refund_local_order(&order_id).await.unwrap();
    assert_eq!(refund, Money::from_units(4));
    assert_eq!(new_balance, Money::from_units(10));

    // A second decision of either kind must not touch the balance again.
    let err = api.refund_local_order(&order_id).await.unwrap_err();
    assert!(matches!(err, StorefrontError::AlreadyProcessed { .. }));
    let err = api.complete_local_order(&order_id).await.unwrap_err();
    assert!(matches!(err, StorefrontError::AlreadyProcessed { .. }));
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(10));
}

#[tokio::test]
async fn completing_a_local_order_has_no_ledger_effect() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();
    provider.script_submit(Ok(SubmitResponse::CapacityExhausted { code: 100, reason: "drained".to_string() }));
    let SubmissionReceipt::QueuedLocally { order_id, .. } =
        api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap()
    else {
        panic!("Expected a queued-locally receipt");
    };

    let order = api.complete_local_order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(6));
}

#[tokio::test]
async fn bulk_refunds_count_failures_without_aborting() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), EventProducers::default());
    ledger.adjust_credit(42, Money::from_units(20)).await.unwrap();

    let mut order_ids = Vec::new();
    for _ in 0..3 {
        provider
            .script_submit(Ok(SubmitResponse::CapacityExhausted { code: 100, reason: "drained".to_string() }));
        let SubmissionReceipt::QueuedLocally { order_id, .. } =
            api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap()
        else {
            panic!("Expected a queued-locally receipt");
        };
        order_ids.push(order_id);
    }
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(8));

    // One of the three is already decided; the other two refund.
    api.complete_local_order(&order_ids[0]).await.unwrap();
    let result = api.bulk_refund_local_orders(&order_ids).await;
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(ledger.balance(42).await.unwrap(), Money::from_units(16));
}
