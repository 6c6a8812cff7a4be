mod support;

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::Duration;
use storefront_engine::{
    db_types::{Money, OrderStatusType},
    events::{EventHandlers, EventHooks, EventProducers, OrderCompletedEvent},
    traits::{AccountManagement, RemoteOutcome, StatusRecord, SubmissionReceipt},
    LedgerApi,
    OrderFlowApi,
};
use support::{mock_provider::MockProvider, prepare_db, uc_product};

const TWO_DAYS: i64 = 48;

async fn submit_one(
    db: &storefront_engine::SqliteDatabase,
    provider: &MockProvider,
    producers: EventProducers,
) -> (OrderFlowApi<storefront_engine::SqliteDatabase, MockProvider>, String) {
    let ledger = LedgerApi::new(db.clone());
    let api = OrderFlowApi::new(db.clone(), provider.clone(), producers);
    ledger.adjust_credit(42, Money::from_units(10)).await.unwrap();
    let receipt = api.submit_order(42, &uc_product(), 1, vec![]).await.unwrap();
    let SubmissionReceipt::Accepted { correlation_id, .. } = receipt else {
        panic!("Expected an accepted receipt");
    };
    (api, correlation_id)
}

#[tokio::test]
async fn completed_outcome_stores_the_code_and_fires_the_hook() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let completed = Arc::new(AtomicUsize::new(0));
    let counter = completed.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_completed(move |_ev: OrderCompletedEvent| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let (api, cid) = submit_one(&db, &provider, producers).await;
    provider.set_status_records(vec![StatusRecord {
        correlation_id: Some(cid.clone()),
        outcome: RemoteOutcome::Completed,
        fulfillment_codes: vec!["CODE-123".to_string()],
        ..Default::default()
    }]);

    let summary = api.reconcile_remote_orders(Duration::hours(TWO_DAYS)).await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.resolved(), 1);

    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    assert_eq!(order.fulfillment_code.as_deref(), Some("CODE-123"));
    assert!(order.notified);
    // No refund on completion.
    assert_eq!(db.fetch_account(42).await.unwrap().unwrap().balance, Money::from_units(6));

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_outcome_refunds_exactly_once() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let (api, cid) = submit_one(&db, &provider, EventProducers::default()).await;
    provider.set_status_records(vec![StatusRecord {
        correlation_id: Some(cid.clone()),
        outcome: RemoteOutcome::Rejected,
        ..Default::default()
    }]);

    let summary = api.reconcile_remote_orders(Duration::hours(TWO_DAYS)).await.unwrap();
    assert_eq!(summary.refunded, 1);
    assert_eq!(db.fetch_account(42).await.unwrap().unwrap().balance, Money::from_units(10));

    // The provider keeps reporting the same outcome; a later pass must not pay again.
    let summary = api.reconcile_remote_orders(Duration::hours(TWO_DAYS)).await.unwrap();
    assert_eq!(summary.refunded, 0);
    assert_eq!(db.fetch_account(42).await.unwrap().unwrap().balance, Money::from_units(10));

    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Rejected);
    assert!(order.notified);
}

#[tokio::test]
async fn concurrent_passes_cannot_double_refund() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let (api, cid) = submit_one(&db, &provider, EventProducers::default()).await;
    provider.set_status_records(vec![StatusRecord {
        correlation_id: Some(cid.clone()),
        outcome: RemoteOutcome::Rejected,
        ..Default::default()
    }]);

    let (s1, s2) = futures_util::future::join(
        api.reconcile_remote_orders(Duration::hours(TWO_DAYS)),
        api.reconcile_remote_orders(Duration::hours(TWO_DAYS)),
    )
    .await;
    let (s1, s2) = (s1.unwrap(), s2.unwrap());
    assert_eq!(s1.refunded + s2.refunded, 1);
    assert_eq!(db.fetch_account(42).await.unwrap().unwrap().balance, Money::from_units(10));
}

#[tokio::test]
async fn unmatched_records_are_skipped() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let (api, cid) = submit_one(&db, &provider, EventProducers::default()).await;
    provider.set_status_records(vec![StatusRecord {
        correlation_id: Some("no-such-order".to_string()),
        outcome: RemoteOutcome::Completed,
        ..Default::default()
    }]);

    let summary = api.reconcile_remote_orders(Duration::hours(TWO_DAYS)).await.unwrap();
    assert_eq!(summary.unmatched, 1);
    assert_eq!(summary.resolved(), 0);
    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(db.fetch_account(42).await.unwrap().unwrap().balance, Money::from_units(6));
}

#[tokio::test]
async fn provider_order_id_is_a_fallback_match_key() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let (api, cid) = submit_one(&db, &provider, EventProducers::default()).await;
    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    let provider_id = order.provider_order_id.unwrap();
    provider.set_status_records(vec![StatusRecord {
        correlation_id: None,
        provider_order_id: Some(provider_id),
        outcome: RemoteOutcome::Completed,
        ..Default::default()
    }]);

    let summary = api.reconcile_remote_orders(Duration::hours(TWO_DAYS)).await.unwrap();
    assert_eq!(summary.completed, 1);
    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
}

#[tokio::test]
async fn stale_pending_orders_are_flagged_but_untouched() {
    let db = prepare_db().await;
    let provider = MockProvider::default();
    let (api, cid) = submit_one(&db, &provider, EventProducers::default()).await;
    sqlx::query("UPDATE remote_orders SET created_at = datetime('now', '-3 days') WHERE correlation_id = $1")
        .bind(&cid)
        .execute(db.pool())
        .await
        .unwrap();

    // The provider still reports it in progress.
    provider.set_status_records(vec![StatusRecord {
        correlation_id: Some(cid.clone()),
        outcome: RemoteOutcome::InProgress,
        ..Default::default()
    }]);
    let summary = api.reconcile_remote_orders(Duration::hours(TWO_DAYS)).await.unwrap();
    assert_eq!(summary.stale, 1);
    assert_eq!(summary.resolved(), 0);

    // Flagging is advisory only: no state change, no refund.
    let order = db.fetch_remote_order_by_correlation_id(&cid).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(db.fetch_account(42).await.unwrap().unwrap().balance, Money::from_units(6));
}
