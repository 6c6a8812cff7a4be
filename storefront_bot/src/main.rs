use std::{future::Future, pin::Pin, sync::Arc};

use dotenvy::dotenv;
use log::*;
use storefront_bot::{config::BotConfig, integrations::RemoteProvider, status_worker::start_status_worker};
use storefront_engine::{
    events::{
        DepositDecidedEvent,
        EventHandlers,
        EventHooks,
        LocalOrderDecidedEvent,
        OrderCompletedEvent,
        OrderRefundedEvent,
        PurchaseQueuedEvent,
    },
    sqlite::run_migrations,
    OrderFlowApi,
    SqliteDatabase,
};
use topup_tools::{TopupApi, TopupConfig};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = BotConfig::from_env_or_default();

    let db = match SqliteDatabase::new(config.max_db_connections).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Could not open the database: {e}");
            return;
        },
    };
    if let Err(e) = run_migrations(db.pool()).await {
        eprintln!("Could not run database migrations: {e}");
        return;
    }

    let handlers = EventHandlers::new(config.event_buffer_size, notification_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let topup_config = TopupConfig::new_from_env_or_default();
    let api = match TopupApi::new(topup_config) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Could not initialize the provider client: {e}");
            return;
        },
    };
    let provider = RemoteProvider::new(api);
    let order_flow = Arc::new(OrderFlowApi::new(db, provider, producers));

    info!("🚀️ Storefront bot started. Reconciling every {}s.", config.check_interval_secs);
    let _worker = start_status_worker(order_flow, config.check_interval_secs, config.stale_after());

    match tokio::signal::ctrl_c().await {
        Ok(()) => println!("Bye!"),
        Err(e) => eprintln!("Could not listen for the shutdown signal: {e}"),
    }
}

/// The notification layer. The chat front end registers its own hooks here; this
/// binary logs every terminal transition so that nothing is silently dropped.
fn notification_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_completed(|ev: OrderCompletedEvent| {
        Box::pin(async move {
            info!(
                "📬️ Order [{}] completed for account #{} ({})",
                ev.order.correlation_id, ev.order.account_id, ev.order.product_name
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_order_refunded(|ev: OrderRefundedEvent| {
        Box::pin(async move {
            info!(
                "📬️ Order [{}] was rejected upstream. {} refunded to account #{}. New balance: {}",
                ev.order.correlation_id, ev.refund, ev.order.account_id, ev.new_balance
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_purchase_queued(|ev: PurchaseQueuedEvent| {
        Box::pin(async move {
            info!(
                "📬️ Purchase {} by account #{} needs manual fulfillment ({} × {})",
                ev.order.order_id, ev.order.account_id, ev.order.quantity, ev.order.product_name
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_local_order_decided(|ev: LocalOrderDecidedEvent| {
        Box::pin(async move {
            match ev.refund {
                Some((refund, new_balance)) => info!(
                    "📬️ Local order {} was rejected. {refund} refunded to account #{}. New balance: {new_balance}",
                    ev.order.order_id, ev.order.account_id
                ),
                None => info!("📬️ Local order {} fulfilled for account #{}", ev.order.order_id, ev.order.account_id),
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_deposit_decided(|ev: DepositDecidedEvent| {
        Box::pin(async move {
            match ev.breakdown {
                Some(b) => info!(
                    "📬️ Deposit {} approved for account #{}: {} via {} credited {}. New balance: {}",
                    ev.request.request_id, ev.request.account_id, b.submitted, b.method, b.net_credited, b.new_balance
                ),
                None => info!("📬️ Deposit {} rejected for account #{}", ev.request.request_id, ev.request.account_id),
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}
