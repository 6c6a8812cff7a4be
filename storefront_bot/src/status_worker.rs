use std::sync::Arc;

use chrono::Duration;
use log::*;
use storefront_engine::{traits::FulfillmentProvider, OrderFlowApi, StorefrontDatabase};
use tokio::task::JoinHandle;

/// Starts the reconciliation worker. Do not await the returned JoinHandle, as it will
/// run indefinitely.
///
/// Passes run strictly one at a time: the next tick is not processed until the previous
/// pass has finished, so a slow provider cannot stack up overlapping polls.
pub fn start_status_worker<B, P>(
    api: Arc<OrderFlowApi<B, P>>,
    interval_secs: u64,
    stale_after: Duration,
) -> JoinHandle<()>
where
    B: StorefrontDatabase + Send + Sync + 'static,
    P: FulfillmentProvider + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        info!("🕰️ Order status worker started (every {interval_secs}s)");
        loop {
            timer.tick().await;
            debug!("🕰️ Running reconciliation pass");
            match api.reconcile_remote_orders(stale_after).await {
                Ok(summary) => {
                    if summary.resolved() > 0 || summary.unmatched > 0 || summary.stale > 0 {
                        info!(
                            "🕰️ Reconciliation: {} completed, {} refunded, {} unmatched, {} stale",
                            summary.completed, summary.refunded, summary.unmatched, summary.stale
                        );
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running reconciliation pass: {e}");
                },
            }
        }
    })
}
