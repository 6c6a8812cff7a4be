use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};
use log::{debug, info, warn};

use crate::{
    db_types::{LocalOrder, Money, NewLocalOrder, NewRemoteOrder, OrderId, ProductSnapshot, RemoteOrder},
    events::{EventProducers, LocalOrderDecidedEvent, OrderCompletedEvent, OrderRefundedEvent, PurchaseQueuedEvent},
    helpers::{new_correlation_id, new_short_id},
    traits::{
        BulkActionResult,
        FulfillmentProvider,
        ProviderError,
        ReconcileSummary,
        RemoteOutcome,
        StorefrontDatabase,
        StorefrontError,
        SubmissionReceipt,
        SubmitResponse,
    },
};

/// Attempts at drawing an unused short id before giving up. Collisions on a 5-digit
/// space are rare until the table grows very large, so a handful of retries suffices.
const MAX_SHORT_ID_ATTEMPTS: usize = 10;

/// The purchase gateway and reconciliation loop.
///
/// Submission order of operations is fixed: debit and reserve the tracking record in
/// one transaction, and only then call the provider. A crash at any point leaves either
/// an intact balance or a pending reservation that the reconciliation loop (or an
/// admin) can resolve — never a charged purchase with no record of it.
pub struct OrderFlowApi<B, P> {
    db: B,
    provider: P,
    producers: EventProducers,
}

impl<B, P> OrderFlowApi<B, P>
where
    B: StorefrontDatabase,
    P: FulfillmentProvider,
{
    pub fn new(db: B, provider: P, producers: EventProducers) -> Self {
        Self { db, provider, producers }
    }

    /// Submits a purchase on behalf of `account_id`.
    ///
    /// Hard failures (banned account, insufficient funds, explicit provider rejection)
    /// come back as errors, with the balance already restored where a debit had been
    /// taken. The three success shapes are described on [`SubmissionReceipt`].
    pub async fn submit_order(
        &self,
        account_id: i64,
        product: &ProductSnapshot,
        quantity: u32,
        inputs: Vec<String>,
    ) -> Result<SubmissionReceipt, StorefrontError> {
        if quantity == 0 {
            return Err(StorefrontError::Validation("Quantity must be at least 1".to_string()));
        }
        if product.product_id.is_empty() {
            return Err(StorefrontError::Validation("Product id must not be empty".to_string()));
        }
        let account = self.db.fetch_or_create_account(account_id).await?;
        if account.banned {
            return Err(StorefrontError::Validation(format!("Account #{account_id} is banned")));
        }
        let total = product.unit_price * quantity as i64;
        let correlation_id = new_correlation_id();
        let reservation = NewRemoteOrder {
            correlation_id: correlation_id.clone(),
            account_id,
            product_id: product.product_id.clone(),
            product_name: product.name.clone(),
            charged_price: total,
        };
        // The debit and the reservation commit together. A failure to write the
        // tracking record rolls the charge back rather than stranding it.
        if !self.db.charge_and_reserve(reservation).await? {
            let balance = self.db.fetch_or_create_account(account_id).await?.balance;
            return Err(StorefrontError::InsufficientFunds { needed: total, balance });
        }
        info!(
            "🚀 Submitting order [{correlation_id}] for account #{account_id}: {quantity} × {} ({total})",
            product.name
        );
        let response = self
            .provider
            .submit(&product.product_id, quantity, &inputs, &product.param_names, &correlation_id, account_id)
            .await;
        match response {
            Ok(SubmitResponse::Accepted { provider_order_id }) => {
                self.db.attach_provider_order_id(&correlation_id, &provider_order_id).await?;
                info!("🚀 Order [{correlation_id}] accepted by the provider as {provider_order_id}");
                Ok(SubmissionReceipt::Accepted { correlation_id, provider_order_id, charged: total })
            },
            Ok(SubmitResponse::CapacityExhausted { code, reason }) => {
                warn!("🚀 Provider path exhausted for [{correlation_id}] (code {code}): {reason}");
                let order = self.queue_locally(&correlation_id, account_id, product, quantity, inputs).await?;
                let order_id = order.order_id.clone();
                self.publish_purchase_queued(PurchaseQueuedEvent { order }).await;
                Ok(SubmissionReceipt::QueuedLocally { order_id, charged: total })
            },
            Ok(SubmitResponse::Rejected { code, reason }) => {
                warn!("🚀 Provider rejected [{correlation_id}] (code {code}): {reason}. Refunding.");
                self.db.finalize_rejected_submission(&correlation_id, true).await?;
                Err(StorefrontError::ProviderRejected { code, reason })
            },
            Err(ProviderError::Timeout(msg)) => {
                // Unknown outcome. The reservation stays pending and the charge stands;
                // the reconciliation loop settles it one way or the other.
                warn!("🚀 Submission [{correlation_id}] timed out ({msg}). Leaving the order pending.");
                Ok(SubmissionReceipt::OutcomeUnknown { correlation_id, charged: total })
            },
            Err(e) => {
                warn!("🚀 Submission [{correlation_id}] failed before the provider could accept it: {e}. Refunding.");
                self.db.finalize_rejected_submission(&correlation_id, true).await?;
                Err(StorefrontError::Provider(e))
            },
        }
    }

    /// Converts a capacity-exhausted reservation into a local order carrying the debit.
    /// Retries the short id on the (rare) collision.
    async fn queue_locally(
        &self,
        correlation_id: &str,
        account_id: i64,
        product: &ProductSnapshot,
        quantity: u32,
        inputs: Vec<String>,
    ) -> Result<LocalOrder, StorefrontError> {
        let mut last_err = None;
        for _ in 0..MAX_SHORT_ID_ATTEMPTS {
            let order = NewLocalOrder {
                order_id: new_short_id(),
                account_id,
                product_id: product.product_id.clone(),
                product_name: product.name.clone(),
                category: product.category.clone(),
                unit_price: product.unit_price,
                quantity: quantity as i64,
                inputs: inputs.clone(),
            };
            match self.db.convert_submission_to_local(correlation_id, order).await {
                Ok(order) => return Ok(order),
                Err(StorefrontError::DuplicateId(id)) => {
                    debug!("📋️ Short id {id} is taken. Drawing another.");
                    last_err = Some(StorefrontError::DuplicateId(id));
                },
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| StorefrontError::Validation("Could not allocate a short order id".into())))
    }

    /// Runs one reconciliation pass over every pending remote order.
    ///
    /// One batched status query goes out; each returned record is matched back to a
    /// tracked order by correlation id, falling back to the provider-assigned order id.
    /// Records matching neither are logged and skipped. Terminal transitions go through
    /// the backend's compare-and-swap methods, so a pass that races with another
    /// resolver counts the order as `already_resolved` instead of double-applying it.
    pub async fn reconcile_remote_orders(&self, stale_after: Duration) -> Result<ReconcileSummary, StorefrontError> {
        let pending = self.db.fetch_pending_remote_orders().await?;
        let mut summary = ReconcileSummary::default();
        if pending.is_empty() {
            return Ok(summary);
        }
        let ids = pending.iter().map(|o| o.correlation_id.clone()).collect::<Vec<String>>();
        debug!("🔎️ Reconciling {} pending remote orders", ids.len());
        let records = self.provider.check_status(&ids).await?;
        let by_correlation: HashMap<&str, &RemoteOrder> =
            pending.iter().map(|o| (o.correlation_id.as_str(), o)).collect();
        let by_provider_id: HashMap<&str, &RemoteOrder> = pending
            .iter()
            .filter_map(|o| o.provider_order_id.as_deref().map(|pid| (pid, o)))
            .collect();
        let mut resolved = HashSet::new();
        for record in records {
            let matched = record
                .correlation_id
                .as_deref()
                .and_then(|cid| by_correlation.get(cid))
                .or_else(|| record.provider_order_id.as_deref().and_then(|pid| by_provider_id.get(pid)));
            let Some(order) = matched else {
                warn!(
                    "🔎️ Status record (correlation: {:?}, provider id: {:?}) matches no tracked order. Skipping.",
                    record.correlation_id, record.provider_order_id
                );
                summary.unmatched += 1;
                continue;
            };
            let cid = order.correlation_id.as_str();
            match record.outcome {
                RemoteOutcome::Completed => {
                    let code = record.fulfillment_codes.first().cloned();
                    match self.db.complete_remote_order(cid, code).await? {
                        Some(order) => {
                            summary.completed += 1;
                            resolved.insert(order.correlation_id.clone());
                            self.publish_order_completed(OrderCompletedEvent::new(order)).await;
                        },
                        None => summary.already_resolved += 1,
                    }
                },
                RemoteOutcome::Rejected => match self.db.reject_remote_order_with_refund(cid).await? {
                    Some((order, new_balance)) => {
                        summary.refunded += 1;
                        resolved.insert(order.correlation_id.clone());
                        let refund = order.charged_price;
                        self.publish_order_refunded(OrderRefundedEvent { order, refund, new_balance }).await;
                    },
                    None => summary.already_resolved += 1,
                },
                RemoteOutcome::InProgress => {},
            }
        }
        let cutoff = Utc::now() - stale_after;
        for order in pending.iter().filter(|o| !resolved.contains(&o.correlation_id)) {
            if order.created_at < cutoff {
                warn!(
                    "🔎️ Order [{}] has been pending since {}. Flagging for manual review.",
                    order.correlation_id, order.created_at
                );
                summary.stale += 1;
            }
        }
        info!(
            "🔎️ Reconciliation pass done. {} completed, {} refunded, {} unmatched, {} already resolved, {} stale",
            summary.completed, summary.refunded, summary.unmatched, summary.already_resolved, summary.stale
        );
        Ok(summary)
    }

    /// Admin action: mark a pending local order as fulfilled.
    pub async fn complete_local_order(&self, order_id: &OrderId) -> Result<LocalOrder, StorefrontError> {
        let order = self.db.complete_local_order(order_id).await?;
        self.publish_local_order_decided(LocalOrderDecidedEvent { order: order.clone(), refund: None }).await;
        Ok(order)
    }

    /// Admin action: reject a pending local order and refund quantity × unit price.
    pub async fn refund_local_order(&self, order_id: &OrderId) -> Result<(LocalOrder, Money, Money), StorefrontError> {
        let (order, refund, new_balance) = self.db.refund_local_order(order_id).await?;
        self.publish_local_order_decided(LocalOrderDecidedEvent {
            order: order.clone(),
            refund: Some((refund, new_balance)),
        })
        .await;
        Ok((order, refund, new_balance))
    }

    /// Bulk variant of [`Self::complete_local_order`]. Individual failures are counted
    /// and logged, never retried, and never abort the batch.
    pub async fn bulk_complete_local_orders(&self, order_ids: &[OrderId]) -> BulkActionResult {
        let mut result = BulkActionResult::default();
        for order_id in order_ids {
            match self.complete_local_order(order_id).await {
                Ok(_) => result.succeeded += 1,
                Err(e) => {
                    warn!("📋️ Could not complete local order {order_id}: {e}");
                    result.failed += 1;
                },
            }
        }
        result
    }

    /// Bulk variant of [`Self::refund_local_order`].
    pub async fn bulk_refund_local_orders(&self, order_ids: &[OrderId]) -> BulkActionResult {
        let mut result = BulkActionResult::default();
        for order_id in order_ids {
            match self.refund_local_order(order_id).await {
                Ok(_) => result.succeeded += 1,
                Err(e) => {
                    warn!("📋️ Could not refund local order {order_id}: {e}");
                    result.failed += 1;
                },
            }
        }
        result
    }

    pub async fn pending_local_orders(&self) -> Result<Vec<LocalOrder>, StorefrontError> {
        self.db.fetch_pending_local_orders().await
    }

    pub async fn pending_remote_orders(&self) -> Result<Vec<RemoteOrder>, StorefrontError> {
        self.db.fetch_pending_remote_orders().await
    }

    async fn publish_order_completed(&self, event: OrderCompletedEvent) {
        for producer in &self.producers.order_completed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    async fn publish_order_refunded(&self, event: OrderRefundedEvent) {
        for producer in &self.producers.order_refunded_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    async fn publish_purchase_queued(&self, event: PurchaseQueuedEvent) {
        for producer in &self.producers.purchase_queued_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    async fn publish_local_order_decided(&self, event: LocalOrderDecidedEvent) {
        for producer in &self.producers.local_order_decided_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}
