use log::{debug, info, warn};

use crate::{
    db_types::{DepositRequest, Money, NewDepositRequest, OrderId},
    events::{DepositDecidedEvent, EventProducers},
    helpers::new_short_id,
    sfe_api::settings_api::SettingsApi,
    traits::{BulkActionResult, DepositBreakdown, StorefrontDatabase, StorefrontError},
};

/// Payment methods whose amounts are already denominated in the spendable currency.
/// Everything else is native currency and goes through the exchange rate on approval.
pub const SPENDABLE_METHODS: [&str; 3] = ["sham_usd", "usdt_bep20", "usdt_coinex"];

const MAX_SHORT_ID_ATTEMPTS: usize = 10;

/// The deposit approval workflow.
///
/// Users submit a request; an admin approves or rejects it. The credited amount is
/// computed at *approval* time, with the exchange rate and commission in force then,
/// and the credit is applied in the same transaction as the status change so that a
/// double approval can never credit twice.
pub struct DepositApi<B> {
    db: B,
    settings: SettingsApi<B>,
    producers: EventProducers,
}

impl<B> DepositApi<B>
where B: StorefrontDatabase
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        let settings = SettingsApi::new(db.clone());
        Self { db, settings, producers }
    }

    /// Records a new pending deposit request and returns it. The short request id is
    /// drawn at random and retried on collision.
    pub async fn submit_request(
        &self,
        account_id: i64,
        method: &str,
        txn_reference: &str,
        amount: Money,
        proof_ref: Option<String>,
    ) -> Result<DepositRequest, StorefrontError> {
        if amount.value() <= 0 {
            return Err(StorefrontError::Validation(format!("Deposit amount must be positive, got {amount}")));
        }
        self.db.fetch_or_create_account(account_id).await?;
        let mut last_err = None;
        for _ in 0..MAX_SHORT_ID_ATTEMPTS {
            let request = NewDepositRequest {
                request_id: new_short_id(),
                account_id,
                method: method.to_string(),
                txn_reference: txn_reference.to_string(),
                amount,
                proof_ref: proof_ref.clone(),
            };
            match self.db.insert_deposit_request(request).await {
                Ok(request) => {
                    info!("🏦️ Deposit request {} submitted by account #{account_id}: {amount} via {method}",
                        request.request_id);
                    return Ok(request);
                },
                Err(StorefrontError::DuplicateId(id)) => {
                    debug!("🏦️ Short id {id} is taken. Drawing another.");
                    last_err = Some(StorefrontError::DuplicateId(id));
                },
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| StorefrontError::Validation("Could not allocate a request id".into())))
    }

    /// Approves a pending request, crediting the converted, commission-adjusted amount
    /// to the account's spendable balance.
    pub async fn approve(&self, request_id: &OrderId) -> Result<(DepositRequest, DepositBreakdown), StorefrontError> {
        let request = self
            .db
            .fetch_deposit_request(request_id)
            .await?
            .ok_or_else(|| StorefrontError::DepositNotFound(request_id.clone()))?;
        let commission_pct = self.settings.deposit_commission_pct().await?;
        let gross = if SPENDABLE_METHODS.contains(&request.method.as_str()) {
            request.amount.as_f64()
        } else {
            let rate = self.settings.exchange_rate().await?;
            request.amount.as_f64() / rate
        };
        let net_credit = Money::from_f64_rounded(gross * (1.0 - commission_pct / 100.0));
        let (request, new_balance) = self.db.approve_deposit(request_id, net_credit).await?;
        let breakdown = DepositBreakdown {
            submitted: request.amount,
            method: request.method.clone(),
            commission_pct,
            net_credited: net_credit,
            new_balance,
        };
        self.publish_decided(DepositDecidedEvent { request: request.clone(), breakdown: Some(breakdown.clone()) })
            .await;
        Ok((request, breakdown))
    }

    /// Rejects a pending request. No balance effect.
    pub async fn reject(&self, request_id: &OrderId) -> Result<DepositRequest, StorefrontError> {
        let request = self.db.reject_deposit(request_id).await?;
        self.publish_decided(DepositDecidedEvent { request: request.clone(), breakdown: None }).await;
        Ok(request)
    }

    /// Bulk approval. Individual failures are counted and left for manual follow-up.
    pub async fn bulk_approve(&self, request_ids: &[OrderId]) -> BulkActionResult {
        let mut result = BulkActionResult::default();
        for request_id in request_ids {
            match self.approve(request_id).await {
                Ok(_) => result.succeeded += 1,
                Err(e) => {
                    warn!("🏦️ Could not approve deposit {request_id}: {e}");
                    result.failed += 1;
                },
            }
        }
        result
    }

    pub async fn bulk_reject(&self, request_ids: &[OrderId]) -> BulkActionResult {
        let mut result = BulkActionResult::default();
        for request_id in request_ids {
            match self.reject(request_id).await {
                Ok(_) => result.succeeded += 1,
                Err(e) => {
                    warn!("🏦️ Could not reject deposit {request_id}: {e}");
                    result.failed += 1;
                },
            }
        }
        result
    }

    /// Approves every currently pending request.
    pub async fn approve_all_pending(&self) -> Result<BulkActionResult, StorefrontError> {
        let ids = self.pending_request_ids().await?;
        Ok(self.bulk_approve(&ids).await)
    }

    /// Rejects every currently pending request.
    pub async fn reject_all_pending(&self) -> Result<BulkActionResult, StorefrontError> {
        let ids = self.pending_request_ids().await?;
        Ok(self.bulk_reject(&ids).await)
    }

    pub async fn pending_requests(&self) -> Result<Vec<DepositRequest>, StorefrontError> {
        self.db.fetch_pending_deposit_requests().await
    }

    async fn pending_request_ids(&self) -> Result<Vec<OrderId>, StorefrontError> {
        let ids = self.pending_requests().await?.into_iter().map(|r| r.request_id).collect();
        Ok(ids)
    }

    async fn publish_decided(&self, event: DepositDecidedEvent) {
        for producer in &self.producers.deposit_decided_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}
