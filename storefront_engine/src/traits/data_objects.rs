use serde::{Deserialize, Serialize};

use crate::db_types::{Money, OrderId};

/// Outcome of a successful submission through the gateway. A hard failure (validation,
/// insufficient funds, explicit provider rejection) is an error, not a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionReceipt {
    /// The provider accepted the purchase; the reconciliation loop will confirm it.
    Accepted { correlation_id: String, provider_order_id: String, charged: Money },
    /// The submission call timed out. The charge stands and a pending remote order is
    /// tracked; the reconciliation loop will resolve the true outcome.
    OutcomeUnknown { correlation_id: String, charged: Money },
    /// The provider path was exhausted; the purchase was queued for manual
    /// fulfillment as a local order.
    QueuedLocally { order_id: OrderId, charged: Money },
}

impl SubmissionReceipt {
    pub fn charged(&self) -> Money {
        match self {
            SubmissionReceipt::Accepted { charged, .. } => *charged,
            SubmissionReceipt::OutcomeUnknown { charged, .. } => *charged,
            SubmissionReceipt::QueuedLocally { charged, .. } => *charged,
        }
    }
}

/// Tally of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Orders transitioned to `Completed` by this pass.
    pub completed: usize,
    /// Orders transitioned to `Rejected` (and refunded) by this pass.
    pub refunded: usize,
    /// Provider records that matched no tracked order and were skipped.
    pub unmatched: usize,
    /// Orders that raced with another resolver and were left untouched.
    pub already_resolved: usize,
    /// Orders still pending past the stale threshold, flagged for manual review.
    pub stale: usize,
}

impl ReconcileSummary {
    pub fn resolved(&self) -> usize {
        self.completed + self.refunded
    }
}

/// Result of a bulk admin action. Individual failures never abort the batch; they are
/// counted here and left for manual follow-up (no automatic retry).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkActionResult {
    pub succeeded: usize,
    pub failed: usize,
}

/// The exact breakdown reported to a user when their deposit is approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositBreakdown {
    /// Amount submitted, in the native currency of the payment method.
    pub submitted: Money,
    pub method: String,
    /// Commission percentage applied.
    pub commission_pct: f64,
    /// Amount credited to the spendable balance, after conversion and commission.
    pub net_credited: Money,
    pub new_balance: Money,
}
