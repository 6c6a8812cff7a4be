use crate::{
    db_types::{DepositRequest, LocalOrder, Money, RemoteOrder},
    traits::DepositBreakdown,
};

/// A remote order reached `Completed`: the fulfillment code (if any) is stored on the
/// order and the owning account should be congratulated.
#[derive(Debug, Clone)]
pub struct OrderCompletedEvent {
    pub order: RemoteOrder,
}

impl OrderCompletedEvent {
    pub fn new(order: RemoteOrder) -> Self {
        Self { order }
    }
}

/// A remote order reached `Rejected` and the charged price was credited back.
#[derive(Debug, Clone)]
pub struct OrderRefundedEvent {
    pub order: RemoteOrder,
    pub refund: Money,
    pub new_balance: Money,
}

/// A purchase could not take the provider path and was queued as a local order for
/// manual fulfillment. Admins want to hear about these promptly.
#[derive(Debug, Clone)]
pub struct PurchaseQueuedEvent {
    pub order: LocalOrder,
}

/// An admin resolved a local order. `refund` is present only for the reject path and
/// carries (refunded amount, new balance).
#[derive(Debug, Clone)]
pub struct LocalOrderDecidedEvent {
    pub order: LocalOrder,
    pub refund: Option<(Money, Money)>,
}

/// An admin decided a deposit request. `breakdown` is present only on approval.
#[derive(Debug, Clone)]
pub struct DepositDecidedEvent {
    pub request: DepositRequest,
    pub breakdown: Option<DepositBreakdown>,
}
