use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use sfb_common::Money;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------      Account      -----------------------------------------------------------
/// A wallet account, keyed by the chat-platform user id.
///
/// `balance` is the spendable balance and is never negative. `total_deposited` is a
/// lifetime counter used for reporting only; it is bumped alongside deposit credits but
/// is not spendable itself. All mutations of either field go through the ledger.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub balance: Money,
    pub total_deposited: Money,
    pub banned: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// Lifecycle status shared by local and remote orders. `Completed` and `Rejected` are
/// terminal; no further transition is permitted out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    Pending,
    Completed,
    Rejected,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

//--------------------------------------      OrderId      -----------------------------------------------------------
/// Short, globally unique identifier for locally fulfilled orders and deposit requests.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  ProductSnapshot  -----------------------------------------------------------
/// The slice of catalog data captured at purchase time. Orders keep their own copy so
/// that later catalog refreshes cannot change what a customer was charged for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub unit_price: Money,
    /// Names of the input fields the purchase flow collects, in prompt order.
    pub param_names: Vec<String>,
}

//--------------------------------------     LocalOrder    -----------------------------------------------------------
/// A purchase fulfilled manually by staff, created when the provider path is
/// unavailable or the product has no provider path. Mutated only by an admin terminal
/// action, and retained indefinitely for audit.
#[derive(Debug, Clone, FromRow)]
pub struct LocalOrder {
    pub id: i64,
    pub order_id: OrderId,
    pub account_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// JSON-encoded list of the input fields collected during the purchase flow.
    pub inputs: String,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalOrder {
    pub fn total_price(&self) -> Money {
        self.unit_price * self.quantity
    }

    pub fn inputs(&self) -> Vec<String> {
        serde_json::from_str(&self.inputs).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct NewLocalOrder {
    pub order_id: OrderId,
    pub account_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub inputs: Vec<String>,
}

//--------------------------------------    RemoteOrder    -----------------------------------------------------------
/// A purchase forwarded to the external fulfillment provider.
///
/// The record is reserved (status `Pending`) *before* the submission network call goes
/// out, so a crash mid-call can never leave a debited purchase without a tracking
/// record. `correlation_id` is the primary reconciliation key; `provider_order_id` is a
/// secondary key learned from the provider's acceptance response. The `notified` flag
/// latches together with the terminal status so that the terminal notification and
/// balance effect occur at most once.
#[derive(Debug, Clone, FromRow)]
pub struct RemoteOrder {
    pub id: i64,
    pub correlation_id: String,
    pub provider_order_id: Option<String>,
    pub account_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub charged_price: Money,
    pub status: OrderStatusType,
    pub fulfillment_code: Option<String>,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRemoteOrder {
    pub correlation_id: String,
    pub account_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub charged_price: Money,
}

//-------------------------------------- DepositStatusType ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DepositStatusType {
    Pending,
    Approved,
    Rejected,
}

impl Display for DepositStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepositStatusType::Pending => write!(f, "Pending"),
            DepositStatusType::Approved => write!(f, "Approved"),
            DepositStatusType::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for DepositStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid deposit status: {s}"))),
        }
    }
}

//--------------------------------------  DepositRequest   -----------------------------------------------------------
/// A user-submitted top-up request, terminated by an admin decision. The submitted
/// amount is denominated in the native currency of the payment method; conversion to
/// spendable currency happens at approval time using the exchange rate in force then.
#[derive(Debug, Clone, FromRow)]
pub struct DepositRequest {
    pub id: i64,
    pub request_id: OrderId,
    pub account_id: i64,
    pub method: String,
    pub txn_reference: String,
    pub amount: Money,
    pub proof_ref: Option<String>,
    pub status: DepositStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDepositRequest {
    pub request_id: OrderId,
    pub account_id: i64,
    pub method: String,
    pub txn_reference: String,
    pub amount: Money,
    pub proof_ref: Option<String>,
}
