//! Host Commerce Platform Collaborators
//!
//! The gateway never owns orders. It reads and writes them through
//! [`CommerceHost`], which the host platform implements over its own
//! storage. The host is assumed to serialize concurrent updates to the
//! same order at that storage layer.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{GatewayError, Result};

/// Payment lifecycle state of an order, as this subsystem sees it.
///
/// `Completed`, `Failed` and `Cancelled` are terminal here; the host
/// may define further states of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentState {
    AwaitingPayment,
    Completed,
    Failed,
    Cancelled,
}

/// Severity of a notice surfaced to the shopper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Order access and side effects owned by the host platform.
pub trait CommerceHost: Send + Sync {
    /// Total payable for the order.
    fn order_total(&self, order_id: u64) -> Result<Decimal>;

    /// Checkout currency for the order.
    fn order_currency(&self, order_id: u64) -> Result<String>;

    /// Stored processor reference for the order, if any.
    fn reference_number(&self, order_id: u64) -> Result<Option<String>>;

    /// Store (or rotate) the processor reference for the order.
    fn set_reference_number(&self, order_id: u64, reference: &str) -> Result<()>;

    /// Current payment state of the order.
    fn payment_state(&self, order_id: u64) -> Result<PaymentState>;

    /// Mark the order paid. `status_override` is the operator-chosen
    /// completion status, when one is configured.
    fn complete_payment(&self, order_id: u64, status_override: Option<&str>) -> Result<()>;

    /// Move the order to a failed or cancelled state with a reason.
    fn set_payment_state(&self, order_id: u64, state: PaymentState, note: &str) -> Result<()>;

    /// Decrement stock for the order's line items.
    fn decrement_stock(&self, order_id: u64) -> Result<()>;

    /// Empty the shopper's cart after a successful initiation.
    fn clear_cart(&self, order_id: u64) -> Result<()>;

    /// Surface a notice to the shopper.
    fn add_notice(&self, level: NoticeLevel, message: &str);

    /// Receipt page for a paid order.
    fn return_url(&self, order_id: u64) -> String;

    /// Page where the shopper can retry payment for the order.
    fn payment_retry_url(&self, order_id: u64) -> String;

    /// Callback URL the processor should send the shopper back to.
    fn callback_url(&self, order_id: u64) -> String;

    /// Store landing page, used when a callback names no known order.
    fn store_url(&self) -> String;
}

/// A host-side order as the gateway sees it.
#[derive(Clone, Debug)]
pub struct OrderRecord {
    pub total: Decimal,
    pub currency: String,
    pub state: PaymentState,
    pub reference_number: Option<String>,
    /// How many times stock was decremented; the reconciler must keep
    /// this at most 1.
    pub stock_decrements: u32,
    pub cart_cleared: bool,
    /// Reason attached to the last state change.
    pub status_note: Option<String>,
    /// Completion status actually applied, override included.
    pub completion_status: Option<String>,
}

impl OrderRecord {
    fn new(total: Decimal, currency: String) -> Self {
        Self {
            total,
            currency,
            state: PaymentState::AwaitingPayment,
            reference_number: None,
            stock_decrements: 0,
            cart_cleared: false,
            status_note: None,
            completion_status: None,
        }
    }
}

/// In-memory host (for tests and the demo server).
pub struct MemoryCommerceHost {
    orders: RwLock<HashMap<u64, OrderRecord>>,
    notices: RwLock<Vec<(NoticeLevel, String)>>,
    base_url: String,
}

impl MemoryCommerceHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            notices: RwLock::new(Vec::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Register an order awaiting payment.
    pub fn insert_order(&self, order_id: u64, total: Decimal, currency: impl Into<String>) {
        let mut orders = self.orders.write().unwrap();
        orders.insert(order_id, OrderRecord::new(total, currency.into()));
    }

    /// Snapshot of an order, if it exists.
    pub fn order(&self, order_id: u64) -> Option<OrderRecord> {
        let orders = self.orders.read().unwrap();
        orders.get(&order_id).cloned()
    }

    /// All notices emitted so far.
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.read().unwrap().clone()
    }

    fn with_order<T>(&self, order_id: u64, f: impl FnOnce(&mut OrderRecord) -> T) -> Result<T> {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(&order_id)
            .ok_or_else(|| GatewayError::Host(format!("order {order_id} not found")))?;
        Ok(f(order))
    }

    fn read_order<T>(&self, order_id: u64, f: impl FnOnce(&OrderRecord) -> T) -> Result<T> {
        let orders = self.orders.read().unwrap();
        let order = orders
            .get(&order_id)
            .ok_or_else(|| GatewayError::Host(format!("order {order_id} not found")))?;
        Ok(f(order))
    }
}

impl CommerceHost for MemoryCommerceHost {
    fn order_total(&self, order_id: u64) -> Result<Decimal> {
        self.read_order(order_id, |order| order.total)
    }

    fn order_currency(&self, order_id: u64) -> Result<String> {
        self.read_order(order_id, |order| order.currency.clone())
    }

    fn reference_number(&self, order_id: u64) -> Result<Option<String>> {
        self.read_order(order_id, |order| order.reference_number.clone())
    }

    fn set_reference_number(&self, order_id: u64, reference: &str) -> Result<()> {
        self.with_order(order_id, |order| {
            order.reference_number = Some(reference.to_string());
        })
    }

    fn payment_state(&self, order_id: u64) -> Result<PaymentState> {
        self.read_order(order_id, |order| order.state.clone())
    }

    fn complete_payment(&self, order_id: u64, status_override: Option<&str>) -> Result<()> {
        self.with_order(order_id, |order| {
            order.state = PaymentState::Completed;
            order.completion_status = Some(status_override.unwrap_or("processing").to_string());
        })
    }

    fn set_payment_state(&self, order_id: u64, state: PaymentState, note: &str) -> Result<()> {
        self.with_order(order_id, |order| {
            order.state = state;
            order.status_note = Some(note.to_string());
        })
    }

    fn decrement_stock(&self, order_id: u64) -> Result<()> {
        self.with_order(order_id, |order| {
            order.stock_decrements += 1;
        })
    }

    fn clear_cart(&self, order_id: u64) -> Result<()> {
        self.with_order(order_id, |order| {
            order.cart_cleared = true;
        })
    }

    fn add_notice(&self, level: NoticeLevel, message: &str) {
        self.notices.write().unwrap().push((level, message.to_string()));
    }

    fn return_url(&self, order_id: u64) -> String {
        format!("{}/order-received/{order_id}", self.base_url)
    }

    fn payment_retry_url(&self, order_id: u64) -> String {
        format!("{}/order-pay/{order_id}", self.base_url)
    }

    fn callback_url(&self, order_id: u64) -> String {
        format!("{}/callback?order={order_id}", self.base_url)
    }

    fn store_url(&self) -> String {
        self.base_url.clone()
    }
}
