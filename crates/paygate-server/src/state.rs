//! Application State

use std::sync::Arc;

use paygate::{CheckoutGateway, MemoryCommerceHost, TransactionService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout entry points, wired to the live processor API.
    pub gateway: Arc<CheckoutGateway<TransactionService, MemoryCommerceHost>>,

    /// In-memory stand-in for the host commerce platform.
    pub host: Arc<MemoryCommerceHost>,
}
