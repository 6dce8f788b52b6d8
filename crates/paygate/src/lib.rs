//! # paygate
//!
//! Hosted payment gateway integration: initiate a remotely hosted
//! transaction, redirect the shopper to the processor's payment page,
//! and reconcile the final status through a callback.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐  initiate   ┌─────────────┐  redirect  ┌─────────────┐
//! │ Checkout │────────────▶│  Processor  │───────────▶│ Hosted Page │
//! └──────────┘             └─────────────┘            └──────┬──────┘
//!                                                            │ callback
//! ┌──────────┐  reconcile  ┌─────────────┐                   │
//! │ Receipt  │◀────────────│  Gateway    │◀──────────────────┘
//! └──────────┘             └─────────────┘
//! ```
//!
//! Payloads exchanged with the processor travel AES-256-CBC encrypted
//! inside a `{"payload": ...}` envelope; the IV is derived from the
//! shared key so both ends can reproduce it. Status callbacks may
//! arrive repeatedly or out of order, so reconciliation is idempotent:
//! completion side effects (stock decrement, receipt redirect) are
//! gated on the order's stored state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paygate::{
//!     CheckoutGateway, Credentials, GatewaySettings, MemoryCommerceHost,
//!     RemoteClient, TransactionService,
//! };
//!
//! let settings = GatewaySettings::from_env()?;
//! let remote = RemoteClient::with_base_url(
//!     Credentials {
//!         integration_key: settings.integration_key.clone(),
//!         encryption_key: settings.encryption_key.clone(),
//!     },
//!     settings.base_url.clone(),
//! )?;
//!
//! let gateway = CheckoutGateway::new(TransactionService::new(remote), host, settings);
//!
//! // Checkout submission: redirect the shopper to the hosted page.
//! let outcome = gateway.initiate_payment_for_order(order_id).await?;
//!
//! // Processor callback: reconcile and redirect, always.
//! let target = gateway.handle_callback(order_id).await;
//! ```
//!
//! Orders themselves are owned by the host commerce platform and
//! accessed through the [`CommerceHost`] trait; this crate never
//! persists anything.

mod checkout;
mod crypto;
mod error;
mod host;
mod remote;
mod settings;
mod transaction;

pub use checkout::{CheckoutGateway, CheckoutOutcome};
pub use crypto::{PayloadCodec, CANONICAL_KEY_LENGTH, MIN_KEY_LENGTH};
pub use error::{CryptoError, GatewayError, Result};
pub use host::{CommerceHost, MemoryCommerceHost, NoticeLevel, OrderRecord, PaymentState};
pub use remote::{Credentials, RemoteClient, RemoteReply, DEFAULT_BASE_URL};
pub use settings::GatewaySettings;
pub use transaction::{
    fallback_currencies, Currency, ProcessorApi, TransactionReference, TransactionRequest,
    TransactionService, TransactionStatus, TransactionStatusOutcome,
};
