//! Checkout Gateway
//!
//! The two entry points the host platform calls: submitting a checkout
//! (`initiate_payment_for_order`) and receiving a processor callback
//! (`handle_callback`), plus the idempotent reconciliation of remote
//! status outcomes into order-state transitions.

use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::host::{CommerceHost, NoticeLevel, PaymentState};
use crate::settings::GatewaySettings;
use crate::transaction::{ProcessorApi, TransactionRequest, TransactionStatus, TransactionStatusOutcome};

const INITIATE_FAILED: &str =
    "Failed to initiate the transaction on the payment gateway, make sure your credentials are correct";
const STATUS_RETRIEVAL_FAILED: &str = "Error retrieving transaction status";
const PAYMENT_FAILED: &str = "Payment failed on the payment gateway";
const PAYMENT_CANCELLED: &str = "Transaction cancelled on the payment gateway";

/// Result of submitting a checkout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Send the shopper to the processor's hosted payment page.
    Redirect(String),
    /// Initiation failed; a notice was emitted and the host's default
    /// payment path should take over.
    Declined(String),
}

/// Orchestrates checkout submissions and processor callbacks against
/// the host platform.
///
/// Stateless per request: every call is an independent unit of work,
/// and idempotency is gated on the order's stored state rather than on
/// the incoming message.
pub struct CheckoutGateway<A, H> {
    api: A,
    host: Arc<H>,
    settings: GatewaySettings,
}

impl<A: ProcessorApi, H: CommerceHost> CheckoutGateway<A, H> {
    pub fn new(api: A, host: Arc<H>, settings: GatewaySettings) -> Self {
        Self { api, host, settings }
    }

    /// The processor API backing this gateway.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Initiate a hosted transaction for `order_id`.
    ///
    /// On success the reference number is stored against the order,
    /// the cart is cleared, and the shopper should be redirected to
    /// the processor. On any failure the order is left untouched and a
    /// notice is emitted.
    pub async fn initiate_payment_for_order(&self, order_id: u64) -> Result<CheckoutOutcome> {
        let total = self.host.order_total(order_id)?;
        let currency = self.host.order_currency(order_id)?;

        if !self.settings.is_available(&currency) {
            let message = format!("Payment gateway does not handle {currency}");
            self.host.add_notice(NoticeLevel::Error, &message);
            tracing::warn!(order_id, %currency, "checkout in unsupported currency");
            return Ok(CheckoutOutcome::Declined(message));
        }

        let callback = self.host.callback_url(order_id);
        let request = TransactionRequest {
            amount: total,
            currency_code: currency,
            reason_for_payment: format!("Order #: {order_id}"),
            return_url: callback.clone(),
            result_url: callback,
        };

        match self.api.initiate_transaction(&request).await {
            Ok(reference) => {
                self.host.set_reference_number(order_id, &reference.reference_number)?;
                self.host.clear_cart(order_id)?;
                tracing::info!(
                    order_id,
                    reference = %reference.reference_number,
                    "transaction initiated"
                );

                match reference.redirect_url {
                    Some(url) => Ok(CheckoutOutcome::Redirect(url)),
                    None => {
                        // Accepted but no hosted page to send the
                        // shopper to; nothing can proceed.
                        self.host.add_notice(NoticeLevel::Error, INITIATE_FAILED);
                        Ok(CheckoutOutcome::Declined(INITIATE_FAILED.to_string()))
                    }
                }
            }
            Err(err) => {
                let message = err.user_message(INITIATE_FAILED);
                self.host.add_notice(NoticeLevel::Error, &message);
                tracing::warn!(order_id, error = %err, "transaction initiation failed");
                Ok(CheckoutOutcome::Declined(message))
            }
        }
    }

    /// Reconcile a processor callback for `order_id`.
    ///
    /// Always resolves to a redirect target; the shopper is never left
    /// without a destination, whatever went wrong.
    pub async fn handle_callback(&self, order_id: u64) -> String {
        match self.reconcile(order_id).await {
            Ok(url) => url,
            Err(err) => {
                tracing::error!(order_id, error = %err, "callback reconciliation failed");
                self.host.payment_retry_url(order_id)
            }
        }
    }

    async fn reconcile(&self, order_id: u64) -> Result<String> {
        let reference = self.host.reference_number(order_id)?.ok_or_else(|| {
            GatewayError::Host(format!("order {order_id} has no transaction reference"))
        })?;

        match self.api.check_transaction_status(&reference).await {
            Ok(outcome) => self.apply_outcome(order_id, outcome),
            Err(err) => {
                // Business failures carry the processor's wording;
                // remote and crypto failures collapse to a generic
                // description. Either way the order is marked failed
                // and the shopper lands on the retry page.
                let message = err.user_message(STATUS_RETRIEVAL_FAILED);
                self.host.set_payment_state(order_id, PaymentState::Failed, &message)?;
                self.host.add_notice(NoticeLevel::Error, &message);
                tracing::warn!(order_id, error = %err, "status check failed");
                Ok(self.host.payment_retry_url(order_id))
            }
        }
    }

    /// Apply one status outcome to the order. Callbacks repeat, so
    /// every branch must be safe to re-run.
    fn apply_outcome(&self, order_id: u64, outcome: TransactionStatusOutcome) -> Result<String> {
        if let Some(reference) = &outcome.reference_number {
            // The processor may rotate the reference between checks.
            self.host.set_reference_number(order_id, reference)?;
        }

        match outcome.status {
            TransactionStatus::Success => {
                // Completion and its side effects apply exactly once;
                // a repeated SUCCESS callback is a no-op.
                if self.host.payment_state(order_id)? != PaymentState::Completed {
                    self.host.complete_payment(
                        order_id,
                        self.settings.completion_status_override.as_deref(),
                    )?;
                    self.host.decrement_stock(order_id)?;
                    tracing::info!(order_id, "payment completed");
                }
                Ok(self.host.return_url(order_id))
            }
            TransactionStatus::Cancelled => {
                self.host
                    .set_payment_state(order_id, PaymentState::Cancelled, PAYMENT_CANCELLED)?;
                self.host.add_notice(NoticeLevel::Error, PAYMENT_CANCELLED);
                tracing::info!(order_id, "payment cancelled by shopper");
                Ok(self.host.payment_retry_url(order_id))
            }
            TransactionStatus::Failed | TransactionStatus::Other(_) => {
                let message = if outcome.description.is_empty() {
                    PAYMENT_FAILED.to_string()
                } else {
                    outcome.description.clone()
                };
                self.host.set_payment_state(order_id, PaymentState::Failed, &message)?;
                self.host.add_notice(NoticeLevel::Error, &message);
                tracing::warn!(order_id, status = %outcome.status, "payment failed");
                Ok(self.host.payment_retry_url(order_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryCommerceHost;
    use crate::transaction::TransactionReference;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Canned processor behaviour for one call.
    #[derive(Clone)]
    enum Scripted<T> {
        Ok(T),
        Business(String),
        Remote,
    }

    struct MockProcessor {
        initiate: Scripted<TransactionReference>,
        status: Scripted<TransactionStatusOutcome>,
        seen_request: Mutex<Option<TransactionRequest>>,
        seen_reference: Mutex<Option<String>>,
    }

    impl MockProcessor {
        fn new(
            initiate: Scripted<TransactionReference>,
            status: Scripted<TransactionStatusOutcome>,
        ) -> Self {
            Self {
                initiate,
                status,
                seen_request: Mutex::new(None),
                seen_reference: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ProcessorApi for MockProcessor {
        async fn initiate_transaction(
            &self,
            request: &TransactionRequest,
        ) -> Result<TransactionReference> {
            *self.seen_request.lock().unwrap() = Some(request.clone());
            match &self.initiate {
                Scripted::Ok(reference) => Ok(reference.clone()),
                Scripted::Business(message) => Err(GatewayError::Business(message.clone())),
                Scripted::Remote => Err(GatewayError::Remote("processor returned HTTP 500".into())),
            }
        }

        async fn check_transaction_status(
            &self,
            reference_number: &str,
        ) -> Result<TransactionStatusOutcome> {
            *self.seen_reference.lock().unwrap() = Some(reference_number.to_string());
            match &self.status {
                Scripted::Ok(outcome) => Ok(outcome.clone()),
                Scripted::Business(message) => Err(GatewayError::Business(message.clone())),
                Scripted::Remote => Err(GatewayError::Remote("connection refused".into())),
            }
        }
    }

    fn reference(number: &str, redirect: Option<&str>) -> TransactionReference {
        TransactionReference {
            reference_number: number.into(),
            redirect_url: redirect.map(Into::into),
        }
    }

    fn outcome(status: TransactionStatus, reference: Option<&str>, description: &str) -> TransactionStatusOutcome {
        TransactionStatusOutcome {
            reference_number: reference.map(Into::into),
            status,
            description: description.into(),
        }
    }

    fn no_status() -> Scripted<TransactionStatusOutcome> {
        Scripted::Remote
    }

    fn gateway(
        initiate: Scripted<TransactionReference>,
        status: Scripted<TransactionStatusOutcome>,
    ) -> (CheckoutGateway<MockProcessor, MemoryCommerceHost>, Arc<MemoryCommerceHost>) {
        let host = Arc::new(MemoryCommerceHost::new("https://shop.example"));
        host.insert_order(42, dec!(10.00), "USD");

        let settings = GatewaySettings::new("INTEG-KEY", *b"0123456789abcdef0123456789abcdef");
        let gateway = CheckoutGateway::new(MockProcessor::new(initiate, status), host.clone(), settings);
        (gateway, host)
    }

    #[tokio::test]
    async fn test_initiate_stores_reference_and_redirects() {
        let (gateway, host) = gateway(
            Scripted::Ok(reference("REF123", Some("https://pay.example/txn/REF123"))),
            no_status(),
        );

        let result = gateway.initiate_payment_for_order(42).await.unwrap();
        assert_eq!(
            result,
            CheckoutOutcome::Redirect("https://pay.example/txn/REF123".into())
        );

        let order = host.order(42).unwrap();
        assert_eq!(order.reference_number.as_deref(), Some("REF123"));
        assert!(order.cart_cleared);
        assert_eq!(order.state, PaymentState::AwaitingPayment);

        let request = gateway.api.seen_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.amount, dec!(10.00));
        assert_eq!(request.currency_code, "USD");
        assert_eq!(request.reason_for_payment, "Order #: 42");
        assert_eq!(request.return_url, "https://shop.example/callback?order=42");
        assert_eq!(request.result_url, request.return_url);
    }

    #[tokio::test]
    async fn test_initiate_remote_error_leaves_order_untouched() {
        let (gateway, host) = gateway(Scripted::Remote, no_status());

        let result = gateway.initiate_payment_for_order(42).await.unwrap();
        assert_eq!(result, CheckoutOutcome::Declined(INITIATE_FAILED.into()));

        let order = host.order(42).unwrap();
        assert!(order.reference_number.is_none());
        assert!(!order.cart_cleared);
        assert_eq!(order.state, PaymentState::AwaitingPayment);

        let notices = host.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0], (NoticeLevel::Error, INITIATE_FAILED.into()));
    }

    #[tokio::test]
    async fn test_initiate_business_failure_surfaces_description() {
        let (gateway, host) = gateway(
            Scripted::Business("Invalid payment details".into()),
            no_status(),
        );

        let result = gateway.initiate_payment_for_order(42).await.unwrap();
        assert_eq!(result, CheckoutOutcome::Declined("Invalid payment details".into()));
        assert_eq!(
            host.notices()[0],
            (NoticeLevel::Error, "Invalid payment details".into())
        );
    }

    #[tokio::test]
    async fn test_initiate_rejects_disabled_currency() {
        let (gateway, host) = gateway(
            Scripted::Ok(reference("REF123", Some("https://pay.example/x"))),
            no_status(),
        );
        host.insert_order(7, dec!(3.50), "EUR");

        let result = gateway.initiate_payment_for_order(7).await.unwrap();
        assert!(matches!(result, CheckoutOutcome::Declined(_)));
        // The processor must never have been called.
        assert!(gateway.api.seen_request.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_callback_success_completes_exactly_once() {
        let (gateway, host) = gateway(
            no_initiate(),
            Scripted::Ok(outcome(TransactionStatus::Success, Some("REF123"), "")),
        );
        host.set_reference_number(42, "REF123").unwrap();

        let first = gateway.handle_callback(42).await;
        assert_eq!(first, "https://shop.example/order-received/42");

        // The processor repeats the callback.
        let second = gateway.handle_callback(42).await;
        assert_eq!(second, first);

        let order = host.order(42).unwrap();
        assert_eq!(order.state, PaymentState::Completed);
        assert_eq!(order.stock_decrements, 1);
        assert_eq!(gateway.api.seen_reference.lock().unwrap().as_deref(), Some("REF123"));
    }

    #[tokio::test]
    async fn test_callback_applies_completion_status_override() {
        let host = Arc::new(MemoryCommerceHost::new("https://shop.example"));
        host.insert_order(42, dec!(10.00), "USD");
        host.set_reference_number(42, "REF123").unwrap();

        let mut settings = GatewaySettings::new("INTEG-KEY", *b"0123456789abcdef0123456789abcdef");
        settings.completion_status_override = Some("shipped".into());

        let api = MockProcessor::new(
            no_initiate(),
            Scripted::Ok(outcome(TransactionStatus::Success, None, "")),
        );
        let gateway = CheckoutGateway::new(api, host.clone(), settings);

        gateway.handle_callback(42).await;
        assert_eq!(host.order(42).unwrap().completion_status.as_deref(), Some("shipped"));
    }

    #[tokio::test]
    async fn test_callback_rotates_reference_number() {
        let (gateway, host) = gateway(
            no_initiate(),
            Scripted::Ok(outcome(TransactionStatus::Success, Some("REF456"), "")),
        );
        host.set_reference_number(42, "REF123").unwrap();

        gateway.handle_callback(42).await;
        assert_eq!(host.order(42).unwrap().reference_number.as_deref(), Some("REF456"));
    }

    #[tokio::test]
    async fn test_callback_cancelled_keeps_stock() {
        let (gateway, host) = gateway(
            no_initiate(),
            Scripted::Ok(outcome(TransactionStatus::Cancelled, Some("REF123"), "")),
        );
        host.set_reference_number(42, "REF123").unwrap();

        let target = gateway.handle_callback(42).await;
        assert_eq!(target, "https://shop.example/order-pay/42");

        let order = host.order(42).unwrap();
        assert_eq!(order.state, PaymentState::Cancelled);
        assert_eq!(order.stock_decrements, 0);
        assert_eq!(host.notices()[0], (NoticeLevel::Error, PAYMENT_CANCELLED.into()));
    }

    #[tokio::test]
    async fn test_callback_failed_uses_processor_description() {
        let (gateway, host) = gateway(
            no_initiate(),
            Scripted::Ok(outcome(
                TransactionStatus::Failed,
                Some("REF123"),
                "Card declined by issuer",
            )),
        );
        host.set_reference_number(42, "REF123").unwrap();

        gateway.handle_callback(42).await;
        let order = host.order(42).unwrap();
        assert_eq!(order.state, PaymentState::Failed);
        assert_eq!(order.status_note.as_deref(), Some("Card declined by issuer"));
    }

    #[tokio::test]
    async fn test_callback_unknown_status_never_stays_pending() {
        let (gateway, host) = gateway(
            no_initiate(),
            Scripted::Ok(outcome(TransactionStatus::Other("ON_HOLD".into()), None, "")),
        );
        host.set_reference_number(42, "REF123").unwrap();

        let target = gateway.handle_callback(42).await;
        assert_eq!(target, "https://shop.example/order-pay/42");

        let order = host.order(42).unwrap();
        assert_eq!(order.state, PaymentState::Failed);
        assert_eq!(order.status_note.as_deref(), Some(PAYMENT_FAILED));
    }

    #[tokio::test]
    async fn test_callback_business_failure_is_verbatim() {
        let (gateway, host) = gateway(no_initiate(), Scripted::Business("insufficient funds".into()));
        host.set_reference_number(42, "REF123").unwrap();

        gateway.handle_callback(42).await;
        let order = host.order(42).unwrap();
        assert_eq!(order.state, PaymentState::Failed);
        assert_eq!(order.status_note.as_deref(), Some("insufficient funds"));
    }

    #[tokio::test]
    async fn test_callback_remote_error_is_generic() {
        let (gateway, host) = gateway(no_initiate(), Scripted::Remote);
        host.set_reference_number(42, "REF123").unwrap();

        let target = gateway.handle_callback(42).await;
        assert_eq!(target, "https://shop.example/order-pay/42");

        let order = host.order(42).unwrap();
        assert_eq!(order.state, PaymentState::Failed);
        assert_eq!(order.status_note.as_deref(), Some(STATUS_RETRIEVAL_FAILED));
    }

    #[tokio::test]
    async fn test_callback_without_reference_still_redirects() {
        let (gateway, host) = gateway(no_initiate(), no_status());

        let target = gateway.handle_callback(42).await;
        assert_eq!(target, "https://shop.example/order-pay/42");
        // No status was known, so the order must not have moved.
        assert_eq!(host.order(42).unwrap().state, PaymentState::AwaitingPayment);
    }

    fn no_initiate() -> Scripted<TransactionReference> {
        Scripted::Remote
    }
}
