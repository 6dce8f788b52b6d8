//! Transaction Lifecycle
//!
//! Initiating hosted transactions and checking their status against
//! the processor API, plus the mapping from remote status strings to
//! domain outcomes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::remote::{RemoteClient, RemoteReply};

const INITIATE_PATH: &str = "v1/payments/initiate";
const CHECK_PAYMENT_PATH: &str = "v1/payments/check-payment";
const ACTIVE_CURRENCIES_PATH: &str = "v1/currencies/active";

/// Used when the processor reports a failure without saying why.
const NO_DESCRIPTION: &str = "The processor did not provide a failure description";

/// A single checkout attempt to run through the processor.
///
/// Built per submission and never persisted; the host keeps only the
/// resulting reference number.
#[derive(Clone, Debug)]
pub struct TransactionRequest {
    pub amount: Decimal,
    pub currency_code: String,
    pub reason_for_payment: String,
    /// Where the processor sends the shopper back after payment.
    pub return_url: String,
    /// Where the processor reports the result.
    pub result_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateBody<'a> {
    amount_details: AmountDetails<'a>,
    reason_for_payment: &'a str,
    result_url: &'a str,
    return_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AmountDetails<'a> {
    amount: Decimal,
    currency_code: &'a str,
}

/// Processor-issued handle for a transaction.
///
/// Created once per order at initiation and stored by the host; reused
/// as the lookup key for every later status check.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReference {
    pub reference_number: String,
    /// Hosted payment page; present only on a fresh initiation.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Remote transaction status codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Failed,
    Cancelled,
    /// Any code this integration does not know; reconciled as a
    /// failure, never left pending.
    Other(String),
}

impl TransactionStatus {
    /// Parse a wire status string, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Wire shape of a status document, as the processor returns it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusDocument {
    reference_number: Option<String>,
    transaction_status: Option<String>,
    transaction_status_description: Option<String>,
}

/// Fresh result of one status check.
///
/// Translated into an order-state transition and discarded, never
/// persisted directly.
#[derive(Clone, Debug)]
pub struct TransactionStatusOutcome {
    /// The (possibly rotated) reference the processor now knows the
    /// transaction by.
    pub reference_number: Option<String>,
    pub status: TransactionStatus,
    pub description: String,
}

/// Processor currency entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
}

/// Static fallback when the processor's currency endpoint is down.
pub fn fallback_currencies() -> Vec<Currency> {
    vec![
        Currency {
            code: "USD".into(),
            name: "United States Dollar".into(),
        },
        Currency {
            code: "ZWL".into(),
            name: "Zimbabwe Dollar".into(),
        },
    ]
}

/// Processor operations the checkout layer depends on.
///
/// Implement this for each processor backend; tests use a scripted
/// mock.
#[async_trait]
pub trait ProcessorApi: Send + Sync {
    /// Start a hosted transaction, yielding the reference and the
    /// redirect target for the shopper.
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionReference>;

    /// Look up the current status of a previously initiated
    /// transaction. Single-shot; callers decide whether to resubmit.
    async fn check_transaction_status(
        &self,
        reference_number: &str,
    ) -> Result<TransactionStatusOutcome>;
}

/// Live implementation over the processor HTTP API.
pub struct TransactionService {
    remote: RemoteClient,
}

impl TransactionService {
    pub fn new(remote: RemoteClient) -> Self {
        Self { remote }
    }

    /// Currencies the processor currently accepts.
    ///
    /// Falls back to a static pair when the endpoint is unreachable,
    /// so gateway availability checks always have something to work
    /// with.
    pub async fn active_currencies(&self) -> Vec<Currency> {
        match self.remote.get_json(ACTIVE_CURRENCIES_PATH).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("malformed currency list, using fallback: {e}");
                fallback_currencies()
            }),
            Err(e) => {
                tracing::warn!("currency lookup failed, using fallback: {e}");
                fallback_currencies()
            }
        }
    }
}

#[async_trait]
impl ProcessorApi for TransactionService {
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionReference> {
        let body = InitiateBody {
            amount_details: AmountDetails {
                amount: request.amount,
                currency_code: &request.currency_code,
            },
            reason_for_payment: &request.reason_for_payment,
            result_url: &request.result_url,
            return_url: &request.return_url,
        };

        match self.remote.post(INITIATE_PATH, &body).await? {
            RemoteReply::Success(data) => {
                let reference: TransactionReference = serde_json::from_value(data)
                    .map_err(|e| GatewayError::Remote(format!("malformed initiation response: {e}")))?;
                tracing::debug!(reference = %reference.reference_number, "transaction initiated");
                Ok(reference)
            }
            RemoteReply::Failure(message) => {
                Err(GatewayError::Business(failure_description(&message)))
            }
        }
    }

    async fn check_transaction_status(
        &self,
        reference_number: &str,
    ) -> Result<TransactionStatusOutcome> {
        let reply = self
            .remote
            .get(CHECK_PAYMENT_PATH, &[("referenceNumber", reference_number)])
            .await?;

        match reply {
            RemoteReply::Success(data) => {
                let document: StatusDocument = serde_json::from_value(data)
                    .map_err(|e| GatewayError::Remote(format!("malformed status response: {e}")))?;

                let status = document
                    .transaction_status
                    .as_deref()
                    .map(TransactionStatus::parse)
                    .unwrap_or_else(|| TransactionStatus::Other("MISSING".into()));

                Ok(TransactionStatusOutcome {
                    reference_number: document.reference_number,
                    status,
                    description: document
                        .transaction_status_description
                        .unwrap_or_default(),
                })
            }
            RemoteReply::Failure(message) => {
                Err(GatewayError::Business(failure_description(&message)))
            }
        }
    }
}

/// Extract the human-readable reason from a processor failure message.
///
/// Some processor paths nest the reason in a JSON document under
/// `transactionStatusDescription`; others send a bare string; a few
/// send nothing usable at all.
fn failure_description(message: &str) -> String {
    if let Ok(document) = serde_json::from_str::<StatusDocument>(message) {
        if let Some(description) = document.transaction_status_description {
            return description;
        }
    }

    if message.trim().is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        message.to_string()
    }
}
