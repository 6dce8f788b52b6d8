//! Gateway Settings
//!
//! Operator configuration supplied by the host settings store.

use crate::error::{GatewayError, Result};
use crate::remote::DEFAULT_BASE_URL;
use crate::transaction::fallback_currencies;

/// Operator-supplied gateway settings.
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    /// Merchant integration key, sent raw in `Authorization`.
    pub integration_key: String,
    /// Shared payload encryption key (16 or 32 bytes).
    pub encryption_key: Vec<u8>,
    /// Currency codes this gateway handles at checkout.
    pub enabled_currencies: Vec<String>,
    /// Optional order status applied instead of the platform default
    /// when payment completes.
    pub completion_status_override: Option<String>,
    /// Processor API root.
    pub base_url: String,
}

impl GatewaySettings {
    /// Settings with both keys set and everything else defaulted.
    pub fn new(integration_key: impl Into<String>, encryption_key: impl Into<Vec<u8>>) -> Self {
        Self {
            integration_key: integration_key.into(),
            encryption_key: encryption_key.into(),
            enabled_currencies: fallback_currencies()
                .into_iter()
                .map(|currency| currency.code)
                .collect(),
            completion_status_override: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read settings from the environment.
    ///
    /// `PAYGATE_INTEGRATION_KEY` and `PAYGATE_ENCRYPTION_KEY` are
    /// required. `PAYGATE_CURRENCIES` (comma-separated codes),
    /// `PAYGATE_COMPLETION_STATUS` and `PAYGATE_BASE_URL` are optional.
    pub fn from_env() -> Result<Self> {
        let integration_key = std::env::var("PAYGATE_INTEGRATION_KEY")
            .map_err(|_| GatewayError::Config("PAYGATE_INTEGRATION_KEY not set".into()))?;
        let encryption_key = std::env::var("PAYGATE_ENCRYPTION_KEY")
            .map_err(|_| GatewayError::Config("PAYGATE_ENCRYPTION_KEY not set".into()))?;

        let mut settings = Self::new(integration_key, encryption_key.into_bytes());

        if let Ok(currencies) = std::env::var("PAYGATE_CURRENCIES") {
            settings.enabled_currencies = currencies
                .split(',')
                .map(|code| code.trim().to_uppercase())
                .filter(|code| !code.is_empty())
                .collect();
        }
        if let Ok(status) = std::env::var("PAYGATE_COMPLETION_STATUS") {
            if !status.is_empty() {
                settings.completion_status_override = Some(status);
            }
        }
        if let Ok(base_url) = std::env::var("PAYGATE_BASE_URL") {
            settings.base_url = base_url;
        }

        Ok(settings)
    }

    /// True when either credential is missing; the gateway cannot be
    /// offered at checkout yet.
    pub fn needs_setup(&self) -> bool {
        self.integration_key.is_empty() || self.encryption_key.is_empty()
    }

    /// Whether the gateway can take a checkout in `currency`.
    pub fn is_available(&self, currency: &str) -> bool {
        !self.needs_setup()
            && self
                .enabled_currencies
                .iter()
                .any(|code| code.eq_ignore_ascii_case(currency))
    }
}
