//! Remote Client
//!
//! HTTP transport to the payment processor. POST bodies travel as an
//! encrypted `payload` envelope; GET requests carry clear query
//! parameters (status checks hold only a reference number, nothing
//! sensitive). Every request is authenticated with the raw merchant
//! integration key in the `Authorization` header, no scheme prefix.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::PayloadCodec;
use crate::error::{GatewayError, Result};

/// Default processor API root.
pub const DEFAULT_BASE_URL: &str = "https://api.paygate.example/api/payments-engine";

/// Merchant credentials issued by the processor.
///
/// Read-only to the gateway; they belong to host configuration.
#[derive(Clone)]
pub struct Credentials {
    /// Bearer value for the `Authorization` header, sent raw.
    pub integration_key: String,
    /// Shared payload encryption key (16 or 32 bytes).
    pub encryption_key: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// Outcome of a call that made it to the processor and back.
#[derive(Debug)]
pub enum RemoteReply {
    /// 200 with an encrypted `payload`: the decrypted JSON document.
    Success(Value),
    /// 200 with a plaintext `message`: the processor handled the call
    /// and declined it. A business failure, not a transport failure.
    Failure(String),
}

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    payload: &'a str,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    payload: Option<String>,
    message: Option<String>,
}

/// Authenticated HTTP client for the processor API.
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    codec: PayloadCodec,
}

impl RemoteClient {
    /// Create a client against the default processor endpoint.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint root.
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Result<Self> {
        let codec = PayloadCodec::new(&credentials.encryption_key)?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            codec,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Serialize `body`, encrypt it, and POST it inside the envelope.
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<RemoteReply> {
        let json = serde_json::to_string(body)
            .map_err(|e| GatewayError::Remote(format!("request encoding failed: {e}")))?;
        let ciphertext = self.codec.encrypt(&json);
        let envelope = RequestEnvelope {
            payload: &ciphertext,
        };

        let response = self
            .http
            .post(self.endpoint(path))
            .header("Authorization", &self.credentials.integration_key)
            .json(&envelope)
            .send()
            .await?;

        self.decode(response).await
    }

    /// GET with clear-text query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<RemoteReply> {
        let response = self
            .http
            .get(self.endpoint(path))
            .header("Authorization", &self.credentials.integration_key)
            .query(query)
            .send()
            .await?;

        self.decode(response).await
    }

    /// GET a plain JSON body, outside the payload envelope.
    ///
    /// Used for public endpoints such as the active currency list.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.http.get(self.endpoint(path)).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(GatewayError::Remote(format!("processor returned HTTP {status}")));
        }

        Ok(response.json().await?)
    }

    async fn decode(&self, response: reqwest::Response) -> Result<RemoteReply> {
        let status = response.status();
        let body = response.text().await?;
        decode_reply(&self.codec, status, &body)
    }
}

/// Decode a raw processor response into a reply.
///
/// Only HTTP 200 is potentially valid; everything else is a uniform
/// remote error with no 4xx/5xx distinction. On 200, a `payload` field
/// is decrypted into the success document and a bare `message` is a
/// processor-reported failure. A body with neither is malformed.
pub(crate) fn decode_reply(
    codec: &PayloadCodec,
    status: StatusCode,
    body: &str,
) -> Result<RemoteReply> {
    if status != StatusCode::OK {
        return Err(GatewayError::Remote(format!("processor returned HTTP {status}")));
    }

    let envelope: ResponseEnvelope = serde_json::from_str(body)
        .map_err(|e| GatewayError::Remote(format!("malformed response envelope: {e}")))?;

    if let Some(ciphertext) = envelope.payload {
        let plaintext = codec.decrypt(&ciphertext)?;
        let data = serde_json::from_str(&plaintext)
            .map_err(|e| GatewayError::Remote(format!("malformed response payload: {e}")))?;
        return Ok(RemoteReply::Success(data));
    }

    match envelope.message {
        Some(message) => Ok(RemoteReply::Failure(message)),
        None => Err(GatewayError::Remote(
            "response carried neither payload nor message".into(),
        )),
    }
}
