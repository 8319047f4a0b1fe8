//! Normalization of the backend's two success-flag conventions.
//!
//! The dashboard endpoint answers `{ "success": bool, "data", "error" }`;
//! the chart endpoints answer `{ "status": "success" | "error", "data" }`.
//! Both collapse into `Result<T, FetchError>` here.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::poll::FetchError;

#[derive(Deserialize)]
struct SuccessEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusEnvelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn malformed(url: &str, message: impl Into<String>) -> FetchError {
    FetchError::Malformed {
        url: url.to_string(),
        message: message.into(),
    }
}

/// Decode a `{ success, data, error }` envelope.
///
/// A false flag becomes [`FetchError::Rejected`] carrying the backend's
/// error text, or `fallback` when it sent none.
pub fn decode_success<T: DeserializeOwned>(
    url: &str,
    body: &[u8],
    fallback: &str,
) -> Result<T, FetchError> {
    let envelope: SuccessEnvelope<T> =
        serde_json::from_slice(body).map_err(|e| malformed(url, e.to_string()))?;

    if !envelope.success {
        return Err(FetchError::Rejected {
            url: url.to_string(),
            message: envelope
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        });
    }

    envelope
        .data
        .ok_or_else(|| malformed(url, "success response without data"))
}

/// Decode a `{ status, data }` envelope. Only `"success"` carries data.
pub fn decode_status<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, FetchError> {
    let envelope: StatusEnvelope<T> =
        serde_json::from_slice(body).map_err(|e| malformed(url, e.to_string()))?;

    if envelope.status != "success" {
        let message = envelope
            .message
            .or(envelope.error)
            .unwrap_or_else(|| format!("status '{}'", envelope.status));
        return Err(FetchError::Rejected {
            url: url.to_string(),
            message,
        });
    }

    envelope
        .data
        .ok_or_else(|| malformed(url, "success response without data"))
}
