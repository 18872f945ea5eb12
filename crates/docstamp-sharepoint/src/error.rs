//! HTTP failure classification
//!
//! Maps transport failures and non-success responses from the SharePoint
//! REST API onto the port-level [`StoreError`].

use std::time::Duration;

use docstamp_core::ports::StoreError;
use reqwest::StatusCode;
use tracing::warn;

use crate::odata;

/// Retry-After fallback when a throttling response carries no usable header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Upper bound accepted for an HTTP-date Retry-After
const MAX_RETRY_AFTER_SECS: u64 = 3600;

/// Classifies a non-success response
///
/// # Arguments
/// * `status` - HTTP status of the response
/// * `retry_after` - Raw `Retry-After` header value, if any
/// * `body` - Response body, used for the error message
pub(crate) fn status_error(status: StatusCode, retry_after: Option<&str>, body: &str) -> StoreError {
    let message = odata::error_message(body)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED => StoreError::Unauthorized(message),
        StatusCode::FORBIDDEN => StoreError::Forbidden(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StoreError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => StoreError::TooManyRequests {
            retry_after: retry_after
                .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                .unwrap_or(DEFAULT_RETRY_AFTER),
        },
        // SharePoint throttles with 503 + Retry-After as well as 429
        StatusCode::SERVICE_UNAVAILABLE if retry_after.is_some() => StoreError::TooManyRequests {
            retry_after: retry_after
                .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                .unwrap_or(DEFAULT_RETRY_AFTER),
        },
        s if s.is_server_error() => StoreError::ServerError(message),
        _ => StoreError::Rejected(message),
    }
}

/// Classifies a failure to send a request or read its response
pub(crate) fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::InvalidResponse(err.to_string())
    } else {
        StoreError::Network(err.to_string())
    }
}

/// Parses a `Retry-After` header value into a [`Duration`]
///
/// Supports both formats defined in RFC 7231:
/// - Delay in seconds (e.g., `"120"`)
/// - HTTP-date (e.g., `"Wed, 21 Oct 2015 07:28:00 GMT"`)
///
/// Returns `default` if the value cannot be parsed or lies in the past.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            if let Some(secs) = (target - now)
                .num_seconds()
                .try_into()
                .ok()
                .filter(|&s: &u64| s <= MAX_RETRY_AFTER_SECS)
            {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
