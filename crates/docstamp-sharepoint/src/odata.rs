//! OData payload shapes
//!
//! SharePoint answers in one of two JSON dialects depending on the `Accept`
//! header and farm version:
//!
//! - light (`odata=nometadata` / `minimalmetadata`): `{"value": [...]}` or the bare entity
//! - verbose: `{"d": {"results": [...]}}` or `{"d": {...}}`
//!
//! The wrappers here accept both so callers deal only in plain values.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A collection in either dialect
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Collection<T> {
    Light { value: Vec<T> },
    Verbose { d: VerboseResults<T> },
}

#[derive(Debug, Deserialize)]
struct VerboseResults<T> {
    results: Vec<T>,
}

/// A single entity in either dialect
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entity<T> {
    Verbose { d: T },
    Light(T),
}

/// Decodes a collection response body
pub fn parse_collection<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, serde_json::Error> {
    Ok(match serde_json::from_slice::<Collection<T>>(body)? {
        Collection::Light { value } => value,
        Collection::Verbose { d } => d.results,
    })
}

/// Decodes a single-entity response body
pub fn parse_entity<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    Ok(match serde_json::from_slice::<Entity<T>>(body)? {
        Entity::Verbose { d } => d,
        Entity::Light(value) => value,
    })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "odata.error", alias = "error")]
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: ErrorMessage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    Localized { value: String },
    Plain(String),
}

/// Extracts the human-readable message from a SharePoint error body
pub fn error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let message = match envelope.error.message {
        ErrorMessage::Localized { value } => value,
        ErrorMessage::Plain(value) => value,
    };
    if message.is_empty() {
        envelope.error.code
    } else {
        Some(message)
    }
}
