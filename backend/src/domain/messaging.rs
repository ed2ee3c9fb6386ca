//! Queue registry and flat notification payloads.
//!
//! Handlers notify other subsystems by sending a string payload to one of a
//! fixed set of queues. Payloads are flat JSON objects whose keys follow the
//! lowerCamelCase convention regardless of how the source struct named them.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Queues the guide backend publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueueName {
    #[serde(rename = "guide.business.created")]
    BusinessCreated,
    #[serde(rename = "guide.review.submitted")]
    ReviewSubmitted,
    #[serde(rename = "guide.payment.received")]
    PaymentReceived,
    #[serde(rename = "guide.subscription.changed")]
    SubscriptionChanged,
    #[serde(rename = "guide.job-posting.published")]
    JobPostingPublished,
}

impl QueueName {
    /// Wire name of the queue.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BusinessCreated => "guide.business.created",
            Self::ReviewSubmitted => "guide.review.submitted",
            Self::PaymentReceived => "guide.payment.received",
            Self::SubscriptionChanged => "guide.subscription.changed",
            Self::JobPostingPublished => "guide.job-posting.published",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a value cannot be sent as a flat payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("notification payload must be a JSON object")]
    NotAnObject,
    #[error("notification payload field `{key}` is not a scalar")]
    Nested { key: String },
    #[error("failed to encode notification payload: {message}")]
    Encode { message: String },
}

/// Convert `snake_case`, `kebab-case` or `PascalCase` keys to lowerCamelCase.
pub fn to_lower_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = !out.is_empty();
            continue;
        }
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if upper_next {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    out
}

/// Render an object as a flat JSON string with normalised keys.
///
/// # Errors
/// Rejects non-objects and objects holding arrays or nested objects.
pub fn flat_payload(value: &Value) -> Result<String, PayloadError> {
    let Value::Object(fields) = value else {
        return Err(PayloadError::NotAnObject);
    };
    let mut flat = Map::with_capacity(fields.len());
    for (key, field) in fields {
        if field.is_object() || field.is_array() {
            return Err(PayloadError::Nested { key: key.clone() });
        }
        flat.insert(to_lower_camel(key), field.clone());
    }
    serde_json::to_string(&Value::Object(flat)).map_err(|err| PayloadError::Encode {
        message: err.to_string(),
    })
}
