//! Wire contract of the remote decision service.
//!
//! ```text
//!   GET {endpoint}?moisture=<0..100>&light=<0..100>
//!
//!   200 OK
//!   {"needs_watering": true, "message": "soil is dry"}
//! ```
//!
//! Transport lives in `adapters::http_decision`; everything here is pure
//! and host-testable.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DecisionError;

use super::ports::DecisionRequest;

/// Largest response body accepted from the service.
pub const MAX_RESPONSE_BYTES: usize = 2048;

/// The service's verdict for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WateringDecision {
    pub needs_watering: bool,
    /// Free-form explanation, logged verbatim.  Optional: a missing field
    /// and an explicit `null` both read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(de).map(Option::unwrap_or_default)
}

/// Append the two readings as query parameters to `endpoint`.
pub fn build_request_url(endpoint: &str, request: &DecisionRequest) -> String {
    let sep = if endpoint.ends_with('?') || endpoint.ends_with('&') {
        ""
    } else if endpoint.contains('?') {
        "&"
    } else {
        "?"
    };
    format!(
        "{endpoint}{sep}moisture={}&light={}",
        request.moisture.get(),
        request.light.get()
    )
}

/// Turn a status code and raw body into a decision.
///
/// Extra JSON fields are ignored; a missing `message` is an empty string.
pub fn parse_decision_response(status: u16, body: &[u8]) -> Result<WateringDecision, DecisionError> {
    if status != 200 {
        return Err(DecisionError::Status(status));
    }
    if body.len() > MAX_RESPONSE_BYTES {
        return Err(DecisionError::BodyTooLarge);
    }
    serde_json::from_slice(body).map_err(|_| DecisionError::Malformed)
}
