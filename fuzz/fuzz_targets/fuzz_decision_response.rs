//! Fuzz target: `parse_decision_response`
//!
//! Feeds arbitrary bytes to the decision-service response parser, the
//! only surface where untrusted network data enters the firmware.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Bodies over `MAX_RESPONSE_BYTES` are always `BodyTooLarge`
//! - A parsed decision re-serialises and parses back to the same value
//!
//! cargo fuzz run fuzz_decision_response

#![no_main]

use irrigator::app::decision::{MAX_RESPONSE_BYTES, parse_decision_response};
use irrigator::error::DecisionError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let result = parse_decision_response(200, data);

    if data.len() > MAX_RESPONSE_BYTES {
        assert_eq!(result, Err(DecisionError::BodyTooLarge));
        return;
    }

    if let Ok(decision) = result {
        let json = serde_json::to_vec(&decision).expect("decision serialises");
        assert_eq!(parse_decision_response(200, &json), Ok(decision));
    }
});
