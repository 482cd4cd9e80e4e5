//! Fuzz target: `SystemConfig::from_json`
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - `validate` never panics on whatever the parser accepted
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use irrigator::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SystemConfig::from_json(doc) {
        let _ = config.validate();
    }
});
