//! Fuzz target for introduction message decoding.
//!
//! Tests that arbitrary message bodies never panic the decoder.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vouch_protocol::message;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        // Plain text is Ok(None), malformed introductions are Err
        if let Ok(Some(payloads)) = message::decode(body) {
            // Re-encoding may exceed the size limit, but must never change
            // the payloads
            if let Ok(encoded) = message::encode(&payloads) {
                let decoded = message::decode(&encoded).unwrap();
                assert_eq!(decoded, Some(payloads));
            }
        }
    }
});
