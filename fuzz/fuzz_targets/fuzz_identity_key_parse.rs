//! Fuzz target for IdentityKey parsing.
//!
//! Tests that arbitrary bytes and base64 text are rejected without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vouch_identity::IdentityKey;

fuzz_target!(|data: &[u8]| {
    if let Ok(key) = IdentityKey::from_bytes(data) {
        assert_eq!(key.serialize().as_slice(), data);
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(key) = IdentityKey::from_base64(s) {
            let roundtrip = IdentityKey::from_base64(&key.to_base64()).unwrap();
            assert_eq!(key, roundtrip);
        }
    }
});
