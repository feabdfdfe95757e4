//! Fuzz target for ServiceId parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vouch_identity::ServiceId;

fuzz_target!(|data: &[u8]| {
    if let Ok(id) = ServiceId::from_binary(data) {
        assert_eq!(ServiceId::from_binary(&id.to_binary()).unwrap(), id);
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(id) = ServiceId::parse(s) {
            assert_eq!(ServiceId::parse(&id.to_string()).unwrap(), id);
        }
    }
});
