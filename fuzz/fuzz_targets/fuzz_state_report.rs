//! Fuzzes the device state report decoder.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_state_report
#![no_main]
use itchy_protocol::{DeviceState, STATE_PAYLOAD_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must never panic; short reports are rejected.
    match DeviceState::parse(data) {
        Ok(state) => {
            // Re-encoding a decoded report reproduces its payload bytes,
            // except the padding after the button byte.
            let encoded = state.encode();
            assert_eq!(encoded[..25], data[..25]);
            assert_eq!(encoded[28..STATE_PAYLOAD_LEN], data[28..STATE_PAYLOAD_LEN]);
        }
        Err(_) => assert!(data.len() < STATE_PAYLOAD_LEN),
    }
});
