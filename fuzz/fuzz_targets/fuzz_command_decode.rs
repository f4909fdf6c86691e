//! Fuzzes the host command decoder used by the simulated firmware.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_command_decode
#![no_main]
use itchy_protocol::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(Some(command)) = Command::decode(data) {
        let again = Command::decode(&command.encode());
        assert!(matches!(again, Ok(Some(c)) if c.opcode() == command.opcode()));
    }
});
