//! Fuzz target: `command_json::parse_command`
//!
//! The inbound command parser sees untrusted network payloads.  It must
//! never panic, and anything it accepts must re-encode to the canonical
//! lowercase status shape and parse back to the same command.
//!
//! cargo fuzz run fuzz_command_json

#![no_main]

use envnode::adapters::command_json::{encode_status, parse_command};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cmd) = parse_command(data) {
        let canonical = encode_status(cmd.device_class, cmd.desired_state)
            .expect("status payload always encodes");
        assert_eq!(parse_command(canonical.as_bytes()), Ok(cmd));
    }
});
