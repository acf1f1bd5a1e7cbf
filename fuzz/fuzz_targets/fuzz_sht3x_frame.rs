//! Fuzz target: `sht3x::decode_frame`
//!
//! Arbitrary 6-byte frames must either fail the CRC or decode to values
//! inside the sensor's physical range, and must agree with a word-by-word
//! CRC check.
//!
//! cargo fuzz run fuzz_sht3x_frame

#![no_main]

use envnode::sensors::crc::checked_word;
use envnode::sensors::sht3x::{FRAME_LEN, decode_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <[u8; FRAME_LEN]>::try_from(data) else {
        return;
    };

    let words_ok = checked_word(&[frame[0], frame[1], frame[2]]).is_some()
        && checked_word(&[frame[3], frame[4], frame[5]]).is_some();

    match decode_frame(&frame, 0) {
        Ok(r) => {
            assert!(words_ok, "decoded a frame with a bad CRC");
            assert!((-45.0..=130.0).contains(&r.temperature_celsius));
            assert!((0.0..=100.0).contains(&r.humidity_percent_rh));
        }
        Err(_) => assert!(!words_ok, "rejected a frame with valid CRCs"),
    }
});
