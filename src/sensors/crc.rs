//! CRC-8 as used by Sensirion humidity sensors.
//!
//! Polynomial 0x31 (x⁸ + x⁵ + x⁴ + 1), initial value 0xFF, MSB first,
//! no reflection, no final XOR.  Each 16-bit data word on the wire is
//! followed by its CRC byte.

use crc::{CRC_8_NRSC_5, Crc};

// Catalogue entry with the Sensirion parameters.
const SENSIRION_CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

pub fn crc8(data: &[u8]) -> u8 {
    SENSIRION_CRC.checksum(data)
}

/// Check one `[msb, lsb, crc]` word and return the 16-bit value.
pub fn checked_word(word: &[u8; 3]) -> Option<u16> {
    (crc8(&word[..2]) == word[2]).then(|| u16::from_be_bytes([word[0], word[1]]))
}
