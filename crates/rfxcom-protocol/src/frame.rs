//! Frame length rules.
//!
//! Every frame starts with a length byte holding the number of bytes that
//! follow it:
//!
//! ```text
//! +-----+------+-----------+-----+---------+
//! | len | type | (subtype) | seq | payload |
//! +-----+------+-----------+-----+---------+
//! ```
//!
//! A length byte outside `1..=50` is noise. Readers drop it without reading
//! any further bytes for that frame.

use crate::constants::{MAX_LENGTH_BYTE, MIN_LENGTH_BYTE};

/// Largest frame the transceiver can produce, length byte included.
pub const MAX_FRAME_SIZE: usize = MAX_LENGTH_BYTE as usize + 1;

/// Whether `length` is a plausible length byte.
pub fn is_valid_length_byte(length: u8) -> bool {
    (MIN_LENGTH_BYTE..=MAX_LENGTH_BYTE).contains(&length)
}

/// Total frame size announced by a length byte.
pub fn frame_size_for(length: u8) -> usize {
    length as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_byte_range() {
        assert!(!is_valid_length_byte(0));
        assert!(is_valid_length_byte(1));
        assert!(is_valid_length_byte(50));
        assert!(!is_valid_length_byte(51));
        assert!(!is_valid_length_byte(0xFF));
    }

    #[test]
    fn test_frame_size() {
        assert_eq!(frame_size_for(0x07), 8);
        assert_eq!(frame_size_for(MAX_LENGTH_BYTE), MAX_FRAME_SIZE);
    }
}
