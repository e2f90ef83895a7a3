//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with RFXCOM frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Protocol name is not in the protocol table.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Length byte outside the accepted range.
    #[error("invalid length byte: {0}")]
    InvalidLength(u8),

    /// Packet type byte that no family uses.
    #[error("unknown packet type: 0x{0:02X}")]
    UnknownPacketType(u8),

    /// Subtype byte not mapped to a protocol within its family.
    #[error("unknown subtype 0x{subtype:02X} for packet type 0x{packet_type:02X}")]
    UnknownSubtype {
        /// Packet type byte of the frame.
        packet_type: u8,
        /// Subtype byte of the frame.
        subtype: u8,
    },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnknownSubtype {
            packet_type: 0x10,
            subtype: 0x7F,
        };
        assert_eq!(err.to_string(), "unknown subtype 0x7F for packet type 0x10");

        let err = ProtocolError::UnsupportedProtocol("ZWAVE".to_string());
        assert!(err.to_string().contains("ZWAVE"));
    }
}
