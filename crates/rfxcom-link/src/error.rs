//! Error types for the link crate.

use std::time::Duration;

use rfxcom_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur talking to the transceiver or the command bridge.
#[derive(Debug, Error)]
pub enum LinkError {
    /// I/O error on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Request could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The bridge reported a failure or misbehaved.
    #[error("bridge error: {0}")]
    Bridge(String),

    /// The bridge did not answer in time.
    #[error("bridge did not answer within {0:?}")]
    BridgeTimeout(Duration),

    /// The bridge sent a line that is not valid JSON.
    #[error("bridge message error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bridge has not been initialized or was closed.
    #[error("not connected")]
    NotConnected,
}

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;
