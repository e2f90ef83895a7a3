//! Async link to an RFXCOM transceiver.
//!
//! - [`Connection`]: serial or TCP transport, split into reader and writer
//! - [`Receiver`]: background task turning inbound frames into registry
//!   updates and [`DeviceNotice`]s
//! - [`CommandSender`]: outbound commands, either encoded in-process
//!   ([`TransceiverSender`]) or delegated to an external helper
//!   ([`BridgeSender`])

mod bridge;
mod connection;
mod error;
mod receiver;
mod sender;

pub use bridge::*;
pub use connection::*;
pub use error::*;
pub use receiver::*;
pub use sender::*;
