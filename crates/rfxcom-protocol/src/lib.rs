//! RFXCOM transceiver packet codec.
//!
//! This crate converts between named device protocols and the binary frames
//! exchanged with an RFXCOM RF transceiver. It performs no I/O.
//!
//! # Protocol Overview
//!
//! Every frame is prefixed with a length byte (`total length - 1`) followed by
//! a packet type byte selecting the layout family:
//!
//! - **Lighting1..Lighting6** (`0x10..=0x15`): ON/OFF switch commands, both
//!   directions
//! - **TempHum** (`0x52`): temperature/humidity sensor reports, inbound only
//!
//! Most families carry a subtype byte that picks the concrete protocol
//! (e.g. ARC vs X10 within Lighting1). See [`PROTOCOLS`] for the full table.
//!
//! # Example
//!
//! ```rust
//! use rfxcom_protocol::{decode, CommandEncoder, CommandRequest, DecodedEvent, SwitchCommand};
//!
//! let mut encoder = CommandEncoder::new();
//! let request = CommandRequest::new("ARC", SwitchCommand::On)
//!     .with_house_code("A")
//!     .with_unit_code("1");
//! let frame = encoder.encode(&request).unwrap();
//! assert_eq!(frame[0] as usize, frame.len() - 1);
//!
//! match decode(&frame) {
//!     Some(DecodedEvent::Command(event)) => assert_eq!(event.command, SwitchCommand::On),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

mod commands;
mod constants;
mod error;
mod events;
mod frame;
mod protocol;
mod sequence;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use protocol::*;
pub use sequence::*;
pub use types::*;
