//! Device discovery for RFXCOM.
//!
//! Two layers:
//!
//! - [`DeviceRegistry`]: every device heard since start-up, keyed by
//!   [`rfxcom_protocol::DeviceKey`]. Pure in-memory state.
//! - [`DeviceRecord`]: the persisted, user-visible device list, with a
//!   representation-tolerant duplicate check ([`is_configured`]).

mod records;
mod registry;

pub use records::*;
pub use registry::*;
