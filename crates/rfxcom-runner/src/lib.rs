//! Host for an RFXCOM transceiver.
//!
//! Ties the codec, registry and transports together: listens for devices,
//! keeps the persisted device list up to date and sends switch commands,
//! optionally through an external bridge helper.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod store;

pub use app::{format_devices, listen, pair, process_notices, send};
pub use config::{BridgeSettings, Config, ConnectionSettings, ConnectionType, DEFAULT_DEVICES_FILE};
pub use dispatch::Dispatcher;
pub use error::{Result, RunnerError};
pub use store::{DeviceStore, StoreAction};
