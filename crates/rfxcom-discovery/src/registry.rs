//! Deduplicating table of devices heard on the air.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rfxcom_protocol::{DecodedEvent, DeviceKey};
use tracing::{debug, info};

/// Result of observing one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryOutcome {
    /// First observation of this key.
    Inserted(DeviceKey),
    /// The key was already known; its entry now holds the latest event.
    Updated(DeviceKey),
}

impl RegistryOutcome {
    /// The key that was observed.
    pub fn key(&self) -> &DeviceKey {
        match self {
            RegistryOutcome::Inserted(key) | RegistryOutcome::Updated(key) => key,
        }
    }

    /// Whether this was a first observation.
    pub fn is_inserted(&self) -> bool {
        matches!(self, RegistryOutcome::Inserted(_))
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    /// Registry key.
    pub key: DeviceKey,
    /// Most recent event for this device.
    pub last_event: DecodedEvent,
    /// When the device was first heard.
    pub first_seen: DateTime<Utc>,
    /// When the device was last heard.
    pub last_seen: DateTime<Utc>,
    /// Number of observations.
    pub times_seen: u64,
}

/// Devices heard since start-up (or the last [`DeviceRegistry::reset`]).
///
/// The registry has a single writer: the receive loop. It decides nothing
/// about persistence; [`RegistryOutcome::Inserted`] is the signal consumers
/// use to decide whether to register a device.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceKey, DiscoveredDevice>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, timestamped now.
    pub fn observe(&mut self, event: DecodedEvent) -> RegistryOutcome {
        self.observe_at(event, Utc::now())
    }

    /// Record an event with an explicit timestamp.
    pub fn observe_at(&mut self, event: DecodedEvent, at: DateTime<Utc>) -> RegistryOutcome {
        let key = event.key();

        if let Some(device) = self.devices.get_mut(&key) {
            device.last_event = event;
            device.last_seen = at;
            device.times_seen += 1;
            debug!(device = %key, times_seen = device.times_seen, "device updated");
            return RegistryOutcome::Updated(key);
        }

        info!(device = %key, "new device discovered");
        self.devices.insert(
            key.clone(),
            DiscoveredDevice {
                key: key.clone(),
                last_event: event,
                first_seen: at,
                last_seen: at,
                times_seen: 1,
            },
        );
        RegistryOutcome::Inserted(key)
    }

    /// Look up a device.
    pub fn get(&self, key: &DeviceKey) -> Option<&DiscoveredDevice> {
        self.devices.get(key)
    }

    /// All devices, ordered by key.
    pub fn devices(&self) -> Vec<&DiscoveredDevice> {
        let mut devices: Vec<_> = self.devices.values().collect();
        devices.sort_by(|a, b| a.key.cmp(&b.key));
        devices
    }

    /// Number of known devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device has been heard.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Forget every device.
    pub fn reset(&mut self) {
        self.devices.clear();
    }
}
