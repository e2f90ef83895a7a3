//! Persisted device list.
//!
//! The store is the only writer of the devices file. It turns registry
//! notices into registrations (when auto-registration is on) and keeps the
//! latest sensor readings of configured sensors in memory.

use std::path::{Path, PathBuf};

use rfxcom_discovery::{DeviceRecord, RegistryOutcome, SensorSnapshot};
use rfxcom_link::DeviceNotice;
use tracing::{debug, info};

use crate::error::Result;

/// What [`DeviceStore::handle`] did with a notice.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// A new device was appended and the file rewritten.
    Registered(DeviceRecord),
    /// A configured sensor's reading was refreshed (not written to disk).
    SensorRefreshed(DeviceRecord),
    Ignored,
}

/// Device list backed by a YAML file.
#[derive(Debug)]
pub struct DeviceStore {
    path: PathBuf,
    records: Vec<DeviceRecord>,
}

impl DeviceStore {
    /// Load the list. A missing or empty file is an empty list.
    pub fn load(path: impl AsRef<Path>) -> Result<DeviceStore> {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_yaml::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), devices = records.len(), "device list loaded");
        Ok(DeviceStore { path, records })
    }

    /// Write the list, replacing the file atomically.
    pub async fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.records)?;
        let tmp = self.path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, yaml).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), devices = self.records.len(), "device list saved");
        Ok(())
    }

    /// Configured devices.
    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// File backing the list.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// React to one registry notice.
    ///
    /// - a newly heard device that is not configured yet is registered when
    ///   `auto_registry` is set
    /// - a sensor report for a configured sensor refreshes its reading
    pub async fn handle(&mut self, notice: &DeviceNotice, auto_registry: bool) -> Result<StoreAction> {
        let event = &notice.device.last_event;

        if let Some(sensor) = event.as_sensor() {
            if let Some(record) = self.records.iter_mut().find(|r| r.matches(event)) {
                record.sensor_data = Some(SensorSnapshot::from_event(sensor, notice.device.last_seen));
                return Ok(StoreAction::SensorRefreshed(record.clone()));
            }
        }

        let RegistryOutcome::Inserted(key) = &notice.outcome else {
            return Ok(StoreAction::Ignored);
        };
        if !auto_registry {
            return Ok(StoreAction::Ignored);
        }
        if rfxcom_discovery::is_configured(&self.records, event) {
            debug!(device = %key, "already configured");
            return Ok(StoreAction::Ignored);
        }

        let record = DeviceRecord::from_event(event, notice.device.last_seen);
        self.records.push(record.clone());
        if let Err(e) = self.save().await {
            self.records.pop();
            return Err(e);
        }
        info!(device = %key, name = %record.name, "device registered");
        Ok(StoreAction::Registered(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rfxcom_discovery::DeviceRegistry;
    use rfxcom_protocol::decode;

    const ARC_ON: [u8; 8] = [0x07, 0x10, 0x01, 0x62, 0x41, 0x01, 0x01, 0x00];
    const TEMP_HUM: [u8; 11] = [0x0A, 0x52, 0x0D, 0x35, 0x68, 0x03, 0x00, 0xD4, 0x27, 0x02, 0x89];

    fn notice(registry: &mut DeviceRegistry, frame: &[u8]) -> DeviceNotice {
        let outcome = registry.observe(decode(frame).unwrap());
        let device = registry.get(outcome.key()).unwrap().clone();
        DeviceNotice { outcome, device }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeviceStore::load(dir.path().join("devices.yaml")).unwrap();
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_auto_register_new_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        let mut store = DeviceStore::load(&path).unwrap();
        let mut registry = DeviceRegistry::new();

        let action = store.handle(&notice(&mut registry, &ARC_ON), true).await.unwrap();
        assert!(matches!(action, StoreAction::Registered(ref r) if r.name == "ARC A_1"));

        // Updated notices never register
        let action = store.handle(&notice(&mut registry, &ARC_ON), true).await.unwrap();
        assert_eq!(action, StoreAction::Ignored);

        let reloaded = DeviceStore::load(&path).unwrap();
        assert_eq!(reloaded.records().len(), 1);
        assert_eq!(reloaded.records()[0].house_code.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_restart_does_not_duplicate_unusual_house_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        let x10_q1 = [0x07, 0x10, 0x00, 0x01, 0x51, 0x01, 0x01, 0x00];

        for _ in 0..3 {
            let mut store = DeviceStore::load(&path).unwrap();
            let mut registry = DeviceRegistry::new();
            store.handle(&notice(&mut registry, &x10_q1), true).await.unwrap();
        }

        let reloaded = DeviceStore::load(&path).unwrap();
        assert_eq!(reloaded.records().len(), 1);
        assert_eq!(reloaded.records()[0].name, "X10 Q_1");
    }

    #[tokio::test]
    async fn test_auto_registry_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        let mut store = DeviceStore::load(&path).unwrap();
        let mut registry = DeviceRegistry::new();

        let action = store.handle(&notice(&mut registry, &ARC_ON), false).await.unwrap();
        assert_eq!(action, StoreAction::Ignored);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_configured_device_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        std::fs::write(
            &path,
            "- name: Porch light\n  protocol: arc\n  house_code: a\n  unit_code: '1'\n",
        )
        .unwrap();
        let mut store = DeviceStore::load(&path).unwrap();
        let mut registry = DeviceRegistry::new();

        let action = store.handle(&notice(&mut registry, &ARC_ON), true).await.unwrap();
        assert_eq!(action, StoreAction::Ignored);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].name, "Porch light");
    }

    #[tokio::test]
    async fn test_sensor_refresh_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        let mut store = DeviceStore::load(&path).unwrap();
        let mut registry = DeviceRegistry::new();

        let action = store.handle(&notice(&mut registry, &TEMP_HUM), true).await.unwrap();
        assert!(matches!(action, StoreAction::Registered(_)));
        let on_disk = std::fs::read_to_string(&path).unwrap();

        let mut warmer = TEMP_HUM;
        warmer[7] = 0xDC;
        let action = store.handle(&notice(&mut registry, &warmer), true).await.unwrap();
        let StoreAction::SensorRefreshed(record) = action else {
            panic!("expected refresh, got {:?}", action);
        };
        let snapshot = record.sensor_data.unwrap();
        assert!((snapshot.temperature - 22.0).abs() < 1e-9);
        assert!(snapshot.updated_at <= Utc::now());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), on_disk);
        let stored = store.records()[0].sensor_data.as_ref().unwrap();
        assert!((stored.temperature - 22.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unconfigured_sensor_update_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DeviceStore::load(dir.path().join("devices.yaml")).unwrap();
        let mut registry = DeviceRegistry::new();

        store.handle(&notice(&mut registry, &TEMP_HUM), false).await.unwrap();
        let action = store.handle(&notice(&mut registry, &TEMP_HUM), false).await.unwrap();
        assert_eq!(action, StoreAction::Ignored);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("devices.yaml");
        let mut store = DeviceStore::load(&path).unwrap();
        let mut registry = DeviceRegistry::new();

        assert!(store.handle(&notice(&mut registry, &ARC_ON), true).await.is_err());
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        std::fs::write(&path, "devices: [unterminated").unwrap();
        assert!(DeviceStore::load(&path).is_err());
    }
}
