//! End-to-end tests for the runner: configuration, discovery and the
//! persisted device list, driven over in-memory transports.

use std::time::Duration;

use rfxcom_link::{DeviceNotice, Receiver, SharedRegistry};
use rfxcom_protocol::{CommandRequest, SwitchCommand};
use rfxcom_runner::{process_notices, Config, DeviceStore, RunnerError};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

const ARC_ON: [u8; 8] = [0x07, 0x10, 0x01, 0x62, 0x41, 0x01, 0x01, 0x00];
const TEMP_HUM: [u8; 11] = [0x0A, 0x52, 0x0D, 0x35, 0x68, 0x03, 0x00, 0xD4, 0x27, 0x02, 0x89];

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rfxcom.yaml");
    std::fs::write(
        &path,
        r#"
connection:
  connection_type: usb
  port: /dev/ttyACM0
auto_registry: true
devices_file: /var/lib/rfxcom/devices.yaml
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.connection.port, "/dev/ttyACM0");
    assert_eq!(config.connection.baudrate, 38400);
    assert!(config.auto_registry);
    assert!(config.bridge.is_none());
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, RunnerError::Config { .. }));
}

// ============================================================================
// Discovery to device list
// ============================================================================

#[tokio::test]
async fn test_discovered_devices_are_registered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devices.yaml");
    let mut store = DeviceStore::load(&path).unwrap();

    let (mut radio, rx) = tokio::io::duplex(1024);
    let registry = SharedRegistry::default();
    let (events, mut notices) = broadcast::channel::<DeviceNotice>(16);
    let cancel = CancellationToken::new();
    let receiver = Receiver::spawn(rx, registry.clone(), events, cancel.clone());

    let listener = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            process_notices(&mut store, &mut notices, true, &cancel).await;
            store
        }
    });

    radio.write_all(&ARC_ON).await.unwrap();
    radio.write_all(&TEMP_HUM).await.unwrap();
    radio.write_all(&ARC_ON).await.unwrap();

    wait_for(|| registry.read().len() == 2).await;
    wait_for(|| {
        DeviceStore::load(&path)
            .map(|s| s.records().len() == 2)
            .unwrap_or(false)
    })
    .await;

    cancel.cancel();
    receiver.shutdown().await;
    let store = listener.await.unwrap();

    let names: Vec<_> = store.records().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["ARC A_1", "TEMP_HUM 26627"]);

    let on_disk = DeviceStore::load(&path).unwrap();
    assert_eq!(on_disk.records()[1].device_id.as_deref(), Some("26627"));
}

#[tokio::test]
async fn test_listener_stops_when_notices_close() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DeviceStore::load(dir.path().join("devices.yaml")).unwrap();

    let (events, mut notices) = broadcast::channel::<DeviceNotice>(16);
    drop(events);

    let cancel = CancellationToken::new();
    tokio::time::timeout(
        Duration::from_secs(2),
        process_notices(&mut store, &mut notices, true, &cancel),
    )
    .await
    .unwrap();
    assert!(store.records().is_empty());
}

// ============================================================================
// Bridge
// ============================================================================

#[tokio::test]
async fn test_pair_with_unavailable_bridge() {
    let config = Config::from_yaml(
        r#"
bridge:
  program: /nonexistent/rfxcom-bridge
  script: bridge.js
"#,
    )
    .unwrap();
    let request = CommandRequest::new("AC", SwitchCommand::On).with_device_id("02382C82");
    assert!(rfxcom_runner::pair(&config, &request).await.is_err());
}
