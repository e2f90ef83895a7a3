//! Subcommand implementations.

use std::sync::Arc;

use rfxcom_link::{
    BridgeSender, CommandSender, Connection, DeviceNotice, LinkError, Receiver, SharedRegistry,
    TransceiverSender,
};
use rfxcom_protocol::CommandRequest;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{Result, RunnerError};
use crate::store::{DeviceStore, StoreAction};

const NOTICE_CAPACITY: usize = 64;

/// Listen for devices until `cancel` fires.
pub async fn listen(config: &Config, cancel: CancellationToken) -> Result<()> {
    let mut store = DeviceStore::load(&config.devices_file)?;
    info!(
        devices = store.records().len(),
        auto_registry = config.auto_registry,
        "listening"
    );

    let connection = Connection::open(&config.connection.to_connection_config()).await?;
    info!(endpoint = %connection.endpoint, "connected");
    let registry = SharedRegistry::default();
    let (events, mut notices) = broadcast::channel(NOTICE_CAPACITY);
    let receiver = Receiver::spawn(connection.reader, registry.clone(), events, cancel.clone());

    process_notices(&mut store, &mut notices, config.auto_registry, &cancel).await;

    receiver.shutdown().await;
    info!(heard = registry.read().len(), "stopped listening");
    Ok(())
}

/// Feed registry notices to the store until cancelled or the channel closes.
pub async fn process_notices(
    store: &mut DeviceStore,
    notices: &mut broadcast::Receiver<DeviceNotice>,
    auto_registry: bool,
    cancel: &CancellationToken,
) {
    loop {
        let notice = tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            notice = notices.recv() => notice,
        };

        match notice {
            Ok(notice) => match store.handle(&notice, auto_registry).await {
                Ok(StoreAction::Registered(_)) | Ok(StoreAction::Ignored) => {}
                Ok(StoreAction::SensorRefreshed(record)) => {
                    if let Some(reading) = &record.sensor_data {
                        info!(
                            device = %record.name,
                            temperature = reading.temperature,
                            humidity = reading.humidity,
                            battery_ok = reading.battery_ok,
                            "sensor reading"
                        );
                    }
                }
                Err(e) => warn!(error = %e, "failed to update device list"),
            },
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "device notices dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Send one command, through the bridge when configured for its protocol.
pub async fn send(config: &Config, request: &CommandRequest) -> Result<()> {
    let bridge = start_bridge(config, &request.protocol).await;

    let connection = Connection::open(&config.connection.to_connection_config()).await?;
    let transceiver: Arc<dyn CommandSender> = Arc::new(TransceiverSender::new(connection.writer));
    let mut dispatcher = Dispatcher::new(transceiver);
    if let (Some(bridge), Some(settings)) = (&bridge, &config.bridge) {
        dispatcher = dispatcher.with_bridge(bridge.clone(), settings.protocols.clone());
    }

    let result = dispatcher.send(request).await;
    if let Some(bridge) = bridge {
        bridge.close().await;
    }
    result?;
    info!(protocol = %request.protocol, command = %request.command, target = %request.target(), "command sent");
    Ok(())
}

/// Pair a device through the bridge.
pub async fn pair(config: &Config, request: &CommandRequest) -> Result<serde_json::Value> {
    let Some(settings) = &config.bridge else {
        return Err(RunnerError::Link(LinkError::Bridge(
            "pairing requires a configured bridge".to_string(),
        )));
    };
    let port = config.bridge_port().ok_or_else(missing_bridge_port)?;
    let bridge = BridgeSender::spawn(&settings.to_bridge_config(), port).await?;
    let result = bridge.pair(request).await;
    bridge.close().await;
    Ok(result?)
}

/// Start the bridge if it handles `protocol`. Failures are logged and
/// leave the transceiver as the only sender.
async fn start_bridge(config: &Config, protocol: &str) -> Option<Arc<BridgeSender>> {
    let settings = config.bridge.as_ref().filter(|s| s.handles(protocol))?;
    let Some(port) = config.bridge_port() else {
        warn!(error = %missing_bridge_port(), "bridge unavailable, using transceiver");
        return None;
    };
    match BridgeSender::spawn(&settings.to_bridge_config(), port).await {
        Ok(bridge) => Some(Arc::new(bridge)),
        Err(e) => {
            warn!(error = %e, "bridge unavailable, using transceiver");
            None
        }
    }
}

fn missing_bridge_port() -> RunnerError {
    RunnerError::Link(LinkError::Bridge(
        "bridge.port is required with a network connection".to_string(),
    ))
}

/// Render the device list, one device per line.
pub fn format_devices(store: &DeviceStore) -> Vec<String> {
    store
        .records()
        .iter()
        .map(|record| {
            let identity = match (&record.house_code, &record.device_id) {
                (_, Some(id)) => id.clone(),
                (Some(house), None) => house.clone(),
                (None, None) => "-".to_string(),
            };
            let unit = record.unit_code.as_deref().unwrap_or("-");
            let mut line = format!("{:<24} {:<12} {:<10} {:<4}", record.name, record.protocol, identity, unit);
            if let Some(reading) = &record.sensor_data {
                line.push_str(&format!(
                    " {:.1}C {}% {}",
                    reading.temperature, reading.humidity, reading.status
                ));
            }
            line
        })
        .collect()
}
