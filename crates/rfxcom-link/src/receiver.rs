//! Background receive loop.
//!
//! One task reads frames from the transport, decodes them and feeds the
//! shared [`DeviceRegistry`]. It is the registry's only writer. Each
//! recognised frame produces a [`DeviceNotice`] on a broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rfxcom_discovery::{DeviceRegistry, DiscoveredDevice, RegistryOutcome};
use rfxcom_protocol::decode;
use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::connection::read_frame;

/// Registry shared between the receive loop and its readers.
pub type SharedRegistry = Arc<RwLock<DeviceRegistry>>;

/// Delay before reading again after a transport error.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
/// Consecutive read failures between repeated warnings.
const WARN_EVERY: u32 = 60;

/// Published for every recognised frame.
#[derive(Debug, Clone)]
pub struct DeviceNotice {
    pub outcome: RegistryOutcome,
    /// Registry entry after the observation.
    pub device: DiscoveredDevice,
}

/// Handle to the receive task.
pub struct Receiver {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Receiver {
    /// Spawn the receive loop with the default backoff.
    pub fn spawn<R>(
        reader: R,
        registry: SharedRegistry,
        events: broadcast::Sender<DeviceNotice>,
        cancel: CancellationToken,
    ) -> Receiver
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::spawn_with_backoff(reader, registry, events, cancel, DEFAULT_BACKOFF)
    }

    /// Spawn the receive loop.
    pub fn spawn_with_backoff<R>(
        reader: R,
        registry: SharedRegistry,
        events: broadcast::Sender<DeviceNotice>,
        cancel: CancellationToken,
        backoff: Duration,
    ) -> Receiver
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let task = tokio::spawn(receive_loop(
            reader,
            registry,
            events,
            cancel.clone(),
            backoff,
        ));
        Receiver { cancel, task }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// The receive loop. Runs as a spawned Tokio task until cancelled.
async fn receive_loop<R>(
    mut reader: R,
    registry: SharedRegistry,
    events: broadcast::Sender<DeviceNotice>,
    cancel: CancellationToken,
    backoff: Duration,
) where
    R: AsyncRead + Unpin,
{
    let mut failures: u32 = 0;
    loop {
        let result = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("receiver cancelled");
                break;
            }

            result = read_frame(&mut reader) => result,
        };

        match result {
            Ok(Some(frame)) => {
                failures = 0;
                handle_frame(&frame, &registry, &events);
            }
            Ok(None) => {}
            Err(e) => {
                failures = failures.saturating_add(1);
                let backoff_ms = backoff.as_millis() as u64;
                if should_warn(failures) {
                    warn!(error = %e, failures, backoff_ms, "transport read failed");
                } else {
                    debug!(error = %e, failures, backoff_ms, "transport read failed");
                }
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        debug!("receiver cancelled during backoff");
                        break;
                    }

                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }
}

/// Warn on the first failure of a run and then once per `WARN_EVERY`, so a
/// closed peer does not flood the log.
fn should_warn(failures: u32) -> bool {
    failures == 1 || failures % WARN_EVERY == 0
}

/// Decode one frame and record it.
fn handle_frame(frame: &[u8], registry: &SharedRegistry, events: &broadcast::Sender<DeviceNotice>) {
    trace!(frame = %hex::encode(frame), "frame received");
    let Some(event) = decode(frame) else {
        return;
    };

    let notice = {
        let mut registry = registry.write();
        let outcome = registry.observe(event);
        registry.get(outcome.key()).cloned().map(|device| DeviceNotice { outcome, device })
    };

    if let Some(notice) = notice {
        // No subscribers is fine.
        let _ = events.send(notice);
    }
}
