//! Routing commands between the transceiver and the bridge.

use std::sync::Arc;

use async_trait::async_trait;
use rfxcom_link::{CommandSender, Result};
use rfxcom_protocol::CommandRequest;
use tracing::{debug, warn};

/// Sends through the bridge for selected protocols, falling back to the
/// transceiver when the bridge fails.
pub struct Dispatcher {
    transceiver: Arc<dyn CommandSender>,
    bridge: Option<Arc<dyn CommandSender>>,
    bridge_protocols: Vec<String>,
}

impl Dispatcher {
    /// Send everything through `transceiver`.
    pub fn new(transceiver: Arc<dyn CommandSender>) -> Self {
        Dispatcher {
            transceiver,
            bridge: None,
            bridge_protocols: Vec::new(),
        }
    }

    /// Route `protocols` through `bridge` first.
    pub fn with_bridge(mut self, bridge: Arc<dyn CommandSender>, protocols: Vec<String>) -> Self {
        self.bridge = Some(bridge);
        self.bridge_protocols = protocols;
        self
    }

    fn bridge_for(&self, protocol: &str) -> Option<&Arc<dyn CommandSender>> {
        let protocol = protocol.trim();
        let routed = self
            .bridge_protocols
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(protocol));
        self.bridge.as_ref().filter(|_| routed)
    }
}

#[async_trait]
impl CommandSender for Dispatcher {
    async fn send(&self, request: &CommandRequest) -> Result<()> {
        if let Some(bridge) = self.bridge_for(&request.protocol) {
            match bridge.send(request).await {
                Ok(()) => {
                    debug!(protocol = %request.protocol, via = bridge.name(), "command sent");
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        protocol = %request.protocol,
                        error = %e,
                        "bridge failed, falling back to {}",
                        self.transceiver.name()
                    );
                }
            }
        }
        self.transceiver.send(request).await
    }

    fn name(&self) -> &'static str {
        "dispatcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rfxcom_link::LinkError;
    use rfxcom_protocol::SwitchCommand;

    /// Records the protocols it was asked to send.
    struct Recorder {
        name: &'static str,
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Recorder {
                name,
                fail,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl CommandSender for Recorder {
        async fn send(&self, request: &CommandRequest) -> Result<()> {
            self.sent.lock().push(request.protocol.clone());
            if self.fail {
                return Err(LinkError::NotConnected);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_routes_by_protocol() {
        let transceiver = Recorder::new("transceiver", false);
        let bridge = Recorder::new("bridge", false);
        let dispatcher = Dispatcher::new(transceiver.clone())
            .with_bridge(bridge.clone(), vec!["AC".to_string()]);

        dispatcher.send(&CommandRequest::new("ac", SwitchCommand::On)).await.unwrap();
        dispatcher.send(&CommandRequest::new("ARC", SwitchCommand::On)).await.unwrap();

        assert_eq!(bridge.sent(), vec!["ac"]);
        assert_eq!(transceiver.sent(), vec!["ARC"]);
    }

    #[tokio::test]
    async fn test_falls_back_when_bridge_fails() {
        let transceiver = Recorder::new("transceiver", false);
        let bridge = Recorder::new("bridge", true);
        let dispatcher = Dispatcher::new(transceiver.clone())
            .with_bridge(bridge.clone(), vec!["AC".to_string()]);

        dispatcher.send(&CommandRequest::new("AC", SwitchCommand::Off)).await.unwrap();
        assert_eq!(bridge.sent(), vec!["AC"]);
        assert_eq!(transceiver.sent(), vec!["AC"]);
    }

    #[tokio::test]
    async fn test_without_bridge() {
        let transceiver = Recorder::new("transceiver", true);
        let dispatcher = Dispatcher::new(transceiver.clone());
        assert!(dispatcher.send(&CommandRequest::new("AC", SwitchCommand::On)).await.is_err());
        assert_eq!(transceiver.sent(), vec!["AC"]);
    }
}
