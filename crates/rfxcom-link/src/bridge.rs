//! External command bridge.
//!
//! Some protocols are better served by an external helper program that owns
//! its own transceiver driver. The helper is spoken to with one JSON object
//! per line on its stdin/stdout:
//!
//! | Request                                            | Response                                 |
//! |----------------------------------------------------|------------------------------------------|
//! | `{"action":"init","port":...}`                     | `{"status":"ready"}`                     |
//! | `{"action":"send","protocol":...,"command":"on"}`  | `{"status":"success"}`                   |
//! | `{"action":"pair","protocol":...}`                 | `{"status":"success","result":{...}}`    |
//! | `{"action":"close"}`                               | `{"status":"closed"}`                    |
//!
//! Failures come back as `{"status":"error","error":"..."}`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use rfxcom_protocol::{unit_code_byte, CommandRequest, SwitchCommand};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::connection::{BoxReader, BoxWriter};
use crate::error::{LinkError, Result};
use crate::sender::CommandSender;

/// Default time to wait for an answer.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
/// Time to wait for a pairing answer.
pub const PAIR_TIMEOUT: Duration = Duration::from_secs(15);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// How to launch the helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Interpreter or executable, e.g. `node`.
    pub program: String,
    /// Script passed as the first argument.
    pub script: PathBuf,
    pub response_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            program: "node".to_string(),
            script: PathBuf::from("rfxcom_node_bridge.js"),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// One line sent to the helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BridgeRequest {
    Init {
        port: String,
    },
    Send {
        protocol: String,
        /// `"on"` or `"off"`.
        command: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        device_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        house_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit_code: Option<u8>,
    },
    Pair {
        protocol: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        device_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        house_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit_code: Option<u8>,
    },
    Close,
}

/// A trimmed, non-empty copy of an optional field.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl BridgeRequest {
    /// The `send` request for a command.
    pub fn send(request: &CommandRequest) -> Self {
        let command = match request.command {
            SwitchCommand::On => "on",
            SwitchCommand::Off => "off",
        };
        BridgeRequest::Send {
            protocol: request.protocol.clone(),
            command: command.to_string(),
            device_id: non_empty(&request.device_id),
            house_code: non_empty(&request.house_code),
            unit_code: request.unit_code.as_deref().map(|u| unit_code_byte(Some(u))),
        }
    }

    /// The `pair` request for a device.
    pub fn pair(request: &CommandRequest) -> Self {
        BridgeRequest::Pair {
            protocol: request.protocol.clone(),
            device_id: non_empty(&request.device_id),
            house_code: non_empty(&request.house_code),
            unit_code: request.unit_code.as_deref().map(|u| unit_code_byte(Some(u))),
        }
    }
}

/// One line received from the helper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl BridgeResponse {
    fn into_error(self) -> LinkError {
        let message = self
            .error
            .unwrap_or_else(|| format!("unexpected status {:?}", self.status));
        LinkError::Bridge(message)
    }
}

struct BridgeIo {
    reader: BufReader<BoxReader>,
    writer: BoxWriter,
    initialized: bool,
}

/// Command sender backed by the external helper.
pub struct BridgeSender {
    io: Mutex<BridgeIo>,
    child: Mutex<Option<Child>>,
    response_timeout: Duration,
}

impl BridgeSender {
    /// Launch the helper and initialize it on `port`.
    pub async fn spawn(config: &BridgeConfig, port: &str) -> Result<Self> {
        debug!(program = %config.program, script = %config.script.display(), "starting bridge");
        let mut child = Command::new(&config.program)
            .arg(&config.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LinkError::Bridge("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LinkError::Bridge("bridge stdout unavailable".to_string()))?;

        let bridge = Self::from_io(stdout, stdin, config.response_timeout);
        *bridge.child.lock().await = Some(child);
        bridge.init(port).await?;
        Ok(bridge)
    }

    /// Talk to a helper over an existing reader/writer pair.
    ///
    /// The bridge must still be initialized with [`BridgeSender::init`].
    pub fn from_io<R, W>(reader: R, writer: W, response_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        BridgeSender {
            io: Mutex::new(BridgeIo {
                reader: BufReader::new(Box::new(reader) as BoxReader),
                writer: Box::new(writer),
                initialized: false,
            }),
            child: Mutex::new(None),
            response_timeout,
        }
    }

    /// Ask the helper to open the transceiver on `port`.
    pub async fn init(&self, port: &str) -> Result<()> {
        let mut io = self.io.lock().await;
        let request = BridgeRequest::Init {
            port: port.to_string(),
        };
        let response = exchange(&mut io, &request, self.response_timeout).await?;
        if response.status != "ready" {
            return Err(response.into_error());
        }
        io.initialized = true;
        info!(port, "bridge ready");
        Ok(())
    }

    /// Put a device in pairing mode. Returns the helper's result object.
    pub async fn pair(&self, request: &CommandRequest) -> Result<serde_json::Value> {
        let response = self.call(&BridgeRequest::pair(request), PAIR_TIMEOUT).await?;
        if response.status != "success" {
            return Err(response.into_error());
        }
        let result = response.result.unwrap_or_else(|| serde_json::json!({}));
        info!(%result, "pairing succeeded");
        Ok(result)
    }

    /// Shut the helper down.
    ///
    /// The `close` answer is awaited briefly; a helper that does not exit on
    /// its own is killed.
    pub async fn close(&self) {
        {
            let mut io = self.io.lock().await;
            if io.initialized {
                if let Err(e) = exchange(&mut io, &BridgeRequest::Close, CLOSE_TIMEOUT).await {
                    debug!(error = %e, "bridge close not acknowledged");
                }
                io.initialized = false;
            }
        }

        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };
        match tokio::time::timeout(EXIT_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "bridge exited"),
            Ok(Err(e)) => warn!(error = %e, "waiting for bridge failed"),
            Err(_) => {
                warn!("bridge did not exit, killing it");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill bridge");
                }
            }
        }
        info!("bridge closed");
    }

    async fn call(&self, request: &BridgeRequest, timeout: Duration) -> Result<BridgeResponse> {
        let mut io = self.io.lock().await;
        if !io.initialized {
            return Err(LinkError::NotConnected);
        }
        exchange(&mut io, request, timeout).await
    }
}

/// Write one request line and read one response line.
///
/// Any failure leaves the pipe out of step with the helper (a late reply or
/// half a line may still be pending), so the bridge is marked unusable and
/// later calls fail with [`LinkError::NotConnected`].
async fn exchange(
    io: &mut BridgeIo,
    request: &BridgeRequest,
    timeout: Duration,
) -> Result<BridgeResponse> {
    let result = exchange_line(io, request, timeout).await;
    if let Err(e) = &result {
        if io.initialized {
            warn!(error = %e, "bridge out of step, disabling it");
        }
        io.initialized = false;
    }
    result
}

async fn exchange_line(
    io: &mut BridgeIo,
    request: &BridgeRequest,
    timeout: Duration,
) -> Result<BridgeResponse> {
    let mut line = serde_json::to_string(request)?;
    debug!(request = %line, "bridge request");
    line.push('\n');
    io.writer.write_all(line.as_bytes()).await?;
    io.writer.flush().await?;

    let mut response = String::new();
    let read = tokio::time::timeout(timeout, io.reader.read_line(&mut response))
        .await
        .map_err(|_| LinkError::BridgeTimeout(timeout))??;
    if read == 0 {
        return Err(LinkError::Bridge("bridge closed its output".to_string()));
    }

    let response = response.trim();
    if response.is_empty() {
        return Err(LinkError::Bridge("empty response".to_string()));
    }
    debug!(response, "bridge response");
    Ok(serde_json::from_str(response)?)
}

#[async_trait]
impl CommandSender for BridgeSender {
    async fn send(&self, request: &CommandRequest) -> Result<()> {
        let response = self
            .call(&BridgeRequest::send(request), self.response_timeout)
            .await?;
        if response.status != "success" {
            return Err(response.into_error());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "bridge"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_json() {
        let request = CommandRequest::new("AC", SwitchCommand::On)
            .with_device_id("02382C82")
            .with_unit_code("2");
        let json = serde_json::to_value(BridgeRequest::send(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "send",
                "protocol": "AC",
                "command": "on",
                "device_id": "02382C82",
                "unit_code": 2
            })
        );
    }

    #[test]
    fn test_house_unit_request_json() {
        let request = CommandRequest::new("ARC", SwitchCommand::Off)
            .with_house_code("B")
            .with_unit_code("3")
            .with_device_id("  ");
        let json = serde_json::to_value(BridgeRequest::send(&request)).unwrap();
        assert_eq!(json["command"], "off");
        assert_eq!(json["house_code"], "B");
        assert_eq!(json["unit_code"], 3);
        assert!(json.get("device_id").is_none());
    }

    #[test]
    fn test_close_and_init_json() {
        assert_eq!(
            serde_json::to_string(&BridgeRequest::Close).unwrap(),
            r#"{"action":"close"}"#
        );
        let init = BridgeRequest::Init {
            port: "/dev/ttyUSB0".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&init).unwrap(),
            r#"{"action":"init","port":"/dev/ttyUSB0"}"#
        );
    }

    #[test]
    fn test_error_response() {
        let response: BridgeResponse =
            serde_json::from_str(r#"{"status":"error","error":"no transceiver"}"#).unwrap();
        assert!(matches!(response.into_error(), LinkError::Bridge(msg) if msg == "no transceiver"));
    }

    #[tokio::test]
    async fn test_send_before_init_is_rejected() {
        let (ours, _theirs) = tokio::io::duplex(256);
        let (reader, writer) = tokio::io::split(ours);
        let bridge = BridgeSender::from_io(reader, writer, DEFAULT_RESPONSE_TIMEOUT);
        let err = bridge
            .send(&CommandRequest::new("AC", SwitchCommand::On))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::NotConnected));
    }
}
