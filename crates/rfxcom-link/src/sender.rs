//! Sending commands.

use async_trait::async_trait;
use rfxcom_protocol::{CommandEncoder, CommandRequest};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

/// Something that can deliver an ON/OFF command to a device.
#[async_trait]
pub trait CommandSender: Send + Sync {
    /// Deliver one command.
    async fn send(&self, request: &CommandRequest) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

struct SenderState<W> {
    encoder: CommandEncoder,
    writer: W,
}

/// Encodes commands in-process and writes them to the transceiver.
///
/// The encoder (and its sequence counter) and the writer sit behind one
/// lock: a frame is numbered, written and flushed before the next caller
/// can start.
pub struct TransceiverSender<W> {
    state: Mutex<SenderState<W>>,
}

impl<W> TransceiverSender<W>
where
    W: AsyncWrite + Send + Unpin,
{
    /// Create a sender with a fresh encoder.
    pub fn new(writer: W) -> Self {
        Self::with_encoder(CommandEncoder::new(), writer)
    }

    /// Create a sender around an existing encoder.
    pub fn with_encoder(encoder: CommandEncoder, writer: W) -> Self {
        TransceiverSender {
            state: Mutex::new(SenderState { encoder, writer }),
        }
    }

    /// Sequence number the next frame will carry.
    pub async fn next_sequence(&self) -> u8 {
        self.state.lock().await.encoder.sequence().peek()
    }
}

#[async_trait]
impl<W> CommandSender for TransceiverSender<W>
where
    W: AsyncWrite + Send + Unpin,
{
    async fn send(&self, request: &CommandRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        let frame = state.encoder.encode(request)?;
        state.writer.write_all(&frame).await?;
        state.writer.flush().await?;
        debug!(
            protocol = %request.protocol,
            command = %request.command,
            target = %request.target(),
            frame = %hex::encode(&frame),
            "command written"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "transceiver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use rfxcom_protocol::{ProtocolError, SwitchCommand};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_send_writes_frame() {
        let (writer, mut reader) = tokio::io::duplex(64);
        let sender = TransceiverSender::new(writer);

        let request = CommandRequest::new("ARC", SwitchCommand::On)
            .with_house_code("A")
            .with_unit_code("1");
        sender.send(&request).await.unwrap();

        let mut frame = [0u8; 8];
        reader.read_exact(&mut frame).await.unwrap();
        assert_eq!(frame, [0x07, 0x10, 0x01, 0x00, 0x41, 0x01, 0x01, 0x00]);
        assert_eq!(sender.next_sequence().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_protocol_writes_nothing() {
        let (writer, _reader) = tokio::io::duplex(64);
        let sender = TransceiverSender::new(writer);

        let err = sender
            .send(&CommandRequest::new("ZWAVE", SwitchCommand::On))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LinkError::Protocol(ProtocolError::UnsupportedProtocol(_))
        ));
        assert_eq!(sender.next_sequence().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_senders_never_share_a_sequence() {
        let (writer, mut reader) = tokio::io::duplex(4096);
        let sender = Arc::new(TransceiverSender::new(writer));

        let mut tasks = Vec::new();
        for i in 0..32u8 {
            let sender = sender.clone();
            tasks.push(tokio::spawn(async move {
                let request = CommandRequest::new("PT2262", SwitchCommand::On)
                    .with_device_id(format!("{:06X}", i));
                sender.send(&request).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut sequences = Vec::new();
        for _ in 0..32 {
            let mut frame = [0u8; 8];
            reader.read_exact(&mut frame).await.unwrap();
            assert_eq!(frame[0], 0x07);
            sequences.push(frame[2]);
        }
        sequences.sort_unstable();
        assert_eq!(sequences, (0..32).collect::<Vec<u8>>());
    }
}
