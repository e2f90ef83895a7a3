//! Transport to the transceiver.
//!
//! The transceiver is reached either through a USB virtual COM port or
//! through a serial-to-TCP adapter. Either way the stream is split into an
//! independent reader (owned by the [`crate::Receiver`]) and writer (owned by
//! the [`crate::TransceiverSender`]).

use std::fmt;
use std::time::Duration;

use rfxcom_protocol::{frame_size_for, is_valid_length_byte};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};
use tracing::{debug, info};

use crate::error::Result;

/// Default serial device.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
/// Default serial baud rate.
pub const DEFAULT_BAUDRATE: u32 = 38400;
/// Default network host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default network port.
pub const DEFAULT_NETWORK_PORT: u16 = 10001;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Boxed reader half.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
/// Boxed writer half.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Where the transceiver is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// USB virtual COM port.
    Usb { port: String, baudrate: u32 },
    /// Serial-to-TCP adapter.
    Network { host: String, network_port: u16 },
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig::Usb {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
        }
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionConfig::Usb { port, baudrate } => write!(f, "{} @ {} baud", port, baudrate),
            ConnectionConfig::Network { host, network_port } => {
                write!(f, "tcp://{}:{}", host, network_port)
            }
        }
    }
}

/// An open transport, split into halves.
pub struct Connection {
    pub reader: BoxReader,
    pub writer: BoxWriter,
    /// Human readable endpoint, for logs.
    pub endpoint: String,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Open the transport described by `config`.
    pub async fn open(config: &ConnectionConfig) -> Result<Connection> {
        let connection = match config {
            ConnectionConfig::Usb { port, baudrate } => {
                let stream = tokio_serial::new(port.as_str(), *baudrate)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::None)
                    .stop_bits(StopBits::One)
                    .flow_control(FlowControl::None)
                    .open_native_async()?;
                let (reader, writer) = tokio::io::split(stream);
                Connection::from_io(reader, writer, config.to_string())
            }
            ConnectionConfig::Network { host, network_port } => {
                let stream = tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    TcpStream::connect((host.as_str(), *network_port)),
                )
                .await
                .map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("connection to {}:{} timed out", host, network_port),
                    )
                })??;
                stream.set_nodelay(true)?;
                let (reader, writer) = stream.into_split();
                Connection::from_io(reader, writer, config.to_string())
            }
        };
        info!(endpoint = %connection.endpoint, "connected to transceiver");
        Ok(connection)
    }

    /// Wrap an arbitrary reader/writer pair.
    pub fn from_io<R, W>(reader: R, writer: W, endpoint: impl Into<String>) -> Connection
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Connection {
            reader: Box::new(reader),
            writer: Box::new(writer),
            endpoint: endpoint.into(),
        }
    }
}

/// Read one length-prefixed frame.
///
/// Returns `Ok(None)` when the length byte is noise; nothing after it is
/// consumed. Otherwise the returned frame includes the length byte.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let length = reader.read_u8().await?;
    if !is_valid_length_byte(length) {
        debug!(length, "discarding invalid length byte");
        return Ok(None);
    }

    let mut frame = vec![0u8; frame_size_for(length)];
    frame[0] = length;
    reader.read_exact(&mut frame[1..]).await?;
    Ok(Some(frame))
}
