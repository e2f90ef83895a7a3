//! Commands that can be sent to the transceiver.

use bytes::BufMut;

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::{Family, ProtocolDescriptor};
use crate::sequence::SequenceCounter;
use crate::types::*;

/// An ON/OFF command for one device.
///
/// Identity fields are kept as the caller supplied them; the encoder converts
/// them leniently (see [`house_code_byte`], [`unit_code_byte`] and
/// [`device_id_bytes`]). Fields the protocol does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Protocol name, e.g. `"ARC"`.
    pub protocol: String,
    /// Command to send.
    pub command: SwitchCommand,
    /// House code letter (Lighting1).
    pub house_code: Option<String>,
    /// Unit code.
    pub unit_code: Option<String>,
    /// Hex device id.
    pub device_id: Option<String>,
}

impl CommandRequest {
    /// Create a request with no identity fields set.
    pub fn new(protocol: impl Into<String>, command: SwitchCommand) -> Self {
        CommandRequest {
            protocol: protocol.into(),
            command,
            house_code: None,
            unit_code: None,
            device_id: None,
        }
    }

    /// Set the house code.
    pub fn with_house_code(mut self, house_code: impl Into<String>) -> Self {
        self.house_code = Some(house_code.into());
        self
    }

    /// Set the unit code.
    pub fn with_unit_code(mut self, unit_code: impl Into<String>) -> Self {
        self.unit_code = Some(unit_code.into());
        self
    }

    /// Set the device id.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Short description of the addressed device, for logs.
    pub fn target(&self) -> String {
        match (&self.device_id, &self.house_code) {
            (Some(id), _) => format!("{}/{}", id, self.unit_code.as_deref().unwrap_or("-")),
            (None, Some(house)) => format!("{}/{}", house, self.unit_code.as_deref().unwrap_or("-")),
            (None, None) => "-".to_string(),
        }
    }
}

/// Encodes [`CommandRequest`]s into transceiver frames.
///
/// The encoder owns the session's [`SequenceCounter`]; every successful
/// `encode` consumes exactly one sequence value.
#[derive(Debug, Default)]
pub struct CommandEncoder {
    sequence: SequenceCounter,
}

impl CommandEncoder {
    /// Create an encoder with a counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder around an existing counter.
    pub fn with_counter(sequence: SequenceCounter) -> Self {
        CommandEncoder { sequence }
    }

    /// The counter state.
    pub fn sequence(&self) -> &SequenceCounter {
        &self.sequence
    }

    /// Encode a request.
    ///
    /// Only an unknown (or inbound-only) protocol name is an error; malformed
    /// identity fields fall back to their defaults.
    pub fn encode(&mut self, request: &CommandRequest) -> ProtocolResult<Vec<u8>> {
        let descriptor = ProtocolDescriptor::lookup(&request.protocol)?;
        let frame = build_frame(descriptor, request, self.sequence.peek())?;
        self.sequence.next();
        log::debug!(
            "encoded {} {} for {}: {}",
            descriptor.name,
            request.command,
            request.target(),
            hex::encode(&frame)
        );
        Ok(frame)
    }
}

/// Assemble the frame for a protocol with an explicit sequence byte.
pub fn build_frame(
    descriptor: &ProtocolDescriptor,
    request: &CommandRequest,
    sequence: u8,
) -> ProtocolResult<Vec<u8>> {
    let family = descriptor.family;
    if !family.is_command() {
        return Err(ProtocolError::UnsupportedProtocol(descriptor.name.to_string()));
    }
    let size = family.frame_size();
    let mut buf = Vec::with_capacity(size);

    buf.put_u8((size - 1) as u8);
    buf.put_u8(family.packet_type());
    if let Some(subtype) = descriptor.subtype {
        buf.put_u8(subtype);
    }
    buf.put_u8(sequence);

    let command = request.command;
    let device_id = || {
        device_id_bytes(
            request.device_id.as_deref().unwrap_or(""),
            family.device_id_width(),
        )
    };
    let unit = || unit_code_byte(request.unit_code.as_deref());

    match family {
        Family::Lighting1 => {
            buf.put_u8(house_code_byte(request.house_code.as_deref()));
            buf.put_u8(unit());
            buf.put_u8(command.to_byte());
        }
        Family::Lighting2 | Family::Lighting5 => {
            buf.put_slice(&device_id());
            buf.put_u8(unit());
            buf.put_u8(command.to_byte());
            buf.put_u8(command.level_byte());
        }
        Family::Lighting3 | Family::Lighting6 => {
            buf.put_slice(&device_id());
            buf.put_u8(DEFAULT_GROUP);
            buf.put_u8(unit());
            buf.put_u8(command.to_byte());
        }
        Family::Lighting4 => {
            buf.put_slice(&device_id());
            buf.put_u8(command.to_byte());
        }
        Family::TempHum => {
            return Err(ProtocolError::UnsupportedProtocol(descriptor.name.to_string()));
        }
    }
    buf.put_u8(OUTBOUND_SIGNAL);

    debug_assert_eq!(buf.len(), size);
    Ok(buf)
}
