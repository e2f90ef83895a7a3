//! Frames received from the transceiver.
//!
//! The RF band is shared with plenty of foreign traffic, so [`decode`] never
//! fails: anything it cannot interpret is logged at debug level and dropped.
//! [`try_decode`] exposes the reason for callers that care.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::is_valid_length_byte;
use crate::protocol::{Family, ProtocolDescriptor};
use crate::types::*;

/// A structured view of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// A switch command seen on the air (Lighting1..Lighting6).
    Command(CommandEvent),
    /// A temperature/humidity report.
    Sensor(SensorEvent),
}

/// ON/OFF command sent by a remote or another controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    /// Protocol the frame was sent with.
    pub protocol: &'static ProtocolDescriptor,
    /// Addressed device.
    pub identity: Identity,
    /// Command.
    pub command: SwitchCommand,
    /// Sequence byte of the frame.
    pub sequence: u8,
    /// Received signal level, 0..=15.
    pub signal_level: u8,
}

/// Temperature/humidity report.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    /// Always the `TEMP_HUM` descriptor.
    pub protocol: &'static ProtocolDescriptor,
    /// Sensor id, decimal.
    pub device_id: String,
    /// Temperature in degrees Celsius, 0.1 resolution.
    pub temperature_celsius: f64,
    /// Relative humidity in percent.
    pub humidity_percent: u8,
    /// Humidity status.
    pub status: HumidityStatus,
    /// Received signal level, 0..=15.
    pub signal_level: u8,
    /// Battery is fine.
    pub battery_ok: bool,
    /// Sequence byte of the frame.
    pub sequence: u8,
}

impl DecodedEvent {
    /// Protocol of the event.
    pub fn protocol(&self) -> &'static ProtocolDescriptor {
        match self {
            DecodedEvent::Command(event) => event.protocol,
            DecodedEvent::Sensor(event) => event.protocol,
        }
    }

    /// Identity of the device that produced (or was addressed by) the frame.
    pub fn identity(&self) -> Identity {
        match self {
            DecodedEvent::Command(event) => event.identity.clone(),
            DecodedEvent::Sensor(event) => Identity::DeviceId {
                device_id: event.device_id.clone(),
            },
        }
    }

    /// Registry key of the device.
    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(self.protocol().name, &self.identity())
    }

    /// Received signal level, 0..=15.
    pub fn signal_level(&self) -> u8 {
        match self {
            DecodedEvent::Command(event) => event.signal_level,
            DecodedEvent::Sensor(event) => event.signal_level,
        }
    }

    /// The sensor report, if this is one.
    pub fn as_sensor(&self) -> Option<&SensorEvent> {
        match self {
            DecodedEvent::Sensor(event) => Some(event),
            DecodedEvent::Command(_) => None,
        }
    }
}

/// Decode a frame, returning `None` for anything unrecognized.
pub fn decode(frame: &[u8]) -> Option<DecodedEvent> {
    match try_decode(frame) {
        Ok(event) => Some(event),
        Err(e) => {
            log::debug!("ignoring frame {}: {}", hex::encode(frame), e);
            None
        }
    }
}

/// Decode a frame, reporting why it was rejected.
pub fn try_decode(frame: &[u8]) -> ProtocolResult<DecodedEvent> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(ProtocolError::FrameTooShort {
            expected: MIN_FRAME_SIZE,
            actual: frame.len(),
        });
    }

    let length = frame[0];
    if !is_valid_length_byte(length) {
        return Err(ProtocolError::InvalidLength(length));
    }

    let packet_type = frame[1];
    let family =
        Family::from_packet_type(packet_type).ok_or(ProtocolError::UnknownPacketType(packet_type))?;

    if frame.len() < family.frame_size() {
        return Err(ProtocolError::FrameTooShort {
            expected: family.frame_size(),
            actual: frame.len(),
        });
    }

    let subtype = family.has_subtype().then(|| frame[2]);
    let protocol = ProtocolDescriptor::from_wire(family, subtype).ok_or(
        ProtocolError::UnknownSubtype {
            packet_type,
            subtype: frame[2],
        },
    )?;

    let sequence = frame[family.sequence_offset()];
    let body = &frame[family.identity_offset()..family.frame_size()];

    let event = match family {
        Family::TempHum => DecodedEvent::Sensor(decode_temp_hum(protocol, sequence, body)),
        _ => DecodedEvent::Command(decode_lighting(protocol, sequence, body)),
    };
    Ok(event)
}

/// Decode the identity and trailer of a lighting frame.
///
/// `body` starts at the first identity byte and ends at the signal byte.
fn decode_lighting(protocol: &'static ProtocolDescriptor, sequence: u8, body: &[u8]) -> CommandEvent {
    let family = protocol.family;
    let width = family.device_id_width();
    let device_id = hex::encode_upper(&body[..width]);
    let rest = &body[width..];

    // rest: [unit|group..., cmd, (level), signal]
    let (identity, command) = match family {
        Family::Lighting1 => (
            Identity::HouseUnit {
                house_code: rest[0] as char,
                unit_code: rest[1],
            },
            rest[2],
        ),
        Family::Lighting2 | Family::Lighting5 => (
            Identity::DeviceIdUnit {
                device_id,
                unit_code: rest[0],
            },
            rest[1],
        ),
        // rest[0] is the group byte
        Family::Lighting3 | Family::Lighting6 => (
            Identity::DeviceIdUnit {
                device_id,
                unit_code: rest[1],
            },
            rest[2],
        ),
        Family::Lighting4 | Family::TempHum => (Identity::DeviceId { device_id }, rest[0]),
    };

    let signal = body[body.len() - 1];
    CommandEvent {
        protocol,
        identity,
        command: SwitchCommand::from(command),
        sequence,
        signal_level: signal >> 4,
    }
}

/// Decode a TH13 report.
///
/// `body`: id(2), temperature(2), humidity, status, signal/battery.
fn decode_temp_hum(protocol: &'static ProtocolDescriptor, sequence: u8, body: &[u8]) -> SensorEvent {
    let id = u16::from_be_bytes([body[0], body[1]]);
    let raw = u16::from_be_bytes([body[2], body[3]]);
    let signal_battery = body[6];

    SensorEvent {
        protocol,
        device_id: id.to_string(),
        temperature_celsius: temperature_from_raw(raw),
        humidity_percent: body[4],
        status: HumidityStatus::from(body[5]),
        signal_level: signal_battery >> 4,
        battery_ok: signal_battery & 0x0F == 9,
        sequence,
    }
}

/// Tenths of a degree, negative values in two's complement.
fn temperature_from_raw(raw: u16) -> f64 {
    if raw & 0x8000 != 0 {
        -(((raw ^ 0xFFFF) as f64) + 1.0) / 10.0
    } else {
        raw as f64 / 10.0
    }
}
