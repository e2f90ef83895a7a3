//! The protocol table.
//!
//! Every supported protocol name maps to exactly one [`ProtocolDescriptor`]
//! which fixes its packet family, subtype byte and identity layout. The table
//! is a `static` slice and is never mutated.
//!
//! ## Family Layouts
//!
//! | Family    | Frame                                              | Size |
//! |-----------|----------------------------------------------------|------|
//! | Lighting1 | len, type, subtype, seq, house, unit, cmd, signal  | 8    |
//! | Lighting2 | len, type, subtype, seq, id(4), unit, cmd, level, signal | 12 |
//! | Lighting3 | len, type, seq, id(2), group, unit, cmd, signal    | 9    |
//! | Lighting4 | len, type, seq, id(3), cmd, signal                 | 8    |
//! | Lighting5 | len, type, subtype, seq, id(3), unit, cmd, level, signal | 11 |
//! | Lighting6 | len, type, seq, id(2), group, unit, cmd, signal    | 9    |
//! | TempHum   | len, type, subtype, seq, id(2), temp(2), hum, status, signal | 11 |

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Byte-layout group of a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Lighting1,
    Lighting2,
    Lighting3,
    Lighting4,
    Lighting5,
    Lighting6,
    /// Temperature/humidity sensor reports. Inbound only.
    TempHum,
}

/// How a protocol names one physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    /// House-code letter plus numeric unit code.
    HouseUnit,
    /// Hex device id only.
    DeviceId,
    /// Hex device id plus unit code.
    DeviceIdUnit,
}

impl Family {
    /// All families, in packet type order.
    pub const ALL: [Family; 7] = [
        Family::Lighting1,
        Family::Lighting2,
        Family::Lighting3,
        Family::Lighting4,
        Family::Lighting5,
        Family::Lighting6,
        Family::TempHum,
    ];

    /// Packet type byte (second byte of every frame).
    pub fn packet_type(self) -> u8 {
        match self {
            Family::Lighting1 => PACKET_TYPE_LIGHTING1,
            Family::Lighting2 => PACKET_TYPE_LIGHTING2,
            Family::Lighting3 => PACKET_TYPE_LIGHTING3,
            Family::Lighting4 => PACKET_TYPE_LIGHTING4,
            Family::Lighting5 => PACKET_TYPE_LIGHTING5,
            Family::Lighting6 => PACKET_TYPE_LIGHTING6,
            Family::TempHum => PACKET_TYPE_TEMP_HUM,
        }
    }

    /// Look up a family by its packet type byte.
    pub fn from_packet_type(packet_type: u8) -> Option<Family> {
        Family::ALL
            .into_iter()
            .find(|family| family.packet_type() == packet_type)
    }

    /// Whether frames of this family carry a subtype byte after the type byte.
    pub fn has_subtype(self) -> bool {
        match self {
            Family::Lighting1 | Family::Lighting2 | Family::Lighting5 | Family::TempHum => true,
            Family::Lighting3 | Family::Lighting4 | Family::Lighting6 => false,
        }
    }

    /// Identity layout shared by every protocol of the family.
    pub fn identity_kind(self) -> IdentityKind {
        match self {
            Family::Lighting1 => IdentityKind::HouseUnit,
            Family::Lighting4 | Family::TempHum => IdentityKind::DeviceId,
            Family::Lighting2 | Family::Lighting3 | Family::Lighting5 | Family::Lighting6 => {
                IdentityKind::DeviceIdUnit
            }
        }
    }

    /// Width of the device id field in bytes (0 for house/unit families).
    pub fn device_id_width(self) -> usize {
        match self {
            Family::Lighting1 => 0,
            Family::Lighting2 => 4,
            Family::Lighting3 | Family::Lighting6 | Family::TempHum => 2,
            Family::Lighting4 | Family::Lighting5 => 3,
        }
    }

    /// Total frame size in bytes, length byte included.
    pub fn frame_size(self) -> usize {
        match self {
            Family::Lighting1 | Family::Lighting4 => 8,
            Family::Lighting3 | Family::Lighting6 => 9,
            Family::Lighting5 | Family::TempHum => 11,
            Family::Lighting2 => 12,
        }
    }

    /// Offset of the sequence byte.
    pub fn sequence_offset(self) -> usize {
        if self.has_subtype() {
            3
        } else {
            2
        }
    }

    /// Offset of the first identity byte.
    pub fn identity_offset(self) -> usize {
        self.sequence_offset() + 1
    }

    /// Whether the family carries ON/OFF commands (everything but the sensor).
    pub fn is_command(self) -> bool {
        self != Family::TempHum
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Lighting1 => write!(f, "Lighting1"),
            Family::Lighting2 => write!(f, "Lighting2"),
            Family::Lighting3 => write!(f, "Lighting3"),
            Family::Lighting4 => write!(f, "Lighting4"),
            Family::Lighting5 => write!(f, "Lighting5"),
            Family::Lighting6 => write!(f, "Lighting6"),
            Family::TempHum => write!(f, "TempHum"),
        }
    }
}

/// Immutable description of one supported protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolDescriptor {
    /// Protocol name, e.g. `"ARC"`.
    pub name: &'static str,
    /// Packet family.
    pub family: Family,
    /// Subtype byte, `None` for families without one.
    pub subtype: Option<u8>,
}

impl ProtocolDescriptor {
    const fn new(name: &'static str, family: Family, subtype: Option<u8>) -> Self {
        ProtocolDescriptor {
            name,
            family,
            subtype,
        }
    }

    /// Packet type byte.
    pub fn packet_type(&self) -> u8 {
        self.family.packet_type()
    }

    /// Identity layout.
    pub fn identity_kind(&self) -> IdentityKind {
        self.family.identity_kind()
    }

    /// Look up a protocol by name (ASCII case-insensitive).
    pub fn lookup(name: &str) -> ProtocolResult<&'static ProtocolDescriptor> {
        let name = name.trim();
        PROTOCOLS
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ProtocolError::UnsupportedProtocol(name.to_string()))
    }

    /// Map the family and subtype read off the wire back to a protocol.
    ///
    /// For families without a subtype byte `subtype` must be `None`.
    pub fn from_wire(family: Family, subtype: Option<u8>) -> Option<&'static ProtocolDescriptor> {
        PROTOCOLS
            .iter()
            .find(|p| p.family == family && p.subtype == subtype)
    }
}

impl std::fmt::Display for ProtocolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Every supported protocol.
pub static PROTOCOLS: &[ProtocolDescriptor] = &[
    // Lighting1
    ProtocolDescriptor::new("X10", Family::Lighting1, Some(SUBTYPE_X10)),
    ProtocolDescriptor::new("ARC", Family::Lighting1, Some(SUBTYPE_ARC)),
    ProtocolDescriptor::new("ABICOD", Family::Lighting1, Some(SUBTYPE_ABICOD)),
    ProtocolDescriptor::new("WAVEMAN", Family::Lighting1, Some(SUBTYPE_WAVEMAN)),
    ProtocolDescriptor::new("EMW100", Family::Lighting1, Some(SUBTYPE_EMW100)),
    ProtocolDescriptor::new("IMPULS", Family::Lighting1, Some(SUBTYPE_IMPULS)),
    ProtocolDescriptor::new("RISINGSUN", Family::Lighting1, Some(SUBTYPE_RISINGSUN)),
    ProtocolDescriptor::new("PHILIPS", Family::Lighting1, Some(SUBTYPE_PHILIPS)),
    ProtocolDescriptor::new("ENERGENIE", Family::Lighting1, Some(SUBTYPE_ENERGENIE)),
    ProtocolDescriptor::new("ENERGENIE_5", Family::Lighting1, Some(SUBTYPE_ENERGENIE_5)),
    ProtocolDescriptor::new("COCOSTICK", Family::Lighting1, Some(SUBTYPE_COCOSTICK)),
    // Lighting2
    ProtocolDescriptor::new("AC", Family::Lighting2, Some(SUBTYPE_AC)),
    ProtocolDescriptor::new("HOMEEASY_EU", Family::Lighting2, Some(SUBTYPE_HOMEEASY_EU)),
    ProtocolDescriptor::new("ANSLUT", Family::Lighting2, Some(SUBTYPE_ANSLUT)),
    ProtocolDescriptor::new("KAMBROOK", Family::Lighting2, Some(SUBTYPE_KAMBROOK)),
    // Lighting3
    ProtocolDescriptor::new("IKEA_KOPPLA", Family::Lighting3, None),
    // Lighting4
    ProtocolDescriptor::new("PT2262", Family::Lighting4, None),
    // Lighting5
    ProtocolDescriptor::new("LIGHTWAVERF", Family::Lighting5, Some(SUBTYPE_LIGHTWAVERF)),
    ProtocolDescriptor::new("EMW100_GDO", Family::Lighting5, Some(SUBTYPE_EMW100_GDO)),
    ProtocolDescriptor::new("BBSB", Family::Lighting5, Some(SUBTYPE_BBSB)),
    ProtocolDescriptor::new("RSL", Family::Lighting5, Some(SUBTYPE_RSL)),
    ProtocolDescriptor::new("LIVOLO", Family::Lighting5, Some(SUBTYPE_LIVOLO)),
    ProtocolDescriptor::new("TRC02", Family::Lighting5, Some(SUBTYPE_TRC02)),
    ProtocolDescriptor::new("AOKE", Family::Lighting5, Some(SUBTYPE_AOKE)),
    ProtocolDescriptor::new("RGB_TRC02", Family::Lighting5, Some(SUBTYPE_RGB_TRC02)),
    // Lighting6
    ProtocolDescriptor::new("BLYSS", Family::Lighting6, None),
    // Sensors
    ProtocolDescriptor::new(PROTOCOL_TEMP_HUM, Family::TempHum, Some(SUBTYPE_TH13)),
];
