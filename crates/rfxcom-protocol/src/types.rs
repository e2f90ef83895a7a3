//! Common types used in the protocol.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Binary switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchCommand {
    On,
    Off,
}

impl SwitchCommand {
    /// Parse a command name. `"on"` in any case is ON, anything else is OFF.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("on") {
            SwitchCommand::On
        } else {
            SwitchCommand::Off
        }
    }

    /// Command byte on the wire.
    pub fn to_byte(self) -> u8 {
        match self {
            SwitchCommand::On => CMD_BYTE_ON,
            SwitchCommand::Off => CMD_BYTE_OFF,
        }
    }

    /// Level byte for families that carry one. No partial dimming.
    pub fn level_byte(self) -> u8 {
        match self {
            SwitchCommand::On => LEVEL_FULL,
            SwitchCommand::Off => LEVEL_OFF,
        }
    }
}

impl From<u8> for SwitchCommand {
    fn from(byte: u8) -> Self {
        if byte == CMD_BYTE_ON {
            SwitchCommand::On
        } else {
            SwitchCommand::Off
        }
    }
}

impl std::fmt::Display for SwitchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchCommand::On => write!(f, "ON"),
            SwitchCommand::Off => write!(f, "OFF"),
        }
    }
}

/// Humidity status reported by a temperature/humidity sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HumidityStatus {
    Normal,
    Comfort,
    Dry,
    Wet,
    /// Status byte outside the known range.
    Unknown(u8),
}

impl From<u8> for HumidityStatus {
    fn from(byte: u8) -> Self {
        match byte {
            0 => HumidityStatus::Normal,
            1 => HumidityStatus::Comfort,
            2 => HumidityStatus::Dry,
            3 => HumidityStatus::Wet,
            other => HumidityStatus::Unknown(other),
        }
    }
}

impl std::fmt::Display for HumidityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HumidityStatus::Normal => write!(f, "Normal"),
            HumidityStatus::Comfort => write!(f, "Comfort"),
            HumidityStatus::Dry => write!(f, "Dry"),
            HumidityStatus::Wet => write!(f, "Wet"),
            HumidityStatus::Unknown(byte) => write!(f, "Unknown(0x{:02X})", byte),
        }
    }
}

/// The fields that name one physical device within a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// House code letter plus unit code (Lighting1).
    HouseUnit {
        /// House code letter, normally `'A'..='P'`.
        house_code: char,
        /// Unit code.
        unit_code: u8,
    },
    /// Device id only.
    DeviceId {
        /// Uppercase hex for lighting families, decimal for sensors.
        device_id: String,
    },
    /// Device id plus unit code.
    DeviceIdUnit {
        /// Uppercase hex device id.
        device_id: String,
        /// Unit code.
        unit_code: u8,
    },
}

impl Identity {
    /// Canonical identity string used in [`DeviceKey`].
    ///
    /// `"{house}_{unit}"` for house/unit identities, the device id otherwise.
    pub fn key_string(&self) -> String {
        match self {
            Identity::HouseUnit {
                house_code,
                unit_code,
            } => format!("{}_{}", house_code, unit_code),
            Identity::DeviceId { device_id } | Identity::DeviceIdUnit { device_id, .. } => {
                device_id.clone()
            }
        }
    }

    /// House code, if this is a house/unit identity.
    pub fn house_code(&self) -> Option<char> {
        match self {
            Identity::HouseUnit { house_code, .. } => Some(*house_code),
            _ => None,
        }
    }

    /// Unit code, if the identity carries one.
    pub fn unit_code(&self) -> Option<u8> {
        match self {
            Identity::HouseUnit { unit_code, .. } | Identity::DeviceIdUnit { unit_code, .. } => {
                Some(*unit_code)
            }
            Identity::DeviceId { .. } => None,
        }
    }

    /// Device id, if the identity carries one.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Identity::DeviceId { device_id } | Identity::DeviceIdUnit { device_id, .. } => {
                Some(device_id)
            }
            Identity::HouseUnit { .. } => None,
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::HouseUnit {
                house_code,
                unit_code,
            } => write!(f, "{}{}", house_code, unit_code),
            Identity::DeviceId { device_id } => write!(f, "{}", device_id),
            Identity::DeviceIdUnit {
                device_id,
                unit_code,
            } => write!(f, "{}/{}", device_id, unit_code),
        }
    }
}

/// Canonical `(protocol, identity)` pair used to deduplicate observations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceKey {
    /// Protocol name.
    pub protocol: String,
    /// Identity string, see [`Identity::key_string`].
    pub identity: String,
}

impl DeviceKey {
    /// Build a key from a protocol name and identity.
    pub fn new(protocol: &str, identity: &Identity) -> Self {
        DeviceKey {
            protocol: protocol.to_string(),
            identity: identity.key_string(),
        }
    }
}

impl std::fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.protocol, self.identity)
    }
}

// ============================================================================
// Identity field conversion
// ============================================================================

/// Convert a house code to its wire byte.
///
/// A single letter `A`..`P` (either case) maps to its ASCII byte. Anything
/// else, including empty input, yields `'A'`.
pub fn house_code_byte(house_code: Option<&str>) -> u8 {
    let Some(code) = house_code.map(str::trim) else {
        return DEFAULT_HOUSE_CODE;
    };
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            let byte = c.to_ascii_uppercase() as u8;
            if (DEFAULT_HOUSE_CODE..=LAST_HOUSE_CODE).contains(&byte) {
                byte
            } else {
                DEFAULT_HOUSE_CODE
            }
        }
        _ => DEFAULT_HOUSE_CODE,
    }
}

/// Convert a unit code to its wire byte.
///
/// Decimal integers are clamped to `0..=255`; empty or non-numeric input
/// yields 1.
pub fn unit_code_byte(unit_code: Option<&str>) -> u8 {
    unit_code
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(|v| v.clamp(0, u8::MAX as i64) as u8)
        .unwrap_or(DEFAULT_UNIT_CODE)
}

/// Convert a hex device id string to exactly `width` bytes.
///
/// Separators (`' '`, `':'`, `'-'`) and a `0x` prefix are stripped and an odd
/// digit count gets a leading zero nibble. The value is big-endian: short ids
/// are left-padded with zero bytes and long ids keep their least-significant
/// `width` bytes. Unparseable input yields all zeros.
pub fn device_id_bytes(device_id: &str, width: usize) -> Vec<u8> {
    let mut digits: String = device_id
        .chars()
        .filter(|c| !matches!(c, ' ' | ':' | '-'))
        .collect();
    if digits.starts_with("0x") || digits.starts_with("0X") {
        digits.drain(..2);
    }
    if digits.len() % 2 == 1 {
        digits.insert(0, '0');
    }

    let bytes = match hex::decode(&digits) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("invalid device id {:?}: {}", device_id, e);
            return vec![0u8; width];
        }
    };

    if bytes.len() >= width {
        bytes[bytes.len() - width..].to_vec()
    } else {
        let mut padded = vec![0u8; width - bytes.len()];
        padded.extend_from_slice(&bytes);
        padded
    }
}
