//! Protocol constants
//!
//! Packet type bytes, subtype bytes and fixed field values of the RFXCOM
//! transceiver wire format.

// ============================================================================
// Packet Types
// ============================================================================

/// Lighting1: house code + unit code remotes (X10, ARC, ...).
pub const PACKET_TYPE_LIGHTING1: u8 = 0x10;
/// Lighting2: 26-bit addressable switches (AC, HomeEasy EU, ...).
pub const PACKET_TYPE_LIGHTING2: u8 = 0x11;
/// Lighting3: Ikea Koppla.
pub const PACKET_TYPE_LIGHTING3: u8 = 0x12;
/// Lighting4: PT2262 fixed-code remotes.
pub const PACKET_TYPE_LIGHTING4: u8 = 0x13;
/// Lighting5: LightwaveRF and friends.
pub const PACKET_TYPE_LIGHTING5: u8 = 0x14;
/// Lighting6: Blyss.
pub const PACKET_TYPE_LIGHTING6: u8 = 0x15;
/// Temperature + humidity sensor reports.
pub const PACKET_TYPE_TEMP_HUM: u8 = 0x52;

// ============================================================================
// Lighting1 Subtypes
// ============================================================================

pub const SUBTYPE_X10: u8 = 0x00;
pub const SUBTYPE_ARC: u8 = 0x01;
pub const SUBTYPE_ABICOD: u8 = 0x02;
pub const SUBTYPE_WAVEMAN: u8 = 0x03;
pub const SUBTYPE_EMW100: u8 = 0x04;
pub const SUBTYPE_IMPULS: u8 = 0x05;
pub const SUBTYPE_RISINGSUN: u8 = 0x06;
pub const SUBTYPE_PHILIPS: u8 = 0x07;
pub const SUBTYPE_ENERGENIE: u8 = 0x08;
pub const SUBTYPE_ENERGENIE_5: u8 = 0x09;
pub const SUBTYPE_COCOSTICK: u8 = 0x0A;

// ============================================================================
// Lighting2 Subtypes
// ============================================================================

pub const SUBTYPE_AC: u8 = 0x00;
pub const SUBTYPE_HOMEEASY_EU: u8 = 0x01;
pub const SUBTYPE_ANSLUT: u8 = 0x02;
pub const SUBTYPE_KAMBROOK: u8 = 0x03;

// ============================================================================
// Lighting5 Subtypes
// ============================================================================

pub const SUBTYPE_LIGHTWAVERF: u8 = 0x00;
pub const SUBTYPE_EMW100_GDO: u8 = 0x01;
pub const SUBTYPE_BBSB: u8 = 0x02;
pub const SUBTYPE_RSL: u8 = 0x03;
pub const SUBTYPE_LIVOLO: u8 = 0x04;
pub const SUBTYPE_TRC02: u8 = 0x05;
pub const SUBTYPE_AOKE: u8 = 0x06;
pub const SUBTYPE_RGB_TRC02: u8 = 0x07;

// ============================================================================
// Temperature/Humidity Subtypes
// ============================================================================

/// TH13 (Alecto WS1700 and compatibles). The only sensor model decoded.
pub const SUBTYPE_TH13: u8 = 0x0D;

// ============================================================================
// Field Values
// ============================================================================

/// Command byte for ON.
pub const CMD_BYTE_ON: u8 = 0x01;
/// Command byte for OFF (and anything that is not ON).
pub const CMD_BYTE_OFF: u8 = 0x00;
/// Level byte sent with ON where the family carries a level.
pub const LEVEL_FULL: u8 = 0x0F;
/// Level byte sent with OFF.
pub const LEVEL_OFF: u8 = 0x00;
/// Signal byte on outbound frames. Only the transceiver fills in real values.
pub const OUTBOUND_SIGNAL: u8 = 0x00;
/// Group byte sent on Lighting3/Lighting6 frames.
pub const DEFAULT_GROUP: u8 = 0x00;

/// House code used when none (or an invalid one) is supplied.
pub const DEFAULT_HOUSE_CODE: u8 = b'A';
/// Last valid house code.
pub const LAST_HOUSE_CODE: u8 = b'P';
/// Unit code used when none (or an invalid one) is supplied.
pub const DEFAULT_UNIT_CODE: u8 = 1;

// ============================================================================
// Framing
// ============================================================================

/// Smallest buffer the decoder will look at.
pub const MIN_FRAME_SIZE: usize = 4;
/// Smallest valid length byte.
pub const MIN_LENGTH_BYTE: u8 = 1;
/// Largest valid length byte. Anything above is line noise.
pub const MAX_LENGTH_BYTE: u8 = 50;

/// Protocol name of the temperature/humidity family.
pub const PROTOCOL_TEMP_HUM: &str = "TEMP_HUM";
