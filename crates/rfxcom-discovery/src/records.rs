//! Persisted device records.
//!
//! A [`DeviceRecord`] is what the user sees in the device list. Records are
//! written by hand as often as they are auto-registered, so matching an event
//! against them tolerates differences in case, separators and padding.

use chrono::{DateTime, Utc};
use rfxcom_protocol::{
    house_code_byte, unit_code_byte, CommandRequest, DecodedEvent, HumidityStatus, Identity,
    SensorEvent, SwitchCommand,
};
use serde::{Deserialize, Serialize};

/// Latest reading of a temperature/humidity sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: u8,
    pub status: HumidityStatus,
    pub signal_level: u8,
    pub battery_ok: bool,
    pub updated_at: DateTime<Utc>,
}

impl SensorSnapshot {
    /// Snapshot a sensor report.
    pub fn from_event(event: &SensorEvent, at: DateTime<Utc>) -> Self {
        SensorSnapshot {
            temperature: event.temperature_celsius,
            humidity: event.humidity_percent,
            status: event.status,
            signal_level: event.signal_level,
            battery_ok: event.battery_ok,
            updated_at: at,
        }
    }
}

/// One configured device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Display name.
    pub name: String,
    /// Protocol name, e.g. `"ARC"`.
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Last reading, sensors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorSnapshot>,
}

impl DeviceRecord {
    /// Build a record for a freshly discovered device.
    ///
    /// The name defaults to `"{protocol} {identity}"`.
    pub fn from_event(event: &DecodedEvent, at: DateTime<Utc>) -> Self {
        let protocol = event.protocol().name.to_string();
        let identity = event.identity();

        let (house_code, unit_code, device_id) = match &identity {
            Identity::HouseUnit {
                house_code,
                unit_code,
            } => (Some(house_code.to_string()), Some(unit_code.to_string()), None),
            Identity::DeviceId { device_id } => (None, None, Some(device_id.clone())),
            Identity::DeviceIdUnit {
                device_id,
                unit_code,
            } => (None, Some(unit_code.to_string()), Some(device_id.clone())),
        };

        DeviceRecord {
            name: format!("{} {}", protocol, identity.key_string()),
            protocol,
            house_code,
            unit_code,
            device_id,
            sensor_data: event.as_sensor().map(|s| SensorSnapshot::from_event(s, at)),
        }
    }

    /// Command request addressing this device.
    pub fn to_request(&self, command: SwitchCommand) -> CommandRequest {
        CommandRequest {
            protocol: self.protocol.clone(),
            command,
            house_code: self.house_code.clone(),
            unit_code: self.unit_code.clone(),
            device_id: self.device_id.clone(),
        }
    }

    /// Whether this record names the device that produced `event`.
    ///
    /// Unit codes are compared as the encoder would transmit them, so a record
    /// with no unit code matches unit 1. House letters are compared as written.
    pub fn matches(&self, event: &DecodedEvent) -> bool {
        if !self.protocol.trim().eq_ignore_ascii_case(event.protocol().name) {
            return false;
        }

        let unit_matches = |unit: u8| unit_code_byte(self.unit_code.as_deref()) == unit;
        let id_matches = |id: &str| {
            self.device_id
                .as_deref()
                .is_some_and(|own| normalize_device_id(own) == normalize_device_id(id))
        };

        match event.identity() {
            Identity::HouseUnit {
                house_code,
                unit_code,
            } => self.house_matches(house_code) && unit_matches(unit_code),
            Identity::DeviceId { device_id } => id_matches(&device_id),
            Identity::DeviceIdUnit {
                device_id,
                unit_code,
            } => id_matches(&device_id) && unit_matches(unit_code),
        }
    }

    /// Compare the house letter as written, so codes the encoder cannot
    /// represent (outside `A`..`P`) still find their own record. A record
    /// without a house code means `A`.
    fn house_matches(&self, house_code: char) -> bool {
        match self.house_code.as_deref().map(str::trim) {
            Some(own) if !own.is_empty() => {
                let mut chars = own.chars();
                matches!(
                    (chars.next(), chars.next()),
                    (Some(c), None) if c.eq_ignore_ascii_case(&house_code)
                )
            }
            _ => house_code_byte(None) == house_code as u8,
        }
    }
}

/// Whether any record names the device that produced `event`.
pub fn is_configured(records: &[DeviceRecord], event: &DecodedEvent) -> bool {
    records.iter().any(|record| record.matches(event))
}

/// Canonical form of a device id for comparison.
///
/// Separators and a `0x` prefix are removed, letters uppercased and leading
/// zeros dropped.
pub fn normalize_device_id(device_id: &str) -> String {
    let digits: String = device_id
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | ':' | '-'))
        .collect::<String>()
        .to_ascii_uppercase();
    let digits = digits.strip_prefix("0X").unwrap_or(&digits);
    digits.trim_start_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfxcom_protocol::decode;

    fn arc_a1() -> DecodedEvent {
        decode(&[0x07, 0x10, 0x01, 0x62, 0x41, 0x01, 0x01, 0x00]).unwrap()
    }

    fn ac_event() -> DecodedEvent {
        decode(&[0x0B, 0x11, 0x00, 0x01, 0x02, 0x38, 0x2C, 0x82, 0x02, 0x01, 0x0F, 0x50]).unwrap()
    }

    fn temp_hum() -> DecodedEvent {
        decode(&[0x0A, 0x52, 0x0D, 0x35, 0x68, 0x03, 0x00, 0xD4, 0x27, 0x02, 0x89]).unwrap()
    }

    fn record(protocol: &str) -> DeviceRecord {
        DeviceRecord {
            name: "test".to_string(),
            protocol: protocol.to_string(),
            house_code: None,
            unit_code: None,
            device_id: None,
            sensor_data: None,
        }
    }

    #[test]
    fn test_record_from_house_unit_event() {
        let record = DeviceRecord::from_event(&arc_a1(), Utc::now());
        assert_eq!(record.name, "ARC A_1");
        assert_eq!(record.house_code.as_deref(), Some("A"));
        assert_eq!(record.unit_code.as_deref(), Some("1"));
        assert_eq!(record.device_id, None);
        assert!(record.sensor_data.is_none());
    }

    #[test]
    fn test_record_from_sensor_event() {
        let now = Utc::now();
        let record = DeviceRecord::from_event(&temp_hum(), now);
        assert_eq!(record.name, "TEMP_HUM 26627");
        assert_eq!(record.device_id.as_deref(), Some("26627"));

        let snapshot = record.sensor_data.unwrap();
        assert_eq!(snapshot.humidity, 39);
        assert_eq!(snapshot.status, HumidityStatus::Dry);
        assert!(snapshot.battery_ok);
        assert_eq!(snapshot.updated_at, now);
    }

    #[test]
    fn test_house_unit_matching() {
        let mut r = record("arc");
        r.house_code = Some("a".to_string());
        r.unit_code = Some("01".to_string());
        assert!(r.matches(&arc_a1()));

        r.unit_code = Some("2".to_string());
        assert!(!r.matches(&arc_a1()));

        r.unit_code = None;
        assert!(r.matches(&arc_a1()));
    }

    #[test]
    fn test_house_code_outside_a_to_p_matches_own_record() {
        let x10_q1 = decode(&[0x07, 0x10, 0x00, 0x01, 0x51, 0x01, 0x01, 0x00]).unwrap();
        let record = DeviceRecord::from_event(&x10_q1, Utc::now());
        assert_eq!(record.house_code.as_deref(), Some("Q"));
        assert!(record.matches(&x10_q1));
        assert!(is_configured(&[record.clone()], &x10_q1));

        let x10_a1 = decode(&[0x07, 0x10, 0x00, 0x02, 0x41, 0x01, 0x01, 0x00]).unwrap();
        assert!(!record.matches(&x10_a1));
    }

    #[test]
    fn test_device_id_matching_ignores_representation() {
        let mut r = record("AC");
        r.unit_code = Some("2".to_string());
        for id in ["02382C82", "2382c82", "02:38:2C:82", "0x02382c82", "02-38-2c-82"] {
            r.device_id = Some(id.to_string());
            assert!(r.matches(&ac_event()), "{}", id);
        }

        r.device_id = Some("02382C83".to_string());
        assert!(!r.matches(&ac_event()));
    }

    #[test]
    fn test_protocol_must_match() {
        let mut r = record("HOMEEASY_EU");
        r.device_id = Some("02382C82".to_string());
        r.unit_code = Some("2".to_string());
        assert!(!r.matches(&ac_event()));
    }

    #[test]
    fn test_is_configured() {
        let mut sensor = record("TEMP_HUM");
        sensor.device_id = Some("26627".to_string());
        let records = vec![record("ARC"), sensor];

        assert!(is_configured(&records, &temp_hum()));
        assert!(is_configured(&records, &arc_a1()));
        assert!(!is_configured(&records, &ac_event()));
        assert!(!is_configured(&[], &arc_a1()));
    }

    #[test]
    fn test_to_request() {
        let record = DeviceRecord::from_event(&ac_event(), Utc::now());
        let request = record.to_request(SwitchCommand::Off);
        assert_eq!(request.protocol, "AC");
        assert_eq!(request.device_id.as_deref(), Some("02382C82"));
        assert_eq!(request.unit_code.as_deref(), Some("2"));
        assert_eq!(request.command, SwitchCommand::Off);
    }

    #[test]
    fn test_yaml_round_trip() {
        let records = vec![
            DeviceRecord::from_event(&arc_a1(), Utc::now()),
            DeviceRecord::from_event(&temp_hum(), Utc::now()),
        ];
        let yaml = serde_yaml::to_string(&records).unwrap();
        assert!(!yaml.contains("house_code: null"));
        let parsed: Vec<DeviceRecord> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_normalize_device_id() {
        assert_eq!(normalize_device_id("0x00AB:cd"), "ABCD");
        assert_eq!(normalize_device_id(" 01 02 "), "102");
        assert_eq!(normalize_device_id("0000"), "");
    }
}
