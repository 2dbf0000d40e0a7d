use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::GatewayError;

/// A device notification as it arrived at the boundary, before normalization.
///
/// When nothing had to be added to it, the trap keeps the exact text it arrived
/// as and publishes that text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrap {
    fields: Map<String, Value>,
    original: Option<String>,
}

impl RawTrap {
    /// Parses an HTTP request body. The body must be a JSON object carrying `source_ip`.
    pub fn from_http_body(body: &[u8]) -> Result<Self, GatewayError> {
        let mut trap = Self::parse(body)?;
        if !trap.fields.contains_key("source_ip") {
            return Err(GatewayError::Validation(
                "Payload must be JSON with 'source_ip' field".to_string(),
            ));
        }
        trap.original = Some(utf8_text(body)?);
        Ok(trap)
    }

    /// Parses a UDP datagram, filling `source_ip` from the sender when the payload omits it.
    pub fn from_datagram(data: &[u8], sender: SocketAddr) -> Result<Self, GatewayError> {
        let mut trap = Self::parse(data)?;
        if trap.fields.contains_key("source_ip") {
            trap.original = Some(utf8_text(data)?);
        } else {
            trap.fields
                .insert("source_ip".to_string(), Value::String(sender.ip().to_string()));
        }
        Ok(trap)
    }

    fn parse(data: &[u8]) -> Result<Self, GatewayError> {
        match serde_json::from_slice::<Value>(data)? {
            Value::Object(fields) => Ok(Self { fields, original: None }),
            _ => Err(GatewayError::Validation(
                "Payload must be a JSON object".to_string(),
            )),
        }
    }

    pub fn source_ip(&self) -> Option<&Value> {
        self.fields.get("source_ip")
    }

    /// Short form of `source_ip` for log lines.
    pub fn source_label(&self) -> String {
        match self.source_ip() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        match &self.original {
            Some(text) => Ok(text.clone()),
            None => serde_json::to_string(&self.fields),
        }
    }
}

fn utf8_text(data: &[u8]) -> Result<String, GatewayError> {
    std::str::from_utf8(data)
        .map(str::to_string)
        .map_err(|_| GatewayError::Validation("Payload must be UTF-8 text".to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Warning,
    Cleared,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "MAJOR" => Ok(Severity::Major),
            "MINOR" => Ok(Severity::Minor),
            "WARNING" => Ok(Severity::Warning),
            "CLEARED" => Ok(Severity::Cleared),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Warning => "WARNING",
            Severity::Cleared => "CLEARED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmStatus {
    Raised,
    Cleared,
    Acked,
}

impl FromStr for AlarmStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RAISED" => Ok(AlarmStatus::Raised),
            "CLEARED" => Ok(AlarmStatus::Cleared),
            "ACKED" => Ok(AlarmStatus::Acked),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlarmStatus::Raised => "RAISED",
            AlarmStatus::Cleared => "CLEARED",
            AlarmStatus::Acked => "ACKED",
        };
        f.write_str(s)
    }
}

/// Opaque identifier; re-serializes exactly as it was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Text(s) => f.write_str(s),
            Identifier::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Identifier {
    /// True for a text id with nothing but whitespace in it.
    pub fn is_blank(&self) -> bool {
        matches!(self, Identifier::Text(s) if s.trim().is_empty())
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

/// Normalized alarm as carried on the `alarms` channel.
///
/// Every field is optional on the wire. `severity` and `status` keep the casing
/// the producer used; use [`AlarmEvent::severity`] and [`AlarmEvent::status`] for
/// case-insensitive comparisons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, rename = "severity", skip_serializing_if = "Option::is_none")]
    pub raw_severity: Option<String>,
    #[serde(default, rename = "status", skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl AlarmEvent {
    /// Parses one channel message. Only JSON objects are accepted.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(payload)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            _ => Err(serde_json::Error::custom("alarm event must be a JSON object")),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn severity(&self) -> Option<Severity> {
        self.raw_severity.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn status(&self) -> Option<AlarmStatus> {
        self.raw_status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Applies the producer-side defaults: a missing timestamp becomes `now`,
    /// a missing alarm id becomes a fresh UUID. Consumers must not call this.
    pub fn normalized(mut self, now: DateTime<Utc>) -> Self {
        if self.timestamp.as_deref().is_none_or(str::is_empty) {
            self.timestamp = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        if self.alarm_id.as_ref().is_none_or(Identifier::is_blank) {
            self.alarm_id = Some(Identifier::Text(uuid::Uuid::new_v4().to_string()));
        }
        self
    }

    /// Alarm id for log correlation.
    pub fn id_label(&self) -> String {
        self.alarm_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "n/a".to_string())
    }
}

/// Alarm shape expected by the external network-management system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NmsEvent {
    pub event_type: Option<String>,
    pub alarm_id: Option<Identifier>,
    pub device_id: Option<Identifier>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

impl From<&AlarmEvent> for NmsEvent {
    fn from(event: &AlarmEvent) -> Self {
        Self {
            event_type: event.event_type.clone(),
            alarm_id: event.alarm_id.clone(),
            device_id: event.device_id.clone(),
            severity: event.raw_severity.clone(),
            status: event.raw_status.clone(),
            timestamp: event.timestamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sender() -> SocketAddr {
        "10.0.0.7:40000".parse().unwrap()
    }

    #[test]
    fn test_http_body_requires_source_ip() {
        let err = RawTrap::from_http_body(br#"{"oid":"1.3.6.1"}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));

        let trap = RawTrap::from_http_body(br#"{"source_ip":"10.1.1.1","oid":"1.3.6.1"}"#).unwrap();
        assert_eq!(trap.source_label(), "10.1.1.1");
    }

    #[test]
    fn test_http_body_rejects_invalid_json_and_non_objects() {
        assert!(matches!(
            RawTrap::from_http_body(b"not json").unwrap_err(),
            GatewayError::Parse(_)
        ));
        assert!(matches!(
            RawTrap::from_http_body(br#"["source_ip"]"#).unwrap_err(),
            GatewayError::Validation(_)
        ));
    }

    #[test]
    fn test_http_body_is_kept_unmodified() {
        let body = r#"{"source_ip":"10.0.0.1", "counter":18446744073709551616,"a":1}"#;
        let trap = RawTrap::from_http_body(body.as_bytes()).unwrap();
        assert_eq!(trap.to_payload().unwrap(), body);
    }

    #[test]
    fn test_datagram_with_source_ip_is_kept_unmodified() {
        let data = r#"{"z":1,"source_ip":"192.168.1.1","big":123456789012345678901234567890}"#;
        let trap = RawTrap::from_datagram(data.as_bytes(), sender()).unwrap();
        assert_eq!(trap.to_payload().unwrap(), data);
    }

    #[test]
    fn test_datagram_injects_sender_ip() {
        let trap = RawTrap::from_datagram(br#"{"oid":"1.3.6.1"}"#, sender()).unwrap();
        assert_eq!(trap.source_ip(), Some(&Value::String("10.0.0.7".to_string())));
    }

    #[test]
    fn test_datagram_keeps_existing_source_ip() {
        let trap = RawTrap::from_datagram(br#"{"source_ip":"192.168.1.1"}"#, sender()).unwrap();
        assert_eq!(trap.source_label(), "192.168.1.1");
    }

    #[test]
    fn test_severity_and_status_are_case_insensitive() {
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("Major".parse::<Severity>(), Ok(Severity::Major));
        assert_eq!("raised".parse::<AlarmStatus>(), Ok(AlarmStatus::Raised));
        assert_eq!("AcKeD".parse::<AlarmStatus>(), Ok(AlarmStatus::Acked));
        assert!("fatal".parse::<Severity>().is_err());

        let event = AlarmEvent::from_json(r#"{"severity":"minor","status":"Cleared"}"#).unwrap();
        assert_eq!(event.severity(), Some(Severity::Minor));
        assert_eq!(event.status(), Some(AlarmStatus::Cleared));
        assert_eq!(Severity::Minor.to_string(), "MINOR");
    }

    #[test]
    fn test_alarm_event_tolerates_missing_fields() {
        let event = AlarmEvent::from_json("{}").unwrap();
        assert_eq!(event, AlarmEvent::default());
        assert_eq!(event.id_label(), "n/a");
        assert!(AlarmEvent::from_json("[1,2]").is_err());
    }

    #[test]
    fn test_numeric_identifiers_round_trip_unchanged() {
        let event = AlarmEvent::from_json(r#"{"alarm_id":42,"device_id":"sw-1"}"#).unwrap();
        assert_eq!(event.id_label(), "42");
        let json: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["alarm_id"], serde_json::json!(42));
        assert_eq!(json["device_id"], serde_json::json!("sw-1"));
    }

    #[test]
    fn test_normalized_fills_timestamp_and_id_once() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = AlarmEvent::default().normalized(now);
        assert_eq!(event.timestamp.as_deref(), Some("2024-05-01T12:00:00.000Z"));
        assert!(event.alarm_id.is_some());

        let existing = AlarmEvent {
            alarm_id: Some("A-1".into()),
            timestamp: Some("2023-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        let kept = existing.clone().normalized(now);
        assert_eq!(kept, existing);
    }

    #[test]
    fn test_normalized_replaces_blank_alarm_id() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for payload in [r#"{"alarm_id":""}"#, r#"{"alarm_id":"   "}"#] {
            let event = AlarmEvent::from_json(payload).unwrap().normalized(now);
            let id = event.alarm_id.expect("alarm id filled");
            assert!(!id.is_blank(), "{}", payload);
            assert_eq!(id.to_string().len(), 36);
        }

        let numeric = AlarmEvent::from_json(r#"{"alarm_id":0}"#).unwrap().normalized(now);
        assert_eq!(numeric.id_label(), "0");
    }

    #[test]
    fn test_nms_event_renames_fields_only() {
        let event = AlarmEvent::from_json(
            r#"{"alarm_id":"A-9","device_id":"rtr-1","event_type":"linkDown","severity":"critical","status":"raised","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let nms = serde_json::to_value(NmsEvent::from(&event)).unwrap();
        assert_eq!(
            nms,
            serde_json::json!({
                "eventType": "linkDown",
                "alarmId": "A-9",
                "deviceId": "rtr-1",
                "severity": "critical",
                "status": "raised",
                "timestamp": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_nms_event_keeps_absent_fields_as_null() {
        let nms = serde_json::to_value(NmsEvent::from(&AlarmEvent::default())).unwrap();
        assert_eq!(nms["timestamp"], Value::Null);
        assert_eq!(nms["alarmId"], Value::Null);
    }
}
