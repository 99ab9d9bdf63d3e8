//! Validation records returned by the reputation API
//!
//! The API's response is treated as opaque pass-through data apart from the
//! handful of fields the classifier reads. Field order is preserved so the
//! bulk result table can present columns in the order the API sent them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Local field holding the screened address
pub const EMAIL_FIELD: &str = "email";
/// Local field holding the suspicious verdict
pub const SUSPICIOUS_FIELD: &str = "suspicious";

/// One validation response from the reputation API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRecord {
    fields: Map<String, Value>,
}

impl ValidationRecord {
    /// Wrap an already-decoded JSON object
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Decode a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Typed view over the fields the classifier consumes
    pub fn signals(&self) -> RiskSignals {
        RiskSignals::from_record(self)
    }

    /// Attach the screened address and the local verdict
    ///
    /// Existing values under the same keys are overwritten in place, so an
    /// API that echoes `email` back keeps its column position.
    pub fn annotate(&mut self, email: &str, suspicious: bool) {
        self.insert(EMAIL_FIELD, email);
        self.insert(SUSPICIOUS_FIELD, suspicious);
    }

    /// `success: false` responses carry an explanation in `message`
    pub fn api_rejection(&self) -> Option<String> {
        match self.fields.get("success") {
            Some(Value::Bool(false)) => Some(
                self.fields
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("no message")
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.fields) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.fields),
        }
    }
}

/// The risk fields of a [`ValidationRecord`], with explicit defaults
///
/// Absent or null fields read as `false` / `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskSignals {
    pub disposable: bool,
    pub spam_trap: bool,
    pub recent_abuse: bool,
    pub fraud_score: f64,
}

impl RiskSignals {
    pub fn from_record(record: &ValidationRecord) -> Self {
        Self {
            disposable: record.get("disposable").is_some_and(truthy),
            spam_trap: record.get("spam_trap").is_some_and(truthy),
            recent_abuse: record.get("recent_abuse").is_some_and(truthy),
            fraud_score: record.get("fraud_score").and_then(numeric).unwrap_or(0.0),
        }
    }
}

/// Loose truthiness: zero, empty and null are false
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> ValidationRecord {
        ValidationRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_signals_default_when_absent() {
        let signals = record(json!({"valid": true})).signals();
        assert_eq!(signals, RiskSignals::default());
    }

    #[test]
    fn test_signals_loose_truthiness() {
        let signals = record(json!({
            "disposable": 1,
            "spam_trap": "",
            "recent_abuse": null,
            "fraud_score": "82"
        }))
        .signals();

        assert!(signals.disposable);
        assert!(!signals.spam_trap);
        assert!(!signals.recent_abuse);
        assert_eq!(signals.fraud_score, 82.0);
    }

    #[test]
    fn test_non_numeric_fraud_score_reads_as_zero() {
        let signals = record(json!({"fraud_score": "high"})).signals();
        assert_eq!(signals.fraud_score, 0.0);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(ValidationRecord::from_value(json!([1, 2])).is_none());
        assert!(ValidationRecord::from_value(json!("text")).is_none());
    }

    #[test]
    fn test_annotate_appends_in_order() {
        let mut rec = record(json!({"valid": true, "fraud_score": 12}));
        rec.annotate("a@example.com", false);

        let keys: Vec<&str> = rec.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["valid", "fraud_score", "email", "suspicious"]);
        assert_eq!(rec.get("email"), Some(&json!("a@example.com")));
        assert_eq!(rec.get("suspicious"), Some(&json!(false)));
    }

    #[test]
    fn test_api_rejection() {
        let rec = record(json!({"success": false, "message": "Invalid key"}));
        assert_eq!(rec.api_rejection(), Some("Invalid key".to_string()));
        assert_eq!(record(json!({"success": true})).api_rejection(), None);
    }

    #[test]
    fn test_display_is_json() {
        let rec = record(json!({"valid": true, "fraud_score": 5}));
        assert_eq!(rec.to_string(), r#"{"valid":true,"fraud_score":5}"#);
    }
}
