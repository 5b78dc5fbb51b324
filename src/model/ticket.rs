use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// Snapshot of one issue-tracker ticket, fetched once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub key: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// String form of the "BT number" custom field; never empty.
    pub bt_number: Option<String>,
    pub created: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,
}

impl Ticket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: None,
            status: None,
            priority: None,
            bt_number: None,
            created: None,
            updated: None,
        }
    }
}

/// Render a custom field value as text. Null, empty strings and empty
/// containers yield `None`.
pub fn custom_field_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        // Select-style fields carry their display text under "value".
        Value::Object(obj) => match obj.get("value") {
            Some(inner) => return custom_field_text(inner),
            None => return None,
        },
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(custom_field_text).collect();
            parts.join(", ")
        }
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Jira timestamps look like `2024-03-01T09:15:00.000+0600`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}
