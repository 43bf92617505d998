//! Values carried by property-update events.
//!
//! The engine reports a changed property as a field name plus a loosely typed
//! value. The typed setters in [`crate::update`] decide whether a given value
//! fits the field it targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// New value of an updated artifact property.
///
/// # Examples
///
/// ```
/// use netcarve::PropertyValue;
///
/// let duration = PropertyValue::Int(30);
/// let status = PropertyValue::Text("completed".to_string());
///
/// assert_eq!(duration.as_int(), Some(30));
/// assert_eq!(status.as_text(), Some("completed"));
/// assert!(PropertyValue::Null.is_null());
/// ```
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    #[default]
    Null,
}

impl PropertyValue {
    /// True for [`PropertyValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the timestamp, parsing RFC 3339 text if needed.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            Self::Text(v) => DateTime::parse_from_rfc3339(v)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Null => "null",
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}
