//! Typed partial updates of stored VoIP calls.
//!
//! The engine names the property it refined. That name is resolved against the
//! closed set of mutable call fields, then paired with a value of the right
//! type into a [`CallUpdate`] before anything in the store is touched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{CallId, CallState, VoipCallPresentation};
use crate::error::UpdateError;
use crate::store::ArtifactStore;
use crate::value::PropertyValue;

/// Mutable fields of a stored call.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallField {
    Duration,
    StartTime,
    EndTime,
    Status,
    Codec,
}

impl CallField {
    /// Returns the canonical snake_case field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::Status => "status",
            Self::Codec => "codec",
        }
    }
}

impl fmt::Display for CallField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallField {
    type Err = UpdateError;

    /// Accepts snake_case and PascalCase spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "").to_ascii_lowercase();
        match normalized.as_str() {
            "duration" | "durationsecs" => Ok(Self::Duration),
            "starttime" => Ok(Self::StartTime),
            "endtime" => Ok(Self::EndTime),
            "status" | "state" | "callstate" => Ok(Self::Status),
            "codec" => Ok(Self::Codec),
            _ => Err(UpdateError::UnknownField { name: s.to_string() }),
        }
    }
}

/// A single-field change to a stored call.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallUpdate {
    Duration(u64),
    StartTime(Option<DateTime<Utc>>),
    EndTime(Option<DateTime<Utc>>),
    Status(CallState),
    Codec(Option<String>),
}

impl CallUpdate {
    /// Builds a typed update from an engine-reported field name and value.
    pub fn parse(field_name: &str, value: &PropertyValue) -> Result<Self, UpdateError> {
        let field: CallField = field_name.parse()?;
        Self::for_field(field, value)
    }

    /// Builds a typed update for a known field.
    pub fn for_field(field: CallField, value: &PropertyValue) -> Result<Self, UpdateError> {
        let mismatch = |expected: &'static str| UpdateError::TypeMismatch {
            field,
            expected,
            found: value.type_name(),
        };

        match field {
            CallField::Duration => {
                let secs = value.as_int().ok_or_else(|| mismatch("int"))?;
                let secs = u64::try_from(secs).map_err(|_| UpdateError::InvalidValue {
                    field,
                    reason: format!("duration cannot be negative ({secs})"),
                })?;
                Ok(Self::Duration(secs))
            }
            CallField::StartTime | CallField::EndTime => {
                let ts = if value.is_null() {
                    None
                } else {
                    Some(value.as_timestamp().ok_or_else(|| mismatch("timestamp"))?)
                };
                if field == CallField::StartTime {
                    Ok(Self::StartTime(ts))
                } else {
                    Ok(Self::EndTime(ts))
                }
            }
            CallField::Status => {
                let text = value.as_text().ok_or_else(|| mismatch("text"))?;
                let state = text
                    .parse::<CallState>()
                    .map_err(|reason| UpdateError::InvalidValue { field, reason })?;
                Ok(Self::Status(state))
            }
            CallField::Codec => match value {
                PropertyValue::Null => Ok(Self::Codec(None)),
                PropertyValue::Text(codec) => Ok(Self::Codec(Some(codec.clone()))),
                _ => Err(mismatch("text")),
            },
        }
    }

    /// The field this update writes.
    #[must_use]
    pub const fn field(&self) -> CallField {
        match self {
            Self::Duration(_) => CallField::Duration,
            Self::StartTime(_) => CallField::StartTime,
            Self::EndTime(_) => CallField::EndTime,
            Self::Status(_) => CallField::Status,
            Self::Codec(_) => CallField::Codec,
        }
    }

    /// Writes exactly this update's field. The call's id is never touched.
    pub fn apply_to(self, call: &mut VoipCallPresentation) {
        match self {
            Self::Duration(v) => call.duration_secs = v,
            Self::StartTime(v) => call.start_time = v,
            Self::EndTime(v) => call.end_time = v,
            Self::Status(v) => call.status = v,
            Self::Codec(v) => call.codec = v,
        }
    }
}

/// Result of applying an update to the call store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The stored call was changed.
    Applied,
    /// No call with that identity is stored; nothing was created.
    NotFound,
}

/// Applies a typed update to the call with the given identity, if stored.
pub fn apply(
    calls: &mut ArtifactStore<VoipCallPresentation>,
    id: &CallId,
    update: CallUpdate,
) -> ApplyOutcome {
    match calls.find_mut(id) {
        Some(call) => {
            update.apply_to(call);
            ApplyOutcome::Applied
        }
        None => ApplyOutcome::NotFound,
    }
}

/// Applies an engine-reported named field change.
///
/// Unknown field names and ill-typed values fail before the store is looked at.
pub fn apply_named(
    calls: &mut ArtifactStore<VoipCallPresentation>,
    id: &CallId,
    field_name: &str,
    value: &PropertyValue,
) -> Result<ApplyOutcome, UpdateError> {
    let update = CallUpdate::parse(field_name, value)?;
    Ok(apply(calls, id, update))
}
