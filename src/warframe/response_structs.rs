//! Response structures for the alert API.
//!
//! Records are deserialized leniently: every field is optional and kept as a raw
//! JSON value so a malformed field only affects itself, not the whole record.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Placeholder used for absent or malformed text fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Representation of one record from `/{platform}/alerts`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertResponse {
    /// Mission type, expected to be a string.
    pub mission_type: Option<Value>,
    /// Reward, either a string or an object with an `asString` field.
    pub reward: Option<Value>,
    /// ISO-8601 expiry instant.
    pub expiry: Option<Value>,
    /// Nested mission description used by the live API, read only when it is an
    /// object with `type` and `reward` fields.
    pub mission: Option<Value>,
}

impl AlertResponse {
    /// Mission type of the record, [`NOT_AVAILABLE`] when absent or malformed.
    pub fn mission_type(&self) -> String {
        text_of(self.mission_type.as_ref())
            .or_else(|| text_of(self.mission_field("type")))
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }

    /// Reward of the record, [`NOT_AVAILABLE`] when absent or malformed.
    pub fn reward(&self) -> String {
        reward_of(self.reward.as_ref())
            .or_else(|| reward_of(self.mission_field("reward")))
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }

    /// Parsed expiry, `None` when absent or not a valid ISO-8601 instant.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        let expiry = self.expiry.as_ref()?.as_str()?;
        DateTime::parse_from_rfc3339(expiry)
            .ok()
            .map(|expiry| expiry.with_timezone(&Utc))
    }

    /// Field of the nested `mission` object, `None` if `mission` is not an object.
    fn mission_field(&self, name: &str) -> Option<&Value> {
        self.mission.as_ref()?.as_object()?.get(name)
    }
}

fn text_of(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn reward_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(reward) => text_of(reward.get("asString")),
        other => text_of(Some(other)),
    }
}
