//! Rows persisted by the [`AlertStore`](crate::store::AlertStore).
//!
//! The store keeps three logical tables: a single user row carrying the platform
//! setting, the current alert snapshot and the reminders.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

/// Gaming platform whose alerts are polled.
///
/// Serialized as its display name; deserialized case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "PS4")]
    Ps4,
    #[serde(rename = "PS5")]
    Ps5,
    XboxOne,
    XboxSeriesX,
    Switch,
}

impl Platform {
    /// Every supported platform, in display order.
    pub const ALL: [Platform; 6] = [
        Platform::Pc,
        Platform::Ps4,
        Platform::Ps5,
        Platform::XboxOne,
        Platform::XboxSeriesX,
        Platform::Switch,
    ];

    /// Display name of the platform, e.g. `PS4`.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Pc => "PC",
            Platform::Ps4 => "PS4",
            Platform::Ps5 => "PS5",
            Platform::XboxOne => "XboxOne",
            Platform::XboxSeriesX => "XboxSeriesX",
            Platform::Switch => "Switch",
        }
    }

    /// Path segment used by the alert API, the lower-cased display name.
    pub fn path_segment(&self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a string does not name a known [`Platform`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|platform| platform.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlatform(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// The single logical user of the application.
///
/// Exactly one row exists, identified by [`User::SENTINEL_USERNAME`]. The platform
/// stays empty until the user picks one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub platform: Option<Platform>,
}

impl User {
    pub const SENTINEL_USERNAME: &'static str = "local";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
}

/// A time-limited event fetched from the alert API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub mission_type: String,
    pub reward: String,
    pub expiry: DateTime<Utc>,
    pub status: AlertStatus,
}

impl Alert {
    /// Creates an active alert.
    pub fn new(mission_type: &str, reward: &str, expiry: DateTime<Utc>) -> Self {
        Alert {
            mission_type: mission_type.to_owned(),
            reward: reward.to_owned(),
            expiry,
            status: AlertStatus::Active,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "mission_type={}, reward={}, expiry={}",
            self.mission_type,
            self.reward,
            self.expiry.to_rfc3339()
        )
    }
}

/// A stored alert together with its row id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRow {
    pub id: u64,
    #[serde(flatten)]
    pub alert: Alert,
}

/// Category of a reminder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderType {
    Alerts,
    Activities,
    FoundryBuilds,
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ReminderType::Alerts => "Alerts",
            ReminderType::Activities => "Activities",
            ReminderType::FoundryBuilds => "Foundry Builds",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when a string does not name a known [`ReminderType`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown reminder type: {0}")]
pub struct UnknownReminderType(pub String);

impl FromStr for ReminderType {
    type Err = UnknownReminderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alerts" => Ok(ReminderType::Alerts),
            "activities" => Ok(ReminderType::Activities),
            "foundry" | "foundrybuilds" | "foundry_builds" => Ok(ReminderType::FoundryBuilds),
            _ => Err(UnknownReminderType(s.to_owned())),
        }
    }
}

/// Lifecycle of a reminder. `Completed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// A reminder as requested by the user, before it gets an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReminderDraft {
    pub reminder_type: ReminderType,
    pub details: String,
    pub scheduled_time: DateTime<Utc>,
}

/// A persisted reminder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: u64,
    pub user_id: u64,
    pub reminder_type: ReminderType,
    pub details: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: ReminderStatus,
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={}, type={}, scheduled_time={}, status={:?}",
            self.id,
            self.reminder_type,
            self.scheduled_time.to_rfc3339(),
            self.status
        )
    }
}
