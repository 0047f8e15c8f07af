//! Source of the current UTC instant.
//!
//! Every component that compares against "now" receives a [`TimeSource`] instead of
//! calling the system clock directly, so tests can pin time to a known instant.

use chrono::{DateTime, Utc};
use mockall::automock;

/// Supplies the current UTC instant.
#[automock]
pub trait TimeSource: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// [`TimeSource`] backed by the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_time_source_is_close_to_utc_now() {
        let before = Utc::now();
        let now = SystemTimeSource.now();
        let after = Utc::now();

        assert!(before <= now && now <= after);
    }

    #[test]
    fn test_mock_time_source_returns_pinned_instant() {
        let pinned = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut time_source = MockTimeSource::new();
        time_source.expect_now().return_const(pinned);

        assert_eq!(time_source.now(), pinned);
    }
}
