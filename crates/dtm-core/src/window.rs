//! Trailing time window: only recent messages are eligible for mirroring.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::error;

/// Parse an ISO-8601 timestamp. A trailing `Z` or any offset is accepted;
/// timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `true` iff `now - timestamp < window`. Unparseable timestamps are never recent.
pub fn is_recent(timestamp: &str, window: Duration, now: DateTime<Utc>) -> bool {
    let Some(ts) = parse_timestamp(timestamp) else {
        error!(timestamp, "could not parse message timestamp");
        return false;
    };
    let Ok(window) = chrono::Duration::from_std(window) else {
        return true;
    };
    now.signed_duration_since(ts) < window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HOUR: Duration = Duration::from_secs(3600);

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn window_boundaries() {
        let ts = "2026-03-01T12:00:00Z";
        assert!(is_recent(ts, HOUR, base() + chrono::Duration::minutes(59)));
        assert!(!is_recent(ts, HOUR, base() + chrono::Duration::minutes(61)));
        assert!(!is_recent(ts, HOUR, base() + chrono::Duration::minutes(60)));
    }

    #[test]
    fn accepts_discord_style_offsets() {
        let ts = "2026-03-01T13:00:00.123000+01:00";
        assert_eq!(
            parse_timestamp(ts),
            Some(base() + chrono::Duration::milliseconds(123))
        );
        assert!(is_recent(ts, HOUR, base() + chrono::Duration::minutes(30)));
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(parse_timestamp("2026-03-01T12:00:00"), Some(base()));
        assert_eq!(
            parse_timestamp("2026-03-01T12:00:00.5"),
            Some(base() + chrono::Duration::milliseconds(500))
        );
    }

    #[test]
    fn future_messages_are_recent() {
        assert!(is_recent("2026-03-01T13:00:00Z", HOUR, base()));
    }

    #[test]
    fn garbage_is_not_recent() {
        assert!(!is_recent("yesterday-ish", HOUR, base()));
        assert!(!is_recent("", HOUR, base()));
    }
}
