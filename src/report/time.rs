use chrono::{DateTime, Datelike, Duration, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Parse an RFC 3339 timestamp as sent by GitHub. Empty strings and
/// GitHub's zero date count as absent.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value).ok()?.with_timezone(&Utc);
    (parsed.year() > 1).then_some(parsed)
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// "3 hours ago" style rendering of `timestamp` relative to `now`.
/// Months are 30 days and years 365 days. Future instants read "just now".
pub fn format_relative(now: DateTime<Utc>, timestamp: DateTime<Utc>) -> String {
    let secs = (now - timestamp).num_seconds();
    if secs < MINUTE {
        return "just now".to_string();
    }
    if secs < HOUR {
        return plural(secs / MINUTE, "minute");
    }
    if secs < DAY {
        return plural(secs / HOUR, "hour");
    }
    let days = secs / DAY;
    if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(days / 30, "month")
    } else {
        plural(days / 365, "year")
    }
}

/// "45s", "2m 5s" or "2h 2m". Truncates, never rounds.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    if secs < MINUTE {
        format!("{secs}s")
    } else if secs < HOUR {
        format!("{}m {}s", secs / MINUTE, secs % MINUTE)
    } else {
        format!("{}h {}m", secs / HOUR, (secs % HOUR) / MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2025-06-01T12:00:00Z").unwrap()
    }

    fn ago(secs: i64) -> String {
        format_relative(now(), now() - Duration::seconds(secs))
    }

    #[test]
    fn test_relative_buckets() {
        assert_eq!(ago(30), "just now");
        assert_eq!(ago(90), "1 minute ago");
        assert_eq!(ago(150), "2 minutes ago");
        assert_eq!(ago(3600), "1 hour ago");
        assert_eq!(ago(7200), "2 hours ago");
        assert_eq!(ago(26 * 3600), "1 day ago");
        assert_eq!(ago(29 * DAY), "29 days ago");
        assert_eq!(ago(40 * DAY), "1 month ago");
        assert_eq!(ago(300 * DAY), "10 months ago");
        assert_eq!(ago(400 * DAY), "1 year ago");
        assert_eq!(ago(800 * DAY), "2 years ago");
    }

    #[test]
    fn test_relative_future_is_just_now() {
        assert_eq!(ago(-3600), "just now");
    }

    #[test]
    fn test_duration() {
        assert_eq!(format_duration(Duration::seconds(45)), "45s");
        assert_eq!(format_duration(Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(Duration::seconds(7325)), "2h 2m");
        assert_eq!(format_duration(Duration::milliseconds(59_999)), "59s");
        assert_eq!(format_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2025-01-01T00:00:00Z").is_some());
        assert!(parse_timestamp("2025-01-01T02:00:00+02:00").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("0001-01-01T00:00:00Z").is_none());
    }
}
