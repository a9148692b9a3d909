//! Display helpers for durations and dates.

use chrono::{DateTime, Utc};

/// `1h 2m`, `3m 4s` or `5s`.
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Relative date in calendar days between `date` and `now`, in Chinese.
pub fn format_relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now.date_naive() - date.date_naive()).num_days().abs();
    match days {
        0 => "今天".to_string(),
        1 => "昨天".to_string(),
        2..=6 => format!("{days}天前"),
        7..=29 => format!("{}周前", days / 7),
        30..=364 => format!("{}个月前", days / 30),
        _ => format!("{}年前", days / 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0s");
        assert_eq!(format_time(59), "59s");
        assert_eq!(format_time(184), "3m 4s");
        assert_eq!(format_time(3720), "1h 2m");
    }

    #[test]
    fn test_relative_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0).unwrap();
        let ago = |d: i64| format_relative_date(now - Duration::days(d), now);
        assert_eq!(ago(0), "今天");
        assert_eq!(ago(1), "昨天");
        assert_eq!(ago(3), "3天前");
        assert_eq!(ago(14), "2周前");
        assert_eq!(ago(65), "2个月前");
        assert_eq!(ago(800), "2年前");
    }

    #[test]
    fn test_late_last_night_is_yesterday() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 0, 30, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 5, 19, 23, 50, 0).unwrap();
        assert_eq!(format_relative_date(late, now), "昨天");
    }
}
