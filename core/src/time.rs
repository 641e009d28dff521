use chrono::{FixedOffset, Offset, TimeZone, Utc};

/// Text shown instead of a timestamp when none is known.
pub const NO_TIMESTAMP_PLACEHOLDER: &str = "なし";

/// Offset applied to displayed timestamps unless configured otherwise (UTC+9).
pub const DEFAULT_DISPLAY_OFFSET_SECONDS: i32 = 9 * 60 * 60;

/// Source of wall-clock time measured in unix seconds.
pub trait Clock {
    /// Current unix time in whole seconds.
    fn now_unix(&self) -> i64;
}

/// Clock backed by the operating system's real-time clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Display offset used by [`format_time`].
#[must_use]
pub fn default_display_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_DISPLAY_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Formats unix seconds as `M月D日 HH:MM` in the default display offset.
///
/// `None` renders the placeholder; `Some(0)` is the epoch, not a missing value.
#[must_use]
pub fn format_time(unix_seconds: Option<i64>) -> String {
    format_time_with_offset(unix_seconds, default_display_offset())
}

/// Formats unix seconds as `M月D日 HH:MM` in the provided offset.
#[must_use]
pub fn format_time_with_offset(unix_seconds: Option<i64>, offset: FixedOffset) -> String {
    let Some(seconds) = unix_seconds else {
        return NO_TIMESTAMP_PLACEHOLDER.to_owned();
    };
    match Utc.timestamp_opt(seconds, 0).single() {
        Some(instant) => instant
            .with_timezone(&offset)
            .format("%-m月%-d日 %H:%M")
            .to_string(),
        None => NO_TIMESTAMP_PLACEHOLDER.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_renders_as_a_date() {
        assert_eq!(format_time(Some(0)), "1月1日 09:00");
        assert_eq!(
            format_time_with_offset(Some(0), Utc.fix()),
            "1月1日 00:00"
        );
    }

    #[test]
    fn missing_timestamp_renders_placeholder() {
        assert_eq!(format_time(None), NO_TIMESTAMP_PLACEHOLDER);
    }

    #[test]
    fn minutes_and_hours_are_zero_padded() {
        // 2024-03-05T01:07:00Z
        let unix = 1_709_600_820;
        assert_eq!(format_time_with_offset(Some(unix), Utc.fix()), "3月5日 01:07");
        assert_eq!(format_time(Some(unix)), "3月5日 10:07");
    }

    #[test]
    fn out_of_range_timestamp_renders_placeholder() {
        assert_eq!(format_time(Some(i64::MAX)), NO_TIMESTAMP_PLACEHOLDER);
    }
}
