//! 유연한 날짜/시간 파싱.
//!
//! 클라이언트 편의를 위해 여러 형식을 허용합니다. 타임존이 없는 형식은
//! UTC로 해석합니다.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use klinesync_core::{SyncError, SyncResult};

/// 타임존 없는 형식들 (UTC로 해석).
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// 날짜/시간 문자열을 UTC 시각으로 파싱합니다.
///
/// 허용 형식: RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`,
/// `YYYY-MM-DD` (자정).
pub fn parse_datetime(input: &str) -> SyncResult<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(SyncError::InvalidRange(format!(
        "unrecognized datetime format: '{}'",
        trimmed
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_only_is_midnight() {
        assert_eq!(
            parse_datetime("2024-01-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_naive_datetime_variants() {
        assert_eq!(
            parse_datetime("2024-01-15 09:30").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2024-01-15 09:30:45").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 45).unwrap()
        );
    }

    #[test]
    fn test_parse_rfc3339_converts_to_utc() {
        assert_eq!(
            parse_datetime("2024-01-15T09:00:00+09:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime("yesterday").is_err());
        assert!(parse_datetime("2024/01/15").is_err());
        assert!(parse_datetime("").is_err());
    }
}
