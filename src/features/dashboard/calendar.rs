//! Reporting days follow the same UTC offset as booking codes, so a
//! booking coded `GC260308..` is counted on 2026-03-08 here as well.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Days shown in the dashboard trend, today included
pub const TREND_DAYS: u64 = 7;

/// UTC instants where the current reporting periods begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub today_start: DateTime<Utc>,
    pub trend_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
}

pub fn report_window(now: DateTime<Utc>, offset: FixedOffset) -> ReportWindow {
    let today = now.with_timezone(&offset).date_naive();
    let trend_first = today - Days::new(TREND_DAYS - 1);
    let month_first = today - Days::new(u64::from(today.day0()));

    ReportWindow {
        today_start: start_of(today, offset),
        trend_start: start_of(trend_first, offset),
        month_start: start_of(month_first, offset),
    }
}

/// Midnight of `date` in `offset`, as a UTC instant
pub fn start_of(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc = local_midnight - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// Offset in seconds, bound into SQL that shifts timestamps to local days
pub fn offset_seconds(offset: FixedOffset) -> f64 {
    f64::from(offset.local_minus_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    #[test]
    fn test_today_starts_at_local_midnight() {
        // 02:00 on the 8th in +05:30
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 20, 30, 0).unwrap();
        let window = report_window(now, ist());

        assert_eq!(
            window.today_start,
            Utc.with_ymd_and_hms(2026, 3, 7, 18, 30, 0).unwrap()
        );
        assert_eq!(
            window.trend_start,
            Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap()
        );
        assert_eq!(
            window.month_start,
            Utc.with_ymd_and_hms(2026, 2, 28, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_utc_offset_uses_calendar_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 20, 30, 0).unwrap();
        let window = report_window(now, Utc.fix());

        assert_eq!(
            window.today_start,
            Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window.month_start,
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_day_matches_booking_code_date() {
        use crate::features::bookings::booking_code::date_prefix;

        let now = Utc.with_ymd_and_hms(2026, 3, 7, 20, 30, 0).unwrap();
        let window = report_window(now, ist());

        assert_eq!(date_prefix(now, ist()), "GC260308");
        assert_eq!(
            window.today_start.with_timezone(&ist()).date_naive(),
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
        );
    }

    #[test]
    fn test_western_offset() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        // Still the 7th in -05:00
        let now = Utc.with_ymd_and_hms(2026, 3, 8, 3, 0, 0).unwrap();

        assert_eq!(
            report_window(now, est).today_start,
            Utc.with_ymd_and_hms(2026, 3, 7, 5, 0, 0).unwrap()
        );
        assert_eq!(offset_seconds(est), -18000.0);
    }
}
