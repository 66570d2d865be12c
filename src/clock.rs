use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound,
    Utc,
};

use crate::error::{ServiceError, ServiceResult};

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
/// en-US locale rendering used by the attendance list view, e.g. `10/17/2026, 8:05:00 AM`
pub const DISPLAY_FMT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

const TIME_FMTS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// The service timezone. Every stored date/timestamp is a wall-clock value in this offset.
#[derive(Debug, Clone, Copy)]
pub struct ServiceClock {
    offset: FixedOffset,
}

impl ServiceClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Whole seconds, matching what a `DATETIME` column keeps.
    pub fn now(&self) -> NaiveDateTime {
        self.localize(Utc::now()).trunc_subsecs(0)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn localize(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    /// Calendar date for a check-in. Accepts `YYYY-MM-DD`, the scanner's
    /// `MM/DD/YYYY`, or an RFC 3339 instant; a missing value means today.
    pub fn normalize_date(&self, raw: Option<&str>) -> ServiceResult<NaiveDate> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(self.today()),
            Some(r) => r,
        };

        if let Ok(d) = NaiveDate::parse_from_str(raw, DATE_FMT) {
            return Ok(d);
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
            return Ok(d);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(self.localize(dt.with_timezone(&Utc)).date());
        }

        Err(ServiceError::validation(format!("Invalid date value: {raw}")))
    }

    /// Parses the date and time of an edited record into the stored pair.
    /// `time_in` may be a bare time or a full timestamp (its time part is used).
    pub fn parse_edit(&self, date: &str, time_in: &str) -> ServiceResult<(NaiveDate, NaiveDateTime)> {
        let invalid = || ServiceError::validation("Invalid date or time value.");

        let date = self.normalize_date(Some(date)).map_err(|_| invalid())?;
        let time = parse_time_of_day(time_in)
            .or_else(|_| parse_datetime(time_in).map(|dt| dt.time()))
            .map_err(|_| invalid())?;

        Ok((date, date.and_time(time)))
    }

    /// Inclusive `[today - 7d, today]`.
    pub fn week_window(&self) -> (NaiveDate, NaiveDate) {
        let today = self.today();
        (today - Duration::days(7), today)
    }

    /// First and last calendar day of the current month.
    pub fn month_window(&self) -> (NaiveDate, NaiveDate) {
        month_bounds(self.today())
    }
}

pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let next_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_first.and_then(|d| d.pred_opt()).unwrap_or(day);
    (first, last)
}

pub fn parse_time_of_day(raw: &str) -> ServiceResult<NaiveTime> {
    let raw = raw.trim();
    TIME_FMTS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ServiceError::validation(format!("Invalid time value: {raw}")))
}

fn parse_datetime(raw: &str) -> ServiceResult<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATETIME_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ServiceError::validation(format!("Invalid timestamp value: {raw}")))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// List-view rendering of a calendar date (midnight in the service timezone).
pub fn format_display(d: NaiveDate) -> String {
    d.and_time(NaiveTime::default()).format(DISPLAY_FMT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shanghai() -> ServiceClock {
        ServiceClock::new(FixedOffset::east_opt(8 * 3600).unwrap())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_date_means_today() {
        let clock = shanghai();
        assert_eq!(clock.normalize_date(None).unwrap(), clock.today());
        assert_eq!(clock.normalize_date(Some("  ")).unwrap(), clock.today());
    }

    #[test]
    fn scanner_and_iso_dates_are_accepted() {
        let clock = shanghai();
        assert_eq!(clock.normalize_date(Some("2026-10-17")).unwrap(), ymd(2026, 10, 17));
        assert_eq!(clock.normalize_date(Some("10/17/2026")).unwrap(), ymd(2026, 10, 17));
    }

    #[test]
    fn instants_are_shifted_into_the_service_timezone() {
        // 20:30 UTC is already the next morning in UTC+8
        let d = shanghai().normalize_date(Some("2026-10-16T20:30:00Z")).unwrap();
        assert_eq!(d, ymd(2026, 10, 17));
    }

    #[test]
    fn garbage_dates_are_validation_errors() {
        let err = shanghai().normalize_date(Some("yesterday")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn edit_combines_date_and_time() {
        let (d, t) = shanghai().parse_edit("2026-10-17", "08:05").unwrap();
        assert_eq!(d, ymd(2026, 10, 17));
        assert_eq!(format_datetime(t), "2026-10-17 08:05:00");

        let (_, t) = shanghai().parse_edit("2026-10-17", "2026-10-01 07:59:30").unwrap();
        assert_eq!(format_datetime(t), "2026-10-17 07:59:30");
    }

    #[test]
    fn edit_rejects_unparseable_parts() {
        assert!(shanghai().parse_edit("2026-13-40", "08:00").is_err());
        assert!(shanghai().parse_edit("2026-10-17", "25:99").is_err());
        assert!(shanghai().parse_edit("2026-10-17", "soon").is_err());
    }

    #[test]
    fn month_bounds_handle_december_and_leap_years() {
        assert_eq!(month_bounds(ymd(2026, 12, 9)), (ymd(2026, 12, 1), ymd(2026, 12, 31)));
        assert_eq!(month_bounds(ymd(2028, 2, 14)), (ymd(2028, 2, 1), ymd(2028, 2, 29)));
    }

    #[test]
    fn week_window_spans_eight_calendar_days() {
        let (from, to) = shanghai().week_window();
        assert_eq!((to - from).num_days(), 7);
    }

    #[test]
    fn list_view_uses_locale_timestamp() {
        assert_eq!(format_display(ymd(2026, 10, 7)), "10/7/2026, 12:00:00 AM");
        assert_eq!(format_date(ymd(2026, 10, 7)), "2026-10-07");
    }
}
