//! Calendar utilities: day keys, weekday names, and the injectable clock.
//!
//! Every calendar-day decision in the engine is made in local time. Timestamps
//! arrive as strings and are parsed here; anything unparseable becomes
//! [`HabitError::InvalidDate`].

use chrono::{
    DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday,
};
use std::sync::Mutex;

use crate::error::{HabitError, HabitResult};

/// Format of a day key, e.g. `2025-03-14`.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now". Production uses [`SystemClock`]; tests pin time with [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// The current local calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Local noon on `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self::new(noon_or_utc(date))
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance_days(&self, days: u64) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(next) = guard.checked_add_days(Days::new(days)) {
            *guard = next;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Parse a stored timestamp into local time.
///
/// Accepts RFC 3339 (`2025-03-14T08:30:00Z`), a zone-less date-time which is
/// taken as local time, and a bare date which is taken as local noon on that day.
pub fn parse_timestamp(raw: &str) -> HabitResult<DateTime<Local>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Local));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| HabitError::InvalidDate(raw.to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DAY_KEY_FORMAT) {
        return local_noon(date);
    }
    Err(HabitError::InvalidDate(raw.to_string()))
}

/// The local calendar day a timestamp falls on.
pub fn day_of(raw: &str) -> HabitResult<NaiveDate> {
    parse_timestamp(raw).map(|dt| dt.date_naive())
}

/// True iff both timestamps fall on the same local calendar day.
pub fn same_day(a: &str, b: &str) -> HabitResult<bool> {
    Ok(day_of(a)? == day_of(b)?)
}

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

pub fn today_key(clock: &dyn Clock) -> String {
    day_key(clock.today())
}

pub fn yesterday_key(clock: &dyn Clock) -> String {
    day_key(previous_day(clock.today()).unwrap_or(NaiveDate::MIN))
}

/// Parse a `YYYY-MM-DD` day key.
pub fn parse_day_key(raw: &str) -> HabitResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DAY_KEY_FORMAT)
        .map_err(|_| HabitError::InvalidDate(raw.to_string()))
}

/// Lower-case full weekday name, `"monday"` … `"sunday"`.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    name_of(date.weekday())
}

fn name_of(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Canonical weekday name for user or legacy input (`"Mon"`, `"monday"`, `" WED "`).
pub fn canonical_day_name(raw: &str) -> Option<&'static str> {
    raw.trim().parse::<Weekday>().ok().map(name_of)
}

/// Sunday on or before `date`; weeks start on Sunday.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

/// `date + days`, saturating at the end of the representable range.
pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Local noon on `date`. Noon avoids the DST gaps that can swallow midnight.
pub fn local_noon(date: NaiveDate) -> HabitResult<DateTime<Local>> {
    Local
        .from_local_datetime(&date.and_time(noon()))
        .earliest()
        .ok_or_else(|| HabitError::InvalidDate(day_key(date)))
}

fn noon_or_utc(date: NaiveDate) -> DateTime<Local> {
    local_noon(date).unwrap_or_else(|_| Local.from_utc_datetime(&date.and_time(noon())))
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}
