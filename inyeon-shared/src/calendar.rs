/// Calendar math
///
/// Months are computed in the calendar's local offset (KST by default) and
/// converted to UTC instants for querying. A month window runs from the first
/// day 00:00:00.000 to the last day 23:59:59.999 local time, and a plan
/// belongs to a month when it overlaps that window.
///
/// # Example
///
/// ```
/// use inyeon_shared::calendar::{MonthWindow, YearMonth, kst};
///
/// let march = YearMonth::new(2025, 3).expect("valid month");
/// let window = MonthWindow::new(march, kst());
/// assert_eq!(window.start.to_rfc3339(), "2025-02-28T15:00:00+00:00");
/// ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::plan::Plan;

/// Default calendar offset in minutes (UTC+9)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 540;

/// Upcoming plans cover today and the next this-many days
pub const UPCOMING_DAYS: i64 = 30;

/// The default calendar offset
pub fn kst() -> FixedOffset {
    offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix())
}

/// Builds an offset, rejecting anything beyond ±24h
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

/// Month navigation buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Navigate {
    Prev,
    Next,
    Today,
}

impl YearMonth {
    /// `None` unless `month` is 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month containing `instant` in the given offset
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::of(instant.with_timezone(&offset).date_naive())
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Target month of a navigation button
    pub fn navigate(&self, action: Navigate, today: NaiveDate) -> Self {
        match action {
            Navigate::Prev => self.prev(),
            Navigate::Next => self.next(),
            Navigate::Today => Self::of(today),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    start_of_day(date, offset) + Duration::days(1) - Duration::milliseconds(1)
}

/// UTC bounds of a month in a local offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub month: YearMonth,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    pub fn new(month: YearMonth, offset: FixedOffset) -> Self {
        Self {
            month,
            start: start_of_day(month.first_day(), offset),
            end: end_of_day(month.last_day(), offset),
        }
    }

    /// Inclusive overlap with `[start, end]`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end >= self.start
    }
}

/// Today 00:00 through today + [`UPCOMING_DAYS`] 23:59:59.999, local time
pub fn upcoming_window(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(&offset).date_naive();
    let last = today + Duration::days(UPCOMING_DAYS);

    (start_of_day(today, offset), end_of_day(last, offset))
}

/// A public holiday
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

impl Holiday {
    /// Parses the feed's `YYYYMMDD` date
    pub fn from_locdate(locdate: &str, name: impl Into<String>) -> Option<Self> {
        let date = NaiveDate::parse_from_str(locdate.trim(), "%Y%m%d").ok()?;
        Some(Self {
            date,
            name: name.into(),
        })
    }
}

/// Color used for holiday events
pub const HOLIDAY_COLOR: &str = "#EB5757";

/// Something drawn on the month grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Plan id; `None` for holidays
    pub id: Option<Uuid>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub colors: String,
    pub is_holiday: bool,
    /// Shown at a new position while the move is being saved
    #[serde(default)]
    pub pending: bool,
}

impl CalendarEvent {
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            id: Some(plan.plan_id),
            title: plan.title.clone(),
            start: plan.start_date,
            end: plan.end_date,
            colors: plan.color().to_string(),
            is_holiday: false,
            pending: false,
        }
    }

    /// All-day event covering the holiday in the given offset
    pub fn from_holiday(holiday: &Holiday, offset: FixedOffset) -> Self {
        Self {
            id: None,
            title: holiday.name.clone(),
            start: start_of_day(holiday.date, offset),
            end: end_of_day(holiday.date, offset),
            colors: HOLIDAY_COLOR.to_string(),
            is_holiday: true,
            pending: false,
        }
    }

    /// Holidays stay put; plans can be dragged
    pub fn is_draggable(&self) -> bool {
        !self.is_holiday && self.id.is_some()
    }
}

/// Month grid events: holidays first, then plans by start
pub fn build_events(plans: &[Plan], holidays: &[Holiday], offset: FixedOffset) -> Vec<CalendarEvent> {
    let mut plan_events: Vec<CalendarEvent> = plans.iter().map(CalendarEvent::from_plan).collect();
    plan_events.sort_by_key(|event| event.start);

    holidays
        .iter()
        .map(|holiday| CalendarEvent::from_holiday(holiday, offset))
        .chain(plan_events)
        .collect()
}
