//! Recurrence computation
//!
//! Steps are taken on the wall clock of a time zone, not on the UTC
//! instant, so a task due at 01:00 local keeps its local day and hour.
//! Monthly steps keep the day-of-month and clamp to the last day when the
//! next month is shorter: Jan 31 advances to Feb 28/29 rather than spilling
//! into March.

use crate::database::RepeatType;
use chrono::{DateTime, Days, FixedOffset, Local, Months, NaiveDateTime, TimeZone, Utc};

/// Next due instant one recurrence unit after `date`, measured on the wall
/// clock of `tz`
pub fn advance<Tz: TimeZone>(date: DateTime<Utc>, repeat: RepeatType, tz: &Tz) -> DateTime<Utc> {
    let wall = date.with_timezone(tz).naive_local();
    let next = match repeat {
        RepeatType::None => return date,
        RepeatType::Daily => wall.checked_add_days(Days::new(1)),
        RepeatType::Weekly => wall.checked_add_days(Days::new(7)),
        RepeatType::Monthly => wall.checked_add_months(Months::new(1)),
    };
    // Only fails past chrono's representable range.
    let Some(next) = next else {
        return date;
    };
    resolve(tz, next).unwrap_or(date)
}

/// Map a wall-clock time back to an instant. Times skipped by a DST jump
/// move forward by the size of the gap (at most an hour in practice).
fn resolve<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&wall)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(wall + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|instant| instant.with_timezone(&Utc))
}

/// Zone whose calendar repeating tasks follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecurrenceZone {
    /// The machine's local zone
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl RecurrenceZone {
    pub fn advance(self, date: DateTime<Utc>, repeat: RepeatType) -> DateTime<Utc> {
        match self {
            RecurrenceZone::Local => advance(date, repeat, &Local),
            RecurrenceZone::Fixed(offset) => advance(date, repeat, &offset),
        }
    }
}
