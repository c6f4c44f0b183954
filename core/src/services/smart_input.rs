//! Smart input parser
//!
//! Turns a single line like "Buy milk !high tomorrow" into a task draft.
//! Matching is case-insensitive and never fails: text without any hint
//! comes back as the title with default priority and a due time of now.
//!
//! Evaluation order is fixed. Priority: `!high`/`!important`, then `!low`.
//! Date: `tomorrow`, then `tonight`, then `next week`; only the first date
//! hint found is applied and stripped, any other stays in the title.

use crate::config::{SMART_INPUT_EVENING_HOUR, SMART_INPUT_MORNING_HOUR};
use crate::database::{Category, Priority};
use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static HIGH_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!high|!important").expect("valid regex"));
static LOW_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)!low").expect("valid regex"));
static TOMORROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tomorrow").expect("valid regex"));
static TONIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)tonight").expect("valid regex"));
static NEXT_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)next week").expect("valid regex"));

/// Task fields extracted from free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartTaskDraft {
    pub title: String,
    pub priority: Priority,
    pub due: DateTime<Utc>,
    pub category: Category,
}

/// Parse `input` relative to `now`. Wall-clock hints ("tomorrow at 09:00")
/// are resolved in the time zone `now` carries.
pub fn parse_smart_task<Tz: TimeZone>(input: &str, now: DateTime<Tz>) -> SmartTaskDraft {
    let lower = input.to_lowercase();
    let mut title = input.to_string();
    let mut priority = Priority::Medium;

    if lower.contains("!high") || lower.contains("!important") {
        priority = Priority::High;
        title = HIGH_TOKENS.replace_all(&title, "").into_owned();
    } else if lower.contains("!low") {
        priority = Priority::Low;
        title = LOW_TOKEN.replace_all(&title, "").into_owned();
    }

    let mut due = now.with_timezone(&Utc);
    if lower.contains("tomorrow") {
        due = at_hour(&now, 1, SMART_INPUT_MORNING_HOUR);
        title = TOMORROW.replace_all(&title, "").into_owned();
    } else if lower.contains("tonight") {
        due = at_hour(&now, 0, SMART_INPUT_EVENING_HOUR);
        title = TONIGHT.replace_all(&title, "").into_owned();
    } else if lower.contains("next week") {
        due = at_hour(&now, 7, SMART_INPUT_MORNING_HOUR);
        title = NEXT_WEEK.replace_all(&title, "").into_owned();
    }

    SmartTaskDraft {
        title: title.split_whitespace().collect::<Vec<_>>().join(" "),
        priority,
        due,
        category: Category::Personal,
    }
}

/// `hour:00` local time, `days_ahead` calendar days after `now`.
/// Falls back to `now` when that wall time does not exist (DST gap).
fn at_hour<Tz: TimeZone>(now: &DateTime<Tz>, days_ahead: i64, hour: u32) -> DateTime<Utc> {
    let date = now.date_naive() + Duration::days(days_ahead);
    date.and_hms_opt(hour, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
