//! Calendar periods.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::schedule::error::ScheduleError;

/// Size of the periods a budget is spread across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    /// ISO weeks, Monday to Sunday.
    Weekly,
    /// Calendar months.
    #[default]
    Monthly,
}

impl PeriodGranularity {
    /// Returns the string representation of the granularity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a granularity from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period.
    pub end: NaiveDate,
}

impl Period {
    /// Number of calendar days in the period, both ends included.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Splits `[start, end]` into consecutive periods of `granularity`.
    ///
    /// The first period starts at `start` and the last ends at `end`, so
    /// partial weeks or months at either edge are kept, clipped.
    pub fn split(
        start: NaiveDate,
        end: NaiveDate,
        granularity: PeriodGranularity,
    ) -> Result<Vec<Self>, ScheduleError> {
        if start > end {
            return Err(ScheduleError::StartAfterEnd { start, end });
        }

        let mut periods = Vec::new();
        let mut current = start;

        loop {
            let natural_end = match granularity {
                PeriodGranularity::Weekly => end_of_week(current)?,
                PeriodGranularity::Monthly => last_day_of_month(current)?,
            };
            let period_end = natural_end.min(end);
            periods.push(Self {
                start: current,
                end: period_end,
            });

            if period_end >= end {
                break;
            }
            current = period_end
                .succ_opt()
                .ok_or(ScheduleError::DateOutOfRange(period_end))?;
        }

        Ok(periods)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

fn end_of_week(date: NaiveDate) -> Result<NaiveDate, ScheduleError> {
    let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
    date.checked_add_days(Days::new(to_sunday))
        .ok_or(ScheduleError::DateOutOfRange(date))
}

fn last_day_of_month(date: NaiveDate) -> Result<NaiveDate, ScheduleError> {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };

    next_month
        .and_then(|d| d.pred_opt())
        .ok_or(ScheduleError::DateOutOfRange(date))
}
