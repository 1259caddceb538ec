use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// A reporting period: one calendar month.
///
/// Entry queries use the half-open day range `[first_day, end_exclusive)`.
/// The canonical text form is `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period(NaiveDate);

impl Period {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(|| EngineError::InvalidPeriod(format!("{year:04}-{month:02}")))
    }

    /// The period containing `day`.
    #[must_use]
    pub fn containing(day: NaiveDate) -> Self {
        Period(day - Days::new(u64::from(day.day0())))
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First day of the period (inclusive query bound).
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// First day of the following month (exclusive query bound).
    #[must_use]
    pub fn end_exclusive(&self) -> NaiveDate {
        self.0 + Months::new(1)
    }

    /// Last day of the period.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.end_exclusive() - Days::new(1)
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.first_day() && day < self.end_exclusive()
    }

    /// Date at which report-level exchange rates are resolved: `today` while
    /// the period is still running, otherwise the period's last day.
    #[must_use]
    pub fn rate_anchor(&self, today: NaiveDate) -> NaiveDate {
        if self.contains(today) {
            today
        } else {
            self.last_day()
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month).map_err(|_| invalid())
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
