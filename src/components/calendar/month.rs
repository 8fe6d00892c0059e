use chrono::{Datelike, NaiveDate};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// The month shown by the widget. `month` is zero-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayedMonth {
    pub year: i32,
    pub month: u32,
}

impl DisplayedMonth {
    /// Build from a year and a zero-based month; `None` if the month is out of range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let candidate = Self { year, month };
        (month < 12 && candidate.first_day_opt().is_some()).then_some(candidate)
    }

    /// Month containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    /// One-based month number
    pub fn number(&self) -> u32 {
        self.month + 1
    }

    pub fn next(&self) -> Self {
        if self.month == 11 {
            Self {
                year: self.year + 1,
                month: 0,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 0 {
            Self {
                year: self.year - 1,
                month: 11,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    fn first_day_opt(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day_opt().unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Inclusive first and last day
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.last_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month
    }

    /// Lower-case English month name
    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.month as usize % 12]
    }
}

impl fmt::Display for DisplayedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}
