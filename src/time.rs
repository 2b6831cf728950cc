// src/time.rs
//! Диапазоны дат, месяцы и периоды группировки для трендов

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ==================== ДИАПАЗОН ДАТ ====================

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// From the first day of `date`'s month up to `date`.
    pub fn month_to_date(date: NaiveDate) -> Self {
        Self { start: Month::of(date).first_day(), end: date }
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Проверка, содержит ли диапазон дату
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Equal-length period ending the day before `start`.
    pub fn previous_period(&self) -> Self {
        let end = self.start - Duration::days(1);
        let start = end - Duration::days(self.len_days() - 1);
        Self { start, end }
    }

    pub fn clamp_to(&self, bounds: &DateRange) -> Self {
        Self {
            start: self.start.clamp(bounds.start, bounds.end),
            end: self.end.clamp(bounds.start, bounds.end),
        }
    }
}

// ==================== МЕСЯЦ ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn first_day(&self) -> NaiveDate {
        // month всегда 1..=12, т.к. строится только из NaiveDate
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
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

    /// Every month from `from` to `to`, both included.
    pub fn range_inclusive(from: Month, to: Month) -> Vec<Month> {
        let mut months = Vec::new();
        let mut current = from;
        while current <= to {
            months.push(current);
            current = current.next();
        }
        months
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==================== ПЕРИОДЫ ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Monthly,
    Weekly,
}

/// Bucket a date falls into for trend grouping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub start: NaiveDate,
    pub label: String,
}

impl Period {
    pub fn of(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Monthly => {
                let month = Month::of(date);
                Self { start: month.first_day(), label: month.label() }
            }
            Granularity::Weekly => {
                // Неделя понедельник - воскресенье
                let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
                let sunday = monday + Duration::days(6);
                Self {
                    start: monday,
                    label: format!("{}/{}", monday.format("%Y-%m-%d"), sunday.format("%Y-%m-%d")),
                }
            }
        }
    }
}

// ==================== ТЕСТЫ ====================
