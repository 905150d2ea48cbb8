use std::fmt::{Display, Formatter};
use thiserror::*;

use time::Weekday;

#[derive(Debug, Error)]
pub enum KontoDateUtilsError {
    #[error("Invalid date: {0}")]
    DateError(#[from] time::error::ComponentRange),

    #[error("Invalid month key: {0}")]
    MonthKeyError(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Monday => Self::Monday,
            Weekday::Tuesday => Self::Tuesday,
            Weekday::Wednesday => Self::Wednesday,
            Weekday::Thursday => Self::Thursday,
            Weekday::Friday => Self::Friday,
            Weekday::Saturday => Self::Saturday,
            Weekday::Sunday => Self::Sunday,
        }
    }
}
impl From<DayOfWeek> for Weekday {
    fn from(day_of_week: DayOfWeek) -> Self {
        match day_of_week {
            DayOfWeek::Monday => Self::Monday,
            DayOfWeek::Tuesday => Self::Tuesday,
            DayOfWeek::Wednesday => Self::Wednesday,
            DayOfWeek::Thursday => Self::Thursday,
            DayOfWeek::Friday => Self::Friday,
            DayOfWeek::Saturday => Self::Saturday,
            DayOfWeek::Sunday => Self::Sunday,
        }
    }
}

impl Display for DayOfWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Lowercase key as used in persisted work schedules.
    pub fn as_key(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "monday" => Some(DayOfWeek::Monday),
            "tuesday" => Some(DayOfWeek::Tuesday),
            "wednesday" => Some(DayOfWeek::Wednesday),
            "thursday" => Some(DayOfWeek::Thursday),
            "friday" => Some(DayOfWeek::Friday),
            "saturday" => Some(DayOfWeek::Saturday),
            "sunday" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }

    pub fn to_number(&self) -> u8 {
        match self {
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
            DayOfWeek::Sunday => 7,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(DayOfWeek::Monday),
            2 => Some(DayOfWeek::Tuesday),
            3 => Some(DayOfWeek::Wednesday),
            4 => Some(DayOfWeek::Thursday),
            5 => Some(DayOfWeek::Friday),
            6 => Some(DayOfWeek::Saturday),
            7 => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

/// A calendar month of a specific year, the aggregation key of the
/// working-time account.  Displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KontoMonth {
    year: i32,
    month: u8,
}

impl KontoMonth {
    pub fn new(year: i32, month: u8) -> Result<Self, KontoDateUtilsError> {
        time::Month::try_from(month)?;
        Ok(Self { year, month })
    }

    pub fn from_date(date: time::Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    pub fn parse(key: &str) -> Result<Self, KontoDateUtilsError> {
        let mut parts = key.splitn(2, '-');
        let year = parts
            .next()
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(|| KontoDateUtilsError::MonthKeyError(key.to_string()))?;
        let month = parts
            .next()
            .and_then(|m| m.parse::<u8>().ok())
            .ok_or_else(|| KontoDateUtilsError::MonthKeyError(key.to_string()))?;
        Self::new(year, month).map_err(|_| KontoDateUtilsError::MonthKeyError(key.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn first_day(&self) -> time::Date {
        time::Date::from_calendar_date(
            self.year,
            time::Month::try_from(self.month).expect("month checked on creation"),
            1,
        )
        .expect("first of month always exists")
    }

    pub fn last_day(&self) -> time::Date {
        let month = time::Month::try_from(self.month).expect("month checked on creation");
        let last = time::util::days_in_month(month, self.year);
        time::Date::from_calendar_date(self.year, month, last)
            .expect("last of month always exists")
    }

    pub fn contains(&self, date: time::Date) -> bool {
        date.year() == self.year && date.month() as u8 == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn iter_until(&self, end: &Self) -> KontoMonthIterator {
        KontoMonthIterator {
            current: *self,
            end: *end,
        }
    }

    /// All civil dates of the month, ascending.
    pub fn days(&self) -> DateRangeIterator {
        DateRangeIterator {
            current: Some(self.first_day()),
            end: self.last_day(),
        }
    }

    pub fn min(&self, o: KontoMonth) -> KontoMonth {
        if self < &o { *self } else { o }
    }

    pub fn max(&self, o: KontoMonth) -> KontoMonth {
        if self > &o { *self } else { o }
    }
}

impl Display for KontoMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<time::Date> for KontoMonth {
    fn from(date: time::Date) -> Self {
        Self::from_date(date)
    }
}

impl From<time::PrimitiveDateTime> for KontoMonth {
    fn from(date_time: time::PrimitiveDateTime) -> Self {
        Self::from_date(date_time.date())
    }
}

pub struct KontoMonthIterator {
    current: KontoMonth,
    end: KontoMonth,
}

impl Iterator for KontoMonthIterator {
    type Item = KontoMonth;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.end {
            None
        } else {
            let next = self.current;
            self.current = self.current.next();
            Some(next)
        }
    }
}

/// Inclusive day-by-day iteration over `[start, end]`.
pub fn iter_days(start: time::Date, end: time::Date) -> DateRangeIterator {
    DateRangeIterator {
        current: if start <= end { Some(start) } else { None },
        end,
    }
}

pub struct DateRangeIterator {
    current: Option<time::Date>,
    end: time::Date,
}

impl Iterator for DateRangeIterator {
    type Item = time::Date;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.current?;
        if date > self.end {
            self.current = None;
            return None;
        }
        self.current = date.next_day().filter(|next| *next <= self.end);
        Some(date)
    }
}

/// Round hours to two decimals, half away from zero.  Applied at persistence
/// boundaries only; intermediate sums keep full precision.
pub fn round_hours(hours: f32) -> f32 {
    (hours * 100.0).round() / 100.0
}
