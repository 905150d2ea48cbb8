//! Pure working-time arithmetic: contracted target hours, schedule-aware
//! business-day counting and the daily calculation that feeds the ledger.
//!
//! Everything in here is synchronous and side-effect free so it can be
//! exercised with plain facts in tests; the recompute orchestrator is the
//! only production caller.

use std::collections::BTreeSet;

use zeitkonto_utils::{iter_days, round_hours, DayOfWeek};

use crate::absence::AbsenceType;
use crate::holiday::Holiday;
use crate::overtime::TransactionType;
use crate::user::User;

/// Set of holiday dates relevant to a calculation window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    dates: BTreeSet<time::Date>,
}

impl HolidayCalendar {
    pub fn new(dates: impl IntoIterator<Item = time::Date>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_holiday(&self, date: time::Date) -> bool {
        self.dates.contains(&date)
    }
}

impl FromIterator<time::Date> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = time::Date>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> FromIterator<&'a Holiday> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = &'a Holiday>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|holiday| holiday.date))
    }
}

pub fn is_weekend(date: time::Date) -> bool {
    DayOfWeek::from(date.weekday()).is_weekend()
}

/// Contracted hours of the user's schedule for a weekday, before holiday
/// and employment-window handling.
fn scheduled_hours(user: &User, day: DayOfWeek) -> f32 {
    match &user.work_schedule {
        Some(schedule) => schedule.hours_for(day),
        None => {
            if day.is_weekend() {
                0.0
            } else {
                user.weekly_hours / 5.0
            }
        }
    }
}

/// Target hours of the user on a civil date.  Zero outside the employment
/// window and on holidays; holidays override the work schedule.
pub fn target_hours(user: &User, date: time::Date, holidays: &HolidayCalendar) -> f32 {
    if !user.is_employed_on(date) {
        return 0.0;
    }
    if holidays.is_holiday(date) {
        return 0.0;
    }
    round_hours(scheduled_hours(user, DayOfWeek::from(date.weekday())))
}

/// Whether a date counts as an absence day of the given type.
///
/// The weekday must carry contracted hours and the date must fall into the
/// employment window.  Vacation and overtime compensation skip holidays;
/// sick and unpaid leave count them.
pub fn is_absence_day(
    user: &User,
    date: time::Date,
    absence_type: AbsenceType,
    holidays: &HolidayCalendar,
) -> bool {
    if !user.is_employed_on(date) {
        return false;
    }
    if scheduled_hours(user, DayOfWeek::from(date.weekday())) <= 0.0 {
        return false;
    }
    absence_type.counts_holidays() || !holidays.is_holiday(date)
}

/// Schedule-aware business-day count of `[start, end]` for an absence of
/// the given type.
pub fn business_days(
    user: &User,
    start: time::Date,
    end: time::Date,
    absence_type: AbsenceType,
    holidays: &HolidayCalendar,
) -> u32 {
    iter_days(start, end)
        .filter(|date| is_absence_day(user, *date, absence_type, holidays))
        .count() as u32
}

/// Hours an absence of the given type credits (or, for unpaid leave,
/// removes from the target) over `[start, end]`: the sum of per-day target
/// hours across the counted days.
pub fn credit_hours(
    user: &User,
    start: time::Date,
    end: time::Date,
    absence_type: AbsenceType,
    holidays: &HolidayCalendar,
) -> f32 {
    let sum = iter_days(start, end)
        .filter(|date| is_absence_day(user, *date, absence_type, holidays))
        .map(|date| target_hours(user, date, holidays))
        .sum();
    round_hours(sum)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DayBreakdown {
    pub worked: f32,
    pub absence_credit: f32,
    pub corrections: f32,
    pub unpaid_reduction: f32,
}

/// Result of the daily calculation for one (user, date).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayResult {
    pub date: time::Date,
    pub target_hours: f32,
    pub actual_hours: f32,
    pub overtime: f32,
    pub breakdown: DayBreakdown,
}

/// Daily calculation kernel.
///
/// `worked` is the sum of the user's time entries on `date`, `absence` the
/// at-most-one approved absence overlapping it, `corrections` the sum of
/// manual corrections dated that day.
pub fn calculate_day(
    user: &User,
    date: time::Date,
    worked: f32,
    absence: Option<AbsenceType>,
    corrections: f32,
    holidays: &HolidayCalendar,
) -> DayResult {
    let target = target_hours(user, date, holidays);

    let (absence_credit, unpaid_reduction) = match absence {
        Some(absence_type) if is_absence_day(user, date, absence_type, holidays) => {
            if absence_type.is_paid() {
                (target, 0.0)
            } else {
                (0.0, target)
            }
        }
        _ => (0.0, 0.0),
    };

    let actual_hours = worked + absence_credit + corrections;
    let overtime = actual_hours - (target - unpaid_reduction);

    DayResult {
        date,
        target_hours: target,
        actual_hours,
        overtime,
        breakdown: DayBreakdown {
            worked,
            absence_credit,
            corrections,
            unpaid_reduction,
        },
    }
}

/// One balance-affecting ledger event derived from a day.
#[derive(Clone, Debug, PartialEq)]
pub struct DayLedgerEvent {
    pub transaction_type: TransactionType,
    pub hours: f32,
}

/// Ledger rows a day produces, in emission order.
///
/// A regular working day folds corrections into a single `earned` row.  A
/// day covered by an absence decomposes into `earned = worked - target`
/// plus a credit (or unpaid-adjustment) row of `+target`, keeping the
/// running balance exactly decomposable; corrections on such days get a row
/// of their own.  Rows that would carry zero hours are suppressed.
pub fn day_ledger_events(day: &DayResult, absence: Option<AbsenceType>) -> Vec<DayLedgerEvent> {
    let mut events = Vec::new();
    let breakdown = &day.breakdown;

    let covered =
        absence.is_some() && (breakdown.absence_credit != 0.0 || breakdown.unpaid_reduction != 0.0);

    if covered {
        let earned = breakdown.worked - day.target_hours;
        if earned != 0.0 {
            events.push(DayLedgerEvent {
                transaction_type: TransactionType::Earned,
                hours: earned,
            });
        }
        let (credit_type, credit_hours) = match absence {
            Some(AbsenceType::Vacation) => {
                (TransactionType::VacationCredit, breakdown.absence_credit)
            }
            Some(AbsenceType::Sick) => (TransactionType::SickCredit, breakdown.absence_credit),
            Some(AbsenceType::OvertimeComp) => (
                TransactionType::OvertimeCompCredit,
                breakdown.absence_credit,
            ),
            Some(AbsenceType::Unpaid) => {
                (TransactionType::UnpaidAdjustment, breakdown.unpaid_reduction)
            }
            None => unreachable!("covered implies an absence type"),
        };
        if credit_hours != 0.0 {
            events.push(DayLedgerEvent {
                transaction_type: credit_type,
                hours: credit_hours,
            });
        }
        if breakdown.corrections != 0.0 {
            events.push(DayLedgerEvent {
                transaction_type: TransactionType::Correction,
                hours: breakdown.corrections,
            });
        }
    } else {
        let earned = breakdown.worked - day.target_hours + breakdown.corrections;
        if earned != 0.0 {
            events.push(DayLedgerEvent {
                transaction_type: TransactionType::Earned,
                hours: earned,
            });
        }
    }

    events
}
