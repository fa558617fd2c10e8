// src/hours.rs
//
// Soll/Ist computation. Planned hours come from the schedule, deviations from
// the entry book; absences always credit the planned hours.
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use crate::entries::{
    DeviationKey, DeviationMap, DeviationValue, EntryBook, ExtraTime, ExtraTimeKind, MonthStatus,
};
use crate::model::{AbsenceCode, DayEntry, Employee, MonthPeriod, Schedule, WeekSheet};

// --- Break rule ---

pub const BREAK_DEDUCTION: Decimal = dec!(0.5);
/// Worked hours above which an adult gets the break deducted.
pub const ADULT_BREAK_THRESHOLD: Decimal = dec!(6.0);
/// Worked hours above which a minor gets the break deducted.
pub const MINOR_BREAK_THRESHOLD: Decimal = dec!(4.5);

pub fn break_threshold(is_minor: bool) -> Decimal {
    if is_minor {
        MINOR_BREAK_THRESHOLD
    } else {
        ADULT_BREAK_THRESHOLD
    }
}

/// 0.5h once worked hours strictly exceed the threshold, else nothing.
pub fn break_deduction(worked: Decimal, is_minor: bool) -> Decimal {
    if worked > break_threshold(is_minor) {
        BREAK_DEDUCTION
    } else {
        Decimal::ZERO
    }
}

// --- Per day ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    pub planned: Decimal,
    /// Planned plus numeric deviation, before the break.
    pub worked: Decimal,
    pub break_deduction: Decimal,
    pub actual: Decimal,
    pub absence: Option<AbsenceCode>,
    /// Whether the day adds anything to week and month totals.
    pub counted: bool,
}

impl DayHours {
    fn not_counted(planned: Decimal, absence: Option<AbsenceCode>) -> Self {
        Self {
            planned,
            worked: Decimal::ZERO,
            break_deduction: Decimal::ZERO,
            actual: Decimal::ZERO,
            absence,
            counted: false,
        }
    }
}

/// Computes one employee-day. A schedule absence wins over any deviation;
/// an absence deviation wins over the numeric path.
pub fn day_hours(day: &DayEntry, deviation: Option<&DeviationValue>, is_minor: bool) -> DayHours {
    let planned = day.planned_hours;
    let absence = day.status.or_else(|| deviation.and_then(DeviationValue::absence));

    if planned <= Decimal::ZERO {
        return DayHours::not_counted(Decimal::ZERO, absence);
    }

    if absence.is_some() {
        return DayHours {
            planned,
            worked: planned,
            break_deduction: Decimal::ZERO,
            actual: planned,
            absence,
            counted: true,
        };
    }

    let worked = planned + deviation.map(DeviationValue::hours).unwrap_or(Decimal::ZERO);
    let brk = break_deduction(worked, is_minor);
    DayHours {
        planned,
        worked,
        break_deduction: brk,
        actual: worked - brk,
        absence: None,
        counted: true,
    }
}

// --- Aggregates ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourSums {
    pub planned: Decimal,
    pub actual: Decimal,
    pub breaks: Decimal,
}

impl HourSums {
    fn add_day(&mut self, day: &DayHours) {
        if !day.counted {
            return;
        }
        self.planned += day.planned;
        self.actual += day.actual;
        self.breaks += day.break_deduction;
    }

    fn add(&mut self, other: &HourSums) {
        self.planned += other.planned;
        self.actual += other.actual;
        self.breaks += other.breaks;
    }

    pub fn difference(&self) -> Decimal {
        self.actual - self.planned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotals {
    pub index: usize,
    pub label: String,
    pub days: Vec<DayHours>,
    pub totals: HourSums,
}

pub fn week_totals(
    week: &WeekSheet,
    week_index: usize,
    employee: &Employee,
    deviations: &DeviationMap,
) -> WeekTotals {
    let mut totals = HourSums::default();
    let days: Vec<DayHours> = week
        .days_for(&employee.name)
        .iter()
        .enumerate()
        .map(|(day_index, day)| {
            let key = DeviationKey::new(&employee.name, week_index, day_index);
            let hours = day_hours(day, deviations.get(&key), employee.is_minor);
            totals.add_day(&hours);
            hours
        })
        .collect();

    WeekTotals {
        index: week_index,
        label: week.label.clone(),
        days,
        totals,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    pub employee: String,
    pub weeks: Vec<WeekTotals>,
    pub totals: HourSums,
    pub preparation: Decimal,
    pub office: Decimal,
}

impl MonthTotals {
    pub fn extra_total(&self) -> Decimal {
        self.preparation + self.office
    }

    /// Actual schedule hours plus counted extra time.
    pub fn grand_total(&self) -> Decimal {
        self.totals.actual + self.extra_total()
    }
}

/// Extra time that counts for this employee: preparation needs the prep
/// flag, office time additionally needs the lead role.
pub fn counted_extra_time(employee: &Employee, extra: Option<&ExtraTime>) -> (Decimal, Decimal) {
    let Some(extra) = extra else {
        return (Decimal::ZERO, Decimal::ZERO);
    };
    if !employee.can_track_prep_time {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let preparation = extra.total(ExtraTimeKind::Preparation);
    let office = if employee.is_lead() {
        extra.total(ExtraTimeKind::Office)
    } else {
        Decimal::ZERO
    };
    (preparation, office)
}

pub fn month_totals(
    weeks: &[WeekSheet],
    employee: &Employee,
    deviations: &DeviationMap,
    extra: Option<&ExtraTime>,
) -> MonthTotals {
    let weeks: Vec<WeekTotals> = weeks
        .iter()
        .enumerate()
        .map(|(idx, week)| week_totals(week, idx, employee, deviations))
        .collect();

    let mut totals = HourSums::default();
    for week in &weeks {
        totals.add(&week.totals);
    }
    let (preparation, office) = counted_extra_time(employee, extra);

    debug!(
        "Emp={}: Soll={} Ist={} Pause={} Vorbereitung={} Buero={}",
        employee.name, totals.planned, totals.actual, totals.breaks, preparation, office
    );

    MonthTotals {
        employee: employee.name.clone(),
        weeks,
        totals,
        preparation,
        office,
    }
}

/// Month totals together with the review state, one per employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeMonthReport {
    pub employee: Employee,
    pub status: MonthStatus,
    pub hours: MonthTotals,
}

pub fn employee_month_report(
    schedule: &Schedule,
    employee: &Employee,
    book: &EntryBook,
    period: MonthPeriod,
) -> EmployeeMonthReport {
    let deviations = book.deviations_for(&employee.name);
    let hours = month_totals(
        &schedule.weeks,
        employee,
        &deviations,
        book.extra_time_for(&employee.name, period),
    );
    EmployeeMonthReport {
        employee: employee.clone(),
        status: book.month_status(&employee.name, period),
        hours,
    }
}

/// `7,5 h`, trailing zeros dropped.
pub fn format_hours(hours: Decimal) -> String {
    format!("{} h", hours.round_dp(2).normalize()).replace('.', ",")
}
