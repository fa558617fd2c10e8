// src/demo.rs
//
// Fixed December 2025 schedule served when no workbook can be loaded.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::model::{AbsenceCode, DayEntry, Employee, Schedule, WeekSheet, WEEKDAYS};
use crate::roster::demo_employees;
use crate::schedule_parser::{clock_to_minutes, week_dates};

pub const DEMO_YEAR: i32 = 2025;
pub const DEMO_MONTH: u32 = 12;

// Per day: "HH:MM-HH:MM", an absence code, or "" for a free day.
type DemoWeek = (&'static str, &'static str, u32, &'static [(&'static str, [&'static str; 5])]);

const SICK: [&str; 5] = ["K", "K", "K", "K", "K"];

const WEEK_50: DemoWeek = (
    "KW 50",
    "09.12. - 13.12.2025",
    9,
    &[
        ("Alina", ["K", "K", "", "11:00-16:00", "09:00-14:45"]),
        ("Berit", ["08:30-15:30", "09:00-12:00", "08:30-15:00", "", "08:30-14:30"]),
        ("Catharina", ["K", "08:30-16:00", "09:00-14:30", "08:30-15:00", ""]),
        ("Izabella", ["08:20-14:10", "08:20-16:00", "08:20-14:10", "08:20-16:00", "08:20-14:10"]),
        ("Olli", SICK),
        ("Ilai", SICK),
        ("Juli", SICK),
        ("Lucia", ["09:00-15:30", "08:15-14:45", "08:15-14:45", "08:15-14:45", "08:15-14:45"]),
        ("Myriam", SICK),
    ],
);

const WEEK_51: DemoWeek = (
    "KW 51",
    "15.12. - 19.12.2025",
    15,
    &[
        ("Alina", ["09:00-14:30", "09:00-14:30", "09:00-14:30", "09:00-15:00", ""]),
        ("Berit", ["08:30-15:30", "", "08:30-15:00", "", "08:30-14:30"]),
        ("Catharina", ["", "08:30-16:00", "", "08:30-11:30", "09:00-15:00"]),
        ("Izabella", ["08:20-14:10", "08:20-16:00", "08:20-14:10", "08:20-16:00", "08:20-14:10"]),
        ("Olli", ["09:30-13:30", "09:30-13:30", "09:30-13:30", "09:30-13:30", "09:30-13:30"]),
        ("Ilai", ["08:30-14:45", "08:30-14:45", "08:30-14:45", "08:30-16:00", ""]),
        ("Juli", ["09:00-14:45", "09:00-14:45", "09:00-14:45", "", "08:30-15:00"]),
        ("Lucia", ["08:15-14:45", "08:15-14:45", "08:15-14:45", "08:15-14:45", "08:15-14:45"]),
        ("Myriam", ["09:30-15:30", "08:30-14:30", "08:30-14:30", "08:30-14:30", "08:30-14:30"]),
    ],
);

fn demo_day(weekday: &str, date: &str, shift: &str) -> DayEntry {
    if let Some(code) = AbsenceCode::parse(shift) {
        return DayEntry::absent(weekday, date, code, Decimal::ZERO);
    }
    let Some((start, end)) = shift.split_once('-') else {
        return DayEntry::empty(weekday, date);
    };
    let minutes = match (clock_to_minutes(start), clock_to_minutes(end)) {
        (Some(s), Some(e)) if e > s => e - s,
        _ => 0,
    };
    DayEntry {
        start: Some(start.to_string()),
        end: Some(end.to_string()),
        planned_hours: (Decimal::from(minutes) / Decimal::from(60)).round_dp(2),
        ..DayEntry::empty(weekday, date)
    }
}

fn demo_week(week: &DemoWeek) -> WeekSheet {
    let (label, date_range, first_day, rows) = *week;
    let dates = week_dates(NaiveDate::from_ymd_opt(DEMO_YEAR, DEMO_MONTH, first_day));
    let days: BTreeMap<String, Vec<DayEntry>> = rows
        .iter()
        .map(|(name, shifts)| {
            let entries = WEEKDAYS
                .iter()
                .zip(shifts.iter())
                .enumerate()
                .map(|(idx, (weekday, shift))| {
                    let date = dates.get(idx).map(String::as_str).unwrap_or("");
                    demo_day(weekday, date, shift)
                })
                .collect();
            (name.to_string(), entries)
        })
        .collect();

    WeekSheet {
        label: label.to_string(),
        date_range: date_range.to_string(),
        days,
    }
}

/// Two weeks of December 2025 for the demonstration roster.
pub fn demo_schedule() -> Schedule {
    let weeks = vec![demo_week(&WEEK_50), demo_week(&WEEK_51)];
    let employees: Vec<Employee> = demo_employees()
        .into_iter()
        .filter(|e| weeks.iter().any(|w| w.days.contains_key(&e.name)))
        .collect();

    Schedule {
        month: "Dezember".to_string(),
        year: DEMO_YEAR,
        employees,
        weeks,
    }
}
