// src/model.rs
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::EntryError;

/// Weekday labels of a schedule week, Monday to Friday.
pub const WEEKDAYS: [&str; 5] = ["Mo", "Di", "Mi", "Do", "Fr"];

const MONTH_NAMES: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

// --- Absence codes ---

/// Status tokens that replace numeric hour computation for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbsenceCode {
    #[serde(rename = "K")]
    Sick,
    #[serde(rename = "U")]
    Vacation,
    #[serde(rename = "KK")]
    ChildSick,
    #[serde(rename = "F")]
    Training,
    #[serde(rename = "S")]
    Seminar,
    #[serde(rename = "KS")]
    SickShort,
}

impl AbsenceCode {
    pub const ALL: [AbsenceCode; 6] = [
        AbsenceCode::Sick,
        AbsenceCode::Vacation,
        AbsenceCode::ChildSick,
        AbsenceCode::Training,
        AbsenceCode::Seminar,
        AbsenceCode::SickShort,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AbsenceCode::Sick => "K",
            AbsenceCode::Vacation => "U",
            AbsenceCode::ChildSick => "KK",
            AbsenceCode::Training => "F",
            AbsenceCode::Seminar => "S",
            AbsenceCode::SickShort => "KS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AbsenceCode::Sick => "Krank",
            AbsenceCode::Vacation => "Urlaub",
            AbsenceCode::ChildSick => "Kind krank",
            AbsenceCode::Training => "Fortbildung",
            AbsenceCode::Seminar => "Seminar",
            AbsenceCode::SickShort => "Krank (kurz)",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().to_uppercase();
        Self::ALL.into_iter().find(|c| c.code() == token)
    }
}

impl fmt::Display for AbsenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// --- Employee attributes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Area {
    #[serde(rename = "Nest")]
    Nest,
    #[serde(rename = "Ü3")]
    U3,
    #[serde(rename = "Unbekannt")]
    Unknown,
}

impl Area {
    /// Matches a zone marker row in the schedule sheet.
    pub fn from_marker(cell: &str) -> Option<Self> {
        match cell.trim() {
            "Nest" => Some(Area::Nest),
            "Ü3" => Some(Area::U3),
            _ => None,
        }
    }

    /// User input: `Nest`, `Ü3`/`U3` or the display name `Wald`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "nest" => Some(Area::Nest),
            "ü3" | "u3" | "wald" => Some(Area::U3),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Area::Nest => "Nest",
            Area::U3 => "Ü3",
            Area::Unknown => "Unbekannt",
        }
    }

    // Ü3 is shown as "Wald" to staff.
    pub fn display_name(&self) -> &'static str {
        match self {
            Area::Nest => "Nest",
            Area::U3 => "Wald",
            Area::Unknown => "Unbekannt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "staff", alias = "mitarbeiter")]
    Staff,
    #[serde(rename = "lead", alias = "leitung")]
    Lead,
}

/// Employee as it appears in the normalized schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub name: String,
    pub area: Area,
    pub is_minor: bool,
    pub role: Role,
    #[serde(with = "rust_decimal::serde::float")]
    pub standard_hours: Decimal,
    pub can_track_prep_time: bool,
}

impl Employee {
    /// Attributes known only from the schedule sheet.
    pub fn from_sheet(name: &str, area: Area) -> Self {
        Self {
            name: name.to_string(),
            area,
            is_minor: false,
            role: Role::Staff,
            standard_hours: Decimal::ZERO,
            can_track_prep_time: false,
        }
    }

    pub fn is_lead(&self) -> bool {
        self.role == Role::Lead
    }
}

// --- Schedule ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub weekday: String,
    /// `DD.MM.`, empty when the sheet carried no date range.
    pub date: String,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub planned_hours: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AbsenceCode>,
}

impl DayEntry {
    pub fn empty(weekday: &str, date: &str) -> Self {
        Self {
            weekday: weekday.to_string(),
            date: date.to_string(),
            start: None,
            end: None,
            planned_hours: Decimal::ZERO,
            status: None,
        }
    }

    pub fn absent(weekday: &str, date: &str, code: AbsenceCode, planned_hours: Decimal) -> Self {
        Self {
            status: Some(code),
            planned_hours,
            ..Self::empty(weekday, date)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSheet {
    pub label: String,
    pub date_range: String,
    /// Employee name -> five entries, Monday to Friday.
    pub days: BTreeMap<String, Vec<DayEntry>>,
}

impl WeekSheet {
    pub fn days_for(&self, employee: &str) -> &[DayEntry] {
        self.days.get(employee).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub month: String,
    pub year: i32,
    pub employees: Vec<Employee>,
    pub weeks: Vec<WeekSheet>,
}

impl Schedule {
    pub fn employee(&self, name: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.name == name)
    }
}

// --- Month period ---

/// A payroll month; keys entries, submissions, approvals and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, EntryError> {
        if !(1..=12).contains(&month) {
            return Err(EntryError::InvalidMonth(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `YYYY-MM`.
    pub fn parse(key: &str) -> Result<Self, EntryError> {
        let invalid = || EntryError::InvalidMonth(key.to_string());
        let (year, month) = key.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    /// `YYYY-MM`
    pub fn key(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    /// `YYYY_MM`, as used in file names.
    pub fn file_stem(&self) -> String {
        format!("{}_{:02}", self.year, self.month)
    }

    pub fn german_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).saturating_sub(1) % 12]
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
