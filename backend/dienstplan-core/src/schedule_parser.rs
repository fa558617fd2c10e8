// src/schedule_parser.rs
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::{ParserConfig, FALLBACK_EMPLOYEE_NAMES};
use crate::error::ScheduleError;
use crate::model::{AbsenceCode, Area, DayEntry, Employee, MonthPeriod, Schedule, WeekSheet, WEEKDAYS};
use crate::workbook::{read_workbook, Cell, SheetGrid};

// `09.12. - 13.12.2025`, `09.12 – 13.12.`, ...
static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2})\.(\d{2})\.?\s*[-–]\s*\d{2}\.\d{2}\.?(\d{0,4})")
        .expect("date range pattern is valid")
});
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("clock pattern is valid")
});
// ODS time cells come through as ISO durations, e.g. PT08H30M00S
static ISO_DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(\d{1,2})H(\d{1,2})M").expect("duration pattern is valid")
});
static ISO_DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"T(\d{2}):(\d{2})").expect("datetime pattern is valid")
});
static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d+(?:[.,]\d+)?").expect("number pattern is valid")
});

const MINUTES_PER_DAY: f64 = 1440.0;

// --- Date range header ---

/// Header of a week sheet: the matched range text and its first day.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub label: String,
    pub start: Option<NaiveDate>,
}

/// Finds `DD.MM[.] - DD.MM[.][YYYY]` in the header cell.
/// A missing year means `default_year`; two-digit years are 20xx.
pub fn parse_date_range(header: &str, default_year: i32) -> Option<DateRange> {
    let caps = DATE_RANGE_RE.captures(header)?;
    let label = caps.get(0)?.as_str().trim().to_string();
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year = match caps.get(3).map(|m| m.as_str()).unwrap_or("") {
        "" => default_year,
        y if y.len() == 2 => 2000 + y.parse::<i32>().ok()?,
        y => y.parse::<i32>().ok()?,
    };
    let start = NaiveDate::from_ymd_opt(year, month, day);
    if start.is_none() {
        warn!("Date range '{}' names an invalid start date", label);
    }
    Some(DateRange { label, start })
}

/// Monday to Friday as `DD.MM.`; empty strings without a start date.
pub fn week_dates(start: Option<NaiveDate>) -> Vec<String> {
    (0..WEEKDAYS.len() as i64)
        .map(|offset| {
            start
                .and_then(|s| s.checked_add_signed(Duration::days(offset)))
                .map(|d| d.format("%d.%m.").to_string())
                .unwrap_or_default()
        })
        .collect()
}

// --- Cell conversions ---

/// Spreadsheet time (fraction of a day) to `HH:MM`, rounded to the minute.
pub fn fraction_to_clock(value: f64) -> String {
    let fraction = value.rem_euclid(1.0);
    let minutes = ((fraction * MINUTES_PER_DAY).round() as u32) % 1440;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `HH:MM` (optionally `:SS`) to minutes after midnight.
pub fn clock_to_minutes(clock: &str) -> Option<u32> {
    let caps = CLOCK_RE.captures(clock.trim())?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    if hours > 24 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn text_to_clock(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(minutes) = clock_to_minutes(raw) {
        return Some(format!("{:02}:{:02}", minutes / 60, minutes % 60));
    }
    for re in [&*ISO_DURATION_RE, &*ISO_DATETIME_RE] {
        if let Some(caps) = re.captures(raw) {
            let hours: u32 = caps[1].parse().ok()?;
            let minutes: u32 = caps[2].parse().ok()?;
            return Some(format!("{:02}:{:02}", hours, minutes));
        }
    }
    // Unrecognised text is kept as written.
    debug!("Keeping unrecognised time text '{}'", raw);
    Some(raw.to_string())
}

fn cell_to_clock(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Number(n) if *n == 0.0 => None,
        Cell::Number(n) => Some(fraction_to_clock(*n)),
        Cell::Text(s) => text_to_clock(s),
    }
}

/// Locale-aware decimal ("5,5" or "5.5"); negative or unreadable is zero.
pub fn parse_hours_text(raw: &str) -> Decimal {
    LEADING_NUMBER_RE
        .find(raw.trim())
        .and_then(|m| Decimal::from_str(&m.as_str().replace(',', ".")).ok())
        .filter(|h| *h > Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

fn cell_to_hours(cell: &Cell) -> Decimal {
    match cell {
        Cell::Empty => Decimal::ZERO,
        Cell::Number(n) => Decimal::from_f64(*n)
            .filter(|h| *h > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO),
        Cell::Text(s) => parse_hours_text(s),
    }
}

// --- Row parsing ---

fn parse_day(row: &[Cell], start_col: Option<usize>, weekday: &str, date: &str) -> DayEntry {
    let Some(col) = start_col.filter(|c| *c < row.len()) else {
        return DayEntry::empty(weekday, date);
    };
    let empty = Cell::Empty;
    let start = &row[col];
    let end = row.get(col + 1).unwrap_or(&empty);
    let hours = row.get(col + 2).unwrap_or(&empty);

    if let Some(code) = AbsenceCode::parse(&start.as_text()) {
        return DayEntry::absent(weekday, date, code, cell_to_hours(hours));
    }

    DayEntry {
        weekday: weekday.to_string(),
        date: date.to_string(),
        start: cell_to_clock(start),
        end: cell_to_clock(end),
        planned_hours: cell_to_hours(hours),
        status: None,
    }
}

fn parse_employee_row(row: &[Cell], config: &ParserConfig, dates: &[String]) -> Vec<DayEntry> {
    WEEKDAYS
        .iter()
        .enumerate()
        .map(|(idx, weekday)| {
            let date = dates.get(idx).map(String::as_str).unwrap_or("");
            parse_day(row, config.day_columns.get(idx).copied(), weekday, date)
        })
        .collect()
}

/// Nearest zone marker above `row_idx` in column 0.
fn area_above(sheet: &SheetGrid, row_idx: usize) -> Area {
    (0..row_idx)
        .rev()
        .find_map(|r| Area::from_marker(&sheet.first_cell_text(r)))
        .unwrap_or(Area::Unknown)
}

/// Parses one week sheet; returns the sheet and the (name, area) pairs in row order.
pub fn parse_week_sheet(
    sheet: &SheetGrid,
    known_names: &[String],
    config: &ParserConfig,
    default_year: i32,
) -> (WeekSheet, Vec<(String, Area)>) {
    let header = sheet.first_cell_text(0);
    let range = parse_date_range(&header, default_year);
    let date_range = range
        .as_ref()
        .map(|r| r.label.clone())
        .unwrap_or_else(|| sheet.name.clone());
    let dates = week_dates(range.and_then(|r| r.start));

    let mut days = BTreeMap::new();
    let mut seen = Vec::new();
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let name = sheet.first_cell_text(row_idx);
        if name.is_empty() || !known_names.iter().any(|n| *n == name) {
            continue;
        }
        let entries = parse_employee_row(row, config, &dates);
        debug!(
            "Sheet={}, Row={}, Emp={}: planned {:?}",
            sheet.name,
            row_idx,
            name,
            entries.iter().map(|d| d.planned_hours).collect::<Vec<_>>()
        );
        seen.push((name.clone(), area_above(sheet, row_idx)));
        days.insert(name, entries);
    }

    (
        WeekSheet {
            label: sheet.name.clone(),
            date_range,
            days,
        },
        seen,
    )
}

fn known_names(roster: &[Employee]) -> Vec<String> {
    if roster.is_empty() {
        FALLBACK_EMPLOYEE_NAMES.iter().map(|n| n.to_string()).collect()
    } else {
        roster.iter().map(|e| e.name.clone()).collect()
    }
}

/// Builds the normalized schedule from already-read sheets.
///
/// `roster` holds the active employees; when empty, a fixed list of names
/// identifies data rows. Roster attributes override what the sheet implies,
/// the area comes from the first week an employee appears in.
pub fn parse_schedule(
    sheets: &[SheetGrid],
    roster: &[Employee],
    config: &ParserConfig,
    period: MonthPeriod,
) -> Schedule {
    let names = known_names(roster);
    let roster_by_name: HashMap<&str, &Employee> =
        roster.iter().map(|e| (e.name.as_str(), e)).collect();

    let mut employees: Vec<Employee> = Vec::new();
    let mut weeks = Vec::new();

    for sheet in sheets.iter().filter(|s| config.is_week_sheet(&s.name)) {
        let (week, seen) = parse_week_sheet(sheet, &names, config, period.year);
        for (name, area) in seen {
            if employees.iter().any(|e| e.name == name) {
                continue;
            }
            let employee = match roster_by_name.get(name.as_str()) {
                Some(known) => Employee {
                    area: if area == Area::Unknown { known.area } else { area },
                    ..(*known).clone()
                },
                None => Employee::from_sheet(&name, area),
            };
            employees.push(employee);
        }
        weeks.push(week);
    }

    info!(
        "Parsed schedule for {}: {} weeks, {} employees",
        period,
        weeks.len(),
        employees.len()
    );
    Schedule {
        month: period.german_name().to_string(),
        year: period.year,
        employees,
        weeks,
    }
}

/// Reads the workbook bytes and parses the schedule.
/// Only an unreadable workbook is an error.
pub fn parse_workbook(
    bytes: &[u8],
    roster: &[Employee],
    config: &ParserConfig,
    period: MonthPeriod,
) -> Result<Schedule, ScheduleError> {
    let sheets = read_workbook(bytes)?;
    Ok(parse_schedule(&sheets, roster, config, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use rust_decimal_macros::dec;

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    // Excel time for HH:MM
    fn time(h: u32, m: u32) -> Cell {
        Cell::Number((h * 60 + m) as f64 / 1440.0)
    }

    fn row(name: &str, days: Vec<[Cell; 3]>) -> Vec<Cell> {
        let mut cells = vec![t(name)];
        for day in days {
            cells.extend(day);
            cells.push(Cell::Empty);
        }
        cells
    }

    fn off() -> [Cell; 3] {
        [Cell::Empty, Cell::Empty, Cell::Empty]
    }

    fn sample_sheet() -> SheetGrid {
        SheetGrid::new(
            "KW50",
            vec![
                vec![t("Dienstplan 09.12. - 13.12.2025")],
                vec![t("Nest")],
                row(
                    "Berit",
                    vec![
                        [time(8, 30), time(15, 30), n(7.0)],
                        [t("09:00:00"), t("12:00:00"), t("3")],
                        [time(8, 30), time(15, 0), t("6,5")],
                        off(),
                        [time(8, 30), time(14, 30), n(6.0)],
                    ],
                ),
                row(
                    "Alina",
                    vec![
                        [t("k"), Cell::Empty, n(5.5)],
                        [t("K"), Cell::Empty, Cell::Empty],
                        off(),
                        [time(11, 0), time(16, 0), n(5.0)],
                        [time(9, 0), time(14, 45), n(5.75)],
                    ],
                ),
                vec![t("Ü3")],
                row(
                    "Lucia",
                    vec![
                        [time(9, 0), time(15, 30), n(6.5)],
                        [time(8, 15), time(14, 45), n(6.5)],
                    ],
                ),
                vec![t("Summe"), n(42.0)],
            ],
        )
    }

    fn period() -> MonthPeriod {
        MonthPeriod::new(2025, 12).unwrap()
    }

    #[test]
    fn date_range_with_year() {
        let range = parse_date_range("Dienstplan 09.12. - 13.12.2025", 2024).unwrap();
        assert_eq!(range.label, "09.12. - 13.12.2025");
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 12, 9));
    }

    #[test]
    fn date_range_without_year_uses_default() {
        let range = parse_date_range("15.12 – 19.12.", 2026).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2026, 12, 15));
        assert!(parse_date_range("Woche 51", 2026).is_none());
    }

    #[test]
    fn week_dates_cross_month_boundary() {
        let dates = week_dates(NaiveDate::from_ymd_opt(2025, 12, 29));
        assert_eq!(dates, vec!["29.12.", "30.12.", "31.12.", "01.01.", "02.01."]);
        assert_eq!(week_dates(None), vec![""; 5]);
    }

    #[test]
    fn fraction_round_trips_to_the_minute() {
        for minute in (0..1440u32).step_by(7) {
            let fraction = minute as f64 / 1440.0;
            let clock = fraction_to_clock(fraction);
            assert_eq!(clock_to_minutes(&clock), Some(minute), "minute {}", minute);
        }
        // 08:20 stored with float noise
        assert_eq!(fraction_to_clock(0.34722222), "08:20");
        // date-time serials keep only the time of day
        assert_eq!(fraction_to_clock(45635.5), "12:00");
    }

    #[test]
    fn text_times_drop_seconds_and_accept_iso_durations() {
        assert_eq!(text_to_clock("9:00:00"), Some("09:00".to_string()));
        assert_eq!(text_to_clock("08:30"), Some("08:30".to_string()));
        assert_eq!(text_to_clock("PT08H30M00S"), Some("08:30".to_string()));
        assert_eq!(text_to_clock("1899-12-30T14:10:00"), Some("14:10".to_string()));
        assert_eq!(text_to_clock("  "), None);
    }

    #[test]
    fn hours_text_is_locale_aware() {
        assert_eq!(parse_hours_text("6,5"), dec!(6.5));
        assert_eq!(parse_hours_text("5.83"), dec!(5.83));
        assert_eq!(parse_hours_text("7 Std"), dec!(7));
        assert_eq!(parse_hours_text("frei"), Decimal::ZERO);
        assert_eq!(parse_hours_text("-2"), Decimal::ZERO);
    }

    #[test]
    fn parses_week_sheet_rows_and_dates() {
        let schedule = parse_schedule(&[sample_sheet()], &[], &ParserConfig::default(), period());
        assert_eq!(schedule.month, "Dezember");
        assert_eq!(schedule.year, 2025);
        assert_eq!(schedule.weeks.len(), 1);

        let week = &schedule.weeks[0];
        assert_eq!(week.label, "KW50");
        assert_eq!(week.date_range, "09.12. - 13.12.2025");

        let berit = week.days_for("Berit");
        assert_eq!(berit.len(), 5);
        assert_eq!(berit[0].weekday, "Mo");
        assert_eq!(berit[0].date, "09.12.");
        assert_eq!(berit[0].start.as_deref(), Some("08:30"));
        assert_eq!(berit[0].end.as_deref(), Some("15:30"));
        assert_eq!(berit[0].planned_hours, dec!(7));
        assert_eq!(berit[1].start.as_deref(), Some("09:00"));
        assert_eq!(berit[1].planned_hours, dec!(3));
        assert_eq!(berit[2].planned_hours, dec!(6.5));
        assert_eq!(berit[3], DayEntry::empty("Do", "12.12."));
        assert_eq!(berit[4].date, "13.12.");
    }

    #[test]
    fn absence_cells_keep_stated_hours() {
        let schedule = parse_schedule(&[sample_sheet()], &[], &ParserConfig::default(), period());
        let alina = schedule.weeks[0].days_for("Alina");
        assert_eq!(alina[0].status, Some(AbsenceCode::Sick));
        assert_eq!(alina[0].planned_hours, dec!(5.5));
        assert_eq!(alina[0].start, None);
        assert_eq!(alina[1].status, Some(AbsenceCode::Sick));
        assert_eq!(alina[1].planned_hours, Decimal::ZERO);
    }

    #[test]
    fn short_rows_degrade_to_empty_days() {
        let schedule = parse_schedule(&[sample_sheet()], &[], &ParserConfig::default(), period());
        let lucia = schedule.weeks[0].days_for("Lucia");
        assert_eq!(lucia.len(), 5);
        assert_eq!(lucia[1].planned_hours, dec!(6.5));
        for day in &lucia[2..] {
            assert_eq!(day.planned_hours, Decimal::ZERO);
            assert_eq!(day.start, None);
        }
    }

    #[test]
    fn areas_come_from_nearest_marker_above() {
        let schedule = parse_schedule(&[sample_sheet()], &[], &ParserConfig::default(), period());
        let area = |name: &str| schedule.employee(name).map(|e| e.area);
        assert_eq!(area("Berit"), Some(Area::Nest));
        assert_eq!(area("Alina"), Some(Area::Nest));
        assert_eq!(area("Lucia"), Some(Area::U3));
        let names: Vec<_> = schedule.employees.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Berit", "Alina", "Lucia"]);
    }

    #[test]
    fn missing_marker_and_header_fall_back() {
        let sheet = SheetGrid::new(
            "KW51",
            vec![
                vec![t("Dienstplan")],
                row("Olli", vec![[time(9, 30), time(13, 30), n(4.0)]]),
            ],
        );
        let schedule = parse_schedule(&[sheet], &[], &ParserConfig::default(), period());
        assert_eq!(schedule.weeks[0].date_range, "KW51");
        assert_eq!(schedule.weeks[0].days_for("Olli")[0].date, "");
        assert_eq!(schedule.employee("Olli").unwrap().area, Area::Unknown);
    }

    #[test]
    fn only_week_sheets_are_read() {
        let overview = SheetGrid::new("Übersicht", vec![row("Berit", vec![off()])]);
        let schedule = parse_schedule(
            &[overview, sample_sheet()],
            &[],
            &ParserConfig::default(),
            period(),
        );
        assert_eq!(schedule.weeks.len(), 1);
        assert_eq!(schedule.weeks[0].label, "KW50");
    }

    #[test]
    fn roster_names_and_attributes_override_fallback() {
        let mut roster_berit = Employee::from_sheet("Berit", Area::U3);
        roster_berit.is_minor = true;
        roster_berit.role = Role::Lead;
        roster_berit.standard_hours = dec!(6.5);
        let schedule = parse_schedule(
            &[sample_sheet()],
            &[roster_berit],
            &ParserConfig::default(),
            period(),
        );
        // Alina and Lucia are not in the roster, so their rows are skipped.
        assert_eq!(schedule.employees.len(), 1);
        let berit = &schedule.employees[0];
        assert!(berit.is_minor);
        assert_eq!(berit.role, Role::Lead);
        // sheet marker wins over the roster area
        assert_eq!(berit.area, Area::Nest);
        assert!(schedule.weeks[0].days_for("Alina").is_empty());
    }

    #[test]
    fn declared_column_map_is_honoured() {
        let sheet = SheetGrid::new(
            "KW50",
            vec![vec![
                t("Berit"),
                Cell::Empty,
                time(8, 0),
                time(12, 0),
                n(4.0),
            ]],
        );
        let config = ParserConfig {
            day_columns: vec![2],
            ..ParserConfig::default()
        };
        let schedule = parse_schedule(&[sheet], &[], &config, period());
        let berit = schedule.weeks[0].days_for("Berit");
        assert_eq!(berit[0].start.as_deref(), Some("08:00"));
        assert_eq!(berit[0].planned_hours, dec!(4));
        // weekdays without a declared column stay empty
        assert_eq!(berit[1].planned_hours, Decimal::ZERO);
    }

    #[test]
    fn parsing_is_deterministic() {
        let sheets = vec![sample_sheet()];
        let first = parse_schedule(&sheets, &[], &ParserConfig::default(), period());
        let second = parse_schedule(&sheets, &[], &ParserConfig::default(), period());
        assert_eq!(first, second);
    }
}
