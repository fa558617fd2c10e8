// tests/workbook_import.rs
//
// Builds real .xlsx workbooks and runs them through the importer.
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use dienstplan_core::config::{AppConfig, ParserConfig};
use dienstplan_core::entries::{DeviationKey, DeviationMap, DeviationValue};
use dienstplan_core::hours::month_totals;
use dienstplan_core::model::{AbsenceCode, Area, MonthPeriod};
use dienstplan_core::roster::Roster;
use dienstplan_core::schedule_parser::parse_workbook;
use dienstplan_core::store::{BlobStore, FsStore};
use dienstplan_core::{DienstplanService, ScheduleError};

fn clock(hour: u32, minute: u32) -> f64 {
    (hour as f64 * 60.0 + minute as f64) / 1440.0
}

// Writes start, end and hours for one weekday starting at `col`.
fn write_shift(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    start: (u32, u32),
    end: (u32, u32),
    hours: f64,
) -> Result<(), XlsxError> {
    sheet.write_number(row, col, clock(start.0, start.1))?;
    sheet.write_number(row, col + 1, clock(end.0, end.1))?;
    sheet.write_number(row, col + 2, hours)?;
    Ok(())
}

fn build_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let overview = workbook.add_worksheet();
    overview.set_name("Übersicht")?;
    overview.write_string(0, 0, "Berit")?;
    overview.write_number(0, 1, 99.0)?;

    let kw50 = workbook.add_worksheet();
    kw50.set_name("KW50")?;
    kw50.write_string(0, 0, "Dienstplan 09.12. - 13.12.2025")?;
    kw50.write_string(1, 0, "Nest")?;
    kw50.write_string(2, 0, "Berit")?;
    write_shift(kw50, 2, 1, (8, 30), (15, 30), 7.0)?;
    kw50.write_string(2, 5, "09:00:00")?;
    kw50.write_string(2, 6, "12:00:00")?;
    kw50.write_string(2, 7, "3")?;
    write_shift(kw50, 2, 9, (8, 30), (15, 0), 6.5)?;
    write_shift(kw50, 2, 17, (8, 30), (14, 30), 6.0)?;
    kw50.write_string(3, 0, "Izabella")?;
    for col in [1u16, 5, 9, 13, 17] {
        write_shift(kw50, 3, col, (8, 20), (14, 10), 5.83)?;
    }
    kw50.write_string(4, 0, "Ü3")?;
    kw50.write_string(5, 0, "Lucia")?;
    kw50.write_string(5, 1, "u")?;
    kw50.write_string(5, 3, "6,5")?;
    write_shift(kw50, 5, 5, (8, 15), (14, 45), 6.5)?;
    kw50.write_string(6, 0, "Summe")?;

    let kw51 = workbook.add_worksheet();
    kw51.set_name("KW51")?;
    kw51.write_string(0, 0, "15.12. - 19.12.25")?;
    kw51.write_string(1, 0, "Nest")?;
    kw51.write_string(2, 0, "Berit")?;
    write_shift(kw51, 2, 1, (8, 30), (15, 30), 7.0)?;

    workbook.save_to_buffer()
}

fn december() -> MonthPeriod {
    MonthPeriod::new(2025, 12).unwrap()
}

fn roster() -> Roster {
    Roster::demo(Utc.with_ymd_and_hms(2025, 12, 1, 7, 0, 0).unwrap())
}

#[test]
fn xlsx_week_sheets_are_normalized() {
    let bytes = build_workbook().unwrap();
    let schedule = parse_workbook(
        &bytes,
        &roster().active_employees(),
        &ParserConfig::default(),
        december(),
    )
    .unwrap();

    assert_eq!(schedule.month, "Dezember");
    assert_eq!(schedule.year, 2025);
    assert_eq!(schedule.weeks.len(), 2);

    let kw50 = &schedule.weeks[0];
    assert_eq!(kw50.label, "KW50");
    assert_eq!(kw50.date_range, "09.12. - 13.12.2025");

    let berit = kw50.days_for("Berit");
    assert_eq!(berit.len(), 5);
    assert_eq!(berit[0].date, "09.12.");
    assert_eq!(berit[0].start.as_deref(), Some("08:30"));
    assert_eq!(berit[0].end.as_deref(), Some("15:30"));
    assert_eq!(berit[0].planned_hours, dec!(7));
    assert_eq!(berit[1].start.as_deref(), Some("09:00"));
    assert_eq!(berit[1].planned_hours, dec!(3));
    assert_eq!(berit[3].planned_hours, dec!(0));
    assert!(berit[3].start.is_none());

    let lucia = kw50.days_for("Lucia");
    assert_eq!(lucia[0].status, Some(AbsenceCode::Vacation));
    assert_eq!(lucia[0].planned_hours, dec!(6.5));
    assert!(lucia[0].start.is_none());
    assert_eq!(lucia[1].end.as_deref(), Some("14:45"));

    assert_eq!(schedule.weeks[1].days_for("Berit")[0].date, "15.12.");

    let names: Vec<&str> = schedule.employees.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Berit", "Izabella", "Lucia"]);
    let lucia = schedule.employee("Lucia").unwrap();
    assert_eq!(lucia.area, Area::U3);
    assert!(lucia.is_minor);
}

#[test]
fn imported_schedule_feeds_the_calculator() {
    let bytes = build_workbook().unwrap();
    let schedule = parse_workbook(
        &bytes,
        &roster().active_employees(),
        &ParserConfig::default(),
        december(),
    )
    .unwrap();

    let izabella = schedule.employee("Izabella").unwrap();
    let totals = month_totals(&schedule.weeks, izabella, &DeviationMap::new(), None);
    // Five minor days of 5.83h, each above 4.5h
    assert_eq!(totals.totals.planned, dec!(29.15));
    assert_eq!(totals.totals.actual, dec!(26.65));

    let berit = schedule.employee("Berit").unwrap();
    let mut deviations = DeviationMap::new();
    deviations.insert(DeviationKey::new("Berit", 1, 0), DeviationValue::Absence(AbsenceCode::Sick));
    let totals = month_totals(&schedule.weeks, berit, &deviations, None);
    // KW50: 6.5 + 3 + 6 + 6, KW51: 7 (sick, no break)
    assert_eq!(totals.totals.actual, dec!(28.5));
}

#[test]
fn same_bytes_parse_to_the_same_weeks() {
    let bytes = build_workbook().unwrap();
    let employees = roster().active_employees();
    let config = ParserConfig::default();
    let first = parse_workbook(&bytes, &employees, &config, december()).unwrap();
    let second = parse_workbook(&bytes, &employees, &config, december()).unwrap();
    assert_eq!(first.weeks, second.weeks);
    assert_eq!(first.employees, second.employees);
}

#[test]
fn unreadable_workbook_is_an_error() {
    let result = parse_workbook(
        b"PK\x03\x04 broken",
        &[],
        &ParserConfig::default(),
        december(),
    );
    assert!(matches!(result, Err(ScheduleError::Workbook(_))));
}

#[test]
fn service_imports_workbook_from_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path()).unwrap();
    store
        .put("Dienstplan 2025_12.xlsx", &build_workbook().unwrap())
        .unwrap();

    let config = AppConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };
    let service = DienstplanService::new(config).unwrap();
    let schedule = service.load_schedule(december(), &roster());
    // Demo weeks are labelled "KW 50"; the imported sheet keeps its name.
    assert_eq!(schedule.weeks[0].label, "KW50");
    assert_eq!(schedule.employees.len(), 3);

    let broken = FsStore::new(dir.path().join("broken")).unwrap();
    broken.put("Dienstplan 2025_12.ods", b"not a workbook").unwrap();
    let service = DienstplanService::with_store(AppConfig::default(), Box::new(broken));
    let schedule = service.load_schedule(december(), &roster());
    assert_eq!(schedule.weeks[0].label, "KW 50");
}
