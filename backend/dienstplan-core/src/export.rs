// src/export.rs
//
// CSV exports of approved or pending month totals for payroll.
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use tracing::info;

use crate::error::{io_context, StoreError};
use crate::hours::EmployeeMonthReport;
use crate::model::{MonthPeriod, Schedule};

pub fn summary_file_name(period: MonthPeriod) -> String {
    format!("Stundenuebersicht_{}.csv", period.file_stem())
}

pub fn details_file_name(period: MonthPeriod) -> String {
    format!("Stundendetails_{}.csv", period.file_stem())
}

fn two_decimals(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Bereich")]
    area: &'a str,
    #[serde(rename = "Soll")]
    planned: String,
    #[serde(rename = "Ist")]
    actual: String,
    #[serde(rename = "Pause")]
    breaks: String,
    #[serde(rename = "Vorbereitung")]
    preparation: String,
    #[serde(rename = "Buerozeit")]
    office: String,
    #[serde(rename = "Status")]
    status: &'a str,
}

/// One row per employee.
pub fn write_month_summary<W: Write>(
    writer: W,
    reports: &[EmployeeMonthReport],
) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for report in reports {
        let totals = &report.hours.totals;
        wtr.serialize(SummaryRow {
            name: &report.employee.name,
            area: report.employee.area.display_name(),
            planned: two_decimals(totals.planned),
            actual: two_decimals(totals.actual),
            breaks: two_decimals(totals.breaks),
            preparation: two_decimals(report.hours.preparation),
            office: two_decimals(report.hours.office),
            status: report.status.label(),
        })?;
    }
    wtr.flush()
        .map_err(|e| io_context(e, "Failed to flush month summary"))?;
    info!("Exported month summary for {} employees", reports.len());
    Ok(())
}

#[derive(Serialize)]
struct DayRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Woche")]
    week: &'a str,
    #[serde(rename = "Tag")]
    weekday: &'a str,
    #[serde(rename = "Datum")]
    date: &'a str,
    #[serde(rename = "Von")]
    start: &'a str,
    #[serde(rename = "Bis")]
    end: &'a str,
    #[serde(rename = "Soll")]
    planned: String,
    #[serde(rename = "Ist")]
    actual: String,
    #[serde(rename = "Pause")]
    break_deduction: String,
    #[serde(rename = "Abwesenheit")]
    absence: &'a str,
}

/// One row per employee-day of the schedule.
pub fn write_day_details<W: Write>(
    writer: W,
    schedule: &Schedule,
    reports: &[EmployeeMonthReport],
) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0usize;
    for report in reports {
        let name = report.employee.name.as_str();
        for (week, totals) in schedule.weeks.iter().zip(&report.hours.weeks) {
            for (day, hours) in week.days_for(name).iter().zip(&totals.days) {
                wtr.serialize(DayRow {
                    name,
                    week: &week.label,
                    weekday: &day.weekday,
                    date: &day.date,
                    start: day.start.as_deref().unwrap_or(""),
                    end: day.end.as_deref().unwrap_or(""),
                    planned: two_decimals(hours.planned),
                    actual: two_decimals(hours.actual),
                    break_deduction: two_decimals(hours.break_deduction),
                    absence: hours.absence.map(|a| a.code()).unwrap_or(""),
                })?;
                rows += 1;
            }
        }
    }
    wtr.flush()
        .map_err(|e| io_context(e, "Failed to flush day details"))?;
    info!("Exported {} day rows", rows);
    Ok(())
}
