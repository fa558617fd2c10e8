// src/lib.rs
pub mod config;
pub mod demo;
pub mod draft;
pub mod entries;
pub mod error;
pub mod export;
pub mod hours;
pub mod model;
pub mod roster;
pub mod schedule_parser;
pub mod service;
pub mod store;
pub mod workbook;

mod hours_tests;

pub use config::{AppConfig, ParserConfig};
pub use draft::EntryDraft;
pub use entries::{
    ApprovalStatus, DeviationKey, DeviationMap, DeviationValue, EntryBook, ExtraTime,
    ExtraTimeKind, MonthStatus,
};
pub use error::{AppError, EntryError, RosterError, ScheduleError, StoreError};
pub use hours::{day_hours, employee_month_report, month_totals, week_totals, EmployeeMonthReport};
pub use model::{AbsenceCode, Area, DayEntry, Employee, MonthPeriod, Role, Schedule, WeekSheet};
pub use roster::{NewEmployee, Roster, RosterUpdate};
pub use schedule_parser::{parse_schedule, parse_workbook};
pub use service::DienstplanService;
pub use store::{BlobStore, FsStore};
