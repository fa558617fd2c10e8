// src/service.rs
//
// Ties storage, parsing and the calculator together for one data folder.
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::demo::demo_schedule;
use crate::entries::{ApprovalStatus, DeviationMap, EntryBook, ExtraTime};
use crate::error::{AppError, ScheduleError, StoreError};
use crate::export::{details_file_name, summary_file_name, write_day_details, write_month_summary};
use crate::hours::{employee_month_report, EmployeeMonthReport};
use crate::model::{MonthPeriod, Schedule};
use crate::roster::Roster;
use crate::schedule_parser::parse_workbook;
use crate::store::{
    entries_file_name, find_schedule, load_json, save_json, BlobStore, FsStore, ROSTER_FILE_NAME,
};

/// Rendered CSV files of one month.
#[derive(Debug, Clone)]
pub struct MonthExport {
    pub summary_name: String,
    pub summary: Vec<u8>,
    pub details_name: String,
    pub details: Vec<u8>,
    /// False in demo mode, where nothing is written.
    pub stored: bool,
}

pub struct DienstplanService {
    config: AppConfig,
    // `None` runs on demonstration data.
    store: Option<Box<dyn BlobStore>>,
}

impl DienstplanService {
    pub fn new(config: AppConfig) -> Result<Self, StoreError> {
        let store: Option<Box<dyn BlobStore>> = match &config.data_dir {
            Some(dir) => Some(Box::new(FsStore::new(dir.clone())?) as Box<dyn BlobStore>),
            None => {
                warn!("DIENSTPLAN_DATA_DIR not set, running on demo data");
                None
            }
        };
        Ok(Self { config, store })
    }

    pub fn with_store(config: AppConfig, store: Box<dyn BlobStore>) -> Self {
        Self {
            config,
            store: Some(store),
        }
    }

    pub fn is_demo(&self) -> bool {
        self.store.is_none()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // --- Roster ---

    /// Missing roster file: a fresh one with random PINs is created and saved.
    pub fn load_roster(&self, now: DateTime<Utc>) -> Result<Roster, AppError> {
        let Some(store) = &self.store else {
            return Ok(Roster::demo(now));
        };
        if let Some(roster) = load_json::<Roster>(store.as_ref(), ROSTER_FILE_NAME)? {
            return Ok(roster);
        }
        let roster = Roster::initial(&mut rand::thread_rng(), now);
        save_json(store.as_ref(), ROSTER_FILE_NAME, &roster)?;
        warn!(
            "Created {} with new PINs; hand them out to the staff",
            ROSTER_FILE_NAME
        );
        Ok(roster)
    }

    pub fn save_roster(&self, roster: &Roster) -> Result<(), AppError> {
        match &self.store {
            Some(store) => Ok(save_json(store.as_ref(), ROSTER_FILE_NAME, roster)?),
            None => {
                info!("Demo mode: roster changes are not persisted");
                Ok(())
            }
        }
    }

    // --- Schedule ---

    /// Never fails: any problem falls back to the demo schedule.
    pub fn load_schedule(&self, period: MonthPeriod, roster: &Roster) -> Schedule {
        let Some(store) = &self.store else {
            return demo_schedule();
        };
        match self.read_schedule(store.as_ref(), period, roster) {
            Ok(schedule) => schedule,
            Err(e) => {
                error!("Month={}: Loading Dienstplan failed: {}. Using demo data.", period, e);
                demo_schedule()
            }
        }
    }

    fn read_schedule(
        &self,
        store: &dyn BlobStore,
        period: MonthPeriod,
        roster: &Roster,
    ) -> Result<Schedule, AppError> {
        let Some((name, bytes)) = find_schedule(store, period)? else {
            return Err(ScheduleError::Missing(period.key()).into());
        };
        info!("Month={}: Importing {}", period, name);
        let schedule = parse_workbook(
            &bytes,
            &roster.active_employees(),
            &self.config.parser_config(),
            period,
        )?;
        Ok(schedule)
    }

    // --- Entries ---

    pub fn load_entries(&self, period: MonthPeriod) -> Result<EntryBook, AppError> {
        let Some(store) = &self.store else {
            return Ok(EntryBook::default());
        };
        Ok(load_json::<EntryBook>(store.as_ref(), &entries_file_name(period))?.unwrap_or_default())
    }

    fn save_entries(&self, period: MonthPeriod, book: &EntryBook) -> Result<(), AppError> {
        match &self.store {
            Some(store) => Ok(save_json(store.as_ref(), &entries_file_name(period), book)?),
            None => {
                info!("Demo mode: entries for {} are not persisted", period);
                Ok(())
            }
        }
    }

    pub fn submit(
        &self,
        employee: &str,
        period: MonthPeriod,
        entries: &DeviationMap,
        extra_time: Option<&ExtraTime>,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let mut book = self.load_entries(period)?;
        let stored = book.submit(employee, period, entries, extra_time, now)?;
        self.save_entries(period, &book)?;
        Ok(stored)
    }

    pub fn approve(
        &self,
        employee: &str,
        period: MonthPeriod,
        status: ApprovalStatus,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut book = self.load_entries(period)?;
        book.set_approval(employee, period, status, comment, &self.config.approver, now)?;
        self.save_entries(period, &book)
    }

    // --- Reports ---

    pub fn month_reports(
        &self,
        period: MonthPeriod,
        now: DateTime<Utc>,
    ) -> Result<(Schedule, Vec<EmployeeMonthReport>), AppError> {
        let roster = self.load_roster(now)?;
        let schedule = self.load_schedule(period, &roster);
        let book = self.load_entries(period)?;
        let reports = schedule
            .employees
            .iter()
            .map(|employee| employee_month_report(&schedule, employee, &book, period))
            .collect();
        Ok((schedule, reports))
    }

    pub fn export_month(
        &self,
        period: MonthPeriod,
        now: DateTime<Utc>,
    ) -> Result<MonthExport, AppError> {
        let (schedule, reports) = self.month_reports(period, now)?;
        let mut summary = Vec::new();
        write_month_summary(&mut summary, &reports)?;
        let mut details = Vec::new();
        write_day_details(&mut details, &schedule, &reports)?;

        let export = MonthExport {
            summary_name: summary_file_name(period),
            summary,
            details_name: details_file_name(period),
            details,
            stored: self.store.is_some(),
        };
        if let Some(store) = &self.store {
            store.put(&export.summary_name, &export.summary)?;
            store.put(&export.details_name, &export.details)?;
            info!(
                "Month={}: Exported {} and {}",
                period, export.summary_name, export.details_name
            );
        }
        Ok(export)
    }
}
