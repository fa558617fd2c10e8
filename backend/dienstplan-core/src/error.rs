// src/error.rs
use thiserror::Error;

// --- Schedule import errors ---

// Only workbook-level failures surface here; malformed rows and cells
// degrade to empty DayEntry values inside the parser.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Workbook could not be opened: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Sheet '{sheet}' could not be read: {message}")]
    Sheet { sheet: String, message: String },

    #[error("No Dienstplan workbook found for {0}")]
    Missing(String),
}

// --- Roster errors ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("Mandatory field missing: {0}")]
    MissingField(&'static str),

    #[error("Employee already exists: {0}")]
    EmployeeExists(String),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("Cannot deactivate {0}: last active lead")]
    LastLead(String),

    #[error("PIN reset is only available for leads, {0} is staff")]
    PinResetNotAllowed(String),
}

// --- Entry book errors ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("Invalid entry key '{0}' (expected 'Name-Week-Day')")]
    InvalidKey(String),

    #[error("Invalid month key '{0}' (expected 'YYYY-MM')")]
    InvalidMonth(String),

    #[error("Mandatory field missing: {0}")]
    MissingField(&'static str),
}

// --- Storage errors ---

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error")]
    Csv(#[from] csv::Error),
}

// Helper to create context-aware IO errors
pub(crate) fn io_context<S: Into<String>>(source: std::io::Error, context: S) -> StoreError {
    StoreError::Io {
        source,
        context: context.into(),
    }
}

// --- Top level ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Schedule import failed")]
    Schedule(#[from] ScheduleError),

    #[error("Roster update failed")]
    Roster(#[from] RosterError),

    #[error("Entry update failed")]
    Entry(#[from] EntryError),

    #[error("Storage failed")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Store(StoreError::Json(e))
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Store(StoreError::Csv(e))
    }
}
