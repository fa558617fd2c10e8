// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;

// --- Configuration & Constants ---

pub const DEFAULT_WEEK_PREFIXES: [&str; 2] = ["KW", "CW"];
/// First column (start time) of each weekday triplet, Monday to Friday.
pub const DEFAULT_DAY_COLUMNS: [usize; 5] = [1, 5, 9, 13, 17];
pub const DEFAULT_APPROVER: &str = "Leitung";

/// Used when no roster is available to tell data rows from other rows.
pub const FALLBACK_EMPLOYEE_NAMES: [&str; 10] = [
    "Ilai",
    "Edu",
    "Juli",
    "Lucia",
    "Myriam",
    "Alina",
    "Berit",
    "Catharina",
    "Izabella",
    "Olli",
];

fn default_week_prefixes() -> Vec<String> {
    DEFAULT_WEEK_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_day_columns() -> Vec<usize> {
    DEFAULT_DAY_COLUMNS.to_vec()
}

fn default_approver() -> String {
    DEFAULT_APPROVER.to_string()
}

/// Read from `DIENSTPLAN_*` environment variables (and `.env`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the workbook, entry and roster files.
    /// Without it the application runs on demonstration data.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_week_prefixes")]
    pub week_prefixes: Vec<String>,
    #[serde(default = "default_day_columns")]
    pub day_columns: Vec<usize>,
    #[serde(default = "default_approver")]
    pub approver: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            week_prefixes: default_week_prefixes(),
            day_columns: default_day_columns(),
            approver: default_approver(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        envy::prefixed("DIENSTPLAN_").from_env::<AppConfig>()
    }

    pub fn is_demo(&self) -> bool {
        self.data_dir.is_none()
    }

    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            week_prefixes: self.week_prefixes.clone(),
            day_columns: self.day_columns.clone(),
        }
    }
}

/// Declared layout of a week sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    pub week_prefixes: Vec<String>,
    /// Start-time column per weekday; end and hours follow at +1 and +2.
    pub day_columns: Vec<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            week_prefixes: default_week_prefixes(),
            day_columns: default_day_columns(),
        }
    }
}

impl ParserConfig {
    pub fn is_week_sheet(&self, sheet_name: &str) -> bool {
        self.week_prefixes
            .iter()
            .any(|prefix| sheet_name.starts_with(prefix.as_str()))
    }
}
