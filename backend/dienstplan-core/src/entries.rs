// src/entries.rs
//
// The per-month entry book: deviations, submissions, approvals and extra time.
// Persisted as one JSON document per month.
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::EntryError;
use crate::model::{AbsenceCode, MonthPeriod};

// --- Deviation keys and values ---

/// Identifies one employee-day: `Name-WeekIndex-DayIndex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviationKey {
    pub employee: String,
    pub week: usize,
    pub day: usize,
}

impl DeviationKey {
    pub fn new(employee: &str, week: usize, day: usize) -> Self {
        Self {
            employee: employee.to_string(),
            week,
            day,
        }
    }

    /// Indices are split off from the right so names may contain '-'.
    pub fn parse(raw: &str) -> Result<Self, EntryError> {
        let invalid = || EntryError::InvalidKey(raw.to_string());
        let mut parts = raw.rsplitn(3, '-');
        let day = parts.next().ok_or_else(invalid)?;
        let week = parts.next().ok_or_else(invalid)?;
        let employee = parts.next().ok_or_else(invalid)?;
        if employee.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            employee: employee.to_string(),
            week: week.parse().map_err(|_| invalid())?,
            day: day.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for DeviationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.employee, self.week, self.day)
    }
}

/// A recorded difference from the planned hours of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviationValue {
    /// Signed hours relative to the plan; zero means "as planned".
    Hours(Decimal),
    Absence(AbsenceCode),
}

impl DeviationValue {
    /// Absence token or decimal number. Anything else counts as no deviation.
    pub fn parse(raw: &str) -> Self {
        if let Some(code) = AbsenceCode::parse(raw) {
            return DeviationValue::Absence(code);
        }
        let hours = Decimal::from_str(&raw.trim().replace(',', ".")).unwrap_or(Decimal::ZERO);
        DeviationValue::Hours(hours)
    }

    pub fn absence(&self) -> Option<AbsenceCode> {
        match self {
            DeviationValue::Absence(code) => Some(*code),
            DeviationValue::Hours(_) => None,
        }
    }

    pub fn hours(&self) -> Decimal {
        match self {
            DeviationValue::Hours(h) => *h,
            DeviationValue::Absence(_) => Decimal::ZERO,
        }
    }

    pub fn to_raw(&self) -> String {
        match self {
            DeviationValue::Hours(h) => h.normalize().to_string(),
            DeviationValue::Absence(code) => code.code().to_string(),
        }
    }
}

impl fmt::Display for DeviationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

impl Serialize for DeviationValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_raw())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDeviation {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for DeviationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawDeviation::deserialize(deserializer)? {
            RawDeviation::Number(n) => {
                DeviationValue::Hours(Decimal::from_f64(n).unwrap_or(Decimal::ZERO).round_dp(2))
            }
            RawDeviation::Text(s) => DeviationValue::parse(&s),
            RawDeviation::Other(raw) => {
                debug!("Unreadable deviation value {}, counted as no deviation", raw);
                no_deviation()
            }
        })
    }
}

fn no_deviation() -> DeviationValue {
    DeviationValue::Hours(Decimal::ZERO)
}

pub type DeviationMap = BTreeMap<DeviationKey, DeviationValue>;

// --- Stored records ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDeviation {
    #[serde(alias = "wert", default = "no_deviation")]
    pub value: DeviationValue,
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "mitarbeiter")]
    pub employee: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[serde(rename = "submitted", alias = "eingereicht")]
    Submitted,
    #[serde(rename = "approved", alias = "genehmigt")]
    Approved,
    #[serde(rename = "rejected", alias = "abgelehnt")]
    Rejected,
    #[serde(rename = "correction_required", alias = "korrektur_erforderlich")]
    CorrectionRequired,
}

impl ApprovalStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "submitted" | "eingereicht" => Some(ApprovalStatus::Submitted),
            "approved" | "genehmigt" => Some(ApprovalStatus::Approved),
            "rejected" | "abgelehnt" => Some(ApprovalStatus::Rejected),
            "correction_required" | "korrektur_erforderlich" | "correction" => {
                Some(ApprovalStatus::CorrectionRequired)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub status: ApprovalStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub status: ApprovalStatus,
    #[serde(default, alias = "kommentar")]
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "genehmiger")]
    pub approver: String,
}

/// Review state of one employee-month as shown to staff and leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthStatus {
    Open,
    Submitted,
    Approved,
    Rejected,
    CorrectionRequired,
}

impl MonthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MonthStatus::Open => "Offen",
            MonthStatus::Submitted => "Eingereicht",
            MonthStatus::Approved => "Genehmigt",
            MonthStatus::Rejected => "Abgelehnt",
            MonthStatus::CorrectionRequired => "Korrektur erforderlich",
        }
    }
}

impl fmt::Display for MonthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `Name-YYYY-MM`
pub fn employee_month_key(employee: &str, period: MonthPeriod) -> String {
    format!("{}-{}", employee, period.key())
}

// --- Extra time ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraTimeKind {
    /// Vorbereitungszeit
    Preparation,
    /// Bürozeit, leads only
    Office,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraTimeEntry {
    #[serde(with = "rust_decimal::serde::float", alias = "stunden")]
    pub hours: Decimal,
    #[serde(alias = "datum")]
    pub date: NaiveDate,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Dated hours outside the schedule for one employee-month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraTime {
    #[serde(default, alias = "vorbereitung")]
    pub preparation: Vec<ExtraTimeEntry>,
    #[serde(default, alias = "buerozeit")]
    pub office: Vec<ExtraTimeEntry>,
}

impl ExtraTime {
    pub fn entries(&self, kind: ExtraTimeKind) -> &[ExtraTimeEntry] {
        match kind {
            ExtraTimeKind::Preparation => &self.preparation,
            ExtraTimeKind::Office => &self.office,
        }
    }

    fn entries_mut(&mut self, kind: ExtraTimeKind) -> &mut Vec<ExtraTimeEntry> {
        match kind {
            ExtraTimeKind::Preparation => &mut self.preparation,
            ExtraTimeKind::Office => &mut self.office,
        }
    }

    pub fn total(&self, kind: ExtraTimeKind) -> Decimal {
        self.entries(kind).iter().map(|e| e.hours).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.preparation.is_empty() && self.office.is_empty()
    }

    /// Changes the entry for `date` by `delta`. The entry is removed once it
    /// reaches zero; a new one is only created for a positive delta.
    pub fn adjust(&mut self, kind: ExtraTimeKind, date: NaiveDate, delta: Decimal, now: DateTime<Utc>) {
        let entries = self.entries_mut(kind);
        match entries.iter().position(|e| e.date == date) {
            Some(idx) => {
                let hours = (entries[idx].hours + delta).max(Decimal::ZERO);
                if hours.is_zero() {
                    entries.remove(idx);
                } else {
                    entries[idx].hours = hours;
                    entries[idx].timestamp = Some(now);
                }
            }
            None if delta > Decimal::ZERO => entries.push(ExtraTimeEntry {
                hours: delta,
                date,
                timestamp: Some(now),
            }),
            None => {}
        }
    }
}

// --- Entry book ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBook {
    #[serde(default, alias = "eintraege")]
    pub entries: BTreeMap<String, StoredDeviation>,
    #[serde(default, alias = "einreichungen")]
    pub submissions: BTreeMap<String, Submission>,
    #[serde(default, alias = "genehmigungen")]
    pub approvals: BTreeMap<String, ApprovalRecord>,
    #[serde(default, alias = "zusatzzeiten")]
    pub extra_time: BTreeMap<String, ExtraTime>,
}

impl EntryBook {
    /// Replaces the employee's deviations with `entries`, stores their extra
    /// time and records the submission. Keys of other employees are ignored.
    /// Returns the number of deviations stored.
    pub fn submit(
        &mut self,
        employee: &str,
        period: MonthPeriod,
        entries: &DeviationMap,
        extra_time: Option<&ExtraTime>,
        now: DateTime<Utc>,
    ) -> Result<usize, EntryError> {
        if employee.trim().is_empty() {
            return Err(EntryError::MissingField("employee"));
        }

        self.entries.retain(|raw, stored| {
            let owner = DeviationKey::parse(raw)
                .map(|k| k.employee)
                .unwrap_or_else(|_| stored.employee.clone());
            owner != employee
        });

        let mut stored = 0;
        for (key, value) in entries {
            if key.employee != employee {
                warn!(
                    "Emp={}: Skipping entry {} belonging to another employee",
                    employee, key
                );
                continue;
            }
            self.entries.insert(
                key.to_string(),
                StoredDeviation {
                    value: *value,
                    timestamp: now,
                    employee: employee.to_string(),
                },
            );
            stored += 1;
        }

        let month_key = employee_month_key(employee, period);
        match extra_time {
            Some(extra) if !extra.is_empty() => {
                self.extra_time.insert(month_key.clone(), extra.clone());
            }
            Some(_) => {
                self.extra_time.remove(&month_key);
            }
            None => {}
        }
        self.submissions.insert(
            month_key,
            Submission {
                status: ApprovalStatus::Submitted,
                timestamp: now,
            },
        );

        info!(
            "Emp={}, Month={}: Submitted {} deviations",
            employee, period, stored
        );
        Ok(stored)
    }

    pub fn set_approval(
        &mut self,
        employee: &str,
        period: MonthPeriod,
        status: ApprovalStatus,
        comment: Option<&str>,
        approver: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EntryError> {
        if employee.trim().is_empty() {
            return Err(EntryError::MissingField("employee"));
        }
        self.approvals.insert(
            employee_month_key(employee, period),
            ApprovalRecord {
                status,
                comment: comment.unwrap_or_default().to_string(),
                timestamp: now,
                approver: approver.to_string(),
            },
        );
        info!(
            "Emp={}, Month={}: Approval set to {:?} by {}",
            employee, period, status, approver
        );
        Ok(())
    }

    /// An approval decision outranks a plain submission.
    pub fn month_status(&self, employee: &str, period: MonthPeriod) -> MonthStatus {
        let key = employee_month_key(employee, period);
        if let Some(approval) = self.approvals.get(&key) {
            match approval.status {
                ApprovalStatus::Approved => return MonthStatus::Approved,
                ApprovalStatus::Rejected => return MonthStatus::Rejected,
                ApprovalStatus::CorrectionRequired => return MonthStatus::CorrectionRequired,
                ApprovalStatus::Submitted => {}
            }
        }
        if self.submissions.contains_key(&key) {
            MonthStatus::Submitted
        } else {
            MonthStatus::Open
        }
    }

    pub fn approval(&self, employee: &str, period: MonthPeriod) -> Option<&ApprovalRecord> {
        self.approvals.get(&employee_month_key(employee, period))
    }

    /// Typed view of all stored deviations; malformed keys are skipped.
    pub fn deviations(&self) -> DeviationMap {
        self.entries
            .iter()
            .filter_map(|(raw, stored)| match DeviationKey::parse(raw) {
                Ok(key) => Some((key, stored.value)),
                Err(e) => {
                    warn!("Ignoring stored entry: {}", e);
                    None
                }
            })
            .collect()
    }

    pub fn deviations_for(&self, employee: &str) -> DeviationMap {
        let mut map = self.deviations();
        map.retain(|key, _| key.employee == employee);
        debug!("Emp={}: {} stored deviations", employee, map.len());
        map
    }

    pub fn extra_time_for(&self, employee: &str, period: MonthPeriod) -> Option<&ExtraTime> {
        self.extra_time.get(&employee_month_key(employee, period))
    }
}
