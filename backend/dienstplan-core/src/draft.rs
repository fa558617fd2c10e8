// src/draft.rs
//
// Local, not yet submitted edits on top of the last committed entry book.
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::entries::{
    employee_month_key, DeviationKey, DeviationMap, DeviationValue, EntryBook, ExtraTime,
    ExtraTimeKind,
};
use crate::model::{AbsenceCode, MonthPeriod};

pub const DEVIATION_STEP: Decimal = dec!(0.25);
pub const MAX_DEVIATION: Decimal = dec!(3);
pub const MIN_DEVIATION: Decimal = dec!(-3);

/// Snaps to the quarter-hour grid and clamps to [-3, 3].
pub fn clamp_deviation(hours: Decimal) -> Decimal {
    let quarters = (hours / DEVIATION_STEP).round();
    (quarters * DEVIATION_STEP).clamp(MIN_DEVIATION, MAX_DEVIATION)
}

#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    committed: DeviationMap,
    // `None` marks a cleared day.
    edits: BTreeMap<DeviationKey, Option<DeviationValue>>,
    committed_extra: BTreeMap<String, ExtraTime>,
    extra: BTreeMap<String, ExtraTime>,
}

impl EntryDraft {
    pub fn new(committed: DeviationMap) -> Self {
        Self {
            committed,
            ..Self::default()
        }
    }

    pub fn from_book(book: &EntryBook) -> Self {
        Self {
            committed: book.deviations(),
            committed_extra: book.extra_time.clone(),
            extra: book.extra_time.clone(),
            ..Self::default()
        }
    }

    pub fn committed(&self) -> &DeviationMap {
        &self.committed
    }

    pub fn get(&self, key: &DeviationKey) -> Option<DeviationValue> {
        match self.edits.get(key) {
            Some(edit) => *edit,
            None => self.committed.get(key).copied(),
        }
    }

    fn record(&mut self, key: DeviationKey, value: Option<DeviationValue>) {
        if self.committed.get(&key).copied() == value {
            self.edits.remove(&key);
        } else {
            self.edits.insert(key, value);
        }
    }

    /// Moves the numeric deviation by `delta`; an absence is replaced.
    /// Returns the new value.
    pub fn step(&mut self, key: &DeviationKey, delta: Decimal) -> Decimal {
        let current = self.get(key).map(|v| v.hours()).unwrap_or(Decimal::ZERO);
        let next = clamp_deviation(current + delta);
        self.record(key.clone(), Some(DeviationValue::Hours(next)));
        next
    }

    pub fn set_hours(&mut self, key: &DeviationKey, hours: Decimal) -> Decimal {
        let value = clamp_deviation(hours);
        self.record(key.clone(), Some(DeviationValue::Hours(value)));
        value
    }

    pub fn set_absence(&mut self, key: &DeviationKey, code: AbsenceCode) {
        self.record(key.clone(), Some(DeviationValue::Absence(code)));
    }

    pub fn clear(&mut self, key: &DeviationKey) {
        self.record(key.clone(), None);
    }

    /// Committed values with local edits applied.
    pub fn effective(&self) -> DeviationMap {
        let mut map = self.committed.clone();
        for (key, edit) in &self.edits {
            match edit {
                Some(value) => {
                    map.insert(key.clone(), *value);
                }
                None => {
                    map.remove(key);
                }
            }
        }
        map
    }

    /// The full set to submit for one employee.
    pub fn pending_for(&self, employee: &str) -> DeviationMap {
        let mut map = self.effective();
        map.retain(|key, _| key.employee == employee);
        map
    }

    pub fn extra_time_for(&self, employee: &str, period: MonthPeriod) -> Option<&ExtraTime> {
        self.extra.get(&employee_month_key(employee, period))
    }

    pub fn adjust_extra_time(
        &mut self,
        employee: &str,
        period: MonthPeriod,
        kind: ExtraTimeKind,
        date: NaiveDate,
        delta: Decimal,
        now: DateTime<Utc>,
    ) -> Decimal {
        let key = employee_month_key(employee, period);
        let extra = self.extra.entry(key.clone()).or_default();
        extra.adjust(kind, date, delta, now);
        let total = extra.total(kind);
        if extra.is_empty() && !self.committed_extra.contains_key(&key) {
            self.extra.remove(&key);
        }
        total
    }

    pub fn has_unsaved_changes(&self, employee: &str, period: MonthPeriod) -> bool {
        if self.edits.keys().any(|key| key.employee == employee) {
            return true;
        }
        let key = employee_month_key(employee, period);
        let current = self.extra.get(&key).filter(|e| !e.is_empty());
        let committed = self.committed_extra.get(&key).filter(|e| !e.is_empty());
        current != committed
    }

    /// Call after a successful submission of this employee's entries.
    pub fn mark_committed(&mut self, employee: &str, period: MonthPeriod) {
        let mine: Vec<DeviationKey> = self
            .edits
            .keys()
            .filter(|key| key.employee == employee)
            .cloned()
            .collect();
        for key in mine {
            match self.edits.remove(&key).flatten() {
                Some(value) => {
                    self.committed.insert(key, value);
                }
                None => {
                    self.committed.remove(&key);
                }
            }
        }

        let key = employee_month_key(employee, period);
        match self.extra.get(&key) {
            Some(extra) => {
                self.committed_extra.insert(key, extra.clone());
            }
            None => {
                self.committed_extra.remove(&key);
            }
        }
        debug!("Emp={}, Month={}: Draft committed", employee, period);
    }

    /// Adopts a freshly loaded snapshot. Local edits survive unless the
    /// snapshot already holds the same value.
    pub fn rebase(&mut self, snapshot: &EntryBook) {
        self.committed = snapshot.deviations();
        let committed = &self.committed;
        self.edits
            .retain(|key, edit| committed.get(key).copied() != *edit);

        let keys: BTreeSet<String> = self
            .committed_extra
            .keys()
            .chain(snapshot.extra_time.keys())
            .cloned()
            .collect();
        for key in keys {
            if self.extra.get(&key) != self.committed_extra.get(&key) {
                continue;
            }
            match snapshot.extra_time.get(&key) {
                Some(extra) => {
                    self.extra.insert(key, extra.clone());
                }
                None => {
                    self.extra.remove(&key);
                }
            }
        }
        self.committed_extra = snapshot.extra_time.clone();
        debug!("Draft rebased, {} local edits kept", self.edits.len());
    }
}
