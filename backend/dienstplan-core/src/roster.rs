// src/roster.rs
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::RosterError;
use crate::model::{Area, Employee, Role};

// --- Master data ---

fn default_true() -> bool {
    true
}

fn default_standard_hours() -> Decimal {
    DEFAULT_STANDARD_HOURS
}

pub const DEFAULT_STANDARD_HOURS: Decimal = dec!(6);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRecord {
    pub name: String,
    #[serde(alias = "bereich")]
    pub area: Area,
    pub pin: String,
    #[serde(default)]
    pub is_minor: bool,
    #[serde(default)]
    pub role: Role,
    #[serde(
        with = "rust_decimal::serde::float",
        alias = "standardStunden",
        default = "default_standard_hours"
    )]
    pub standard_hours: Decimal,
    #[serde(default = "default_true")]
    pub can_track_prep_time: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl RosterRecord {
    pub fn to_employee(&self) -> Employee {
        Employee {
            name: self.name.clone(),
            area: self.area,
            is_minor: self.is_minor,
            role: self.role,
            standard_hours: self.standard_hours,
            can_track_prep_time: self.can_track_prep_time,
        }
    }

    pub fn is_lead(&self) -> bool {
        self.role == Role::Lead
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub name: String,
    pub area: Option<Area>,
    pub is_minor: bool,
    pub standard_hours: Option<Decimal>,
    pub can_track_prep_time: Option<bool>,
}

/// Fields left `None` are kept. The name is the identity and cannot change.
#[derive(Debug, Clone, Default)]
pub struct RosterUpdate {
    pub area: Option<Area>,
    pub pin: Option<String>,
    pub is_minor: Option<bool>,
    pub standard_hours: Option<Decimal>,
    pub can_track_prep_time: Option<bool>,
    pub active: Option<bool>,
}

// (name, area, minor, role, standard hours, prep time, demo PIN)
type StaffRow = (&'static str, Area, bool, Role, Decimal, bool, &'static str);

const STAFF: [StaffRow; 10] = [
    ("Alina", Area::Nest, false, Role::Staff, dec!(5.5), true, "1111"),
    ("Berit", Area::Nest, false, Role::Staff, dec!(6.5), true, "2222"),
    ("Catharina", Area::Nest, false, Role::Lead, dec!(7.5), true, "0000"),
    ("Izabella", Area::Nest, true, Role::Staff, dec!(5.83), false, "3333"),
    ("Olli", Area::Nest, false, Role::Staff, dec!(4), false, "4444"),
    ("Ilai", Area::U3, false, Role::Staff, dec!(6.25), true, "5555"),
    ("Edu", Area::U3, false, Role::Staff, dec!(6), true, "6666"),
    ("Juli", Area::U3, false, Role::Staff, dec!(5.75), true, "7777"),
    ("Lucia", Area::U3, true, Role::Staff, dec!(6.5), false, "8888"),
    ("Myriam", Area::U3, false, Role::Staff, dec!(6), true, "9999"),
];

fn staff_record(row: &StaffRow, pin: String) -> RosterRecord {
    let (name, area, is_minor, role, standard_hours, can_track_prep_time, _) = *row;
    RosterRecord {
        name: name.to_string(),
        area,
        pin,
        is_minor,
        role,
        standard_hours,
        can_track_prep_time,
        active: true,
    }
}

/// Employees of the demonstration roster, in roster order.
pub fn demo_employees() -> Vec<Employee> {
    STAFF
        .iter()
        .map(|row| staff_record(row, row.6.to_string()).to_employee())
        .collect()
}

/// Four-digit PIN, 1000..=9999.
pub fn generate_pin<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(1000..=9999).to_string()
}

// --- Roster ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default, alias = "mitarbeiter")]
    pub employees: BTreeMap<String, RosterRecord>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub demo: bool,
    /// Set when the roster was just created with fresh PINs that still
    /// have to be handed out.
    #[serde(skip)]
    pub newly_created: bool,
}

impl Roster {
    /// First-run roster with random PINs.
    pub fn initial<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Self {
        let employees = STAFF
            .iter()
            .map(|row| (row.0.to_string(), staff_record(row, generate_pin(rng))))
            .collect();
        info!("Created initial roster with {} employees", STAFF.len());
        Self {
            employees,
            last_updated: Some(now),
            initialized: true,
            demo: false,
            newly_created: true,
        }
    }

    /// Fixed PINs; lead Catharina uses 0000.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let employees = STAFF
            .iter()
            .map(|row| (row.0.to_string(), staff_record(row, row.6.to_string())))
            .collect();
        Self {
            employees,
            last_updated: Some(now),
            initialized: true,
            demo: true,
            newly_created: false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&RosterRecord> {
        self.employees.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut RosterRecord, RosterError> {
        self.employees
            .get_mut(name)
            .ok_or_else(|| RosterError::EmployeeNotFound(name.to_string()))
    }

    pub fn active_employees(&self) -> Vec<Employee> {
        self.employees
            .values()
            .filter(|r| r.active)
            .map(RosterRecord::to_employee)
            .collect()
    }

    fn active_lead_count(&self) -> usize {
        self.employees
            .values()
            .filter(|r| r.active && r.is_lead())
            .count()
    }

    /// Adds a staff member and returns the generated PIN.
    pub fn add<R: Rng>(
        &mut self,
        new: NewEmployee,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<String, RosterError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(RosterError::MissingField("name"));
        }
        let area = new.area.ok_or(RosterError::MissingField("area"))?;
        if self.employees.contains_key(name) {
            return Err(RosterError::EmployeeExists(name.to_string()));
        }

        let pin = generate_pin(rng);
        self.employees.insert(
            name.to_string(),
            RosterRecord {
                name: name.to_string(),
                area,
                pin: pin.clone(),
                is_minor: new.is_minor,
                role: Role::Staff,
                standard_hours: new.standard_hours.unwrap_or(DEFAULT_STANDARD_HOURS),
                can_track_prep_time: new.can_track_prep_time.unwrap_or(true),
                active: true,
            },
        );
        self.last_updated = Some(now);
        info!("Emp={}: Added to roster (Area={})", name, area.label());
        Ok(pin)
    }

    pub fn update(
        &mut self,
        name: &str,
        update: RosterUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), RosterError> {
        if update.active == Some(false) {
            self.ensure_not_last_lead(name)?;
        }
        let record = self.get_mut(name)?;
        if let Some(area) = update.area {
            record.area = area;
        }
        if let Some(pin) = update.pin {
            record.pin = pin;
        }
        if let Some(is_minor) = update.is_minor {
            record.is_minor = is_minor;
        }
        if let Some(hours) = update.standard_hours {
            record.standard_hours = hours;
        }
        if let Some(prep) = update.can_track_prep_time {
            record.can_track_prep_time = prep;
        }
        if let Some(active) = update.active {
            record.active = active;
        }
        self.last_updated = Some(now);
        info!("Emp={}: Roster record updated", name);
        Ok(())
    }

    fn ensure_not_last_lead(&self, name: &str) -> Result<(), RosterError> {
        let record = self
            .get(name)
            .ok_or_else(|| RosterError::EmployeeNotFound(name.to_string()))?;
        if record.active && record.is_lead() && self.active_lead_count() <= 1 {
            warn!("Emp={}: Refusing to deactivate the last active lead", name);
            return Err(RosterError::LastLead(name.to_string()));
        }
        Ok(())
    }

    /// Soft delete: the record stays, only the active flag is cleared.
    pub fn deactivate(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), RosterError> {
        self.ensure_not_last_lead(name)?;
        let record = self.get_mut(name)?;
        record.active = false;
        self.last_updated = Some(now);
        info!("Emp={}: Deactivated", name);
        Ok(())
    }

    pub fn verify_pin(&self, name: &str, pin: &str) -> bool {
        self.get(name)
            .map(|r| r.active && r.pin == pin.trim())
            .unwrap_or(false)
    }

    /// New random PIN; only leads may reset their own PIN this way.
    pub fn reset_pin<R: Rng>(
        &mut self,
        name: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<String, RosterError> {
        let record = self.get_mut(name)?;
        if !record.is_lead() {
            return Err(RosterError::PinResetNotAllowed(name.to_string()));
        }
        let pin = generate_pin(rng);
        record.pin = pin.clone();
        self.last_updated = Some(now);
        info!("Emp={}: PIN reset", name);
        Ok(pin)
    }
}
