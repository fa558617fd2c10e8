// src/main.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dienstplan_core::draft::EntryDraft;
use dienstplan_core::entries::{ApprovalStatus, DeviationKey, ExtraTimeKind};
use dienstplan_core::hours::{employee_month_report, format_hours};
use dienstplan_core::model::{AbsenceCode, Area, MonthPeriod};
use dienstplan_core::roster::{NewEmployee, RosterUpdate};
use dienstplan_core::{AppConfig, DienstplanService};

#[derive(Parser)]
#[command(name = "dienstplan")]
#[command(version)]
#[command(about = "Dienstplan import, Soll/Ist hours and monthly approval", long_about = None)]
struct Cli {
    /// Month as YYYY-MM, defaults to the current month
    #[arg(short, long, global = true)]
    month: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized schedule
    Schedule {
        #[arg(long)]
        json: bool,
    },
    /// Soll/Ist totals per employee
    Report {
        #[arg(short, long)]
        employee: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write the month summary and day details as CSV
    Export,
    /// Record deviations and extra time for one employee and submit the month
    Submit {
        #[arg(short, long)]
        employee: String,
        #[arg(long)]
        pin: String,
        /// WEEK-DAY=VALUE, VALUE being hours (e.g. -0.5) or an absence code
        #[arg(long = "set", value_name = "WEEK-DAY=VALUE")]
        set: Vec<String>,
        /// WEEK-DAY=DELTA, moves the deviation in quarter-hour steps
        #[arg(long = "step", value_name = "WEEK-DAY=DELTA")]
        step: Vec<String>,
        /// WEEK-DAY, removes a recorded deviation
        #[arg(long = "clear", value_name = "WEEK-DAY")]
        clear: Vec<String>,
        /// YYYY-MM-DD=DELTA preparation time
        #[arg(long = "prep", value_name = "DATE=DELTA")]
        prep: Vec<String>,
        /// YYYY-MM-DD=DELTA office time (leads only)
        #[arg(long = "office", value_name = "DATE=DELTA")]
        office: Vec<String>,
    },
    /// Approve, reject or send back a submitted month
    Approve {
        #[arg(short, long)]
        employee: String,
        /// approved | rejected | correction_required
        #[arg(short, long)]
        status: String,
        #[arg(short, long)]
        comment: Option<String>,
        /// Name of the approving lead
        #[arg(long)]
        lead: String,
        #[arg(long)]
        pin: String,
    },
    /// Staff master data
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
}

#[derive(Subcommand)]
enum RosterCommand {
    List {
        /// Include deactivated staff
        #[arg(long)]
        all: bool,
    },
    Add {
        name: String,
        #[arg(long, value_parser = parse_area)]
        area: Area,
        #[arg(long)]
        minor: bool,
        #[arg(long)]
        standard_hours: Option<Decimal>,
        #[arg(long)]
        no_prep_time: bool,
    },
    Update {
        name: String,
        #[arg(long, value_parser = parse_area)]
        area: Option<Area>,
        #[arg(long)]
        pin: Option<String>,
        #[arg(long)]
        minor: Option<bool>,
        #[arg(long)]
        standard_hours: Option<Decimal>,
        #[arg(long)]
        prep_time: Option<bool>,
        #[arg(long)]
        active: Option<bool>,
    },
    Deactivate {
        name: String,
    },
    ResetPin {
        name: String,
    },
    VerifyPin {
        name: String,
        pin: String,
    },
}

fn parse_area(raw: &str) -> Result<Area, String> {
    Area::parse(raw).ok_or_else(|| format!("unknown area '{}' (Nest, Ü3, Wald)", raw))
}

fn parse_period(month: Option<&str>) -> Result<MonthPeriod> {
    match month {
        Some(key) => MonthPeriod::parse(key).with_context(|| format!("invalid --month '{}'", key)),
        None => Ok(MonthPeriod::from_date(Utc::now().date_naive())),
    }
}

/// `1-4=0.5` -> (key of `employee`, "0.5")
fn parse_day_arg<'a>(employee: &str, arg: &'a str) -> Result<(DeviationKey, &'a str)> {
    let (day, value) = arg.split_once('=').unwrap_or((arg, ""));
    let key = DeviationKey::parse(&format!("{}-{}", employee, day.trim()))
        .with_context(|| format!("expected WEEK-DAY, got '{}'", day))?;
    Ok((key, value.trim()))
}

fn parse_hours(raw: &str) -> Result<Decimal> {
    Decimal::from_str(&raw.trim().replace(',', "."))
        .map_err(|e| anyhow!("invalid hours '{}': {}", raw, e))
}

fn parse_extra_arg(arg: &str) -> Result<(NaiveDate, Decimal)> {
    let (date, delta) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected DATE=DELTA, got '{}'", arg))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}'", date))?;
    Ok((date, parse_hours(delta)?))
}

fn print_schedule(service: &DienstplanService, period: MonthPeriod, json: bool) -> Result<()> {
    let roster = service.load_roster(Utc::now())?;
    let schedule = service.load_schedule(period, &roster);
    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
        return Ok(());
    }
    println!("Dienstplan {} {}", schedule.month, schedule.year);
    for week in &schedule.weeks {
        println!("\n{} ({})", week.label, week.date_range);
        for employee in &schedule.employees {
            let days = week.days_for(&employee.name);
            if days.is_empty() {
                continue;
            }
            let cells: Vec<String> = days
                .iter()
                .map(|d| match (&d.status, &d.start, &d.end) {
                    (Some(code), _, _) => format!("{} {:<11}", d.weekday, code.code()),
                    (None, Some(s), Some(e)) => format!("{} {}-{}", d.weekday, s, e),
                    _ => format!("{} {:<11}", d.weekday, "-"),
                })
                .collect();
            println!("  {:<10} {}", employee.name, cells.join("  "));
        }
    }
    Ok(())
}

fn print_report(
    service: &DienstplanService,
    period: MonthPeriod,
    employee: Option<&str>,
    json: bool,
) -> Result<()> {
    let (_, mut reports) = service.month_reports(period, Utc::now())?;
    if let Some(name) = employee {
        reports.retain(|r| r.employee.name == name);
        if reports.is_empty() {
            bail!("{} is not in the Dienstplan for {}", name, period);
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    println!("Stunden {} {}", period.german_name(), period.year);
    for report in &reports {
        let hours = &report.hours;
        println!(
            "  {:<10} {:<5} Soll {:>8}  Ist {:>8}  Pause {:>6}  Extra {:>6}  {}",
            report.employee.name,
            report.employee.area.display_name(),
            format_hours(hours.totals.planned),
            format_hours(hours.totals.actual),
            format_hours(hours.totals.breaks),
            format_hours(hours.extra_total()),
            report.status
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn submit(
    service: &DienstplanService,
    period: MonthPeriod,
    employee: &str,
    pin: &str,
    set: &[String],
    step: &[String],
    clear: &[String],
    prep: &[String],
    office: &[String],
) -> Result<()> {
    let now = Utc::now();
    let roster = service.load_roster(now)?;
    if !roster.verify_pin(employee, pin) {
        bail!("PIN for {} is not valid", employee);
    }

    let book = service.load_entries(period)?;
    let mut draft = EntryDraft::from_book(&book);
    for arg in set {
        let (key, value) = parse_day_arg(employee, arg)?;
        match AbsenceCode::parse(value) {
            Some(code) => draft.set_absence(&key, code),
            None => {
                let hours = draft.set_hours(&key, parse_hours(value)?);
                info!("Emp={}: {} set to {}", employee, key, hours);
            }
        }
    }
    for arg in step {
        let (key, value) = parse_day_arg(employee, arg)?;
        let hours = draft.step(&key, parse_hours(value)?);
        info!("Emp={}: {} stepped to {}", employee, key, hours);
    }
    for arg in clear {
        let (key, _) = parse_day_arg(employee, arg)?;
        draft.clear(&key);
    }

    let is_lead = roster.get(employee).map(|r| r.is_lead()).unwrap_or(false);
    if !office.is_empty() && !is_lead {
        warn!("Emp={}: Office time only counts for leads", employee);
    }
    for (kind, args) in [(ExtraTimeKind::Preparation, prep), (ExtraTimeKind::Office, office)] {
        for arg in args {
            let (date, delta) = parse_extra_arg(arg)?;
            draft.adjust_extra_time(employee, period, kind, date, delta, now);
        }
    }

    if !draft.has_unsaved_changes(employee, period) {
        info!("Emp={}: No changes, submitting current entries", employee);
    }
    let pending = draft.pending_for(employee);
    let stored = service.submit(
        employee,
        period,
        &pending,
        draft.extra_time_for(employee, period),
        now,
    )?;
    draft.mark_committed(employee, period);
    println!("{} Einträge für {} eingereicht ({})", stored, employee, period);
    Ok(())
}

fn run_roster(service: &DienstplanService, command: RosterCommand) -> Result<()> {
    let now = Utc::now();
    let mut roster = service.load_roster(now)?;
    if roster.newly_created {
        println!("Neue Stammdaten angelegt, PINs:");
        for record in roster.employees.values() {
            println!("  {:<10} {}", record.name, record.pin);
        }
    }
    let mut rng = rand::thread_rng();

    match command {
        RosterCommand::List { all } => {
            for record in roster.employees.values().filter(|r| all || r.active) {
                println!(
                    "  {:<10} {:<5} {:<5} Std {:>5} minderj. {:<5} Vorb. {:<5} aktiv {}",
                    record.name,
                    record.area.display_name(),
                    if record.is_lead() { "Lead" } else { "Staff" },
                    record.standard_hours,
                    record.is_minor,
                    record.can_track_prep_time,
                    record.active
                );
            }
            return Ok(());
        }
        RosterCommand::Add {
            name,
            area,
            minor,
            standard_hours,
            no_prep_time,
        } => {
            let new = NewEmployee {
                name: name.clone(),
                area: Some(area),
                is_minor: minor,
                standard_hours,
                can_track_prep_time: Some(!no_prep_time),
            };
            let pin = roster.add(new, &mut rng, now)?;
            println!("{} angelegt, PIN {}", name.trim(), pin);
        }
        RosterCommand::Update {
            name,
            area,
            pin,
            minor,
            standard_hours,
            prep_time,
            active,
        } => {
            let update = RosterUpdate {
                area,
                pin,
                is_minor: minor,
                standard_hours,
                can_track_prep_time: prep_time,
                active,
            };
            roster.update(&name, update, now)?;
            println!("{} aktualisiert", name);
        }
        RosterCommand::Deactivate { name } => {
            roster.deactivate(&name, now)?;
            println!("{} deaktiviert", name);
        }
        RosterCommand::ResetPin { name } => {
            let pin = roster.reset_pin(&name, &mut rng, now)?;
            println!("Neue PIN für {}: {}", name, pin);
        }
        RosterCommand::VerifyPin { name, pin } => {
            let valid = roster.verify_pin(&name, &pin);
            println!("{}", if valid { "PIN gültig" } else { "PIN ungültig" });
            return Ok(());
        }
    }

    service.save_roster(&roster)?;
    Ok(())
}

fn main() -> Result<()> {
    // --- Setup ---
    let config = AppConfig::from_env().context("reading DIENSTPLAN_* configuration")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing subscriber")?;

    let cli = Cli::parse();
    let period = parse_period(cli.month.as_deref())?;
    let service = DienstplanService::new(config).context("opening data directory")?;

    match cli.command {
        Commands::Schedule { json } => print_schedule(&service, period, json),
        Commands::Report { employee, json } => {
            print_report(&service, period, employee.as_deref(), json)
        }
        Commands::Export => {
            let export = service.export_month(period, Utc::now())?;
            if export.stored {
                println!("{} und {} geschrieben", export.summary_name, export.details_name);
            } else {
                print!("{}", String::from_utf8_lossy(&export.summary));
            }
            Ok(())
        }
        Commands::Submit {
            employee,
            pin,
            set,
            step,
            clear,
            prep,
            office,
        } => submit(
            &service, period, &employee, &pin, &set, &step, &clear, &prep, &office,
        ),
        Commands::Approve {
            employee,
            status,
            comment,
            lead,
            pin,
        } => {
            let roster = service.load_roster(Utc::now())?;
            let is_lead = roster.get(&lead).map(|r| r.is_lead()).unwrap_or(false);
            if !is_lead || !roster.verify_pin(&lead, &pin) {
                bail!("{} is not an active lead with this PIN", lead);
            }
            let status = ApprovalStatus::parse(&status)
                .ok_or_else(|| anyhow!("unknown status '{}'", status))?;
            service.approve(&employee, period, status, comment.as_deref(), Utc::now())?;
            let book = service.load_entries(period)?;
            let schedule = service.load_schedule(period, &roster);
            if let Some(emp) = schedule.employee(&employee) {
                let report = employee_month_report(&schedule, emp, &book, period);
                println!(
                    "{}: {} (Ist {})",
                    employee,
                    report.status,
                    format_hours(report.hours.grand_total())
                );
            } else {
                println!("{}: {}", employee, book.month_status(&employee, period));
            }
            Ok(())
        }
        Commands::Roster { command } => run_roster(&service, command),
    }
}
