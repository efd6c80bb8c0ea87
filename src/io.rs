use crate::model::{
    Assignment, AssignmentEntry, ContractType, DayForecast, Employee, EmployeeId,
    OccupancyForecast, Period, Role, ShiftSlot, DAYS,
};
use crate::scheduler::ConstraintViolation;
use crate::stats::WeeklyStatistics;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

fn field<'r>(rec: &'r StringRecord, idx: usize, name: &str) -> anyhow::Result<&'r str> {
    Ok(rec.get(idx).with_context(|| format!("missing {name}"))?.trim())
}

fn optional(rec: &StringRecord, idx: usize) -> Option<&str> {
    rec.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Import de l'équipe: header
/// `id,display_name,role,contract[,languages][,periods][,absences][,available]`,
/// listes séparées par `;`.
pub fn import_roster_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Employee>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = field(&rec, 0, "id")?;
        let display = field(&rec, 1, "display_name")?;
        if id.is_empty() || display.is_empty() {
            bail!("invalid roster row (empty)");
        }
        let role = parse_role(field(&rec, 2, "role")?)
            .with_context(|| format!("invalid role for {id}"))?;
        let contract = parse_contract(field(&rec, 3, "contract")?)
            .with_context(|| format!("invalid contract for {id}"))?;

        let mut employee = Employee::new(display, role, contract).with_id(id);
        if let Some(raw) = optional(&rec, 4) {
            employee = employee.with_languages(list(raw));
        }
        if let Some(raw) = optional(&rec, 5) {
            let periods = list(raw)
                .map(parse_period)
                .collect::<anyhow::Result<BTreeSet<_>>>()
                .with_context(|| format!("invalid periods for {id}"))?;
            employee = employee.with_periods(periods);
        }
        if let Some(raw) = optional(&rec, 6) {
            let days = list(raw)
                .map(parse_day)
                .collect::<anyhow::Result<BTreeSet<_>>>()
                .with_context(|| format!("invalid absences for {id}"))?;
            employee = employee.with_absences(days);
        }
        if let Some(raw) = optional(&rec, 7) {
            if !parse_bool(raw).with_context(|| format!("invalid available value for {id}"))? {
                employee = employee.unavailable();
            }
        }
        out.push(employee);
    }
    Ok(out)
}

/// Import de la prévision: header `day,check_ins,check_outs`, un jour par ligne.
pub fn import_forecast_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<OccupancyForecast> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut days: Vec<(u8, DayForecast)> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let day = parse_day(field(&rec, 0, "day")?)?;
        let check_ins: i64 = field(&rec, 1, "check_ins")?.parse().context("check_ins")?;
        let check_outs: i64 = field(&rec, 2, "check_outs")?.parse().context("check_outs")?;
        if days.iter().any(|(d, _)| *d == day) {
            bail!("duplicate forecast row for day {day}");
        }
        days.push((day, DayForecast::new(check_ins, check_outs)));
    }
    days.sort_by_key(|(d, _)| *d);
    Ok(OccupancyForecast::new(days.into_iter().map(|(_, f)| f).collect()))
}

/// Import d'un planning édité à la main: header `employee_id,day,period`.
pub fn import_assignment_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Assignment> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut entries = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let employee = field(&rec, 0, "employee_id")?;
        if employee.is_empty() {
            bail!("invalid assignment row (empty employee_id)");
        }
        let day = parse_day(field(&rec, 1, "day")?)?;
        let period = parse_period(field(&rec, 2, "period")?)?;
        entries.push(AssignmentEntry::new(
            EmployeeId::new(employee),
            ShiftSlot::new(day, period),
        ));
    }
    Ok(entries.into_iter().collect())
}

/// Export CSV du planning: header `employee_id,display_name,day,weekday,period`
pub fn export_assignment_csv<P: AsRef<Path>>(
    path: P,
    roster: &[Employee],
    assignment: &Assignment,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["employee_id", "display_name", "day", "weekday", "period"])?;
    let mut buf = itoa::Buffer::new();
    for entry in assignment.iter() {
        let name = roster
            .iter()
            .find(|e| e.id == entry.employee)
            .map(|e| e.display_name.as_str())
            .unwrap_or("");
        let weekday = entry.slot.weekday().to_string();
        w.write_record([
            entry.employee.as_str(),
            name,
            buf.format(entry.slot.day),
            weekday.as_str(),
            entry.slot.period.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des écarts: header `kind,employee_id,slot,days,observed,required,detail`
pub fn export_violations_csv<P: AsRef<Path>>(
    path: P,
    violations: &[ConstraintViolation],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["kind", "employee_id", "slot", "days", "observed", "required", "detail"])?;
    let (mut observed, mut required) = (itoa::Buffer::new(), itoa::Buffer::new());
    for v in violations {
        let slot = v.slot.map(|s| s.to_string()).unwrap_or_default();
        let days = v
            .days
            .map(|(a, b)| if a == b { a.to_string() } else { format!("{a}-{b}") })
            .unwrap_or_default();
        w.write_record([
            v.kind.as_str(),
            v.employee.as_ref().map(EmployeeId::as_str).unwrap_or(""),
            slot.as_str(),
            days.as_str(),
            observed.format(v.observed),
            required.format(v.required),
            v.detail.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des charges: header `employee_id,display_name,role,contract,shifts,hours,days_worked`
pub fn export_statistics_csv<P: AsRef<Path>>(
    path: P,
    statistics: &WeeklyStatistics,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "employee_id",
        "display_name",
        "role",
        "contract",
        "shifts",
        "hours",
        "days_worked",
    ])?;
    let (mut a, mut b, mut c) = (itoa::Buffer::new(), itoa::Buffer::new(), itoa::Buffer::new());
    for load in &statistics.employees {
        w.write_record([
            load.employee.as_str(),
            load.display_name.as_str(),
            load.role.as_str(),
            load.contract.as_str(),
            a.format(load.shifts),
            b.format(load.hours),
            c.format(load.days_worked),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export JSON (jolie mise en forme) de toute valeur sérialisable.
pub fn export_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

fn list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

pub fn parse_role(s: &str) -> anyhow::Result<Role> {
    match s.to_ascii_lowercase().as_str() {
        "supervisor" | "superviseur" => Ok(Role::Supervisor),
        "receptionist" | "receptionniste" | "réceptionniste" => Ok(Role::Receptionist),
        "concierge" => Ok(Role::Concierge),
        other => bail!("unknown role: {other}"),
    }
}

pub fn parse_contract(s: &str) -> anyhow::Result<ContractType> {
    match s.to_ascii_lowercase().as_str() {
        "full_time" | "temps_plein" => Ok(ContractType::FullTime),
        "part_time_4" | "mi_temps_4j" => Ok(ContractType::PartTime4),
        "part_time_3" | "mi_temps_3j" => Ok(ContractType::PartTime3),
        other => bail!("unknown contract: {other}"),
    }
}

pub fn parse_period(s: &str) -> anyhow::Result<Period> {
    match s.to_ascii_lowercase().as_str() {
        "morning" | "matin" => Ok(Period::Morning),
        "afternoon" | "apres-midi" | "après-midi" => Ok(Period::Afternoon),
        "night" | "nuit" => Ok(Period::Night),
        other => bail!("unknown period: {other}"),
    }
}

/// Jour: indice 0..6 ou nom anglais (`Mon`, `monday`, ...).
pub fn parse_day(s: &str) -> anyhow::Result<u8> {
    if let Ok(day) = s.parse::<u8>() {
        if day >= DAYS {
            bail!("day index out of range: {day}");
        }
        return Ok(day);
    }
    let weekday: chrono::Weekday = s
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid day: {s}"))?;
    u8::try_from(weekday.num_days_from_monday()).context("weekday index")
}
