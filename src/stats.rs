//! Indicateurs agrégés d'un planning : heures, couverture, équité, langues.
//!
//! Agrégation pure ; rien ici ne rétroagit sur la planification.

use crate::demand::DemandPlan;
use crate::model::{Assignment, ContractType, Employee, EmployeeId, Period, Role, ShiftSlot};
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Charge d'un employé sur la semaine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeLoad {
    pub employee: EmployeeId,
    pub display_name: String,
    pub role: Role,
    pub contract: ContractType,
    pub shifts: u32,
    pub hours: u32,
    pub days_worked: u32,
    /// Jours dus, absences déduites.
    pub contract_days: u32,
}

/// Couverture d'un créneau : effectif compté face au besoin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCoverage {
    pub slot: ShiftSlot,
    /// Comptoir le jour, réceptionnistes la nuit.
    pub actual: u32,
    pub required: u32,
    /// Effectif demandé par le seul ratio clients/réceptionniste.
    pub ratio_headcount: u32,
    pub supervisors: u32,
    pub receptionists: u32,
    pub concierges: u32,
}

impl SlotCoverage {
    pub fn meets_ratio(&self) -> bool {
        self.actual >= self.ratio_headcount
    }

    /// Rapport effectif / besoin (1.0 si aucun besoin).
    pub fn fill_ratio(&self) -> f64 {
        if self.required == 0 {
            1.0
        } else {
            f64::from(self.actual) / f64::from(self.required)
        }
    }
}

/// Dispersion des charges dans une classe rôle + contrat + périodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBalance {
    pub role: Role,
    pub contract: ContractType,
    pub periods: BTreeSet<Period>,
    pub members: u32,
    pub min_shifts: u32,
    pub max_shifts: u32,
}

impl RoleBalance {
    pub fn spread(&self) -> u32 {
        self.max_shifts - self.min_shifts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStatistics {
    pub employees: Vec<EmployeeLoad>,
    pub slots: Vec<SlotCoverage>,
    /// Pourcentage (0..=100) des créneaux respectant le ratio.
    pub ratio_compliance: f64,
    pub balance: Vec<RoleBalance>,
    pub total_shifts: u32,
    pub total_hours: u32,
    pub active_employees: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_language: Option<String>,
}

impl WeeklyStatistics {
    pub fn load_of(&self, id: &EmployeeId) -> Option<&EmployeeLoad> {
        self.employees.iter().find(|l| &l.employee == id)
    }

    pub fn coverage(&self, slot: ShiftSlot) -> Option<&SlotCoverage> {
        self.slots.iter().find(|c| c.slot == slot)
    }
}

/// Calcule les statistiques d'un planning. Les affectations à des employés
/// hors équipe ne sont pas comptées.
pub fn analyze(
    roster: &[Employee],
    demand: &DemandPlan,
    rules: &RuleSet,
    assignment: &Assignment,
) -> WeeklyStatistics {
    let by_id: HashMap<&EmployeeId, &Employee> = roster.iter().map(|e| (&e.id, e)).collect();

    let employees: Vec<EmployeeLoad> = roster
        .iter()
        .map(|e| {
            let shifts = assignment.slots_of(&e.id).count() as u32;
            EmployeeLoad {
                employee: e.id.clone(),
                display_name: e.display_name.clone(),
                role: e.role,
                contract: e.contract,
                shifts,
                hours: shifts.saturating_mul(rules.hours_per_period),
                days_worked: assignment.working_days(&e.id).len() as u32,
                contract_days: rules.contract_cap(e),
            }
        })
        .collect();

    let slots: Vec<SlotCoverage> = demand
        .iter()
        .map(|req| {
            let mut coverage = SlotCoverage {
                slot: req.slot,
                actual: 0,
                required: req.receptionist_min,
                ratio_headcount: req.ratio_headcount,
                supervisors: 0,
                receptionists: 0,
                concierges: 0,
            };
            for employee in assignment.staff_in(req.slot).filter_map(|id| by_id.get(id)) {
                match employee.role {
                    Role::Supervisor => coverage.supervisors += 1,
                    Role::Receptionist => coverage.receptionists += 1,
                    Role::Concierge => coverage.concierges += 1,
                }
            }
            coverage.actual = match req.slot.period {
                Period::Night => coverage.receptionists,
                Period::Morning | Period::Afternoon => coverage.supervisors + coverage.receptionists,
            };
            coverage
        })
        .collect();

    let ratio_compliance = if slots.is_empty() {
        100.0
    } else {
        let met = slots.iter().filter(|c| c.meets_ratio()).count();
        met as f64 * 100.0 / slots.len() as f64
    };

    let mut classes: BTreeMap<(Role, ContractType, BTreeSet<Period>), Vec<u32>> = BTreeMap::new();
    for (employee, load) in roster.iter().zip(&employees) {
        classes
            .entry((employee.role, employee.contract, employee.periods.clone()))
            .or_default()
            .push(load.shifts);
    }
    let balance = classes
        .into_iter()
        .map(|((role, contract, periods), shifts)| RoleBalance {
            role,
            contract,
            periods,
            members: shifts.len() as u32,
            min_shifts: shifts.iter().copied().min().unwrap_or(0),
            max_shifts: shifts.iter().copied().max().unwrap_or(0),
        })
        .collect();

    let total_shifts: u32 = employees.iter().map(|l| l.shifts).sum();
    let active: Vec<&Employee> = roster
        .iter()
        .zip(&employees)
        .filter(|(_, load)| load.shifts > 0)
        .map(|(e, _)| e)
        .collect();

    WeeklyStatistics {
        total_hours: total_shifts.saturating_mul(rules.hours_per_period),
        total_shifts,
        active_employees: active.len() as u32,
        dominant_language: dominant_language(&active),
        employees,
        slots,
        ratio_compliance,
        balance,
    }
}

/// Langue parlée par le plus d'employés actifs ; à égalité, la première
/// dans l'ordre alphabétique.
fn dominant_language(active: &[&Employee]) -> Option<String> {
    let mut speakers: BTreeMap<&str, u32> = BTreeMap::new();
    for employee in active {
        for language in &employee.languages {
            *speakers.entry(language.as_str()).or_default() += 1;
        }
    }
    speakers
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(lang, _)| lang.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_language_prefers_alphabetical_on_tie() {
        let a = Employee::new("A", Role::Receptionist, ContractType::FullTime)
            .with_languages(["Italien", "Anglais"]);
        let b = Employee::new("B", Role::Receptionist, ContractType::FullTime)
            .with_languages(["Italien", "Anglais"]);
        assert_eq!(dominant_language(&[&a, &b]), Some("Anglais".to_string()));
        assert_eq!(dominant_language(&[]), None);
    }
}
