use super::types::{ConstraintViolation, ViolationKind};
use super::util;
use crate::demand::DemandPlan;
use crate::model::{Assignment, Employee, EmployeeId, Period, Role, ShiftSlot, DAYS};
use crate::rules::RuleSet;
use std::collections::{BTreeMap, HashMap};

fn violation(kind: ViolationKind, observed: u32, required: u32, detail: String) -> ConstraintViolation {
    ConstraintViolation {
        kind,
        employee: None,
        slot: None,
        days: None,
        observed,
        required,
        detail,
    }
}

/// Contrôle complet d'un planning, indépendant de toute métadonnée du solveur.
///
/// Ordre : contrôles par créneau (ordre chronologique), puis par employé
/// (ordre de l'équipe), puis affectations à des inconnus.
pub fn validate(
    roster: &[Employee],
    demand: &DemandPlan,
    rules: &RuleSet,
    assignment: &Assignment,
) -> Vec<ConstraintViolation> {
    let by_id: HashMap<&EmployeeId, &Employee> = roster.iter().map(|e| (&e.id, e)).collect();
    let mut out = Vec::new();

    for slot in ShiftSlot::all() {
        check_slot(slot, &by_id, demand, rules, assignment, &mut out);
    }
    for employee in roster {
        check_employee(employee, rules, assignment, &mut out);
    }
    for entry in assignment.iter() {
        if !by_id.contains_key(&entry.employee) {
            out.push(ConstraintViolation {
                employee: Some(entry.employee.clone()),
                slot: Some(entry.slot),
                ..violation(
                    ViolationKind::UnknownEmployee,
                    0,
                    0,
                    format!("{} assigned to {} is not in the roster", entry.employee, entry.slot),
                )
            });
        }
    }
    out
}

fn check_slot(
    slot: ShiftSlot,
    by_id: &HashMap<&EmployeeId, &Employee>,
    demand: &DemandPlan,
    rules: &RuleSet,
    assignment: &Assignment,
    out: &mut Vec<ConstraintViolation>,
) {
    let req = demand.get(slot);
    let staff: Vec<&Employee> = assignment
        .staff_in(slot)
        .filter_map(|id| by_id.get(id).copied())
        .collect();
    let count = |role: Role| staff.iter().filter(|e| e.role == role).count() as u32;
    let at_slot = |v: ConstraintViolation| ConstraintViolation {
        slot: Some(slot),
        ..v
    };

    let headcount = staff.len() as u32;
    if headcount > rules.slot_capacity {
        out.push(at_slot(violation(
            ViolationKind::SlotCapacityExceeded,
            headcount,
            rules.slot_capacity,
            format!("{slot}: {headcount} people assigned, capacity {}", rules.slot_capacity),
        )));
    }

    match slot.period {
        Period::Night => {
            let n = count(Role::Receptionist);
            if n != req.receptionist_min {
                out.push(at_slot(violation(
                    ViolationKind::NightReceptionistCountWrong,
                    n,
                    req.receptionist_min,
                    format!(
                        "{slot}: {n} receptionist(s) on duty, exactly {} required",
                        req.receptionist_min
                    ),
                )));
            }
        }
        Period::Morning | Period::Afternoon => {
            let desk = count(Role::Supervisor) + count(Role::Receptionist);
            if desk < req.receptionist_min {
                out.push(at_slot(violation(
                    ViolationKind::SlotMinimumUnmet,
                    desk,
                    req.receptionist_min,
                    format!("{slot}: {desk} desk staff, at least {} required", req.receptionist_min),
                )));
            }
            let sup = count(Role::Supervisor);
            if sup < req.supervisor_min {
                out.push(at_slot(violation(
                    ViolationKind::SlotMinimumUnmet,
                    sup,
                    req.supervisor_min,
                    format!("{slot}: {sup} supervisor(s), at least {} required", req.supervisor_min),
                )));
            }
        }
    }

    let concierges = count(Role::Concierge);
    let wanted = u32::from(req.concierge_required);
    if concierges != wanted {
        let detail = if wanted == 1 {
            format!("{slot}: concierge required, {concierges} assigned")
        } else {
            format!("{slot}: no concierge expected, {concierges} assigned")
        };
        out.push(at_slot(violation(
            ViolationKind::ConciergeRuleViolated,
            concierges,
            wanted,
            detail,
        )));
    }
}

fn check_employee(
    employee: &Employee,
    rules: &RuleSet,
    assignment: &Assignment,
    out: &mut Vec<ConstraintViolation>,
) {
    let id = &employee.id;
    let mine = |v: ConstraintViolation| ConstraintViolation {
        employee: Some(id.clone()),
        ..v
    };

    let mut per_day: BTreeMap<u8, u32> = BTreeMap::new();
    for slot in assignment.slots_of(id) {
        *per_day.entry(slot.day).or_default() += 1;
        if !employee.is_eligible(slot) {
            out.push(ConstraintViolation {
                slot: Some(slot),
                ..mine(violation(
                    ViolationKind::RoleIneligible,
                    1,
                    0,
                    format!("{id} ({}) is not eligible for {slot}", employee.role),
                ))
            });
        }
        if !employee.is_present(slot.day) {
            out.push(ConstraintViolation {
                slot: Some(slot),
                ..mine(violation(
                    ViolationKind::EmployeeUnavailable,
                    1,
                    0,
                    format!("{id} is unavailable on {}", slot.weekday()),
                ))
            });
        }
    }

    for (day, periods) in &per_day {
        if *periods > 1 {
            out.push(ConstraintViolation {
                days: Some((*day, *day)),
                ..mine(violation(
                    ViolationKind::MultiplePeriodsPerDay,
                    *periods,
                    1,
                    format!("{id} works {periods} periods on day {day}"),
                ))
            });
        }
    }

    let days = assignment.working_days(id);
    let worked = days.len() as u32;
    let rest = u32::from(DAYS).saturating_sub(worked);
    if rest < rules.min_rest_days {
        out.push(ConstraintViolation {
            days: Some((0, DAYS - 1)),
            ..mine(violation(
                ViolationKind::RestDaysUnmet,
                rest,
                rules.min_rest_days,
                format!("{id} has {rest} rest day(s), at least {} required", rules.min_rest_days),
            ))
        });
    }

    for (start, end) in util::working_runs(&days) {
        let len = u32::from(end - start) + 1;
        if len > rules.max_consecutive_days {
            out.push(ConstraintViolation {
                days: Some((start, end)),
                ..mine(violation(
                    ViolationKind::ConsecutiveDaysExceeded,
                    len,
                    rules.max_consecutive_days,
                    format!(
                        "{id} works {len} consecutive days (days {start}-{end}), at most {}",
                        rules.max_consecutive_days
                    ),
                ))
            });
        }
    }

    let cap = rules.contract_cap(employee);
    if worked > cap {
        let allowance = match employee.absences.len() {
            0 => format!("{} contract allows {cap}", employee.contract),
            n => format!("{} contract allows {cap} after {n} absence day(s)", employee.contract),
        };
        out.push(ConstraintViolation {
            days: Some((0, DAYS - 1)),
            ..mine(violation(
                ViolationKind::ContractCapExceeded,
                worked,
                cap,
                format!("{id} works {worked} day(s), {allowance}"),
            ))
        });
    }
}
