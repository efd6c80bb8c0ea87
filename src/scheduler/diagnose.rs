//! Diagnostic d'infaisabilité : quelles familles de contraintes, une fois
//! relâchées, rendent le problème faisable ?

use super::budget::Budget;
use super::builder::{ConstraintClass, Model};
use super::relaxation::{solve_relaxation, Relaxation};
use super::search;
use super::types::{Diagnostic, DiagnosticOrigin, Finding, ViolationKind};
use crate::model::Role;

pub(crate) fn diagnose(model: &Model, budget: &Budget) -> Diagnostic {
    let present: Vec<ConstraintClass> = ConstraintClass::ALL
        .into_iter()
        .filter(|c| model.has_class(*c))
        .collect();

    let mut findings = Vec::new();
    for class in &present {
        let relaxed = model.relaxed(*class);
        if solve_relaxation(&relaxed) == Relaxation::Infeasible {
            continue;
        }
        let probe = budget.fraction(4 * present.len() as u64);
        let result = search::solve(&relaxed, &probe, None, true);
        if result.values.is_some() {
            findings.push(Finding {
                kind: class.violation_kind(),
                detail: format!(
                    "relaxing {} restores feasibility; {}",
                    class.label(),
                    pressure(model, *class)
                ),
            });
        }
    }

    if findings.is_empty() {
        findings.push(Finding {
            kind: ViolationKind::SlotMinimumUnmet,
            detail: format!(
                "no single constraint family restores feasibility ({} families checked)",
                present.len()
            ),
        });
    }

    tracing::info!(event = "diagnosed", findings = findings.len());
    Diagnostic {
        origin: DiagnosticOrigin::Solver,
        findings,
    }
}

/// Offre et besoin agrégés de la famille, pour rendre le constat actionnable.
fn pressure(model: &Model, class: ConstraintClass) -> String {
    let constraints: Vec<_> = model.constraints.iter().filter(|c| c.class == class).collect();
    match class {
        ConstraintClass::NightReceptionists => {
            let staff: Vec<usize> = (0..model.employees.len())
                .filter(|e| {
                    model.employees[*e].role == Role::Receptionist
                        && model.by_employee[*e]
                            .iter()
                            .any(|v| model.vars[*v].slot.period == crate::model::Period::Night)
                })
                .collect();
            let supply: u32 = staff.iter().map(|e| model.day_caps[*e]).sum();
            let need: u32 = constraints.iter().map(|c| c.rhs).sum();
            format!(
                "night receptionist minimum unmet: {} night-eligible receptionist(s) can cover {supply} of {need} night shifts after rest-day constraints",
                staff.len()
            )
        }
        _ => {
            let need: u32 = constraints.iter().map(|c| c.lower()).sum();
            if need > 0 {
                format!("{} constraint(s) demanding {need} assignment(s)", constraints.len())
            } else {
                format!("{} constraint(s)", constraints.len())
            }
        }
    }
}
