//! Construction du modèle 0/1 : une variable par couple (employé, créneau)
//! admissible, des contraintes linéaires de cardinalité, un objectif linéaire.

use super::types::{Diagnostic, DiagnosticOrigin, Finding, PlanError, ViolationKind};
use super::util;
use crate::demand::DemandPlan;
use crate::model::{ContractType, Employee, Period, Role, ShiftSlot, DAYS};
use crate::rules::RuleSet;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

pub type VarId = usize;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{0}")]
    InfeasibleRosterShape(Diagnostic),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Famille de contraintes, unité de relâchement du diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintClass {
    SlotCapacity,
    SlotMinimum,
    NightReceptionists,
    Concierge,
    RestDays,
    ConsecutiveDays,
    ContractCap,
    OnePeriodPerDay,
}

impl ConstraintClass {
    pub const ALL: [ConstraintClass; 8] = [
        ConstraintClass::SlotCapacity,
        ConstraintClass::SlotMinimum,
        ConstraintClass::NightReceptionists,
        ConstraintClass::Concierge,
        ConstraintClass::RestDays,
        ConstraintClass::ConsecutiveDays,
        ConstraintClass::ContractCap,
        ConstraintClass::OnePeriodPerDay,
    ];

    pub fn violation_kind(self) -> ViolationKind {
        match self {
            ConstraintClass::SlotCapacity => ViolationKind::SlotCapacityExceeded,
            ConstraintClass::SlotMinimum => ViolationKind::SlotMinimumUnmet,
            ConstraintClass::NightReceptionists => ViolationKind::NightReceptionistCountWrong,
            ConstraintClass::Concierge => ViolationKind::ConciergeRuleViolated,
            ConstraintClass::RestDays => ViolationKind::RestDaysUnmet,
            ConstraintClass::ConsecutiveDays => ViolationKind::ConsecutiveDaysExceeded,
            ConstraintClass::ContractCap => ViolationKind::ContractCapExceeded,
            ConstraintClass::OnePeriodPerDay => ViolationKind::MultiplePeriodsPerDay,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConstraintClass::SlotCapacity => "slot capacity",
            ConstraintClass::SlotMinimum => "slot minimum",
            ConstraintClass::NightReceptionists => "night receptionist count",
            ConstraintClass::Concierge => "concierge presence",
            ConstraintClass::RestDays => "weekly rest days",
            ConstraintClass::ConsecutiveDays => "consecutive working days",
            ConstraintClass::ContractCap => "contract working days",
            ConstraintClass::OnePeriodPerDay => "one period per day",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    AtMost,
    AtLeast,
    Exactly,
}

/// `Σ vars (sense) rhs`, coefficients unitaires.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub class: ConstraintClass,
    pub vars: Vec<VarId>,
    pub sense: Sense,
    pub rhs: u32,
    pub slot: Option<ShiftSlot>,
    pub employee: Option<usize>,
}

impl LinearConstraint {
    pub fn upper(&self) -> Option<u32> {
        match self.sense {
            Sense::AtMost | Sense::Exactly => Some(self.rhs),
            Sense::AtLeast => None,
        }
    }

    pub fn lower(&self) -> u32 {
        match self.sense {
            Sense::AtLeast | Sense::Exactly => self.rhs,
            Sense::AtMost => 0,
        }
    }

    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        let n = self.vars.iter().filter(|v| values[**v]).count() as u32;
        n >= self.lower() && self.upper().map_or(true, |u| n <= u)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionVar {
    pub employee: usize,
    pub slot: ShiftSlot,
}

/// Classe rôle + contrat (+ périodes déclarées) sur laquelle porte l'équité.
#[derive(Debug, Clone)]
pub struct BalanceGroup {
    pub role: Role,
    pub contract: ContractType,
    pub periods: BTreeSet<Period>,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveWeights {
    pub balance: u32,
    pub cost: u32,
}

/// Problème d'affectation prêt à résoudre.
#[derive(Debug, Clone)]
pub struct Model {
    pub employees: Vec<Employee>,
    pub vars: Vec<DecisionVar>,
    pub by_employee: Vec<Vec<VarId>>,
    pub constraints: Vec<LinearConstraint>,
    pub groups: Vec<BalanceGroup>,
    pub weights: ObjectiveWeights,
    /// Plafond de jours travaillés par employé (contrat, repos, absences).
    pub day_caps: Vec<u32>,
    /// Somme des minimums durs : le coût au-delà est l'excédent.
    pub baseline: u32,
}

impl Model {
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn has_class(&self, class: ConstraintClass) -> bool {
        self.constraints.iter().any(|c| c.class == class)
    }

    /// Copie du modèle sans une famille de contraintes.
    pub fn relaxed(&self, class: ConstraintClass) -> Model {
        let mut model = self.clone();
        model.constraints.retain(|c| c.class != class);
        model
    }

    /// Nombre de périodes affectées par employé.
    pub fn counts(&self, values: &[bool]) -> Vec<u32> {
        self.by_employee
            .iter()
            .map(|vars| vars.iter().filter(|v| values[**v]).count() as u32)
            .collect()
    }

    /// Écart à la moyenne du groupe, multiplié par la taille du groupe.
    pub fn balance_penalty(&self, counts: &[u32]) -> u64 {
        self.groups
            .iter()
            .map(|g| group_penalty(g, counts))
            .sum()
    }

    pub fn objective_value(&self, values: &[bool]) -> u64 {
        let counts = self.counts(values);
        let total: u64 = counts.iter().map(|c| u64::from(*c)).sum();
        u64::from(self.weights.cost) * total
            + u64::from(self.weights.balance) * self.balance_penalty(&counts)
    }
}

pub(crate) fn group_penalty(group: &BalanceGroup, counts: &[u32]) -> u64 {
    let n = group.members.len() as i64;
    let total: i64 = group.members.iter().map(|m| i64::from(counts[*m])).sum();
    group
        .members
        .iter()
        .map(|m| (n * i64::from(counts[*m]) - total).unsigned_abs())
        .sum()
}

/// Traduit équipe, demande et règles en modèle.
pub struct ModelBuilder<'a> {
    roster: &'a [Employee],
    demand: &'a DemandPlan,
    rules: &'a RuleSet,
    weights: ObjectiveWeights,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(roster: &'a [Employee], demand: &'a DemandPlan, rules: &'a RuleSet) -> Self {
        Self {
            roster,
            demand,
            rules,
            weights: ObjectiveWeights { balance: 10, cost: 1 },
        }
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// L'employé peut-il recevoir une variable pour ce créneau ?
    fn admissible(&self, employee: &Employee, slot: ShiftSlot) -> bool {
        if !employee.can_work(slot) {
            return false;
        }
        employee.role != Role::Concierge || self.demand.get(slot).concierge_required
    }

    pub fn build(&self) -> Result<Model, ModelError> {
        validate_roster(self.roster)?;
        self.precheck()?;

        let mut vars = Vec::new();
        let mut by_employee = vec![Vec::new(); self.roster.len()];
        let mut by_slot: Vec<Vec<VarId>> = vec![Vec::new(); ShiftSlot::COUNT];
        for (e, employee) in self.roster.iter().enumerate() {
            for slot in ShiftSlot::all() {
                if self.admissible(employee, slot) {
                    let id = vars.len();
                    vars.push(DecisionVar { employee: e, slot });
                    by_employee[e].push(id);
                    by_slot[slot.index()].push(id);
                }
            }
        }

        let role_of = |v: &VarId| self.roster[vars[*v].employee].role;
        let mut constraints = Vec::new();

        for slot in ShiftSlot::all() {
            let req = self.demand.get(slot);
            let slot_vars = &by_slot[slot.index()];
            let pick = |pred: &dyn Fn(Role) -> bool| -> Vec<VarId> {
                slot_vars.iter().copied().filter(|v| pred(role_of(v))).collect()
            };

            if slot_vars.len() as u32 > self.rules.slot_capacity {
                constraints.push(LinearConstraint {
                    class: ConstraintClass::SlotCapacity,
                    vars: slot_vars.clone(),
                    sense: Sense::AtMost,
                    rhs: self.rules.slot_capacity,
                    slot: Some(slot),
                    employee: None,
                });
            }

            match slot.period {
                Period::Night => {
                    constraints.push(LinearConstraint {
                        class: ConstraintClass::NightReceptionists,
                        vars: pick(&|r| r == Role::Receptionist),
                        sense: Sense::Exactly,
                        rhs: req.receptionist_min,
                        slot: Some(slot),
                        employee: None,
                    });
                }
                Period::Morning | Period::Afternoon => {
                    if req.receptionist_min > 0 {
                        constraints.push(LinearConstraint {
                            class: ConstraintClass::SlotMinimum,
                            vars: pick(&Role::staffs_desk),
                            sense: Sense::AtLeast,
                            rhs: req.receptionist_min,
                            slot: Some(slot),
                            employee: None,
                        });
                    }
                    if req.supervisor_min > 0 {
                        constraints.push(LinearConstraint {
                            class: ConstraintClass::SlotMinimum,
                            vars: pick(&|r| r == Role::Supervisor),
                            sense: Sense::AtLeast,
                            rhs: req.supervisor_min,
                            slot: Some(slot),
                            employee: None,
                        });
                    }
                }
            }

            if req.concierge_required {
                constraints.push(LinearConstraint {
                    class: ConstraintClass::Concierge,
                    vars: pick(&|r| r == Role::Concierge),
                    sense: Sense::Exactly,
                    rhs: 1,
                    slot: Some(slot),
                    employee: None,
                });
            }
        }

        for (e, employee) in self.roster.iter().enumerate() {
            let own = &by_employee[e];
            if own.is_empty() {
                continue;
            }
            let on_days = |days: std::ops::Range<u8>| -> Vec<VarId> {
                own.iter()
                    .copied()
                    .filter(|v| days.contains(&vars[*v].slot.day))
                    .collect()
            };
            let mut push = |class, vars: Vec<VarId>, rhs: u32| {
                if vars.len() as u32 > rhs {
                    constraints.push(LinearConstraint {
                        class,
                        vars,
                        sense: Sense::AtMost,
                        rhs,
                        slot: None,
                        employee: Some(e),
                    });
                }
            };

            for day in 0..DAYS {
                push(ConstraintClass::OnePeriodPerDay, on_days(day..day + 1), 1);
            }
            for window in util::day_windows(7) {
                push(
                    ConstraintClass::RestDays,
                    on_days(window),
                    7u32.saturating_sub(self.rules.min_rest_days),
                );
            }
            let cap = self.rules.max_consecutive_days;
            if let Some(span) = cap.checked_add(1).and_then(|s| u8::try_from(s).ok()) {
                for window in util::day_windows(span) {
                    push(ConstraintClass::ConsecutiveDays, on_days(window), cap);
                }
            }
            push(
                ConstraintClass::ContractCap,
                on_days(0..DAYS),
                self.rules.contract_cap(employee),
            );
        }

        // veilleurs et équipe de jour ne sont pas comparés entre eux
        let mut classes: BTreeMap<(Role, ContractType, BTreeSet<Period>), Vec<usize>> =
            BTreeMap::new();
        for (e, employee) in self.roster.iter().enumerate() {
            if !by_employee[e].is_empty() {
                classes
                    .entry((employee.role, employee.contract, employee.periods.clone()))
                    .or_default()
                    .push(e);
            }
        }
        let groups = classes
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|((role, contract, periods), members)| BalanceGroup {
                role,
                contract,
                periods,
                members,
            })
            .collect();

        tracing::debug!(
            event = "model_built",
            employees = self.roster.len(),
            variables = vars.len(),
            constraints = constraints.len(),
        );

        Ok(Model {
            employees: self.roster.to_vec(),
            vars,
            by_employee,
            constraints,
            groups,
            weights: self.weights,
            day_caps: self
                .roster
                .iter()
                .map(|e| self.rules.weekly_day_cap(e).min(e.present_days()))
                .collect(),
            baseline: self.demand.total_minimum(),
        })
    }

    /// Contrôle rapide : l'équipe peut-elle structurellement couvrir les minimums ?
    fn precheck(&self) -> Result<(), ModelError> {
        let mut findings = Vec::new();
        let rules = self.rules;

        for slot in ShiftSlot::all() {
            let req = self.demand.get(slot);
            let candidates = |pred: &dyn Fn(&Employee) -> bool| -> u32 {
                self.roster
                    .iter()
                    .filter(|e| self.admissible(e, slot) && pred(*e))
                    .count() as u32
            };

            match slot.period {
                Period::Night => {
                    let n = candidates(&|e| e.role == Role::Receptionist);
                    if n < req.receptionist_min {
                        findings.push(Finding {
                            kind: ViolationKind::NightReceptionistCountWrong,
                            detail: format!(
                                "{slot}: only {n} night-eligible receptionist(s) available, {} required",
                                req.receptionist_min
                            ),
                        });
                    }
                }
                Period::Morning | Period::Afternoon => {
                    let desk = candidates(&|e| e.role.staffs_desk());
                    if desk < req.receptionist_min {
                        findings.push(Finding {
                            kind: ViolationKind::SlotMinimumUnmet,
                            detail: format!(
                                "{slot}: only {desk} desk-eligible employee(s), {} required",
                                req.receptionist_min
                            ),
                        });
                    }
                    let sup = candidates(&|e| e.role == Role::Supervisor);
                    if sup < req.supervisor_min {
                        findings.push(Finding {
                            kind: ViolationKind::SlotMinimumUnmet,
                            detail: format!(
                                "{slot}: only {sup} supervisor(s) available, {} required",
                                req.supervisor_min
                            ),
                        });
                    }
                }
            }

            if req.concierge_required && candidates(&|e| e.role == Role::Concierge) == 0 {
                findings.push(Finding {
                    kind: ViolationKind::ConciergeRuleViolated,
                    detail: format!("{slot}: concierge required but none available"),
                });
            }

            let floor = req.receptionist_min.max(req.supervisor_min) + u32::from(req.concierge_required);
            if floor > rules.slot_capacity {
                findings.push(Finding {
                    kind: ViolationKind::SlotCapacityExceeded,
                    detail: format!(
                        "{slot}: minimum headcount {floor} exceeds capacity {}",
                        rules.slot_capacity
                    ),
                });
            }
        }

        // offre hebdomadaire (après repos) face au besoin hebdomadaire
        let supply = |pred: &dyn Fn(&Employee) -> bool, period: Option<Period>| -> u32 {
            self.roster
                .iter()
                .filter(|e| pred(*e))
                .map(|e| {
                    let open_days = (0..DAYS)
                        .filter(|d| {
                            Period::ALL
                                .into_iter()
                                .filter(|p| period.map_or(*p != Period::Night, |x| x == *p))
                                .any(|p| self.admissible(e, ShiftSlot::new(*d, p)))
                        })
                        .count() as u32;
                    rules.weekly_day_cap(e).min(open_days)
                })
                .sum()
        };
        let need = |period: Option<Period>, f: &dyn Fn(&crate::demand::DemandRequirement) -> u32| -> u32 {
            self.demand
                .iter()
                .filter(|r| period.map_or(r.slot.period != Period::Night, |p| r.slot.period == p))
                .map(f)
                .sum()
        };

        let night_supply = supply(&|e| e.role == Role::Receptionist, Some(Period::Night));
        let night_need = need(Some(Period::Night), &|r| r.receptionist_min);
        if night_supply < night_need {
            findings.push(Finding {
                kind: ViolationKind::NightReceptionistCountWrong,
                detail: format!(
                    "night receptionists can cover {night_supply} of {night_need} night shifts after rest-day constraints"
                ),
            });
        }
        let sup_supply = supply(&|e| e.role == Role::Supervisor, None);
        let sup_need = need(None, &|r| r.supervisor_min);
        if sup_supply < sup_need {
            findings.push(Finding {
                kind: ViolationKind::SlotMinimumUnmet,
                detail: format!(
                    "supervisors can cover {sup_supply} of {sup_need} supervised shifts after rest-day constraints"
                ),
            });
        }
        let desk_supply = supply(&|e| e.role.staffs_desk(), None);
        let desk_need = need(None, &|r| r.receptionist_min.max(r.supervisor_min));
        if desk_supply < desk_need {
            findings.push(Finding {
                kind: ViolationKind::SlotMinimumUnmet,
                detail: format!(
                    "desk staff can cover {desk_supply} of {desk_need} day-desk positions after rest-day constraints"
                ),
            });
        }

        if findings.is_empty() {
            return Ok(());
        }
        tracing::info!(event = "roster_shape_infeasible", findings = findings.len());
        Err(ModelError::InfeasibleRosterShape(Diagnostic {
            origin: DiagnosticOrigin::RosterShape,
            findings,
        }))
    }
}

/// Identifiants uniques dans l'équipe.
pub fn validate_roster(roster: &[Employee]) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    for employee in roster {
        if !seen.insert(employee.id.as_str()) {
            return Err(PlanError::InvalidRoster(format!(
                "duplicate employee id: {}",
                employee.id
            )));
        }
        if employee.absences.iter().any(|d| *d >= DAYS) {
            return Err(PlanError::InvalidRoster(format!(
                "absence day out of range for {}",
                employee.id
            )));
        }
    }
    Ok(())
}
