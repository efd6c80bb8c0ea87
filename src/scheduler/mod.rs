mod budget;
mod builder;
mod compliance;
mod diagnose;
mod relaxation;
mod search;
mod types;
mod util;

pub use budget::CancelToken;
pub use builder::{
    validate_roster, BalanceGroup, ConstraintClass, DecisionVar, LinearConstraint, Model,
    ModelBuilder, ModelError, ObjectiveWeights, Sense, VarId,
};
pub use compliance::validate as validate_assignment;
pub use types::{
    ConstraintViolation, Diagnostic, DiagnosticOrigin, Finding, PlanError, PlanOutcome,
    SolveReport, SolveStatus, SolverOptions, StopReason, ViolationKind,
};

use crate::demand::{estimate_demand, DemandPlan};
use crate::model::{Assignment, AssignmentEntry, Employee, OccupancyForecast};
use crate::rules::RuleSet;
use crate::stats::{analyze, WeeklyStatistics};
use budget::Budget;
use rayon::prelude::*;
use relaxation::{solve_relaxation, Relaxation};
use serde::{Deserialize, Serialize};

/// Demande hypothétique pour `Planner::plan_scenarios`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub roster: Vec<Employee>,
    pub forecast: OccupancyForecast,
    /// Règles propres au scénario ; à défaut celles du planificateur.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleSet>,
}

/// Planner : enchaîne demande → modèle → résolution → contrôle → statistiques.
///
/// Sans état mutable : chaque appel travaille sur ses propres valeurs.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    rules: RuleSet,
    options: SolverOptions,
}

impl Planner {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            options: SolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn demand(&self, forecast: &OccupancyForecast) -> Result<DemandPlan, PlanError> {
        estimate_demand(forecast, &self.rules)
    }

    pub fn plan(
        &self,
        roster: &[Employee],
        forecast: &OccupancyForecast,
    ) -> Result<PlanOutcome, PlanError> {
        self.plan_with_cancel(roster, forecast, &CancelToken::new())
    }

    /// Comme `plan`, interruptible via `cancel` : la meilleure solution
    /// trouvée avant l'annulation est rendue, marquée non optimale.
    pub fn plan_with_cancel(
        &self,
        roster: &[Employee],
        forecast: &OccupancyForecast,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome, PlanError> {
        tracing::info!(event = "plan_start", employees = roster.len());
        let demand = self.demand(forecast)?;

        let weights = ObjectiveWeights {
            balance: self.options.balance_weight,
            cost: self.options.cost_weight,
        };
        let model = match ModelBuilder::new(roster, &demand, &self.rules)
            .with_weights(weights)
            .build()
        {
            Ok(model) => model,
            Err(ModelError::InfeasibleRosterShape(diagnostic)) => {
                return Ok(PlanOutcome::Infeasible(diagnostic))
            }
            Err(ModelError::Plan(err)) => return Err(err),
        };

        let budget = Budget::new(&self.options, cancel.clone());
        let relaxation = solve_relaxation(&model);
        match &relaxation {
            Relaxation::Infeasible => {
                tracing::info!(event = "solve_end", status = "infeasible", certified_by = "relaxation");
                return Ok(PlanOutcome::Infeasible(diagnose::diagnose(&model, &budget)));
            }
            Relaxation::Unavailable(reason) => {
                tracing::warn!(event = "relaxation_unavailable", %reason);
            }
            Relaxation::Bound(bound) => {
                tracing::debug!(event = "relaxation_bound", bound = *bound);
            }
        }

        let result = search::solve(&model, &budget, relaxation.floor(), false);
        let elapsed_ms = u64::try_from(budget.elapsed().as_millis()).unwrap_or(u64::MAX);
        let lower_bound = match relaxation {
            Relaxation::Bound(b) => Some(b),
            _ => None,
        };

        let Some(values) = result.values else {
            return match result.stop {
                Some(stop) => {
                    tracing::info!(event = "solve_end", status = "timeout", nodes = result.nodes, elapsed_ms);
                    Err(PlanError::SolverTimeout {
                        nodes: result.nodes,
                        stop,
                    })
                }
                None => {
                    tracing::info!(event = "solve_end", status = "infeasible", nodes = result.nodes, elapsed_ms);
                    Ok(PlanOutcome::Infeasible(diagnose::diagnose(&model, &budget)))
                }
            };
        };

        let status = match result.stop {
            Some(stop) if !result.proven => SolveStatus::Feasible(stop),
            _ => SolveStatus::Optimal,
        };
        tracing::info!(
            event = "solve_end",
            status = ?status,
            objective = ?result.objective,
            nodes = result.nodes,
            elapsed_ms,
        );

        let assignment = to_assignment(&model, &values);
        let violations = compliance::validate(roster, &demand, &self.rules, &assignment);
        let statistics = analyze(roster, &demand, &self.rules, &assignment);
        let report = SolveReport {
            status,
            objective: result.objective,
            lower_bound,
            nodes: result.nodes,
            elapsed_ms,
        };

        if result.proven && violations.is_empty() {
            return Ok(PlanOutcome::Success {
                assignment,
                statistics,
                report,
            });
        }
        if !violations.is_empty() {
            tracing::warn!(event = "plan_violations", count = violations.len());
        }
        Ok(PlanOutcome::PartialSuccess {
            assignment,
            statistics,
            violations,
            non_optimal: !result.proven,
            stop: result.stop,
            report,
        })
    }

    /// Contrôle de conformité d'un planning quelconque (importé ou produit).
    pub fn validate(
        &self,
        roster: &[Employee],
        forecast: &OccupancyForecast,
        assignment: &Assignment,
    ) -> Result<Vec<ConstraintViolation>, PlanError> {
        let demand = self.demand(forecast)?;
        Ok(compliance::validate(roster, &demand, &self.rules, assignment))
    }

    pub fn statistics(
        &self,
        roster: &[Employee],
        forecast: &OccupancyForecast,
        assignment: &Assignment,
    ) -> Result<WeeklyStatistics, PlanError> {
        let demand = self.demand(forecast)?;
        Ok(analyze(roster, &demand, &self.rules, assignment))
    }

    /// Résout des scénarios indépendants en parallèle, résultats dans l'ordre
    /// d'entrée.
    pub fn plan_scenarios(&self, scenarios: &[Scenario]) -> Vec<Result<PlanOutcome, PlanError>> {
        scenarios
            .par_iter()
            .map(|scenario| {
                tracing::debug!(event = "scenario_start", name = %scenario.name);
                match &scenario.rules {
                    Some(rules) => Planner::new(rules.clone())
                        .with_options(self.options)
                        .plan(&scenario.roster, &scenario.forecast),
                    None => self.plan(&scenario.roster, &scenario.forecast),
                }
            })
            .collect()
    }
}

fn to_assignment(model: &Model, values: &[bool]) -> Assignment {
    model
        .vars
        .iter()
        .zip(values)
        .filter(|(_, on)| **on)
        .map(|(var, _)| AssignmentEntry::new(model.employees[var.employee].id.clone(), var.slot))
        .collect()
}
