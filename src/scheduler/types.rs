use crate::model::{Assignment, EmployeeId, ShiftSlot};
use crate::rules::RulesError;
use crate::stats::WeeklyStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Budget et pondérations du solveur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub max_nodes: u64,
    #[serde(with = "millis")]
    pub time_limit: Duration,
    pub balance_weight: u32,
    pub cost_weight: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_nodes: 500_000,
            time_limit: Duration::from_secs(10),
            balance_weight: 10,
            cost_weight: 1,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    RestDaysUnmet,
    ConsecutiveDaysExceeded,
    ContractCapExceeded,
    SlotCapacityExceeded,
    SlotMinimumUnmet,
    NightReceptionistCountWrong,
    RoleIneligible,
    ConciergeRuleViolated,
    MultiplePeriodsPerDay,
    EmployeeUnavailable,
    UnknownEmployee,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::RestDaysUnmet => "rest_days_unmet",
            ViolationKind::ConsecutiveDaysExceeded => "consecutive_days_exceeded",
            ViolationKind::ContractCapExceeded => "contract_cap_exceeded",
            ViolationKind::SlotCapacityExceeded => "slot_capacity_exceeded",
            ViolationKind::SlotMinimumUnmet => "slot_minimum_unmet",
            ViolationKind::NightReceptionistCountWrong => "night_receptionist_count_wrong",
            ViolationKind::RoleIneligible => "role_ineligible",
            ViolationKind::ConciergeRuleViolated => "concierge_rule_violated",
            ViolationKind::MultiplePeriodsPerDay => "multiple_periods_per_day",
            ViolationKind::EmployeeUnavailable => "employee_unavailable",
            ViolationKind::UnknownEmployee => "unknown_employee",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Écart constaté par le contrôle de conformité. Jamais modifié après création.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub kind: ViolationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<ShiftSlot>,
    /// Plage de jours concernée (bornes incluses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<(u8, u8)>,
    pub observed: u32,
    pub required: u32,
    pub detail: String,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.detail)
    }
}

/// Constat d'un diagnostic d'infaisabilité.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: ViolationKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticOrigin {
    /// Pré-contrôle structurel, avant toute résolution.
    RosterShape,
    /// Infaisabilité certifiée par le solveur.
    Solver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub origin: DiagnosticOrigin,
    pub findings: Vec<Finding>,
}

impl Diagnostic {
    pub fn cites(&self, kind: ViolationKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match self.origin {
            DiagnosticOrigin::RosterShape => "roster shape",
            DiagnosticOrigin::Solver => "solver",
        };
        write!(f, "infeasible ({origin})")?;
        for finding in &self.findings {
            write!(f, "; {}: {}", finding.kind, finding.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    NodeLimit,
    TimeLimit,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Optimalité certifiée (arbre épuisé ou borne de relaxation atteinte).
    Optimal,
    /// Meilleure solution trouvée avant arrêt.
    Feasible(StopReason),
}

/// Métadonnées de résolution, informatives uniquement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub objective: Option<u64>,
    pub lower_bound: Option<f64>,
    pub nodes: u64,
    pub elapsed_ms: u64,
}

/// Résultat d'une demande de planification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanOutcome {
    Success {
        assignment: Assignment,
        statistics: WeeklyStatistics,
        report: SolveReport,
    },
    PartialSuccess {
        assignment: Assignment,
        statistics: WeeklyStatistics,
        violations: Vec<ConstraintViolation>,
        non_optimal: bool,
        stop: Option<StopReason>,
        report: SolveReport,
    },
    Infeasible(Diagnostic),
}

impl PlanOutcome {
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            PlanOutcome::Success { assignment, .. }
            | PlanOutcome::PartialSuccess { assignment, .. } => Some(assignment),
            PlanOutcome::Infeasible(_) => None,
        }
    }

    pub fn statistics(&self) -> Option<&WeeklyStatistics> {
        match self {
            PlanOutcome::Success { statistics, .. }
            | PlanOutcome::PartialSuccess { statistics, .. } => Some(statistics),
            PlanOutcome::Infeasible(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            PlanOutcome::Infeasible(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        match self {
            PlanOutcome::Success { .. } => true,
            PlanOutcome::PartialSuccess { non_optimal, .. } => !non_optimal,
            PlanOutcome::Infeasible(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid forecast: {0}")]
    InvalidForecast(String),
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
    #[error(transparent)]
    InvalidRules(#[from] RulesError),
    #[error("solver budget exhausted after {nodes} nodes without a feasible assignment")]
    SolverTimeout { nodes: u64, stop: StopReason },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
