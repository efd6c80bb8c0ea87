#![forbid(unsafe_code)]
//! Frontdesk — planification hebdomadaire du front office hôtelier.
//!
//! - Demande par créneau dérivée des arrivées/départs prévus.
//! - Modèle 0/1 (capacité, minimums, repos, contrats) résolu sous budget.
//! - Contrôle de conformité indépendant du solveur, statistiques de couverture.
//! - Stockage fichiers (JSON/CSV) derrière la feature `io`.

pub mod demand;
#[cfg(feature = "io")]
pub mod io;
pub mod model;
pub mod presets;
pub mod rules;
pub mod scheduler;
pub mod stats;
#[cfg(feature = "io")]
pub mod storage;

pub use demand::{estimate_demand, DemandPlan, DemandRequirement};
pub use model::{
    reference_team, Assignment, AssignmentEntry, ContractType, DayForecast, Employee, EmployeeId,
    OccupancyForecast, Period, Role, ShiftSlot,
};
pub use presets::ForecastPreset;
#[cfg(feature = "io")]
pub use presets::PresetStore;
pub use rules::{RuleSet, RulesError};
pub use scheduler::{
    validate_assignment, CancelToken, ConstraintViolation, Diagnostic, DiagnosticOrigin,
    PlanError, PlanOutcome, Planner, Scenario, SolveStatus, SolverOptions, StopReason,
    ViolationKind,
};
pub use stats::{analyze, WeeklyStatistics};
#[cfg(feature = "io")]
pub use storage::{JsonStorage, PlanningRequest, Storage};
