//! Constantes de règles (légales et opérationnelles), toutes surchargeables.
//!
//! Les valeurs par défaut sont celles du déploiement de référence : 4 personnes
//! maximum par créneau, 1 réceptionniste pour 50 clients, exactement 2
//! réceptionnistes de nuit, 2 jours de repos par semaine, 5 jours consécutifs
//! au plus.

use crate::model::{ContractType, Employee, Period};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid rule set: {0}")]
pub struct RulesError(pub String);

/// Part (en %) des arrivées et départs imputée à une période.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadShare {
    pub check_ins: u32,
    pub check_outs: u32,
}

/// Répartition de l'activité du jour sur les périodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadDistribution {
    pub morning: LoadShare,
    pub afternoon: LoadShare,
    pub night: LoadShare,
}

impl Default for LoadDistribution {
    fn default() -> Self {
        Self {
            morning: LoadShare { check_ins: 0, check_outs: 100 },
            afternoon: LoadShare { check_ins: 100, check_outs: 0 },
            night: LoadShare { check_ins: 0, check_outs: 0 },
        }
    }
}

impl LoadDistribution {
    pub fn share(&self, period: Period) -> LoadShare {
        match period {
            Period::Morning => self.morning,
            Period::Afternoon => self.afternoon,
            Period::Night => self.night,
        }
    }
}

/// Jours travaillés autorisés par type de contrat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDays {
    pub full_time: u32,
    pub part_time_4: u32,
    pub part_time_3: u32,
}

impl Default for ContractDays {
    fn default() -> Self {
        Self {
            full_time: 5,
            part_time_4: 4,
            part_time_3: 3,
        }
    }
}

impl ContractDays {
    pub fn for_contract(&self, contract: ContractType) -> u32 {
        match contract {
            ContractType::FullTime => self.full_time,
            ContractType::PartTime4 => self.part_time_4,
            ContractType::PartTime3 => self.part_time_3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub slot_capacity: u32,
    pub guests_per_receptionist: u32,
    pub night_receptionists: u32,
    pub supervisor_min: u32,
    pub concierge_on_weekdays: bool,
    pub min_rest_days: u32,
    pub max_consecutive_days: u32,
    pub hours_per_period: u32,
    pub contract_days: ContractDays,
    pub distribution: LoadDistribution,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            slot_capacity: 4,
            guests_per_receptionist: 50,
            night_receptionists: 2,
            supervisor_min: 1,
            concierge_on_weekdays: true,
            min_rest_days: 2,
            max_consecutive_days: 5,
            hours_per_period: 8,
            contract_days: ContractDays::default(),
            distribution: LoadDistribution::default(),
        }
    }
}

impl RuleSet {
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.slot_capacity == 0 {
            return Err(RulesError("slot_capacity must be > 0".into()));
        }
        if self.guests_per_receptionist == 0 {
            return Err(RulesError("guests_per_receptionist must be > 0".into()));
        }
        if self.min_rest_days > 7 {
            return Err(RulesError("min_rest_days cannot exceed 7".into()));
        }
        if self.max_consecutive_days == 0 {
            return Err(RulesError("max_consecutive_days must be > 0".into()));
        }
        for (name, share) in [
            ("morning", self.distribution.morning),
            ("afternoon", self.distribution.afternoon),
            ("night", self.distribution.night),
        ] {
            if share.check_ins > 100 || share.check_outs > 100 {
                return Err(RulesError(format!("{name} load share above 100%")));
            }
        }
        Ok(())
    }

    /// Jours dus par l'employé : contrat, moins un jour par absence déclarée.
    pub fn contract_cap(&self, employee: &Employee) -> u32 {
        let absent = u32::try_from(employee.absences.len()).unwrap_or(u32::MAX);
        self.contract_days
            .for_contract(employee.contract)
            .saturating_sub(absent)
    }

    /// Plafond hebdomadaire de jours travaillés (contrat, absences, repos).
    pub fn weekly_day_cap(&self, employee: &Employee) -> u32 {
        self.contract_cap(employee)
            .min(7u32.saturating_sub(self.min_rest_days))
    }
}
