//! Estimation de la demande : prévision d'occupation → effectifs requis par créneau.

use crate::model::{OccupancyForecast, Period, ShiftSlot, DAYS};
use crate::rules::RuleSet;
use crate::scheduler::PlanError;
use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

/// Besoin dérivé pour un créneau. Jamais saisi directement : toujours calculé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRequirement {
    pub slot: ShiftSlot,
    /// Effectif comptoir minimal (superviseurs + réceptionnistes) ; la nuit,
    /// nombre exact de réceptionnistes.
    pub receptionist_min: u32,
    pub supervisor_min: u32,
    pub concierge_required: bool,
    /// Interactions clients imputées au créneau.
    pub guest_load: u64,
    /// Effectif issu du seul ratio, avant plafonnement par la capacité.
    pub ratio_headcount: u32,
}

impl DemandRequirement {
    pub fn headcount_min(&self) -> u32 {
        self.receptionist_min.max(self.supervisor_min) + u32::from(self.concierge_required)
    }
}

/// Les 21 besoins de la semaine, dans l'ordre des créneaux.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandPlan {
    requirements: Vec<DemandRequirement>,
}

impl DemandPlan {
    pub fn get(&self, slot: ShiftSlot) -> &DemandRequirement {
        &self.requirements[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DemandRequirement> {
        self.requirements.iter()
    }

    /// Somme des minimums durs (base du terme de coût).
    pub fn total_minimum(&self) -> u32 {
        self.requirements.iter().map(DemandRequirement::headcount_min).sum()
    }
}

/// Calcule les besoins par créneau à partir de la prévision.
pub fn estimate_demand(forecast: &OccupancyForecast, rules: &RuleSet) -> Result<DemandPlan, PlanError> {
    rules.validate()?;
    if forecast.days.len() != usize::from(DAYS) {
        return Err(PlanError::InvalidForecast(format!(
            "expected {DAYS} days, got {}",
            forecast.days.len()
        )));
    }
    if let Some(start) = forecast.week_start {
        if start.weekday() != Weekday::Mon {
            return Err(PlanError::InvalidForecast(format!(
                "week must start on a Monday, got {start} ({})",
                start.weekday()
            )));
        }
    }
    for (day, f) in forecast.days.iter().enumerate() {
        if f.check_ins < 0 || f.check_outs < 0 {
            return Err(PlanError::InvalidForecast(format!(
                "negative value on day {day}: check_ins={}, check_outs={}",
                f.check_ins, f.check_outs
            )));
        }
    }

    let requirements = ShiftSlot::all()
        .map(|slot| {
            let day = forecast.days[usize::from(slot.day)];
            let share = rules.distribution.share(slot.period);
            // u128 : les volumes sont des i64 arbitraires
            let weighted = u128::from(day.check_ins.unsigned_abs()) * u128::from(share.check_ins)
                + u128::from(day.check_outs.unsigned_abs()) * u128::from(share.check_outs);
            let guest_load = u64::try_from(weighted.div_ceil(100)).unwrap_or(u64::MAX);
            let ratio = guest_load.div_ceil(u64::from(rules.guests_per_receptionist));
            let ratio_headcount = u32::try_from(ratio).unwrap_or(u32::MAX);

            let concierge_required =
                rules.concierge_on_weekdays && slot.period == Period::Morning && slot.is_weekday();

            let (receptionist_min, supervisor_min) = match slot.period {
                // plancher fixe, indépendant de la demande
                Period::Night => (rules.night_receptionists, 0),
                Period::Morning | Period::Afternoon => {
                    let room = rules
                        .slot_capacity
                        .saturating_sub(u32::from(concierge_required));
                    (ratio_headcount.min(room), rules.supervisor_min)
                }
            };

            DemandRequirement {
                slot,
                receptionist_min,
                supervisor_min,
                concierge_required,
                guest_load,
                ratio_headcount,
            }
        })
        .collect();

    Ok(DemandPlan { requirements })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_forecast_saturates_at_slot_capacity() {
        let rules = RuleSet::default();
        let demand = estimate_demand(&OccupancyForecast::flat(i64::MAX, i64::MAX), &rules).unwrap();
        let monday = demand.get(ShiftSlot::new(0, Period::Morning));
        assert_eq!(monday.guest_load, i64::MAX.unsigned_abs());
        assert_eq!(monday.receptionist_min, rules.slot_capacity - 1);
        let saturday = demand.get(ShiftSlot::new(5, Period::Afternoon));
        assert_eq!(saturday.receptionist_min, rules.slot_capacity);
    }

    #[test]
    fn invalid_rules_are_rejected_before_any_division() {
        let rules = RuleSet {
            guests_per_receptionist: 0,
            ..RuleSet::default()
        };
        let err = estimate_demand(&OccupancyForecast::flat(10, 10), &rules).unwrap_err();
        assert!(matches!(err, PlanError::InvalidRules(_)));
    }
}
