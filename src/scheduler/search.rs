//! Séparation-évaluation en profondeur sur les variables 0/1 du modèle.
//!
//! Chaque nœud propage les contraintes de cardinalité (fixation à 0 quand le
//! plafond est atteint, à 1 quand le minimum ne laisse plus de choix), puis
//! branche sur la contrainte de couverture la plus tendue. Les candidats sont
//! ordonnés par capacité restante, ce qui fait tourner l'équipe naturellement.

use super::budget::Budget;
use super::builder::{group_penalty, Model, VarId};
use super::types::StopReason;
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Budget(StopReason),
    FirstFound,
    Floor,
}

#[derive(Debug, Clone)]
pub(crate) struct SearchResult {
    pub values: Option<Vec<bool>>,
    pub objective: Option<u64>,
    pub nodes: u64,
    /// Arbre épuisé ou borne inférieure atteinte : le résultat est certifié.
    pub proven: bool,
    pub stop: Option<StopReason>,
}

struct Search<'m> {
    model: &'m Model,
    budget: &'m Budget,
    var_cons: Vec<Vec<usize>>,
    slot_cover: Vec<Vec<usize>>,
    value: Vec<Option<bool>>,
    ones: Vec<u32>,
    free: Vec<u32>,
    emp_ones: Vec<u32>,
    emp_free: Vec<u32>,
    trail: Vec<VarId>,
    nodes: u64,
    incumbent: Option<(Vec<bool>, u64)>,
    floor: Option<u64>,
    first_only: bool,
    halt: Option<Halt>,
}

impl<'m> Search<'m> {
    fn new(model: &'m Model, budget: &'m Budget, floor: Option<u64>, first_only: bool) -> Self {
        let mut var_cons = vec![Vec::new(); model.var_count()];
        let mut slot_cover = vec![Vec::new(); crate::model::ShiftSlot::COUNT];
        for (c, con) in model.constraints.iter().enumerate() {
            for &v in &con.vars {
                var_cons[v].push(c);
            }
            if let Some(slot) = con.slot.filter(|_| con.lower() > 0) {
                slot_cover[slot.index()].push(c);
            }
        }
        Self {
            model,
            budget,
            var_cons,
            slot_cover,
            value: vec![None; model.var_count()],
            ones: vec![0; model.constraints.len()],
            free: model.constraints.iter().map(|c| c.vars.len() as u32).collect(),
            emp_ones: vec![0; model.employees.len()],
            emp_free: model.by_employee.iter().map(|v| v.len() as u32).collect(),
            trail: Vec::with_capacity(model.var_count()),
            nodes: 0,
            incumbent: None,
            floor,
            first_only,
            halt: None,
        }
    }

    fn set(&mut self, v: VarId, b: bool, queue: &mut Vec<usize>) {
        self.value[v] = Some(b);
        self.trail.push(v);
        let e = self.model.vars[v].employee;
        self.emp_free[e] -= 1;
        if b {
            self.emp_ones[e] += 1;
        }
        for &c in &self.var_cons[v] {
            self.free[c] -= 1;
            if b {
                self.ones[c] += 1;
            }
            queue.push(c);
        }
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(v) = self.trail.pop() else { break };
            let Some(b) = self.value[v].take() else { continue };
            let e = self.model.vars[v].employee;
            self.emp_free[e] += 1;
            if b {
                self.emp_ones[e] -= 1;
            }
            for &c in &self.var_cons[v] {
                self.free[c] += 1;
                if b {
                    self.ones[c] -= 1;
                }
            }
        }
    }

    /// Faux en cas de conflit.
    fn propagate(&mut self, queue: &mut Vec<usize>) -> bool {
        let model = self.model;
        while let Some(c) = queue.pop() {
            let con = &model.constraints[c];
            let (ones, free) = (self.ones[c], self.free[c]);
            if con.upper().is_some_and(|u| ones > u) || ones + free < con.lower() {
                return false;
            }
            if free == 0 {
                continue;
            }
            let fix = if con.upper() == Some(ones) {
                false
            } else if ones + free == con.lower() {
                true
            } else {
                continue;
            };
            for &v in &con.vars {
                if self.value[v].is_none() {
                    self.set(v, fix, queue);
                }
            }
        }
        true
    }

    fn lower_bound(&self) -> u64 {
        let residual: u64 = self
            .slot_cover
            .iter()
            .map(|cons| {
                cons.iter()
                    .map(|&c| self.model.constraints[c].lower().saturating_sub(self.ones[c]))
                    .max()
                    .map_or(0, u64::from)
            })
            .sum();
        let assigned: u64 = self.emp_ones.iter().map(|n| u64::from(*n)).sum();
        let settled: u64 = self
            .model
            .groups
            .iter()
            .filter(|g| g.members.iter().all(|m| self.emp_free[*m] == 0))
            .map(|g| group_penalty(g, &self.emp_ones))
            .sum();
        u64::from(self.model.weights.cost) * (assigned + residual)
            + u64::from(self.model.weights.balance) * settled
    }

    fn choose(&self) -> Option<(VarId, bool)> {
        let model = self.model;
        let mut tightest: Option<(u32, usize)> = None;
        for (c, con) in model.constraints.iter().enumerate() {
            let (lower, ones, free) = (con.lower(), self.ones[c], self.free[c]);
            if ones >= lower || free == 0 {
                continue;
            }
            let slack = free.saturating_sub(lower - ones);
            if tightest.map_or(true, |(s, _)| slack < s) {
                tightest = Some((slack, c));
            }
        }

        if let Some((_, c)) = tightest {
            return model.constraints[c]
                .vars
                .iter()
                .copied()
                .filter(|v| self.value[*v].is_none())
                .max_by_key(|v| {
                    let e = model.vars[*v].employee;
                    let worked = self.emp_ones[e];
                    (model.day_caps[e].saturating_sub(worked), Reverse(worked), Reverse(*v))
                })
                .map(|v| (v, true));
        }

        self.value.iter().position(Option::is_none).map(|v| (v, false))
    }

    fn record_leaf(&mut self) -> bool {
        let values: Vec<bool> = self.value.iter().map(|v| v.unwrap_or(false)).collect();
        debug_assert!(self.model.constraints.iter().all(|c| c.is_satisfied_by(&values)));
        let objective = self.model.objective_value(&values);
        if self.incumbent.as_ref().map_or(true, |(_, best)| objective < *best) {
            tracing::debug!(event = "incumbent", objective, nodes = self.nodes);
            self.incumbent = Some((values, objective));
        }
        if self.first_only {
            self.halt = Some(Halt::FirstFound);
            return true;
        }
        if self.floor.is_some_and(|f| objective <= f) {
            self.halt = Some(Halt::Floor);
            return true;
        }
        false
    }

    /// Vrai quand la recherche doit s'arrêter.
    fn dfs(&mut self) -> bool {
        if let Some(reason) = self.budget.exhausted(self.nodes) {
            self.halt = Some(Halt::Budget(reason));
            return true;
        }
        self.nodes += 1;

        if let Some((_, best)) = &self.incumbent {
            if self.lower_bound() >= *best {
                return false;
            }
        }

        let Some((v, first)) = self.choose() else {
            return self.record_leaf();
        };

        for b in [first, !first] {
            let mark = self.trail.len();
            let mut queue = Vec::new();
            self.set(v, b, &mut queue);
            let stop = self.propagate(&mut queue) && self.dfs();
            self.undo(mark);
            if stop {
                return true;
            }
        }
        false
    }
}

/// Lance la recherche. `floor` : borne inférieure connue de l'objectif ;
/// l'atteindre certifie l'optimalité.
pub(crate) fn solve(
    model: &Model,
    budget: &Budget,
    floor: Option<u64>,
    first_only: bool,
) -> SearchResult {
    let mut search = Search::new(model, budget, floor, first_only);
    let mut queue: Vec<usize> = (0..model.constraints.len()).collect();
    if search.propagate(&mut queue) {
        search.dfs();
    }

    let proven = matches!(search.halt, None | Some(Halt::Floor));
    let stop = match search.halt {
        Some(Halt::Budget(reason)) => Some(reason),
        _ => None,
    };
    let (values, objective) = match search.incumbent {
        Some((values, objective)) => (Some(values), Some(objective)),
        None => (None, None),
    };
    SearchResult {
        values,
        objective,
        nodes: search.nodes,
        proven,
        stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::estimate_demand;
    use crate::model::{ContractType, Employee, OccupancyForecast, Period, Role};
    use crate::rules::RuleSet;
    use crate::scheduler::builder::ModelBuilder;
    use crate::scheduler::budget::CancelToken;
    use crate::scheduler::types::SolverOptions;

    fn night_only_rules() -> RuleSet {
        RuleSet {
            supervisor_min: 0,
            night_receptionists: 1,
            concierge_on_weekdays: false,
            ..RuleSet::default()
        }
    }

    fn night_pair() -> Vec<Employee> {
        (1..=2)
            .map(|i| {
                Employee::new(format!("Veilleur {i}"), Role::Receptionist, ContractType::FullTime)
                    .with_id(format!("n{i}"))
                    .with_periods([Period::Night])
            })
            .collect()
    }

    #[test]
    fn small_model_is_solved_to_proven_optimality() {
        let rules = night_only_rules();
        let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
        let roster = night_pair();
        let model = ModelBuilder::new(&roster, &demand, &rules).build().unwrap();
        let budget = Budget::new(&SolverOptions::default(), CancelToken::new());

        let result = solve(&model, &budget, None, false);
        assert!(result.proven);
        let values = result.values.unwrap();
        // 7 nuits réparties 4/3 : coût 7, écart |8-7| + |6-7| = 2
        assert_eq!(result.objective, Some(7 + 10 * 2));
        assert_eq!(values.iter().filter(|v| **v).count(), 7);
    }

    #[test]
    fn cancelled_budget_stops_before_first_node() {
        let rules = night_only_rules();
        let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
        let roster = night_pair();
        let model = ModelBuilder::new(&roster, &demand, &rules).build().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let budget = Budget::new(&SolverOptions::default(), token);

        let result = solve(&model, &budget, None, false);
        assert!(!result.proven);
        assert_eq!(result.stop, Some(StopReason::Cancelled));
        assert!(result.values.is_none());
    }
}
