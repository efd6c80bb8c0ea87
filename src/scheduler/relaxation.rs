//! Relaxation continue du modèle via `good_lp` (solveur `microlp`).
//!
//! Les variables d'affectation deviennent continues dans [0, 1] ; l'équité est
//! linéarisée par une variable d'écart par membre de groupe :
//! `d_e >= n·x_e - Σx` et `d_e >= Σx - n·x_e`. Une relaxation infaisable
//! certifie l'infaisabilité du problème entier ; sinon son optimum borne
//! l'objectif par dessous.

use super::builder::{Model, Sense};
use good_lp::{
    constraint, microlp, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Relaxation {
    Infeasible,
    Bound(f64),
    /// Le solveur LP n'a pas abouti ; aucune borne disponible.
    Unavailable(String),
}

impl Relaxation {
    /// Borne entière (objectif à coefficients entiers).
    pub(crate) fn floor(&self) -> Option<u64> {
        match self {
            Relaxation::Bound(b) if b.is_finite() && *b >= 0.0 => Some((b - 1e-6).ceil() as u64),
            _ => None,
        }
    }
}

fn sum_of(vars: impl IntoIterator<Item = Variable>) -> Expression {
    vars.into_iter().fold(Expression::from(0.0), |acc, v| acc + v)
}

pub(crate) fn solve_relaxation(model: &Model) -> Relaxation {
    let mut vars = variables!();
    let x: Vec<Variable> = (0..model.var_count())
        .map(|_| vars.add(variable().min(0.0).max(1.0)))
        .collect();

    let counts: Vec<Expression> = model
        .by_employee
        .iter()
        .map(|own| sum_of(own.iter().map(|v| x[*v])))
        .collect();

    let mut deviations = Vec::new();
    for group in &model.groups {
        let n = group.members.len() as f64;
        let total = group
            .members
            .iter()
            .fold(Expression::from(0.0), |acc, m| acc + counts[*m].clone());
        for m in &group.members {
            let d = vars.add(variable().min(0.0));
            deviations.push((d, counts[*m].clone() * n - total.clone()));
        }
    }

    let cost = sum_of(x.iter().copied());
    let balance = sum_of(deviations.iter().map(|(d, _)| *d));
    let objective =
        cost * f64::from(model.weights.cost) + balance * f64::from(model.weights.balance);

    let mut problem = vars.minimise(objective).using(microlp);
    for con in &model.constraints {
        let lhs = sum_of(con.vars.iter().map(|v| x[*v]));
        let rhs = f64::from(con.rhs);
        problem = match con.sense {
            Sense::AtMost => problem.with(constraint!(lhs <= rhs)),
            Sense::AtLeast => problem.with(constraint!(lhs >= rhs)),
            Sense::Exactly => problem.with(constraint!(lhs == rhs)),
        };
    }
    let zero = 0.0;
    for (d, spread) in &deviations {
        let above = Expression::from(*d) - spread.clone();
        let below = Expression::from(*d) + spread.clone();
        problem = problem
            .with(constraint!(above >= zero))
            .with(constraint!(below >= zero));
    }

    match problem.solve() {
        Ok(solution) => {
            let cost: f64 = x.iter().map(|v| solution.value(*v)).sum();
            let balance: f64 = deviations.iter().map(|(d, _)| solution.value(*d)).sum();
            Relaxation::Bound(
                cost * f64::from(model.weights.cost) + balance * f64::from(model.weights.balance),
            )
        }
        Err(ResolutionError::Infeasible) => Relaxation::Infeasible,
        Err(err) => Relaxation::Unavailable(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_rounds_up_with_tolerance() {
        assert_eq!(Relaxation::Bound(12.0000001).floor(), Some(12));
        assert_eq!(Relaxation::Bound(12.4).floor(), Some(13));
        assert_eq!(Relaxation::Infeasible.floor(), None);
    }
}
