//! Robust linear program over an affine decision rule.
//!
//! Constraints are stated on the decision vector `x(z)` and hold for every
//! `z` of an uncertainty set. Compilation replaces each of them with its
//! robust counterpart: for `a'x(z) <= b0 + bz'z` over `||z|| <= r`,
//!
//! ```text
//! a'x0 + r * ||w||_* <= b0,    w_j = sum_i a_i X_ij - bz_j
//! ```
//!
//! where `||.||_*` is the dual norm, represented with auxiliary columns.

use crate::error::AroError;
use crate::ldr::{AffinePolicy, DecisionRule};
use crate::solver;
use crate::uncertainty::{DualNorm, UncertaintySet};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Le,
    Ge,
    Eq,
}

/// Realizations a constraint must hold for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// Every point of the model uncertainty set
    ForAll,
    /// Only the nominal realization `z = 0`
    Nominal,
}

/// Right-hand side affine in the flattened uncertain vector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AffineRhs {
    pub constant: f64,
    pub uncertain: Vec<(usize, f64)>,
}

impl AffineRhs {
    pub fn constant(constant: f64) -> Self {
        Self {
            constant,
            uncertain: vec![],
        }
    }

    pub fn with_uncertain(constant: f64, uncertain: Vec<(usize, f64)>) -> Self {
        Self {
            constant,
            uncertain,
        }
    }

    fn negated(&self) -> Self {
        Self {
            constant: -self.constant,
            uncertain: self.uncertain.iter().map(|(j, v)| (*j, -v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RobustConstraint {
    /// Coefficients on decision vector positions
    pub terms: Vec<(usize, f64)>,
    /// Coefficients on helper variables, which do not adapt
    pub helper_terms: Vec<(usize, f64)>,
    pub sense: ConstraintSense,
    pub rhs: AffineRhs,
    pub qualifier: Qualifier,
}

impl RobustConstraint {
    pub fn new(
        terms: Vec<(usize, f64)>,
        sense: ConstraintSense,
        rhs: AffineRhs,
    ) -> Self {
        Self {
            terms,
            helper_terms: vec![],
            sense,
            rhs,
            qualifier: Qualifier::ForAll,
        }
    }

    pub fn with_helpers(mut self, helper_terms: Vec<(usize, f64)>) -> Self {
        self.helper_terms = helper_terms;
        self
    }

    pub fn nominal(mut self) -> Self {
        self.qualifier = Qualifier::Nominal;
        self
    }

    /// Whether `lhs(x) sense rhs(z)` holds for concrete values
    pub fn is_satisfied(&self, x: &[f64], helpers: &[f64], z: &[f64], tol: f64) -> bool {
        let lhs: f64 = self.terms.iter().map(|(i, a)| a * x[*i]).sum::<f64>()
            + self
                .helper_terms
                .iter()
                .map(|(h, a)| a * helpers[*h])
                .sum::<f64>();
        let rhs = self.rhs.constant
            + self
                .rhs
                .uncertain
                .iter()
                .map(|(j, b)| b * z[*j])
                .sum::<f64>();
        match self.sense {
            ConstraintSense::Le => lhs <= rhs + tol,
            ConstraintSense::Ge => lhs >= rhs - tol,
            ConstraintSense::Eq => (lhs - rhs).abs() <= tol,
        }
    }
}

/// A deterministic variable that does not adapt to the uncertainty
#[derive(Debug, Clone, PartialEq)]
pub struct HelperVariable {
    pub lower: f64,
    pub upper: f64,
    pub cost: f64,
    pub integer: bool,
}

/// Solver columns assigned to the model variables
#[derive(Debug, Clone)]
struct ColumnMap {
    constant: Vec<usize>,
    coefficient_start: Vec<usize>,
    helpers: Vec<usize>,
}

impl ColumnMap {
    fn coefficient(&self, i: usize, k: usize) -> usize {
        self.coefficient_start[i] + k
    }
}

#[derive(Debug, Clone)]
pub struct RobustSolution {
    pub status: solver::HighsModelStatus,
    pub objective: Option<f64>,
    pub policy: Option<AffinePolicy>,
    pub helper_values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct RobustModel {
    rule: DecisionRule,
    set: UncertaintySet,
    constraints: Vec<RobustConstraint>,
    helpers: Vec<HelperVariable>,
    epigraph: Option<usize>,
}

/// Sums repeated columns and drops zero coefficients
fn merge_factors(mut factors: Vec<(usize, f64)>) -> Vec<(usize, f64)> {
    factors.sort_by_key(|(col, _)| *col);
    let mut merged: Vec<(usize, f64)> = Vec::with_capacity(factors.len());
    for (col, value) in factors {
        match merged.last_mut() {
            Some((last, acc)) if *last == col => *acc += value,
            _ => merged.push((col, value)),
        }
    }
    merged.retain(|(_, value)| *value != 0.0);
    merged
}

/// Adds a row, skipping empty rows that are trivially satisfied
fn push_row(
    pb: &mut solver::Problem,
    lower: f64,
    upper: f64,
    factors: Vec<(usize, f64)>,
) -> Result<(), AroError> {
    let factors = merge_factors(factors);
    if factors.is_empty() && lower <= 0.0 && upper >= 0.0 {
        return Ok(());
    }
    pb.add_row(lower..=upper, &factors)?;
    Ok(())
}

/// Adds `aux >= |w|` with `w = factors'X - offset - shift`
fn bound_deviation(
    pb: &mut solver::Problem,
    aux: usize,
    factors: &[(usize, f64)],
    offset: f64,
    shift: Option<usize>,
) -> Result<(), AroError> {
    let mut upper = vec![(aux, 1.0)];
    upper.extend(factors.iter().map(|(c, a)| (*c, -a)));
    let mut lower = vec![(aux, 1.0)];
    lower.extend(factors.iter().copied());
    if let Some(p) = shift {
        upper.push((p, 1.0));
        lower.push((p, -1.0));
    }
    push_row(pb, -offset, f64::INFINITY, upper)?;
    push_row(pb, offset, f64::INFINITY, lower)
}

/// The auxiliary column shared by every deviation of one constraint,
/// declared on first use with `weight` in the nominal row
fn shared_column(
    pb: &mut solver::Problem,
    shared: &mut Option<usize>,
    nominal: &mut Vec<(usize, f64)>,
    weight: f64,
) -> usize {
    *shared.get_or_insert_with(|| {
        let s = pb.add_column(0.0, 0.0..);
        nominal.push((s, weight));
        s
    })
}

impl RobustModel {
    pub fn new(rule: DecisionRule, set: UncertaintySet) -> Self {
        Self {
            rule,
            set,
            constraints: vec![],
            helpers: vec![],
            epigraph: None,
        }
    }

    pub fn rule(&self) -> &DecisionRule {
        &self.rule
    }

    pub fn set(&self) -> UncertaintySet {
        self.set
    }

    pub fn constraints(&self) -> &[RobustConstraint] {
        &self.constraints
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_helpers(&self) -> usize {
        self.helpers.len()
    }

    pub fn add_helper(&mut self, helper: HelperVariable) -> usize {
        self.helpers.push(helper);
        self.helpers.len() - 1
    }

    /// Declares `n` binary helper variables, returning the first index
    pub fn add_binaries(&mut self, n: usize) -> usize {
        let first = self.helpers.len();
        for _ in 0..n {
            self.add_helper(HelperVariable {
                lower: 0.0,
                upper: 1.0,
                cost: 0.0,
                integer: true,
            });
        }
        first
    }

    pub fn st(&mut self, constraint: RobustConstraint) {
        self.constraints.push(constraint);
    }

    pub fn st_all<I: IntoIterator<Item = RobustConstraint>>(
        &mut self,
        constraints: I,
    ) {
        self.constraints.extend(constraints);
    }

    /// Minimizes the maximum of `costs'x(z)` over the model set when
    /// `worst_case`, or over the nominal point otherwise. Replaces any
    /// previously declared objective.
    pub fn minmax(&mut self, costs: Vec<(usize, f64)>, worst_case: bool) {
        if let Some(previous) = self.epigraph {
            self.constraints.retain(|c| {
                !c.helper_terms.iter().any(|(h, _)| *h == previous)
            });
            self.helpers[previous].cost = 0.0;
        }
        let tau = self.add_helper(HelperVariable {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            cost: 1.0,
            integer: false,
        });
        let constraint = RobustConstraint::new(
            costs,
            ConstraintSense::Le,
            AffineRhs::constant(0.0),
        )
        .with_helpers(vec![(tau, -1.0)]);
        self.st(if worst_case {
            constraint
        } else {
            constraint.nominal()
        });
        self.epigraph = Some(tau);
    }

    fn declare_columns(&self, pb: &mut solver::Problem) -> ColumnMap {
        let num_x = self.rule.num_x();
        let mut constant = Vec::with_capacity(num_x);
        let mut coefficient_start = Vec::with_capacity(num_x);
        for i in 0..num_x {
            constant.push(pb.add_column(0.0, f64::NEG_INFINITY..));
            let deps = self.rule.dependencies(i);
            coefficient_start.push(pb.num_col);
            for _ in deps {
                pb.add_column(0.0, f64::NEG_INFINITY..);
            }
        }
        let helpers = self
            .helpers
            .iter()
            .map(|h| {
                if h.integer {
                    pb.add_integer_column(h.cost, h.lower..=h.upper)
                } else {
                    pb.add_column(h.cost, h.lower..=h.upper)
                }
            })
            .collect();
        ColumnMap {
            constant,
            coefficient_start,
            helpers,
        }
    }

    /// Adds `a'x(z) + h'y <= b0 + bz'z` for all `z` of `set`
    fn compile_le(
        &self,
        pb: &mut solver::Problem,
        cols: &ColumnMap,
        terms: &[(usize, f64)],
        helper_terms: &[(usize, f64)],
        rhs: &AffineRhs,
        set: UncertaintySet,
    ) -> Result<(), AroError> {
        let mut nominal: Vec<(usize, f64)> = terms
            .iter()
            .map(|(i, a)| (cols.constant[*i], *a))
            .chain(helper_terms.iter().map(|(h, a)| (cols.helpers[*h], *a)))
            .collect();

        let radius = set.radius();
        if radius > 0.0 {
            let deviations = self.deviations(cols, terms, rhs);
            let dual = set.dual_norm();
            let shared_weight = match dual {
                DualNorm::OneInf => radius * (self.rule.num_z() as f64).sqrt(),
                _ => radius,
            };
            let mut shared: Option<usize> = None;
            for (factors, offset) in deviations.into_values() {
                match dual {
                    DualNorm::One => {
                        let u = pb.add_column(0.0, 0.0..);
                        nominal.push((u, radius));
                        bound_deviation(pb, u, &factors, offset, None)?;
                    }
                    DualNorm::Inf => {
                        let s = shared_column(pb, &mut shared, &mut nominal, shared_weight);
                        bound_deviation(pb, s, &factors, offset, None)?;
                    }
                    DualNorm::OneInf => {
                        // w_j = p_j + (w_j - p_j), the first part priced by
                        // the box and the rest by the scaled budget
                        let p = pb.add_column(0.0, ..);
                        let u = pb.add_column(0.0, 0.0..);
                        nominal.push((u, radius));
                        bound_deviation(pb, u, &[(p, 1.0)], 0.0, None)?;
                        let s = shared_column(pb, &mut shared, &mut nominal, shared_weight);
                        bound_deviation(pb, s, &factors, offset, Some(p))?;
                    }
                }
            }
        }

        push_row(pb, f64::NEG_INFINITY, rhs.constant, nominal)
    }

    /// Adds `a'x(z) + h'y = b0 + bz'z` for all `z` of `set`, matching the
    /// constant and every uncertain coefficient.
    fn compile_eq(
        &self,
        pb: &mut solver::Problem,
        cols: &ColumnMap,
        terms: &[(usize, f64)],
        helper_terms: &[(usize, f64)],
        rhs: &AffineRhs,
        set: UncertaintySet,
    ) -> Result<(), AroError> {
        let nominal: Vec<(usize, f64)> = terms
            .iter()
            .map(|(i, a)| (cols.constant[*i], *a))
            .chain(helper_terms.iter().map(|(h, a)| (cols.helpers[*h], *a)))
            .collect();
        push_row(pb, rhs.constant, rhs.constant, nominal)?;

        if set.radius() > 0.0 {
            for (factors, offset) in self.deviations(cols, terms, rhs).into_values()
            {
                push_row(pb, offset, offset, factors)?;
            }
        }
        Ok(())
    }

    /// Groups, per uncertain entry `j`, the rule coefficients multiplying
    /// `z_j` on the left-hand side and the right-hand side coefficient.
    fn deviations(
        &self,
        cols: &ColumnMap,
        terms: &[(usize, f64)],
        rhs: &AffineRhs,
    ) -> BTreeMap<usize, (Vec<(usize, f64)>, f64)> {
        let mut deviations: BTreeMap<usize, (Vec<(usize, f64)>, f64)> =
            BTreeMap::new();
        for (i, a) in terms.iter() {
            for (k, j) in self.rule.dependencies(*i).enumerate() {
                deviations
                    .entry(j)
                    .or_default()
                    .0
                    .push((cols.coefficient(*i, k), *a));
            }
        }
        for (j, b) in rhs.uncertain.iter() {
            deviations.entry(*j).or_default().1 += b;
        }
        deviations.retain(|_, (factors, offset)| {
            !factors.is_empty() || *offset != 0.0
        });
        deviations
    }

    fn compile_constraint(
        &self,
        pb: &mut solver::Problem,
        cols: &ColumnMap,
        constraint: &RobustConstraint,
    ) -> Result<(), AroError> {
        let set = match constraint.qualifier {
            Qualifier::ForAll => self.set,
            Qualifier::Nominal => UncertaintySet::Nominal,
        };
        match constraint.sense {
            ConstraintSense::Le => self.compile_le(
                pb,
                cols,
                &constraint.terms,
                &constraint.helper_terms,
                &constraint.rhs,
                set,
            ),
            ConstraintSense::Ge => {
                let terms: Vec<(usize, f64)> =
                    constraint.terms.iter().map(|(i, a)| (*i, -a)).collect();
                let helper_terms: Vec<(usize, f64)> = constraint
                    .helper_terms
                    .iter()
                    .map(|(h, a)| (*h, -a))
                    .collect();
                self.compile_le(
                    pb,
                    cols,
                    &terms,
                    &helper_terms,
                    &constraint.rhs.negated(),
                    set,
                )
            }
            ConstraintSense::Eq => self.compile_eq(
                pb,
                cols,
                &constraint.terms,
                &constraint.helper_terms,
                &constraint.rhs,
                set,
            ),
        }
    }

    fn compile(&self) -> Result<(solver::Problem, ColumnMap), AroError> {
        let mut pb = solver::Problem::new();
        let cols = self.declare_columns(&mut pb);
        for constraint in self.constraints.iter() {
            self.compile_constraint(&mut pb, &cols, constraint)?;
        }
        tracing::debug!(
            "Robust counterpart with {} columns and {} rows",
            pb.num_col,
            pb.num_row
        );
        Ok((pb, cols))
    }

    fn extract_policy(
        &self,
        cols: &ColumnMap,
        solution: &solver::Solution,
    ) -> Result<AffinePolicy, AroError> {
        let values = &solution.colvalue;
        let constant = cols.constant.iter().map(|c| values[*c]).collect();
        let coefficients = (0..self.rule.num_x())
            .map(|i| {
                let start = cols.coefficient_start[i];
                let len = self.rule.dependencies(i).len();
                values[start..start + len].to_vec()
            })
            .collect();
        AffinePolicy::new(self.rule.clone(), constant, coefficients)
    }

    /// Compiles the robust counterpart and solves it. Any model status is
    /// a valid outcome; only a backend failure is an error.
    pub fn solve(&self, time_limit: f64) -> Result<RobustSolution, AroError> {
        let (pb, cols) = self.compile()?;
        let mut model = pb.try_minimise()?;
        model.set_string_option("presolve", "on")?;
        model.set_double_option("time_limit", time_limit)?;
        model.try_solve()?;

        let status = model.status();
        if status != solver::HighsModelStatus::Optimal {
            return Ok(RobustSolution {
                status,
                objective: None,
                policy: None,
                helper_values: vec![],
            });
        }

        let solution = model.get_solution()?;
        let policy = self.extract_policy(&cols, &solution)?;
        let helper_values =
            cols.helpers.iter().map(|c| solution.colvalue[*c]).collect();
        Ok(RobustSolution {
            status,
            objective: Some(model.get_objective_value()),
            policy: Some(policy),
            helper_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::HighsModelStatus;
    use crate::uncertainty::UncertaintySetType;

    fn box_set(r: f64) -> UncertaintySet {
        UncertaintySet::new(UncertaintySetType::Box, r)
    }

    #[test]
    fn test_merge_factors() {
        let merged = merge_factors(vec![(2, 1.0), (0, 1.0), (2, 2.0), (1, 0.0)]);
        assert_eq!(merged, vec![(0, 1.0), (2, 3.0)]);
    }

    #[test]
    fn test_nominal_objective_without_uncertainty() {
        let rule = DecisionRule::new(2, 0);
        let mut model = RobustModel::new(rule, box_set(1.0));
        model.st(RobustConstraint::new(
            vec![(0, 1.0), (1, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::constant(4.0),
        ));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Le,
            AffineRhs::constant(3.0),
        ));
        model.st(RobustConstraint::new(
            vec![(1, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::constant(0.0),
        ));
        model.minmax(vec![(0, 1.0), (1, 2.0)], false);
        let solution = model.solve(60.0).unwrap();
        assert_eq!(solution.status, HighsModelStatus::Optimal);
        assert!((solution.objective.unwrap() - 5.0).abs() < 1e-6);
        let x = solution.policy.unwrap().nominal();
        assert!((x[0] - 3.0).abs() < 1e-6);
        assert!((x[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_decision_tracks_uncertainty() {
        // x1 observes z0 and must cover it: x1(z) >= 1 + z0 for |z0| <= 1
        let mut rule = DecisionRule::new(1, 1);
        rule.adapt(0..1, 0..1);
        let mut model = RobustModel::new(rule, box_set(1.0));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::with_uncertain(1.0, vec![(0, 1.0)]),
        ));
        model.minmax(vec![(0, 1.0)], false);
        let solution = model.solve(60.0).unwrap();
        assert_eq!(solution.status, HighsModelStatus::Optimal);
        let policy = solution.policy.unwrap();
        // nominal cost 1 is reachable with x = 1 + z
        assert!((solution.objective.unwrap() - 1.0).abs() < 1e-6);
        let x = policy.evaluate(&[0.5]).unwrap();
        assert!(x[0] >= 1.5 - 1e-6);
    }

    #[test]
    fn test_static_decision_pays_worst_case() {
        // without adaptation the decision must cover the largest z
        let rule = DecisionRule::new(1, 1);
        let mut model = RobustModel::new(rule, box_set(1.0));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::with_uncertain(1.0, vec![(0, 1.0)]),
        ));
        model.minmax(vec![(0, 1.0)], true);
        let solution = model.solve(60.0).unwrap();
        assert_eq!(solution.status, HighsModelStatus::Optimal);
        assert!((solution.objective.unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_budget_set_shares_one_auxiliary() {
        // x >= z0 + z1 with ||z||_1 <= 1 needs x >= 1
        let rule = DecisionRule::new(1, 2);
        let mut model = RobustModel::new(
            rule,
            UncertaintySet::new(UncertaintySetType::Budget, 1.0),
        );
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::with_uncertain(0.0, vec![(0, 1.0), (1, 1.0)]),
        ));
        model.minmax(vec![(0, 1.0)], false);
        let solution = model.solve(60.0).unwrap();
        assert!((solution.objective.unwrap() - 1.0).abs() < 1e-6);
    }

    fn static_bound(kind: UncertaintySetType, weights: &[(usize, f64)]) -> f64 {
        let rule = DecisionRule::new(1, 2);
        let mut model = RobustModel::new(rule, UncertaintySet::new(kind, 1.0));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::with_uncertain(0.0, weights.to_vec()),
        ));
        model.minmax(vec![(0, 1.0)], false);
        let solution = model.solve(60.0).unwrap();
        assert_eq!(solution.status, HighsModelStatus::Optimal);
        solution.objective.unwrap()
    }

    #[test]
    fn test_ellipsoidal_set_is_tighter_than_box() {
        // x >= z0 + z1 with ||z||_2 <= 1 needs x >= sqrt(2)
        let weights = [(0, 1.0), (1, 1.0)];
        let ellipsoidal = static_bound(UncertaintySetType::Ellipsoidal, &weights);
        let boxed = static_bound(UncertaintySetType::Box, &weights);
        assert!((ellipsoidal - 2.0_f64.sqrt()).abs() < 1e-6);
        assert!((boxed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ellipsoidal_bound_is_safe() {
        // x >= z0 + 0.5 z1: exact sqrt(1.25), box 1.5, here 1 + 0.5 (sqrt(2) - 1)
        let bound = static_bound(UncertaintySetType::Ellipsoidal, &[(0, 1.0), (1, 0.5)]);
        assert!(bound >= 1.25_f64.sqrt() - 1e-6);
        assert!(bound < 1.5 - 1e-3);
        assert!((bound - (1.0 + 0.5 * (2.0_f64.sqrt() - 1.0))).abs() < 1e-6);
    }

    #[test]
    fn test_robust_equality_matches_coefficients() {
        let mut rule = DecisionRule::new(1, 1);
        rule.adapt(0..1, 0..1);
        let mut model = RobustModel::new(rule, box_set(1.0));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Eq,
            AffineRhs::with_uncertain(2.0, vec![(0, 3.0)]),
        ));
        model.minmax(vec![(0, 1.0)], false);
        let policy = model.solve(60.0).unwrap().policy.unwrap();
        assert!((policy.constants()[0] - 2.0).abs() < 1e-6);
        assert!((policy.ldr_coefficients()[0][0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_model_reports_status() {
        let rule = DecisionRule::new(1, 0);
        let mut model = RobustModel::new(rule, box_set(1.0));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::constant(2.0),
        ));
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Le,
            AffineRhs::constant(1.0),
        ));
        model.minmax(vec![(0, 1.0)], false);
        let solution = model.solve(60.0).unwrap();
        assert_ne!(solution.status, HighsModelStatus::Optimal);
        assert!(solution.policy.is_none());
    }

    #[test]
    fn test_binary_helper_linking() {
        // x <= b at nominal, x >= 0.5, b binary
        let rule = DecisionRule::new(1, 0);
        let mut model = RobustModel::new(rule, box_set(0.0));
        let b = model.add_binaries(1);
        model.st(
            RobustConstraint::new(
                vec![(0, 1.0)],
                ConstraintSense::Le,
                AffineRhs::constant(0.0),
            )
            .with_helpers(vec![(b, -1.0)])
            .nominal(),
        );
        model.st(RobustConstraint::new(
            vec![(0, 1.0)],
            ConstraintSense::Ge,
            AffineRhs::constant(0.5),
        ));
        model.minmax(vec![(0, 1.0)], false);
        let solution = model.solve(60.0).unwrap();
        assert_eq!(solution.status, HighsModelStatus::Optimal);
        assert!((solution.helper_values[b] - 1.0).abs() < 1e-6);
    }
}
