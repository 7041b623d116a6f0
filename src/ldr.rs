//! Linear decision rules: every position `i` of the decision vector is
//! `x_i(z) = x0_i + sum_{j in D(i)} X_ij z_j`, where `D(i)` is a range of
//! the flattened uncertain vector the position is allowed to observe.

use crate::error::{check_len, AroError};
use crate::index::DecisionIndex;
use std::ops::Range;

/// Declarative dependency structure of the affine decision rule
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRule {
    num_z: usize,
    depends_on: Vec<Range<usize>>,
}

impl DecisionRule {
    /// A non-adaptive rule: every position is a plain decision
    pub fn new(num_x: usize, num_z: usize) -> Self {
        Self {
            num_z,
            depends_on: vec![0..0; num_x],
        }
    }

    /// All-to-all causal rule: the block of every element at step `t`
    /// observes `z[0..t, :]`, i.e. the first `t * num_sources` entries of
    /// the flattened uncertain vector. Step 0 stays non-adaptive.
    pub fn causal(index: &DecisionIndex, num_sources: usize) -> Self {
        let num_z = index.num_steps() * num_sources;
        let mut rule = Self::new(index.len(), num_z);
        for block in index.blocks() {
            for t in 1..index.num_steps() {
                let start = block.min_idx + t * block.width;
                rule.adapt(start..start + block.width, 0..t * num_sources);
            }
        }
        rule
    }

    /// Binds the positions to be affine in the given uncertain range
    pub fn adapt(&mut self, positions: Range<usize>, z_range: Range<usize>) {
        for i in positions {
            self.depends_on[i] = z_range.clone();
        }
    }

    pub fn num_x(&self) -> usize {
        self.depends_on.len()
    }

    pub fn num_z(&self) -> usize {
        self.num_z
    }

    pub fn dependencies(&self, i: usize) -> Range<usize> {
        self.depends_on[i].clone()
    }

    /// Total number of affine coefficients, excluding constants
    pub fn num_coefficients(&self) -> usize {
        self.depends_on.iter().map(|r| r.len()).sum()
    }
}

/// A solved affine policy, evaluated without re-solving
#[derive(Debug, Clone)]
pub struct AffinePolicy {
    rule: DecisionRule,
    constant: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
}

impl AffinePolicy {
    pub fn new(
        rule: DecisionRule,
        constant: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    ) -> Result<Self, AroError> {
        check_len("policy constants", rule.num_x(), constant.len())?;
        check_len("policy coefficients", rule.num_x(), coefficients.len())?;
        for (i, row) in coefficients.iter().enumerate() {
            check_len("policy coefficients", rule.dependencies(i).len(), row.len())?;
        }
        Ok(Self {
            rule,
            constant,
            coefficients,
        })
    }

    /// Constant part of the rule, i.e. the decisions at `z = 0`
    pub fn constants(&self) -> &[f64] {
        &self.constant
    }

    /// Dense `num_x * num_z` matrix of the rule coefficients, zero where a
    /// position does not observe the uncertain entry.
    pub fn ldr_coefficients(&self) -> Vec<Vec<f64>> {
        let num_z = self.rule.num_z();
        self.coefficients
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut dense = vec![0.0; num_z];
                let deps = self.rule.dependencies(i);
                dense[deps].copy_from_slice(row);
                dense
            })
            .collect()
    }

    /// Decisions for a realization of the flattened uncertain vector
    pub fn evaluate(&self, z: &[f64]) -> Result<Vec<f64>, AroError> {
        check_len("uncertain sample", self.rule.num_z(), z.len())?;
        Ok(self
            .constant
            .iter()
            .zip(self.coefficients.iter())
            .enumerate()
            .map(|(i, (x0, row))| {
                let deps = self.rule.dependencies(i);
                x0 + row
                    .iter()
                    .zip(z[deps].iter())
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
            })
            .collect())
    }

    /// Decisions at the nominal realization
    pub fn nominal(&self) -> Vec<f64> {
        self.constant.clone()
    }
}
