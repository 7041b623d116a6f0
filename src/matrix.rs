//! Sparse matrices mapping an element's decision block to per-step and
//! cumulative flows, state selectors and first differences.
//!
//! For an element with `c` states over `T` steps the block is time major:
//! ```text
//! [x(0,0) .. x(0,c-1), x(1,0) .. x(1,c-1), ..., x(T-1,c-1)]
//! ```

use sprs::{CsMat, TriMat};

/// Sign of a flow contribution to a tank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    In,
    Out,
}

impl FlowDirection {
    pub fn sign(&self) -> f64 {
        match self {
            FlowDirection::In => 1.0,
            FlowDirection::Out => -1.0,
        }
    }

    pub fn from_sign(sign: f64) -> Self {
        if sign < 0.0 {
            FlowDirection::Out
        } else {
            FlowDirection::In
        }
    }
}

fn scaled(sign: f64, param: Option<&[f64]>, col: usize) -> f64 {
    match param {
        Some(values) => sign * values[col],
        None => sign,
    }
}

/// `T x T*c` matrix summing the states of each step, scaled by `param`
pub fn comb_matrix(
    num_steps: usize,
    num_combs: usize,
    direction: FlowDirection,
    param: Option<&[f64]>,
) -> CsMat<f64> {
    let mut triplets = TriMat::new((num_steps, num_steps * num_combs));
    for row in 0..num_steps {
        for col in row * num_combs..(row + 1) * num_combs {
            let value = scaled(direction.sign(), param, col);
            if value != 0.0 {
                triplets.add_triplet(row, col, value);
            }
        }
    }
    triplets.to_csr()
}

/// `T x T*c` matrix accumulating the states of every step up to the row
pub fn cumulative_comb_matrix(
    num_steps: usize,
    num_combs: usize,
    direction: FlowDirection,
    param: Option<&[f64]>,
) -> CsMat<f64> {
    let mut triplets = TriMat::new((num_steps, num_steps * num_combs));
    for row in 0..num_steps {
        for col in 0..(row + 1) * num_combs {
            let value = scaled(direction.sign(), param, col);
            if value != 0.0 {
                triplets.add_triplet(row, col, value);
            }
        }
    }
    triplets.to_csr()
}

/// `T x T` signed identity for continuous elements
pub fn not_comb_matrix(num_steps: usize, direction: FlowDirection) -> CsMat<f64> {
    comb_matrix(num_steps, 1, direction, None)
}

/// `T x T` signed lower triangular matrix for continuous elements
pub fn cumulative_not_comb_matrix(
    num_steps: usize,
    direction: FlowDirection,
) -> CsMat<f64> {
    cumulative_comb_matrix(num_steps, 1, direction, None)
}

/// Block-diagonal rows of ones selecting the states of each step
pub fn selector_matrix(num_steps: usize, num_combs: usize) -> CsMat<f64> {
    comb_matrix(num_steps, num_combs, FlowDirection::In, None)
}

/// `T x T` first difference `x[t] - x[t-1]`, with row 0 empty and every
/// row scaled by `mask[t]`.
pub fn first_difference_matrix(num_steps: usize, mask: &[f64]) -> CsMat<f64> {
    let mut triplets = TriMat::new((num_steps, num_steps));
    for row in 1..num_steps {
        let weight = mask[row];
        if weight != 0.0 {
            triplets.add_triplet(row, row, weight);
            triplets.add_triplet(row, row - 1, -weight);
        }
    }
    triplets.to_csr()
}

/// Coefficients of every row, with columns shifted by `col_offset`
pub fn row_terms(matrix: &CsMat<f64>, col_offset: usize) -> Vec<Vec<(usize, f64)>> {
    matrix
        .outer_iterator()
        .map(|row| {
            row.iter()
                .map(|(col, value)| (col + col_offset, *value))
                .collect()
        })
        .collect()
}

/// Column sums of a matrix whose rows are scaled by `mask`
pub fn masked_column_sums(matrix: &CsMat<f64>, mask: &[f64]) -> Vec<f64> {
    let mut sums = vec![0.0; matrix.cols()];
    for (row, values) in matrix.outer_iterator().enumerate() {
        for (col, value) in values.iter() {
            sums[col] += mask[row] * value;
        }
    }
    sums
}
