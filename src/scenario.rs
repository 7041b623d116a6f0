use crate::error::{check_len, AroError};
use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256Plus;

/// Eigenvalues below `-EIGEN_TOLERANCE` times the largest magnitude make
/// a covariance indefinite.
const EIGEN_TOLERANCE: f64 = 1e-9;

/// Factor `L` with `L L' = sigma`.
///
/// Positive definite covariances get their lower Cholesky factor.
/// Semidefinite ones, e.g. perfectly correlated demands, fall back to
/// `V sqrt(max(lambda, 0))` from the symmetric eigendecomposition.
pub fn covariance_factor(sigma: &DMatrix<f64>) -> Result<DMatrix<f64>, AroError> {
    check_len("sigma", sigma.nrows(), sigma.ncols())?;
    if let Some(chol) = sigma.clone().cholesky() {
        return Ok(chol.l());
    }
    let eigen = sigma.clone().symmetric_eigen();
    let scale = eigen
        .eigenvalues
        .iter()
        .fold(1.0_f64, |m, v| m.max(v.abs()));
    if let Some(lambda) = eigen
        .eigenvalues
        .iter()
        .find(|v| **v < -EIGEN_TOLERANCE * scale)
    {
        return Err(AroError::InvalidInput(format!(
            "sigma is not positive semidefinite (eigenvalue {})",
            lambda
        )));
    }
    let roots = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
    Ok(eigen.eigenvectors * DMatrix::from_diagonal(&roots))
}

/// Draws `n` zero-mean samples with covariance `sigma`, each one a
/// flattened uncertain vector.
pub fn multivariate_normal(
    sigma: &DMatrix<f64>,
    n: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>, AroError> {
    let l = covariance_factor(sigma)?;
    let dim = sigma.nrows();
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let samples = (0..n)
        .map(|_| {
            let standard = DVector::<f64>::from_iterator(
                dim,
                (&mut rng).sample_iter(StandardNormal).take(dim),
            );
            (&l * standard).iter().copied().collect()
        })
        .collect();
    Ok(samples)
}
