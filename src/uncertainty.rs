use crate::error::{check_len, AroError};
use crate::network::{ElementKind, Network};
use nalgebra::DMatrix;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

/// Norm family of the uncertainty set `{z : norm(z) <= robustness}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UncertaintySetType {
    /// infinity-norm ball
    #[default]
    Box,
    /// 1-norm ball
    Budget,
    /// 2-norm ball
    Ellipsoidal,
}

/// The set a robust constraint must hold against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UncertaintySet {
    /// The single realization `z = 0`
    Nominal,
    Ball {
        kind: UncertaintySetType,
        robustness: f64,
    },
}

impl UncertaintySet {
    pub fn new(kind: UncertaintySetType, robustness: f64) -> Self {
        UncertaintySet::Ball { kind, robustness }
    }

    /// Radius of the set, zero for the nominal point
    pub fn radius(&self) -> f64 {
        match self {
            UncertaintySet::Nominal => 0.0,
            UncertaintySet::Ball { robustness, .. } => *robustness,
        }
    }

    /// How the support function `max_{z in set} w'z` is represented in
    /// the LP.
    ///
    /// The 2-norm ball of radius `r` in `n` dimensions is replaced by its
    /// polyhedral outer bound `{||z||_inf <= r} ∩ {||z||_1 <= r sqrt(n)}`,
    /// which keeps the counterpart linear. It never admits less than the
    /// 2-norm ball and matches it for `w` along an axis or along the
    /// all-ones diagonal.
    pub fn dual_norm(&self) -> DualNorm {
        match self {
            UncertaintySet::Nominal => DualNorm::One,
            UncertaintySet::Ball { kind, .. } => match kind {
                UncertaintySetType::Box => DualNorm::One,
                UncertaintySetType::Budget => DualNorm::Inf,
                UncertaintySetType::Ellipsoidal => DualNorm::OneInf,
            },
        }
    }
}

/// Representation of the support function `r * ||w||_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualNorm {
    /// `r * ||w||_1`, dual of the box
    One,
    /// `r * ||w||_inf`, dual of the budget
    Inf,
    /// `min_{p} r * ||p||_1 + r sqrt(n) * ||w - p||_inf`, dual of the box
    /// intersected with the scaled budget
    OneInf,
}

/// Descriptor of one element affected by an uncertain quantity
#[derive(Debug, Clone, Deserialize)]
pub struct UncertainElement {
    pub name: String,
}

/// Uncertainty model of one quantity (e.g. demand).
///
/// `sigma` is the covariance of the flattened uncertain vector, laid out
/// as `t * K + k` for step `t` and element `k`. The optional `delta` maps
/// the flattened vector to the mass-balance rows of the affected tanks,
/// ordered tank then step.
#[derive(Debug, Clone, Deserialize)]
pub struct UncertaintyModel {
    pub elements: Vec<UncertainElement>,
    #[serde(deserialize_with = "dense_rows")]
    pub sigma: DMatrix<f64>,
    #[serde(default, deserialize_with = "optional_dense_rows")]
    pub delta: Option<DMatrix<f64>>,
}

/// Builds a matrix from a list of rows, rejecting ragged input
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, AroError> {
    let num_cols = rows.first().map_or(0, |r| r.len());
    for row in rows.iter() {
        check_len("matrix row", num_cols, row.len())?;
    }
    Ok(DMatrix::from_fn(rows.len(), num_cols, |i, j| rows[i][j]))
}

fn dense_rows<'de, D: Deserializer<'de>>(d: D) -> Result<DMatrix<f64>, D::Error> {
    let rows = Vec::<Vec<f64>>::deserialize(d)?;
    matrix_from_rows(&rows).map_err(serde::de::Error::custom)
}

fn optional_dense_rows<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DMatrix<f64>>, D::Error> {
    match Option::<Vec<Vec<f64>>>::deserialize(d)? {
        Some(rows) => matrix_from_rows(&rows)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl UncertaintyModel {
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.name.as_str()).collect()
    }

    /// Checks the model against the network horizon
    pub fn validate(&self, network: &Network) -> Result<(), AroError> {
        let mut seen = HashSet::new();
        for element in self.elements.iter() {
            if !seen.insert(element.name.as_str()) {
                return Err(AroError::InvalidInput(format!(
                    "uncertain demand element {} is listed twice",
                    element.name
                )));
            }
            match network.lookup(&element.name)? {
                (ElementKind::Tank, _) => (),
                _ => {
                    return Err(AroError::InvalidInput(format!(
                        "uncertain demand element {} is not a tank",
                        element.name
                    )))
                }
            }
        }
        let dim = network.num_steps * self.elements.len();
        check_len("sigma", dim, self.sigma.nrows())?;
        check_len("sigma", dim, self.sigma.ncols())?;
        if let Some(delta) = &self.delta {
            check_len("delta", dim, delta.nrows())?;
            check_len("delta", dim, delta.ncols())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::fixtures::single_tank_network;

    fn model(names: &[&str], sigma: DMatrix<f64>) -> UncertaintyModel {
        UncertaintyModel {
            elements: names
                .iter()
                .map(|n| UncertainElement {
                    name: n.to_string(),
                })
                .collect(),
            sigma,
            delta: None,
        }
    }

    #[test]
    fn test_dual_norm_per_set_type() {
        let dual = |kind| UncertaintySet::new(kind, 1.0).dual_norm();
        assert_eq!(dual(UncertaintySetType::Box), DualNorm::One);
        assert_eq!(dual(UncertaintySetType::Budget), DualNorm::Inf);
        assert_eq!(dual(UncertaintySetType::Ellipsoidal), DualNorm::OneInf);
    }

    #[test]
    fn test_nominal_set() {
        let set = UncertaintySet::Nominal;
        assert_eq!(set.radius(), 0.0);
        assert_eq!(set.dual_norm(), DualNorm::One);
    }

    #[test]
    fn test_deserialize_set_type() {
        let kind: UncertaintySetType =
            serde_json::from_str("\"ellipsoidal\"").unwrap();
        assert_eq!(kind, UncertaintySetType::Ellipsoidal);
    }

    #[test]
    fn test_deserialize_dense_rows() {
        let model: UncertaintyModel = serde_json::from_str(
            r#"{"elements": [{"name": "T1"}], "sigma": [[1.0, 0.5], [0.5, 2.0]]}"#,
        )
        .unwrap();
        assert_eq!(model.sigma[(0, 1)], 0.5);
        assert_eq!(model.sigma[(1, 1)], 2.0);
        assert!(model.delta.is_none());
    }

    #[test]
    fn test_deserialize_rejects_ragged_sigma() {
        let parsed: Result<UncertaintyModel, _> = serde_json::from_str(
            r#"{"elements": [{"name": "T1"}], "sigma": [[1.0, 0.5], [0.5]]}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_sigma_shape() {
        let network = single_tank_network();
        let model = model(&["T1"], DMatrix::zeros(2, 3));
        assert!(matches!(
            model.validate(&network),
            Err(AroError::Shape { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_tank() {
        let network = single_tank_network();
        let model = model(&["VSP1"], DMatrix::zeros(3, 3));
        assert!(matches!(
            model.validate(&network),
            Err(AroError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_repeated_element() {
        let network = single_tank_network();
        let model = model(&["T1", "T1"], DMatrix::zeros(6, 6));
        assert!(matches!(
            model.validate(&network),
            Err(AroError::InvalidInput(_))
        ));
    }
}
