use crate::error::{check_len, AroError};
use crate::index::DecisionIndex;
use crate::matrix::{self, FlowDirection};
use crate::network::{FlowElement, Network, Tank};
use crate::robust::{AffineRhs, ConstraintSense, RobustConstraint};
use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};

fn bounds(
    min_idx: usize,
    max_idx: usize,
    lower: f64,
    upper: f64,
) -> Vec<RobustConstraint> {
    (min_idx..max_idx)
        .flat_map(|i| {
            [
                RobustConstraint::new(
                    vec![(i, 1.0)],
                    ConstraintSense::Ge,
                    AffineRhs::constant(lower),
                ),
                RobustConstraint::new(
                    vec![(i, 1.0)],
                    ConstraintSense::Le,
                    AffineRhs::constant(upper),
                ),
            ]
        })
        .collect()
}

/// Operating ranges: normalized utilization in `[0, 1]` for pump stations,
/// wells, control valves and valves; `[min_flow, max_flow]` for variable
/// speed pumps, with step 0 pinned to `init_flow` when it is given.
pub fn range_constraints(
    network: &Network,
    index: &DecisionIndex,
) -> Result<Vec<RobustConstraint>, AroError> {
    let mut constraints = vec![];
    let normalized = network
        .pump_stations()
        .chain(network.wells())
        .chain(network.control_valves())
        .chain(network.valves());
    for element in normalized {
        let (xmin_idx, xmax_idx) = index.get_x_idx(&element.name)?;
        constraints.extend(bounds(xmin_idx, xmax_idx, 0.0, 1.0));
    }

    for vsp in network.vsp() {
        let (xmin_idx, xmax_idx) = index.get_x_idx(&vsp.name)?;
        constraints.extend(bounds(xmin_idx, xmax_idx, vsp.min_flow, vsp.max_flow));
        if let Some(init_flow) = vsp.init_flow.filter(|f| !f.is_nan()) {
            constraints.push(RobustConstraint::new(
                vec![(xmin_idx, 1.0)],
                ConstraintSense::Eq,
                AffineRhs::constant(init_flow),
            ));
        }
    }
    Ok(constraints)
}

/// At most one discrete state active per step for every comb element
pub fn one_comb_only(
    network: &Network,
    index: &DecisionIndex,
) -> Result<Vec<RobustConstraint>, AroError> {
    let mut constraints = vec![];
    for station in network.comb_elements() {
        let (xmin_idx, xmax_idx) = index.get_x_idx(&station.name)?;
        let selector = matrix::selector_matrix(index.num_steps(), station.combs.len());
        check_len(&station.name, xmax_idx - xmin_idx, selector.cols())?;
        for terms in matrix::row_terms(&selector, xmin_idx) {
            constraints.push(RobustConstraint::new(
                terms,
                ConstraintSense::Le,
                AffineRhs::constant(1.0),
            ));
        }
    }
    Ok(constraints)
}

/// Cumulative contribution of an element to a tank: per-state flows for
/// comb elements, unit flows for continuous ones.
pub fn cumulative_flow_matrix(
    element: &FlowElement,
    direction: FlowDirection,
    num_steps: usize,
) -> Result<CsMat<f64>, AroError> {
    if element.has_combs() {
        check_len(
            &element.name,
            num_steps * element.combs.len(),
            element.flow.len(),
        )?;
        Ok(matrix::cumulative_comb_matrix(
            num_steps,
            element.combs.len(),
            direction,
            Some(&element.flow),
        ))
    } else {
        Ok(matrix::cumulative_not_comb_matrix(num_steps, direction))
    }
}

/// How tank demand enters the mass balance
#[derive(Debug, Clone, Copy)]
pub enum TankDemand<'a> {
    /// Fixed nominal cumulative demand
    Deterministic,
    /// Cumulative demand scaled by `(1 + lou * z)`. The tanks are the
    /// uncertain sources, in order; `delta` adds `delta @ z` to the
    /// stacked rows when present.
    Uncertain {
        lou: f64,
        delta: Option<&'a DMatrix<f64>>,
    },
}

/// Stacks the cumulative flow rows of every tank against the whole
/// decision vector, one row per tank and step.
fn stacked_flow_matrix(
    network: &Network,
    index: &DecisionIndex,
    tanks: &[&Tank],
) -> Result<CsMat<f64>, AroError> {
    let num_steps = index.num_steps();
    let mut triplets = TriMat::new((tanks.len() * num_steps, index.len()));
    for (tank_idx, tank) in tanks.iter().enumerate() {
        for block in index.blocks() {
            // elements not connected to the tank are ignored
            let direction = match tank.flow_direction(&block.name) {
                Some(sign) => FlowDirection::from_sign(sign),
                None => continue,
            };
            let element = network.flow_element(&block.name)?;
            let mat = cumulative_flow_matrix(element, direction, num_steps)?;
            check_len(&block.name, block.max_idx - block.min_idx, mat.cols())?;
            for (row, values) in mat.outer_iterator().enumerate() {
                for (col, value) in values.iter() {
                    triplets.add_triplet(
                        tank_idx * num_steps + row,
                        block.min_idx + col,
                        *value,
                    );
                }
            }
        }
    }
    Ok(triplets.to_csr())
}

/// Volume bounds on every tank and step over the cumulative net inflow:
///
/// ```text
/// min_vol[t+1] <= initial_vol + cumsum(inflow)[t] - cumsum(demand)[t] <= max_vol[t]
/// ```
///
/// with the minimum of the last step replaced by `final_vol`.
pub fn mass_balance(
    network: &Network,
    index: &DecisionIndex,
    tanks: &[&Tank],
    demand: TankDemand,
) -> Result<Vec<RobustConstraint>, AroError> {
    if tanks.is_empty() {
        return Ok(vec![]);
    }
    let num_steps = index.num_steps();
    let num_sources = tanks.len();
    let lhs = stacked_flow_matrix(network, index, tanks)?;
    let rows = matrix::row_terms(&lhs, 0);

    if let TankDemand::Uncertain {
        delta: Some(delta), ..
    } = demand
    {
        check_len("delta", num_sources * num_steps, delta.nrows())?;
    }

    let mut constraints = Vec::with_capacity(2 * rows.len());
    for (tank_idx, tank) in tanks.iter().enumerate() {
        let dem = tank.cumulative_demand();
        for t in 0..num_steps {
            let row = tank_idx * num_steps + t;
            let (min_vol, max_vol) = tank.volume_bounds(t);

            let uncertain: Vec<(usize, f64)> = match demand {
                TankDemand::Deterministic => vec![],
                TankDemand::Uncertain { lou, delta } => {
                    let mut terms = vec![(t * num_sources + tank_idx, lou * dem[t])];
                    if let Some(delta) = delta {
                        terms.extend(
                            delta
                                .row(row)
                                .iter()
                                .enumerate()
                                .filter(|(_, v)| **v != 0.0)
                                .map(|(j, v)| (j, *v)),
                        );
                    }
                    terms
                }
            };

            constraints.push(RobustConstraint::new(
                rows[row].clone(),
                ConstraintSense::Le,
                AffineRhs::with_uncertain(
                    max_vol + dem[t] - tank.initial_vol,
                    uncertain.clone(),
                ),
            ));
            constraints.push(RobustConstraint::new(
                rows[row].clone(),
                ConstraintSense::Ge,
                AffineRhs::with_uncertain(
                    min_vol + dem[t] - tank.initial_vol,
                    uncertain,
                ),
            ));
        }
    }
    Ok(constraints)
}
