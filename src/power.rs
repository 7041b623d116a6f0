//! Optional max-power limits. Every decision of a power station member is
//! linked to a binary indicator, and the power drawn by the selected
//! indicators is capped per step by the tariff-dependent limit.

use crate::error::{check_len, AroError};
use crate::index::DecisionIndex;
use crate::matrix::{self, FlowDirection};
use crate::network::{Network, Tariff};
use crate::robust::{AffineRhs, ConstraintSense, RobustConstraint, RobustModel};
use crate::schedule::MaxPowerLimit;

pub fn max_power(
    model: &mut RobustModel,
    network: &Network,
    index: &DecisionIndex,
    limits: &[MaxPowerLimit],
) -> Result<usize, AroError> {
    let num_steps = index.num_steps();
    let mut num_rows = 0;
    for limit in limits.iter() {
        let station = network.power_station(&limit.name)?;
        let mut step_power: Vec<Vec<(usize, f64)>> = vec![vec![]; num_steps];

        for name in station.elements.iter() {
            let element = network.flow_element(name)?;
            let (xmin_idx, xmax_idx) = index.get_x_idx(name)?;
            let size = xmax_idx - xmin_idx;
            check_len(name, size, element.power.len())?;

            let first = model.add_binaries(size);
            for k in 0..size {
                model.st(
                    RobustConstraint::new(
                        vec![(xmin_idx + k, 1.0)],
                        ConstraintSense::Le,
                        AffineRhs::constant(0.0),
                    )
                    .with_helpers(vec![(first + k, -1.0)])
                    .nominal(),
                );
            }
            num_rows += size;

            let power = matrix::comb_matrix(
                num_steps,
                element.width(),
                FlowDirection::In,
                Some(&element.power),
            );
            for (t, terms) in matrix::row_terms(&power, first).into_iter().enumerate()
            {
                step_power[t].extend(terms);
            }
        }

        for (t, terms) in step_power.into_iter().enumerate() {
            let cap = match network.tariff_at(t) {
                Tariff::On => limit.max_power_on,
                Tariff::Off => limit.max_power_off,
            };
            model.st(
                RobustConstraint::new(vec![], ConstraintSense::Le, AffineRhs::constant(cap))
                    .with_helpers(terms)
                    .nominal(),
            );
            num_rows += 1;
        }
    }
    Ok(num_rows)
}
