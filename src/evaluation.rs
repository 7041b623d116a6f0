//! Tank trajectories recomputed from flows, and out-of-sample evaluation
//! of a solved policy over correlated demand samples.

use crate::aro::Aro;
use crate::error::{check_len, AroError};
use crate::index::DecisionIndex;
use crate::network::{Network, Tank};
use crate::utils;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Net inflow of a tank per step for a concrete decision vector: state
/// flow times state value for comb elements, the value itself for
/// continuous ones, signed by direction.
pub fn tank_inflow(
    network: &Network,
    index: &DecisionIndex,
    tank: &Tank,
    x: &[f64],
) -> Result<Vec<f64>, AroError> {
    let num_steps = index.num_steps();
    check_len("decision vector", index.len(), x.len())?;
    let mut inflow = vec![0.0; num_steps];
    let connections = tank
        .inflows
        .iter()
        .map(|name| (name, 1.0))
        .chain(tank.outflows.iter().map(|name| (name, -1.0)));
    for (name, sign) in connections {
        let element = network.flow_element(name)?;
        let (xmin_idx, xmax_idx) = index.get_x_idx(name)?;
        let block = &x[xmin_idx..xmax_idx];
        let width = element.width();
        for (t, q) in inflow.iter_mut().enumerate() {
            let step = &block[t * width..(t + 1) * width];
            let flow = if element.has_combs() {
                utils::dot_product(&element.flow[t * width..(t + 1) * width], step)
            } else {
                step[0]
            };
            *q += sign * flow;
        }
    }
    Ok(inflow)
}

/// `initial + cumsum(inflow - demand)`
pub fn tank_volume(initial_vol: f64, inflow: &[f64], demand: &[f64]) -> Vec<f64> {
    let net: Vec<f64> = inflow.iter().zip(demand.iter()).map(|(q, d)| q - d).collect();
    utils::cumsum(&net).into_iter().map(|v| initial_vol + v).collect()
}

/// Demand of a tank under a sample: nominal plus the sampled perturbation
/// for uncertain tanks, nominal otherwise.
pub fn realized_demand(aro: &Aro, tank: &Tank, sample: &[f64]) -> Vec<f64> {
    let num_sources = aro.utanks().len();
    match aro.utanks().iter().position(|name| *name == tank.name) {
        Some(k) => aro
            .nominal_demands()
            .iter()
            .enumerate()
            .map(|(t, row)| row[k] + sample[t * num_sources + k])
            .collect(),
        None => tank.demand.clone(),
    }
}

/// Cost and tank volumes of one realization
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub cost: f64,
    pub volumes: Vec<Vec<f64>>,
}

/// Evaluates the solved policy for one sample without touching the
/// network state.
pub fn evaluate_sample(
    aro: &Aro,
    costs: &[f64],
    sample: &[f64],
) -> Result<SampleOutcome, AroError> {
    let x = aro.retrieve_decision_vars(Some(sample))?;
    let cost = utils::dot_product(costs, &x);
    let volumes = aro
        .network
        .tanks
        .iter()
        .map(|tank| -> Result<Vec<f64>, AroError> {
            let inflow = tank_inflow(&aro.network, aro.index(), tank, &x)?;
            let demand = realized_demand(aro, tank, sample);
            Ok(tank_volume(tank.initial_vol, &inflow, &demand))
        })
        .collect::<Result<Vec<Vec<f64>>, AroError>>()?;
    Ok(SampleOutcome { cost, volumes })
}

/// Realized cost of every sample and the volume trajectory of every tank
/// under every sample, indexed `[sample][step]`.
pub fn analyze_sample(
    aro: &Aro,
    samples: &[Vec<f64>],
) -> Result<(Vec<f64>, BTreeMap<String, Vec<Vec<f64>>>), AroError> {
    let costs = aro.cost_vector()?;
    let outcomes = samples
        .par_iter()
        .map(|sample| evaluate_sample(aro, &costs, sample))
        .collect::<Result<Vec<SampleOutcome>, AroError>>()?;

    let mut tanks_vol: BTreeMap<String, Vec<Vec<f64>>> = aro
        .network
        .tanks
        .iter()
        .map(|t| (t.name.clone(), Vec::with_capacity(samples.len())))
        .collect();
    let mut sample_costs = Vec::with_capacity(samples.len());
    for outcome in outcomes.into_iter() {
        sample_costs.push(outcome.cost);
        for (tank, volume) in aro.network.tanks.iter().zip(outcome.volumes) {
            if let Some(v) = tanks_vol.get_mut(&tank.name) {
                v.push(volume);
            }
        }
    }
    Ok((sample_costs, tanks_vol))
}

/// Volume trajectory of a single tank under every sample
pub fn tank_vol_by_sample(
    aro: &Aro,
    tank_name: &str,
    samples: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>, AroError> {
    let tank = aro.network.tank(tank_name)?;
    samples
        .par_iter()
        .map(|sample| -> Result<Vec<f64>, AroError> {
            let x = aro.retrieve_decision_vars(Some(sample))?;
            let inflow = tank_inflow(&aro.network, aro.index(), tank, &x)?;
            let demand = realized_demand(aro, tank, sample);
            Ok(tank_volume(tank.initial_vol, &inflow, &demand))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TankSummary {
    pub name: String,
    pub min_volume: f64,
    pub max_volume: f64,
    /// Samples leaving the volume bounds at some step
    pub violations: usize,
}

#[derive(Debug, Clone)]
pub struct MonteCarloSummary {
    pub num_samples: usize,
    pub mean_cost: f64,
    pub std_cost: f64,
    pub tanks: Vec<TankSummary>,
}

pub fn summarize(
    network: &Network,
    costs: &[f64],
    tanks_vol: &BTreeMap<String, Vec<Vec<f64>>>,
    tol: f64,
) -> MonteCarloSummary {
    let (mean_cost, std_cost) = utils::mean_std(costs);
    let tanks = network
        .tanks
        .iter()
        .filter_map(|tank| {
            let volumes = tanks_vol.get(&tank.name)?;
            let all = volumes.iter().flatten();
            let min_volume = all.clone().fold(f64::INFINITY, |m, v| m.min(*v));
            let max_volume = all.fold(f64::NEG_INFINITY, |m, v| m.max(*v));
            let violations = volumes
                .iter()
                .filter(|trajectory| {
                    trajectory.iter().enumerate().any(|(t, v)| {
                        let (lower, upper) = tank.volume_bounds(t);
                        *v < lower - tol || *v > upper + tol
                    })
                })
                .count();
            Some(TankSummary {
                name: tank.name.clone(),
                min_volume,
                max_volume,
                violations,
            })
        })
        .collect();
    MonteCarloSummary {
        num_samples: costs.len(),
        mean_cost,
        std_cost,
        tanks,
    }
}
