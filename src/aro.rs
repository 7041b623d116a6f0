use crate::constraints::{self, TankDemand};
use crate::error::{check_len, AroError};
use crate::evaluation;
use crate::index::DecisionIndex;
use crate::input::Config;
use crate::ldr::{AffinePolicy, DecisionRule};
use crate::network::{Network, Tank};
use crate::power;
use crate::robust::{RobustConstraint, RobustModel};
use crate::schedule::{self, Schedule};
use crate::solver::HighsModelStatus;
use crate::uncertainty::{UncertaintyModel, UncertaintySet};
use crate::utils;
use std::fmt;

/// Stable outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Loaded,
    Optimal,
    Infeasible,
    InfeasibleOrUnbounded,
    Unbounded,
    Unknown,
}

impl From<HighsModelStatus> for SolveStatus {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            HighsModelStatus::NotSet => SolveStatus::Loaded,
            HighsModelStatus::Optimal => SolveStatus::Optimal,
            HighsModelStatus::Infeasible => SolveStatus::Infeasible,
            HighsModelStatus::UnboundedOrInfeasible => {
                SolveStatus::InfeasibleOrUnbounded
            }
            HighsModelStatus::Unbounded => SolveStatus::Unbounded,
            _ => SolveStatus::Unknown,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SolveStatus::Loaded => "LOADED",
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::InfeasibleOrUnbounded => "INF_OR_UNBD",
            SolveStatus::Unbounded => "UNBOUNDED",
            SolveStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Adaptive robust operation model of a network.
///
/// The decision vector and the causal decision rule are declared on
/// construction; [`Aro::build`] appends constraints and the objective,
/// [`Aro::solve`] solves once and the resulting policy can then be
/// evaluated for any number of realizations.
pub struct Aro {
    pub network: Network,
    index: DecisionIndex,
    model: RobustModel,
    config: Config,
    uncertainty: Option<UncertaintyModel>,
    /// Tanks with uncertain demand, in uncertainty model order, which is
    /// the order `k` of `z[t * K + k]`, `sigma` and `delta`
    utanks: Vec<String>,
    /// `T x K` nominal demand of the uncertain tanks
    nominal_demands: Vec<Vec<f64>>,
    policy: Option<AffinePolicy>,
}

impl Aro {
    pub fn new(
        network: Network,
        uncertainty: Option<UncertaintyModel>,
        config: Config,
    ) -> Result<Self, AroError> {
        if let Some(u) = &uncertainty {
            u.validate(&network)?;
        }
        let utanks: Vec<String> = match &uncertainty {
            Some(u) => u.element_names().into_iter().map(String::from).collect(),
            None => vec![],
        };
        let nominal_demands = (0..network.num_steps)
            .map(|t| {
                utanks
                    .iter()
                    .map(|name| network.tank(name).map(|tank| tank.demand[t]))
                    .collect::<Result<Vec<f64>, AroError>>()
            })
            .collect::<Result<Vec<Vec<f64>>, AroError>>()?;

        let index = DecisionIndex::new(&network);
        let rule = DecisionRule::causal(&index, utanks.len());
        tracing::info!(
            "Declared {} decisions, {} uncertain entries and {} rule coefficients",
            rule.num_x(),
            rule.num_z(),
            rule.num_coefficients()
        );
        let set = UncertaintySet::new(config.uset_type, config.robustness);
        let model = RobustModel::new(rule, set);

        Ok(Self {
            network,
            index,
            model,
            config,
            uncertainty,
            utanks,
            nominal_demands,
            policy: None,
        })
    }

    pub fn index(&self) -> &DecisionIndex {
        &self.index
    }

    pub fn model(&self) -> &RobustModel {
        &self.model
    }

    pub fn uncertainty(&self) -> Option<&UncertaintyModel> {
        self.uncertainty.as_ref()
    }

    pub fn utanks(&self) -> &[String] {
        &self.utanks
    }

    pub fn nominal_demands(&self) -> &[Vec<f64>] {
        &self.nominal_demands
    }

    /// Length of the flattened uncertain vector
    pub fn num_z(&self) -> usize {
        self.model.rule().num_z()
    }

    pub fn get_x_idx(&self, name: &str) -> Result<(usize, usize), AroError> {
        self.index.get_x_idx(name)
    }

    fn append(&mut self, family: &str, constraints: Vec<RobustConstraint>) {
        tracing::debug!("Appending {} {} constraints", constraints.len(), family);
        self.model.st_all(constraints);
    }

    pub fn build(&mut self, schedule: &Schedule) -> Result<(), AroError> {
        let range = constraints::range_constraints(&self.network, &self.index)?;
        self.append("range", range);
        let exclusivity = constraints::one_comb_only(&self.network, &self.index)?;
        self.append("exclusivity", exclusivity);
        self.build_mass_balance()?;
        let volume = schedule::vsp_volume(
            &self.network,
            &self.index,
            &schedule.volume_targets,
        )?;
        self.append("volume target", volume);
        let changes = schedule::vsp_changes(
            &self.network,
            &self.index,
            &schedule.no_change_windows,
        )?;
        self.append("no change", changes);
        if self.config.max_power {
            let rows = power::max_power(
                &mut self.model,
                &self.network,
                &self.index,
                &schedule.max_power_limits,
            )?;
            tracing::debug!("Appending {} max power constraints", rows);
        }
        self.objective_func()?;
        tracing::info!(
            "Built model with {} constraints and {} helper variables",
            self.model.num_constraints(),
            self.model.num_helpers()
        );
        Ok(())
    }

    /// Mass balance of the uncertain tanks, with demand scaled by the
    /// uncertain vector, and of the remaining tanks at nominal demand.
    pub fn build_mass_balance(&mut self) -> Result<(), AroError> {
        let utanks = self
            .utanks
            .iter()
            .map(|name| self.network.tank(name))
            .collect::<Result<Vec<&Tank>, AroError>>()?;
        let dtanks: Vec<&Tank> = self
            .network
            .tanks
            .iter()
            .filter(|t| !self.utanks.contains(&t.name))
            .collect();

        let delta = match (&self.uncertainty, self.config.affine_demand_correction) {
            (Some(u), true) => {
                if u.delta.is_none() {
                    tracing::warn!(
                        "Affine demand correction enabled without a delta map"
                    );
                }
                u.delta.as_ref()
            }
            _ => None,
        };
        let uncertain = constraints::mass_balance(
            &self.network,
            &self.index,
            &utanks,
            TankDemand::Uncertain {
                lou: self.config.lou,
                delta,
            },
        )?;
        let deterministic = constraints::mass_balance(
            &self.network,
            &self.index,
            &dtanks,
            TankDemand::Deterministic,
        )?;
        self.append("uncertain mass balance", uncertain);
        self.append("deterministic mass balance", deterministic);
        Ok(())
    }

    /// Cost of every position of the decision vector
    pub fn cost_vector(&self) -> Result<Vec<f64>, AroError> {
        let mut costs = vec![0.0; self.index.len()];
        for element in self.network.cost_elements() {
            let (xmin_idx, xmax_idx) = self.index.get_x_idx(&element.name)?;
            costs[xmin_idx..xmax_idx].copy_from_slice(&element.cost);
        }
        Ok(costs)
    }

    pub fn objective_func(&mut self) -> Result<(), AroError> {
        let costs: Vec<(usize, f64)> = self
            .cost_vector()?
            .into_iter()
            .enumerate()
            .filter(|(_, c)| *c != 0.0)
            .collect();
        self.model.minmax(costs, self.config.worst_case);
        Ok(())
    }

    /// Solves the model and, when optimal, extracts the nominal policy
    /// into the network. Any status other than optimal leaves the
    /// objective and the policy empty.
    pub fn solve(&mut self) -> Result<(SolveStatus, Option<f64>), AroError> {
        let solution = self.model.solve(self.config.time_limit)?;
        let status = SolveStatus::from(solution.status);
        tracing::info!("Solver finished with status {}", status);
        self.policy = solution.policy;
        if status == SolveStatus::Optimal {
            self.get_results(None)?;
        }
        Ok((status, solution.objective))
    }

    pub fn policy(&self) -> Result<&AffinePolicy, AroError> {
        self.policy.as_ref().ok_or(AroError::NotSolved)
    }

    /// `num_x x num_z` coefficients of the solved rule, zero where a
    /// decision does not observe an uncertain entry
    pub fn get_ldr_constants(&self) -> Result<Vec<Vec<f64>>, AroError> {
        Ok(self.policy()?.ldr_coefficients())
    }

    /// `x0 + X z` from the dense rule coefficients
    pub fn get_x_values(&self, sample: Option<&[f64]>) -> Result<Vec<f64>, AroError> {
        let policy = self.policy()?;
        let coefficients = policy.ldr_coefficients();
        match sample {
            None => Ok(policy.nominal()),
            Some(z) => {
                check_len("uncertain sample", self.num_z(), z.len())?;
                Ok(policy
                    .constants()
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(x0, row)| x0 + utils::dot_product(row, z))
                    .collect())
            }
        }
    }

    /// Decisions of the solved policy for a realization, nominal when
    /// `sample` is `None`
    pub fn retrieve_decision_vars(
        &self,
        sample: Option<&[f64]>,
    ) -> Result<Vec<f64>, AroError> {
        let policy = self.policy()?;
        match sample {
            Some(z) => policy.evaluate(z),
            None => Ok(policy.nominal()),
        }
    }

    /// Writes the decisions for a realization on every element and on the
    /// flat value column, then recomputes the tank trajectories.
    pub fn get_results(&mut self, sample: Option<&[f64]>) -> Result<(), AroError> {
        let x = self.retrieve_decision_vars(sample)?;
        for block in self.index.blocks() {
            let element = self.network.flow_element_mut(&block.name)?;
            element.value = x[block.min_idx..block.max_idx].to_vec();
        }
        self.network.value = x;
        self.tanks_balance()
    }

    /// Recomputes inflow and volume of every tank from the extracted flows
    /// at nominal demand
    pub fn tanks_balance(&mut self) -> Result<(), AroError> {
        for position in 0..self.network.tanks.len() {
            let tank = &self.network.tanks[position];
            let inflow = evaluation::tank_inflow(
                &self.network,
                &self.index,
                tank,
                &self.network.value,
            )?;
            let volume =
                evaluation::tank_volume(tank.initial_vol, &inflow, &tank.demand);
            let tank = &mut self.network.tanks[position];
            tank.inflow = inflow;
            tank.value = volume;
        }
        Ok(())
    }

    pub fn set_vars_by_sample(&mut self, sample: &[f64]) -> Result<(), AroError> {
        self.get_results(Some(sample))
    }

    /// Cost of the decisions currently written on the network
    pub fn get_objective_by_sample(&self) -> Result<f64, AroError> {
        let costs = self.cost_vector()?;
        check_len("value", costs.len(), self.network.value.len())?;
        Ok(utils::dot_product(&costs, &self.network.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::fixtures::*;
    use crate::schedule::MaxPowerLimit;
    use crate::uncertainty::{UncertainElement, UncertaintySetType};
    use nalgebra::DMatrix;

    fn config(robustness: f64) -> Config {
        Config {
            robustness,
            lou: 0.1,
            ..Config::default()
        }
    }

    fn demand_uncertainty(num_steps: usize) -> UncertaintyModel {
        UncertaintyModel {
            elements: vec![UncertainElement {
                name: "T1".to_string(),
            }],
            sigma: DMatrix::from_diagonal_element(num_steps, num_steps, 0.01),
            delta: None,
        }
    }

    fn solved_single_tank() -> Aro {
        let network = single_tank_network();
        let mut aro = Aro::new(network, None, config(0.0)).unwrap();
        aro.build(&Schedule::default()).unwrap();
        let (status, _) = aro.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        aro
    }

    #[test]
    fn test_status_names() {
        assert_eq!(SolveStatus::Optimal.to_string(), "OPTIMAL");
        assert_eq!(SolveStatus::InfeasibleOrUnbounded.to_string(), "INF_OR_UNBD");
        assert_eq!(
            SolveStatus::from(HighsModelStatus::ReachedTimeLimit),
            SolveStatus::Unknown
        );
        assert_eq!(
            SolveStatus::from(HighsModelStatus::NotSet),
            SolveStatus::Loaded
        );
    }

    #[test]
    fn test_single_tank_nominal_solve() {
        let aro = solved_single_tank();
        let vsp = aro.network.flow_element("VSP1").unwrap();
        // reaching the final volume 12 from 10 costs exactly 2
        let total: f64 = vsp.value.iter().sum();
        assert!((total - 2.0).abs() < 1e-6);
        let tank = aro.network.tank("T1").unwrap();
        for v in tank.value.iter() {
            assert!(*v >= 5.0 - 1e-6 && *v <= 20.0 + 1e-6);
        }
        assert!((tank.value[2] - 12.0).abs() < 1e-6);
        for q in vsp.value.iter() {
            assert!(*q >= -1e-6 && *q <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_single_tank_objective() {
        let network = single_tank_network();
        let mut aro = Aro::new(network, None, config(0.0)).unwrap();
        aro.build(&Schedule::default()).unwrap();
        let (status, objective) = aro.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        assert!((objective.unwrap() - 2.0).abs() < 1e-6);
        assert!((aro.get_objective_by_sample().unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_final_volume_is_a_status() {
        let mut network = single_tank_network();
        // three unit steps cannot lift 10 to 20
        network.tanks[0].final_vol = 20.0;
        let mut aro = Aro::new(network, None, config(0.0)).unwrap();
        aro.build(&Schedule::default()).unwrap();
        let (status, objective) = aro.solve().unwrap();
        assert_ne!(status, SolveStatus::Optimal);
        assert!(objective.is_none());
        assert!(matches!(aro.policy(), Err(AroError::NotSolved)));
    }

    #[test]
    fn test_pump_station_selects_one_state() {
        let network = pump_station_network();
        let mut aro = Aro::new(network, None, config(0.0)).unwrap();
        aro.build(&Schedule::default()).unwrap();
        let (status, _) = aro.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        let station = aro.network.flow_element("PS1").unwrap();
        for t in 0..2 {
            let active = station.value[2 * t] + station.value[2 * t + 1];
            assert!(active <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_max_power_blocks_off_peak_pumping() {
        let network = pump_station_network();
        let mut cfg = config(0.0);
        cfg.max_power = true;
        let mut aro = Aro::new(network, None, cfg).unwrap();
        let schedule = Schedule {
            max_power_limits: vec![MaxPowerLimit {
                name: "E1".to_string(),
                max_power_on: 10.0,
                max_power_off: 0.0,
            }],
            ..Schedule::default()
        };
        aro.build(&schedule).unwrap();
        let (status, _) = aro.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        let station = aro.network.flow_element("PS1").unwrap();
        // the second step is off peak with no power available
        assert!(station.value[3].abs() < 1e-6);
    }

    #[test]
    fn test_tank_balance_matches_enforced_bounds() {
        let network = pump_station_network();
        let mut aro = Aro::new(network, None, config(0.0)).unwrap();
        aro.build(&Schedule::default()).unwrap();
        aro.solve().unwrap();
        let tank = aro.network.tank("T1").unwrap();
        for t in 0..2 {
            let (min_vol, max_vol) = tank.volume_bounds(t);
            assert!(tank.value[t] >= min_vol - 1e-6);
            assert!(tank.value[t] <= max_vol + 1e-6);
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let mut aro = solved_single_tank();
        let first = aro.network.value.clone();
        aro.get_results(None).unwrap();
        assert_eq!(first, aro.network.value);
    }

    #[test]
    fn test_adaptive_policy_is_causal() {
        let network = single_tank_network();
        let mut aro = Aro::new(
            network,
            Some(demand_uncertainty(3)),
            Config {
                uset_type: UncertaintySetType::Box,
                ..config(0.5)
            },
        )
        .unwrap();
        aro.build(&Schedule::default()).unwrap();
        let (status, _) = aro.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);

        let (xmin_idx, _) = aro.get_x_idx("VSP1").unwrap();
        let base = aro.retrieve_decision_vars(Some(&[0.1, 0.2, 0.3])).unwrap();
        let moved = aro.retrieve_decision_vars(Some(&[0.1, 0.2, -0.9])).unwrap();
        // z at the last step is never observed
        assert_eq!(base, moved);
        let moved = aro.retrieve_decision_vars(Some(&[0.1, 0.7, 0.3])).unwrap();
        assert_eq!(base[xmin_idx], moved[xmin_idx]);
        assert_eq!(base[xmin_idx + 1], moved[xmin_idx + 1]);

        let dense = aro.get_x_values(Some(&[0.1, 0.2, 0.3])).unwrap();
        for (a, b) in dense.iter().zip(base.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unknown_element_lookup() {
        let aro = Aro::new(single_tank_network(), None, config(0.0)).unwrap();
        assert!(matches!(
            aro.get_x_idx("P9"),
            Err(AroError::UnknownElement(_))
        ));
    }

    #[test]
    fn test_nominal_demands_layout() {
        let network = pump_station_network();
        let uncertainty = demand_uncertainty(2);
        let aro = Aro::new(network, Some(uncertainty), config(0.1)).unwrap();
        assert_eq!(aro.utanks(), &["T1".to_string()]);
        assert_eq!(aro.nominal_demands(), &[vec![2.0], vec![2.0]]);
        assert_eq!(aro.num_z(), 2);
    }

    #[test]
    fn test_mass_balance_is_built_once_per_tank_set() {
        let mut aro = Aro::new(
            pump_station_network(),
            Some(demand_uncertainty(2)),
            config(0.1),
        )
        .unwrap();
        aro.build_mass_balance().unwrap();
        // two bounds per step for the only tank, which is uncertain
        assert_eq!(aro.model().num_constraints(), 4);
        assert!(aro.model().constraints()[0].rhs.uncertain.len() == 1);
    }

    #[test]
    fn test_uncertain_tanks_follow_uncertainty_model_order() {
        let uncertainty = UncertaintyModel {
            elements: vec![
                UncertainElement {
                    name: "T2".to_string(),
                },
                UncertainElement {
                    name: "T1".to_string(),
                },
            ],
            sigma: DMatrix::from_diagonal_element(4, 4, 0.01),
            delta: None,
        };
        let mut aro =
            Aro::new(two_tank_network(), Some(uncertainty), config(0.1)).unwrap();
        assert_eq!(aro.utanks(), &["T2".to_string(), "T1".to_string()]);
        assert_eq!(aro.nominal_demands(), &[vec![3.0, 1.0], vec![3.0, 1.0]]);

        aro.build_mass_balance().unwrap();
        let constraints = aro.model().constraints();
        // T2 is source 0 and T1 is source 1 of z[t * 2 + k]
        assert_eq!(constraints[0].rhs.uncertain, vec![(0, 0.1 * 3.0)]);
        assert_eq!(constraints[2].rhs.uncertain, vec![(2, 0.1 * 6.0)]);
        assert_eq!(constraints[4].rhs.uncertain, vec![(1, 0.1 * 1.0)]);
        assert_eq!(constraints[6].rhs.uncertain, vec![(3, 0.1 * 2.0)]);

        let t1 = aro.network.tank("T1").unwrap();
        let demand = evaluation::realized_demand(&aro, t1, &[0.5, 0.25, 0.5, 0.125]);
        assert_eq!(demand, vec![1.25, 1.125]);
    }

    #[test]
    fn test_affine_correction_without_delta_still_builds() {
        let mut cfg = config(0.1);
        cfg.affine_demand_correction = true;
        let mut aro = Aro::new(
            pump_station_network(),
            Some(demand_uncertainty(2)),
            cfg,
        )
        .unwrap();
        aro.build(&Schedule::default()).unwrap();
        let (status, _) = aro.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);
    }

    #[test]
    fn test_affine_correction_uses_delta() {
        let mut uncertainty = demand_uncertainty(2);
        uncertainty.delta = Some(DMatrix::from_row_slice(2, 2, &[0.0, 0.5, 0.0, 0.0]));
        let mut cfg = config(0.1);
        cfg.affine_demand_correction = true;
        let mut aro =
            Aro::new(pump_station_network(), Some(uncertainty.clone()), cfg).unwrap();
        aro.build_mass_balance().unwrap();
        assert_eq!(
            aro.model().constraints()[0].rhs.uncertain,
            vec![(0, 0.1 * 2.0), (1, 0.5)]
        );

        // the map is ignored unless the correction is requested
        let mut aro =
            Aro::new(pump_station_network(), Some(uncertainty), config(0.1)).unwrap();
        aro.build_mass_balance().unwrap();
        assert_eq!(
            aro.model().constraints()[0].rhs.uncertain,
            vec![(0, 0.1 * 2.0)]
        );
    }

    #[test]
    fn test_worst_case_objective_is_not_below_nominal() {
        let objective = |worst_case: bool| {
            let cfg = Config {
                worst_case,
                ..config(0.5)
            };
            let mut aro = Aro::new(
                pump_station_network(),
                Some(demand_uncertainty(2)),
                cfg,
            )
            .unwrap();
            aro.build(&Schedule::default()).unwrap();
            let (status, objective) = aro.solve().unwrap();
            assert_eq!(status, SolveStatus::Optimal);
            objective.unwrap()
        };
        let nominal = objective(false);
        let worst = objective(true);
        assert!(worst >= nominal - 1e-6);
    }
}
