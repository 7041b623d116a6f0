use crate::error::AroError;
use crate::network::{
    ElementKind, FlowElement, Network, PowerStation, Tank, Tariff,
};
use crate::schedule::{self, Schedule};
use crate::uncertainty::{UncertaintyModel, UncertaintySetType};
use chrono::Duration;
use serde::Deserialize;
use serde_json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_time_limit() -> f64 {
    300.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub robustness: f64,
    pub lou: f64,
    #[serde(default)]
    pub uset_type: UncertaintySetType,
    #[serde(default)]
    pub worst_case: bool,
    #[serde(default)]
    pub max_power: bool,
    #[serde(default)]
    pub affine_demand_correction: bool,
    #[serde(default)]
    pub num_simulation_scenarios: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            robustness: 0.0,
            lou: 0.0,
            uset_type: UncertaintySetType::default(),
            worst_case: false,
            max_power: false,
            affine_demand_correction: false,
            num_simulation_scenarios: 0,
            seed: 0,
            time_limit: default_time_limit(),
        }
    }
}

pub fn read_config_input(filepath: &str) -> Result<Config, AroError> {
    let contents = fs::read_to_string(filepath)?;
    let parsed: Config = serde_json::from_str(&contents)?;
    if parsed.robustness < 0.0 {
        return Err(AroError::InvalidInput(format!(
            "negative robustness {}",
            parsed.robustness
        )));
    }
    Ok(parsed)
}

/// A number broadcast over the horizon or an explicit series
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Series {
    Scalar(f64),
    Values(Vec<f64>),
}

impl Default for Series {
    fn default() -> Self {
        Series::Values(vec![])
    }
}

impl Series {
    /// Expands to `num_steps * width` values, time major. Accepts a
    /// scalar, one value per state, or the full series.
    pub fn expand(
        &self,
        name: &str,
        num_steps: usize,
        width: usize,
    ) -> Result<Vec<f64>, AroError> {
        match self {
            Series::Scalar(v) => Ok(vec![*v; num_steps * width]),
            Series::Values(values) if values.is_empty() => Ok(vec![]),
            Series::Values(values) if values.len() == num_steps * width => {
                Ok(values.clone())
            }
            Series::Values(values) if values.len() == width => {
                Ok(values.repeat(num_steps))
            }
            Series::Values(values) => Err(AroError::Shape {
                name: name.to_string(),
                expected: num_steps * width,
                found: values.len(),
            }),
        }
    }
}

#[derive(Deserialize)]
pub struct ElementInput {
    pub name: String,
    #[serde(default)]
    pub combs: Vec<String>,
    #[serde(default)]
    pub flow: Series,
    #[serde(default)]
    pub power: Series,
    #[serde(default)]
    pub cost: Series,
    pub min_flow: Option<f64>,
    pub max_flow: Option<f64>,
    pub init_flow: Option<f64>,
}

impl ElementInput {
    fn build(
        &self,
        kind: ElementKind,
        num_steps: usize,
    ) -> Result<FlowElement, AroError> {
        let mut element = FlowElement::new(&self.name, kind);
        element.combs = self.combs.clone();
        let width = element.width();
        element.flow = self.flow.expand(&self.name, num_steps, width)?;
        element.power = self.power.expand(&self.name, num_steps, width)?;
        element.cost = self.cost.expand(&self.name, num_steps, width)?;
        if let Some(min_flow) = self.min_flow {
            element.min_flow = min_flow;
        }
        if let Some(max_flow) = self.max_flow {
            element.max_flow = max_flow;
        }
        element.init_flow = self.init_flow;
        Ok(element)
    }
}

#[derive(Deserialize)]
pub struct TankInput {
    pub name: String,
    pub initial_vol: f64,
    pub min_vol: Series,
    pub max_vol: Series,
    pub final_vol: f64,
    #[serde(default)]
    pub demand: Series,
    #[serde(default)]
    pub inflows: Vec<String>,
    #[serde(default)]
    pub outflows: Vec<String>,
}

impl TankInput {
    fn build(&self, num_steps: usize) -> Result<Tank, AroError> {
        let demand = match self.demand.expand(&self.name, num_steps, 1)? {
            d if d.is_empty() => vec![0.0; num_steps],
            d => d,
        };
        let mut tank = Tank::new(
            &self.name,
            self.initial_vol,
            self.min_vol.expand(&self.name, num_steps, 1)?,
            self.max_vol.expand(&self.name, num_steps, 1)?,
            self.final_vol,
            demand,
        );
        for name in self.inflows.iter() {
            tank.add_inflow(name);
        }
        for name in self.outflows.iter() {
            tank.add_outflow(name);
        }
        Ok(tank)
    }
}

#[derive(Deserialize)]
pub struct PowerStationInput {
    pub name: String,
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TariffInput {
    On,
    Off,
}

impl From<TariffInput> for Tariff {
    fn from(tariff: TariffInput) -> Self {
        match tariff {
            TariffInput::On => Tariff::On,
            TariffInput::Off => Tariff::Off,
        }
    }
}

#[derive(Deserialize)]
pub struct NetworkInput {
    pub start: String,
    pub step_minutes: i64,
    pub num_steps: usize,
    #[serde(default)]
    pub tariff: Vec<TariffInput>,
    #[serde(default)]
    pub pump_stations: Vec<ElementInput>,
    #[serde(default)]
    pub vsp: Vec<ElementInput>,
    #[serde(default)]
    pub wells: Vec<ElementInput>,
    #[serde(default)]
    pub control_valves: Vec<ElementInput>,
    #[serde(default)]
    pub valves: Vec<ElementInput>,
    #[serde(default)]
    pub tanks: Vec<TankInput>,
    #[serde(default)]
    pub power_stations: Vec<PowerStationInput>,
}

pub fn read_network_input(filepath: &str) -> Result<NetworkInput, AroError> {
    let contents = fs::read_to_string(filepath)?;
    let parsed: NetworkInput = serde_json::from_str(&contents)?;
    Ok(parsed)
}

impl NetworkInput {
    pub fn build_network(&self) -> Result<Network, AroError> {
        let num_steps = self.num_steps;
        if num_steps == 0 || self.step_minutes <= 0 {
            return Err(AroError::InvalidInput(
                "the horizon needs at least one step of positive length"
                    .to_string(),
            ));
        }
        let start = schedule::parse_dayfirst(&self.start)?;
        let time_range = (0..num_steps)
            .map(|t| start + Duration::minutes(self.step_minutes * t as i64))
            .collect();

        let groups = [
            (ElementKind::PumpStation, &self.pump_stations),
            (ElementKind::Vsp, &self.vsp),
            (ElementKind::Well, &self.wells),
            (ElementKind::ControlValve, &self.control_valves),
            (ElementKind::Valve, &self.valves),
        ];
        let mut elements = vec![];
        for (kind, inputs) in groups.iter() {
            for input in inputs.iter() {
                elements.push(input.build(*kind, num_steps)?);
            }
        }

        let tanks = self
            .tanks
            .iter()
            .map(|t| t.build(num_steps))
            .collect::<Result<Vec<Tank>, AroError>>()?;
        let power_stations = self
            .power_stations
            .iter()
            .map(|p| PowerStation {
                name: p.name.clone(),
                elements: p.elements.clone(),
            })
            .collect();
        let tariff = self.tariff.iter().map(|t| Tariff::from(*t)).collect();

        Network::new(time_range, tariff, elements, tanks, power_stations)
    }
}

/// Uncertainty models by quantity name. The file is optional.
pub fn read_uncertainty_input(
    filepath: &str,
) -> Result<BTreeMap<String, UncertaintyModel>, AroError> {
    if !Path::new(filepath).exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(filepath)?;
    let parsed: BTreeMap<String, UncertaintyModel> =
        serde_json::from_str(&contents)?;
    Ok(parsed)
}

pub struct Input {
    pub config: Config,
    pub network: Network,
    /// Demand uncertainty, when given
    pub uncertainty: Option<UncertaintyModel>,
    pub schedule: Schedule,
}

impl Input {
    pub fn build(path: &str) -> Result<Self, AroError> {
        let config = read_config_input(&(path.to_owned() + "/config.json"))?;
        let network = read_network_input(&(path.to_owned() + "/network.json"))?
            .build_network()?;
        let mut uncertainties =
            read_uncertainty_input(&(path.to_owned() + "/uncertainty.json"))?;
        let uncertainty = uncertainties.remove("demand");
        for name in uncertainties.keys() {
            tracing::warn!("Ignoring uncertainty model for {}", name);
        }
        let schedule = Schedule::read(path)?;
        Ok(Self {
            config,
            network,
            uncertainty,
            schedule,
        })
    }
}
