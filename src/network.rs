use crate::error::{check_len, AroError};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Tag of every named element in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    PumpStation,
    Vsp,
    Well,
    ControlValve,
    Valve,
    Tank,
}

impl ElementKind {
    /// Pump stations and control valves are operated by selecting one of
    /// their discrete combinations.
    pub fn is_comb(&self) -> bool {
        matches!(self, ElementKind::PumpStation | ElementKind::ControlValve)
    }
}

/// Tariff period for a time step, used by the max-power limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tariff {
    On,
    Off,
}

/// A controllable element: pump station, variable speed pump, well,
/// control valve or valve.
///
/// The `flow`, `power` and `cost` series are aligned with the element's
/// block in the decision vector: `num_steps * width` values, time major.
#[derive(Debug, Clone)]
pub struct FlowElement {
    pub name: String,
    pub kind: ElementKind,
    pub combs: Vec<String>,
    pub flow: Vec<f64>,
    pub power: Vec<f64>,
    pub cost: Vec<f64>,
    pub min_flow: f64,
    pub max_flow: f64,
    pub init_flow: Option<f64>,
    pub value: Vec<f64>,
}

impl FlowElement {
    pub fn new(name: &str, kind: ElementKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            combs: vec![],
            flow: vec![],
            power: vec![],
            cost: vec![],
            min_flow: 0.0,
            max_flow: 1.0,
            init_flow: None,
            value: vec![],
        }
    }

    /// Number of decision positions per time step
    pub fn width(&self) -> usize {
        self.combs.len().max(1)
    }

    pub fn has_combs(&self) -> bool {
        !self.combs.is_empty()
    }

    pub fn has_cost(&self) -> bool {
        !self.cost.is_empty()
    }

    pub fn with_combs(mut self, combs: &[&str], flow: Vec<f64>) -> Self {
        self.combs = combs.iter().map(|c| c.to_string()).collect();
        self.flow = flow;
        self
    }

    pub fn with_cost(mut self, cost: Vec<f64>) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_power(mut self, power: Vec<f64>) -> Self {
        self.power = power;
        self
    }

    pub fn with_flow_range(
        mut self,
        min_flow: f64,
        max_flow: f64,
        init_flow: Option<f64>,
    ) -> Self {
        self.min_flow = min_flow;
        self.max_flow = max_flow;
        self.init_flow = init_flow;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Tank {
    pub name: String,
    pub initial_vol: f64,
    pub min_vol: Vec<f64>,
    pub max_vol: Vec<f64>,
    pub final_vol: f64,
    pub demand: Vec<f64>,
    pub inflows: Vec<String>,
    pub outflows: Vec<String>,
    /// Volume trajectory recomputed from the extracted flows
    pub value: Vec<f64>,
    /// Net inflow per step recomputed from the extracted flows
    pub inflow: Vec<f64>,
}

impl Tank {
    pub fn new(
        name: &str,
        initial_vol: f64,
        min_vol: Vec<f64>,
        max_vol: Vec<f64>,
        final_vol: f64,
        demand: Vec<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            initial_vol,
            min_vol,
            max_vol,
            final_vol,
            demand,
            inflows: vec![],
            outflows: vec![],
            value: vec![],
            inflow: vec![],
        }
    }

    pub fn add_inflow(&mut self, element_name: &str) {
        self.inflows.push(element_name.to_string());
    }

    pub fn add_outflow(&mut self, element_name: &str) {
        self.outflows.push(element_name.to_string());
    }

    /// +1 when the element feeds the tank, -1 when it drains it, `None`
    /// when it is not connected to the tank.
    pub fn flow_direction(&self, element_name: &str) -> Option<f64> {
        if self.inflows.iter().any(|e| e == element_name) {
            Some(1.0)
        } else if self.outflows.iter().any(|e| e == element_name) {
            Some(-1.0)
        } else {
            None
        }
    }

    pub fn cumulative_demand(&self) -> Vec<f64> {
        crate::utils::cumsum(&self.demand)
    }

    /// `(min, max)` volume at the end of step `t`: the minimum of the next
    /// step, or the final volume after the last one.
    pub fn volume_bounds(&self, t: usize) -> (f64, f64) {
        let min_vol = match self.min_vol.get(t + 1) {
            Some(v) => *v,
            None => self.final_vol,
        };
        (min_vol, self.max_vol[t])
    }
}

#[derive(Debug, Clone)]
pub struct PowerStation {
    pub name: String,
    pub elements: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Network {
    pub num_steps: usize,
    pub time_range: Vec<NaiveDateTime>,
    pub tariff: Vec<Tariff>,
    pub elements: Vec<FlowElement>,
    pub tanks: Vec<Tank>,
    pub power_stations: Vec<PowerStation>,
    /// Flat value column mirroring the decision vector
    pub value: Vec<f64>,
    lookup: HashMap<String, (ElementKind, usize)>,
}

impl Network {
    /// Builds the network and validates names and series lengths
    pub fn new(
        time_range: Vec<NaiveDateTime>,
        tariff: Vec<Tariff>,
        elements: Vec<FlowElement>,
        tanks: Vec<Tank>,
        power_stations: Vec<PowerStation>,
    ) -> Result<Self, AroError> {
        let num_steps = time_range.len();
        let mut lookup = HashMap::new();
        for (position, element) in elements.iter().enumerate() {
            if lookup
                .insert(element.name.clone(), (element.kind, position))
                .is_some()
            {
                return Err(AroError::InvalidInput(format!(
                    "duplicated element name {}",
                    element.name
                )));
            }
        }
        for (position, tank) in tanks.iter().enumerate() {
            if lookup
                .insert(tank.name.clone(), (ElementKind::Tank, position))
                .is_some()
            {
                return Err(AroError::InvalidInput(format!(
                    "duplicated element name {}",
                    tank.name
                )));
            }
        }

        let network = Self {
            num_steps,
            time_range,
            tariff,
            elements,
            tanks,
            power_stations,
            value: vec![],
            lookup,
        };
        network.validate()?;
        Ok(network)
    }

    fn validate(&self) -> Result<(), AroError> {
        let t = self.num_steps;
        if !self.tariff.is_empty() {
            check_len("tariff", t, self.tariff.len())?;
        }
        for element in self.elements.iter() {
            if element.kind.is_comb() != element.has_combs() {
                return Err(AroError::InvalidInput(format!(
                    "element {} of kind {:?} has {} combinations",
                    element.name,
                    element.kind,
                    element.combs.len()
                )));
            }
            let block = t * element.width();
            if element.has_combs() {
                check_len(&element.name, block, element.flow.len())?;
            }
            if element.has_cost() {
                check_len(&element.name, block, element.cost.len())?;
            }
            if !element.power.is_empty() {
                check_len(&element.name, block, element.power.len())?;
            }
        }
        for tank in self.tanks.iter() {
            check_len(&tank.name, t, tank.min_vol.len())?;
            check_len(&tank.name, t, tank.max_vol.len())?;
            check_len(&tank.name, t, tank.demand.len())?;
            for name in tank.inflows.iter().chain(tank.outflows.iter()) {
                self.flow_element(name)?;
            }
        }
        for station in self.power_stations.iter() {
            for name in station.elements.iter() {
                self.flow_element(name)?;
            }
        }
        Ok(())
    }

    /// O(1) lookup of an element by name
    pub fn lookup(&self, name: &str) -> Result<(ElementKind, usize), AroError> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| AroError::UnknownElement(name.to_string()))
    }

    pub fn flow_element(&self, name: &str) -> Result<&FlowElement, AroError> {
        match self.lookup(name)? {
            (ElementKind::Tank, _) => {
                Err(AroError::UnknownElement(name.to_string()))
            }
            (_, position) => Ok(&self.elements[position]),
        }
    }

    pub fn flow_element_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut FlowElement, AroError> {
        match self.lookup(name)? {
            (ElementKind::Tank, _) => {
                Err(AroError::UnknownElement(name.to_string()))
            }
            (_, position) => Ok(&mut self.elements[position]),
        }
    }

    pub fn tank(&self, name: &str) -> Result<&Tank, AroError> {
        match self.lookup(name)? {
            (ElementKind::Tank, position) => Ok(&self.tanks[position]),
            _ => Err(AroError::UnknownElement(name.to_string())),
        }
    }

    pub fn power_station(&self, name: &str) -> Result<&PowerStation, AroError> {
        self.power_stations
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| AroError::UnknownElement(name.to_string()))
    }

    fn of_kind(
        &self,
        kind: ElementKind,
    ) -> impl Iterator<Item = &FlowElement> + '_ {
        self.elements.iter().filter(move |e| e.kind == kind)
    }

    pub fn pump_stations(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.of_kind(ElementKind::PumpStation)
    }

    pub fn vsp(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.of_kind(ElementKind::Vsp)
    }

    pub fn wells(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.of_kind(ElementKind::Well)
    }

    pub fn control_valves(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.of_kind(ElementKind::ControlValve)
    }

    pub fn valves(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.of_kind(ElementKind::Valve)
    }

    pub fn comb_elements(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.elements.iter().filter(|e| e.has_combs())
    }

    pub fn cost_elements(&self) -> impl Iterator<Item = &FlowElement> + '_ {
        self.elements.iter().filter(|e| e.has_cost())
    }

    /// Tariff of every step, `On` when no tariff was given
    pub fn tariff_at(&self, step: usize) -> Tariff {
        self.tariff.get(step).copied().unwrap_or(Tariff::On)
    }
}
