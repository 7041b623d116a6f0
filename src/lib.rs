pub mod aro;
pub mod constraints;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod input;
pub mod ldr;
mod log;
pub mod matrix;
pub mod network;
pub mod power;
pub mod robust;
pub mod scenario;
pub mod schedule;
pub mod solver;
pub mod uncertainty;
pub mod utils;
use aro::{Aro, SolveStatus};
use input::Input;
use nalgebra::DMatrix;
use std::error::Error;
use std::time::Instant;

pub fn run(input_args: &InputArgs) -> Result<(), Box<dyn Error>> {
    log::show_greeting();

    let begin = Instant::now();
    log::input_reading_line(&input_args.path);
    let input = Input::build(&input_args.path)?;
    let config = input.config.clone();

    let mut model = Aro::new(input.network, input.uncertainty, config.clone())?;
    let rule = model.model().rule();
    log::model_greeting(
        model.index().num_steps(),
        rule.num_x(),
        rule.num_z(),
        rule.num_coefficients(),
    );
    model.build(&input.schedule)?;
    log::model_constraints(
        model.model().num_constraints(),
        model.model().num_helpers(),
    );

    let solve_begin = Instant::now();
    let (status, objective) = model.solve()?;
    log::solve_line(status, objective, solve_begin.elapsed());

    if status == SolveStatus::Optimal && config.num_simulation_scenarios > 0 {
        let simulation_begin = Instant::now();
        log::simulation_greeting(config.num_simulation_scenarios);
        let sigma = model
            .uncertainty()
            .map(|u| u.sigma.clone())
            .unwrap_or_else(|| DMatrix::zeros(0, 0));
        let samples = scenario::multivariate_normal(
            &sigma,
            config.num_simulation_scenarios,
            config.seed,
        )?;
        let (costs, tanks_vol) = evaluation::analyze_sample(&model, &samples)?;
        let summary =
            evaluation::summarize(&model.network, &costs, &tanks_vol, 1e-6);
        log::simulation_stats(summary.mean_cost, summary.std_cost);
        log::tank_table_header();
        log::tank_table_divider();
        for tank in summary.tanks.iter() {
            log::tank_table_row(tank);
        }
        log::simulation_duration(simulation_begin.elapsed());
    }

    log::show_farewell(begin.elapsed());

    Ok(())
}

pub struct InputArgs {
    pub path: String,
}

impl InputArgs {
    pub fn build(args: &[String]) -> Result<Self, &'static str> {
        if args.len() < 2 {
            return Err("Not enough arguments [PATH]");
        }

        let path = args[1].clone();

        Ok(Self { path })
    }
}
