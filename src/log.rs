use crate::aro::SolveStatus;
use crate::evaluation::TankSummary;
use std::time::Duration;

fn seconds(time: Duration) -> f64 {
    time.as_millis() as f64 / 1000.0
}

pub fn show_greeting() {
    println!("\n# aro - adaptive robust operation of water networks");
}

pub fn input_reading_line(path: &str) {
    println!("\nReading input files from '{path}'");
}

/// Helper function for displaying the size of the declared model
pub fn model_greeting(
    num_steps: usize,
    num_decisions: usize,
    num_uncertain: usize,
    num_coefficients: usize,
) {
    println!("\n# Model");
    println!("- Steps: {num_steps}");
    println!("- Decisions: {num_decisions}");
    println!("- Uncertain entries: {num_uncertain}");
    println!("- Rule coefficients: {num_coefficients}");
}

pub fn model_constraints(num_constraints: usize, num_helpers: usize) {
    println!("- Constraints: {num_constraints}");
    println!("- Helper variables: {num_helpers}");
}

/// Helper function for displaying the solver outcome
pub fn solve_line(status: SolveStatus, objective: Option<f64>, time: Duration) {
    println!("\n# Solving");
    println!("- Status: {status}");
    match objective {
        Some(value) => println!("- Objective ($): {:.4}", value),
        None => println!("- Objective ($): -"),
    }
    println!("\nSolving time: {:.2} s", seconds(time));
}

/// Helper function for displaying the greeting data for the simulation
pub fn simulation_greeting(num_simulation_scenarios: usize) {
    println!("\n# Simulating");
    println!("- Scenarios: {num_simulation_scenarios}\n");
}

pub fn simulation_stats(mean: f64, std: f64) {
    println!("Expected cost ($): {:.2} +- {:.2}\n", mean, std);
}

/// Helper function for displaying the tank table header
pub fn tank_table_header() {
    println!(
        "{0: ^10} | {1: ^12} | {2: ^12} | {3: ^10}",
        "tank", "min volume", "max volume", "violations"
    )
}

/// Helper function for displaying a divider for the tank table
pub fn tank_table_divider() {
    println!("--------------------------------------------------")
}

pub fn tank_table_row(tank: &TankSummary) {
    println!(
        "{0: >10} | {1: >12.2} | {2: >12.2} | {3: >10}",
        tank.name, tank.min_volume, tank.max_volume, tank.violations
    )
}

pub fn simulation_duration(time: Duration) {
    println!("\nSimulation time: {:.2} s", seconds(time))
}

pub fn show_farewell(time: Duration) {
    println!("\nTotal running time: {:.2} s", seconds(time))
}
