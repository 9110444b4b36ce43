use clap::Parser;

use trajectory_replanning::batch_simulation::BatchSimulation;
use trajectory_replanning::config::Config;
use trajectory_replanning::simulation::{Outcome, Simulation};

fn main() {
    let config = Config::parse();

    if !config.quiet {
        println!("Starting trajectory replanning...");
        println!("Grid size: {}x{}", config.rows, config.cols);
        println!("Obstacle density: {:.2}", config.density);
        println!("Mode: {}", config.mode);

        if config.no_visualization || config.batch_mode {
            println!("Visualization disabled - running in fast mode");
        } else {
            println!("Visualization enabled with {}ms delay", config.delay_ms);
            println!("Press Ctrl+C to stop the run");
        }
        println!();
    }

    if config.batch_mode {
        let mut batch_sim = BatchSimulation::new(config.clone());
        match batch_sim.run() {
            Ok(()) => {
                if !config.quiet {
                    batch_sim.print_summary();
                }
            }
            Err(e) => {
                eprintln!("Batch simulation failed: {}", e);
                std::process::exit(1);
            }
        }
    } else if config.mode == "both" {
        let results = Simulation::run_both_modes(config);
        Simulation::print_comparison_results(&results);
    } else {
        let mut simulation = match Simulation::new(config.clone()) {
            Ok(simulation) => simulation,
            Err(e) => {
                eprintln!("Setup failed: {}", e);
                std::process::exit(1);
            }
        };

        let (outcome, stats, timing) = simulation.run();

        println!("\n=== FINAL RESULTS ===");
        match &outcome {
            Outcome::Succeeded { trajectory } => {
                println!("SUCCESS: agent reached the goal");
                println!("Trajectory length: {} cells", trajectory.len());
                if !config.no_visualization {
                    simulation.truth.print_trajectory(trajectory);
                }
            }
            Outcome::Failed { reason } => {
                println!("FAILED: {}", reason);
            }
        }
        println!("{}", stats);

        println!("=== TIMING ANALYSIS ===");
        println!("Total replans: {}", timing.total_calls());
        println!("Average sense time: {:.2?}", timing.average_sense_time());
        println!("Average plan time: {:.2?}", timing.average_plan_time());

        if let Outcome::Succeeded { .. } = outcome {
            let extra_moves = stats.total_moves.saturating_sub(stats.optimal_path_length);
            println!("Extra moves due to limited vision: {}", extra_moves);
        }
    }
}
