use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::Config;
use crate::simulation::{SetupError, Simulation};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to write batch results to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Setup(#[from] SetupError),
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub simulation_id: usize,
    pub mode: String,
    pub rows: usize,
    pub cols: usize,
    pub density: f64,
    pub seed: u64,
    pub success: bool,
    pub total_moves: usize,
    pub replans: usize,
    pub expanded_nodes: usize,
    pub optimal_path_length: usize,
    pub route_efficiency: f64,
    pub execution_time_ms: u64,
    pub average_sense_time_ns: u64,
    pub average_plan_time_ns: u64,
}

/// Sweeps obstacle density over a configured range, running a number of
/// seeded simulations per configuration and appending results to a CSV in
/// batches.
pub struct BatchSimulation {
    config: Config,
    results: Vec<BatchResult>,
    written_through: usize,
    runs_started: usize,
    start_time: Instant,
    batch_size: usize,
}

impl BatchSimulation {
    pub fn new(config: Config) -> Self {
        BatchSimulation {
            config,
            results: Vec::new(),
            written_through: 0,
            runs_started: 0,
            start_time: Instant::now(),
            batch_size: 100,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn densities(&self) -> Vec<f64> {
        let step = self.config.density_step.max(0.001);
        let steps = ((self.config.max_density - self.config.min_density) / step).round() as usize;
        (0..=steps)
            .map(|i| self.config.min_density + i as f64 * step)
            .filter(|d| *d <= self.config.max_density + 1e-9)
            .collect()
    }

    pub fn run(&mut self) -> Result<(), BatchError> {
        self.initialize_csv_file()?;

        let densities = self.densities();
        let total_simulations = densities.len() * self.config.num_simulations;
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        if !self.config.quiet {
            println!("=== BATCH SIMULATION STARTED ===");
            println!("Grid size: {}x{}", self.config.rows, self.config.cols);
            println!(
                "Density range: {:.2} to {:.2} in steps of {:.2}",
                self.config.min_density, self.config.max_density, self.config.density_step
            );
            println!(
                "Simulations per configuration: {}",
                self.config.num_simulations
            );
            println!("Mode: {}", self.config.mode);
            println!("Timeout: {} seconds", self.config.timeout_seconds);
            println!("Output file: {}", self.config.output_file);
            println!("Total simulations to run: {}", total_simulations);
            println!();
        }

        let mut completed = 0;
        let mut last_progress_report = Instant::now();
        let progress_interval = Duration::from_secs(10);

        for (i, density) in densities.iter().enumerate() {
            if self.start_time.elapsed() > timeout {
                if !self.config.quiet {
                    println!("Timeout reached after {} configurations", i);
                }
                break;
            }

            if !self.config.quiet {
                println!(
                    "Configuration {}/{}: density {:.2}",
                    i + 1,
                    densities.len(),
                    density
                );
            }

            completed += self.run_configuration(*density, timeout)?;

            if self.results.len() - self.written_through >= self.batch_size {
                self.flush_results_to_csv()?;
            }

            if last_progress_report.elapsed() > progress_interval {
                let progress = (completed as f64 / total_simulations as f64) * 100.0;
                println!(
                    "Progress: {:.1}% ({}/{}) - elapsed: {:.1}s",
                    progress,
                    completed,
                    total_simulations,
                    self.start_time.elapsed().as_secs_f64()
                );
                last_progress_report = Instant::now();
            }
        }

        self.flush_results_to_csv()?;

        if !self.config.quiet {
            println!("\n=== BATCH SIMULATION COMPLETED ===");
            println!("Total results collected: {}", self.results.len());
            println!("Results saved to: {}", self.config.output_file);
            println!("Total time: {:.2?}", self.start_time.elapsed());
        } else {
            println!(
                "Batch simulation completed: {} results in {:.1}s -> {}",
                self.results.len(),
                self.start_time.elapsed().as_secs_f64(),
                self.config.output_file
            );
        }

        Ok(())
    }

    fn run_configuration(&mut self, density: f64, timeout: Duration) -> Result<usize, BatchError> {
        let mut completed = 0;

        for sim_id in 0..self.config.num_simulations {
            if self.start_time.elapsed() > timeout {
                return Ok(completed);
            }

            let seed = match self.config.seed {
                Some(base) => base.wrapping_add(self.runs_started as u64),
                None => rand::random(),
            };
            self.runs_started += 1;

            let mut run_config = self.config.clone();
            run_config.density = density;
            run_config.seed = Some(seed);
            run_config.no_visualization = true;
            run_config.quiet = true;

            let simulation_start = Instant::now();

            if self.config.mode == "both" {
                for result in Simulation::run_both_modes(run_config.clone()) {
                    self.results.push(BatchResult {
                        simulation_id: sim_id,
                        mode: result.mode.name().to_string(),
                        rows: self.config.rows,
                        cols: self.config.cols,
                        density,
                        seed,
                        success: result.outcome.is_success(),
                        total_moves: result.statistics.total_moves,
                        replans: result.statistics.replans,
                        expanded_nodes: result.statistics.expanded_nodes,
                        optimal_path_length: result.statistics.optimal_path_length,
                        route_efficiency: result.statistics.route_efficiency,
                        execution_time_ms: simulation_start.elapsed().as_millis() as u64,
                        average_sense_time_ns: result.timing.average_sense_time().as_nanos()
                            as u64,
                        average_plan_time_ns: result.timing.average_plan_time().as_nanos() as u64,
                    });
                }
            } else {
                let mut simulation = Simulation::new(run_config)?;
                let (outcome, stats, timing) = simulation.run();

                self.results.push(BatchResult {
                    simulation_id: sim_id,
                    mode: self.config.mode.clone(),
                    rows: self.config.rows,
                    cols: self.config.cols,
                    density,
                    seed,
                    success: outcome.is_success(),
                    total_moves: stats.total_moves,
                    replans: stats.replans,
                    expanded_nodes: stats.expanded_nodes,
                    optimal_path_length: stats.optimal_path_length,
                    route_efficiency: stats.route_efficiency,
                    execution_time_ms: simulation_start.elapsed().as_millis() as u64,
                    average_sense_time_ns: timing.average_sense_time().as_nanos() as u64,
                    average_plan_time_ns: timing.average_plan_time().as_nanos() as u64,
                });
            }

            completed += 1;
        }

        Ok(completed)
    }

    fn initialize_csv_file(&self) -> Result<(), BatchError> {
        let mut file = std::fs::File::create(&self.config.output_file).map_err(|source| {
            BatchError::Io {
                path: self.config.output_file.clone(),
                source,
            }
        })?;

        writeln!(
            file,
            "simulation_id,mode,rows,cols,density,seed,success,total_moves,replans,expanded_nodes,optimal_path_length,route_efficiency,execution_time_ms,average_sense_time_ns,average_plan_time_ns"
        )
        .map_err(|source| BatchError::Io {
            path: self.config.output_file.clone(),
            source,
        })?;

        if !self.config.quiet {
            println!("Initialized CSV file: {}", self.config.output_file);
        }
        Ok(())
    }

    fn flush_results_to_csv(&mut self) -> Result<(), BatchError> {
        if self.written_through == self.results.len() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.config.output_file)
            .map_err(|source| BatchError::Io {
                path: self.config.output_file.clone(),
                source,
            })?;

        for result in &self.results[self.written_through..] {
            writeln!(
                file,
                "{},{},{},{},{:.3},{},{},{},{},{},{},{:.6},{},{},{}",
                result.simulation_id,
                result.mode,
                result.rows,
                result.cols,
                result.density,
                result.seed,
                result.success,
                result.total_moves,
                result.replans,
                result.expanded_nodes,
                result.optimal_path_length,
                result.route_efficiency,
                result.execution_time_ms,
                result.average_sense_time_ns,
                result.average_plan_time_ns
            )
            .map_err(|source| BatchError::Io {
                path: self.config.output_file.clone(),
                source,
            })?;
        }

        self.written_through = self.results.len();
        Ok(())
    }

    pub fn print_summary(&self) {
        if self.results.is_empty() {
            println!("No results to summarize.");
            return;
        }

        println!("\n=== BATCH SIMULATION SUMMARY ===");

        let mut mode_groups: HashMap<String, Vec<&BatchResult>> = HashMap::new();
        for result in &self.results {
            mode_groups
                .entry(result.mode.clone())
                .or_default()
                .push(result);
        }

        for (mode, results) in mode_groups {
            println!("\n{} mode results:", mode);
            let successful = results.iter().filter(|r| r.success).count();
            let total = results.len();
            let success_rate = (successful as f64 / total as f64) * 100.0;

            println!(
                "  Success rate: {}/{} ({:.1}%)",
                successful, total, success_rate
            );

            if successful > 0 {
                let hits: Vec<_> = results.iter().filter(|r| r.success).collect();
                let avg_moves: f64 =
                    hits.iter().map(|r| r.total_moves as f64).sum::<f64>() / hits.len() as f64;
                let avg_replans: f64 =
                    hits.iter().map(|r| r.replans as f64).sum::<f64>() / hits.len() as f64;
                let avg_efficiency: f64 =
                    hits.iter().map(|r| r.route_efficiency).sum::<f64>() / hits.len() as f64;

                println!("  Average moves: {:.1}", avg_moves);
                println!("  Average replans: {:.1}", avg_replans);
                println!("  Average efficiency: {:.3}", avg_efficiency);
            }
        }
    }
}
