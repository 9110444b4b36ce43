use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use pathfinding::prelude::astar;
use thiserror::Error;

use crate::agent::Agent;
use crate::algorithms::backward::BackwardAStar;
use crate::algorithms::common::{manhattan, Mode, PlanFailure, PlanningStrategy};
use crate::algorithms::engine::SearchEngine;
use crate::algorithms::forward::ForwardAStar;
use crate::config::Config;
use crate::grid::{Grid, Position};
use crate::statistics::Statistics;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unknown mode '{0}', expected 'forward', 'backward', or 'both'")]
    UnknownMode(String),
}

/// Result of one complete run. `Failed` carries the reason the final replan
/// produced no plan; there are no partial or ambiguous terminal states.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded { trajectory: Vec<Position> },
    Failed { reason: PlanFailure },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

pub fn parse_mode(mode: &str) -> Result<Mode, SetupError> {
    match mode {
        "forward" => Ok(Mode::Forward),
        "backward" => Ok(Mode::Backward),
        other => Err(SetupError::UnknownMode(other.to_string())),
    }
}

/// Run one sense-plan-move loop to completion on the given ground truth.
/// Convenience entry point for callers that don't need statistics or timing.
pub fn run(truth: Grid, mode: Mode) -> Outcome {
    let (outcome, _, _) = Simulation::with_grid_and_mode(Config::headless(), truth, mode).run();
    outcome
}

#[derive(Debug, Clone)]
pub struct ModeResult {
    pub mode: Mode,
    pub outcome: Outcome,
    pub statistics: Statistics,
    pub timing: TimingData,
}

/// The replanning controller: owns the ground truth, the agent (and through
/// it the known grid), one search engine and one planning strategy for the
/// duration of a run.
pub struct Simulation {
    pub truth: Grid,
    pub agent: Agent,
    pub strategy: Box<dyn PlanningStrategy>,
    pub engine: SearchEngine,
    pub config: Config,
    pub optimal_path_length: usize,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self, SetupError> {
        let truth = Grid::generate(config.rows, config.cols, config.density, config.seed);
        Self::with_grid(config, truth)
    }

    pub fn with_grid(config: Config, truth: Grid) -> Result<Self, SetupError> {
        let mode = parse_mode(&config.mode)?;
        Ok(Self::with_grid_and_mode(config, truth, mode))
    }

    pub fn with_grid_and_mode(config: Config, truth: Grid, mode: Mode) -> Self {
        let agent = Agent::new(truth.start, truth.rows, truth.cols);
        let strategy: Box<dyn PlanningStrategy> = match mode {
            Mode::Forward => Box::new(ForwardAStar::new()),
            Mode::Backward => Box::new(BackwardAStar::new()),
        };
        let mut engine = SearchEngine::new();
        engine.set_expansion_cap(config.max_expansions);
        let optimal_path_length = Self::omniscient_path_length(&truth);

        Simulation {
            truth,
            agent,
            strategy,
            engine,
            config,
            optimal_path_length,
        }
    }

    /// Shortest path length on the fully known ground truth, as a baseline
    /// for route efficiency. Zero means not even an omniscient planner could
    /// reach the goal.
    fn omniscient_path_length(truth: &Grid) -> usize {
        astar(
            &truth.start,
            |&pos| {
                truth
                    .neighbors4(pos)
                    .into_iter()
                    .filter(|&n| !truth.is_blocked(n))
                    .map(|n| (n, 1u32))
                    .collect::<Vec<_>>()
            },
            |&pos| manhattan(pos, truth.goal),
            |&pos| pos == truth.goal,
        )
        .map(|(path, _)| path.len().saturating_sub(1))
        .unwrap_or(0)
    }

    /// Drive the sense-plan-move loop until the agent reaches the goal or a
    /// replan proves there is nothing reachable left to try.
    pub fn run(&mut self) -> (Outcome, Statistics, TimingData) {
        let mut stats = Statistics::new(self.optimal_path_length);
        let mut timing = TimingData::new();
        let mut trajectory = vec![self.agent.position];

        if self.agent.position == self.truth.goal {
            return (Outcome::Succeeded { trajectory }, stats, timing);
        }

        if !self.config.no_visualization {
            self.render_step(0, 0);
        }

        loop {
            // Sensing: merge the four adjacent ground-truth cells into the
            // agent's belief.
            let sense_start = Instant::now();
            let newly_sensed = self.agent.sense(&self.truth);
            timing.sense_times.push(sense_start.elapsed());

            // Planning: one search generation on the updated known grid.
            let plan_start = Instant::now();
            let plan = self.strategy.plan(
                &mut self.engine,
                &self.agent.known,
                self.agent.position,
                self.truth.goal,
            );
            timing.plan_times.push(plan_start.elapsed());
            stats.replans += 1;
            debug!(
                "replan {} at {:?}: {} newly sensed, {} known obstacles",
                stats.replans,
                self.agent.position,
                newly_sensed.len(),
                self.agent.known.blocked_count()
            );

            let path = match plan {
                Ok(path) => path,
                Err(reason) => {
                    stats.expanded_nodes = self.engine.expanded_total();
                    if !self.config.quiet {
                        println!("No plan from {:?}: {}", self.agent.position, reason);
                    }
                    return (Outcome::Failed { reason }, stats, timing);
                }
            };

            // Executing: walk the plan, checking each next cell against the
            // ground truth before stepping. The first truly blocked cell ends
            // the walk; it sits adjacent to the agent and is picked up by the
            // next sensing pass.
            for &cell in path.iter().skip(1) {
                if self.truth.is_blocked(cell) {
                    break;
                }
                self.agent.move_to(cell);
                trajectory.push(cell);
                stats.total_moves += 1;
                if !self.config.no_visualization {
                    self.render_step(stats.replans, stats.total_moves);
                }
            }

            if self.agent.position == self.truth.goal {
                stats.expanded_nodes = self.engine.expanded_total();
                stats.calculate_efficiency();
                return (Outcome::Succeeded { trajectory }, stats, timing);
            }
        }
    }

    /// Run forward and backward modes against the same generated environment
    /// and return both results for comparison.
    pub fn run_both_modes(config: Config) -> Vec<ModeResult> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let truth = Grid::generate(config.rows, config.cols, config.density, Some(seed));

        if !config.quiet {
            println!("Comparing forward and backward replanning...");
            println!("Environment seed: {} (for reproducibility)", seed);
            println!(
                "Grid {}x{}, density {:.2}, start {:?}, goal {:?}",
                truth.rows, truth.cols, config.density, truth.start, truth.goal
            );
            println!();
        }

        let mut results = Vec::new();
        for mode in [Mode::Forward, Mode::Backward] {
            let mut run_config = config.clone();
            run_config.no_visualization = true;
            run_config.mode = mode.name().to_string();

            let mut simulation = Simulation::with_grid_and_mode(run_config, truth.clone(), mode);
            let (outcome, statistics, timing) = simulation.run();

            if !config.quiet {
                println!(
                    "Completed: {} - success: {}, moves: {}, replans: {}",
                    mode,
                    outcome.is_success(),
                    statistics.total_moves,
                    statistics.replans
                );
            }

            results.push(ModeResult {
                mode,
                outcome,
                statistics,
                timing,
            });
        }
        results
    }

    /// Print comparison results in a table format.
    pub fn print_comparison_results(results: &[ModeResult]) {
        println!("\n=== MODE COMPARISON RESULTS ===");
        println!();
        println!(
            "{:<10} {:<8} {:<8} {:<8} {:<10} {:<8} {:<12} {:<14} {:<14}",
            "Mode",
            "Success",
            "Moves",
            "Replans",
            "Expanded",
            "Optimal",
            "Efficiency",
            "Avg Sense",
            "Avg Plan"
        );
        println!("{}", "-".repeat(96));

        for result in results {
            let success_str = if result.outcome.is_success() { "yes" } else { "no" };
            println!(
                "{:<10} {:<8} {:<8} {:<8} {:<10} {:<8} {:<12.3} {:<14} {:<14}",
                result.mode.name(),
                success_str,
                result.statistics.total_moves,
                result.statistics.replans,
                result.statistics.expanded_nodes,
                result.statistics.optimal_path_length,
                result.statistics.route_efficiency,
                format!("{:.2?}", result.timing.average_sense_time()),
                format!("{:.2?}", result.timing.average_plan_time()),
            );
        }
        println!();

        let successful: Vec<_> = results.iter().filter(|r| r.outcome.is_success()).collect();
        if successful.len() == results.len() && !successful.is_empty() {
            let min_moves = successful
                .iter()
                .map(|r| r.statistics.total_moves)
                .min()
                .unwrap_or(0);
            let max_moves = successful
                .iter()
                .map(|r| r.statistics.total_moves)
                .max()
                .unwrap_or(0);
            println!(
                "Move count spread between modes: {}",
                max_moves - min_moves
            );
        } else if successful.is_empty() {
            println!("Neither mode reached the goal on this environment.");
        }
    }

    fn render_step(&self, replans: usize, moves: usize) {
        self.clear_screen();
        println!("=== TRAJECTORY REPLANNING ===");
        println!(
            "Mode: {} | Replans: {} | Moves: {}",
            self.strategy.name(),
            replans,
            moves
        );
        println!(
            "Agent: {:?} | Goal: {:?} | Known obstacles: {}",
            self.agent.position,
            self.truth.goal,
            self.agent.known.blocked_count()
        );
        println!("Optimal path length (omniscient): {}", self.optimal_path_length);
        self.truth.print_grid(Some(self.agent.position));
        thread::sleep(Duration::from_millis(self.config.delay_ms));
    }

    fn clear_screen(&self) {
        print!("\x1B[2J\x1B[1;1H");
    }
}

#[derive(Debug, Clone)]
pub struct TimingData {
    pub sense_times: Vec<Duration>,
    pub plan_times: Vec<Duration>,
}

impl TimingData {
    pub fn new() -> Self {
        TimingData {
            sense_times: Vec::new(),
            plan_times: Vec::new(),
        }
    }

    pub fn average_sense_time(&self) -> Duration {
        if self.sense_times.is_empty() {
            Duration::from_nanos(0)
        } else {
            let total: Duration = self.sense_times.iter().sum();
            total / self.sense_times.len() as u32
        }
    }

    pub fn average_plan_time(&self) -> Duration {
        if self.plan_times.is_empty() {
            Duration::from_nanos(0)
        } else {
            let total: Duration = self.plan_times.iter().sum();
            total / self.plan_times.len() as u32
        }
    }

    pub fn total_calls(&self) -> usize {
        self.plan_times.len()
    }
}

impl Default for TimingData {
    fn default() -> Self {
        TimingData::new()
    }
}
