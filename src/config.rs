use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, default_value_t = 20)]
    pub rows: usize,

    #[arg(long, default_value_t = 20)]
    pub cols: usize,

    /// Obstacle probability per eligible cell when generating the grid.
    #[arg(long, default_value_t = 0.3)]
    pub density: f64,

    /// Fixed RNG seed for a reproducible environment.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Replanning mode: "forward", "backward", or "both" to compare them.
    #[arg(long, default_value = "forward")]
    pub mode: String,

    /// Cap on node expansions per search; exceeding it fails the run.
    #[arg(long)]
    pub max_expansions: Option<usize>,

    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,

    #[arg(long, default_value_t = false)]
    pub no_visualization: bool,

    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    #[arg(long, default_value_t = false)]
    pub batch_mode: bool,

    #[arg(long, default_value_t = 0.1)]
    pub min_density: f64,

    #[arg(long, default_value_t = 0.5)]
    pub max_density: f64,

    #[arg(long, default_value_t = 0.05)]
    pub density_step: f64,

    /// Simulations per density configuration in batch mode.
    #[arg(long, default_value_t = 20)]
    pub num_simulations: usize,

    #[arg(long, default_value_t = 300)]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "batch_results.csv")]
    pub output_file: String,
}

impl Config {
    /// Defaults with output suppressed, for tests and embedded runs.
    pub fn headless() -> Self {
        let mut config = Config::parse_from(["trajectory_replanning"]);
        config.no_visualization = true;
        config.quiet = true;
        config
    }
}
