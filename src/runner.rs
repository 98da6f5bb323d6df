//! Command line entry points.
//!
//! Both binaries share [`BaseArgs`] (config file, logging, parameter overrides) and differ only
//! in what they do with the finished trajectory: `sir` prints a summary and optionally writes a
//! CSV report and a static chart, `sir_animation` writes an animated GIF.
use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Args, Command, FromArgMatches as _};

use crate::config::SimulationConfig;
use crate::error::SirError;
use crate::integrator::integrate;
use crate::log::{set_log_level, LevelFilter, LogLevelSpec};
use crate::parameters::{NegativityPolicy, Parameters, ParametersValues};
use crate::render::{Animation, Renderer, StaticChart};
use crate::report::write_trajectory_report;
use crate::trajectory::Trajectory;

/// Default cli arguments shared by both binaries
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Optional path for a JSON simulation config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level: a level such as `info`, or comma separated `module=level` entries
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Warnings are always shown
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub parameters: ParameterArgs,
}

/// Overrides for values of the config file
#[derive(Args, Debug, Default)]
pub struct ParameterArgs {
    /// Initial susceptible individuals (S0)
    #[arg(long)]
    pub s0: Option<f64>,

    /// Initial infected individuals (I0)
    #[arg(long)]
    pub i0: Option<f64>,

    /// Initial recovered individuals (R0); implied from the population when omitted
    #[arg(long)]
    pub r0: Option<f64>,

    /// Total population (N)
    #[arg(long)]
    pub population: Option<f64>,

    /// Transmission rate
    #[arg(long)]
    pub beta: Option<f64>,

    /// Recovery rate
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Integration time step
    #[arg(long)]
    pub dt: Option<f64>,

    /// Number of integration steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Clamp compartments that an unstable step pushes below zero
    #[arg(long)]
    pub clamp: bool,
}

impl ParameterArgs {
    fn apply(&self, values: &mut ParametersValues) {
        if let Some(s0) = self.s0 {
            values.initial_susceptible = s0;
        }
        if let Some(i0) = self.i0 {
            values.initial_infected = i0;
        }
        if self.r0.is_some() {
            values.initial_recovered = self.r0;
        }
        if self.population.is_some() {
            values.population = self.population;
        }
        if let Some(beta) = self.beta {
            values.beta = beta;
        }
        if let Some(gamma) = self.gamma {
            values.gamma = gamma;
        }
        if let Some(dt) = self.dt {
            values.dt = dt;
        }
        if let Some(steps) = self.steps {
            values.steps = steps;
        }
        if self.clamp {
            values.negativity = NegativityPolicy::ClampToZero;
        }
    }
}

/// Arguments of the `sir` binary
#[derive(Args, Debug, Default)]
pub struct SimulationArgs {
    /// Write the trajectory to this CSV file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a static chart (.png or .svg) to this file
    #[arg(long)]
    pub chart: Option<PathBuf>,
}

/// Arguments of the `sir_animation` binary
#[derive(Args, Debug, Default)]
pub struct AnimationArgs {
    /// Output GIF; defaults to the config's `animation.output_file`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Render every nth step
    #[arg(long)]
    pub frame_skip: Option<usize>,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct Run {
    pub config: SimulationConfig,
    pub parameters: Parameters,
    pub trajectory: Trajectory,
}

fn create_cli(name: &'static str) -> Command {
    let cli = Command::new(name);
    BaseArgs::augment_args(cli)
}

/// Parses the command line into `BaseArgs` and `A`, runs the simulation and hands the result to
/// `output_fn`.
///
/// # Errors
/// Returns an error if argument parsing, configuration, integration or `output_fn` fails
pub fn run_with_custom_args<A, F>(name: &'static str, output_fn: F) -> Result<Run, Box<dyn Error>>
where
    A: Args,
    F: FnOnce(&Run, A) -> Result<(), SirError>,
{
    let mut cli = create_cli(name);
    cli = A::augment_args(cli);
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    let custom_matches = A::from_arg_matches(&matches)?;
    configure_logging(&base_args_matches)?;
    run_with_args_internal(base_args_matches, custom_matches, output_fn)
}

/// Entry point of the `sir` binary.
///
/// # Errors
/// See [`run_with_custom_args`].
pub fn run_simulation() -> Result<Run, Box<dyn Error>> {
    run_with_custom_args("sir", write_simulation_outputs)
}

/// Entry point of the `sir_animation` binary.
///
/// # Errors
/// See [`run_with_custom_args`].
pub fn run_animation() -> Result<Run, Box<dyn Error>> {
    run_with_custom_args("sir_animation", write_animation)
}

fn configure_logging(args: &BaseArgs) -> Result<(), SirError> {
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    set_log_level(level)?;
    if let Some(spec) = &args.log_level {
        spec.parse::<LogLevelSpec>()?.apply()?;
    }
    Ok(())
}

fn run_with_args_internal<A, F>(
    args: BaseArgs,
    custom_args: A,
    output_fn: F,
) -> Result<Run, Box<dyn Error>>
where
    F: FnOnce(&Run, A) -> Result<(), SirError>,
{
    // Optionally read the configuration from a file
    let mut config = match &args.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            SimulationConfig::load(path)?
        }
        None => SimulationConfig::default(),
    };
    args.parameters.apply(&mut config.parameters);
    let parameters = config.parameters()?;

    println!(
        "Running simulation with beta={}, gamma={}, R0={:.2}",
        parameters.beta(),
        parameters.gamma(),
        parameters.basic_reproduction_number()
    );
    let trajectory = integrate(&parameters)?;
    let run = Run {
        config,
        parameters,
        trajectory,
    };
    print_summary(&run);

    output_fn(&run, custom_args)?;
    Ok(run)
}

fn print_summary(run: &Run) {
    let summary = run.trajectory.summary();
    println!(
        "Results: Peak Infected={:.1} at t={:.1}, Final Recovered={:.1}, Attack rate={:.1}%",
        summary.peak_infected,
        summary.peak_time,
        summary.final_recovered,
        summary.attack_rate * 100.0
    );
    println!(
        "Total population (min/max): {} {}",
        summary.min_total, summary.max_total
    );
    println!("Expected: {}", run.parameters.population());
}

fn write_simulation_outputs(run: &Run, args: SimulationArgs) -> Result<(), SirError> {
    if let Some(path) = &args.report {
        write_trajectory_report(&run.trajectory, path)?;
        println!("Saved {}", path.display());
    }
    let chart_path = args.chart.or_else(|| run.config.chart.output_file.clone());
    if let Some(path) = chart_path {
        StaticChart::new(run.config.chart.clone()).render(
            &run.trajectory,
            Some(&run.parameters),
            &path,
        )?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn write_animation(run: &Run, args: AnimationArgs) -> Result<(), SirError> {
    let mut options = run.config.animation.clone();
    if let Some(fps) = args.fps {
        options.fps = fps;
    }
    if let Some(frame_skip) = args.frame_skip {
        options.frame_skip = frame_skip;
    }
    if let Some(output) = args.output {
        options.output_file = output;
    }
    let path = options.output_file.clone();

    let animation = Animation::new(options, run.config.chart.clone())?;
    animation.render(&run.trajectory, Some(&run.parameters), &path)?;
    println!("Saved {}", path.display());
    Ok(())
}
