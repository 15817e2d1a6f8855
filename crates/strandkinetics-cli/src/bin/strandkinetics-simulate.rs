use clap::Parser;
use colored::*;
use anyhow::Result;

use rand::rng;
use ff_kinetics::{ComplexList, FlatComplex};
use ff_kinetics::{simulate_population, StopReason};

use strandkinetics_cli::input_parsers::{read_complex_input, read_stop_spec_input};
use strandkinetics_cli::energy_parsers::EnergyModelArguments;
use strandkinetics_cli::kinetics_parsers::RateModelParams;

/// Runs a single complex population forward until a stop condition fires
/// or `t_end` elapses, and reports the first-passage time and outcome —
/// the primary workflow this toolkit was built around.
#[derive(Debug, Parser)]
#[command(name = "strandkinetics-simulate")]
#[command(version, about = "Run a kinetic trajectory to its stop condition")]
pub struct Cli {
    /// Complex input file (header, `+`-joined strands, dot-bracket), or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Stop-condition spec file
    #[arg(value_name = "STOPSPEC")]
    stop_spec: String,

    /// Upper bound on simulated time, in seconds.
    #[arg(long, default_value_t = 1.0)]
    t_end: f64,

    /// Number of independent trajectories to run.
    #[arg(long, default_value_t = 1)]
    trials: usize,

    #[command(flatten, next_help_heading = "Kinetic model parameters")]
    kinetics: RateModelParams,

    #[command(flatten, next_help_heading = "Energy model parameters")]
    energy: EnergyModelArguments,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let emodel = cli.energy.build_model();
    let stop = read_stop_spec_input(&cli.stop_spec)?;

    for trial in 0..cli.trials {
        let (header, strands, structure) = read_complex_input(&cli.input)?;
        if trial == 0 {
            if let Some(h) = header {
                println!("{}", h.yellow());
            }
        }

        let complex = FlatComplex::new(emodel.clone(), cli.kinetics.k0, strands, &structure);
        let mut population = ComplexList::new();
        let handle = population.add_complex(complex);
        population.fill_data(handle, &emodel);

        let mut rng = rng();
        let (t, reason) = simulate_population(&mut population, &emodel, &stop, cli.t_end, &mut rng, |_, _| {});

        let label = match reason {
            StopReason::StopCondition => "stopped".green(),
            StopReason::TimeLimit => "timed out".yellow(),
            StopReason::NoFlux => "exhausted".red(),
        };
        println!("trial {:4} {:>10} at t = {:14.8e}", trial + 1, label, t);
    }

    Ok(())
}
