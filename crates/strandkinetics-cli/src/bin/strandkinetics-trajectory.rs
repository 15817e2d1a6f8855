use clap::Parser;
use colored::*;
use anyhow::Result;

use rand::rng;
use ff_kinetics::{ComplexList, FlatComplex, StopSpec, StrandComplex};
use ff_kinetics::simulate_population;

use strandkinetics_cli::input_parsers::read_complex_input;
use strandkinetics_cli::energy_parsers::EnergyModelArguments;
use strandkinetics_cli::kinetics_parsers::RateModelParams;

#[derive(Debug, Parser)]
#[command(name = "strandkinetics-trajectory")]
#[command(version, about = "Stochastic simulation trajectory for a single complex")]
pub struct Cli {
    /// Input file (complex FASTA-like: header, `+`-joined strands, dot-bracket), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Simulation stop time.
    #[arg(long, default_value_t = 1.0)]
    t_end: f64,

    #[command(flatten, next_help_heading = "Kinetic model parameters")]
    kinetics: RateModelParams,

    #[command(flatten, next_help_heading = "Energy model parameters")]
    energy: EnergyModelArguments,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let emodel = cli.energy.build_model();

    let (header, strands, structure) = read_complex_input(&cli.input)?;
    if let Some(h) = header {
        println!("{}", h.yellow())
    }
    println!("{:>8} {:>14} -> {:>14} {:>15}",
        "energy".green(),
        "arrivaltime".cyan(),
        "waitingtime".cyan(),
        "mean-waiting".cyan(),
    );

    let complex = FlatComplex::new(emodel.clone(), cli.kinetics.k0, strands, &structure);
    let mut population = ComplexList::new();
    let handle = population.add_complex(complex);
    population.fill_data(handle, &emodel);

    let stop = StopSpec::default();
    let mut last_t = 0.0;
    simulate_population(&mut population, &emodel, &stop, cli.t_end, &mut rng(), |t, list| {
        let (_, entry) = list.iter().next().expect("trajectory lost its only complex");
        let tinc = t - last_t;
        println!("{} {:8.2} {:14.8e} -> {:14.8e} {:15.8e}",
            entry.complex.get_structure(),
            entry.energy,
            last_t,
            t,
            tinc,
        );
        last_t = t;
    });
    Ok(())
}
