use clap::Parser;
use anyhow::Result;
use colored::*;
use std::sync::Arc;
use std::path::Path;
use std::path::PathBuf;
use rayon::prelude::*;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use rand::rng;
use rand::Rng;

use ff_structure::DotBracketVec;
use ff_kinetics::{ComplexList, FlatComplex, StrandComplex};
use ff_kinetics::timeline::Timeline;
use ff_kinetics::timeline_plotting::plot_occupancy_over_time;
use ff_kinetics::macrostates::MacrostateRegistry;

use strandkinetics_cli::input_parsers::read_complex_input;
use strandkinetics_cli::energy_parsers::EnergyModelArguments;
use strandkinetics_cli::kinetics_parsers::RateModelParams;
use strandkinetics_cli::kinetics_parsers::TimelineParameters;

#[derive(Debug, Parser)]
#[command(name = "strandkinetics-timecourse")]
#[command(version, about = "Replicate folding trajectories and report occupancy over time")]
pub struct Cli {
    /// Complex input file (header, `+`-joined strands, dot-bracket), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    #[arg(short, long, default_value_t = 1)]
    num_sims: usize,

    #[arg(long, value_name = "FILE", num_args = 1.., required = false)]
    macrostates: Vec<PathBuf>,

    /// Backup/Store timeline in this file.
    #[arg(long, value_name = "FILE")]
    timeline: Option<PathBuf>,

    #[command(flatten, next_help_heading = "Simulation parameters")]
    simulation: TimelineParameters,

    #[command(flatten, next_help_heading = "Kinetic model parameters")]
    kinetics: RateModelParams,

    #[command(flatten, next_help_heading = "Energy model parameters")]
    energy: EnergyModelArguments,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.simulation.validate()?;

    let emodel = cli.energy.build_model();

    let (header, strands, structure) = read_complex_input(&cli.input)?;
    let name = if let Some(h) = header {
        println!("{}", h.yellow());
        h.strip_prefix('>')
            .and_then(|s| s.split_whitespace().next())
            .unwrap_or("anonymous")
            .to_string()
    } else {
        println!("{}", ">anonymous".yellow());
        "anonymous".to_string()
    };
    println!("{}", structure);

    println!("Output after {} simulations: \n - {:?}\n - {:?}\n - {:?}",
        cli.num_sims, cli.kinetics, cli.simulation, cli.energy);

    let times = cli.simulation.get_output_times();

    // A single-strand sequence is the only thing `MacrostateRegistry` can
    // classify against; multi-strand macrostate files are out of scope.
    let sequence = ff_energy::NucleotideVec(strands.iter().flat_map(|(_, _, seq)| seq.iter().copied()).collect());
    let registry = MacrostateRegistry::from_files(&cli.macrostates, &sequence, &emodel);

    println!("Macrostates:\n{}", registry.iter()
        .map(|(_, m)| format!(" - {} {:6.2}", m.name(), m.ensemble_energy()))
        .collect::<Vec<_>>().join("\n"));

    let shared_registry = Arc::new(registry);

    let mut master = if let Some(path) = &cli.timeline {
        if Path::new(path).exists() {
            println!("Loading existing timeline from: {}", path.display());
            Timeline::from_file(path, &times, Arc::clone(&shared_registry))?
        } else {
            println!("A new timeline file will be created: {}", path.display());
            Timeline::new(&times, Arc::clone(&shared_registry))
        }
    } else {
        Timeline::new(&times, Arc::clone(&shared_registry))
    };

    println!("Simulation progress:");
    let pb = ProgressBar::new(cli.num_sims as u64);
    pb.set_style(
        ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap()
        .progress_chars("#>-"),
    );

    let timelines: Vec<Timeline> = (0..cli.num_sims)
        .into_par_iter()
        .map_init(
            || pb.clone(),
            |pb, _| {
                let registry = Arc::clone(&shared_registry);
                let mut timeline = Timeline::new(&times, registry);

                let complex = FlatComplex::new(emodel.clone(), cli.kinetics.k0, strands.clone(), &structure);
                let mut population = ComplexList::new();
                let handle = population.add_complex(complex);
                population.fill_data(handle, &emodel);

                let mut rng = rng();
                let mut t = 0.0;
                let mut t_idx = 0;
                while t < cli.simulation.t_end {
                    let flux = population.get_total_flux(&emodel);
                    if flux <= 0.0 {
                        break;
                    }
                    let tinc = -rng.random::<f64>().ln() / flux;

                    while t_idx < times.len() && t + tinc >= times[t_idx] {
                        assign_checkpoint(&population, &mut timeline, t_idx);
                        t_idx += 1;
                    }

                    let choice = rng.random::<f64>() * flux;
                    population.do_basic_choice(choice, t, &emodel);
                    t += tinc;
                }
                while t_idx < times.len() {
                    assign_checkpoint(&population, &mut timeline, t_idx);
                    t_idx += 1;
                }

                pb.inc(1);
                timeline
            },
        ).collect();
    pb.finish_with_message("All simulations complete!");

    for timeline in timelines {
        master.merge(timeline);
    }

    println!("Final Timeline:\n{}", master);
    plot_occupancy_over_time(&master, &format!("strandkinetics_{}.svg", name), cli.simulation.t_ext, cli.simulation.t_end);

    if let Some(path) = cli.timeline {
        let serial = master.to_serializable();
        let json = serde_json::to_string_pretty(&serial)?;
        std::fs::write(path, json)?;
    }

    Ok(())
}

/// Classifies every live complex's structure against the registry at the
/// given checkpoint. A disassociation event leaves more than one live
/// complex; each is counted separately.
fn assign_checkpoint<M: ff_energy::EnergyModel + Clone>(
    population: &ComplexList<FlatComplex<M>>,
    timeline: &mut Timeline,
    t_idx: usize,
) {
    let structures: Vec<DotBracketVec> = population.iter().map(|(_, e)| e.complex.get_structure()).collect();
    timeline.assign_population(t_idx, &structures);
}
