use clap::Args;
use ff_energy::SimpleEnergyModel;

/// Free energy evaluation parameters shared by every binary that scores structures.
#[derive(Debug, Args)]
pub struct EnergyModelArguments {
    /// Temperature in Celsius
    #[arg(short, long, default_value = "37.0")]
    pub temperature: f64,
}

impl EnergyModelArguments {
    /// Build the energy model these arguments describe.
    pub fn build_model(&self) -> SimpleEnergyModel {
        SimpleEnergyModel::new(self.temperature)
    }
}
