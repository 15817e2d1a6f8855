use ff_energy::EnergyModel;

use crate::strand_complex::StrandComplex;

/// Arrhenius enthalpy/entropy decomposition of a complex's cached energy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EeEnergy {
    pub dh: f64,
    pub neg_t_ds: f64,
}

/// One live complex plus its cached aggregates. Stored in [`crate::complex_list::ComplexList`]'s
/// arena and addressed by stable integer handle rather than an intrusive
/// singly-linked pointer.
#[derive(Debug)]
pub struct ComplexEntry<C: StrandComplex> {
    pub id: u64,
    pub complex: C,
    pub energy: f64,
    pub rate: f64,
    pub ee_energy: EeEnergy,
}

impl<C: StrandComplex> ComplexEntry<C> {
    pub fn new(id: u64, mut complex: C) -> Self {
        complex.generate_loops();
        complex.generate_moves();
        ComplexEntry {
            id,
            complex,
            energy: 0.0,
            rate: 0.0,
            ee_energy: EeEnergy::default(),
        }
    }

    /// Recomputes `energy` and `rate` from the owned complex. `energy`
    /// includes the per-strand volume and association corrections charged
    /// once per strand beyond the first.
    pub fn fill_data<M: EnergyModel>(&mut self, model: &M) {
        let strand_correction = (model.volume_energy() + model.assoc_energy())
            * (self.complex.get_strand_count().saturating_sub(1) as f64);
        self.energy = self.complex.get_energy() + strand_correction;
        self.rate = self.complex.get_total_flux();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand_complex::tests_support::MockStrandComplex;

    #[test]
    fn test_fill_data_charges_strand_correction_once_per_extra_strand() {
        use ff_energy::SimpleEnergyModel;
        let model = SimpleEnergyModel::default();
        let mut entry = ComplexEntry::new(0, MockStrandComplex::new(2, 5.0, 3.0));
        entry.fill_data(&model);
        let expected = 5.0 + (model.volume_energy() + model.assoc_energy()) * 1.0;
        assert_eq!(entry.energy, expected);
        assert_eq!(entry.rate, 3.0);
    }
}
