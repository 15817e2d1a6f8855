use crate::{Base, EnergyModel, LoopDecomposition, MoveType, NearestNeighborLoop, PairTypeRNA};

/// A minimal nearest-neighbor model: one stacking bonus per closing pair of a
/// loop, one loop-initiation penalty per loop, no dangles or coaxial
/// stacking. Sufficient to drive the engine end to end without the
/// out-of-scope full NN parameter tables.
#[derive(Debug, Clone, Copy)]
pub struct SimpleEnergyModel {
    temperature: f64,
    min_hairpin: usize,
    stack_bonus: i32,
    loop_penalty: i32,
    volume_energy: f64,
    assoc_energy: f64,
    join_rate: f64,
}

impl SimpleEnergyModel {
    pub fn new(temperature: f64) -> Self {
        SimpleEnergyModel {
            temperature,
            min_hairpin: 3,
            stack_bonus: -2,
            loop_penalty: 4,
            volume_energy: 1.96,
            assoc_energy: -1.0,
            join_rate: 1.0e6,
        }
    }
}

impl Default for SimpleEnergyModel {
    fn default() -> Self {
        SimpleEnergyModel::new(37.0)
    }
}

impl EnergyModel for SimpleEnergyModel {
    fn can_pair(&self, b1: Base, b2: Base) -> bool {
        PairTypeRNA::from((b1, b2)).can_pair()
    }

    fn min_hairpin_size(&self) -> usize {
        self.min_hairpin
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn energy_of_structure<T: LoopDecomposition>(&self, sequence: &[Base], structure: &T) -> i32 {
        structure
            .loops()
            .iter()
            .map(|l| self.energy_of_loop(sequence, l))
            .sum()
    }

    fn energy_of_loop(&self, sequence: &[Base], nn_loop: &NearestNeighborLoop) -> i32 {
        match nn_loop {
            NearestNeighborLoop::Hairpin { closing: (i, j) } => {
                self.loop_penalty + self.pair_bonus(sequence, *i, *j)
            }
            NearestNeighborLoop::Interior { closing: (i, j), inner: (p, q) } => {
                self.pair_bonus(sequence, *i, *j) + self.pair_bonus(sequence, *p, *q)
            }
            NearestNeighborLoop::Multibranch { closing: (i, j), branches } => {
                self.loop_penalty
                    + self.pair_bonus(sequence, *i, *j)
                    + branches.iter().map(|(p, q)| self.pair_bonus(sequence, *p, *q)).sum::<i32>()
            }
            NearestNeighborLoop::Exterior { branches } => {
                branches.iter().map(|(p, q)| self.pair_bonus(sequence, *p, *q)).sum()
            }
        }
    }

    fn volume_energy(&self) -> f64 {
        self.volume_energy
    }

    fn assoc_energy(&self) -> f64 {
        self.assoc_energy
    }

    fn join_rate(&self) -> f64 {
        self.join_rate
    }

    fn use_arrhenius(&self) -> bool {
        false
    }

    fn apply_prefactors(&self, rate: f64, _move_a: MoveType, _move_b: MoveType) -> f64 {
        rate
    }
}

impl SimpleEnergyModel {
    fn pair_bonus(&self, sequence: &[Base], i: usize, j: usize) -> i32 {
        if self.can_pair(sequence[i], sequence[j]) {
            self.stack_bonus
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_structure::PairTable;
    use std::convert::TryFrom;

    #[test]
    fn test_hairpin_energy_is_negative_with_valid_pair() {
        let model = SimpleEnergyModel::default();
        let sequence: Vec<Base> = "ACCGGGGGT"
            .chars()
            .map(|c| Base::try_from(c).unwrap())
            .collect();
        let pt = PairTable::try_from("(((...)))").unwrap();
        let total = model.energy_of_structure(&sequence, &pt);
        assert!(total < 0);
    }

    #[test]
    fn test_non_arrhenius_prefactors_are_identity() {
        let model = SimpleEnergyModel::default();
        assert!(!model.use_arrhenius());
        assert_eq!(
            model.apply_prefactors(model.join_rate(), MoveType::LoopMove, MoveType::LoopMove),
            model.join_rate()
        );
    }
}
