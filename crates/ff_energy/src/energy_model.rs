use crate::NearestNeighborLoop;
use crate::LoopDecomposition;
use crate::Base;

pub const K0: f64 = 273.15;

/// Classifies which side of a move a rate prefactor applies to. Passed in
/// pairs to `apply_prefactors` so an Arrhenius model can key its per-half-
/// context table; `LoopMove` is the neutral classifier used everywhere a
/// non-Arrhenius model ignores the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    LoopMove,
    Create,
    Delete,
    Shift,
}

pub trait EnergyModel {
    fn can_pair(&self, b1: Base, b2: Base) -> bool;

    fn min_hairpin_size(&self) -> usize;

    fn temperature(&self) -> f64;

    fn energy_of_structure<T: LoopDecomposition>(&self,
        sequence: &[Base],
        structure: &T
    ) -> i32;

    fn energy_of_loop(&self,
        sequence: &[Base],
        nn_loop: &NearestNeighborLoop
    ) -> i32;

    /// Per-strand volume correction added to a complex's cached energy once
    /// per extra strand beyond the first.
    fn volume_energy(&self) -> f64;

    /// Per-strand association correction, added alongside `volume_energy`.
    fn assoc_energy(&self) -> f64;

    /// Bulk bimolecular join rate, before prefactors.
    fn join_rate(&self) -> f64;

    /// Whether this model keys rates off per-half-context Arrhenius
    /// prefactors rather than a single bulk rate constant.
    fn use_arrhenius(&self) -> bool;

    /// Scales `rate` by the prefactor selected by the (move_a, move_b)
    /// context pair. Non-Arrhenius models return `rate` unchanged.
    fn apply_prefactors(&self, rate: f64, move_a: MoveType, move_b: MoveType) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use Base::*;

    pub struct MockEnergyModel;

    impl EnergyModel for MockEnergyModel {
        fn can_pair(&self, b1: Base, b2: Base) -> bool {
            matches!((b1, b2), (A, U) | (U, A) | (C, G) | (G, C))
        }

        fn min_hairpin_size(&self) -> usize {
            3
        }

        fn temperature(&self) -> f64 {
            37.0
        }

        fn energy_of_structure<T: LoopDecomposition>(
            &self,
            _sequence: &[Base],
            _structure: &T,
        ) -> i32 {
            -10
        }

        fn energy_of_loop(
            &self,
            _sequence: &[Base],
            _nn_loop: &NearestNeighborLoop,
        ) -> i32 {
            5
        }

        fn volume_energy(&self) -> f64 {
            1.96
        }

        fn assoc_energy(&self) -> f64 {
            -1.0
        }

        fn join_rate(&self) -> f64 {
            1.0
        }

        fn use_arrhenius(&self) -> bool {
            false
        }

        fn apply_prefactors(&self, rate: f64, _move_a: MoveType, _move_b: MoveType) -> f64 {
            rate
        }
    }

    #[test]
    fn test_can_pair() {
        let model = MockEnergyModel;
        assert!(model.can_pair(A, U));
        assert!(model.can_pair(C, G));
        assert!(!model.can_pair(A, G));
        assert!(!model.can_pair(C, C));
    }

    #[test]
    fn test_min_hairpin_size() {
        let model = MockEnergyModel;
        assert_eq!(model.min_hairpin_size(), 3);
    }

    #[test]
    fn test_energy_of_loop() {
        let model = MockEnergyModel;

        let sequence = vec![A, U, C, G];
        let nn_loop = NearestNeighborLoop::Hairpin { closing: (0, 3) };

        let energy = model.energy_of_loop(&sequence, &nn_loop);
        assert_eq!(energy, 5);
    }

    #[test]
    fn test_apply_prefactors_identity_for_bulk_model() {
        let model = MockEnergyModel;
        let scaled = model.apply_prefactors(model.join_rate(), MoveType::LoopMove, MoveType::LoopMove);
        assert_eq!(scaled, 1.0);
        assert!(!model.use_arrhenius());
    }
}
