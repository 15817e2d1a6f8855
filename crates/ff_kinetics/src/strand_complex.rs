use ff_energy::{Base, MoveType};
use ff_structure::DotBracketVec;

use crate::base_counter::BaseCounter;
use crate::mv::Move;

/// The sequence of strand ids as encountered walking the complex's open
/// loops; used by stop predicates to match DISASSOC/STRUCTURE clauses up to
/// circular rotation.
pub type StrandOrdering = Vec<u32>;

/// Tag returned by a basic choice, carrying which pair of move-type
/// classifiers the energy model used to scale the chosen rate. Neutral on
/// the non-Arrhenius path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrheniusTag(pub MoveType, pub MoveType);

impl ArrheniusTag {
    pub const NEUTRAL: ArrheniusTag = ArrheniusTag(MoveType::LoopMove, MoveType::LoopMove);
}

/// External collaborator contract for one strand complex's loop graph: the
/// engine treats this as a black box exposing total flux and a weighted
/// choice entry point. A concrete implementation lives in [`crate::flat_complex`].
pub trait StrandComplex: Sized {
    fn generate_loops(&mut self);
    fn generate_moves(&mut self);
    fn get_energy(&self) -> f64;
    fn get_total_flux(&self) -> f64;
    fn get_strand_count(&self) -> usize;
    fn get_sequence(&self) -> &[Base];
    fn get_structure(&self) -> DotBracketVec;
    fn get_strand_names(&self) -> &[String];
    /// Exterior (unpaired) bases visible to a bimolecular join. When
    /// `use_arrhenius` is set the half-context neighborhoods must also be
    /// tracked by the caller via [`StrandComplex::get_ordering`].
    fn get_exterior_bases(&self, use_arrhenius: bool) -> BaseCounter;
    fn get_ordering(&self) -> StrandOrdering;
    /// `r` must already be the remainder after the engine subtracted all
    /// preceding complexes' rates; returns the move whose prefix interval
    /// contains it.
    fn get_choice(&self, r: f64) -> Move;
    /// Applies `mv` in place. Returns `Some(split)` when the move
    /// disconnects part of the complex into a new, independent one.
    fn do_choice(&mut self, mv: Move) -> Option<Self>;
    fn check_id_bound(&self, strand_id: u32) -> bool;
    /// True iff this complex's strand-id ordering matches `id_list` under
    /// some circular rotation and `id_list.len() == count`.
    fn check_id_list(&self, id_list: &[u32], count: usize) -> bool;
    fn cleanup(&mut self);
    fn update_local_context(&mut self);
    /// Merges `second` into `first` in place across the new pair
    /// `(types[0], types[1])` at exterior-base indices `index`, returning
    /// `second` back to the caller (now logically defunct) so its
    /// ComplexEntry can be unlinked.
    fn perform_complex_join(
        first: &mut Self,
        second: Self,
        types: [Base; 2],
        index: [usize; 2],
        use_arrhenius: bool,
    ) -> Self;
}

/// Rotates `id_list` against the slice of strand ids a complex actually
/// holds and reports whether any rotation matches exactly. Shared helper for
/// `check_id_list` implementations and for DISASSOC/STRUCTURE evaluation.
pub fn matches_circular_rotation(ordering: &[u32], id_list: &[u32]) -> bool {
    if ordering.len() != id_list.len() || ordering.is_empty() {
        return ordering.is_empty() && id_list.is_empty();
    }
    let n = ordering.len();
    (0..n).any(|shift| (0..n).all(|i| ordering[(i + shift) % n] == id_list[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_rotation_matches() {
        assert!(matches_circular_rotation(&[2, 3, 1], &[1, 2, 3]));
        assert!(matches_circular_rotation(&[1, 2, 3], &[1, 2, 3]));
        assert!(!matches_circular_rotation(&[1, 2, 3], &[1, 3, 2]));
    }

    #[test]
    fn test_circular_rotation_length_mismatch_is_false() {
        assert!(!matches_circular_rotation(&[1], &[1, 2]));
    }
}

/// A bare-bones [`StrandComplex`] used by `ff_kinetics`'s own tests (and by
/// `ComplexEntry`/`ComplexList`'s tests) to exercise the engine without the
/// full `FlatComplex` loop-graph machinery.
#[cfg(test)]
pub mod tests_support {
    use super::*;
    use ff_energy::Base;
    use ff_structure::DotBracketVec;
    use std::convert::TryFrom;

    #[derive(Debug, Clone)]
    pub struct MockStrandComplex {
        pub strand_count: usize,
        pub energy: f64,
        pub total_flux: f64,
        pub exterior: BaseCounter,
        pub ordering: StrandOrdering,
        pub moves: Vec<Move>,
        pub split: Option<Box<MockStrandComplex>>,
        pub structure: Option<DotBracketVec>,
    }

    impl MockStrandComplex {
        pub fn new(strand_count: usize, energy: f64, total_flux: f64) -> Self {
            MockStrandComplex {
                strand_count,
                energy,
                total_flux,
                exterior: BaseCounter::default(),
                ordering: (1..=strand_count as u32).collect(),
                moves: Vec::new(),
                split: None,
                structure: None,
            }
        }

        pub fn with_exterior(mut self, exterior: BaseCounter) -> Self {
            self.exterior = exterior;
            self
        }

        pub fn with_ordering(mut self, ordering: StrandOrdering) -> Self {
            self.ordering = ordering;
            self
        }
    }

    impl StrandComplex for MockStrandComplex {
        fn generate_loops(&mut self) {}
        fn generate_moves(&mut self) {}

        fn get_energy(&self) -> f64 {
            self.energy
        }

        fn get_total_flux(&self) -> f64 {
            self.total_flux
        }

        fn get_strand_count(&self) -> usize {
            self.strand_count
        }

        fn get_sequence(&self) -> &[Base] {
            &[]
        }

        fn get_structure(&self) -> DotBracketVec {
            self.structure.clone().unwrap_or_else(|| {
                DotBracketVec::try_from("").expect("empty structure is well-formed")
            })
        }

        fn get_strand_names(&self) -> &[String] {
            &[]
        }

        fn get_exterior_bases(&self, _use_arrhenius: bool) -> BaseCounter {
            self.exterior
        }

        fn get_ordering(&self) -> StrandOrdering {
            self.ordering.clone()
        }

        fn get_choice(&self, r: f64) -> Move {
            let mut acc = 0.0;
            for mv in &self.moves {
                acc += mv.rate;
                if r < acc {
                    return *mv;
                }
            }
            *self.moves.last().expect("MockStrandComplex has no moves to choose from")
        }

        fn do_choice(&mut self, _mv: Move) -> Option<Self> {
            self.split.take().map(|boxed| *boxed)
        }

        fn check_id_bound(&self, strand_id: u32) -> bool {
            self.ordering.contains(&strand_id)
        }

        fn check_id_list(&self, id_list: &[u32], count: usize) -> bool {
            id_list.len() == count && matches_circular_rotation(&self.ordering, id_list)
        }

        fn cleanup(&mut self) {}
        fn update_local_context(&mut self) {}

        fn perform_complex_join(
            first: &mut Self,
            second: Self,
            _types: [Base; 2],
            _index: [usize; 2],
            _use_arrhenius: bool,
        ) -> Self {
            first.strand_count += second.strand_count;
            first.exterior = first.exterior + second.exterior;
            first.ordering.extend(second.ordering.iter().copied());
            second
        }
    }
}
