use rand::Rng;

use ff_energy::EnergyModel;

use crate::complex_list::ComplexList;
use crate::stop_predicate::StopSpec;
use crate::strand_complex::StrandComplex;

/// Why [`simulate_population`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop spec's clauses were satisfied.
    StopCondition,
    /// `t_max` was reached with the stop spec still unsatisfied.
    TimeLimit,
    /// No complex had any remaining move and no join was possible.
    NoFlux,
}

/// Drives a population of complexes forward with the Gillespie algorithm:
/// sample a waiting time from the current total flux, draw a move, apply
/// it, repeat. `callback` runs after the move has already been applied,
/// with the new absolute time and the (possibly resized) population —
/// split/join can change `list`'s membership, so the callback always sees
/// the post-move state rather than the state the waiting time was drawn
/// against.
pub fn simulate_population<C, M, R, F>(
    list: &mut ComplexList<C>,
    model: &M,
    stop: &StopSpec,
    t_max: f64,
    rng: &mut R,
    mut callback: F,
) -> (f64, StopReason)
where
    C: StrandComplex,
    M: EnergyModel,
    R: Rng + ?Sized,
    F: FnMut(f64, &ComplexList<C>),
{
    let mut t = 0.0;

    if stop.evaluate(list) {
        return (t, StopReason::StopCondition);
    }

    loop {
        let flux = list.get_total_flux(model);
        if flux <= 0.0 {
            return (t, StopReason::NoFlux);
        }

        let tinc = -rng.random::<f64>().ln() / flux;
        t += tinc;
        if t >= t_max {
            return (t_max, StopReason::TimeLimit);
        }

        let choice = rng.random::<f64>() * flux;
        list.do_basic_choice(choice, t, model);
        callback(t, list);

        if stop.evaluate(list) {
            return (t, StopReason::StopCondition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mv::{move_type, Move};
    use crate::stop_predicate::{StopClause, StopClauseType};
    use crate::strand_complex::tests_support::MockStrandComplex;
    use ff_energy::SimpleEnergyModel;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_simulate_population_stops_on_zero_flux() {
        let model = SimpleEnergyModel::default();
        let mut list: ComplexList<MockStrandComplex> = ComplexList::new();
        let h = list.add_complex(MockStrandComplex::new(1, 0.0, 0.0));
        list.fill_data(h, &model);

        let mut rng = StdRng::seed_from_u64(0);
        let stop = StopSpec::default();
        let (t, reason) = simulate_population(&mut list, &model, &stop, 10.0, &mut rng, |_, _| {});

        assert_eq!(reason, StopReason::NoFlux);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_simulate_population_applies_moves_until_time_limit() {
        let model = SimpleEnergyModel::default();
        let mut list: ComplexList<MockStrandComplex> = ComplexList::new();
        let mut complex = MockStrandComplex::new(1, 0.0, 0.0);
        complex.moves.push(Move::new(
            move_type::DELETE | move_type::ARITY_1,
            1.0,
            [Some(0), Some(1)],
            [0; 4],
        ));
        let h = list.add_complex(complex);
        list.fill_data(h, &model);

        let mut rng = StdRng::seed_from_u64(1);
        let stop = StopSpec::default();
        let mut callbacks = 0;
        let (t, reason) = simulate_population(&mut list, &model, &stop, 0.01, &mut rng, |_, _| {
            callbacks += 1;
        });

        assert_eq!(reason, StopReason::TimeLimit);
        assert_eq!(t, 0.01);
        assert!(callbacks >= 1);
    }

    #[test]
    fn test_simulate_population_stops_immediately_if_already_satisfied() {
        let model = SimpleEnergyModel::default();
        let mut list: ComplexList<MockStrandComplex> = ComplexList::new();
        let h = list.add_complex(MockStrandComplex::new(1, 0.0, 0.0).with_ordering(vec![1]));
        list.fill_data(h, &model);

        let stop = StopSpec {
            clauses: vec![StopClause {
                kind: StopClauseType::Bound,
                id_list: vec![1],
                structure: None,
                count: 0,
            }],
        };
        let mut rng = StdRng::seed_from_u64(0);
        let (t, reason) = simulate_population(&mut list, &model, &stop, 10.0, &mut rng, |_, _| {});

        assert_eq!(reason, StopReason::StopCondition);
        assert_eq!(t, 0.0);
    }
}
