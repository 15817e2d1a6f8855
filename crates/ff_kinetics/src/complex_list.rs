use std::fmt;

use ff_energy::{Base, EnergyModel, MoveType};

use crate::base_counter::BaseCounter;
use crate::complex_entry::ComplexEntry;
use crate::strand_complex::{ArrheniusTag, StrandComplex};

/// Stable handle into a [`ComplexList`]'s arena. Valid until the entry it
/// names is unlinked by a join.
pub type ComplexHandle = usize;

const WC_PAIRS: [(Base, Base); 4] = [
    (Base::A, Base::U),
    (Base::U, Base::A),
    (Base::G, Base::C),
    (Base::C, Base::G),
];

/// The population: owns every live [`ComplexEntry`] in a vector-backed arena
/// addressed by stable integer handle (in place of a singly linked chain),
/// caches the cross-complex join flux, and implements two-level weighted
/// selection: pick a complex by its total rate, then delegate into it.
pub struct ComplexList<C: StrandComplex> {
    entries: Vec<Option<ComplexEntry<C>>>,
    free: Vec<usize>,
    /// Live handles in insertion order, newest first, so iteration order
    /// (and thus `choose`'s tie-break) is deterministic.
    order: Vec<ComplexHandle>,
    id_counter: u64,
    join_rate: f64,
}

impl<C: StrandComplex> Default for ComplexList<C> {
    fn default() -> Self {
        ComplexList {
            entries: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            id_counter: 0,
            join_rate: 0.0,
        }
    }
}

impl<C: StrandComplex> ComplexList<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live complexes.
    pub fn get_count(&self) -> usize {
        self.order.len()
    }

    pub fn join_rate(&self) -> f64 {
        self.join_rate
    }

    pub fn get(&self, handle: ComplexHandle) -> &ComplexEntry<C> {
        self.entries[handle].as_ref().expect("stale ComplexHandle")
    }

    pub fn get_mut(&mut self, handle: ComplexHandle) -> &mut ComplexEntry<C> {
        self.entries[handle].as_mut().expect("stale ComplexHandle")
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComplexHandle, &ComplexEntry<C>)> {
        self.order.iter().map(|&h| (h, self.get(h)))
    }

    /// Inserts a new complex, assigning it the next monotonically
    /// increasing id. Does not compute its cached energy/rate — call
    /// `fill_data` (directly, or via `get_total_flux`) afterwards.
    pub fn add_complex(&mut self, complex: C) -> ComplexHandle {
        let id = self.id_counter;
        self.id_counter += 1;
        let entry = ComplexEntry::new(id, complex);
        let handle = match self.free.pop() {
            Some(h) => {
                self.entries[h] = Some(entry);
                h
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        };
        self.order.insert(0, handle);
        handle
    }

    /// Recomputes the cached energy/rate of the entry at `handle`.
    pub fn fill_data<M: EnergyModel>(&mut self, handle: ComplexHandle, model: &M) {
        self.get_mut(handle).fill_data(model);
    }

    /// Runs `fill_data` for every live entry; call once after seeding the
    /// initial population.
    pub fn initialize_list<M: EnergyModel>(&mut self, model: &M) {
        for handle in self.order.clone() {
            self.fill_data(handle, model);
        }
    }

    fn remove(&mut self, handle: ComplexHandle) -> ComplexEntry<C> {
        let entry = self.entries[handle].take().expect("stale ComplexHandle");
        self.order.retain(|&h| h != handle);
        self.free.push(handle);
        entry
    }

    /// Sums `entry.rate` over the chain, then recomputes and caches
    /// `join_rate` via `get_join_flux`. O(n).
    pub fn get_total_flux<M: EnergyModel>(&mut self, model: &M) -> f64 {
        let unimolecular: f64 = self.order.iter().map(|&h| self.get(h).rate).sum();
        self.join_rate = self.get_join_flux(model);
        unimolecular + self.join_rate
    }

    /// Bimolecular flux across all ordered pairs of distinct complexes,
    /// computed without materializing the O(n^2) pairs: accumulate the
    /// running total of exterior bases, subtract out each complex's own
    /// contribution before folding it in, and multi-count against what
    /// remains (everything seen so far).
    pub fn get_join_flux<M: EnergyModel>(&self, model: &M) -> f64 {
        if self.order.len() <= 1 {
            return 0.0;
        }
        let use_arr = model.use_arrhenius();
        let mut total = BaseCounter::default();
        for &h in &self.order {
            total = total + self.get(h).complex.get_exterior_bases(use_arr);
        }
        let mut move_count: u64 = 0;
        for &h in &self.order {
            let own = self.get(h).complex.get_exterior_bases(use_arr);
            total = total - own;
            move_count += total.multi_count(&own);
        }
        let flux = move_count as f64 * model.join_rate();
        model.apply_prefactors(flux, MoveType::LoopMove, MoveType::LoopMove)
    }

    /// Two-level weighted dispatch. `choice` must be drawn from
    /// `[0, total_flux)` where `total_flux` is the value last returned by
    /// `get_total_flux`; the caller must not mutate the population between
    /// the two calls. `new_time` is accepted for trajectory annotation by
    /// the driver but never inspected by the core.
    pub fn do_basic_choice<M: EnergyModel>(
        &mut self,
        choice: f64,
        _new_time: f64,
        model: &M,
    ) -> ArrheniusTag {
        if choice < self.join_rate {
            self.do_join_choice(choice, model);
            return ArrheniusTag::NEUTRAL;
        }
        let mut remainder = choice - self.join_rate;
        let mut picked = None;
        for &h in &self.order {
            let rate = self.get(h).rate;
            if remainder < rate {
                picked = Some(h);
                break;
            }
            remainder -= rate;
        }
        let handle = picked.expect("doBasicChoice called with choice >= totalFlux");

        let mv = self.get(handle).complex.get_choice(remainder);
        let split = self.get_mut(handle).complex.do_choice(mv);
        if let Some(new_complex) = split {
            let new_handle = self.add_complex(new_complex);
            self.fill_data(new_handle, model);
        }
        self.fill_data(handle, model);
        ArrheniusTag::NEUTRAL
    }

    /// `choice` is still the raw flux draw scaled to the join branch;
    /// converts it to an integer index over the enumeration
    /// `Σ_{i<j} exterior(i).multi_count(exterior(j))` in list order, which
    /// is exactly the quantity `get_join_flux` sums — so the same `choice`
    /// that selected the join branch always resolves to a real pair.
    pub fn do_join_choice<M: EnergyModel>(&mut self, choice: f64, model: &M) {
        let use_arr = model.use_arrhenius();
        let scaled_rate = model.apply_prefactors(model.join_rate(), MoveType::LoopMove, MoveType::LoopMove);
        let mut k = (choice / scaled_rate).floor() as u64;

        let order = self.order.clone();
        for (pos, &hi) in order.iter().enumerate() {
            let ext_i = self.get(hi).complex.get_exterior_bases(use_arr);
            for &hj in &order[pos + 1..] {
                let ext_j = self.get(hj).complex.get_exterior_bases(use_arr);
                for &(b1, b2) in &WC_PAIRS {
                    let count = ext_i.count(b1) * ext_j.count(b2);
                    if count == 0 {
                        continue;
                    }
                    if k < count {
                        let idx_i = (k / ext_j.count(b2)) as usize;
                        let idx_j = (k % ext_j.count(b2)) as usize;
                        self.execute_join(hi, hj, [b1, b2], [idx_i, idx_j], use_arr, model);
                        return;
                    }
                    k -= count;
                }
            }
        }
        panic!("doJoinChoice: choice exceeded enumerable join combinations");
    }

    fn execute_join<M: EnergyModel>(
        &mut self,
        first: ComplexHandle,
        second: ComplexHandle,
        types: [Base; 2],
        index: [usize; 2],
        use_arr: bool,
        model: &M,
    ) {
        let second_entry = self.remove(second);
        let second_complex = second_entry.complex;
        let first_entry = self.get_mut(first);
        let _absorbed = C::perform_complex_join(
            &mut first_entry.complex,
            second_complex,
            types,
            index,
            use_arr,
        );
        self.fill_data(first, model);
    }

    /// Driver-API energy query. `entry.energy` already carries the
    /// per-extra-strand volume and association corrections charged once per
    /// strand beyond the first; this backs either correction back out when
    /// its bit is clear. `volume_flag` bit0 keeps the volume correction,
    /// bit1 keeps the association correction.
    pub fn get_energy<M: EnergyModel>(&self, model: &M, volume_flag: u8) -> Vec<f64> {
        self.order.iter().map(|&h| {
            let entry = self.get(h);
            let extra_strands = entry.complex.get_strand_count().saturating_sub(1) as f64;
            let mut energy = entry.energy;
            if volume_flag & 0x01 == 0 {
                energy -= model.volume_energy() * extra_strands;
            }
            if volume_flag & 0x02 == 0 {
                energy -= model.assoc_energy() * extra_strands;
            }
            energy
        }).collect()
    }
}

impl<C: StrandComplex> fmt::Display for ComplexList<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (handle, entry) in self.iter() {
            writeln!(f, "{:>4} {} {:>10.4} {:>10.4e}", handle, entry.complex.get_structure(), entry.energy, entry.rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand_complex::tests_support::MockStrandComplex;
    use ff_energy::SimpleEnergyModel;

    fn strand(bases: (u64, u64, u64, u64)) -> BaseCounter {
        BaseCounter { a: bases.0, c: bases.1, g: bases.2, u: bases.3 }
    }

    #[test]
    fn test_single_complex_join_rate_is_zero() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        let h = list.add_complex(MockStrandComplex::new(1, -5.0, 2.0));
        list.fill_data(h, &model);
        let total = list.get_total_flux(&model);
        assert_eq!(list.join_rate(), 0.0);
        assert_eq!(total, 2.0);
        assert_eq!(list.get_count(), 1);
    }

    #[test]
    fn test_two_complex_join_flux_matches_multi_count() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        let aaaa = MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((4, 0, 0, 0)));
        let tttt = MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((0, 0, 0, 4)));
        let h1 = list.add_complex(aaaa);
        let h2 = list.add_complex(tttt);
        list.fill_data(h1, &model);
        list.fill_data(h2, &model);

        let join_flux = list.get_join_flux(&model);
        assert_eq!(join_flux, 16.0 * model.join_rate());
    }

    #[test]
    fn test_three_complex_flux_is_additive_over_pairs() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        list.add_complex(MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((4, 0, 0, 0))));
        list.add_complex(MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((0, 0, 0, 4))));
        list.add_complex(MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((0, 0, 4, 0))));

        // AAAA-TTTT=16, AAAA-GGGG=0, TTTT-GGGG=0
        let join_flux = list.get_join_flux(&model);
        assert_eq!(join_flux, 16.0 * model.join_rate());
    }

    #[test]
    fn test_do_join_choice_merges_complexes_and_shrinks_count() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        let aaaa = MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((4, 0, 0, 0)));
        let tttt = MockStrandComplex::new(1, 0.0, 0.0).with_exterior(strand((0, 0, 0, 4)));
        let h1 = list.add_complex(aaaa);
        let h2 = list.add_complex(tttt);
        list.fill_data(h1, &model);
        list.fill_data(h2, &model);
        let _ = list.get_total_flux(&model);

        list.do_join_choice(0.0, &model);
        assert_eq!(list.get_count(), 1);
        let survivor = list.iter().next().unwrap().1;
        assert_eq!(survivor.complex.strand_count, 2);
    }

    #[test]
    fn test_do_basic_choice_on_single_complex_returns_neutral_tag() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        let mut complex = MockStrandComplex::new(1, -5.0, 3.0);
        complex.moves.push(crate::mv::Move::new(
            crate::mv::move_type::CREATE | crate::mv::move_type::ARITY_1,
            3.0,
            [Some(0), None],
            [0; 4],
        ));
        let h = list.add_complex(complex);
        list.fill_data(h, &model);
        let total = list.get_total_flux(&model);

        let tag = list.do_basic_choice(0.0, 1.0, &model);
        assert_eq!(tag, ArrheniusTag::NEUTRAL);
        assert_eq!(list.get_count(), 1);
        assert_eq!(total, 3.0);
    }

    #[test]
    fn test_get_energy_backs_out_corrections_by_flag() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        let h = list.add_complex(MockStrandComplex::new(3, -5.0, 0.0));
        list.fill_data(h, &model);
        let correction = (model.volume_energy() + model.assoc_energy()) * 2.0;

        assert_eq!(list.get_energy(&model, 0x03), vec![-5.0 + correction]);
        assert_eq!(list.get_energy(&model, 0x00), vec![-5.0]);
        assert_eq!(
            list.get_energy(&model, 0x01),
            vec![-5.0 + model.volume_energy() * 2.0],
        );
        assert_eq!(
            list.get_energy(&model, 0x02),
            vec![-5.0 + model.assoc_energy() * 2.0],
        );
    }

    #[test]
    fn test_display_renders_one_line_per_live_complex() {
        let model = SimpleEnergyModel::default();
        let mut list = ComplexList::new();
        let h1 = list.add_complex(MockStrandComplex::new(1, -5.0, 2.0));
        let h2 = list.add_complex(MockStrandComplex::new(1, -1.0, 0.5));
        list.fill_data(h1, &model);
        list.fill_data(h2, &model);

        let rendered = list.to_string();
        assert_eq!(rendered.lines().count(), 2);
    }
}
