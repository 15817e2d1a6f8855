use std::collections::HashMap;

use ff_energy::{Base, EnergyModel, LoopDecomposition};
use ff_structure::{DotBracket, DotBracketVec, Neighborhood, PairTable};

use crate::base_counter::BaseCounter;
use crate::mv::{move_type, Move, MoveContainer, MoveList};
use crate::rate_model::{Metropolis, RateModel};
use crate::strand_complex::{matches_circular_rotation, StrandComplex, StrandOrdering};

/// Reference [`StrandComplex`]: a single flat [`PairTable`] over the
/// concatenation of every strand's bases, plus strand boundaries recorded as
/// cumulative end offsets. A per-loop incremental graph of `MoveContainer`s
/// wired into a tree is collapsed to one flat `MoveList` rebuilt from
/// scratch after every move — simpler bookkeeping, and sufficient since
/// callers only ever see this type through the `StrandComplex` trait.
pub struct FlatComplex<M: EnergyModel + Clone> {
    model: M,
    rates: Metropolis,
    sequence: Vec<Base>,
    pair_table: PairTable,
    /// Cumulative, exclusive end offset of each strand in `sequence`.
    strand_bounds: Vec<usize>,
    strand_ids: Vec<u32>,
    strand_names: Vec<String>,
    moves: MoveList,
    energy_centikcal: i32,
}

fn build_pair_table(structure: &[DotBracket]) -> PairTable {
    let mut stack = Vec::new();
    let mut table = Vec::new();
    for db in structure {
        match db {
            DotBracket::Open => {
                stack.push(table.len());
                table.push(None);
            }
            DotBracket::Close => {
                let i = stack.pop().expect("unbalanced structure in FlatComplex::new");
                let j = table.len();
                table[i] = Some(j);
                table.push(Some(i));
            }
            DotBracket::Unpaired => table.push(None),
            DotBracket::Break => {}
        }
    }
    assert!(stack.is_empty(), "unbalanced structure in FlatComplex::new");
    PairTable(table)
}

fn strand_bounds_from(structure: &[DotBracket]) -> Vec<usize> {
    let mut bounds = Vec::new();
    let mut count = 0;
    for db in structure {
        match db {
            DotBracket::Break => bounds.push(count),
            _ => count += 1,
        }
    }
    bounds.push(count);
    bounds
}

impl<M: EnergyModel + Clone> FlatComplex<M> {
    /// `k0` is the Metropolis base rate constant (per second); `structure`
    /// must carry exactly `strands.len() - 1` strand breaks.
    pub fn new(model: M, k0: f64, strands: Vec<(u32, String, Vec<Base>)>, structure: &DotBracketVec) -> Self {
        let rates = Metropolis::new(model.temperature(), k0);
        let sequence: Vec<Base> = strands.iter().flat_map(|(_, _, seq)| seq.iter().copied()).collect();
        let strand_ids = strands.iter().map(|(id, _, _)| *id).collect();
        let strand_names = strands.iter().map(|(_, name, _)| name.clone()).collect();

        let pair_table = build_pair_table(structure);
        let strand_bounds = strand_bounds_from(structure);

        assert_eq!(sequence.len(), pair_table.len(), "sequence length must match structure length");
        assert_eq!(strand_bounds.len(), strands.len(), "structure strand breaks must match strand count");

        let mut complex = FlatComplex {
            model,
            rates,
            sequence,
            pair_table,
            strand_bounds,
            strand_ids,
            strand_names,
            moves: MoveList::new(),
            energy_centikcal: 0,
        };
        complex.update_local_context();
        complex
    }

    fn strand_of(&self, pos: usize) -> usize {
        self.strand_bounds.iter().position(|&end| pos < end).expect("position out of range")
    }

    fn delta_energy_for_toggle(&self, i: usize, j: usize, creating: bool) -> i32 {
        let mut trial = self.pair_table.clone();
        if creating {
            trial[i] = Some(j);
            trial[j] = Some(i);
        } else {
            trial[i] = None;
            trial[j] = None;
        }
        let after = self.model.energy_of_structure(&self.sequence, &trial);
        after - self.energy_centikcal
    }

    fn nth_exterior_position(&self, base: Base, n: usize) -> usize {
        let exterior = self.pair_table.loop_enclosed_by(None);
        exterior
            .unpaired_indices(self.sequence.len())
            .into_iter()
            .filter(|&idx| self.sequence[idx] == base)
            .nth(n)
            .expect("join index out of range for the exterior base pool")
    }

    /// Union-find over strands connected by a surviving base pair; each
    /// returned group lists the strand indices of one connected component.
    fn connected_components(&self) -> Vec<Vec<usize>> {
        let n = self.strand_bounds.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], x: usize) -> usize {
            if parent[x] != x {
                let root = find(parent, parent[x]);
                parent[x] = root;
            }
            parent[x]
        }

        for (i, &partner) in self.pair_table.iter().enumerate() {
            if let Some(j) = partner {
                if j > i {
                    let si = self.strand_of(i);
                    let sj = self.strand_of(j);
                    if si != sj {
                        let ri = find(&mut parent, si);
                        let rj = find(&mut parent, sj);
                        if ri != rj {
                            parent[ri] = rj;
                        }
                    }
                }
            }
        }

        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for s in 0..n {
            let root = find(&mut parent, s);
            groups.entry(root).or_default().push(s);
        }
        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        groups.sort_by_key(|g| g[0]);
        groups
    }

    /// Builds a fresh complex from a subset of this one's strands. Every
    /// surviving base pair must have both endpoints inside `group` — true by
    /// construction since `group` comes from `connected_components`.
    fn extract_group(&self, group: &[usize]) -> Self {
        let mut pos_map: HashMap<usize, usize> = HashMap::new();
        let mut sequence = Vec::new();
        let mut strand_bounds = Vec::new();
        let mut strand_ids = Vec::new();
        let mut strand_names = Vec::new();

        for &s in group {
            let start = if s == 0 { 0 } else { self.strand_bounds[s - 1] };
            let end = self.strand_bounds[s];
            for pos in start..end {
                pos_map.insert(pos, sequence.len());
                sequence.push(self.sequence[pos]);
            }
            strand_bounds.push(sequence.len());
            strand_ids.push(self.strand_ids[s]);
            strand_names.push(self.strand_names[s].clone());
        }

        let mut table = vec![None; sequence.len()];
        for (&old_pos, &new_pos) in pos_map.iter() {
            if let Some(old_partner) = self.pair_table[old_pos] {
                let new_partner = *pos_map
                    .get(&old_partner)
                    .expect("pair partner must stay within the same connected group");
                table[new_pos] = Some(new_partner);
            }
        }

        FlatComplex {
            model: self.model.clone(),
            rates: self.rates,
            sequence,
            pair_table: PairTable(table),
            strand_bounds,
            strand_ids,
            strand_names,
            moves: MoveList::new(),
            energy_centikcal: 0,
        }
    }

    fn split_off(&mut self, mut components: Vec<Vec<usize>>) -> Self {
        let keep = components.remove(0);
        let rest: Vec<usize> = components.into_iter().flatten().collect();

        let mut detached = self.extract_group(&rest);
        *self = self.extract_group(&keep);
        detached.update_local_context();
        detached
    }
}

impl<M: EnergyModel + Clone> StrandComplex for FlatComplex<M> {
    fn generate_loops(&mut self) {
        self.energy_centikcal = self.model.energy_of_structure(&self.sequence, &self.pair_table);
    }

    fn generate_moves(&mut self) {
        let mut moves = MoveList::new();
        for (i, j) in Neighborhood::del_neighbors(&self.pair_table) {
            let (i, j) = (i as usize, j as usize);
            let delta = self.delta_energy_for_toggle(i, j, false);
            moves.add_move(Move::new(
                move_type::DELETE | move_type::ARITY_1,
                self.rates.rate(delta),
                [Some(i), Some(j)],
                [i as u16, j as u16, 0, 0],
            ));
        }
        for (i, j) in Neighborhood::add_neighbors(&self.pair_table) {
            let (i, j) = (i as usize, j as usize);
            if !self.model.can_pair(self.sequence[i], self.sequence[j]) {
                continue;
            }
            let delta = self.delta_energy_for_toggle(i, j, true);
            moves.add_move(Move::new(
                move_type::CREATE | move_type::ARITY_1,
                self.rates.rate(delta),
                [Some(i), Some(j)],
                [i as u16, j as u16, 0, 0],
            ));
        }
        self.moves = moves;
    }

    fn get_energy(&self) -> f64 {
        self.energy_centikcal as f64 / 100.0
    }

    fn get_total_flux(&self) -> f64 {
        self.moves.total_rate()
    }

    fn get_strand_count(&self) -> usize {
        self.strand_bounds.len()
    }

    fn get_sequence(&self) -> &[Base] {
        &self.sequence
    }

    fn get_structure(&self) -> DotBracketVec {
        let mut out = Vec::with_capacity(self.sequence.len() + self.strand_bounds.len().saturating_sub(1));
        let mut start = 0;
        for (k, &end) in self.strand_bounds.iter().enumerate() {
            for pos in start..end {
                let db = match self.pair_table[pos] {
                    None => DotBracket::Unpaired,
                    Some(j) if j > pos => DotBracket::Open,
                    Some(_) => DotBracket::Close,
                };
                out.push(db);
            }
            if k + 1 < self.strand_bounds.len() {
                out.push(DotBracket::Break);
            }
            start = end;
        }
        DotBracketVec(out)
    }

    fn get_strand_names(&self) -> &[String] {
        &self.strand_names
    }

    fn get_exterior_bases(&self, _use_arrhenius: bool) -> BaseCounter {
        let exterior = self.pair_table.loop_enclosed_by(None);
        let mut counter = BaseCounter::default();
        for idx in exterior.unpaired_indices(self.sequence.len()) {
            counter.increment(self.sequence[idx]);
        }
        counter
    }

    fn get_ordering(&self) -> StrandOrdering {
        self.strand_ids.clone()
    }

    fn get_choice(&self, r: f64) -> Move {
        *self.moves.choose(r)
    }

    fn do_choice(&mut self, mv: Move) -> Option<Self> {
        let i = mv.index[0] as usize;
        let j = mv.index[1] as usize;
        if mv.is_create() {
            self.pair_table[i] = Some(j);
            self.pair_table[j] = Some(i);
            self.update_local_context();
            return None;
        }

        self.pair_table[i] = None;
        self.pair_table[j] = None;

        let components = self.connected_components();
        let split = if components.len() > 1 { Some(self.split_off(components)) } else { None };
        self.update_local_context();
        split
    }

    fn check_id_bound(&self, strand_id: u32) -> bool {
        self.strand_ids.contains(&strand_id)
    }

    fn check_id_list(&self, id_list: &[u32], count: usize) -> bool {
        id_list.len() == count && matches_circular_rotation(&self.strand_ids, id_list)
    }

    fn cleanup(&mut self) {
        self.moves.reset_delete_moves();
    }

    fn update_local_context(&mut self) {
        self.generate_loops();
        self.generate_moves();
    }

    fn perform_complex_join(
        first: &mut Self,
        second: Self,
        types: [Base; 2],
        index: [usize; 2],
        _use_arrhenius: bool,
    ) -> Self {
        let pos_first = first.nth_exterior_position(types[0], index[0]);
        let pos_second = second.nth_exterior_position(types[1], index[1]);
        let offset = first.sequence.len();

        first.sequence.extend(second.sequence.iter().copied());
        first
            .pair_table
            .0
            .extend(second.pair_table.iter().map(|p| p.map(|q| q + offset)));

        let new_i = pos_first;
        let new_j = offset + pos_second;
        first.pair_table[new_i] = Some(new_j);
        first.pair_table[new_j] = Some(new_i);

        first.strand_bounds.extend(second.strand_bounds.iter().map(|&b| b + offset));
        first.strand_ids.extend(second.strand_ids.iter().copied());
        first.strand_names.extend(second.strand_names.iter().cloned());

        first.update_local_context();
        second
    }
}
