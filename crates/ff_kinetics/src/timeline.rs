use std::fmt;
use std::sync::Arc;
use std::error::Error;
use nohash_hasher::IntMap;
use ff_structure::DotBracketVec;

use crate::macrostates::MacrostateRegistry;

#[derive(Debug)]
pub enum TimelineError {
    Io(std::io::Error),
    Json(serde_json::Error),
    TimepointCountMismatch { found: usize, expected: usize },
    TimeMismatch { file_time: f64, expected_time: f64 },
    MacrostateNotFound(String),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Json(e) => write!(f, "JSON parse error: {}", e),
            Self::TimepointCountMismatch { found, expected } =>
                write!(f, "Timeline file has {found} timepoints, expected {expected}"),
            Self::TimeMismatch { file_time, expected_time } =>
                write!(f, "Time mismatch: {file_time} vs {expected_time}"),
            Self::MacrostateNotFound(name) =>
                write!(f, "Macrostate '{name}' not found in registry"),
        }
    }
}

impl Error for TimelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}


impl From<std::io::Error> for TimelineError {
    fn from(e: std::io::Error) -> Self { Self::Io(e) }
}

impl From<serde_json::Error> for TimelineError {
    fn from(e: serde_json::Error) -> Self { Self::Json(e) }
}


/// One time point with its ensemble of macrostates.
#[derive(Debug)]
pub struct Timepoint {
    /// Absolute time in seconds
    pub time: f64,
    /// Mapping from macrostate index → number of trajectories in this state
    pub ensemble: IntMap<usize, usize>,
    /// Total number of observations recorded at this timepoint
    pub counter: usize,
}

impl Timepoint {
    /// Create a new empty timepoint
    pub fn new(time: f64) -> Self {
        Self {
            time,
            ensemble: IntMap::default(),
            counter: 0,
        }
    }

    /// Add a count for the given macrostate index
    pub fn add(&mut self, macro_idx: usize) {
        *self.ensemble.entry(macro_idx).or_insert(0) += 1;
        self.counter += 1;
    }

    /// Get the count for a specific macrostate (or 0 if not present)
    pub fn count(&self, macro_idx: usize) -> usize {
        *self.ensemble.get(&macro_idx).unwrap_or(&0)
    }

    /// Return the occupancy (fraction of total) for a macrostate
    pub fn occupancy(&self, macro_idx: usize) -> f64 {
        if self.counter == 0 {
            0.0
        } else {
            self.count(macro_idx) as f64 / self.counter as f64
        }
    }

    /// Iterate over all macrostate counts
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ensemble.iter().map(|(k, v)| (*k, *v))
    }

}

/// Occupancy of a population of live complexes across named macrostates at a
/// sequence of checkpoint times.
pub struct Timeline {
    /// Registry of all macrostates (used to classify structures)
    pub registry: Arc<MacrostateRegistry>,

    /// One `Timepoint` per output time in the simulation
    pub points: Vec<Timepoint>,
}

impl Timeline {
    /// Build a new empty timeline for given times and an existing macrostate registry.
    pub fn new(times: &[f64], registry: Arc<MacrostateRegistry>) -> Self {
        let points = times.iter().map(|&t| Timepoint::new(t)).collect();
        Self { registry, points }
    }

    /// Classify a structure and add it to the timeline at the given time index.
    pub fn assign_structure(&mut self, t_idx: usize, structure: &DotBracketVec) {
        let m_idx = self.registry.classify(structure);
        self.points[t_idx].add(m_idx);
    }

    /// Classify every live complex's structure in the population and record
    /// the resulting occupancy counts at the given time index.
    pub fn assign_population<'s, I: IntoIterator<Item = &'s DotBracketVec>>(
        &mut self,
        t_idx: usize,
        structures: I,
    ) {
        for structure in structures {
            self.assign_structure(t_idx, structure);
        }
    }

    /// Get a reference to a timepoint by index.
    pub fn point(&self, t_idx: usize) -> &Timepoint {
        &self.points[t_idx]
    }

    /// Iterate over all timepoints with their index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Timepoint)> {
        self.points.iter().enumerate()
    }

    pub fn merge(&mut self, other: Timeline) {
        assert!(
            Arc::ptr_eq(&self.registry, &other.registry),
            "Cannot merge timelines with different registries"
        );
        assert_eq!(self.points.len(), other.points.len(),
        "Cannot merge timelines with different numbers of timepoints");

        for (self_tp, other_tp) in self.points.iter_mut().zip(other.points) {
            for (macro_idx, count) in other_tp.iter() {
                *self_tp.ensemble.entry(macro_idx).or_insert(0) += count;
            }
            self_tp.counter += other_tp.counter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macrostates::Macrostate;
    use ff_energy::{NucleotideVec, SimpleEnergyModel};
    use std::convert::TryFrom;

    fn registry() -> Arc<MacrostateRegistry> {
        let sequence = NucleotideVec::try_from("ACGU").unwrap();
        let model = SimpleEnergyModel::default();
        let mut reg = MacrostateRegistry::default();
        reg.insert(Macrostate::from_list(
            "folded",
            &[DotBracketVec::try_from("(())").unwrap()],
            &sequence,
            &model,
        ));
        Arc::new(reg)
    }

    #[test]
    fn test_assign_structure_increments_matching_timepoint() {
        let reg = registry();
        let mut tl = Timeline::new(&[0.0, 1.0], reg);
        let folded = DotBracketVec::try_from("(())").unwrap();
        tl.assign_structure(1, &folded);
        assert_eq!(tl.point(1).counter, 1);
        assert_eq!(tl.point(0).counter, 0);
    }

    #[test]
    fn test_assign_population_counts_every_structure() {
        let reg = registry();
        let mut tl = Timeline::new(&[0.0], reg);
        let folded = DotBracketVec::try_from("(())").unwrap();
        let unfolded = DotBracketVec::try_from("....").unwrap();
        tl.assign_population(0, &[folded.clone(), unfolded, folded]);
        assert_eq!(tl.point(0).counter, 3);
    }

    #[test]
    fn test_merge_sums_counters_across_timelines() {
        let reg = registry();
        let folded = DotBracketVec::try_from("(())").unwrap();
        let mut a = Timeline::new(&[0.0], Arc::clone(&reg));
        a.assign_structure(0, &folded);
        let mut b = Timeline::new(&[0.0], Arc::clone(&reg));
        b.assign_structure(0, &folded);

        a.merge(b);
        assert_eq!(a.point(0).counter, 2);
    }

    #[test]
    #[should_panic]
    fn test_merge_rejects_mismatched_registries() {
        let folded = DotBracketVec::try_from("(())").unwrap();
        let mut a = Timeline::new(&[0.0], registry());
        a.assign_structure(0, &folded);
        let mut b = Timeline::new(&[0.0], registry());
        b.assign_structure(0, &folded);
        a.merge(b);
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // DRF header
        writeln!(f, "{:>13} {:>5} {:>12} {:>10} {:>25}", "time", "id", "occupancy", "energy", "macrostate")?;
        for tp in self.points.iter() {
            let time = tp.time;
            let total = tp.counter.max(1);

            // Collect ensemble into a vector so we can sort it
            let mut entries: Vec<_> = tp.iter().collect();

            // Sort by energy, None last
            entries.sort_by(|(a_idx, _), (b_idx, _)| {
                let e_a = self.registry.get(*a_idx).ensemble_energy();
                let e_b = self.registry.get(*b_idx).ensemble_energy();
                e_a.partial_cmp(&e_b).unwrap_or(std::cmp::Ordering::Equal)
            });

            for (m_idx, count) in entries {
                let occu = count as f64 / total as f64;

                let name = self.registry.get(m_idx).name();
                let energy = self.registry.get(m_idx).ensemble_energy();

                writeln!(
                    f,
                    "{:13.9} {:5} {:12.8} {:>10} {:>25}",
                    time,
                    m_idx,
                    occu,
                    format!("{:10.2}", energy),
                    name,
                )?;
            }
        }
        Ok(())
    }
}


