use std::fs;
use std::result;
use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::timeline::Timeline;
use crate::timeline::TimelineError;
use crate::macrostates::MacrostateRegistry;

#[derive(Serialize, Deserialize)]
pub struct SerializableTimeline {
    points: Vec<SerializableTimePoint>,
}

#[derive(Serialize, Deserialize)]
pub struct SerializableTimePoint {
    time: f64,
    ensemble: Vec<(String, usize)>, // (macrostate name, count)
    counter: usize,
}

impl Timeline {
    pub fn to_serializable(&self) -> SerializableTimeline {
        SerializableTimeline {
            points: self.points.iter().map(|tp| {
                let ensemble = tp.ensemble.iter()
                    .map(|(id, count)| {
                        let name = self.registry.get(*id).name().to_string();
                        (name, *count)
                    })
                    .collect();
                SerializableTimePoint {
                    time: tp.time,
                    ensemble,
                    counter: tp.counter,
                }
            }).collect()
        }
    }

    /// Load a timeline from a JSON file, checking against the provided registry
    pub fn from_file<P: AsRef<std::path::Path>>(
        path: P,
        times: &[f64],
        registry: Arc<MacrostateRegistry>,
    ) -> result::Result<Self, TimelineError> {
        let data = fs::read_to_string(path)?;
        let serial: SerializableTimeline = serde_json::from_str(&data)?;

        // Sanity check: number of timepoints must match
        if serial.points.len() != times.len() {
            return Err(TimelineError::TimepointCountMismatch {
                found: serial.points.len(),
                expected: times.len(),
            });
        }

        let mut timeline = Timeline::new(times, Arc::clone(&registry));

        for (tp, serial_tp) in timeline.points.iter_mut().zip(serial.points) {
            if (tp.time - serial_tp.time).abs() >= 1e-9 {
                return Err(TimelineError::TimeMismatch {
                    file_time: serial_tp.time,
                    expected_time: tp.time,
                });
            }

            for (name, count) in serial_tp.ensemble {
                // Look up macrostate by name in registry
                if let Some((idx, _m)) = registry.iter().find(|(_, m)| m.name() == name) {
                    *tp.ensemble.entry(idx).or_insert(0) += count;
                    tp.counter += count;
                } else {
                    return Err(TimelineError::MacrostateNotFound(name));
                }
            }
        }
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macrostates::Macrostate;
    use ff_energy::{NucleotideVec, SimpleEnergyModel};
    use ff_structure::DotBracketVec;
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
    fn test_roundtrip_through_json_file() {
        let reg = registry();
        let folded = DotBracketVec::try_from("(())").unwrap();
        let mut tl = Timeline::new(&[0.0, 5.0], Arc::clone(&reg));
        tl.assign_structure(0, &folded);
        tl.assign_structure(1, &folded);

        let path = std::env::temp_dir().join("ff_kinetics_timeline_io_roundtrip_test.json");
        let json = serde_json::to_string(&tl.to_serializable()).unwrap();
        fs::write(&path, json).unwrap();

        let loaded = Timeline::from_file(&path, &[0.0, 5.0], Arc::clone(&reg)).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded.point(0).counter, 1);
        assert_eq!(loaded.point(1).counter, 1);
    }

    #[test]
    fn test_from_file_rejects_timepoint_count_mismatch() {
        let reg = registry();
        let tl = Timeline::new(&[0.0], Arc::clone(&reg));

        let path = std::env::temp_dir().join("ff_kinetics_timeline_io_mismatch_test.json");
        let json = serde_json::to_string(&tl.to_serializable()).unwrap();
        fs::write(&path, json).unwrap();

        let result = Timeline::from_file(&path, &[0.0, 1.0], Arc::clone(&reg));
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(TimelineError::TimepointCountMismatch { found: 1, expected: 2 })));
    }

    #[test]
    fn test_from_file_rejects_unknown_macrostate_name() {
        let reg = registry();
        let path = std::env::temp_dir().join("ff_kinetics_timeline_io_unknown_test.json");
        let bogus = SerializableTimeline {
            points: vec![SerializableTimePoint {
                time: 0.0,
                ensemble: vec![("nonexistent".to_string(), 1)],
                counter: 1,
            }],
        };
        fs::write(&path, serde_json::to_string(&bogus).unwrap()).unwrap();

        let result = Timeline::from_file(&path, &[0.0], Arc::clone(&reg));
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(TimelineError::MacrostateNotFound(_))));
    }
}


