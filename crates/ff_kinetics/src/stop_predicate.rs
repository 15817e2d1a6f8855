use crate::complex_list::ComplexList;
use crate::strand_complex::StrandComplex;

/// Stop-predicate clause discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopClauseType {
    Bound = 0,
    Disassoc = 1,
    Structure = 2,
    LooseStructure = 3,
    PercentOrCountStructure = 4,
}

/// One clause of a [`StopSpec`]: a target complex, identified by its
/// strand-id ordering up to circular rotation, plus an optional structure
/// string and tolerance.
#[derive(Debug, Clone)]
pub struct StopClause {
    pub kind: StopClauseType,
    pub id_list: Vec<u32>,
    pub structure: Option<String>,
    /// Tolerance for LOOSE_STRUCTURE/PERCENT_OR_COUNT_STRUCTURE; the caller
    /// converts a percentage tolerance to a raw mismatch count before
    /// constructing the clause.
    pub count: i64,
}

/// A conjunction of clauses, evaluated against the live population.
#[derive(Debug, Clone, Default)]
pub struct StopSpec {
    pub clauses: Vec<StopClause>,
}

impl StopSpec {
    /// Evaluates all clauses as a conjunction. Panics if more than one
    /// BOUND clause is present (ambiguous: bound to what?).
    /// Returns false immediately if there are more clauses than live
    /// complexes.
    pub fn evaluate<C: StrandComplex>(&self, list: &ComplexList<C>) -> bool {
        let bound_clauses = self.clauses.iter().filter(|c| c.kind == StopClauseType::Bound).count();
        assert!(bound_clauses <= 1, "only one BOUND clause is permitted in a stop spec");

        if self.clauses.len() > list.get_count() {
            return false;
        }

        self.clauses.iter().all(|clause| evaluate_clause(clause, list))
    }
}

fn evaluate_clause<C: StrandComplex>(clause: &StopClause, list: &ComplexList<C>) -> bool {
    match clause.kind {
        StopClauseType::Bound => clause
            .id_list
            .iter()
            .all(|&id| list.iter().any(|(_, e)| e.complex.check_id_bound(id))),
        StopClauseType::Disassoc => list
            .iter()
            .any(|(_, e)| e.complex.check_id_list(&clause.id_list, clause.id_list.len())),
        StopClauseType::Structure => {
            let target = clause.structure.as_deref().unwrap_or("");
            list.iter().any(|(_, e)| {
                e.complex.check_id_list(&clause.id_list, clause.id_list.len())
                    && structure_string(&e.complex) == target
            })
        }
        StopClauseType::LooseStructure => {
            let target = clause.structure.as_deref().unwrap_or("");
            list.iter().any(|(_, e)| {
                e.complex.check_id_list(&clause.id_list, clause.id_list.len())
                    && loose_match(&structure_string(&e.complex), target, clause.count)
            })
        }
        StopClauseType::PercentOrCountStructure => {
            let target = clause.structure.as_deref().unwrap_or("");
            list.iter().any(|(_, e)| {
                e.complex.check_id_list(&clause.id_list, clause.id_list.len())
                    && count_match(&structure_string(&e.complex), target, clause.count)
            })
        }
    }
}

fn structure_string<C: StrandComplex>(complex: &C) -> String {
    complex.get_structure().to_string()
}

/// Loose dot-bracket match with wildcard tolerance: `'*'` in `t` absorbs a
/// mismatch at that position for free. Returns true iff the accumulated
/// mismatch penalty never drops below zero.
pub fn loose_match(s: &str, t: &str, tolerance: i64) -> bool {
    bracket_match(s, t, tolerance, true)
}

/// Identical to [`loose_match`] but without the `'*'` wildcard exemption.
pub fn count_match(s: &str, t: &str, tolerance: i64) -> bool {
    bracket_match(s, t, tolerance, false)
}

fn bracket_match(s: &str, t: &str, tolerance: i64, wildcard: bool) -> bool {
    let s: Vec<char> = s.chars().collect();
    let t: Vec<char> = t.chars().collect();
    if s.len() != t.len() {
        return false;
    }

    let mut d = tolerance;
    let mut s_stack: Vec<usize> = Vec::new();
    let mut t_stack: Vec<usize> = Vec::new();

    for i in 0..s.len() {
        let cs = s[i];
        let ct = t[i];

        let exempt = wildcard && ct == '*';
        if !exempt && cs != ct {
            d -= 1;
        }

        if cs == '(' {
            s_stack.push(i);
        }
        if ct == '(' {
            t_stack.push(i);
        }

        match (cs == ')', ct == ')') {
            (true, true) => {
                let i_s = s_stack.pop().expect("unbalanced structure in loose/count match");
                let i_t = t_stack.pop().expect("unbalanced structure in loose/count match");
                if i_s != i_t {
                    d -= 1;
                    if s.get(i_t) == Some(&'(') {
                        d -= 1;
                    }
                }
            }
            (true, false) => {
                s_stack.pop().expect("unbalanced structure in loose/count match");
            }
            (false, true) => {
                let i_t = t_stack.pop().expect("unbalanced structure in loose/count match");
                if s.get(i_t) == Some(&'(') {
                    d -= 1;
                }
            }
            (false, false) => {}
        }

        if d < 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand_complex::tests_support::MockStrandComplex;
    use ff_structure::DotBracketVec;
    use std::convert::TryFrom;

    #[test]
    fn test_loose_match_wildcard_absorbs_mismatch() {
        assert!(loose_match("((..))", "((.*))", 0));
    }

    #[test]
    fn test_loose_match_without_wildcard_needs_tolerance() {
        assert!(!count_match("((..))", "((.x))", 0));
        assert!(count_match("((..))", "((.x))", 1));
    }

    #[test]
    fn test_count_match_closing_bracket_mismatch_pops_without_extra_penalty() {
        assert!(count_match("().", "(.)", 3));
        assert!(!count_match("().", "(.)", 2));
    }

    #[test]
    fn test_disassoc_stop_clause_matches_single_target() {
        let mut list = ComplexList::new();
        list.add_complex(MockStrandComplex::new(1, 0.0, 0.0).with_ordering(vec![1]));
        list.add_complex(MockStrandComplex::new(1, 0.0, 0.0).with_ordering(vec![2]));

        let spec_single = StopSpec {
            clauses: vec![StopClause {
                kind: StopClauseType::Disassoc,
                id_list: vec![1],
                structure: None,
                count: 0,
            }],
        };
        assert!(spec_single.evaluate(&list));

        let spec_both = StopSpec {
            clauses: vec![StopClause {
                kind: StopClauseType::Disassoc,
                id_list: vec![1, 2],
                structure: None,
                count: 0,
            }],
        };
        assert!(!spec_both.evaluate(&list));
    }

    #[test]
    fn test_structure_clause_matches_under_circular_rotation() {
        let mut list = ComplexList::new();
        let structure = DotBracketVec::try_from("((.))").unwrap();
        let mut complex = MockStrandComplex::new(3, 0.0, 0.0).with_ordering(vec![2, 3, 1]);
        complex.structure = Some(structure);
        list.add_complex(complex);

        let spec = StopSpec {
            clauses: vec![StopClause {
                kind: StopClauseType::Structure,
                id_list: vec![1, 2, 3],
                structure: Some("((.))".to_string()),
                count: 0,
            }],
        };
        assert!(spec.evaluate(&list));
    }

    #[test]
    #[should_panic]
    fn test_two_bound_clauses_is_a_hard_error() {
        let list: ComplexList<MockStrandComplex> = ComplexList::new();
        let spec = StopSpec {
            clauses: vec![
                StopClause { kind: StopClauseType::Bound, id_list: vec![1], structure: None, count: 0 },
                StopClause { kind: StopClauseType::Bound, id_list: vec![2], structure: None, count: 0 },
            ],
        };
        spec.evaluate(&list);
    }
}
