use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Cursor};
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use paste::paste;
use ff_structure::DotBracketVec;
use ff_energy::{Base, NucleotideVec};
use ff_kinetics::{StopClause, StopClauseType, StopSpec};

// ============================================================
//  Generic FASTA-like parser supporting lenient/strict modes
// ============================================================

#[derive(Clone, Copy)]
enum FastaMode {
    Lenient,
    Strict,
}

/// Core parsing logic shared by all adapters.
fn parse_fasta_like<R: BufRead>(
    reader: R,
    mode: FastaMode,
) -> Result<(Option<String>, NucleotideVec, DotBracketVec)> {
    let mut header: Option<String> = None;
    let mut sequence: Option<NucleotideVec> = None;
    let mut structure: Option<DotBracketVec> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            if sequence.is_some() && structure.is_some() {
                break;
            } else {
                continue;
            }
        }

        if line.starts_with('>') {
            header = Some(line.to_string());
        } else if sequence.is_none() {
            let token = line.split_whitespace().next().unwrap();
            sequence = Some(NucleotideVec::from_lossy(token));
        } else if structure.is_none() {
            let token = line.split_whitespace().next().unwrap();
            structure = Some(DotBracketVec::try_from(token)?);
            break;
        }
    }

    let sequence = sequence.ok_or_else(|| anyhow!("Missing sequence line"))?;

    let structure = match (structure, mode) {
        (Some(s), _) => s,
        (None, FastaMode::Lenient) => {
            DotBracketVec::try_from(".".repeat(sequence.len()).as_str())
                .expect("Failed to construct open-chain structure")
        }
        (None, FastaMode::Strict) => return Err(anyhow!("Missing structure line")),
    };

    if sequence.len() != structure.len() {
        return Err(anyhow!(
            "Sequence length ({}) and structure length ({}) do not match",
            sequence.len(),
            structure.len()
        ));
    }

    Ok((header, sequence, structure))
}

// ============================================================
//  Base parser functions (lenient and strict variants)
// ============================================================

pub fn read_fasta_like<R: BufRead>(reader: R) -> Result<(Option<String>, NucleotideVec, DotBracketVec)> {
    parse_fasta_like(reader, FastaMode::Lenient)
}

pub fn read_eval<R: BufRead>(reader: R) -> Result<(Option<String>, NucleotideVec, DotBracketVec)> {
    parse_fasta_like(reader, FastaMode::Strict)
}

// ============================================================
//  Multi-strand complex parser
// ============================================================

/// One strand: its (per-complex, caller-assigned) id, an optional name, and
/// its bases.
pub type StrandSpec = (u32, String, Vec<Base>);

/// Parses a complex input file: a header line, a `+`/`&`-joined sequence
/// line (one token per strand), and a matching structure line carrying one
/// fewer break as bonds. Unlike [`read_fasta_like`], the sequence line is
/// split on strand separators *before* base parsing, so separators never
/// get silently folded into `Base::N`.
pub fn read_complex<R: BufRead>(reader: R) -> Result<(Option<String>, Vec<StrandSpec>, DotBracketVec)> {
    let mut header: Option<String> = None;
    let mut strands: Option<Vec<StrandSpec>> = None;
    let mut structure: Option<DotBracketVec> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            if strands.is_some() && structure.is_some() {
                break;
            }
            continue;
        }

        if line.starts_with('>') {
            header = Some(line.to_string());
        } else if strands.is_none() {
            let token = line.split_whitespace().next().unwrap();
            strands = Some(
                token
                    .split(['+', '&'])
                    .enumerate()
                    .map(|(i, chunk)| -> Result<StrandSpec> {
                        let seq = NucleotideVec::try_from(chunk)
                            .map_err(|e| anyhow!("strand {}: {}", i + 1, e))?;
                        Ok(((i + 1) as u32, format!("strand{}", i + 1), seq.0))
                    })
                    .collect::<Result<Vec<_>>>()?,
            );
        } else if structure.is_none() {
            let token = line.split_whitespace().next().unwrap();
            structure = Some(DotBracketVec::try_from(token)?);
            break;
        }
    }

    let strands = strands.ok_or_else(|| anyhow!("Missing sequence line"))?;
    let structure = structure.ok_or_else(|| anyhow!("Missing structure line"))?;

    let total_bases: usize = strands.iter().map(|(_, _, seq)| seq.len()).sum();
    if total_bases != structure.len() {
        bail!(
            "Sequence length ({}) and structure length ({}) do not match",
            total_bases,
            structure.len()
        );
    }

    Ok((header, strands, structure))
}

// ============================================================
//  Stop-condition file parser
// ============================================================

/// Parses a stop-condition spec from lines of the form:
/// `<CLAUSE> <id,id,...> [: <structure> [tolerance]]`, where `<CLAUSE>` is
/// one of `bound`, `disassoc`, `structure`, `loose`, `percent`/`count`
/// (case-insensitive). Blank lines and `#`-prefixed comments are skipped.
/// All clauses in a file form one conjunction.
pub fn read_stop_spec<R: BufRead>(reader: R) -> Result<StopSpec> {
    let mut clauses = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (head, tail) = match line.split_once(':') {
            Some((h, t)) => (h.trim(), Some(t.trim())),
            None => (line, None),
        };

        let mut head_parts = head.split_whitespace();
        let kind_tok = head_parts
            .next()
            .ok_or_else(|| anyhow!("stop spec line {}: missing clause type", lineno + 1))?;
        let ids_tok = head_parts.next().unwrap_or("");

        let kind = match kind_tok.to_ascii_lowercase().as_str() {
            "bound" => StopClauseType::Bound,
            "disassoc" => StopClauseType::Disassoc,
            "structure" => StopClauseType::Structure,
            "loose" | "loose_structure" => StopClauseType::LooseStructure,
            "percent" | "count" | "percent_or_count_structure" => StopClauseType::PercentOrCountStructure,
            other => bail!("stop spec line {}: unknown clause type '{}'", lineno + 1, other),
        };

        let id_list: Vec<u32> = if ids_tok.is_empty() {
            Vec::new()
        } else {
            ids_tok
                .split(',')
                .map(|s| s.trim().parse::<u32>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| anyhow!("stop spec line {}: bad strand id list: {}", lineno + 1, e))?
        };

        let (structure, count) = match tail {
            None => (None, 0),
            Some(t) => {
                let mut parts = t.split_whitespace();
                let structure = parts.next().map(|s| s.to_string());
                let count = parts
                    .next()
                    .map(|c| c.parse::<i64>())
                    .transpose()
                    .map_err(|e| anyhow!("stop spec line {}: bad tolerance: {}", lineno + 1, e))?
                    .unwrap_or(0);
                (structure, count)
            }
        };

        clauses.push(StopClause { kind, id_list, structure, count });
    }

    Ok(StopSpec { clauses })
}

// ============================================================
//  Macro generating file/string/stdin/input helpers
// ============================================================

/// Generate input adapters for a base parser function `fn base<R: BufRead>(R) -> Result<T>`.
///
/// This expands into:
/// - `base_string(&str)`
/// - `base_file<P: AsRef<Path>>(P)`
/// - `base_stdin()`
/// - `base_input(&str)`  (dispatches "-" → stdin, otherwise → file)
macro_rules! define_input_variants {
    ($base:ident, $ret:ty) => {
        paste! {
            /// Read from a string buffer.
            pub fn [<$base _string>](s: &str) -> $ret {
                $base(Cursor::new(s))
            }

            /// Read from a file path.
            pub fn [<$base _file>]<P: AsRef<Path>>(path: P) -> $ret {
                let reader = BufReader::new(File::open(path)?);
                $base(reader)
            }

            /// Read from stdin.
            pub fn [<$base _stdin>]() -> $ret {
                let reader = BufReader::new(stdin());
                $base(reader)
            }

            /// Read either from stdin ("-") or a file path.
            pub fn [<$base _input>](s: &str) -> $ret {
                if s == "-" {
                    [<$base _stdin>]()
                } else {
                    [<$base _file>](s)
                }
            }
        }
    };
}

// ============================================================
//  Apply macro to generate adapters for all base parsers
// ============================================================

type FastaResult = Result<(Option<String>, NucleotideVec, DotBracketVec)>;
type ComplexResult = Result<(Option<String>, Vec<StrandSpec>, DotBracketVec)>;
type StopSpecResult = Result<StopSpec>;

define_input_variants!(read_fasta_like, FastaResult);
define_input_variants!(read_eval, FastaResult);
define_input_variants!(read_complex, ComplexResult);
define_input_variants!(read_stop_spec, StopSpecResult);

// ============================================================
//  Example helper: ruler()
// ============================================================

pub fn ruler(len: usize) -> String {
    let mut s = String::new();
    let mut c = 0;
    for i in 0..=len {
        if i % 10 == 0 {
            let t = format!("{}", i / 10);
            c = t.len() - 1;
            s.push_str(&t);
            continue;
        } else if c > 0 {
            c -= 1;
            continue;
        }
        if i % 10 == 5 {
            s.push(',');
        } else {
            s.push('.');
        }
    }
    s
}

// ============================================================
//  Unit tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruler() {
        assert_eq!(ruler(0), "0");
        assert_eq!(ruler(5), "0....,");
        assert_eq!(ruler(10), "0....,....1");
    }

    #[test]
    fn test_read_fasta_like_basic() {
        let input = ">test\nACGU\n....\n";
        let (hdr, seq, dbv) = read_fasta_like_string(input).unwrap();
        assert_eq!(hdr, Some(">test".into()));
        assert_eq!(seq.to_string(), "ACGU");
        assert_eq!(dbv.to_string(), "....");
    }

    #[test]
    fn test_read_eval_input_strict_mode() {
        let input = ">test\nACGU\n....\n";
        let ok = read_eval_string(input);
        assert!(ok.is_ok());

        let missing = ">test\nACGU\n";
        let err = read_eval_string(missing);
        assert!(err.is_err(), "Missing structure line should fail in strict mode");
    }

    #[test]
    fn test_read_complex_splits_strands_on_separator() {
        let input = ">duplex\nACGU+UGCA\n((((+))))\n";
        let (hdr, strands, dbv) = read_complex_string(input).unwrap();
        assert_eq!(hdr, Some(">duplex".into()));
        assert_eq!(strands.len(), 2);
        assert_eq!(strands[0].2, vec![Base::A, Base::C, Base::G, Base::U]);
        assert_eq!(strands[1].2, vec![Base::U, Base::G, Base::C, Base::A]);
        assert_eq!(dbv.to_string(), "((((+))))");
    }

    #[test]
    fn test_read_complex_rejects_length_mismatch() {
        let input = ">bad\nACGU+UGCA\n((((.))))\n";
        assert!(read_complex_string(input).is_err());
    }

    #[test]
    fn test_read_stop_spec_parses_bound_and_structure_clauses() {
        let input = "bound 1,2\nstructure 1,2: ((..))\n# a comment\n";
        let spec = read_stop_spec_string(input).unwrap();
        assert_eq!(spec.clauses.len(), 2);
        assert_eq!(spec.clauses[0].kind, StopClauseType::Bound);
        assert_eq!(spec.clauses[0].id_list, vec![1, 2]);
        assert_eq!(spec.clauses[1].kind, StopClauseType::Structure);
        assert_eq!(spec.clauses[1].structure.as_deref(), Some("((..))"));
    }

    #[test]
    fn test_read_stop_spec_parses_tolerance() {
        let input = "loose 1: ((.*)) 1\n";
        let spec = read_stop_spec_string(input).unwrap();
        assert_eq!(spec.clauses[0].kind, StopClauseType::LooseStructure);
        assert_eq!(spec.clauses[0].count, 1);
    }

    #[test]
    fn test_read_stop_spec_rejects_unknown_clause() {
        assert!(read_stop_spec_string("bogus 1\n").is_err());
    }
}
