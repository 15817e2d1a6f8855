//! # strandkinetics-cli
//!
//! The main entry point for the strandkinetics nucleic acid kinetics
//! package, with interfaces to multiple crates that are organized as a
//! workspace. At this level, you can also find argument parsers for the
//! binaries shipped with the package.
//!
//! This crate re-exports the main functionality from its submodules.

/// Exposing strandkinetics::structure. A collection of practical data
/// structures for RNA structure representations.
pub mod structure {
    pub use ::ff_structure::*;
}

/// Exposing strandkinetics::energy. Handling of nucleotide sequences,
/// nearest neighbor loop decompositions and free energy evaluation models.
pub mod energy {
    pub use ::ff_energy::*;
}

/// Exposing strandkinetics::kinetics. The main stochastic simulation
/// framework: rate models, the complex population engine, macrostates and
/// time courses.
pub mod kinetics {
    pub use ::ff_kinetics::*;
}

/// Various flavors of handling sequence/structure/stop-condition input.
pub mod input_parsers;

/// Exposing the currently supported parameters of strandkinetics's energy models.
pub mod energy_parsers;

/// Exposing the currently supported parameters of strandkinetics's rate models and simulation parameters.
pub mod kinetics_parsers;
