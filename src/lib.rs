//! Library for converting finite automata into star automata.
//!
//! An automaton here is the explicit, record-level representation of a DFA or NFA: a list of states, each carrying its transitions keyed by input symbol, an alphabet, one initial state and a set of accepting states. Transitions may point at a single state (the shape a DFA record uses) or at a list of states (the NFA shape); both shapes appear in the wild, often mixed within one record, and are preserved as given rather than being normalized. See [`automaton`] for the in-memory model, which doubles as the JSON record schema.
//!
//! The conversion implemented by this crate produces, for an input automaton `A`, an automaton accepting the Kleene closure `L(A)*`. It does so without touching the structure of `A` itself: the initial state is renamed (its old identifier with `1` appended), every transition that referenced the old name is rewritten, each accepting state receives an epsilon transition back to the renamed start, and a fresh initial state reusing the old identifier is put in front, accepting and epsilon-linked to the renamed start so that the empty word is accepted too. The whole transform is a pure function of one automaton value, see [`star::star`].
//!
//! Batches of records are converted independently of one another: a record that fails to parse or that the transform rejects is reported and skipped, it never affects its siblings. The [`batch`] module drives whole intake directories through the conversion and reports per-record outcomes; the `starcvt` binary is a thin command line front-end over it.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use automata_star::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        automaton::{Automaton, State, StateId, Symbol, Targets},
        batch::{run_batch, BatchError, BatchSummary, RecordOutcome, RecordStatus},
        math,
        records::{output_name, read_automaton, write_automaton, RecordError, OUTPUT_SUFFIX},
        star::{augment, relabel, star, star_all, StarError, RENAME_SUFFIX},
    };
}

/// This module contains definitions of the collection types which are used throughout the
/// crate and do not really fit to the top level.
pub mod math;

/// Defines the in-memory representation of automata, which doubles as the schema of the
/// JSON record format.
pub mod automaton;

/// Implements the star transform: relabeling of the initial state, epsilon augmentation
/// and the composition of the two.
pub mod star;

/// Reading and writing of individual automaton records.
pub mod records;

/// Batch conversion of whole intake directories, with per-record isolation and a summary
/// of the outcomes.
pub mod batch;
