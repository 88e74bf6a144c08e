//! Library for deriving exhaustive conformance test suites from complete deterministic Mealy
//! machines.
//!
//! A test suite for a specification machine consists of access words for all states, followed
//! by some infix, followed by suffixes that confirm which state was reached. The hard part is
//! finding good suffixes, which is what most of this crate is about.
//! - A [`splitting_tree::SplittingTree`] is built by partition refinement over the states of the
//!   machine, and records for every split a word that separates the resulting blocks.
//! - From a tree that only contains splits that do not merge states (in the sense of Lee and
//!   Yannakakis), an [`ads::AdaptiveDistinguishingSequence`] is derived. This is a decision tree
//!   that identifies the state in which it is started, as far as possible.
//! - States that the adaptive distinguishing sequence can not tell apart are separated by words
//!   from a [`separating::SeparatingMatrix`]. Together this yields a
//!   [`family::SeparatingFamily`], which lists the suffixes for every state.
//!
//! Sets of words are de-duplicated with a [`trie::Trie`], and [`prepare::prepare_test_suite`]
//! runs all constructions, the independent ones concurrently.
//!
//! The library does not install a `tracing` subscriber, it only emits events.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use mealy_testing::prelude::*;` should be enough to use the package.
pub mod prelude {
    #[cfg(feature = "random")]
    pub use super::random::{generate_connected_minimal_machine, generate_random_machine};
    pub use super::{
        ads::{create_adaptive_distinguishing_sequence, AdaptiveDistinguishingSequence, AdsId},
        error::{Error, MealyError, RefineError},
        family::{
            create_separating_family, create_separating_family_from_tree, CharacterizationFamily,
            SeparatingFamily,
        },
        index::{word, Input, Output, State, Word},
        math,
        mealy::{MealyBuilder, MealyMachine, Transition},
        partition::{BlockId, Partition},
        prepare::{prepare_test_suite, SuffixMethod, TestSuiteConfig, TestSuiteParts},
        separating::SeparatingMatrix,
        show::Show,
        splitting_tree::{
            create_splitting_tree, LcaScratch, NodeId, SplittingTree, SplittingTreeOptions,
            SplittingTreeResult, SuccessorCache,
        },
        transfer::{create_transfer_sequences, TransferOptions, TransferSequences},
        trie::Trie,
    };
}

/// Nominal handles for states, inputs and outputs, and words over inputs.
pub mod index;
pub use index::{Input, Output, State, Word};

/// This module contains some definitions of mathematical objects which are used throughout the
/// crate and do not really fit to the top level.
pub mod math;

/// Error types.
pub mod error;
pub use error::Error;

/// Defines the [`show::Show`] trait for human readable output.
pub mod show;
pub use show::Show;

/// Complete deterministic Mealy machines.
pub mod mealy;
pub use mealy::MealyMachine;

pub mod partition;

pub mod splitting_tree;

pub mod ads;

/// The separating matrix, which holds a separating word for every pair of states.
pub mod separating;

pub mod family;

pub mod trie;

pub mod transfer;

pub mod prepare;

/// Implements the generation of random Mealy machines. This is feature gated behind the
/// `random` feature.
#[cfg(feature = "random")]
pub mod random;
