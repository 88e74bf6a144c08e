#![allow(missing_docs)]
use thiserror::Error;

use crate::{partition::BlockId, Input, State};

/// Reasons for rejecting a transition table as input machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MealyError {
    #[error("a machine needs at least one state")]
    NoStates,
    #[error("{kind} index {index} is out of range, there are only {size}")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        size: usize,
    },
    #[error("state {state} has no transition on input {input}, the machine must be complete")]
    Incomplete { state: State, input: Input },
    #[error("state {state} has conflicting transitions on input {input}, the machine must be deterministic")]
    NonDeterministic { state: State, input: Input },
}

/// Misuse of a [`crate::partition::Partition`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefineError {
    #[error("classifier mapped element {element} to {code}, but codes must be below {range}")]
    CodeOutOfRange {
        element: usize,
        code: usize,
        range: usize,
    },
    #[error("block {0:?} has been split or merged and may no longer be used")]
    StaleBlock(BlockId),
    #[error("element {element} is not part of the universe of size {size}")]
    UnknownElement { element: usize, size: usize },
}

/// Errors that abort a construction. Note that an incomplete splitting tree is not an error,
/// it is reported through [`crate::splitting_tree::SplittingTreeResult::is_complete`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid machine: {0}")]
    InvalidMachine(#[from] MealyError),
    #[error("invalid refinement: {0}")]
    Refinement(#[from] RefineError),
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}
