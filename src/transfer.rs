//! Transfer sequences, which lead from the initial state to every other state.

use std::collections::VecDeque;
use std::ops::Index;

use tracing::debug;

use crate::{Input, MealyMachine, State, Word};

/// Configures [`create_transfer_sequences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferOptions {
    /// Explore the inputs in a random order for every state, instead of ascending.
    pub randomized: bool,
}

impl TransferOptions {
    /// Inputs are explored in ascending order, which gives the length-lexicographically
    /// smallest access word for every state.
    pub const CANONICAL: Self = Self { randomized: false };
    /// Inputs are explored in a random order for every state.
    pub const RANDOMIZED: Self = Self { randomized: true };
}

/// A shortest word reaching each state, `None` for the states that can not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSequences {
    words: Vec<Option<Word>>,
}

impl TransferSequences {
    /// Returns the word leading to `state`, if it is reachable.
    pub fn get(&self, state: State) -> Option<&[Input]> {
        self.words.get(state.index())?.as_deref()
    }

    /// Number of states of the machine.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the machine has no states.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterates over the reachable states and their access words.
    pub fn iter(&self) -> impl Iterator<Item = (State, &[Input])> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(i, w)| Some((State::new(i), w.as_deref()?)))
    }

    /// Returns the number of reachable states.
    pub fn reachable_count(&self) -> usize {
        self.words.iter().filter(|w| w.is_some()).count()
    }
}

impl Index<State> for TransferSequences {
    type Output = Option<Word>;

    fn index(&self, index: State) -> &Self::Output {
        &self.words[index.index()]
    }
}

/// Computes a shortest access word for every state by a breadth-first search from `initial`.
/// With [`TransferOptions::RANDOMIZED`], the inputs are shuffled for every state by a
/// generator seeded with `seed`, so the result only depends on the seed.
pub fn create_transfer_sequences(
    machine: &MealyMachine,
    options: TransferOptions,
    initial: State,
    seed: u64,
) -> TransferSequences {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut inputs: Vec<Input> = machine.inputs().collect();
    let mut words: Vec<Option<Word>> = vec![None; machine.state_count()];

    words[initial.index()] = Some(vec![]);
    let mut queue = VecDeque::from([initial]);
    while let Some(state) = queue.pop_front() {
        if options.randomized {
            rng.shuffle(&mut inputs);
        }
        for &input in &inputs {
            let target = machine.successor(state, input);
            if words[target.index()].is_some() {
                continue;
            }
            let mut word = words[state.index()].clone().unwrap_or_default();
            word.push(input);
            words[target.index()] = Some(word);
            queue.push_back(target);
        }
    }

    let sequences = TransferSequences { words };
    debug!(
        "transfer sequences reach {} of {} states",
        sequences.reachable_count(),
        sequences.len()
    );
    sequences
}
