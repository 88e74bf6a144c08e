use std::collections::VecDeque;

use crate::{error::MealyError, Input, Output, State};

/// The effect of reading a single input in some state: the state that is reached and the
/// output that is emitted on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    /// The state that is reached.
    pub target: State,
    /// The output that is emitted.
    pub output: Output,
}

/// A complete and deterministic Mealy machine. For every state and every input, there is
/// precisely one [`Transition`], which is stored in a dense table. States, inputs and outputs
/// are all identified by dense zero-based indices, the counts of which are stored explicitly.
/// Once built, a machine is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealyMachine {
    state_count: usize,
    input_count: usize,
    output_count: usize,
    table: Vec<Transition>,
}

impl MealyMachine {
    /// Starts building a machine with the given number of states, inputs and outputs.
    pub fn builder(state_count: usize, input_count: usize, output_count: usize) -> MealyBuilder {
        MealyBuilder {
            state_count,
            input_count,
            output_count,
            table: vec![None; state_count * input_count],
            error: None,
        }
    }

    /// Builds a machine by querying `f` for every state and input.
    pub fn from_fn<F>(
        state_count: usize,
        input_count: usize,
        output_count: usize,
        f: F,
    ) -> Result<Self, MealyError>
    where
        F: Fn(State, Input) -> (Output, State),
    {
        let mut builder = Self::builder(state_count, input_count, output_count);
        for state in State::range(state_count) {
            for input in Input::range(input_count) {
                let (output, target) = f(state, input);
                builder.insert(state.index(), input.index(), output.index(), target.index());
            }
        }
        builder.build()
    }

    /// Returns the number of states.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Returns the number of input symbols.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output symbols. Note that not all of them need to be used.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Iterates over all states in ascending order.
    pub fn states(&self) -> impl DoubleEndedIterator<Item = State> + ExactSizeIterator {
        State::range(self.state_count)
    }

    /// Iterates over all inputs in ascending order.
    pub fn inputs(&self) -> impl DoubleEndedIterator<Item = Input> + ExactSizeIterator {
        Input::range(self.input_count)
    }

    /// Returns the transition taken from `state` on `input`.
    ///
    /// Panics if either of them does not belong to this machine.
    pub fn transition(&self, state: State, input: Input) -> Transition {
        assert!(
            input.index() < self.input_count,
            "input {input} does not belong to this machine"
        );
        self.table[state.index() * self.input_count + input.index()]
    }

    /// Returns the state reached from `state` on `input`.
    pub fn successor(&self, state: State, input: Input) -> State {
        self.transition(state, input).target
    }

    /// Returns the output emitted from `state` on `input`.
    pub fn output(&self, state: State, input: Input) -> Output {
        self.transition(state, input).output
    }

    /// Runs `word` from `state` and returns the last transition that is taken, so the output
    /// is the one emitted on the final symbol. Gives back `None` for the empty word.
    pub fn run(&self, state: State, word: &[Input]) -> Option<Transition> {
        let mut current = state;
        let mut last = None;
        for &input in word {
            let t = self.transition(current, input);
            current = t.target;
            last = Some(t);
        }
        last
    }

    /// Returns the state that is reached by reading `word` from `state`.
    pub fn reached(&self, state: State, word: &[Input]) -> State {
        word.iter()
            .fold(state, |current, &input| self.successor(current, input))
    }

    /// Returns the full output sequence that is produced when reading `word` from `state`.
    pub fn outputs(&self, state: State, word: &[Input]) -> Vec<Output> {
        let mut current = state;
        word.iter()
            .map(|&input| {
                let t = self.transition(current, input);
                current = t.target;
                t.output
            })
            .collect()
    }

    /// Returns true if reading `word` from `left` and from `right` produces different outputs
    /// at some position.
    pub fn separates(&self, left: State, right: State, word: &[Input]) -> bool {
        self.outputs(left, word) != self.outputs(right, word)
    }

    /// Returns the states that are reachable from `origin` in breadth-first order, where
    /// successors are explored with ascending inputs.
    pub fn reachable_states(&self, origin: State) -> Vec<State> {
        let mut seen = vec![false; self.state_count];
        let mut order = vec![];
        let mut queue = VecDeque::from([origin]);
        seen[origin.index()] = true;
        while let Some(state) = queue.pop_front() {
            order.push(state);
            for input in self.inputs() {
                let target = self.successor(state, input);
                if !seen[target.index()] {
                    seen[target.index()] = true;
                    queue.push_back(target);
                }
            }
        }
        order
    }

    /// Restricts `self` to the states reachable from `initial`. These are renumbered in
    /// breadth-first order, so `initial` becomes state `0` of the returned machine.
    pub fn reachable_submachine(&self, initial: State) -> MealyMachine {
        let order = self.reachable_states(initial);
        let mut renumber = vec![None; self.state_count];
        for (i, state) in order.iter().enumerate() {
            renumber[state.index()] = Some(State::new(i));
        }
        let table = order
            .iter()
            .flat_map(|&state| self.inputs().map(move |input| (state, input)))
            .map(|(state, input)| {
                let t = self.transition(state, input);
                Transition {
                    // every successor of a reachable state is reachable
                    target: renumber[t.target.index()].unwrap_or(t.target),
                    output: t.output,
                }
            })
            .collect();
        MealyMachine {
            state_count: order.len(),
            input_count: self.input_count,
            output_count: self.output_count,
            table,
        }
    }

    /// Returns a string representation of the transition table.
    pub fn transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(self.inputs().map(|i| i.to_string())),
        );
        for state in self.states() {
            let row = std::iter::once(state.to_string()).chain(self.inputs().map(|input| {
                let t = self.transition(state, input);
                format!("{}|{}", t.output, t.target)
            }));
            builder.push_record(row);
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

/// Incrementally collects the transitions of a [`MealyMachine`]. Problems are recorded and
/// reported once [`MealyBuilder::build`] is called.
#[derive(Debug, Clone)]
pub struct MealyBuilder {
    state_count: usize,
    input_count: usize,
    output_count: usize,
    table: Vec<Option<Transition>>,
    error: Option<MealyError>,
}

impl MealyBuilder {
    /// Adds all transitions given as tuples `(source, input, output, target)`.
    pub fn with_transitions<I>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, usize, usize)>,
    {
        for (source, input, output, target) in transitions {
            self.insert(source, input, output, target);
        }
        self
    }

    /// Adds a single transition from `source` on `input` emitting `output` and going to `target`.
    pub fn with_transition(mut self, source: usize, input: usize, output: usize, target: usize) -> Self {
        self.insert(source, input, output, target);
        self
    }

    fn insert(&mut self, source: usize, input: usize, output: usize, target: usize) {
        if self.error.is_some() {
            return;
        }
        for (kind, index, size) in [
            ("state", source, self.state_count),
            ("input", input, self.input_count),
            ("output", output, self.output_count),
            ("state", target, self.state_count),
        ] {
            if index >= size {
                self.error = Some(MealyError::IndexOutOfRange { kind, index, size });
                return;
            }
        }

        let transition = Transition {
            target: State::new(target),
            output: Output::new(output),
        };
        let slot = &mut self.table[source * self.input_count + input];
        match slot {
            Some(existing) if *existing != transition => {
                self.error = Some(MealyError::NonDeterministic {
                    state: State::new(source),
                    input: Input::new(input),
                });
            }
            _ => *slot = Some(transition),
        }
    }

    /// Finishes the machine, failing if an invalid transition was added or if some state
    /// lacks a transition for some input.
    pub fn build(self) -> Result<MealyMachine, MealyError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.state_count == 0 {
            return Err(MealyError::NoStates);
        }
        let input_count = self.input_count;
        let table = self
            .table
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or(MealyError::Incomplete {
                    state: State::new(position / input_count),
                    input: Input::new(position % input_count),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MealyMachine {
            state_count: self.state_count,
            input_count,
            output_count: self.output_count,
            table,
        })
    }
}
