use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::{debug, trace, warn};

use super::{
    LcaScratch, NodeId, SplittingTree, SplittingTreeOptions, SplittingTreeResult, SuccessorCache,
};
use crate::{
    error::Error,
    index::concat,
    math,
    partition::{BlockId, Partition},
    show::Show,
    Input, MealyMachine, State, Word,
};

/// A split that was found for a node but has not been committed yet. `codes` assigns to every
/// state (by index) of the node the class it belongs to, and `successors` lists where each of
/// the node's states goes under `separator`.
struct Candidate {
    separator: Word,
    codes: Vec<usize>,
    successors: Vec<(State, State)>,
}

/// Builds a splitting tree for `machine`. The tree is built breadth-first and each leaf that
/// is dequeued is split by
/// 1. the output on a single input, or if that fails by
/// 2. an input followed by the separator of the lowest node of the current tree that
///    separates the successors of the leaf's states under that input.
///
/// If a leaf can not be split, it is put back into the queue. Once every queued leaf has
/// been retried without any progress since the last successful split, the tree is declared
/// incomplete and returned as it is.
///
/// The `seed` is only used when `options.randomized` is set, in which case the inputs are
/// shuffled for every node, and the same seed always gives the same tree.
pub fn create_splitting_tree(
    machine: &MealyMachine,
    options: SplittingTreeOptions,
    seed: u64,
) -> Result<SplittingTreeResult, Error> {
    Builder::new(machine, options, seed).build()
}

struct Builder<'a> {
    machine: &'a MealyMachine,
    options: SplittingTreeOptions,
    rng: fastrand::Rng,
    partition: Partition,
    tree: SplittingTree,
    cache: SuccessorCache,
    scratch: LcaScratch,
    inputs: Vec<Input>,
    work: VecDeque<(BlockId, NodeId)>,
}

impl<'a> Builder<'a> {
    fn new(machine: &'a MealyMachine, options: SplittingTreeOptions, seed: u64) -> Self {
        let n = machine.state_count();
        Self {
            machine,
            options,
            rng: fastrand::Rng::with_seed(seed),
            partition: Partition::new(n),
            tree: SplittingTree::new(n),
            cache: SuccessorCache::new(n),
            scratch: LcaScratch::default(),
            inputs: machine.inputs().collect(),
            work: VecDeque::new(),
        }
    }

    fn build(mut self) -> Result<SplittingTreeResult, Error> {
        let n = self.machine.state_count();
        if n > 0 {
            let root_block = self.partition.find(0)?;
            self.work.push_back((root_block, self.tree.root()));
        }

        let mut days_without_progress = 0usize;
        while let Some((block, node)) = self.work.pop_front() {
            if self.tree.node(node).states.len() <= 1 {
                continue;
            }

            if self.options.randomized {
                self.rng.shuffle(&mut self.inputs);
            }

            let candidate = match self.output_split(node) {
                Some(candidate) => Some(candidate),
                None => self.transfer_split(node)?,
            };

            match candidate {
                Some(candidate) => {
                    self.commit(block, node, candidate)?;
                    days_without_progress = 0;
                }
                None => {
                    // every node in the queue has been retried without success
                    if days_without_progress >= self.work.len() {
                        warn!(
                            "splitting tree is incomplete, {} is stuck",
                            self.tree.node(node).states.show()
                        );
                        return Ok(self.finish(false));
                    }
                    days_without_progress += 1;
                    self.work.push_back((block, node));
                }
            }
        }

        Ok(self.finish(true))
    }

    fn finish(self, is_complete: bool) -> SplittingTreeResult {
        debug!(
            "built splitting tree with {} nodes and {} leaves, complete: {}",
            self.tree.node_count(),
            self.tree.leaf_count(),
            is_complete
        );
        SplittingTreeResult {
            tree: self.tree,
            successor_cache: self.cache,
            is_complete,
        }
    }

    /// Attempts to split `node` on the output of a single input.
    fn output_split(&self, node: NodeId) -> Option<Candidate> {
        let states = &self.tree.node(node).states;
        for &input in &self.inputs {
            let codes = self.classify(states, |s| self.machine.output(s, input).index());
            if math::distinct_count(states.iter().map(|s| codes[s.index()])) < 2 {
                continue;
            }
            if !self.is_valid(states, &codes, input) {
                continue;
            }
            return Some(Candidate {
                separator: vec![input],
                codes,
                successors: states
                    .iter()
                    .map(|&s| (s, self.machine.successor(s, input)))
                    .collect(),
            });
        }
        None
    }

    /// Attempts to split `node` by moving to states that are already separated in the tree.
    fn transfer_split(&mut self, node: NodeId) -> Result<Option<Candidate>, Error> {
        let states = self.tree.node(node).states.clone();
        for position in 0..self.inputs.len() {
            let input = self.inputs[position];
            let targets: BitSet = states
                .iter()
                .map(|&s| self.machine.successor(s, input).index())
                .collect();

            let lca = self
                .tree
                .lowest_common_ancestor(&mut self.scratch, |s| targets.contains(s.index()));
            let oracle = self.tree.node(lca);
            if oracle.is_leaf() {
                continue;
            }

            let separator = concat(&[input], &oracle.separator);
            let mut successors = Vec::with_capacity(states.len());
            let mut codes = vec![0; self.machine.state_count()];
            for &s in &states {
                // the separator is non-empty, so there always is a last transition
                if let Some(t) = self.machine.run(s, &separator) {
                    codes[s.index()] = t.output.index();
                    successors.push((s, t.target));
                }
            }

            let classes = math::distinct_count(states.iter().map(|s| codes[s.index()]));
            if classes < 2 {
                return Err(Error::InvariantViolation(format!(
                    "separator {} taken from {:?} does not split {}",
                    separator.show(),
                    lca,
                    states.show()
                )));
            }

            if !self.is_valid(&states, &codes, input) {
                continue;
            }

            if self.options.assert_minimal_order {
                let hit = oracle
                    .children
                    .iter()
                    .filter(|&&c| self.scratch.mark(c) > 0)
                    .count();
                if hit != classes {
                    return Err(Error::InvariantViolation(format!(
                        "split of {} on {} yields {} classes, but {} children of {:?} are reached",
                        states.show(),
                        separator.show(),
                        classes,
                        hit,
                        lca
                    )));
                }
            }

            return Ok(Some(Candidate {
                separator,
                codes,
                successors,
            }));
        }
        Ok(None)
    }

    /// Computes a code for every state of `states`, stored at the index of the state.
    fn classify<F>(&self, states: &[State], f: F) -> Vec<usize>
    where
        F: Fn(State) -> usize,
    {
        let mut codes = vec![0; self.machine.state_count()];
        for &s in states {
            codes[s.index()] = f(s);
        }
        codes
    }

    /// A split is valid if `input` does not map two states that end up in the same class to
    /// the same state.
    fn is_valid(&self, states: &[State], codes: &[usize], input: Input) -> bool {
        !self.options.check_validity
            || math::injective_within_classes(
                states.iter().copied(),
                |s| codes[s.index()],
                |s| self.machine.successor(s, input),
            )
    }

    fn commit(&mut self, block: BlockId, node: NodeId, candidate: Candidate) -> Result<(), Error> {
        let Candidate {
            separator,
            codes,
            successors,
        } = candidate;
        let blocks = self.partition.refine(
            block,
            |element| codes[element],
            self.machine.output_count(),
        )?;
        if blocks.len() < 2 {
            return Err(Error::InvariantViolation(format!(
                "refining {} on {} did not split it",
                self.tree.node(node).states.show(),
                separator.show()
            )));
        }

        trace!(
            "splitting {} on {} into {} blocks",
            self.tree.node(node).states.show(),
            separator.show(),
            blocks.len()
        );

        let depth = self.tree.node(node).depth;
        if self.options.cache_successors {
            for (state, successor) in successors {
                self.cache.record(depth, state, successor);
            }
        }

        self.tree.nodes[node.0].separator = separator;
        for block in blocks {
            let states = self.partition.members(block)?.map(State::new).collect();
            let child = self.tree.add_child(node, states);
            self.work.push_back((block, child));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::word;
    use crate::show::Show;

    /// Three states where input 0 rotates A -> B -> C -> A, and only C outputs 1. Input 1 is
    /// a self-loop on every state with the same outputs.
    fn rotating() -> MealyMachine {
        MealyMachine::builder(3, 2, 2)
            .with_transitions([
                (0, 0, 0, 1),
                (1, 0, 0, 2),
                (2, 0, 1, 0),
                (0, 1, 0, 0),
                (1, 1, 0, 1),
                (2, 1, 1, 2),
            ])
            .build()
            .unwrap()
    }

    /// Two states that can not be told apart.
    fn duplicates() -> MealyMachine {
        MealyMachine::builder(2, 1, 1)
            .with_transitions([(0, 0, 0, 1), (1, 0, 0, 0)])
            .build()
            .unwrap()
    }

    /// Six states on a line, only the last one emits 1 on input 0. Input 1 resets most states.
    fn line() -> MealyMachine {
        MealyMachine::builder(6, 2, 2)
            .with_transitions([
                (0, 0, 0, 1),
                (0, 1, 0, 0),
                (1, 0, 0, 2),
                (1, 1, 0, 0),
                (2, 0, 0, 3),
                (2, 1, 0, 4),
                (3, 0, 0, 4),
                (3, 1, 0, 0),
                (4, 0, 0, 5),
                (4, 1, 0, 0),
                (5, 0, 1, 0),
                (5, 1, 0, 4),
            ])
            .build()
            .unwrap()
    }

    fn leaf_sets(tree: &SplittingTree) -> Vec<Vec<State>> {
        let mut sets: Vec<_> = tree.leaves().map(|l| tree.node(l).states.clone()).collect();
        sets.sort();
        sets
    }

    #[test_log::test]
    fn rotating_machine_splits_in_two_levels() {
        let machine = rotating();
        let result =
            create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 0).unwrap();
        assert!(result.is_complete);
        let tree = &result.tree;
        let root = tree.node(tree.root());
        assert_eq!(root.separator(), word([0]).as_slice());
        assert_eq!(root.children().len(), 2);

        let pair = tree.node(root.children()[0]);
        assert_eq!(pair.states(), &[State::new(0), State::new(1)]);
        assert_eq!(pair.separator(), word([0, 0]).as_slice());
        assert_eq!(pair.depth(), 1);
        assert!(pair
            .children()
            .iter()
            .all(|&c| tree.node(c).is_leaf() && tree.node(c).depth() == 2));
        assert!(tree.node(root.children()[1]).is_leaf());
        assert_eq!(tree.leaf_count(), 3);

        // successors are recorded at the depth of the node that was split
        let cache = &result.successor_cache;
        assert_eq!(cache.get(0, State::new(2)), Some(State::new(0)));
        assert_eq!(cache.get(1, State::new(0)), Some(State::new(2)));
        assert_eq!(cache.get(1, State::new(1)), Some(State::new(0)));
        tracing::debug!("\n{}", tree.show());
    }

    #[test]
    fn duplicate_states_are_incomplete() {
        for options in [
            SplittingTreeOptions::LEE_YANNAKAKIS,
            SplittingTreeOptions::HOPCROFT,
            SplittingTreeOptions::MIN_HOPCROFT,
        ] {
            let result = create_splitting_tree(&duplicates(), options, 0).unwrap();
            assert!(!result.is_complete);
            assert_eq!(result.tree.leaf_count(), 1);
        }
    }

    #[test]
    fn hopcroft_style_separates_minimal_machines() {
        let machine = line();
        assert!(machine.is_minimal());
        let result = create_splitting_tree(&machine, SplittingTreeOptions::MIN_HOPCROFT, 0).unwrap();
        assert!(result.is_complete);
        assert!(result.successor_cache.is_empty());
        assert_eq!(
            leaf_sets(&result.tree),
            machine.states().map(|s| vec![s]).collect::<Vec<_>>()
        );
    }

    #[test]
    fn lee_yannakakis_style_only_makes_valid_splits() {
        let machine = line();
        let result =
            create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 0).unwrap();
        let tree = &result.tree;
        for id in tree.node_ids().filter(|&id| !tree.node(id).is_leaf()) {
            let node = tree.node(id);
            let first = node.separator()[0];
            for &child in node.children() {
                let targets: Vec<_> = tree
                    .node(child)
                    .states()
                    .iter()
                    .map(|&s| machine.successor(s, first))
                    .collect();
                assert_eq!(math::distinct_count(targets.iter()), targets.len());
            }
        }
    }

    #[test]
    fn node_states_are_unions_of_children() {
        let machine = line();
        for options in [
            SplittingTreeOptions::LEE_YANNAKAKIS,
            SplittingTreeOptions::HOPCROFT,
        ] {
            let tree = create_splitting_tree(&machine, options, 0).unwrap().tree;
            for id in tree.node_ids().filter(|&id| !tree.node(id).is_leaf()) {
                let mut union: Vec<State> = tree
                    .node(id)
                    .children()
                    .iter()
                    .flat_map(|&c| tree.node(c).states().iter().copied())
                    .collect();
                union.sort();
                assert_eq!(union, tree.node(id).states());
                for &c in tree.node(id).children() {
                    assert!(tree.node(c).states().windows(2).all(|w| w[0] < w[1]));
                }
            }
        }
    }

    #[test]
    fn separators_distinguish_children() {
        let machine = line();
        let tree = create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 0)
            .unwrap()
            .tree;
        for id in tree.node_ids().filter(|&id| !tree.node(id).is_leaf()) {
            let node = tree.node(id);
            let children = node.children();
            for (i, &a) in children.iter().enumerate() {
                for &b in &children[i + 1..] {
                    for &s in tree.node(a).states() {
                        for &t in tree.node(b).states() {
                            assert!(machine.separates(s, t, node.separator()));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn randomized_construction_is_reproducible() {
        let machine = line();
        let options = SplittingTreeOptions::RANDOMIZED_LEE_YANNAKAKIS;
        let first = create_splitting_tree(&machine, options, 42).unwrap();
        let second = create_splitting_tree(&machine, options, 42).unwrap();
        assert_eq!(first, second);

        let plain = create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 0).unwrap();
        let again = create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 7).unwrap();
        // the seed is ignored without randomization
        assert_eq!(plain, again);
    }
}
