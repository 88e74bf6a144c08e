//! Adaptive distinguishing sequences following Lee and Yannakakis.
//!
//! An adaptive distinguishing sequence is a decision tree: in every node a word is applied,
//! and depending on the observed output, the experiment continues in one of the children.
//! Every node keeps track of the pairs `(current, initial)` of states that are still
//! possible, where `initial` is the state the experiment started in and `current` is the
//! state it has moved to.

use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::{debug, trace};

use crate::{
    error::Error,
    show::Show,
    splitting_tree::{LcaScratch, SplittingTreeResult},
    Input, State, Word,
};

/// Index of a node in an [`AdaptiveDistinguishingSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdsId(usize);

/// A node of an [`AdaptiveDistinguishingSequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdsNode {
    pairs: Vec<(State, State)>,
    word: Word,
    children: Vec<AdsId>,
    depth: usize,
}

impl AdsNode {
    /// The pairs `(current, initial)` of this node, sorted by the current state.
    pub fn pairs(&self) -> &[(State, State)] {
        &self.pairs
    }

    /// The word that is applied in this node, empty for leaves.
    pub fn word(&self) -> &[Input] {
        &self.word
    }

    /// The children of this node.
    pub fn children(&self) -> &[AdsId] {
        &self.children
    }

    /// The distance to the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if the experiment ends in this node.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterates over the initial states that end up in this node.
    pub fn initial_states(&self) -> impl Iterator<Item = State> + '_ {
        self.pairs.iter().map(|&(_, initial)| initial)
    }
}

/// An adaptive distinguishing sequence, stored as an arena of nodes with the root at index 0.
/// If it is incomplete, some leaves contain more than one pair, the initial states of those
/// can not be distinguished by this sequence alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveDistinguishingSequence {
    nodes: Vec<AdsNode>,
}

impl AdaptiveDistinguishingSequence {
    /// The sequence that does nothing: a single leaf containing all `size` states. Using it
    /// means that all states have to be separated pairwise.
    pub fn trivial(size: usize) -> Self {
        Self {
            nodes: vec![AdsNode {
                pairs: State::range(size).map(|s| (s, s)).collect(),
                word: vec![],
                children: vec![],
                depth: 0,
            }],
        }
    }

    /// Returns the root.
    pub fn root(&self) -> AdsId {
        AdsId(0)
    }

    /// Gives access to the node `id`.
    pub fn node(&self, id: AdsId) -> &AdsNode {
        &self.nodes[id.0]
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of states the sequence was built for.
    pub fn state_count(&self) -> usize {
        self.nodes[0].pairs.len()
    }

    /// Iterates over all leaves.
    pub fn leaves(&self) -> impl Iterator<Item = AdsId> + '_ {
        (0..self.nodes.len())
            .map(AdsId)
            .filter(|&id| self.node(id).is_leaf())
    }

    /// Returns true if every leaf identifies exactly one initial state.
    pub fn is_complete(&self) -> bool {
        self.leaves().all(|l| self.node(l).pairs.len() <= 1)
    }

    /// Returns the leaf in which the experiment ends when started in `initial`.
    pub fn leaf_of(&self, initial: State) -> Option<AdsId> {
        let holds = |id: AdsId| self.node(id).initial_states().any(|s| s == initial);
        let mut current = self.root();
        if !holds(current) {
            return None;
        }
        while !self.node(current).is_leaf() {
            current = *self.node(current).children.iter().find(|&&c| holds(c))?;
        }
        Some(current)
    }

    /// Returns the concatenation of all words applied when starting in `initial`.
    pub fn path_word(&self, initial: State) -> Option<Word> {
        let leaf = self.leaf_of(initial)?;
        let mut path = vec![];
        let mut current = self.root();
        while current != leaf {
            let node = self.node(current);
            path.extend_from_slice(&node.word);
            current = *node
                .children
                .iter()
                .find(|&&c| self.node(c).initial_states().any(|s| s == initial))?;
        }
        Some(path)
    }

    fn push(&mut self, node: AdsNode) -> AdsId {
        self.nodes.push(node);
        AdsId(self.nodes.len() - 1)
    }
}

/// Derives an adaptive distinguishing sequence from a splitting tree. The tree has to be
/// built with validity checks and a successor cache, see
/// [`crate::splitting_tree::SplittingTreeOptions::LEE_YANNAKAKIS`]. If the tree is incomplete,
/// so is the resulting sequence.
pub fn create_adaptive_distinguishing_sequence(
    splitting_tree: &SplittingTreeResult,
) -> Result<AdaptiveDistinguishingSequence, Error> {
    let tree = &splitting_tree.tree;
    let cache = &splitting_tree.successor_cache;
    let n = tree.state_count();

    let mut sequence = AdaptiveDistinguishingSequence::trivial(n);
    let mut scratch = LcaScratch::default();
    let mut work = VecDeque::from([sequence.root()]);

    while let Some(id) = work.pop_front() {
        if sequence.node(id).pairs.len() < 2 {
            continue;
        }

        let current: BitSet = sequence
            .node(id)
            .pairs
            .iter()
            .map(|&(c, _)| c.index())
            .collect();
        let oracle_id = tree.lowest_common_ancestor(&mut scratch, |s| current.contains(s.index()));
        let oracle = tree.node(oracle_id);
        if oracle.is_leaf() {
            trace!(
                "states {} remain ambiguous",
                sequence.node(id).initial_states().collect::<Vec<_>>().show()
            );
            continue;
        }

        let depth = sequence.node(id).depth;
        let mut children = vec![];
        for &child in oracle.children() {
            let pairs = sequence.node(id).pairs();
            let states = tree.node(child).states();

            // both are sorted by state, so we can intersect by merging
            let (mut i, mut j) = (0, 0);
            let mut remaining = vec![];
            while i < pairs.len() && j < states.len() {
                let (current, initial) = pairs[i];
                match current.cmp(&states[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        let Some(next) = cache.get(oracle.depth(), current) else {
                            return Err(Error::InvariantViolation(format!(
                                "no successor of {current} cached at depth {}",
                                oracle.depth()
                            )));
                        };
                        remaining.push((next, initial));
                        i += 1;
                        j += 1;
                    }
                }
            }

            remaining.sort();
            if remaining.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(Error::InvariantViolation(format!(
                    "separator {} merges states, the splitting tree has invalid splits",
                    oracle.separator().show()
                )));
            }

            if !remaining.is_empty() {
                children.push(AdsNode {
                    pairs: remaining,
                    word: vec![],
                    children: vec![],
                    depth: depth + 1,
                });
            }
        }

        if children.len() < 2 {
            return Err(Error::InvariantViolation(format!(
                "node {:?} of the adaptive distinguishing sequence has {} children",
                id,
                children.len()
            )));
        }

        sequence.nodes[id.0].word = oracle.separator().to_vec();
        for child in children {
            let child = sequence.push(child);
            sequence.nodes[id.0].children.push(child);
            work.push_back(child);
        }
    }

    debug!(
        "built adaptive distinguishing sequence with {} nodes, complete: {}",
        sequence.node_count(),
        sequence.is_complete()
    );
    Ok(sequence)
}
