//! Splitting trees as introduced by Lee and Yannakakis.
//!
//! A splitting tree records a sequence of partition refinements. The root holds all states of
//! a machine, and every internal node carries a separating word, such that the last output
//! produced when reading that word from its states differs exactly between different
//! children. Leaves are the blocks of states that could not be split (further).

use owo_colors::OwoColorize;

use crate::{show::Show, MealyMachine, State, Word};

mod builder;
mod lca;

pub use builder::create_splitting_tree;
pub use lca::LcaScratch;

/// Index of a node in a [`SplittingTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the position of the node in the arena of its tree.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single node of a [`SplittingTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplittingNode {
    states: Vec<State>,
    separator: Word,
    children: Vec<NodeId>,
    depth: usize,
}

impl SplittingNode {
    /// The states in this node, in ascending order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The word which splits this node into its children, empty for leaves.
    pub fn separator(&self) -> &[crate::Input] {
        &self.separator
    }

    /// The children of the node in the order in which they were created.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The distance to the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if the node has not been split.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A splitting tree, stored as an arena of nodes. The root has index `0` and children are
/// always created after their parent, so they have larger indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplittingTree {
    nodes: Vec<SplittingNode>,
}

impl SplittingTree {
    /// Creates a tree that consists of a single leaf containing the states `0..size`.
    pub fn new(size: usize) -> Self {
        Self {
            nodes: vec![SplittingNode {
                states: State::range(size).collect(),
                separator: vec![],
                children: vec![],
                depth: 0,
            }],
        }
    }

    /// Returns the index of the root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Gives access to the node with index `id`.
    pub fn node(&self, id: NodeId) -> &SplittingNode {
        &self.nodes[id.0]
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of states in the root.
    pub fn state_count(&self) -> usize {
        self.nodes[0].states.len()
    }

    /// Iterates over the indices of all nodes in order of creation, which is breadth-first.
    pub fn node_ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Iterates over the leaves of the tree.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|&id| self.node(id).is_leaf())
    }

    /// Returns the number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Returns the leaf that contains `state` by descending from the root.
    pub fn leaf_of(&self, state: State) -> Option<NodeId> {
        let mut current = self.root();
        if !self.node(current).states.contains(&state) {
            return None;
        }
        while !self.node(current).is_leaf() {
            current = *self
                .node(current)
                .children
                .iter()
                .find(|&&c| self.node(c).states.binary_search(&state).is_ok())?;
        }
        Some(current)
    }

    fn add_child(&mut self, parent: NodeId, states: Vec<State>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(SplittingNode {
            states,
            separator: vec![],
            children: vec![],
            depth,
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}

impl Show for SplittingTree {
    fn show(&self) -> String {
        fn recurse(tree: &SplittingTree, id: NodeId, out: &mut String) {
            let node = tree.node(id);
            out.push_str(&"  ".repeat(node.depth));
            if node.is_leaf() {
                out.push_str(&node.states.show().bold().to_string());
            } else {
                out.push_str(&format!(
                    "{} [{}]",
                    node.states.show(),
                    node.separator.show().blue()
                ));
            }
            out.push('\n');
            for &child in &node.children {
                recurse(tree, child, out);
            }
        }
        let mut out = String::new();
        recurse(self, self.root(), &mut out);
        out
    }
}

/// Remembers for every depth of a splitting tree, which state is reached when reading the
/// separator of the node at that depth that contains the state. As nodes at the same depth
/// are disjoint, one map per depth suffices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessorCache {
    state_count: usize,
    levels: Vec<Vec<Option<State>>>,
}

impl SuccessorCache {
    /// Creates an empty cache for a machine with `state_count` states.
    pub fn new(state_count: usize) -> Self {
        Self {
            state_count,
            levels: vec![],
        }
    }

    /// Returns the recorded successor of `state` at `depth`.
    pub fn get(&self, depth: usize, state: State) -> Option<State> {
        self.levels
            .get(depth)
            .and_then(|level| level.get(state.index()).copied().flatten())
    }

    /// Returns the number of depths for which something was recorded.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn record(&mut self, depth: usize, state: State, successor: State) {
        if self.levels.len() <= depth {
            self.levels.resize(depth + 1, vec![None; self.state_count]);
        }
        self.levels[depth][state.index()] = Some(successor);
    }
}

/// Configures how a splitting tree is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplittingTreeOptions {
    /// Only accept splits on an input that does not merge two states of the same resulting
    /// block, as required for adaptive distinguishing sequences.
    pub check_validity: bool,
    /// Record a [`SuccessorCache`].
    pub cache_successors: bool,
    /// Try the inputs in a random order for every node.
    pub randomized: bool,
    /// Verify that every split is as fine as the node used for it allows.
    pub assert_minimal_order: bool,
}

impl SplittingTreeOptions {
    /// Valid splits only and successors are cached, which is needed for an adaptive
    /// distinguishing sequence.
    pub const LEE_YANNAKAKIS: Self = Self {
        check_validity: true,
        cache_successors: true,
        randomized: false,
        assert_minimal_order: false,
    };
    /// Like [`Self::LEE_YANNAKAKIS`], but with randomized input order.
    pub const RANDOMIZED_LEE_YANNAKAKIS: Self = Self {
        randomized: true,
        ..Self::LEE_YANNAKAKIS
    };
    /// Classical partition refinement, where any split is accepted. This is faster and
    /// suffices for separating all pairs of states.
    pub const HOPCROFT: Self = Self {
        check_validity: false,
        cache_successors: false,
        randomized: false,
        assert_minimal_order: false,
    };
    /// Like [`Self::HOPCROFT`], but with randomized input order.
    pub const RANDOMIZED_HOPCROFT: Self = Self {
        randomized: true,
        ..Self::HOPCROFT
    };
    /// Like [`Self::HOPCROFT`], but every split is checked not to merge classes.
    pub const MIN_HOPCROFT: Self = Self {
        assert_minimal_order: true,
        ..Self::HOPCROFT
    };
    /// Like [`Self::MIN_HOPCROFT`], but with randomized input order.
    pub const RANDOMIZED_MIN_HOPCROFT: Self = Self {
        randomized: true,
        ..Self::MIN_HOPCROFT
    };

    /// Returns `self` with randomization switched on or off.
    pub fn with_randomized(self, randomized: bool) -> Self {
        Self { randomized, ..self }
    }
}

/// The outcome of building a splitting tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplittingTreeResult {
    /// The (possibly partial) tree.
    pub tree: SplittingTree,
    /// Successors under the separators, empty unless successors were cached.
    pub successor_cache: SuccessorCache,
    /// Whether every leaf is a singleton. If this is false, there is no complete adaptive
    /// distinguishing sequence for the chosen options and callers have to fall back to
    /// separating states pairwise.
    pub is_complete: bool,
}

impl SplittingTreeResult {
    /// Returns the root of the tree.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }
}

impl MealyMachine {
    /// Returns true if no two states of `self` are equivalent.
    pub fn is_minimal(&self) -> bool {
        match create_splitting_tree(self, SplittingTreeOptions::HOPCROFT, 0) {
            Ok(result) => result.tree.leaf_count() == self.state_count(),
            Err(_) => false,
        }
    }
}
