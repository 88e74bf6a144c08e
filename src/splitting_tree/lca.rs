use tracing::trace;

use super::{NodeId, SplittingTree};
use crate::State;

/// Scratch space for [`SplittingTree::lowest_common_ancestor`]. It is owned by the caller, so
/// the tree itself is never mutated by a query. After a query, the marks computed by it can
/// be inspected through [`LcaScratch::mark`] until the next query.
#[derive(Debug, Clone, Default)]
pub struct LcaScratch {
    marks: Vec<usize>,
}

impl LcaScratch {
    /// Returns the mark of `node` computed by the last query: for a leaf the number of states
    /// satisfying the predicate, for an internal node the number of children with a non-zero
    /// mark.
    pub fn mark(&self, node: NodeId) -> usize {
        self.marks.get(node.0).copied().unwrap_or(0)
    }
}

impl SplittingTree {
    /// Finds the lowest node in which at least two states satisfying `predicate` are still
    /// grouped together, meaning that they lie in different children of that node or in the
    /// same leaf. If at most one state satisfies `predicate`, the leaf containing it is
    /// returned.
    ///
    /// Marks are computed bottom-up in one pass over the arena, after which the tree is
    /// descended from the root, so each query takes time linear in the size of the tree.
    pub fn lowest_common_ancestor<F>(&self, scratch: &mut LcaScratch, predicate: F) -> NodeId
    where
        F: Fn(State) -> bool,
    {
        let marks = &mut scratch.marks;
        marks.clear();
        marks.resize(self.nodes.len(), 0);

        // children have larger indices than their parents
        for (id, node) in self.nodes.iter().enumerate().rev() {
            let mark = if node.is_leaf() {
                node.states.iter().filter(|&&s| predicate(s)).count()
            } else {
                node.children.iter().filter(|c| marks[c.0] > 0).count()
            };
            marks[id] = mark;
        }

        let mut current = self.root();
        while marks[current.0] <= 1 {
            match self.nodes[current.0]
                .children
                .iter()
                .find(|c| marks[c.0] > 0)
            {
                Some(&child) => current = child,
                None => break,
            }
        }
        trace!("lowest common ancestor is {:?}", current);
        current
    }
}
