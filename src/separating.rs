use std::collections::VecDeque;
use std::fmt::Display;

use tracing::debug;

use crate::{
    show::Show,
    splitting_tree::{SplittingTree, SplittingTreeResult},
    Input, State, Word,
};

/// Holds a separating word for every pair of states. The entry for `(s, t)` is the separator
/// of the node of a splitting tree in which `s` and `t` were split. Pairs that are never split,
/// which happens exactly for equivalent states, keep the empty word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatingMatrix {
    size: usize,
    words: Vec<Word>,
}

impl SeparatingMatrix {
    /// Fills the matrix by visiting the nodes of `tree` breadth-first. Each unordered pair of
    /// states lands in different children of exactly one node, so every entry is written at
    /// most once, and the work is quadratic in the number of states.
    pub fn from_splitting_tree(tree: &SplittingTree) -> Self {
        let size = tree.state_count();
        let mut words = vec![vec![]; size * size];

        let mut queue = VecDeque::from([tree.root()]);
        while let Some(id) = queue.pop_front() {
            let node = tree.node(id);
            let children = node.children();
            for (i, &left) in children.iter().enumerate() {
                for &right in &children[i + 1..] {
                    for &s in tree.node(left).states() {
                        for &t in tree.node(right).states() {
                            words[s.index() * size + t.index()] = node.separator().to_vec();
                            words[t.index() * size + s.index()] = node.separator().to_vec();
                        }
                    }
                }
            }
            queue.extend(children.iter().copied());
        }

        let missing = (0..size)
            .flat_map(|s| (s + 1..size).map(move |t| (s, t)))
            .filter(|&(s, t)| words[s * size + t].is_empty())
            .count();
        debug!(
            "separating matrix for {} states, {} pairs without separator",
            size, missing
        );
        Self { size, words }
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the word separating `s` and `t`, which is empty if they were never split.
    pub fn get(&self, s: State, t: State) -> &[Input] {
        &self.words[s.index() * self.size + t.index()]
    }

    /// Iterates over all unordered pairs `s < t` together with their separator.
    pub fn pairs(&self) -> impl Iterator<Item = (State, State, &[Input])> + '_ {
        State::range(self.size).flat_map(move |s| {
            State::range(self.size)
                .skip(s.index() + 1)
                .map(move |t| (s, t, self.get(s, t)))
        })
    }
}

impl From<&SplittingTreeResult> for SeparatingMatrix {
    fn from(result: &SplittingTreeResult) -> Self {
        Self::from_splitting_tree(&result.tree)
    }
}

impl Display for SeparatingMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once(String::new()).chain(State::range(self.size).map(|s| s.to_string())),
        );
        for s in State::range(self.size) {
            builder.push_record(std::iter::once(s.to_string()).chain(
                State::range(self.size).map(|t| {
                    if s == t {
                        String::new()
                    } else {
                        self.get(s, t).show()
                    }
                }),
            ));
        }
        let mut table = builder.build();
        table.with(tabled::settings::Style::rounded());
        write!(f, "{table}")
    }
}
