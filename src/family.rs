//! Separating families, which assign to every state a set of suffixes that together confirm
//! the identity of that state.
//!
//! The suffixes of a state start with the word that the adaptive distinguishing sequence
//! applies when started in it. States that the sequence can not tell apart additionally get
//! words that separate them pairwise, taken either from a [`SeparatingMatrix`] or from a
//! second splitting tree.

use std::ops::Index;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::{
    ads::{AdaptiveDistinguishingSequence, AdsId},
    separating::SeparatingMatrix,
    show::Show,
    splitting_tree::{LcaScratch, NodeId, SplittingTree},
    trie::Trie,
    Input, State, Word,
};

/// The suffixes belonging to a single state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterizationFamily {
    /// Words used after every transition into the state.
    pub local_suffixes: Vec<Word>,
    /// Extends the local suffixes by the separators needed by all ambiguous states. Every
    /// local suffix is a prefix of a global one. These are used when checking the state as a
    /// whole.
    pub global_suffixes: Vec<Word>,
}

/// A [`CharacterizationFamily`] for every state of a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeparatingFamily {
    families: Vec<CharacterizationFamily>,
}

impl SeparatingFamily {
    /// Number of states.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Returns true if the family was built for no states at all.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Iterates over the states along with their suffixes.
    pub fn iter(&self) -> impl Iterator<Item = (State, &CharacterizationFamily)> + '_ {
        self.families
            .iter()
            .enumerate()
            .map(|(i, f)| (State::new(i), f))
    }

    /// Picks one of the local suffixes of `state` uniformly at random.
    pub fn random_local_suffix(&self, state: State, rng: &mut fastrand::Rng) -> Option<&[Input]> {
        pick(&self.families.get(state.index())?.local_suffixes, rng)
    }

    /// Picks one of the global suffixes of `state` uniformly at random.
    pub fn random_global_suffix(&self, state: State, rng: &mut fastrand::Rng) -> Option<&[Input]> {
        pick(&self.families.get(state.index())?.global_suffixes, rng)
    }
}

fn pick<'a>(words: &'a [Word], rng: &mut fastrand::Rng) -> Option<&'a [Input]> {
    if words.is_empty() {
        return None;
    }
    Some(&words[rng.usize(..words.len())])
}

impl Index<State> for SeparatingFamily {
    type Output = CharacterizationFamily;

    fn index(&self, index: State) -> &Self::Output {
        &self.families[index.index()]
    }
}

/// Collects the leaves of `sequence` together with the word applied on the way to them.
fn leaves_with_prefix(sequence: &AdaptiveDistinguishingSequence) -> Vec<(AdsId, Word)> {
    let mut out = vec![];
    let mut stack = vec![(sequence.root(), vec![])];
    while let Some((id, word)) = stack.pop() {
        let node = sequence.node(id);
        if node.is_leaf() {
            out.push((id, word));
            continue;
        }
        let extended = crate::index::concat(&word, node.word());
        stack.extend(node.children().iter().map(|&c| (c, extended.clone())));
    }
    out
}

/// Builds the separating family from an adaptive distinguishing sequence and a separating
/// matrix. Every state gets the word leading to its leaf of the sequence. If a leaf holds
/// more than one state, the matrix words separating them are added to their local suffixes,
/// and these states receive all such words of the whole machine as global suffixes.
///
/// Pairs of equivalent states have no separator, these are skipped with a warning.
pub fn create_separating_family(
    sequence: &AdaptiveDistinguishingSequence,
    matrix: &SeparatingMatrix,
) -> SeparatingFamily {
    let n = sequence.state_count();
    let mut suffixes: Vec<Trie<Input>> = vec![Trie::new(); n];
    let mut global_words = Trie::new();
    let mut needs_global = BitSet::with_capacity(n);

    for (leaf, prefix) in leaves_with_prefix(sequence) {
        let node = sequence.node(leaf);
        for s in node.initial_states() {
            suffixes[s.index()].insert(&prefix);
        }

        for s in node.initial_states() {
            for t in node.initial_states().filter(|&t| t != s) {
                let word = matrix.get(s, t);
                if word.is_empty() {
                    warn!("states {} and {} are equivalent, skipping them", s, t);
                    continue;
                }
                suffixes[s.index()].insert(word);
                global_words.insert(word);
                needs_global.insert(s.index());
            }
        }
    }

    let families = suffixes
        .into_iter()
        .enumerate()
        .map(|(s, mut trie)| {
            let local_suffixes = flatten(&trie);
            if needs_global.contains(s) {
                global_words.for_each(|w| {
                    trie.insert(w);
                });
            }
            CharacterizationFamily {
                local_suffixes,
                global_suffixes: flatten(&trie),
            }
        })
        .collect();

    let family = SeparatingFamily { families };
    debug!(
        "separating family with {} distinct global separators for {} states",
        global_words.len(),
        needs_global.len()
    );
    family
}

/// Builds the separating family from an adaptive distinguishing sequence and a second
/// splitting tree, usually one built in the style of Hopcroft. For a leaf of the sequence
/// holding several states, the lowest node of `tree` grouping these states is searched, and
/// every state gets the separators of all nodes on the way down to its leaf in which at least
/// two of the states are still together. Here the global suffixes equal the local ones.
pub fn create_separating_family_from_tree(
    sequence: &AdaptiveDistinguishingSequence,
    tree: &SplittingTree,
) -> SeparatingFamily {
    let n = sequence.state_count();
    let mut suffixes: Vec<Trie<Input>> = vec![Trie::new(); n];
    let mut scratch = LcaScratch::default();

    for (leaf, prefix) in leaves_with_prefix(sequence) {
        let node = sequence.node(leaf);
        for s in node.initial_states() {
            suffixes[s.index()].insert(&prefix);
        }
        if node.pairs().len() < 2 {
            continue;
        }

        let states: BitSet = node.initial_states().map(|s| s.index()).collect();
        let root = tree.lowest_common_ancestor(&mut scratch, |s| states.contains(s.index()));
        let mut separators = vec![];
        collect_separators(tree, &scratch, root, &states, &mut separators, &mut suffixes);
    }

    let families = suffixes
        .iter()
        .map(|trie| {
            let words = flatten(trie);
            CharacterizationFamily {
                local_suffixes: words.clone(),
                global_suffixes: words,
            }
        })
        .collect();
    SeparatingFamily { families }
}

fn collect_separators(
    tree: &SplittingTree,
    scratch: &LcaScratch,
    id: NodeId,
    states: &BitSet,
    separators: &mut Vec<Word>,
    suffixes: &mut [Trie<Input>],
) {
    let node = tree.node(id);
    if node.is_leaf() {
        for s in node.states().iter().filter(|s| states.contains(s.index())) {
            for w in separators.iter() {
                suffixes[s.index()].insert(w);
            }
        }
        return;
    }

    let relevant = scratch.mark(id) > 1;
    if relevant {
        separators.push(node.separator().to_vec());
    }
    for &child in node.children() {
        collect_separators(tree, scratch, child, states, separators, suffixes);
    }
    if relevant {
        separators.pop();
    }
}

/// Only the words that are not a prefix of another suffix are kept, as the outputs of a
/// prefix are observed anyway when running its extension.
fn flatten(trie: &Trie<Input>) -> Vec<Word> {
    let words = trie.flatten_maximal();
    trace!(
        "kept {} of {} suffixes: {}",
        words.len(),
        trie.len(),
        words.iter().map(|w| w.show()).join(", ")
    );
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ads::create_adaptive_distinguishing_sequence,
        index::word,
        splitting_tree::{create_splitting_tree, SplittingTreeOptions},
        MealyMachine,
    };

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

    /// Asserts that for every pair of distinct states, each one has a local suffix that
    /// separates them.
    fn assert_separates_pairs(machine: &MealyMachine, family: &SeparatingFamily) {
        for s in machine.states() {
            for t in machine.states().filter(|&t| t != s) {
                assert!(
                    family[s]
                        .local_suffixes
                        .iter()
                        .any(|w| machine.separates(s, t, w)),
                    "no suffix of {s} separates it from {t}"
                );
            }
        }
    }

    #[test_log::test]
    fn complete_ads_needs_no_global_words() {
        let machine = rotating();
        let ly = create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 0).unwrap();
        let ads = create_adaptive_distinguishing_sequence(&ly).unwrap();
        let hop = create_splitting_tree(&machine, SplittingTreeOptions::HOPCROFT, 0).unwrap();
        let matrix = SeparatingMatrix::from(&hop);

        let family = create_separating_family(&ads, &matrix);
        assert_eq!(family.len(), 3);
        for (s, entry) in family.iter() {
            assert_eq!(entry.local_suffixes.len(), 1, "{s}");
            assert_eq!(entry.local_suffixes, entry.global_suffixes);
        }
        assert_eq!(family[State::new(2)].local_suffixes, vec![word([0])]);
        assert_separates_pairs(&machine, &family);
    }

    #[test_log::test]
    fn trivial_ads_falls_back_to_pairs() {
        let machine = rotating();
        let hop = create_splitting_tree(&machine, SplittingTreeOptions::HOPCROFT, 0).unwrap();
        let matrix = SeparatingMatrix::from(&hop);
        let ads = AdaptiveDistinguishingSequence::trivial(3);

        let family = create_separating_family(&ads, &matrix);
        assert_separates_pairs(&machine, &family);
        for (_, entry) in family.iter() {
            // global suffixes cover the local ones, possibly by an extension
            for w in &entry.local_suffixes {
                assert!(entry.global_suffixes.iter().any(|g| g.starts_with(w)));
            }
            // the empty prefix is subsumed by the separators
            assert!(!entry.local_suffixes.contains(&vec![]));
        }

        let from_tree = create_separating_family_from_tree(&ads, &hop.tree);
        assert_separates_pairs(&machine, &from_tree);
    }

    #[test]
    fn duplicates_are_skipped() {
        let machine = MealyMachine::builder(3, 1, 2)
            .with_transitions([(0, 0, 0, 1), (1, 0, 0, 0), (2, 0, 1, 2)])
            .build()
            .unwrap();
        let ly = create_splitting_tree(&machine, SplittingTreeOptions::LEE_YANNAKAKIS, 0).unwrap();
        let ads = create_adaptive_distinguishing_sequence(&ly).unwrap();
        let hop = create_splitting_tree(&machine, SplittingTreeOptions::HOPCROFT, 0).unwrap();

        let family = create_separating_family(&ads, &SeparatingMatrix::from(&hop));
        assert_eq!(family[State::new(0)].local_suffixes, vec![word([0])]);
        assert_eq!(family[State::new(0)], family[State::new(1)]);
    }

    #[test]
    fn random_suffixes_come_from_the_lists() {
        let machine = rotating();
        let hop = create_splitting_tree(&machine, SplittingTreeOptions::HOPCROFT, 0).unwrap();
        let family = create_separating_family(
            &AdaptiveDistinguishingSequence::trivial(3),
            &SeparatingMatrix::from(&hop),
        );
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..20 {
            let s = State::new(rng.usize(0..3));
            let local = family.random_local_suffix(s, &mut rng).unwrap();
            assert!(family[s].local_suffixes.iter().any(|w| w == local));
            let global = family.random_global_suffix(s, &mut rng).unwrap();
            assert!(family[s].global_suffixes.iter().any(|w| w == global));
        }
        assert!(family
            .random_local_suffix(State::new(3), &mut rng)
            .is_none());
    }
}
