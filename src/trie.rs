//! Prefix trees used to de-duplicate sets of words.

/// A node of a [`Trie`]. Children are kept sorted by their symbol, so lookups use a binary
/// search and enumeration happens in symbol order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TrieNode<T> {
    children: Vec<(T, usize)>,
    terminal: bool,
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self {
            children: vec![],
            terminal: false,
        }
    }
}

/// A set of words over symbols of type `T`, stored as a prefix tree. Only words that were
/// inserted are members, their proper prefixes are not.
///
/// ```
/// use mealy_testing::trie::Trie;
///
/// let mut trie = Trie::default();
/// assert!(trie.insert(&[1, 2, 3]));
/// assert!(!trie.insert(&[1, 2, 3]));
/// assert!(trie.insert(&[1, 2]));
/// assert!(!trie.contains(&[1]));
/// assert_eq!(trie.flatten(), vec![vec![1, 2], vec![1, 2, 3]]);
/// assert_eq!(trie.total_size(), (2, 5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trie<T> {
    nodes: Vec<TrieNode<T>>,
    count: usize,
    symbols: usize,
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            count: 0,
            symbols: 0,
        }
    }
}

impl<T: Copy + Ord> Trie<T> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `word` and returns true if it was not present before.
    pub fn insert(&mut self, word: &[T]) -> bool {
        let mut current = 0;
        for &symbol in word {
            current = match self.nodes[current]
                .children
                .binary_search_by(|(s, _)| s.cmp(&symbol))
            {
                Ok(pos) => self.nodes[current].children[pos].1,
                Err(pos) => {
                    let id = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[current].children.insert(pos, (symbol, id));
                    id
                }
            };
        }

        if self.nodes[current].terminal {
            return false;
        }
        self.nodes[current].terminal = true;
        self.count += 1;
        self.symbols += word.len();
        true
    }

    /// Returns true if exactly `word` has been inserted.
    pub fn contains(&self, word: &[T]) -> bool {
        self.find(word)
            .map(|id| self.nodes[id].terminal)
            .unwrap_or(false)
    }

    fn find(&self, word: &[T]) -> Option<usize> {
        word.iter().try_fold(0, |current, symbol| {
            let children = &self.nodes[current].children;
            children
                .binary_search_by(|(s, _)| s.cmp(symbol))
                .ok()
                .map(|pos| children[pos].1)
        })
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no word has been inserted.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of distinct words together with the sum of their lengths.
    pub fn total_size(&self) -> (usize, usize) {
        (self.count, self.symbols)
    }

    /// Removes all words.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Calls `f` on every word in pre-order, so a word comes before its extensions and
    /// siblings are visited by ascending symbol.
    pub fn for_each<F: FnMut(&[T])>(&self, mut f: F) {
        self.walk(|word, terminal, _| {
            if terminal {
                f(word)
            }
        })
    }

    /// Calls `f` on every word that is not a proper prefix of another word in the trie.
    /// Testing with these words covers all others, as a prefix is executed anyway when its
    /// extension is.
    pub fn for_each_maximal<F: FnMut(&[T])>(&self, mut f: F) {
        self.walk(|word, _, leaf| {
            if leaf {
                f(word)
            }
        })
    }

    /// Returns all words in the order of [`Trie::for_each`].
    pub fn flatten(&self) -> Vec<Vec<T>> {
        let mut out = Vec::with_capacity(self.count);
        self.for_each(|w| out.push(w.to_vec()));
        out
    }

    /// Returns the words that are not a proper prefix of another word, in pre-order.
    pub fn flatten_maximal(&self) -> Vec<Vec<T>> {
        let mut out = vec![];
        self.for_each_maximal(|w| out.push(w.to_vec()));
        out
    }

    /// Depth-first traversal with an explicit stack. The callback receives the word spelled
    /// by a node, whether the node ends an inserted word and whether it is a leaf.
    fn walk<F: FnMut(&[T], bool, bool)>(&self, mut f: F) {
        if self.count == 0 {
            return;
        }
        let mut word = vec![];
        // (node, position of the next child to visit)
        let mut stack = vec![(0usize, 0usize)];
        let root = &self.nodes[0];
        f(&word, root.terminal, root.children.is_empty());

        while let Some((node, next)) = stack.last_mut() {
            let children = &self.nodes[*node].children;
            if *next == children.len() {
                stack.pop();
                word.pop();
                continue;
            }
            let (symbol, child) = children[*next];
            *next += 1;
            word.push(symbol);
            let child_node = &self.nodes[child];
            f(&word, child_node.terminal, child_node.children.is_empty());
            stack.push((child, 0));
        }
    }
}

impl<'a, T: Copy + Ord + 'a> Extend<&'a [T]> for Trie<T> {
    fn extend<I: IntoIterator<Item = &'a [T]>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word);
        }
    }
}

impl<T: Copy + Ord> Extend<Vec<T>> for Trie<T> {
    fn extend<I: IntoIterator<Item = Vec<T>>>(&mut self, iter: I) {
        for word in iter {
            self.insert(&word);
        }
    }
}

impl<T: Copy + Ord> FromIterator<Vec<T>> for Trie<T> {
    fn from_iter<I: IntoIterator<Item = Vec<T>>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}

impl<'a, T: Copy + Ord + 'a> FromIterator<&'a [T]> for Trie<T> {
    fn from_iter<I: IntoIterator<Item = &'a [T]>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}
