/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Returns the number of distinct values produced by `iter`.
pub fn distinct_count<T, I>(iter: I) -> usize
where
    T: std::hash::Hash + Eq,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().collect::<Set<_>>().len()
}

/// Returns true if `f` maps no two elements of `iter` that share the same class to the same
/// value. The class of an element is given by `class`. This is used for checking whether a
/// split is valid in the sense of Lee and Yannakakis.
pub fn injective_within_classes<E, C, V, I>(iter: I, class: C, f: impl Fn(E) -> V) -> bool
where
    E: Copy,
    I: IntoIterator<Item = E>,
    C: Fn(E) -> usize,
    V: std::hash::Hash + Eq,
{
    let mut seen: Set<(usize, V)> = Set::default();
    iter.into_iter().all(|e| seen.insert((class(e), f(e))))
}
