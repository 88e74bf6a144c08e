use std::fmt::{Debug, Display};

/// Declares a nominal index type. The types created this way are all backed by a `usize`,
/// but they can not be converted into one another, so a state can never be used where an
/// input is expected.
macro_rules! impl_index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(usize);

        impl $name {
            /// Creates the handle with the given dense index.
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the dense index that is wrapped by `self`.
            pub const fn index(self) -> usize {
                self.0
            }

            /// Returns the handle that directly follows `self`.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }

            /// Iterates over the first `count` handles, i.e. over the handles with index `0..count`.
            pub fn range(count: usize) -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
                (0..count).map(Self)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

impl_index_type!(
    /// Handle of a state of a [`crate::MealyMachine`].
    State,
    "q"
);
impl_index_type!(
    /// Handle of an input symbol.
    Input,
    "i"
);
impl_index_type!(
    /// Handle of an output symbol.
    Output,
    "o"
);

/// A finite word over the input alphabet.
pub type Word = Vec<Input>;

/// Returns the concatenation of `left` and `right`.
pub fn concat(left: &[Input], right: &[Input]) -> Word {
    let mut out = Vec::with_capacity(left.len() + right.len());
    out.extend_from_slice(left);
    out.extend_from_slice(right);
    out
}

/// Builds a word from raw indices, mainly useful for tests and examples.
pub fn word<I: IntoIterator<Item = usize>>(symbols: I) -> Word {
    symbols.into_iter().map(Input::new).collect()
}
