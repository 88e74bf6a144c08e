use itertools::Itertools;

use crate::{Input, Output, State};

/// Helper trait which can be used to display states, words, trees and such. This is mainly
/// used for debugging and logging purposes.
pub trait Show {
    /// Returns a human readable representation of `self`.
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of states this should be {q0, q1, q2}.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("{{{}}}", iter.into_iter().map(|x| x.show()).join(", "))
    }
}

macro_rules! impl_show_via_display {
    ($($t:ty),*) => {
        $(
            impl Show for $t {
                fn show(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_show_via_display!(State, Input, Output, usize);

impl Show for [Input] {
    fn show(&self) -> String {
        if self.is_empty() {
            "ε".to_string()
        } else {
            self.iter().map(|i| i.index()).join(" ")
        }
    }
}

impl Show for Vec<Input> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl Show for [State] {
    fn show(&self) -> String {
        State::show_collection(self)
    }
}

impl Show for Vec<State> {
    fn show(&self) -> String {
        State::show_collection(self)
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::word;

    #[test]
    fn show_words_and_states() {
        assert_eq!(word([1, 0, 2]).show(), "1 0 2");
        assert_eq!(word([]).show(), "ε");
        assert_eq!(vec![State::new(0), State::new(3)].show(), "{q0, q3}");
        assert_eq!((State::new(1), State::new(2)).show(), "(q1, q2)");
    }
}
