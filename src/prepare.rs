//! Computes everything needed for generating a test suite, running the independent
//! constructions concurrently.

use tracing::info;

use crate::{
    ads::{create_adaptive_distinguishing_sequence, AdaptiveDistinguishingSequence},
    error::Error,
    family::{create_separating_family, SeparatingFamily},
    separating::SeparatingMatrix,
    splitting_tree::{create_splitting_tree, SplittingTreeOptions, SplittingTreeResult},
    transfer::{create_transfer_sequences, TransferOptions, TransferSequences},
    MealyMachine, State,
};

/// Where the suffixes of a test suite come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuffixMethod {
    /// Start with an adaptive distinguishing sequence and separate the remaining states
    /// pairwise.
    #[default]
    Ads,
    /// Separate all states pairwise, which yields harmonized state identifiers.
    Hsi,
}

/// Configuration for [`prepare_test_suite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestSuiteConfig {
    /// How suffixes are obtained.
    pub method: SuffixMethod,
    /// Randomize the order in which inputs are tried by all constructions.
    pub randomized: bool,
    /// Seed from which the seeds of the individual constructions are derived.
    pub seed: u64,
}

/// The ingredients of a test suite: access words for all states, and suffixes for every state.
#[derive(Debug, Clone)]
pub struct TestSuiteParts {
    /// The adaptive distinguishing sequence, trivial for [`SuffixMethod::Hsi`].
    pub ads: AdaptiveDistinguishingSequence,
    /// Whether the tree in the style of Lee and Yannakakis split all states. Always false for
    /// [`SuffixMethod::Hsi`], where no such tree is built.
    pub lee_yannakakis_complete: bool,
    /// The tree used for separating pairs of states.
    pub hopcroft: SplittingTreeResult,
    /// Separators for all pairs of states.
    pub matrix: SeparatingMatrix,
    /// The suffixes for every state.
    pub family: SeparatingFamily,
    /// Access words from state `0`.
    pub prefixes: TransferSequences,
}

/// Builds the adaptive distinguishing sequence, the tree for pairwise separation and the
/// transfer sequences in parallel. Once all three are done, the separating matrix and the
/// family are derived from them. Every construction gets its own seed, derived from
/// `config.seed`, so the outcome does not depend on scheduling.
pub fn prepare_test_suite(
    machine: &MealyMachine,
    config: &TestSuiteConfig,
) -> Result<TestSuiteParts, Error> {
    let mut rng = fastrand::Rng::with_seed(config.seed);
    let (ads_seed, hopcroft_seed, transfer_seed) = (rng.u64(..), rng.u64(..), rng.u64(..));
    info!(
        "preparing test suite for {} states, method {:?}",
        machine.state_count(),
        config.method
    );

    let ((ads, hopcroft), prefixes) = rayon::join(
        || {
            rayon::join(
                || build_ads(machine, config, ads_seed),
                || {
                    let options =
                        SplittingTreeOptions::MIN_HOPCROFT.with_randomized(config.randomized);
                    create_splitting_tree(machine, options, hopcroft_seed)
                },
            )
        },
        || {
            let options = TransferOptions {
                randomized: config.randomized,
            };
            create_transfer_sequences(machine, options, State::new(0), transfer_seed)
        },
    );
    let (ads, lee_yannakakis_complete) = ads?;
    let hopcroft = hopcroft?;
    info!(
        "adaptive distinguishing sequence complete: {}, {} classes of states",
        lee_yannakakis_complete,
        hopcroft.tree.leaf_count()
    );

    let matrix = SeparatingMatrix::from_splitting_tree(&hopcroft.tree);
    let family = create_separating_family(&ads, &matrix);
    info!("prepared separating family for {} states", family.len());

    Ok(TestSuiteParts {
        ads,
        lee_yannakakis_complete,
        hopcroft,
        matrix,
        family,
        prefixes,
    })
}

fn build_ads(
    machine: &MealyMachine,
    config: &TestSuiteConfig,
    seed: u64,
) -> Result<(AdaptiveDistinguishingSequence, bool), Error> {
    match config.method {
        SuffixMethod::Hsi => Ok((
            AdaptiveDistinguishingSequence::trivial(machine.state_count()),
            false,
        )),
        SuffixMethod::Ads => {
            let options = SplittingTreeOptions::LEE_YANNAKAKIS.with_randomized(config.randomized);
            let tree = create_splitting_tree(machine, options, seed)?;
            let ads = create_adaptive_distinguishing_sequence(&tree)?;
            Ok((ads, tree.is_complete))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test_log::test]
    fn both_methods_give_separating_suffixes() {
        let machine = rotating();
        for method in [SuffixMethod::Ads, SuffixMethod::Hsi] {
            let config = TestSuiteConfig {
                method,
                ..Default::default()
            };
            let parts = prepare_test_suite(&machine, &config).unwrap();
            assert_eq!(parts.lee_yannakakis_complete, method == SuffixMethod::Ads);
            assert_eq!(parts.prefixes.reachable_count(), 3);
            assert!(parts.hopcroft.is_complete);
            for s in machine.states() {
                for t in machine.states().filter(|&t| t != s) {
                    assert!(parts.family[s]
                        .local_suffixes
                        .iter()
                        .any(|w| machine.separates(s, t, w)));
                }
            }
        }
    }

    #[test]
    fn same_seed_same_parts() {
        let machine = rotating();
        let config = TestSuiteConfig {
            method: SuffixMethod::Ads,
            randomized: true,
            seed: 42,
        };
        let first = prepare_test_suite(&machine, &config).unwrap();
        let second = prepare_test_suite(&machine, &config).unwrap();
        assert_eq!(first.ads, second.ads);
        assert_eq!(first.hopcroft, second.hopcroft);
        assert_eq!(first.family, second.family);
        assert_eq!(first.prefixes, second.prefixes);
    }
}
