use memspan_core::{BlockSpec, TrialDescriptor};
use rand::Rng;
use rand::seq::SliceRandom;

/// Expands block specs into a flat trial list.
///
/// Each spec contributes `n_trials` copies of its descriptor, in spec order.
/// With `randomize` the whole list is shuffled, not each spec separately.
pub fn prepare_block<R: Rng + ?Sized>(
    specs: &[BlockSpec],
    randomize: bool,
    rng: &mut R,
) -> Vec<TrialDescriptor> {
    let mut trials: Vec<TrialDescriptor> = specs
        .iter()
        .flat_map(|spec| std::iter::repeat_n(spec.descriptor(), spec.n_trials))
        .collect();
    if randomize {
        trials.shuffle(rng);
    }
    trials
}
