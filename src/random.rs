use tracing::debug;

use crate::{error::MealyError, MealyMachine, State};

/// Generates a machine with `states` states, `inputs` inputs and `outputs` outputs by drawing
/// the target and the output of every transition uniformly. Depending on the draw, some states
/// may be unreachable from state `0` and some may be equivalent.
pub fn generate_random_machine(
    states: usize,
    inputs: usize,
    outputs: usize,
    rng: &mut fastrand::Rng,
) -> Result<MealyMachine, MealyError> {
    let mut builder = MealyMachine::builder(states, inputs, outputs);
    for source in 0..states {
        for input in 0..inputs {
            let output = rng.usize(..outputs.max(1));
            let target = rng.usize(..states.max(1));
            builder = builder.with_transition(source, input, output, target);
        }
    }
    builder.build()
}

/// Draws machines as in [`generate_random_machine`] until one is found in which every state is
/// reachable from state `0` and no two states are equivalent. Gives up after `attempts` draws
/// and returns `None`.
pub fn generate_connected_minimal_machine(
    states: usize,
    inputs: usize,
    outputs: usize,
    rng: &mut fastrand::Rng,
    attempts: usize,
) -> Result<Option<MealyMachine>, MealyError> {
    for attempt in 0..attempts {
        let machine = generate_random_machine(states, inputs, outputs, rng)?;
        if machine.reachable_states(State::new(0)).len() == states && machine.is_minimal() {
            debug!("found connected minimal machine after {} attempts", attempt + 1);
            return Ok(Some(machine));
        }
    }
    Ok(None)
}
