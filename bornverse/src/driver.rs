//! Trajectory drivers: thin sugar over [`simulate`] for sweeps.
//!
//! Research runs rarely simulate a single trajectory. These helpers wire
//! the per-trajectory plumbing (fresh state, fresh recording predicate,
//! result extraction) around the executor without adding any semantics of
//! their own. For parallel sweeps, hand each thread its own chunk of
//! trajectory indices; states share nothing.

use crate::circuit::Circuit;
use crate::error::Result;
use crate::executor::simulate;
use crate::recording::RecordWhen;
use crate::state::SimulationState;

/// Run `n_trajectories` independent trajectories and collect one value
/// from each finished state.
///
/// `make_state` receives the 0-based trajectory index (fold it into the
/// seed for reproducible-but-distinct trajectories); `make_record` builds
/// that trajectory's recording predicate; `collect` extracts the result.
///
/// # Errors
///
/// The first failing trajectory aborts the sweep.
///
/// # Examples
///
/// ```
/// use bornverse::{
///     run_trajectories, Boundary, Circuit, Gate, Geometry, InitSpec, ObservableSpec,
///     ProductSpec, RecordWhen, SimulationState,
/// };
///
/// let circuit = Circuit::build(4, Boundary::Open, 2, [], |c| {
///     c.apply(Gate::HaarRandom, Geometry::staircase_right(1))?;
///     c.apply(Gate::Reset, Geometry::SingleSite(2))
/// })
/// .unwrap();
///
/// let final_entropies = run_trajectories(
///     &circuit,
///     4,
///     1,
///     |index| {
///         let mut state = SimulationState::new(4, Boundary::Open)?.with_seed(1000 + index as u64);
///         state.initialize(InitSpec::Product(ProductSpec::BinaryInt(0)))?;
///         state.track("entropy", ObservableSpec::EntanglementEntropy { bond: 2 })?;
///         Ok(state)
///     },
///     |_| RecordWhen::FinalOnly,
///     |_, state| state.series("entropy").unwrap()[0],
/// )
/// .unwrap();
/// assert_eq!(final_entropies.len(), 4);
/// ```
pub fn run_trajectories<S, R, C, T>(
    circuit: &Circuit,
    n_trajectories: usize,
    n_circuits: usize,
    mut make_state: S,
    mut make_record: R,
    mut collect: C,
) -> Result<Vec<T>>
where
    S: FnMut(usize) -> Result<SimulationState>,
    R: FnMut(usize) -> RecordWhen,
    C: FnMut(usize, SimulationState) -> T,
{
    let mut results = Vec::with_capacity(n_trajectories);
    for index in 0..n_trajectories {
        let mut state = make_state(index)?;
        let record_when = make_record(index);
        simulate(circuit, &mut state, n_circuits, &record_when)?;
        results.push(collect(index, state));
    }
    Ok(results)
}

/// Lazily yield finished trajectory states, one per `next` call.
///
/// The iterator ends after `n_trajectories` items; a failed trajectory is
/// yielded as its error and does not stop later ones.
pub fn trajectories<'a, S>(
    circuit: &'a Circuit,
    n_trajectories: usize,
    n_circuits: usize,
    mut make_state: S,
    mut make_record: impl FnMut(usize) -> RecordWhen + 'a,
) -> impl Iterator<Item = Result<SimulationState>> + 'a
where
    S: FnMut(usize) -> Result<SimulationState> + 'a,
{
    (0..n_trajectories).map(move |index| {
        let mut state = make_state(index)?;
        let record_when = make_record(index);
        simulate(circuit, &mut state, n_circuits, &record_when)?;
        Ok(state)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Boundary;
    use crate::gate::Gate;
    use crate::geometry::Geometry;
    use crate::observable::ObservableSpec;
    use crate::state::{InitSpec, ProductSpec};

    fn circuit() -> Circuit {
        Circuit::build(4, Boundary::Open, 2, [], |c| {
            c.apply(Gate::HaarRandom, Geometry::staircase_right(1))?;
            c.apply(Gate::Reset, Geometry::SingleSite(2))
        })
        .unwrap()
    }

    fn seeded_state(seed: u64) -> Result<SimulationState> {
        let mut state = SimulationState::new(4, Boundary::Open)?.with_seed(seed);
        state.initialize(InitSpec::Product(ProductSpec::BinaryInt(0)))?;
        state.track("dw", ObservableSpec::DomainWall { i1: Some(2) })?;
        Ok(state)
    }

    #[test]
    fn sweep_collects_one_value_per_trajectory() {
        let circuit = circuit();
        let walls = run_trajectories(
            &circuit,
            5,
            2,
            |index| seeded_state(index as u64),
            |_| RecordWhen::FinalOnly,
            |_, state| state.series("dw").unwrap()[0],
        )
        .unwrap();
        assert_eq!(walls.len(), 5);
    }

    #[test]
    fn iterator_driver_matches_the_callback_driver() {
        let circuit = circuit();
        let eager = run_trajectories(
            &circuit,
            3,
            1,
            |index| seeded_state(index as u64),
            |_| RecordWhen::EveryStep,
            |_, state| state.series("dw").unwrap().to_vec(),
        )
        .unwrap();
        let lazy: Vec<Vec<f64>> = trajectories(
            &circuit,
            3,
            1,
            |index| seeded_state(index as u64),
            |_| RecordWhen::EveryStep,
        )
        .map(|state| state.unwrap().series("dw").unwrap().to_vec())
        .collect();
        assert_eq!(eager, lazy);
    }
}
