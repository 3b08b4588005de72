//! Imperative execution of a symbolic circuit on a simulation state.
//!
//! `simulate` runs a circuit `n_circuits` times. Per repetition it walks
//! the inner steps in source order; deterministic operations compute their
//! sites directly, stochastic operations consume exactly one `ctrl` draw
//! through the shared selection rule, and every executed gate is offered
//! to the recording predicate with a precise step-boundary bit.
//!
//! Geometry pointer state is snapshotted (the operations are cloned) at
//! the start of each call, so one `Circuit` value can back any number of
//! trajectories.

use log::debug;

use crate::circuit::{select_branch, Circuit, Operation};
use crate::error::{invalid, Result};
use crate::gate::Gate;
use crate::geometry::Geometry;
use crate::recording::{RecordWhen, RecordingContext};
use crate::state::SimulationState;

/// Run `circuit` on `state` for `n_circuits` repetitions, recording
/// tracked observables according to `record_when`.
///
/// # Errors
///
/// `InvalidArgument` for `n_circuits < 1`, a zero recording interval, a
/// circuit whose length or boundary does not match the state, or an
/// uninitialized state, plus anything gate application reports. After an
/// error the state is well-defined but possibly partially evolved.
pub fn simulate(
    circuit: &Circuit,
    state: &mut SimulationState,
    n_circuits: usize,
    record_when: &RecordWhen,
) -> Result<()> {
    if n_circuits < 1 {
        return Err(invalid("n_circuits must be at least 1".to_string()));
    }
    record_when.validate()?;
    if circuit.length() != state.length() || circuit.boundary() != state.boundary() {
        return Err(invalid(format!(
            "circuit shape (L={}, {}) does not match state (L={}, {})",
            circuit.length(),
            circuit.boundary(),
            state.length(),
            state.boundary()
        )));
    }
    if !state.is_initialized() {
        return Err(invalid("state must be initialized before simulate".to_string()));
    }

    // Snapshot geometry pointer state for this run.
    let mut operations = circuit.operations().to_vec();
    let mut run = Run {
        state,
        record_when,
        n_circuits,
        gate_idx: 0,
        should_record: false,
        boundary_seen: false,
    };

    for repetition in 1..=n_circuits {
        run.should_record = false;
        run.boundary_seen = false;
        for step in 1..=circuit.n_steps() {
            let last_step = step == circuit.n_steps();
            let op_count = operations.len();
            for (op_index, operation) in operations.iter_mut().enumerate() {
                let boundary_op = last_step && op_index + 1 == op_count;
                run.operation(operation, repetition, boundary_op)?;
            }
        }
        run.finish_repetition(repetition)?;
        debug!(
            "repetition {repetition}/{n_circuits}: {} gates so far, max bond {}",
            run.gate_idx,
            run.state.mps().map_or(0, schmidt::Mps::max_bond_dim)
        );
    }
    Ok(())
}

struct Run<'a> {
    state: &'a mut SimulationState,
    record_when: &'a RecordWhen,
    n_circuits: usize,
    gate_idx: usize,
    should_record: bool,
    boundary_seen: bool,
}

impl Run<'_> {
    fn operation(
        &mut self,
        operation: &mut Operation,
        repetition: usize,
        boundary_op: bool,
    ) -> Result<()> {
        match operation {
            Operation::Deterministic { gate, geometry } => {
                let gate = *gate;
                self.geometry(&gate, geometry, repetition, boundary_op)
            }
            Operation::Stochastic { stream, outcomes } => {
                // Exactly one draw, selected branch or not.
                let draw = self.state.rng.uniform(*stream);
                if let Some(branch) = select_branch(draw, outcomes) {
                    let outcome = &mut outcomes[branch];
                    let gate = outcome.gate;
                    self.geometry(&gate, &mut outcome.geometry, repetition, boundary_op)?;
                }
                Ok(())
            }
        }
    }

    fn geometry(
        &mut self,
        gate: &Gate,
        geometry: &mut Geometry,
        repetition: usize,
        boundary_op: bool,
    ) -> Result<()> {
        let length = self.state.length();
        let boundary = self.state.boundary();
        if geometry.is_compound() {
            let elements = geometry.elements(length, boundary)?;
            let count = elements.len();
            for (index, element) in elements.into_iter().enumerate() {
                self.state.apply_at(gate, &element)?;
                self.after_gate(gate, repetition, boundary_op && index + 1 == count)?;
            }
            Ok(())
        } else {
            let sites = geometry.sites(length, boundary)?;
            self.state.apply_at(gate, &sites)?;
            geometry.advance(length, boundary);
            self.after_gate(gate, repetition, boundary_op)
        }
    }

    fn after_gate(&mut self, gate: &Gate, repetition: usize, is_step_boundary: bool) -> Result<()> {
        self.gate_idx += 1;
        let ctx = RecordingContext {
            step_idx: repetition,
            gate_idx: self.gate_idx,
            gate: gate.name(),
            is_step_boundary,
        };
        let (set_flag, record_now) = self.record_when.evaluate(&ctx, self.n_circuits);
        if record_now {
            self.state.record()?;
        }
        if set_flag {
            self.should_record = true;
        }
        if is_step_boundary {
            self.boundary_seen = true;
        }
        Ok(())
    }

    /// End of a repetition: when the boundary operation ran no gate (a
    /// stochastic "do nothing"), boundary presets still get their chance,
    /// then a deferred record fires at most once.
    fn finish_repetition(&mut self, repetition: usize) -> Result<()> {
        if !self.boundary_seen && self.record_when.fires_at_empty_boundary() {
            let ctx = RecordingContext {
                step_idx: repetition,
                gate_idx: self.gate_idx,
                gate: "(none)",
                is_step_boundary: true,
            };
            let (set_flag, _) = self.record_when.evaluate(&ctx, self.n_circuits);
            if set_flag {
                self.should_record = true;
            }
        }
        if self.should_record {
            self.state.record()?;
        }
        Ok(())
    }
}
