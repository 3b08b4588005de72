//! Deterministic expansion of a symbolic circuit.
//!
//! `expand_circuit` resolves a circuit to the concrete gate applications
//! of every step under one dedicated seeded generator, without touching a
//! simulation state. It is used for diagrams and for test harnesses that
//! predict what the executor will run: the selection rule is the shared
//! [`select_branch`], so an executor whose `ctrl` stream repeats this
//! generator's draws makes the same choices.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::circuit::{select_branch, Circuit, Operation};
use crate::error::Result;
use crate::gate::Gate;
use crate::geometry::Geometry;

/// One concrete gate application of one step.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedOp {
    /// 1-based step index.
    pub step: usize,
    pub gate: Gate,
    /// Physical sites, in application order.
    pub sites: Vec<usize>,
    /// Short label for diagrams, e.g. `U[1,2]`.
    pub label: String,
}

/// Expand `circuit` into per-step concrete operations under `seed`.
///
/// Staircase positions are tracked per operation (and per stochastic
/// outcome) with pure advance counters, so the circuit's own geometry
/// state is never touched. Exactly one random draw is consumed per
/// stochastic operation per step, selected or not.
///
/// # Errors
///
/// `InvalidArgument` when a geometry leaves the chain during expansion.
pub fn expand_circuit(circuit: &Circuit, seed: u64) -> Result<Vec<Vec<ExpandedOp>>> {
    let length = circuit.length();
    let boundary = circuit.boundary();
    for operation in circuit.operations() {
        match operation {
            Operation::Deterministic { geometry, .. } => geometry.validate(length, boundary)?,
            Operation::Stochastic { outcomes, .. } => {
                for outcome in outcomes {
                    outcome.geometry.validate(length, boundary)?;
                }
            }
        }
    }
    let mut rng = StdRng::seed_from_u64(seed);

    // advances[op][branch]: how often each geometry has fired so far.
    let mut advances: Vec<Vec<usize>> = circuit
        .operations()
        .iter()
        .map(|op| match op {
            Operation::Deterministic { .. } => vec![0],
            Operation::Stochastic { outcomes, .. } => vec![0; outcomes.len()],
        })
        .collect();

    let mut steps = Vec::with_capacity(circuit.n_steps());
    for step in 1..=circuit.n_steps() {
        let mut row = Vec::new();
        for (op_index, operation) in circuit.operations().iter().enumerate() {
            match operation {
                Operation::Deterministic { gate, geometry } => {
                    emit(&mut row, step, gate, geometry, advances[op_index][0], length, boundary)?;
                    advances[op_index][0] += 1;
                }
                Operation::Stochastic { outcomes, .. } => {
                    let draw: f64 = rng.gen();
                    if let Some(branch) = select_branch(draw, outcomes) {
                        let outcome = &outcomes[branch];
                        emit(
                            &mut row,
                            step,
                            &outcome.gate,
                            &outcome.geometry,
                            advances[op_index][branch],
                            length,
                            boundary,
                        )?;
                        advances[op_index][branch] += 1;
                    }
                }
            }
        }
        steps.push(row);
    }
    Ok(steps)
}

fn emit(
    row: &mut Vec<ExpandedOp>,
    step: usize,
    gate: &Gate,
    geometry: &Geometry,
    advances: usize,
    length: usize,
    boundary: crate::basis::Boundary,
) -> Result<()> {
    if geometry.is_compound() {
        for element in geometry.elements(length, boundary)? {
            row.push(expanded(step, *gate, element.to_vec()));
        }
    } else {
        let sites = geometry.computed_sites(advances, length, boundary)?;
        row.push(expanded(step, *gate, sites.to_vec()));
    }
    Ok(())
}

fn expanded(step: usize, gate: Gate, sites: Vec<usize>) -> ExpandedOp {
    let label = format!("{}[{}]", gate.label(), sites.iter().join(","));
    ExpandedOp { step, gate, sites, label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Boundary;
    use crate::circuit::Outcome;
    use crate::geometry::Parity;
    use crate::rng::StreamName;

    fn staircase_circuit(n_steps: usize) -> Circuit {
        Circuit::build(4, Boundary::Open, n_steps, [], |c| {
            c.apply(Gate::HaarRandom, Geometry::staircase_right(1))?;
            c.apply(Gate::Reset, Geometry::SingleSite(2))
        })
        .unwrap()
    }

    #[test]
    fn expansion_is_deterministic_per_seed() {
        let circuit = staircase_circuit(5);
        let a = expand_circuit(&circuit, 99).unwrap();
        let b = expand_circuit(&circuit, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn staircases_walk_across_steps() {
        let circuit = staircase_circuit(4);
        let steps = expand_circuit(&circuit, 0).unwrap();
        let walk: Vec<Vec<usize>> = steps.iter().map(|row| row[0].sites.clone()).collect();
        assert_eq!(walk, vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![1, 2]]);
    }

    #[test]
    fn compound_geometries_expand_per_element() {
        let circuit = Circuit::build(6, Boundary::Open, 1, [], |c| {
            c.apply(Gate::Cz, Geometry::Bricklayer(Parity::Odd))
        })
        .unwrap();
        let steps = expand_circuit(&circuit, 7).unwrap();
        assert_eq!(steps[0].len(), 3);
        assert_eq!(steps[0][0].sites, vec![1, 2]);
        assert_eq!(steps[0][2].label, "CZ[5,6]");
    }

    #[test]
    fn one_draw_per_stochastic_operation() {
        // With probability 0, nothing is ever selected, but each step still
        // consumes one draw: a trailing certain operation must therefore
        // see a shifted draw sequence compared to a circuit without the
        // zero-probability operation.
        let with_noop = Circuit::build(4, Boundary::Open, 1, [], |c| {
            c.apply_with_prob(
                StreamName::Ctrl,
                vec![Outcome::new(0.0, Gate::PauliX, Geometry::SingleSite(1))],
            )?;
            c.apply_with_prob(
                StreamName::Ctrl,
                vec![Outcome::new(0.5, Gate::PauliX, Geometry::SingleSite(1))],
            )
        })
        .unwrap();
        let without_noop = Circuit::build(4, Boundary::Open, 1, [], |c| {
            c.apply_with_prob(
                StreamName::Ctrl,
                vec![Outcome::new(0.5, Gate::PauliX, Geometry::SingleSite(1))],
            )
        })
        .unwrap();

        // Find a seed where the two disagree; the first draw decides the
        // without-noop circuit, the second decides the with-noop one.
        let mut differed = false;
        for seed in 0..64 {
            let a = expand_circuit(&with_noop, seed).unwrap();
            let b = expand_circuit(&without_noop, seed).unwrap();
            if (a[0].len() == 1) != (b[0].len() == 1) {
                differed = true;
                break;
            }
        }
        assert!(differed, "zero-probability operation never consumed a draw");
    }

    #[test]
    fn stochastic_staircases_advance_only_when_selected() {
        let circuit = Circuit::build(4, Boundary::Open, 6, [], |c| {
            c.apply_with_prob(
                StreamName::Ctrl,
                vec![Outcome::new(0.5, Gate::Cz, Geometry::staircase_right(1))],
            )
        })
        .unwrap();
        let steps = expand_circuit(&circuit, 11).unwrap();
        let fired: Vec<&ExpandedOp> = steps.iter().flatten().collect();
        // Positions must walk 1, 2, 3, ... in firing order regardless of
        // which steps fired.
        for (count, op) in fired.iter().enumerate() {
            let expected = count % 3 + 1;
            assert_eq!(op.sites[0], expected);
        }
    }
}
