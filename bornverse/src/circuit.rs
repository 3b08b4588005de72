//! Symbolic circuits: a side-effect-free record of what a trajectory runs.
//!
//! A [`Circuit`] is built once through a closure-based builder, validated
//! at record time, and then consumed any number of times by the expander
//! and the executor. Operations are either deterministic (a gate on a
//! geometry) or stochastic (one draw from a named stream selects among
//! weighted outcomes, with leftover probability mass meaning "do nothing").
//!
//! [`select_branch`] is the single implementation of the selection rule;
//! expansion and execution both call it so their draws stay aligned.

use std::collections::HashMap;

use crate::basis::Boundary;
use crate::error::{invalid, Result};
use crate::gate::Gate;
use crate::geometry::Geometry;
use crate::rng::StreamName;

/// Slack allowed on probability sums.
pub(crate) const PROBABILITY_SLACK: f64 = 1e-8;

/// One weighted branch of a stochastic operation.
#[derive(Clone, Copy, Debug)]
pub struct Outcome {
    pub probability: f64,
    pub gate: Gate,
    pub geometry: Geometry,
}

impl Outcome {
    #[must_use]
    pub fn new(probability: f64, gate: Gate, geometry: Geometry) -> Self {
        Self { probability, gate, geometry }
    }
}

/// One step's worth of work in a circuit.
#[derive(Clone, Debug)]
pub enum Operation {
    Deterministic {
        gate: Gate,
        geometry: Geometry,
    },
    Stochastic {
        stream: StreamName,
        outcomes: Vec<Outcome>,
    },
}

/// An immutable symbolic circuit.
///
/// The parameter map is carried for the builder closure's convenience and
/// never interpreted by the engine.
#[derive(Clone, Debug)]
pub struct Circuit {
    length: usize,
    boundary: Boundary,
    n_steps: usize,
    operations: Vec<Operation>,
    params: HashMap<String, f64>,
}

impl Circuit {
    /// Record a circuit through a builder closure.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a bad length/boundary combination, zero
    /// steps, or anything the builder rejects at record time.
    ///
    /// # Examples
    ///
    /// ```
    /// use bornverse::{Boundary, Circuit, Gate, Geometry};
    ///
    /// let circuit = Circuit::build(4, Boundary::Open, 2, [], |c| {
    ///     c.apply(Gate::HaarRandom, Geometry::staircase_right(1))?;
    ///     c.apply(Gate::Reset, Geometry::SingleSite(2))
    /// })
    /// .unwrap();
    /// assert_eq!(circuit.operations().len(), 2);
    /// ```
    pub fn build(
        length: usize,
        boundary: Boundary,
        n_steps: usize,
        params: impl IntoIterator<Item = (String, f64)>,
        record: impl FnOnce(&mut CircuitBuilder) -> Result<()>,
    ) -> Result<Self> {
        // Length/boundary compatibility surfaces here, not at first use.
        crate::basis::SiteMap::new(length, boundary)?;
        if n_steps == 0 {
            return Err(invalid("a circuit needs at least one step".to_string()));
        }
        let mut builder = CircuitBuilder {
            length,
            boundary,
            params: params.into_iter().collect(),
            operations: Vec::new(),
        };
        record(&mut builder)?;
        Ok(Self {
            length,
            boundary,
            n_steps,
            operations: builder.operations,
            params: builder.params,
        })
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    #[must_use]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// The recorded operations, in application order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The opaque user parameter map.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    /// One parameter by key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }
}

/// Records operations into a circuit under construction.
pub struct CircuitBuilder {
    length: usize,
    boundary: Boundary,
    params: HashMap<String, f64>,
    operations: Vec<Operation>,
}

impl CircuitBuilder {
    /// Record a deterministic gate application.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the geometry is out of range for the
    /// circuit's chain or its element arity does not match the gate
    /// support.
    pub fn apply(&mut self, gate: Gate, geometry: Geometry) -> Result<()> {
        self.check_arity(&gate, &geometry)?;
        self.operations.push(Operation::Deterministic { gate, geometry });
        Ok(())
    }

    /// Record a stochastic operation drawing from `stream`.
    ///
    /// Only the `ctrl` stream is accepted for circuit-level branch
    /// selection in this version.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a non-`ctrl` stream, an empty outcome list,
    /// negative probabilities, a probability sum above 1, or a geometry
    /// problem in any outcome.
    pub fn apply_with_prob(&mut self, stream: StreamName, outcomes: Vec<Outcome>) -> Result<()> {
        if stream != StreamName::Ctrl {
            return Err(invalid(format!(
                "stochastic operations draw from the ctrl stream, got {stream}"
            )));
        }
        validate_outcomes(&outcomes)?;
        for outcome in &outcomes {
            self.check_arity(&outcome.gate, &outcome.geometry)?;
        }
        self.operations.push(Operation::Stochastic { stream, outcomes });
        Ok(())
    }

    /// A user parameter, readable inside the builder closure.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    fn check_arity(&self, gate: &Gate, geometry: &Geometry) -> Result<()> {
        for element in geometry.elements(self.length, self.boundary)? {
            if element.len() != gate.support() {
                return Err(invalid(format!(
                    "{} acts on {} site(s) but the geometry yields {:?}",
                    gate.name(),
                    gate.support(),
                    element
                )));
            }
        }
        Ok(())
    }
}

/// Check an outcome list: non-empty, non-negative probabilities, total at
/// most 1 (within slack).
///
/// # Errors
///
/// `InvalidArgument` when any rule is violated.
pub(crate) fn validate_outcomes(outcomes: &[Outcome]) -> Result<()> {
    if outcomes.is_empty() {
        return Err(invalid("stochastic operations need at least one outcome".to_string()));
    }
    let mut total = 0.0;
    for outcome in outcomes {
        if !outcome.probability.is_finite() || outcome.probability < 0.0 {
            return Err(invalid(format!(
                "outcome probability must be finite and non-negative, got {}",
                outcome.probability
            )));
        }
        total += outcome.probability;
    }
    if total > 1.0 + PROBABILITY_SLACK {
        return Err(invalid(format!("outcome probabilities sum to {total}, above 1")));
    }
    Ok(())
}

/// The selection rule shared by expansion and execution: accumulate the
/// outcome probabilities and pick the first with `r < cumulative`;
/// residual mass selects nothing.
#[must_use]
pub fn select_branch(r: f64, outcomes: &[Outcome]) -> Option<usize> {
    let mut cumulative = 0.0;
    for (index, outcome) in outcomes.iter().enumerate() {
        cumulative += outcome.probability;
        if r < cumulative {
            return Some(index);
        }
    }
    None
}
