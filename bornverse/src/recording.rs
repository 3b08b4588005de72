//! When the executor records observables.
//!
//! A predicate sees one [`RecordingContext`] per executed gate and answers
//! with a pair `(set_flag, record_now)`: `set_flag` defers the record to
//! the end of the repetition, `record_now` records immediately (only
//! `EveryGate` does this, so compound-geometry loops can record
//! mid-step).

use std::fmt;

use crate::error::{invalid, Result};

/// What the predicate gets to look at after each gate execution.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordingContext {
    /// 1-based circuit repetition index.
    pub step_idx: usize,
    /// Cumulative count of gate executions across the whole run.
    pub gate_idx: usize,
    /// Stable name of the gate that just ran.
    pub gate: &'static str,
    /// True exactly on the last gate of the last operation of the last
    /// inner step of a repetition.
    pub is_step_boundary: bool,
}

/// Recording predicate presets plus user predicates.
pub enum RecordWhen {
    /// Once per repetition, at the step boundary.
    EveryStep,
    /// Immediately after every gate execution.
    EveryGate,
    /// At the step boundary of the last repetition only.
    FinalOnly,
    /// Whenever the cumulative gate index is a multiple of `n`.
    EveryNGates(usize),
    /// At step boundaries of repetitions whose index is a multiple of `n`.
    EveryNSteps(usize),
    /// A user predicate; a `true` return defers one record to the end of
    /// the repetition.
    Custom(Box<dyn Fn(&RecordingContext) -> bool>),
}

impl RecordWhen {
    /// A user predicate from any closure.
    #[must_use]
    pub fn custom(predicate: impl Fn(&RecordingContext) -> bool + 'static) -> Self {
        RecordWhen::Custom(Box::new(predicate))
    }

    /// Reject zero intervals before a run starts.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            RecordWhen::EveryNGates(0) => {
                Err(invalid("every_n_gates requires n >= 1".to_string()))
            }
            RecordWhen::EveryNSteps(0) => {
                Err(invalid("every_n_steps requires n >= 1".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Evaluate against one context; returns `(set_flag, record_now)`.
    pub(crate) fn evaluate(&self, ctx: &RecordingContext, n_circuits: usize) -> (bool, bool) {
        match self {
            RecordWhen::EveryStep => (ctx.is_step_boundary, false),
            RecordWhen::EveryGate => (false, true),
            RecordWhen::FinalOnly => (ctx.is_step_boundary && ctx.step_idx == n_circuits, false),
            RecordWhen::EveryNGates(n) => (ctx.gate_idx % n == 0, false),
            RecordWhen::EveryNSteps(n) => {
                (ctx.is_step_boundary && ctx.step_idx % n == 0, false)
            }
            RecordWhen::Custom(predicate) => (predicate(ctx), false),
        }
    }

    /// Presets that still fire at a repetition's boundary when the final
    /// operation executed no gate (a stochastic "do nothing").
    pub(crate) fn fires_at_empty_boundary(&self) -> bool {
        matches!(
            self,
            RecordWhen::EveryStep | RecordWhen::FinalOnly | RecordWhen::EveryNSteps(_)
        )
    }
}

impl fmt::Debug for RecordWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordWhen::EveryStep => write!(f, "EveryStep"),
            RecordWhen::EveryGate => write!(f, "EveryGate"),
            RecordWhen::FinalOnly => write!(f, "FinalOnly"),
            RecordWhen::EveryNGates(n) => write!(f, "EveryNGates({n})"),
            RecordWhen::EveryNSteps(n) => write!(f, "EveryNSteps({n})"),
            RecordWhen::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl std::str::FromStr for RecordWhen {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "every_step" => Ok(RecordWhen::EveryStep),
            "every_gate" => Ok(RecordWhen::EveryGate),
            "final_only" => Ok(RecordWhen::FinalOnly),
            other => Err(invalid(format!("unknown recording preset `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(step_idx: usize, gate_idx: usize, boundary: bool) -> RecordingContext {
        RecordingContext {
            step_idx,
            gate_idx,
            gate: "pauli_x",
            is_step_boundary: boundary,
        }
    }

    #[test]
    fn every_step_fires_only_at_boundaries() {
        let when = RecordWhen::EveryStep;
        assert_eq!(when.evaluate(&ctx(1, 3, false), 4), (false, false));
        assert_eq!(when.evaluate(&ctx(1, 4, true), 4), (true, false));
    }

    #[test]
    fn every_gate_records_immediately() {
        let when = RecordWhen::EveryGate;
        assert_eq!(when.evaluate(&ctx(2, 7, false), 4), (false, true));
        assert_eq!(when.evaluate(&ctx(2, 8, true), 4), (false, true));
    }

    #[test]
    fn final_only_waits_for_the_last_repetition() {
        let when = RecordWhen::FinalOnly;
        assert_eq!(when.evaluate(&ctx(3, 12, true), 4), (false, false));
        assert_eq!(when.evaluate(&ctx(4, 16, true), 4), (true, false));
    }

    #[test]
    fn modular_presets_use_their_interval() {
        let gates = RecordWhen::EveryNGates(4);
        assert_eq!(gates.evaluate(&ctx(1, 4, false), 2), (true, false));
        assert_eq!(gates.evaluate(&ctx(1, 5, false), 2), (false, false));

        let steps = RecordWhen::EveryNSteps(2);
        assert_eq!(steps.evaluate(&ctx(2, 8, true), 4), (true, false));
        assert_eq!(steps.evaluate(&ctx(3, 12, true), 4), (false, false));
        assert_eq!(steps.evaluate(&ctx(2, 8, false), 4), (false, false));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        assert!(RecordWhen::EveryNGates(0).validate().is_err());
        assert!(RecordWhen::EveryNSteps(0).validate().is_err());
        assert!(RecordWhen::EveryNGates(1).validate().is_ok());
    }

    #[test]
    fn preset_symbols_parse() {
        assert!(matches!("every_step".parse(), Ok(RecordWhen::EveryStep)));
        assert!(matches!("every_gate".parse(), Ok(RecordWhen::EveryGate)));
        assert!(matches!("final_only".parse(), Ok(RecordWhen::FinalOnly)));
        assert!("sometimes".parse::<RecordWhen>().is_err());
    }

    #[test]
    fn custom_predicates_see_the_context() {
        let when = RecordWhen::custom(|ctx| ctx.gate_idx == 1);
        assert_eq!(when.evaluate(&ctx(1, 1, false), 2), (true, false));
        assert_eq!(when.evaluate(&ctx(1, 2, false), 2), (false, false));
    }
}
