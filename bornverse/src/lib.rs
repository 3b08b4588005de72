//! Monitored one-dimensional quantum circuits on matrix-product states.
//!
//! `bornverse` simulates circuits that interleave unitary evolution with
//! projective measurements, the setting of measurement- and
//! control-induced phase transition research, on truncated MPS
//! representations provided by [`schmidt`]. Trajectories are
//! byte-reproducible: every source of randomness draws from a named stream
//! in a per-state [`RngRegistry`], and symbolic expansion consumes draws
//! exactly like live execution.
//!
//! # Overview
//!
//! | Piece | Role |
//! |-------|------|
//! | [`SimulationState`] | MPS, site map, truncation parameters, RNG streams, observable series |
//! | [`Circuit`] / [`Circuit::build`] | immutable symbolic record of deterministic and stochastic operations |
//! | [`Geometry`] | where gates land: pairs, staircases, bricklayers, pointers |
//! | [`Gate`] | the gate catalog, including composite Born-sampled measurements |
//! | [`expand_circuit`] | offline, seeded expansion to concrete per-step operations |
//! | [`simulate`] | executes a circuit for N repetitions under a recording predicate |
//! | [`RecordWhen`] | when tracked observables are recorded |
//!
//! # Quick start
//!
//! ```
//! use bornverse::{
//!     simulate, Boundary, Circuit, Gate, Geometry, InitSpec, ObservableSpec, ProductSpec,
//!     RecordWhen, SimulationState,
//! };
//!
//! // One brick of Haar evolution followed by a reset, repeated twice per
//! // circuit repetition.
//! let circuit = Circuit::build(4, Boundary::Open, 2, [], |c| {
//!     c.apply(Gate::HaarRandom, Geometry::staircase_right(1))?;
//!     c.apply(Gate::Reset, Geometry::SingleSite(2))
//! })
//! .unwrap();
//!
//! let mut state = SimulationState::new(4, Boundary::Open)
//!     .unwrap()
//!     .with_seed(7);
//! state
//!     .initialize(InitSpec::Product(ProductSpec::BinaryInt(0)))
//!     .unwrap();
//! state
//!     .track("dw", ObservableSpec::DomainWall { i1: Some(2) })
//!     .unwrap();
//!
//! simulate(&circuit, &mut state, 2, &RecordWhen::EveryStep).unwrap();
//! assert_eq!(state.series("dw").unwrap().len(), 2);
//! ```
//!
//! # Reproducibility
//!
//! Streams never share draws: a Haar gate consumes `haar`, a measurement
//! consumes `born`, a stochastic operation consumes exactly one `ctrl`
//! draw whether or not a branch is selected. Two states built with the
//! same seed and driven through the same calls evolve identically up to
//! truncation round-off; [`expand_circuit`] under the same draw sequence
//! selects the same branches as [`simulate`].
//!
//! # Sharing circuits
//!
//! `Circuit` values are immutable, but staircase and pointer geometries
//! carry positions. The executor clones the operation list per call, so a
//! circuit may back many trajectories sequentially or across threads (one
//! `SimulationState` per thread).

pub mod apply;
pub mod basis;
pub mod circuit;
pub mod driver;
pub mod error;
pub mod executor;
pub mod expand;
pub mod gate;
pub mod geometry;
pub mod observable;
pub mod recording;
pub mod rng;
pub mod state;
#[cfg(test)]
pub(crate) mod statistical_testing;

pub use basis::{Boundary, SiteMap};
pub use circuit::{select_branch, Circuit, CircuitBuilder, Operation, Outcome};
pub use driver::{run_trajectories, trajectories};
pub use error::{Error, Result};
pub use executor::simulate;
pub use expand::{expand_circuit, ExpandedOp};
pub use gate::{Gate, MeasureBasis, SectorSet};
pub use geometry::{Geometry, Parity, Sites, Staircase};
pub use observable::{list_observables, ObservableSpec};
pub use recording::{RecordWhen, RecordingContext};
pub use rng::{RngRegistry, StreamName};
pub use state::{InitSpec, ProductSpec, SimulationState, SiteType};
