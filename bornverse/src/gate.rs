//! The gate catalog.
//!
//! Gates are a closed sum; the apply engine dispatches on the variant.
//! Unitary gates build their operator matrix here. The composite gates
//! (`Measurement`, `Reset`) and the Born-sampled `SpinSectorMeasurement`
//! never build a single matrix; the engine drives their per-site or
//! per-sector sampling itself and only the projector constructors below are
//! shared.
//!
//! Exactly `Projection`, `SpinSectorProjection` and `SpinSectorMeasurement`
//! leave the state unnormalized and require renormalization; every other
//! gate is unitary and must not be renormalized.

use ndarray::{array, Array2};
use ndarray_linalg::QR;
use num_complex::Complex64 as C64;
use rand::Rng;
use rand_distr::StandardNormal;
use schmidt::spin;

use crate::error::{invalid, unsupported, Error, Result};

fn c(re: f64) -> C64 {
    C64::new(re, 0.0)
}

/// Measurement basis for the composite `Measurement` gate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasureBasis {
    Z,
    X,
}

/// A non-empty subset of the two-site total-spin sectors `{0, 1, 2}`,
/// stored as a bitmask.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectorSet(u8);

impl SectorSet {
    /// Build from an explicit sector list.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on an empty list or a sector above 2.
    pub fn new(sectors: &[u8]) -> Result<Self> {
        if sectors.is_empty() {
            return Err(invalid("sector set must not be empty".to_string()));
        }
        let mut mask = 0u8;
        for &j in sectors {
            if j > 2 {
                return Err(invalid(format!("two spin-1 sites couple to J in 0..=2, got {j}")));
            }
            mask |= 1 << j;
        }
        Ok(Self(mask))
    }

    /// All three sectors.
    #[must_use]
    pub fn all() -> Self {
        Self(0b111)
    }

    #[must_use]
    pub fn contains(self, sector: u8) -> bool {
        sector <= 2 && self.0 & (1 << sector) != 0
    }

    /// The contained sectors in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0u8..=2).filter(move |&j| self.contains(j))
    }
}

/// The gates the engine knows how to apply.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    PauliX,
    PauliY,
    PauliZ,
    /// A fresh Haar-random two-site unitary per application, drawn from the
    /// `haar` stream.
    HaarRandom,
    /// Projector onto the computational basis state `k` of one site.
    Projection(usize),
    Cz,
    /// Composite: one Born-sampled projective measurement per site.
    Measurement(MeasureBasis),
    /// Composite: measure in Z, then flip back to `|0⟩` when the outcome
    /// was 1.
    Reset,
    /// Project two spin-1 sites onto a set of total-spin sectors.
    SpinSectorProjection(SectorSet),
    /// Born-sample one total-spin sector of two spin-1 sites (drawn from
    /// the `born` stream) and project onto it.
    SpinSectorMeasurement,
}

impl Gate {
    /// Number of physical sites one application touches.
    #[must_use]
    pub fn support(&self) -> usize {
        match self {
            Gate::PauliX
            | Gate::PauliY
            | Gate::PauliZ
            | Gate::Projection(_)
            | Gate::Measurement(_)
            | Gate::Reset => 1,
            Gate::HaarRandom
            | Gate::Cz
            | Gate::SpinSectorProjection(_)
            | Gate::SpinSectorMeasurement => 2,
        }
    }

    /// True when the engine must renormalize the state afterwards.
    #[must_use]
    pub fn requires_normalization(&self) -> bool {
        matches!(
            self,
            Gate::Projection(_) | Gate::SpinSectorProjection(_) | Gate::SpinSectorMeasurement
        )
    }

    /// True for the per-site Born-sampled gates the engine expands itself.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Gate::Measurement(_) | Gate::Reset)
    }

    /// Stable name for recording contexts.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::PauliX => "pauli_x",
            Gate::PauliY => "pauli_y",
            Gate::PauliZ => "pauli_z",
            Gate::HaarRandom => "haar_random",
            Gate::Projection(_) => "projection",
            Gate::Cz => "cz",
            Gate::Measurement(_) => "measurement",
            Gate::Reset => "reset",
            Gate::SpinSectorProjection(_) => "spin_sector_projection",
            Gate::SpinSectorMeasurement => "spin_sector_measurement",
        }
    }

    /// Short label for circuit diagrams.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Gate::PauliX => "X",
            Gate::PauliY => "Y",
            Gate::PauliZ => "Z",
            Gate::HaarRandom => "U",
            Gate::Projection(_) => "P",
            Gate::Cz => "CZ",
            Gate::Measurement(_) => "M",
            Gate::Reset => "R",
            Gate::SpinSectorProjection(_) => "Π",
            Gate::SpinSectorMeasurement => "MΠ",
        }
    }

    /// Build the operator matrix for a directly applicable gate.
    ///
    /// `local_dim` is the physical dimension of each touched site; the
    /// `haar` stream is drawn for [`Gate::HaarRandom`].
    ///
    /// # Errors
    ///
    /// `Unsupported` when the gate is not defined for `local_dim`;
    /// `Internal` when called for a composite or Born-sampled gate.
    pub(crate) fn build_operator<R: Rng + ?Sized>(
        &self,
        local_dim: usize,
        haar: &mut R,
    ) -> Result<Array2<C64>> {
        match *self {
            Gate::PauliX => qubit_only(local_dim, self.name()).map(|()| pauli_x()),
            Gate::PauliY => qubit_only(local_dim, self.name()).map(|()| pauli_y()),
            Gate::PauliZ => qubit_only(local_dim, self.name()).map(|()| pauli_z()),
            Gate::Cz => qubit_only(local_dim, self.name()).map(|()| cz()),
            Gate::HaarRandom => haar_unitary(local_dim * local_dim, haar),
            Gate::Projection(level) => {
                if level >= local_dim {
                    return Err(invalid(format!(
                        "projection level {level} out of range for local dimension {local_dim}"
                    )));
                }
                Ok(basis_projector(local_dim, level))
            }
            Gate::SpinSectorProjection(sectors) => {
                if local_dim != spin::DIM {
                    return Err(unsupported(format!(
                        "spin sector projection requires S=1 sites, got local dimension {local_dim}"
                    )));
                }
                Ok(sector_sum(sectors))
            }
            Gate::Measurement(_) | Gate::Reset | Gate::SpinSectorMeasurement => Err(
                Error::Internal(format!("{} has no direct operator matrix", self.name())),
            ),
        }
    }
}

fn qubit_only(local_dim: usize, gate: &str) -> Result<()> {
    if local_dim != 2 {
        return Err(unsupported(format!(
            "{gate} is defined for qubit sites only, got local dimension {local_dim}"
        )));
    }
    Ok(())
}

pub(crate) fn pauli_x() -> Array2<C64> {
    array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]]
}

pub(crate) fn pauli_y() -> Array2<C64> {
    array![
        [c(0.0), C64::new(0.0, -1.0)],
        [C64::new(0.0, 1.0), c(0.0)],
    ]
}

pub(crate) fn pauli_z() -> Array2<C64> {
    array![[c(1.0), c(0.0)], [c(0.0), c(-1.0)]]
}

pub(crate) fn cz() -> Array2<C64> {
    let mut m = Array2::eye(4);
    m[[3, 3]] = c(-1.0);
    m
}

/// `|k⟩⟨k|` in dimension `d`.
pub(crate) fn basis_projector(d: usize, k: usize) -> Array2<C64> {
    let mut m = Array2::zeros((d, d));
    m[[k, k]] = c(1.0);
    m
}

/// Projector for a two-outcome measurement: outcome 0 keeps `|0⟩` (or
/// `|+⟩` in the X basis), outcome 1 keeps `|1⟩` (or `|−⟩`).
pub(crate) fn measurement_projector(basis: MeasureBasis, outcome: usize) -> Array2<C64> {
    match basis {
        MeasureBasis::Z => basis_projector(2, outcome),
        MeasureBasis::X => {
            let sign = if outcome == 0 { 1.0 } else { -1.0 };
            array![[c(0.5), c(0.5 * sign)], [c(0.5 * sign), c(0.5)]]
        }
    }
}

/// Sum of the selected total-spin sector projectors on two spin-1 sites.
pub(crate) fn sector_sum(sectors: SectorSet) -> Array2<C64> {
    let mut m = Array2::zeros((spin::DIM * spin::DIM, spin::DIM * spin::DIM));
    for j in sectors.iter() {
        m = m + spin::sector_projector(j);
    }
    m
}

/// A Haar-distributed unitary: QR of a complex Ginibre matrix with the
/// phases of the R diagonal folded into Q.
///
/// # Errors
///
/// `NumericalFailure` if the QR factorization fails.
pub(crate) fn haar_unitary<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Result<Array2<C64>> {
    let mut ginibre: Array2<C64> = Array2::zeros((dim, dim));
    for v in ginibre.iter_mut() {
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        *v = C64::new(re, im);
    }
    let (q, r) = ginibre
        .qr()
        .map_err(|e| Error::NumericalFailure(e.to_string()))?;
    let mut unitary = q;
    for j in 0..dim {
        let d = r[[j, j]];
        let phase = if d.norm() > 0.0 { d / d.norm() } else { c(1.0) };
        unitary.column_mut(j).mapv_inplace(|x| x * phase);
    }
    Ok(unitary)
}
