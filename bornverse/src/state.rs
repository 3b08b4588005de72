//! The mutable per-trajectory simulation state.
//!
//! A `SimulationState` owns everything one trajectory needs: the MPS (once
//! initialized), the physical↔chain site map, truncation parameters, the
//! RNG registry, and the registered observables with their recorded
//! series. Distinct states share nothing, so independent trajectories can
//! run on separate threads.

use std::collections::HashMap;

use derive_more::Display;
use ndarray::Array1;
use num_complex::Complex64 as C64;
use schmidt::Mps;

use crate::basis::{Boundary, SiteMap};
use crate::error::{invalid, unsupported, Result};
use crate::observable::ObservableSpec;
use crate::rng::{RngRegistry, StreamName};

/// What lives on each physical site.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum SiteType {
    #[display(fmt = "Qubit")]
    Qubit,
    #[display(fmt = "S=1")]
    SpinOne,
    #[display(fmt = "Qudit")]
    Qudit,
}

impl std::str::FromStr for SiteType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Qubit" => Ok(SiteType::Qubit),
            "S=1" => Ok(SiteType::SpinOne),
            "Qudit" => Ok(SiteType::Qudit),
            other => Err(unsupported(format!("unknown site type `{other}`"))),
        }
    }
}

/// How to prepare the initial state.
#[derive(Clone, Debug, PartialEq)]
pub enum InitSpec {
    Product(ProductSpec),
    /// A Gaussian-random MPS with the given bond dimension, drawn from the
    /// `state_init` stream.
    RandomMps { bond_dim: usize },
}

/// Bit-pattern sources for a computational-basis product state.
///
/// The site-name convention is MSB at physical site 1, LSB at site `L`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductSpec {
    /// The binary digits of an integer, zero-padded on the left to `L`
    /// bits. Values needing more than `L` bits are rejected.
    BinaryInt(u64),
    /// A textual `0.b₁b₂…` pattern; the fractional digits are the leading
    /// bits, padded with zeros.
    BinaryDecimal(String),
    /// A 0/1 string; shorter strings are right-padded with `'0'`, longer
    /// ones truncated to `L`.
    Bitstring(String),
    /// Every site in the same local basis level (e.g. level 1 puts an S=1
    /// chain into all `|Z0⟩`).
    LocalState(usize),
}

pub const DEFAULT_CUTOFF: f64 = 1e-10;
pub const DEFAULT_MAX_BOND: usize = 100;

/// One trajectory's worth of simulator state. See the module docs.
#[derive(Debug)]
pub struct SimulationState {
    pub(crate) length: usize,
    pub(crate) boundary: Boundary,
    pub(crate) site_type: SiteType,
    pub(crate) local_dim: usize,
    pub(crate) cutoff: f64,
    pub(crate) max_bond: usize,
    pub(crate) map: SiteMap,
    pub(crate) mps: Option<Mps>,
    pub(crate) rng: RngRegistry,
    pub(crate) observables: Vec<(String, ObservableSpec)>,
    pub(crate) series: HashMap<String, Vec<f64>>,
}

impl SimulationState {
    /// A qubit chain with default truncation (cutoff 1e-10, max bond 100)
    /// and an entropy-seeded RNG registry.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `length < 2` or an odd length with a periodic
    /// boundary.
    pub fn new(length: usize, boundary: Boundary) -> Result<Self> {
        let map = SiteMap::new(length, boundary)?;
        Ok(Self {
            length,
            boundary,
            site_type: SiteType::Qubit,
            local_dim: 2,
            cutoff: DEFAULT_CUTOFF,
            max_bond: DEFAULT_MAX_BOND,
            map,
            mps: None,
            rng: RngRegistry::from_entropy(),
            observables: Vec::new(),
            series: HashMap::new(),
        })
    }

    /// Switch to qubit or S=1 sites (with their fixed local dimensions).
    /// Use [`Self::with_qudit`] for explicit-dimension qudits.
    ///
    /// # Errors
    ///
    /// `Unsupported` when passed [`SiteType::Qudit`]; the dimension must be
    /// given explicitly.
    pub fn with_site_type(mut self, site_type: SiteType) -> Result<Self> {
        self.local_dim = match site_type {
            SiteType::Qubit => 2,
            SiteType::SpinOne => 3,
            SiteType::Qudit => {
                return Err(unsupported(
                    "qudit sites need an explicit dimension; use with_qudit".to_string(),
                ))
            }
        };
        self.site_type = site_type;
        Ok(self)
    }

    /// Switch to qudit sites of dimension `local_dim ≥ 2`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `local_dim < 2`.
    pub fn with_qudit(mut self, local_dim: usize) -> Result<Self> {
        if local_dim < 2 {
            return Err(invalid(format!("qudit dimension must be at least 2, got {local_dim}")));
        }
        self.site_type = SiteType::Qudit;
        self.local_dim = local_dim;
        Ok(self)
    }

    /// Set the SVD truncation cutoff.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative or non-finite cutoff.
    pub fn with_cutoff(mut self, cutoff: f64) -> Result<Self> {
        if !cutoff.is_finite() || cutoff < 0.0 {
            return Err(invalid(format!("cutoff must be finite and non-negative, got {cutoff}")));
        }
        self.cutoff = cutoff;
        Ok(self)
    }

    /// Set the maximum bond dimension.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for zero.
    pub fn with_max_bond(mut self, max_bond: usize) -> Result<Self> {
        if max_bond == 0 {
            return Err(invalid("maximum bond dimension must be at least 1".to_string()));
        }
        self.max_bond = max_bond;
        Ok(self)
    }

    /// Deterministically seed all RNG streams from one master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RngRegistry::seeded(seed);
        self
    }

    /// Install a fully configured registry.
    #[must_use]
    pub fn with_rng(mut self, rng: RngRegistry) -> Self {
        self.rng = rng;
        self
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
    pub fn site_type(&self) -> SiteType {
        self.site_type
    }

    #[must_use]
    pub fn local_dim(&self) -> usize {
        self.local_dim
    }

    #[must_use]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    #[must_use]
    pub fn max_bond(&self) -> usize {
        self.max_bond
    }

    /// The physical↔chain site map.
    #[must_use]
    pub fn map(&self) -> &SiteMap {
        &self.map
    }

    /// Physical site labels in chain order.
    #[must_use]
    pub fn site_order(&self) -> &[usize] {
        self.map.site_order()
    }

    /// The state tensor network, once initialized.
    #[must_use]
    pub fn mps(&self) -> Option<&Mps> {
        self.mps.as_ref()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.mps.is_some()
    }

    /// Reseed one RNG stream in place.
    pub fn reseed_stream(&mut self, name: StreamName, seed: u64) {
        self.rng.reseed(name, seed);
    }

    /// Prepare the initial state. May be called once.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a second initialization, a malformed product
    /// spec, or a zero bond dimension.
    pub fn initialize(&mut self, spec: InitSpec) -> Result<()> {
        if self.mps.is_some() {
            return Err(invalid("state is already initialized".to_string()));
        }
        let mps = match spec {
            InitSpec::Product(product) => {
                let levels = self.product_levels(&product)?;
                let states: Vec<Array1<C64>> = self
                    .map
                    .site_order()
                    .iter()
                    .map(|&phy| level_vector(self.local_dim, levels[phy - 1]))
                    .collect();
                Mps::product_state(&states, self.cutoff, self.max_bond)?
            }
            InitSpec::RandomMps { bond_dim } => {
                if bond_dim == 0 {
                    return Err(invalid("random MPS bond dimension must be at least 1".to_string()));
                }
                let dims = vec![self.local_dim; self.length];
                Mps::random(
                    &dims,
                    bond_dim,
                    self.cutoff,
                    self.max_bond,
                    self.rng.stream_mut(StreamName::StateInit),
                )?
            }
        };
        self.mps = Some(mps);
        Ok(())
    }

    /// Local basis level per physical site (index 0 = site 1).
    fn product_levels(&self, spec: &ProductSpec) -> Result<Vec<usize>> {
        let length = self.length;
        let one_level = self.one_level();
        match spec {
            ProductSpec::BinaryInt(value) => {
                if length < u64::BITS as usize && *value >= 1u64 << length {
                    return Err(invalid(format!(
                        "binary_int {value} does not fit into {length} sites"
                    )));
                }
                Ok((0..length)
                    .map(|i| {
                        let shift = length - 1 - i;
                        let bit = if shift >= u64::BITS as usize {
                            0
                        } else {
                            (value >> shift) & 1
                        };
                        if bit == 1 { one_level } else { 0 }
                    })
                    .collect())
            }
            ProductSpec::BinaryDecimal(text) => {
                let digits = text
                    .strip_prefix("0.")
                    .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c == '0' || c == '1'))
                    .ok_or_else(|| {
                        invalid(format!("binary_decimal must look like 0.xxx with 0/1 digits, got `{text}`"))
                    })?;
                Ok(self.bits_to_levels(digits, one_level))
            }
            ProductSpec::Bitstring(bits) => {
                if !bits.chars().all(|c| c == '0' || c == '1') {
                    return Err(invalid(format!("bitstring must contain only 0/1, got `{bits}`")));
                }
                Ok(self.bits_to_levels(bits, one_level))
            }
            ProductSpec::LocalState(level) => {
                if *level >= self.local_dim {
                    return Err(invalid(format!(
                        "local state level {level} out of range for dimension {}",
                        self.local_dim
                    )));
                }
                Ok(vec![*level; length])
            }
        }
    }

    /// Left-align a bit text, pad with zeros, truncate to `L`.
    fn bits_to_levels(&self, bits: &str, one_level: usize) -> Vec<usize> {
        (0..self.length)
            .map(|i| match bits.as_bytes().get(i) {
                Some(b'1') => one_level,
                _ => 0,
            })
            .collect()
    }

    /// The local basis level the bit symbol "1" maps to: `|1⟩` for qubits,
    /// `|Dn⟩` (m = −1) for S=1, the second state for qudits. "0" is always
    /// level 0.
    fn one_level(&self) -> usize {
        match self.site_type {
            SiteType::Qubit | SiteType::Qudit => 1,
            SiteType::SpinOne => 2,
        }
    }

    /// Register an observable under a unique name.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a duplicate name or a spec that does not fit
    /// this state's shape.
    pub fn track(&mut self, name: &str, spec: ObservableSpec) -> Result<()> {
        if self.series.contains_key(name) {
            return Err(invalid(format!("observable `{name}` is already tracked")));
        }
        spec.validate(self.length, self.site_type, self.boundary)?;
        self.observables.push((name.to_string(), spec));
        self.series.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Evaluate every tracked observable and append to its series.
    ///
    /// # Errors
    ///
    /// Fails when an observable cannot be evaluated (e.g. a domain wall
    /// with no index anywhere).
    pub fn record(&mut self) -> Result<()> {
        self.record_inner(None)
    }

    /// Like [`Self::record`], supplying the domain-wall index for specs
    /// that left it open at registration.
    pub fn record_with(&mut self, i1: usize) -> Result<()> {
        self.record_inner(Some(i1))
    }

    fn record_inner(&mut self, i1: Option<usize>) -> Result<()> {
        // Values are computed up front so a failing observable never leaves
        // the series at uneven lengths.
        let mut values = Vec::with_capacity(self.observables.len());
        for (name, spec) in &self.observables {
            values.push((name.clone(), spec.evaluate(self, i1)?));
        }
        for (name, value) in values {
            self.series
                .get_mut(&name)
                .unwrap_or_else(|| unreachable!("series created at track time"))
                .push(value);
        }
        Ok(())
    }

    /// The recorded series of one observable.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Names of the tracked observables, in registration order.
    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.observables.iter().map(|(name, _)| name.as_str())
    }
}

fn level_vector(dim: usize, level: usize) -> Array1<C64> {
    let mut v = Array1::zeros(dim);
    v[level] = C64::new(1.0, 0.0);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qubit_state(length: usize) -> SimulationState {
        SimulationState::new(length, Boundary::Open).unwrap().with_seed(1)
    }

    #[test]
    fn binary_int_msb_lands_on_site_one() {
        let mut state = qubit_state(4);
        // 5 = 0101: site 1 -> 0, site 2 -> 1, site 3 -> 0, site 4 -> 1.
        state
            .initialize(InitSpec::Product(ProductSpec::BinaryInt(5)))
            .unwrap();
        let v = state.mps().unwrap().to_statevector();
        assert!((v[0b0101].re - 1.0).abs() < 1e-12);
        assert_eq!(state.mps().unwrap().max_bond_dim(), 1);
    }

    #[test]
    fn binary_int_rejects_overflow() {
        let mut state = qubit_state(3);
        assert!(state
            .initialize(InitSpec::Product(ProductSpec::BinaryInt(8)))
            .is_err());
    }

    #[test]
    fn bitstring_pads_and_truncates() {
        let mut state = qubit_state(4);
        state
            .initialize(InitSpec::Product(ProductSpec::Bitstring("11".into())))
            .unwrap();
        let v = state.mps().unwrap().to_statevector();
        assert!((v[0b1100].re - 1.0).abs() < 1e-12);

        let mut long = qubit_state(2);
        long.initialize(InitSpec::Product(ProductSpec::Bitstring("0110".into())))
            .unwrap();
        let v = long.mps().unwrap().to_statevector();
        assert!((v[0b01].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn binary_decimal_requires_the_textual_form() {
        let mut state = qubit_state(3);
        assert!(state
            .initialize(InitSpec::Product(ProductSpec::BinaryDecimal("0.21".into())))
            .is_err());
        assert!(state
            .initialize(InitSpec::Product(ProductSpec::BinaryDecimal("1.01".into())))
            .is_err());
        state
            .initialize(InitSpec::Product(ProductSpec::BinaryDecimal("0.101".into())))
            .unwrap();
        let v = state.mps().unwrap().to_statevector();
        assert!((v[0b101].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spin_one_maps_bit_one_to_down() {
        let mut state = SimulationState::new(2, Boundary::Open)
            .unwrap()
            .with_site_type(SiteType::SpinOne)
            .unwrap()
            .with_seed(1);
        state
            .initialize(InitSpec::Product(ProductSpec::Bitstring("01".into())))
            .unwrap();
        let v = state.mps().unwrap().to_statevector();
        // Site 1 |Up> (level 0), site 2 |Dn> (level 2): index 0*3 + 2.
        assert!((v[2].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn initialization_is_one_shot() {
        let mut state = qubit_state(2);
        state
            .initialize(InitSpec::Product(ProductSpec::BinaryInt(0)))
            .unwrap();
        assert!(state
            .initialize(InitSpec::Product(ProductSpec::BinaryInt(1)))
            .is_err());
    }

    #[test]
    fn random_mps_is_seed_reproducible() {
        let mut a = qubit_state(5);
        let mut b = qubit_state(5);
        a.initialize(InitSpec::RandomMps { bond_dim: 3 }).unwrap();
        b.initialize(InitSpec::RandomMps { bond_dim: 3 }).unwrap();
        let va = a.mps().unwrap().to_statevector();
        let vb = b.mps().unwrap().to_statevector();
        for (x, y) in va.iter().zip(vb.iter()) {
            assert!((x - y).norm() < 1e-12);
        }
    }

    #[test]
    fn duplicate_observable_names_are_rejected() {
        let mut state = qubit_state(4);
        state
            .track("dw", ObservableSpec::DomainWall { i1: Some(2) })
            .unwrap();
        assert!(state
            .track("dw", ObservableSpec::BondDimension)
            .is_err());
        assert_eq!(state.tracked().collect::<Vec<_>>(), vec!["dw"]);
    }

    #[test]
    fn qudit_needs_an_explicit_dimension() {
        let state = SimulationState::new(3, Boundary::Open).unwrap();
        assert!(state.with_site_type(SiteType::Qudit).is_err());
        let state = SimulationState::new(3, Boundary::Open)
            .unwrap()
            .with_qudit(4)
            .unwrap();
        assert_eq!(state.local_dim(), 4);
    }
}
