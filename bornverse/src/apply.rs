//! The gate-application engine.
//!
//! Entry points live on [`SimulationState`]: [`SimulationState::apply`]
//! dispatches on the geometry (compound geometries expand, staircases
//! advance after their sites are read) and
//! [`SimulationState::apply_at`] runs one gate on an explicit site list.
//!
//! Composite gates (`Measurement`, `Reset`) are expanded here into one
//! Born-sampled projection per site (exactly one `born` draw each) plus
//! the conditional flip for `Reset`. `SpinSectorMeasurement` Born-samples
//! one total-spin sector with a single `born` draw. Projective gates are
//! renormalized; unitary gates are not.

use log::trace;
use schmidt::{spin, LocalOp};

use crate::circuit::{select_branch, validate_outcomes, Outcome};
use crate::error::{invalid, unsupported, Error, Result};
use crate::gate::{self, Gate, MeasureBasis};
use crate::geometry::Geometry;
use crate::rng::StreamName;
use crate::state::{SimulationState, SiteType};

/// Born weights below this total are a numerical failure.
const WEIGHT_FLOOR: f64 = 1e-14;

impl SimulationState {
    /// Apply `gate` over `geometry`, advancing staircase positions.
    ///
    /// # Errors
    ///
    /// Everything [`Self::apply_at`] can return, plus geometry range
    /// errors.
    pub fn apply(&mut self, gate: &Gate, geometry: &mut Geometry) -> Result<()> {
        if geometry.is_compound() {
            for element in geometry.elements(self.length, self.boundary)? {
                self.apply_at(gate, &element)?;
            }
            Ok(())
        } else {
            let sites = geometry.sites(self.length, self.boundary)?;
            self.apply_at(gate, &sites)?;
            geometry.advance(self.length, self.boundary);
            Ok(())
        }
    }

    /// Apply one gate execution to explicit physical sites.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the site count does not match the gate
    /// support; `Unsupported` for a gate/site-type mismatch;
    /// `NumericalFailure` when a measurement runs out of weight.
    pub fn apply_at(&mut self, gate: &Gate, phys_sites: &[usize]) -> Result<()> {
        if phys_sites.len() != gate.support() {
            return Err(invalid(format!(
                "{} acts on {} site(s), got {:?}",
                gate.name(),
                gate.support(),
                phys_sites
            )));
        }
        trace!("apply {} at {:?}", gate.name(), phys_sites);
        match gate {
            Gate::Measurement(basis) => {
                self.born_measure(phys_sites[0], *basis)?;
                Ok(())
            }
            Gate::Reset => {
                let outcome = self.born_measure(phys_sites[0], MeasureBasis::Z)?;
                if outcome == 1 {
                    self.apply_operator(&[phys_sites[0]], gate::pauli_x())?;
                }
                Ok(())
            }
            Gate::SpinSectorMeasurement => self.sector_measure(phys_sites),
            _ => {
                let matrix =
                    gate.build_operator(self.local_dim, self.rng.stream_mut(StreamName::Haar))?;
                self.apply_operator(phys_sites, matrix)?;
                if gate.requires_normalization() {
                    self.renormalize()?;
                }
                Ok(())
            }
        }
    }

    /// Draw once from a named stream and apply the selected branch, if any.
    ///
    /// Exactly one draw is consumed whether or not an outcome is selected.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed outcome list, plus anything
    /// [`Self::apply`] can return.
    pub fn apply_with_prob(&mut self, stream: StreamName, outcomes: &mut [Outcome]) -> Result<()> {
        validate_outcomes(outcomes)?;
        let draw = self.rng.uniform(stream);
        if let Some(selected) = select_branch(draw, outcomes) {
            let outcome = &mut outcomes[selected];
            let gate = outcome.gate;
            self.apply(&gate, &mut outcome.geometry)?;
        }
        Ok(())
    }

    /// Map physical sites to chain positions and contract the operator in.
    fn apply_operator(&mut self, phys_sites: &[usize], matrix: ndarray::Array2<schmidt::C64>) -> Result<()> {
        let mut chain_sites = Vec::with_capacity(phys_sites.len());
        for &phy in phys_sites {
            chain_sites.push(self.map.ram(phy)?);
        }
        let mps = self
            .mps
            .as_mut()
            .ok_or_else(|| invalid("state must be initialized before applying gates".to_string()))?;
        let op = LocalOp::new(&chain_sites, matrix, mps.dims())
            .map_err(|e| Error::Internal(e.to_string()))?;
        mps.apply_local_op(&op)?;
        Ok(())
    }

    fn renormalize(&mut self) -> Result<()> {
        let mps = self
            .mps
            .as_mut()
            .ok_or_else(|| invalid("state must be initialized".to_string()))?;
        let norm = mps.normalize();
        if norm * norm < WEIGHT_FLOOR {
            return Err(Error::NumericalFailure(format!(
                "state norm collapsed to {norm:.3e} after projection"
            )));
        }
        Ok(())
    }

    /// One projective measurement of one site: compute `p₀ = ⟨P₀⟩`, draw
    /// once from `born`, project, renormalize. Returns the outcome bit.
    fn born_measure(&mut self, phy: usize, basis: MeasureBasis) -> Result<usize> {
        if self.local_dim != 2 {
            return Err(unsupported(format!(
                "measurement is defined for qubit sites, got local dimension {}",
                self.local_dim
            )));
        }
        let chain_site = self.map.ram(phy)?;
        let p0 = {
            let mps = self
                .mps
                .as_ref()
                .ok_or_else(|| invalid("state must be initialized before measuring".to_string()))?;
            mps.site_probability(chain_site, &gate::measurement_projector(basis, 0))?
        };
        let draw = self.rng.uniform(StreamName::Born);
        let outcome = usize::from(draw >= p0);
        trace!("born measure site {phy}: p0={p0:.6}, outcome={outcome}");
        self.apply_operator(&[phy], gate::measurement_projector(basis, outcome))?;
        self.renormalize()?;
        Ok(outcome)
    }

    /// Born-sample one total-spin sector of two S=1 sites with a single
    /// `born` draw, then project onto it.
    fn sector_measure(&mut self, phys_sites: &[usize]) -> Result<()> {
        if self.site_type != SiteType::SpinOne {
            return Err(unsupported(
                "spin sector measurement requires S=1 sites".to_string(),
            ));
        }
        let chain_sites = [self.map.ram(phys_sites[0])?, self.map.ram(phys_sites[1])?];
        let mps = self
            .mps
            .as_ref()
            .ok_or_else(|| invalid("state must be initialized before measuring".to_string()))?;

        // Sector weights by trial projection on copies; the state itself is
        // read-only until the draw picks a sector.
        let mut weights = [0.0_f64; 3];
        for sector in spin::SECTORS {
            let mut copy = mps.clone();
            let op = LocalOp::new(&chain_sites, spin::sector_projector(sector), copy.dims())
                .map_err(|e| Error::Internal(e.to_string()))?;
            copy.apply_local_op(&op)?;
            let norm = copy.norm();
            weights[sector as usize] = norm * norm;
        }
        let total: f64 = weights.iter().sum();
        if total < WEIGHT_FLOOR {
            return Err(Error::NumericalFailure(format!(
                "sector measurement found total weight {total:.3e}"
            )));
        }

        let draw = self.rng.uniform(StreamName::Born);
        let mut cumulative = 0.0;
        let mut selected = None;
        for sector in spin::SECTORS {
            cumulative += weights[sector as usize];
            if draw < cumulative {
                selected = Some(sector);
                break;
            }
        }
        // Truncation loss can leave the cumulative weights short of the
        // draw; fall back to the heaviest tail sector.
        let selected = selected.unwrap_or_else(|| {
            spin::SECTORS
                .into_iter()
                .rev()
                .find(|&j| weights[j as usize] > 0.0)
                .unwrap_or(2)
        });
        trace!(
            "sector measure sites {:?}: weights={weights:?}, selected={selected}",
            phys_sites
        );
        self.apply_operator(phys_sites, spin::sector_projector(selected))?;
        self.renormalize()
    }
}
