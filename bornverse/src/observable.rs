//! Observables recorded during simulation.
//!
//! A registered observable produces one scalar per `record` call and is
//! read-only on the state (entropy works on an internal copy). The engine
//! only knows the interface; the concrete family here is the standard
//! monitored-circuit set: domain-wall density, entanglement entropy across
//! a chain link, the spin-1 string order parameter, and the maximum link
//! dimension.

use ndarray::Array2;
use num_complex::Complex64 as C64;
use schmidt::spin;

use crate::basis::Boundary;
use crate::error::{invalid, unsupported, Result};
use crate::state::{SimulationState, SiteType};

/// Kind names reported by [`list_observables`].
pub const OBSERVABLE_KINDS: [&str; 5] = [
    "domain_wall",
    "entanglement_entropy",
    "string_order",
    "magnetization",
    "bond_dimension",
];

/// The registered observable kinds, by name.
#[must_use]
pub fn list_observables() -> &'static [&'static str] {
    &OBSERVABLE_KINDS
}

/// Specification of one tracked observable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObservableSpec {
    /// Domain-wall density `(1 − ⟨Z_i Z_{i+1}⟩)/2` at the cut after
    /// physical site `i1`. The index may be fixed at registration or
    /// supplied per `record` call.
    DomainWall { i1: Option<usize> },
    /// Von Neumann entropy across the chain link `bond ∈ 1..L` (between
    /// chain positions `bond` and `bond + 1`).
    EntanglementEntropy { bond: usize },
    /// String order `⟨A_{i1} Π_k exp(iπ Sz_k) A_{i2}⟩` on spin-1 chains,
    /// with `A = Sz^order`.
    StringOrder { i1: usize, i2: usize, order: u8 },
    /// `⟨Z_site⟩` (or `⟨Sz_site⟩` on S=1 chains); without a site, the
    /// chain average.
    Magnetization { site: Option<usize> },
    /// Largest link dimension of the state.
    BondDimension,
}

impl ObservableSpec {
    /// Kind name of this spec.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ObservableSpec::DomainWall { .. } => "domain_wall",
            ObservableSpec::EntanglementEntropy { .. } => "entanglement_entropy",
            ObservableSpec::StringOrder { .. } => "string_order",
            ObservableSpec::Magnetization { .. } => "magnetization",
            ObservableSpec::BondDimension => "bond_dimension",
        }
    }

    /// Registration-time validation against the target state's shape.
    pub(crate) fn validate(
        &self,
        length: usize,
        site_type: SiteType,
        boundary: Boundary,
    ) -> Result<()> {
        match *self {
            ObservableSpec::DomainWall { i1 } => {
                if let Some(i1) = i1 {
                    check_cut(i1, length, boundary)?;
                }
                Ok(())
            }
            ObservableSpec::EntanglementEntropy { bond } => {
                if bond == 0 || bond >= length {
                    return Err(invalid(format!("entropy bond {bond} out of range 1..{length}")));
                }
                Ok(())
            }
            ObservableSpec::StringOrder { i1, i2, order } => {
                if site_type != SiteType::SpinOne {
                    return Err(unsupported(
                        "string order is defined for S=1 chains only".to_string(),
                    ));
                }
                if !(1..=length).contains(&i1) || !(1..=length).contains(&i2) || i1 >= i2 {
                    return Err(invalid(format!(
                        "string order endpoints ({i1}, {i2}) must satisfy 1 <= i1 < i2 <= {length}"
                    )));
                }
                match order {
                    1 => Ok(()),
                    2 => {
                        if i2 - i1 < 3 {
                            return Err(invalid(format!(
                                "order-2 string order needs separation >= 3, got {}",
                                i2 - i1
                            )));
                        }
                        Ok(())
                    }
                    other => Err(invalid(format!("string order supports orders 1 and 2, got {other}"))),
                }
            }
            ObservableSpec::Magnetization { site } => {
                if let Some(site) = site {
                    if !(1..=length).contains(&site) {
                        return Err(invalid(format!(
                            "magnetization site {site} out of range 1..={length}"
                        )));
                    }
                }
                Ok(())
            }
            ObservableSpec::BondDimension => Ok(()),
        }
    }

    /// Evaluate against the current state. `i1_override` feeds domain-wall
    /// specs that left the index open at registration.
    pub(crate) fn evaluate(
        &self,
        state: &SimulationState,
        i1_override: Option<usize>,
    ) -> Result<f64> {
        let mps = state
            .mps()
            .ok_or_else(|| invalid("state must be initialized before recording".to_string()))?;
        match *self {
            ObservableSpec::DomainWall { i1 } => {
                let i1 = i1.or(i1_override).ok_or_else(|| {
                    invalid("domain wall needs an i1 index at registration or record time".to_string())
                })?;
                check_cut(i1, state.length(), state.boundary())?;
                let partner = if i1 == state.length() { 1 } else { i1 + 1 };
                let z = z_like(state.site_type())?;
                let left = state.map().ram(i1)?;
                let right = state.map().ram(partner)?;
                let zz = mps.expect_product(&[(left, &z), (right, &z)])?;
                Ok((1.0 - zz.re) / 2.0)
            }
            ObservableSpec::EntanglementEntropy { bond } => Ok(mps.entanglement_entropy(bond - 1)?),
            ObservableSpec::StringOrder { i1, i2, order } => {
                let endpoint = if order == 2 {
                    spin::sz().dot(&spin::sz())
                } else {
                    spin::sz()
                };
                let phase = spin::string_phase();
                let mut ops: Vec<(usize, &Array2<C64>)> = Vec::with_capacity(i2 - i1 + 1);
                ops.push((state.map().ram(i1)?, &endpoint));
                for site in i1 + 1..i2 {
                    ops.push((state.map().ram(site)?, &phase));
                }
                ops.push((state.map().ram(i2)?, &endpoint));
                Ok(mps.expect_product(&ops)?.re)
            }
            ObservableSpec::Magnetization { site } => {
                let z = z_like(state.site_type())?;
                match site {
                    Some(site) => {
                        let chain_site = state.map().ram(site)?;
                        Ok(mps.expect_product(&[(chain_site, &z)])?.re)
                    }
                    None => {
                        let mut total = 0.0;
                        for site in 1..=state.length() {
                            let chain_site = state.map().ram(site)?;
                            total += mps.expect_product(&[(chain_site, &z)])?.re;
                        }
                        #[allow(clippy::cast_precision_loss)]
                        Ok(total / state.length() as f64)
                    }
                }
            }
            ObservableSpec::BondDimension => {
                #[allow(clippy::cast_precision_loss)]
                Ok(mps.max_bond_dim() as f64)
            }
        }
    }
}

fn check_cut(i1: usize, length: usize, boundary: Boundary) -> Result<()> {
    let limit = if boundary.is_periodic() { length } else { length - 1 };
    if i1 == 0 || i1 > limit {
        return Err(invalid(format!("domain wall cut {i1} out of range 1..={limit}")));
    }
    Ok(())
}

fn z_like(site_type: SiteType) -> Result<Array2<C64>> {
    match site_type {
        SiteType::Qubit => Ok(crate::gate::pauli_z()),
        SiteType::SpinOne => Ok(spin::sz()),
        SiteType::Qudit => Err(unsupported(
            "Z-based observables are defined for qubit and S=1 sites".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_listed() {
        assert_eq!(list_observables().len(), 5);
        for spec in [
            ObservableSpec::DomainWall { i1: None },
            ObservableSpec::EntanglementEntropy { bond: 1 },
            ObservableSpec::StringOrder { i1: 1, i2: 4, order: 1 },
            ObservableSpec::Magnetization { site: None },
            ObservableSpec::BondDimension,
        ] {
            assert!(list_observables().contains(&spec.kind()));
        }
    }

    #[test]
    fn string_order_validation_rules() {
        let ok = ObservableSpec::StringOrder { i1: 1, i2: 4, order: 1 };
        assert!(ok.validate(6, SiteType::SpinOne, Boundary::Open).is_ok());

        // Qubit chains are rejected.
        assert!(ok.validate(6, SiteType::Qubit, Boundary::Open).is_err());

        // Order 2 needs separation of at least 3.
        let tight = ObservableSpec::StringOrder { i1: 2, i2: 4, order: 2 };
        assert!(tight.validate(6, SiteType::SpinOne, Boundary::Open).is_err());
        let wide = ObservableSpec::StringOrder { i1: 1, i2: 4, order: 2 };
        assert!(wide.validate(6, SiteType::SpinOne, Boundary::Open).is_ok());

        // Reversed endpoints are rejected.
        let reversed = ObservableSpec::StringOrder { i1: 4, i2: 1, order: 1 };
        assert!(reversed.validate(6, SiteType::SpinOne, Boundary::Open).is_err());
    }

    #[test]
    fn cut_and_site_ranges_are_checked() {
        let wall = ObservableSpec::DomainWall { i1: Some(6) };
        assert!(wall.validate(6, SiteType::Qubit, Boundary::Open).is_err());
        assert!(wall.validate(6, SiteType::Qubit, Boundary::Periodic).is_ok());

        let entropy = ObservableSpec::EntanglementEntropy { bond: 6 };
        assert!(entropy.validate(6, SiteType::Qubit, Boundary::Open).is_err());

        let magnet = ObservableSpec::Magnetization { site: Some(7) };
        assert!(magnet.validate(6, SiteType::Qubit, Boundary::Open).is_err());
    }
}
