//! Mappings between physical site labels and chain (RAM) positions.
//!
//! Users address sites by the physical label `1..=L`. The matrix-product
//! chain stores them in an order chosen so that the pairs a boundary
//! condition couples stay close together on the chain:
//!
//! - **open**: identity; neighbors are neighbors.
//! - **periodic**: folded interleave `[1, L, 2, L-1, ...]`, which puts the
//!   wrap-around pair `(L, 1)` at chain distance one.
//! - **periodic-nnn**: an outward-from-middle order that additionally
//!   keeps next-nearest-neighbor pairs at bounded chain distance.

use derive_more::Display;

use crate::error::{invalid, Result};

/// Boundary condition of the physical chain.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Boundary {
    #[display(fmt = "open")]
    Open,
    #[display(fmt = "periodic")]
    Periodic,
    #[display(fmt = "periodic_nnn")]
    PeriodicNnn,
}

impl Boundary {
    /// True for either periodic variant.
    #[must_use]
    pub fn is_periodic(self) -> bool {
        matches!(self, Boundary::Periodic | Boundary::PeriodicNnn)
    }
}

impl std::str::FromStr for Boundary {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Boundary::Open),
            "periodic" => Ok(Boundary::Periodic),
            "periodic_nnn" => Ok(Boundary::PeriodicNnn),
            other => Err(invalid(format!("unknown boundary condition `{other}`"))),
        }
    }
}

/// A bidirectional map between physical labels and chain positions, both
/// 1-based on the physical side; chain positions are 0-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteMap {
    ram_to_phy: Vec<usize>,
    phy_to_ram: Vec<usize>,
}

impl SiteMap {
    /// Build the map for `length` sites under `boundary`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `length < 2`, or an odd length with either
    /// periodic variant.
    pub fn new(length: usize, boundary: Boundary) -> Result<Self> {
        if length < 2 {
            return Err(invalid(format!("chain length must be at least 2, got {length}")));
        }
        if boundary.is_periodic() && length % 2 != 0 {
            return Err(invalid(format!(
                "boundary condition {boundary} requires an even length, got {length}"
            )));
        }
        let ram_to_phy = match boundary {
            Boundary::Open => (1..=length).collect(),
            Boundary::Periodic => folded_order(length),
            Boundary::PeriodicNnn => outward_from_middle(length),
        };
        let mut phy_to_ram = vec![0; length];
        for (ram, &phy) in ram_to_phy.iter().enumerate() {
            phy_to_ram[phy - 1] = ram;
        }
        Ok(Self { ram_to_phy, phy_to_ram })
    }

    /// Number of sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ram_to_phy.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ram_to_phy.is_empty()
    }

    /// Chain position of the physical site `phy ∈ 1..=L`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the label is out of range.
    pub fn ram(&self, phy: usize) -> Result<usize> {
        if phy == 0 || phy > self.len() {
            return Err(invalid(format!(
                "physical site {phy} out of range 1..={}",
                self.len()
            )));
        }
        Ok(self.phy_to_ram[phy - 1])
    }

    /// Physical label stored at chain position `ram ∈ 0..L`.
    #[must_use]
    pub fn phy(&self, ram: usize) -> usize {
        self.ram_to_phy[ram]
    }

    /// The full chain order, physical label per chain position.
    #[must_use]
    pub fn site_order(&self) -> &[usize] {
        &self.ram_to_phy
    }
}

/// `[1, L, 2, L-1, 3, L-2, …]`.
fn folded_order(length: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(length);
    let (mut low, mut high) = (1, length);
    while low < high {
        order.push(low);
        order.push(high);
        low += 1;
        high -= 1;
    }
    if low == high {
        order.push(low);
    }
    order
}

/// Start at the two middle positions and alternate stepping leftward twice
/// and rightward once until both cursors leave `1..=L`.
fn outward_from_middle(length: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(length);
    let mut left = length / 2;
    let mut right = length / 2 + 1;
    while left >= 1 || right <= length {
        if left >= 1 {
            order.push(left);
        }
        if left >= 2 {
            order.push(left - 1);
        }
        if right <= length {
            order.push(right);
        }
        left = left.saturating_sub(2);
        right += 1;
    }
    debug_assert_eq!(order.len(), length);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn open_is_identity() {
        let map = SiteMap::new(5, Boundary::Open).unwrap();
        assert_eq!(map.site_order(), &[1, 2, 3, 4, 5]);
        assert_eq!(map.ram(1).unwrap(), 0);
        assert_eq!(map.ram(5).unwrap(), 4);
    }

    #[test]
    fn folded_order_interleaves_the_ends() {
        let map = SiteMap::new(6, Boundary::Periodic).unwrap();
        assert_eq!(map.site_order(), &[1, 6, 2, 5, 3, 4]);
        // The wrap pair (6, 1) sits at chain distance 1.
        assert_eq!(map.ram(6).unwrap().abs_diff(map.ram(1).unwrap()), 1);
    }

    #[test]
    fn outward_from_middle_order_for_eight_sites() {
        let map = SiteMap::new(8, Boundary::PeriodicNnn).unwrap();
        assert_eq!(map.site_order(), &[4, 3, 5, 2, 1, 6, 7, 8]);
    }

    #[test]
    fn periodic_rejects_odd_lengths() {
        assert!(SiteMap::new(5, Boundary::Periodic).is_err());
        assert!(SiteMap::new(7, Boundary::PeriodicNnn).is_err());
        assert!(SiteMap::new(1, Boundary::Open).is_err());
    }

    #[test]
    fn boundary_names_round_trip() {
        for bc in [Boundary::Open, Boundary::Periodic, Boundary::PeriodicNnn] {
            let parsed: Boundary = bc.to_string().parse().unwrap();
            assert_eq!(parsed, bc);
        }
        assert!("twisted".parse::<Boundary>().is_err());
    }

    proptest! {
        #[test]
        fn maps_are_mutually_inverse_permutations(length in 2usize..40, which in 0u8..3) {
            let boundary = match which {
                0 => Boundary::Open,
                1 => Boundary::Periodic,
                _ => Boundary::PeriodicNnn,
            };
            let length = if boundary.is_periodic() && length % 2 != 0 { length + 1 } else { length };
            let map = SiteMap::new(length, boundary).unwrap();

            let mut seen = vec![false; length];
            for ram in 0..length {
                let phy = map.phy(ram);
                prop_assert!((1..=length).contains(&phy));
                prop_assert!(!seen[phy - 1], "duplicate physical label {phy}");
                seen[phy - 1] = true;
                prop_assert_eq!(map.ram(phy).unwrap(), ram);
            }
        }
    }
}
