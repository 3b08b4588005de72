//! Site patterns gates are applied over.
//!
//! A geometry names the physical sites one application of a gate touches.
//! Static geometries (`SingleSite`, `AdjacentPair`, `NextNearestNeighbor`)
//! carry no state. `StaircaseRight`/`StaircaseLeft` carry a mutable
//! position that moves after every application; `Pointer` carries one that
//! only moves when told to. `Bricklayer` and `AllSites` are *compound*:
//! one operation expands to one gate application per element.
//!
//! All site arithmetic is in physical labels `1..=L`; the wrap rules depend
//! only on the boundary condition passed in, never on simulation state.

use smallvec::{smallvec, SmallVec};

use crate::basis::Boundary;
use crate::error::{invalid, Result};

/// A short list of physical sites, one gate application's worth.
pub type Sites = SmallVec<[usize; 2]>;

/// Pair sublattices enumerated by [`Geometry::Bricklayer`].
///
/// `Odd`/`Even` are the usual nearest-neighbor brick layers (`Even` gains
/// the wrap pair `(L, 1)` under periodic boundaries) and `Nn` is their
/// union. The four NNN sublattices are the `i mod 4` classes of the left
/// site with pairs `(i, i+2)`, and `Nnn` is their union.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parity {
    Odd,
    Even,
    Nn,
    NnnOdd1,
    NnnOdd2,
    NnnEven1,
    NnnEven2,
    Nnn,
}

/// Mutable position of a staircase, plus the offset to its partner site.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Staircase {
    pub position: usize,
    pub stride: usize,
}

/// Where a gate lands.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// One fixed site.
    SingleSite(usize),
    /// The pair `(i, i+1)`, wrapping to `(L, 1)` under periodic boundaries.
    AdjacentPair(usize),
    /// The pair `(i, i+2)` with periodic wrap-around.
    NextNearestNeighbor(usize),
    /// Every pair of one sublattice; compound.
    Bricklayer(Parity),
    /// Every site, one at a time; compound.
    AllSites,
    /// A pair `[p, p−stride]` whose position decrements after each use.
    StaircaseLeft(Staircase),
    /// A pair `[p, p+stride]` whose position increments after each use.
    StaircaseRight(Staircase),
    /// Like `StaircaseRight` with stride 1, but only ever moved explicitly.
    Pointer(usize),
}

fn wrap(site: i64, length: usize) -> usize {
    let length = length as i64;
    ((site - 1).rem_euclid(length) + 1) as usize
}

fn check_site(site: usize, length: usize) -> Result<()> {
    if site == 0 || site > length {
        return Err(invalid(format!("site {site} out of range 1..={length}")));
    }
    Ok(())
}

impl Geometry {
    /// A stride-1 right staircase starting at `position`.
    #[must_use]
    pub fn staircase_right(position: usize) -> Self {
        Geometry::StaircaseRight(Staircase { position, stride: 1 })
    }

    /// A stride-1 left staircase starting at `position`.
    #[must_use]
    pub fn staircase_left(position: usize) -> Self {
        Geometry::StaircaseLeft(Staircase { position, stride: 1 })
    }

    /// True for geometries that expand to several gate applications.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(self, Geometry::Bricklayer(_) | Geometry::AllSites)
    }

    /// Sites of one application, reading (not moving) any mutable position.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for compound geometries, out-of-range positions,
    /// or a pair that leaves an open chain.
    pub fn sites(&self, length: usize, boundary: Boundary) -> Result<Sites> {
        match *self {
            Geometry::SingleSite(site) => {
                check_site(site, length)?;
                Ok(smallvec![site])
            }
            Geometry::AdjacentPair(site) => pair(site, 1, length, boundary),
            Geometry::NextNearestNeighbor(site) => pair(site, 2, length, boundary),
            Geometry::StaircaseRight(stair) => {
                pair(stair.position, stair.stride as i64, length, boundary)
            }
            Geometry::StaircaseLeft(stair) => {
                pair(stair.position, -(stair.stride as i64), length, boundary)
            }
            Geometry::Pointer(position) => pair(position, 1, length, boundary),
            Geometry::Bricklayer(_) | Geometry::AllSites => Err(invalid(
                "compound geometries expand to elements, not a single site list".to_string(),
            )),
        }
    }

    /// All gate applications of one operation, in enumeration order.
    ///
    /// Simple geometries yield exactly one element.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::sites`].
    pub fn elements(&self, length: usize, boundary: Boundary) -> Result<Vec<Sites>> {
        match *self {
            Geometry::Bricklayer(parity) => bricklayer_pairs(parity, length, boundary),
            Geometry::AllSites => Ok((1..=length).map(|s| smallvec![s]).collect()),
            _ => Ok(vec![self.sites(length, boundary)?]),
        }
    }

    /// Move a staircase position one step; anything else is untouched.
    pub fn advance(&mut self, length: usize, boundary: Boundary) {
        match self {
            Geometry::StaircaseRight(stair) => {
                stair.position = if boundary.is_periodic() {
                    wrap(stair.position as i64 + 1, length)
                } else {
                    // Open chains cycle the left end of the pair over 1..=L-1.
                    stair.position % (length - 1) + 1
                };
            }
            Geometry::StaircaseLeft(stair) => {
                stair.position = if boundary.is_periodic() {
                    wrap(stair.position as i64 - 1, length)
                } else if stair.position <= 2 {
                    length
                } else {
                    stair.position - 1
                };
            }
            _ => {}
        }
    }

    /// Move a pointer by `delta` steps, cycling like a right staircase.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when called on a non-pointer geometry.
    pub fn shift_pointer(&mut self, delta: i64, length: usize, boundary: Boundary) -> Result<()> {
        let Geometry::Pointer(position) = self else {
            return Err(invalid("shift_pointer requires a Pointer geometry".to_string()));
        };
        *position = if boundary.is_periodic() {
            wrap(*position as i64 + delta, length)
        } else {
            let cycle = (length - 1) as i64;
            ((*position as i64 - 1 + delta).rem_euclid(cycle) + 1) as usize
        };
        Ok(())
    }

    /// Sites of one application after `advances` advances from the recorded
    /// position, without touching any state. Used by symbolic expansion.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::sites`].
    pub fn computed_sites(
        &self,
        advances: usize,
        length: usize,
        boundary: Boundary,
    ) -> Result<Sites> {
        // Zero advances must reproduce `sites` exactly, including its
        // rejection of out-of-range starting positions.
        if advances == 0 {
            return self.sites(length, boundary);
        }
        match *self {
            Geometry::StaircaseRight(stair) => {
                let position = if boundary.is_periodic() {
                    wrap(stair.position as i64 + advances as i64, length)
                } else {
                    let cycle = (length - 1) as i64;
                    ((stair.position as i64 - 1 + advances as i64).rem_euclid(cycle) + 1) as usize
                };
                pair(position, stair.stride as i64, length, boundary)
            }
            Geometry::StaircaseLeft(stair) => {
                let position = if boundary.is_periodic() {
                    wrap(stair.position as i64 - advances as i64, length)
                } else {
                    let cycle = (length - 1) as i64;
                    ((stair.position as i64 - 2 - advances as i64).rem_euclid(cycle) + 2) as usize
                };
                pair(position, -(stair.stride as i64), length, boundary)
            }
            _ => self.sites(length, boundary),
        }
    }

    /// Check that every site this geometry can produce on its next
    /// application is in range. Recording a circuit runs this per
    /// operation.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on the first out-of-range element.
    pub fn validate(&self, length: usize, boundary: Boundary) -> Result<()> {
        self.elements(length, boundary).map(|_| ())
    }
}

fn pair(site: usize, offset: i64, length: usize, boundary: Boundary) -> Result<Sites> {
    check_site(site, length)?;
    let raw = site as i64 + offset;
    if boundary.is_periodic() {
        let partner = wrap(raw, length);
        if partner == site {
            return Err(invalid(format!(
                "pair starting at {site} wraps onto itself for length {length}"
            )));
        }
        Ok(smallvec![site, partner])
    } else {
        if raw < 1 || raw > length as i64 {
            return Err(invalid(format!(
                "pair ({site}, {raw}) out of range for an open chain of {length} sites"
            )));
        }
        Ok(smallvec![site, raw as usize])
    }
}

fn bricklayer_pairs(parity: Parity, length: usize, boundary: Boundary) -> Result<Vec<Sites>> {
    let mut pairs: Vec<Sites> = Vec::new();
    match parity {
        Parity::Odd => {
            for i in (1..length).step_by(2) {
                pairs.push(smallvec![i, i + 1]);
            }
        }
        Parity::Even => {
            for i in (2..length).step_by(2) {
                pairs.push(smallvec![i, i + 1]);
            }
            if boundary.is_periodic() {
                pairs.push(smallvec![length, 1]);
            }
        }
        Parity::Nn => {
            pairs.extend(bricklayer_pairs(Parity::Odd, length, boundary)?);
            pairs.extend(bricklayer_pairs(Parity::Even, length, boundary)?);
        }
        Parity::NnnOdd1 | Parity::NnnOdd2 | Parity::NnnEven1 | Parity::NnnEven2 => {
            let class = match parity {
                Parity::NnnOdd1 => 1,
                Parity::NnnOdd2 => 3,
                Parity::NnnEven1 => 2,
                _ => 0,
            };
            for i in 1..=length {
                if i % 4 != class {
                    continue;
                }
                if boundary.is_periodic() {
                    pairs.push(smallvec![i, wrap(i as i64 + 2, length)]);
                } else if i + 2 <= length {
                    pairs.push(smallvec![i, i + 2]);
                }
            }
        }
        Parity::Nnn => {
            for sub in [Parity::NnnOdd1, Parity::NnnOdd2, Parity::NnnEven1, Parity::NnnEven2] {
                pairs.extend(bricklayer_pairs(sub, length, boundary)?);
            }
        }
    }
    Ok(pairs)
}
