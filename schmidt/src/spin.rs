//! Spin-1 operator algebra.
//!
//! Local operators in the `{|+1⟩, |0⟩, |−1⟩}` basis, plus the two-site
//! total-spin sector projectors used by sector projections and sector
//! measurements. The projectors come from the polynomial identity
//!
//! `P_J = Π_{K≠J} (S² − K(K+1)) / (J(J+1) − K(K+1))`
//!
//! with `S² = (S₁ + S₂)²` on the 9-dimensional two-site space, which keeps
//! them exact to round-off without tabulating Clebsch-Gordan coefficients.

use ndarray::{array, linalg::kron, Array1, Array2};
use num_complex::Complex64 as C64;

/// Local Hilbert-space dimension of a spin-1 site.
pub const DIM: usize = 3;

/// Total-spin sectors of two coupled spin-1 sites.
pub const SECTORS: [u8; 3] = [0, 1, 2];

fn c(re: f64) -> C64 {
    C64::new(re, 0.0)
}

fn scaled_identity(n: usize, value: C64) -> Array2<C64> {
    Array2::from_diag(&Array1::from_elem(n, value))
}

/// `Sz` in the `{|+1⟩, |0⟩, |−1⟩}` basis.
#[must_use]
pub fn sz() -> Array2<C64> {
    array![
        [c(1.0), c(0.0), c(0.0)],
        [c(0.0), c(0.0), c(0.0)],
        [c(0.0), c(0.0), c(-1.0)],
    ]
}

/// Raising operator `S⁺`.
#[must_use]
pub fn sp() -> Array2<C64> {
    let r = 2.0_f64.sqrt();
    array![
        [c(0.0), c(r), c(0.0)],
        [c(0.0), c(0.0), c(r)],
        [c(0.0), c(0.0), c(0.0)],
    ]
}

/// Lowering operator `S⁻`.
#[must_use]
pub fn sm() -> Array2<C64> {
    let r = 2.0_f64.sqrt();
    array![
        [c(0.0), c(0.0), c(0.0)],
        [c(r), c(0.0), c(0.0)],
        [c(0.0), c(r), c(0.0)],
    ]
}

/// `exp(iπ Sz) = diag(−1, 1, −1)`, the string-order phase factor.
#[must_use]
pub fn string_phase() -> Array2<C64> {
    array![
        [c(-1.0), c(0.0), c(0.0)],
        [c(0.0), c(1.0), c(0.0)],
        [c(0.0), c(0.0), c(-1.0)],
    ]
}

/// Two-site total-spin squared, `(S₁ + S₂)² = 4·I + 2·S₁·S₂`.
#[must_use]
pub fn total_spin_squared() -> Array2<C64> {
    let heisenberg = kron(&sz(), &sz())
        + (kron(&sp(), &sm()) + kron(&sm(), &sp())).mapv(|x| x * c(0.5));
    scaled_identity(DIM * DIM, c(4.0)) + heisenberg.mapv(|x| x * c(2.0))
}

/// Projector onto the total-spin sector `J ∈ {0, 1, 2}` of two spin-1
/// sites (a 9×9 matrix with trace `2J + 1`).
///
/// # Panics
///
/// Panics if `sector > 2`.
#[must_use]
pub fn sector_projector(sector: u8) -> Array2<C64> {
    assert!(sector <= 2, "two spin-1 sites couple to J in 0..=2, got {sector}");
    let s2 = total_spin_squared();
    let eigenvalue = |j: u8| f64::from(j) * (f64::from(j) + 1.0);
    let mut proj = scaled_identity(DIM * DIM, c(1.0));
    for other in SECTORS {
        if other == sector {
            continue;
        }
        let shifted = &s2 - &scaled_identity(DIM * DIM, c(eigenvalue(other)));
        let scale = 1.0 / (eigenvalue(sector) - eigenvalue(other));
        proj = proj.dot(&shifted.mapv(|x| x * c(scale)));
    }
    proj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Array2<C64>, b: &Array2<C64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).norm() < 1e-12, "matrices differ: {x} vs {y}");
        }
    }

    fn trace(m: &Array2<C64>) -> C64 {
        m.diag().sum()
    }

    #[test]
    fn commutator_of_ladder_operators_is_2sz() {
        let lhs = sp().dot(&sm()) - sm().dot(&sp());
        let rhs = sz().mapv(|x| x * c(2.0));
        assert_close(&lhs, &rhs);
    }

    #[test]
    fn sector_projector_traces_match_multiplicities() {
        for sector in SECTORS {
            let p = sector_projector(sector);
            let expected = f64::from(2 * sector + 1);
            assert!((trace(&p).re - expected).abs() < 1e-12);
            assert!(trace(&p).im.abs() < 1e-12);
        }
    }

    #[test]
    fn sector_projectors_sum_to_identity() {
        let sum = sector_projector(0) + sector_projector(1) + sector_projector(2);
        assert_close(&sum, &scaled_identity(9, c(1.0)));
    }

    #[test]
    fn sector_projectors_are_idempotent_and_orthogonal() {
        let projs: Vec<_> = SECTORS.iter().map(|&j| sector_projector(j)).collect();
        for (i, p) in projs.iter().enumerate() {
            assert_close(&p.dot(p), p);
            for (j, q) in projs.iter().enumerate() {
                if i != j {
                    let prod = p.dot(q);
                    assert!(prod.iter().all(|x| x.norm() < 1e-12));
                }
            }
        }
    }

    #[test]
    fn string_phase_is_exp_of_sz() {
        // diag(-1, 1, -1) has the eigenvalues e^{iπm} for m = +1, 0, -1.
        let p = string_phase();
        assert!((p[[0, 0]].re + 1.0).abs() < 1e-12);
        assert!((p[[1, 1]].re - 1.0).abs() < 1e-12);
        assert!((p[[2, 2]].re + 1.0).abs() < 1e-12);
    }
}
