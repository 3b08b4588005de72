//! Sector projectors acting on spin-1 chains.

use ndarray::Array1;
use num_complex::Complex64 as C64;
use schmidt::{spin, LocalOp, Mps};

fn spin_site(level: usize) -> Array1<C64> {
    let mut v = Array1::zeros(spin::DIM);
    v[level] = C64::new(1.0, 0.0);
    v
}

/// Probability of finding two neighboring sites in sector `j`, evaluated by
/// trial projection on a copy.
fn sector_probability(mps: &Mps, left: usize, j: u8) -> f64 {
    let mut copy = mps.clone();
    let op = LocalOp::new(&[left, left + 1], spin::sector_projector(j), copy.dims()).unwrap();
    copy.apply_local_op(&op).unwrap();
    let norm = copy.norm();
    norm * norm
}

#[test]
fn z0_pair_splits_one_third_two_thirds() {
    // |0,0⟩ of two spin-1 sites: ⟨P₀⟩ = 1/3, ⟨P₁⟩ = 0, ⟨P₂⟩ = 2/3.
    let mps = Mps::product_state(&[spin_site(1), spin_site(1)], 1e-12, 64).unwrap();
    let p0 = sector_probability(&mps, 0, 0);
    let p1 = sector_probability(&mps, 0, 1);
    let p2 = sector_probability(&mps, 0, 2);
    assert!((p0 - 1.0 / 3.0).abs() < 1e-10);
    assert!(p1.abs() < 1e-10);
    assert!((p2 - 2.0 / 3.0).abs() < 1e-10);
    assert!((p0 + p1 + p2 - 1.0).abs() < 1e-10);
}

#[test]
fn stretched_pair_is_pure_sector_two() {
    // |+1,+1⟩ is the stretched state, entirely in J = 2.
    let mps = Mps::product_state(&[spin_site(0), spin_site(0)], 1e-12, 64).unwrap();
    assert!((sector_probability(&mps, 0, 2) - 1.0).abs() < 1e-10);
    assert!(sector_probability(&mps, 0, 0).abs() < 1e-10);
    assert!(sector_probability(&mps, 0, 1).abs() < 1e-10);
}

#[test]
fn sector_probabilities_sum_to_one_on_entangled_states() {
    let mut mps =
        Mps::product_state(&[spin_site(1), spin_site(1), spin_site(1)], 1e-12, 64).unwrap();
    // Entangle the first pair by projecting out the J = 2 sector.
    let p01 = spin::sector_projector(0) + spin::sector_projector(1);
    let op = LocalOp::new(&[0, 1], p01, mps.dims()).unwrap();
    mps.apply_local_op(&op).unwrap();
    mps.normalize();

    let total: f64 = (0..=2).map(|j| sector_probability(&mps, 1, j)).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn string_phase_expectation_on_polarized_chain() {
    // exp(iπSz) is −1 on |±1⟩ and +1 on |0⟩.
    let mps =
        Mps::product_state(&[spin_site(0), spin_site(1), spin_site(2)], 1e-12, 64).unwrap();
    let phase = spin::string_phase();
    let value = mps
        .expect_product(&[(0, &phase), (1, &phase), (2, &phase)])
        .unwrap();
    assert!((value.re - 1.0).abs() < 1e-12);
}
