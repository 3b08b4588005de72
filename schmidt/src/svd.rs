//! Truncated singular value decompositions for bond compression.
//!
//! Truncation follows the usual discarded-weight rule: singular values are
//! dropped from the tail while the discarded squared weight stays below
//! `cutoff` times the total squared weight, and the kept rank never exceeds
//! `max_bond`. At least one singular value is always kept.

use ndarray::{s, Array1, Array2};
use ndarray_linalg::SVDInto;
use num_complex::Complex64;

use crate::mps::MpsError;

/// Result of a truncated SVD, `m ≈ u · diag(s) · vt`.
#[derive(Debug)]
pub struct TruncatedSvd {
    pub u: Array2<Complex64>,
    pub s: Array1<f64>,
    pub vt: Array2<Complex64>,
    pub rank: usize,
    /// Discarded squared weight relative to the total squared weight.
    pub discarded_weight: f64,
}

/// Decompose `m` and truncate the spectrum.
///
/// The singular values are *not* renormalized: truncation of a normalized
/// state loses at most `cutoff` of its squared norm, which is the standard
/// TEBD behavior. Callers that apply non-unitary operators renormalize
/// explicitly afterwards.
///
/// # Errors
///
/// Returns [`MpsError::LinalgFailure`] if the LAPACK decomposition fails.
pub fn svd_truncated(
    m: Array2<Complex64>,
    cutoff: f64,
    max_bond: usize,
) -> Result<TruncatedSvd, MpsError> {
    let (u, sigma, vt) = m
        .svd_into(true, true)
        .map_err(|e| MpsError::LinalgFailure(e.to_string()))?;
    let (Some(u), Some(vt)) = (u, vt) else {
        return Err(MpsError::LinalgFailure(
            "SVD did not return both factor matrices".into(),
        ));
    };

    let total: f64 = sigma.iter().map(|x| x * x).sum();
    let rank = truncation_rank(sigma.as_slice().unwrap_or(&[]), total, cutoff, max_bond);
    let discarded: f64 = sigma.iter().skip(rank).map(|x| x * x).sum();

    Ok(TruncatedSvd {
        u: u.slice(s![.., ..rank]).to_owned(),
        s: sigma.slice(s![..rank]).to_owned(),
        vt: vt.slice(s![..rank, ..]).to_owned(),
        rank,
        discarded_weight: if total > 0.0 { discarded / total } else { 0.0 },
    })
}

fn truncation_rank(sigma: &[f64], total: f64, cutoff: f64, max_bond: usize) -> usize {
    if sigma.is_empty() {
        return 0;
    }
    let budget = cutoff * total;
    let mut tail = 0.0;
    let mut rank = sigma.len();
    while rank > 1 {
        let next = tail + sigma[rank - 1] * sigma[rank - 1];
        if next > budget {
            break;
        }
        tail = next;
        rank -= 1;
    }
    rank.min(max_bond.max(1))
}
