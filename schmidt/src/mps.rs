//! Matrix-product states in mixed-canonical form with truncated bonds.
//!
//! A state over a chain of `n` sites is stored as `n` rank-3 tensors with
//! axis signature `[left bond, physical, right bond]` and boundary bond
//! dimensions fixed to 1. One position, the orthogonality center, carries
//! the norm of the state; every tensor strictly left of it is
//! left-orthogonal and every tensor strictly right of it is
//! right-orthogonal. The center is moved with QR factorizations and local
//! operators are applied by contracting the touched range into a block,
//! multiplying the operator in, and re-splitting the block site by site
//! with truncated SVDs.
//!
//! Operators may act on non-adjacent positions; sites between the touched
//! positions pass through as identities. This is what makes folded chain
//! orderings workable: a pair of physically adjacent sites can land a small
//! distance apart on the chain without special-casing the contraction.
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use num_complex::Complex64 as C64;
//! use schmidt::{LocalOp, Mps};
//!
//! let up = array![C64::new(1.0, 0.0), C64::new(0.0, 0.0)];
//! let mut mps = Mps::product_state(&[up.clone(), up.clone(), up], 1e-12, 64).unwrap();
//!
//! // Flip the middle qubit.
//! let x = array![
//!     [C64::new(0.0, 0.0), C64::new(1.0, 0.0)],
//!     [C64::new(1.0, 0.0), C64::new(0.0, 0.0)],
//! ];
//! let op = LocalOp::new(&[1], x, mps.dims()).unwrap();
//! mps.apply_local_op(&op).unwrap();
//! assert_eq!(mps.max_bond_dim(), 1);
//! ```

use ndarray::{Array1, Array2, Array3, Axis};
use ndarray_linalg::QR;
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use smallvec::SmallVec;
use thiserror::Error;

use crate::svd::{svd_truncated, TruncatedSvd};

pub type C64 = Complex64;

#[derive(Debug, Error)]
pub enum MpsError {
    /// Returned when attempting to create a state for an empty chain.
    #[error("cannot build a state for an empty chain")]
    EmptyChain,

    /// Returned when a local state vector or operator does not match the
    /// dimensions of the sites it addresses.
    #[error("array shape does not match the addressed site dimensions")]
    IncompatibleShape,

    /// Returned when a site index lies outside the chain.
    #[error("site {site} out of bounds for a chain of {len} sites")]
    SiteOutOfBounds { site: usize, len: usize },

    /// Returned when the same site appears twice in an operator support.
    #[error("site {site} listed more than once in an operator support")]
    DuplicateSite { site: usize },

    /// A LAPACK factorization (SVD or QR) failed to converge.
    #[error("linear algebra backend failure: {0}")]
    LinalgFailure(String),
}

pub type MpsResult<T> = Result<T, MpsError>;

/// An operator over an explicit, ascending list of chain positions.
///
/// The matrix is indexed by the fused physical index of the listed sites in
/// ascending-position order, row = output, column = input. Constructing a
/// `LocalOp` from a descending or shuffled site list permutes the operator
/// legs so that the stored form is always ascending; this is how a pair
/// written `[L, 1]` by wrap-around geometry becomes a well-formed operator
/// on positions `{ram(1), ram(L)}`.
#[derive(Clone, Debug)]
pub struct LocalOp {
    sites: SmallVec<[usize; 2]>,
    matrix: Array2<C64>,
}

impl LocalOp {
    /// Build an operator over `sites` (chain positions, any order) with the
    /// matrix given in the same site order. `dims` is the full list of
    /// physical dimensions of the chain the operator targets.
    ///
    /// # Errors
    ///
    /// Fails if a site is out of bounds or repeated, or if the matrix is
    /// not square with dimension equal to the product of the listed site
    /// dimensions.
    pub fn new(sites: &[usize], matrix: Array2<C64>, dims: &[usize]) -> MpsResult<Self> {
        if sites.is_empty() {
            return Err(MpsError::IncompatibleShape);
        }
        for (i, &s) in sites.iter().enumerate() {
            if s >= dims.len() {
                return Err(MpsError::SiteOutOfBounds { site: s, len: dims.len() });
            }
            if sites[..i].contains(&s) {
                return Err(MpsError::DuplicateSite { site: s });
            }
        }
        let given_dims: SmallVec<[usize; 2]> = sites.iter().map(|&s| dims[s]).collect();
        let fused: usize = given_dims.iter().product();
        if matrix.nrows() != fused || matrix.ncols() != fused {
            return Err(MpsError::IncompatibleShape);
        }

        // Sort the support; permute the operator legs when the order moves.
        let mut order: SmallVec<[usize; 2]> = (0..sites.len()).collect();
        order.sort_by_key(|&i| sites[i]);
        let sorted: SmallVec<[usize; 2]> = order.iter().map(|&i| sites[i]).collect();
        let matrix = if order.iter().enumerate().all(|(i, &o)| i == o) {
            matrix
        } else {
            permute_legs(&matrix, &given_dims, &order)
        };
        Ok(Self { sites: sorted, matrix })
    }

    /// Ascending chain positions the operator acts on.
    #[must_use]
    pub fn sites(&self) -> &[usize] {
        &self.sites
    }

    /// The operator matrix over the fused physical index, ascending order.
    #[must_use]
    pub fn matrix(&self) -> &Array2<C64> {
        &self.matrix
    }
}

/// Reorder the fused legs of `matrix` so that site `order[j]` of the
/// original ordering becomes site `j` of the result.
fn permute_legs(matrix: &Array2<C64>, dims: &[usize], order: &[usize]) -> Array2<C64> {
    let fused = matrix.nrows();
    let new_dims: SmallVec<[usize; 4]> = order.iter().map(|&i| dims[i]).collect();
    let mut out = Array2::zeros((fused, fused));
    for col in 0..fused {
        let cparts = split_index(col, dims);
        let newc = fuse_index(&order.iter().map(|&i| cparts[i]).collect::<SmallVec<[usize; 4]>>(), &new_dims);
        for row in 0..fused {
            let rparts = split_index(row, dims);
            let newr = fuse_index(&order.iter().map(|&i| rparts[i]).collect::<SmallVec<[usize; 4]>>(), &new_dims);
            out[[newr, newc]] = matrix[[row, col]];
        }
    }
    out
}

fn split_index(mut index: usize, dims: &[usize]) -> SmallVec<[usize; 4]> {
    let mut parts: SmallVec<[usize; 4]> = smallvec::smallvec![0; dims.len()];
    for j in (0..dims.len()).rev() {
        parts[j] = index % dims[j];
        index /= dims[j];
    }
    parts
}

fn fuse_index(parts: &[usize], dims: &[usize]) -> usize {
    parts.iter().zip(dims).fold(0, |acc, (&p, &d)| acc * d + p)
}

fn dagger(m: &Array2<C64>) -> Array2<C64> {
    let mut out = Array2::zeros((m.ncols(), m.nrows()));
    for ((i, j), v) in m.indexed_iter() {
        out[[j, i]] = v.conj();
    }
    out
}

/// A matrix-product state with a tracked orthogonality center.
#[derive(Clone, Debug)]
pub struct Mps {
    tensors: Vec<Array3<C64>>,
    dims: Vec<usize>,
    center: usize,
    cutoff: f64,
    max_bond: usize,
}

impl Mps {
    /// Build a separable product state from one local state vector per site.
    ///
    /// Each vector is normalized on the way in. The orthogonality center
    /// starts at position 0.
    ///
    /// # Errors
    ///
    /// Fails on an empty chain or on a zero-norm local vector.
    pub fn product_state(
        local_states: &[Array1<C64>],
        cutoff: f64,
        max_bond: usize,
    ) -> MpsResult<Self> {
        if local_states.is_empty() {
            return Err(MpsError::EmptyChain);
        }
        let mut tensors = Vec::with_capacity(local_states.len());
        let mut dims = Vec::with_capacity(local_states.len());
        for state in local_states {
            let d = state.len();
            if d == 0 {
                return Err(MpsError::IncompatibleShape);
            }
            let norm = state.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
            if norm == 0.0 {
                return Err(MpsError::IncompatibleShape);
            }
            let mut t: Array3<C64> = Array3::zeros((1, d, 1));
            for (k, a) in state.iter().enumerate() {
                t[[0, k, 0]] = a / C64::new(norm, 0.0);
            }
            tensors.push(t);
            dims.push(d);
        }
        Ok(Self { tensors, dims, center: 0, cutoff, max_bond })
    }

    /// Build a random state with entries drawn from the standard complex
    /// Gaussian, then gauge to position 0 and normalize.
    ///
    /// Bond dimensions grow from the chain ends as `min(bond_dim, d^k)`.
    ///
    /// # Errors
    ///
    /// Fails on an empty chain, a zero `bond_dim`, or a backend failure
    /// while gauging.
    pub fn random<R: Rng + ?Sized>(
        dims: &[usize],
        bond_dim: usize,
        cutoff: f64,
        max_bond: usize,
        rng: &mut R,
    ) -> MpsResult<Self> {
        if dims.is_empty() {
            return Err(MpsError::EmptyChain);
        }
        if bond_dim == 0 || dims.iter().any(|&d| d == 0) {
            return Err(MpsError::IncompatibleShape);
        }
        let n = dims.len();
        let bond = |k: usize| -> usize {
            // Bond between positions k and k + 1, capped by what either
            // side of the cut can support.
            let mut left = 1usize;
            for &d in &dims[..=k] {
                left = left.saturating_mul(d);
                if left >= bond_dim {
                    return bond_dim;
                }
            }
            let mut right = 1usize;
            for &d in &dims[k + 1..] {
                right = right.saturating_mul(d);
                if right >= left {
                    return left.min(bond_dim);
                }
            }
            left.min(right).min(bond_dim)
        };
        let mut tensors = Vec::with_capacity(n);
        for k in 0..n {
            let bl = if k == 0 { 1 } else { bond(k - 1) };
            let br = if k == n - 1 { 1 } else { bond(k) };
            let mut t = Array3::zeros((bl, dims[k], br));
            for v in t.iter_mut() {
                let re: f64 = rng.sample(StandardNormal);
                let im: f64 = rng.sample(StandardNormal);
                *v = C64::new(re, im);
            }
            tensors.push(t);
        }
        let mut mps = Self { tensors, dims: dims.to_vec(), center: n - 1, cutoff, max_bond };
        mps.orthogonalize(0)?;
        mps.normalize();
        Ok(mps)
    }

    /// Number of sites in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Physical dimensions, one per chain position.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Current orthogonality center.
    #[must_use]
    pub fn center(&self) -> usize {
        self.center
    }

    /// Bond dimensions of the `len - 1` internal links.
    #[must_use]
    pub fn bond_dims(&self) -> Vec<usize> {
        self.tensors[..self.len() - 1]
            .iter()
            .map(|t| t.shape()[2])
            .collect()
    }

    /// Largest internal link dimension (1 for a single-site chain).
    #[must_use]
    pub fn max_bond_dim(&self) -> usize {
        self.bond_dims().into_iter().max().unwrap_or(1)
    }

    /// Tensor at chain position `k`.
    ///
    /// # Errors
    ///
    /// Fails if `k` is out of bounds.
    pub fn tensor(&self, k: usize) -> MpsResult<&Array3<C64>> {
        self.tensors
            .get(k)
            .ok_or(MpsError::SiteOutOfBounds { site: k, len: self.len() })
    }

    /// Move the orthogonality center to position `k` by QR sweeps.
    ///
    /// # Errors
    ///
    /// Fails if `k` is out of bounds or a QR factorization fails.
    pub fn orthogonalize(&mut self, k: usize) -> MpsResult<()> {
        if k >= self.len() {
            return Err(MpsError::SiteOutOfBounds { site: k, len: self.len() });
        }
        while self.center < k {
            self.shift_center_right()?;
        }
        while self.center > k {
            self.shift_center_left()?;
        }
        Ok(())
    }

    fn shift_center_right(&mut self) -> MpsResult<()> {
        let pos = self.center;
        let t = std::mem::replace(&mut self.tensors[pos], Array3::zeros((0, 0, 0)));
        let (bl, d, br) = (t.shape()[0], t.shape()[1], t.shape()[2]);
        let m = reshape2(t, bl * d, br);
        let (q, r) = m.qr().map_err(|e| MpsError::LinalgFailure(e.to_string()))?;
        let rank = q.ncols();
        self.tensors[pos] = reshape3(q, bl, d, rank);

        let next = std::mem::replace(&mut self.tensors[pos + 1], Array3::zeros((0, 0, 0)));
        let (nbl, nd, nbr) = (next.shape()[0], next.shape()[1], next.shape()[2]);
        let merged = r.dot(&reshape2(next, nbl, nd * nbr));
        self.tensors[pos + 1] = reshape3(merged, rank, nd, nbr);
        self.center = pos + 1;
        Ok(())
    }

    fn shift_center_left(&mut self) -> MpsResult<()> {
        let pos = self.center;
        let t = std::mem::replace(&mut self.tensors[pos], Array3::zeros((0, 0, 0)));
        let (bl, d, br) = (t.shape()[0], t.shape()[1], t.shape()[2]);
        let m = reshape2(t, bl, d * br);
        // m = Lᴴ·Qᴴ with mᴴ = Q·L, so the right factor keeps orthonormal rows.
        let (q, l) = dagger(&m)
            .qr()
            .map_err(|e| MpsError::LinalgFailure(e.to_string()))?;
        let rank = q.ncols();
        self.tensors[pos] = reshape3(dagger(&q), rank, d, br);

        let prev = std::mem::replace(&mut self.tensors[pos - 1], Array3::zeros((0, 0, 0)));
        let (pbl, pd, pbr) = (prev.shape()[0], prev.shape()[1], prev.shape()[2]);
        let merged = reshape2(prev, pbl * pd, pbr).dot(&dagger(&l));
        self.tensors[pos - 1] = reshape3(merged, pbl, pd, rank);
        self.center = pos - 1;
        Ok(())
    }

    /// Norm of the state, read off the center tensor.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.tensors[self.center]
            .iter()
            .map(|a| a.norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    /// Rescale to unit norm; returns the norm the state had before.
    ///
    /// A zero-norm state is left untouched (the caller decides whether that
    /// is a numerical failure).
    pub fn normalize(&mut self) -> f64 {
        let norm = self.norm();
        if norm > 0.0 {
            let f = C64::new(1.0 / norm, 0.0);
            self.tensors[self.center].mapv_inplace(|a| a * f);
        }
        norm
    }

    /// Apply a local operator, truncating the rebuilt bonds.
    ///
    /// Gauges to the leftmost touched position, contracts the touched range
    /// (gap sites pass through as identities), multiplies the operator in,
    /// and re-splits left-to-right with truncated SVDs. The orthogonality
    /// center ends at the rightmost touched position.
    ///
    /// # Errors
    ///
    /// Fails if the operator does not fit this chain or a factorization
    /// fails.
    pub fn apply_local_op(&mut self, op: &LocalOp) -> MpsResult<()> {
        let sites = op.sites();
        for &s in sites {
            if s >= self.len() {
                return Err(MpsError::SiteOutOfBounds { site: s, len: self.len() });
            }
        }
        let fused: usize = sites.iter().map(|&s| self.dims[s]).product();
        if op.matrix().nrows() != fused {
            return Err(MpsError::IncompatibleShape);
        }

        let first = sites[0];
        let last = *sites.last().unwrap_or(&first);
        self.orthogonalize(first)?;

        if sites.len() == 1 {
            let t = std::mem::replace(&mut self.tensors[first], Array3::zeros((0, 0, 0)));
            self.tensors[first] = contract_site(t, op.matrix());
            return Ok(());
        }

        // Merge tensors over the whole span into one block.
        let span_dims: Vec<usize> = (first..=last).map(|k| self.dims[k]).collect();
        let mut block = std::mem::replace(&mut self.tensors[first], Array3::zeros((0, 0, 0)));
        for k in first + 1..=last {
            let (bl, dcur, mid) = (block.shape()[0], block.shape()[1], block.shape()[2]);
            let t = std::mem::replace(&mut self.tensors[k], Array3::zeros((0, 0, 0)));
            let (tbl, td, tbr) = (t.shape()[0], t.shape()[1], t.shape()[2]);
            debug_assert_eq!(mid, tbl);
            let merged = reshape2(block, bl * dcur, mid).dot(&reshape2(t, tbl, td * tbr));
            block = reshape3(merged, bl, dcur * td, tbr);
        }

        let lifted = lift_over_span(op, first, &span_dims);
        let (bl, dspan, br) = (block.shape()[0], block.shape()[1], block.shape()[2]);
        let moved = to_standard(block.permuted_axes([1, 0, 2]));
        let applied = lifted.dot(&reshape2(moved, dspan, bl * br));
        let block = to_standard(reshape3(applied, dspan, bl, br).permuted_axes([1, 0, 2]));

        // Re-split the block one site at a time.
        let mut cur = block;
        let mut left_bond = bl;
        for (j, k) in (first..last).enumerate() {
            let dk = span_dims[j];
            let rest: usize = span_dims[j + 1..].iter().product();
            let m = reshape2(cur, left_bond * dk, rest * br);
            let TruncatedSvd { u, s, mut vt, rank, .. } =
                svd_truncated(m, self.cutoff, self.max_bond)?;
            self.tensors[k] = reshape3(u, left_bond, dk, rank);
            for (i, mut row) in vt.outer_iter_mut().enumerate() {
                let f = C64::new(s[i], 0.0);
                row.mapv_inplace(|x| x * f);
            }
            cur = reshape3(vt, rank, rest, br);
            left_bond = rank;
        }
        self.tensors[last] = cur;
        self.center = last;
        Ok(())
    }

    /// Expectation value of a product of single-site operators,
    /// `⟨ψ| Π O_k |ψ⟩`, contracted with transfer matrices.
    ///
    /// Sites must be distinct; any chain position without an operator
    /// passes through as identity. The state is not assumed normalized.
    ///
    /// # Errors
    ///
    /// Fails on out-of-bounds or duplicated sites, or an operator whose
    /// dimension does not match its site.
    pub fn expect_product(&self, ops: &[(usize, &Array2<C64>)]) -> MpsResult<C64> {
        for (i, &(s, m)) in ops.iter().enumerate() {
            if s >= self.len() {
                return Err(MpsError::SiteOutOfBounds { site: s, len: self.len() });
            }
            if ops[..i].iter().any(|&(t, _)| t == s) {
                return Err(MpsError::DuplicateSite { site: s });
            }
            if m.nrows() != self.dims[s] || m.ncols() != self.dims[s] {
                return Err(MpsError::IncompatibleShape);
            }
        }
        let mut env: Array2<C64> = Array2::ones((1, 1));
        for (k, t) in self.tensors.iter().enumerate() {
            let op = ops.iter().find(|&&(s, _)| s == k).map(|&(_, m)| m);
            env = transfer(&env, t, op);
        }
        Ok(env[[0, 0]])
    }

    /// `⟨ψ|P|ψ⟩` for a single-site operator, as a real probability.
    ///
    /// Tiny negative round-off is clamped to zero.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::expect_product`].
    pub fn site_probability(&self, site: usize, projector: &Array2<C64>) -> MpsResult<f64> {
        let v = self.expect_product(&[(site, projector)])?;
        Ok(v.re.max(0.0))
    }

    /// Von Neumann entropy across the link between positions `bond` and
    /// `bond + 1`, in nats.
    ///
    /// Works on an internal copy, so the state (and its center) are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Fails if `bond + 1` is out of bounds or a factorization fails.
    pub fn entanglement_entropy(&self, bond: usize) -> MpsResult<f64> {
        if bond + 1 >= self.len() {
            return Err(MpsError::SiteOutOfBounds { site: bond + 1, len: self.len() });
        }
        let mut copy = self.clone();
        copy.orthogonalize(bond)?;
        let t = std::mem::replace(&mut copy.tensors[bond], Array3::zeros((0, 0, 0)));
        let (bl, d, br) = (t.shape()[0], t.shape()[1], t.shape()[2]);
        let svd = svd_truncated(reshape2(t, bl * d, br), 0.0, usize::MAX)?;
        let total: f64 = svd.s.iter().map(|x| x * x).sum();
        if total <= 0.0 {
            return Ok(0.0);
        }
        let mut entropy = 0.0;
        for &sv in svd.s.iter() {
            let p = sv * sv / total;
            if p > 1e-15 {
                entropy -= p * p.ln();
            }
        }
        Ok(entropy)
    }

    /// Contract the chain into a dense state vector, fused with position 0
    /// as the most significant index. Exponential in the chain length; for
    /// tests and small systems.
    #[must_use]
    pub fn to_statevector(&self) -> Array1<C64> {
        let first = &self.tensors[0];
        let (d0, b1) = (first.shape()[1], first.shape()[2]);
        let mut acc = reshape2(first.clone(), d0, b1);
        for t in &self.tensors[1..] {
            let (bl, d, br) = (t.shape()[0], t.shape()[1], t.shape()[2]);
            let rows = acc.nrows();
            let merged = acc.dot(&reshape2(t.clone(), bl, d * br));
            acc = reshape2(reshape3(merged, rows, d, br), rows * d, br);
        }
        let len = acc.nrows();
        reshape2(acc, 1, len).row(0).to_owned()
    }
}

/// Contract a single-site operator into one tensor: `t'[b,s,b'] = Σ op[s,s''] t[b,s'',b']`.
fn contract_site(t: Array3<C64>, op: &Array2<C64>) -> Array3<C64> {
    let (bl, d, br) = (t.shape()[0], t.shape()[1], t.shape()[2]);
    let moved = reshape2(to_standard(t.permuted_axes([1, 0, 2])), d, bl * br);
    let applied = op.dot(&moved);
    to_standard(reshape3(applied, d, bl, br).permuted_axes([1, 0, 2]))
}

/// One transfer-matrix step: `env' = Σ_{s',s} op[s',s] · B_{s'}ᴴ · env · B_s`
/// (identity when `op` is `None`).
fn transfer(env: &Array2<C64>, t: &Array3<C64>, op: Option<&Array2<C64>>) -> Array2<C64> {
    let d = t.shape()[1];
    let br = t.shape()[2];
    let mut out: Array2<C64> = Array2::zeros((br, br));
    match op {
        None => {
            for s in 0..d {
                let b = t.index_axis(Axis(1), s);
                let bdag = dagger(&b.to_owned());
                out = out + bdag.dot(env).dot(&b);
            }
        }
        Some(op) => {
            for sp in 0..d {
                let bp = t.index_axis(Axis(1), sp).to_owned();
                let bdag = dagger(&bp);
                let left = bdag.dot(env);
                for s in 0..d {
                    let w = op[[sp, s]];
                    if w == C64::new(0.0, 0.0) {
                        continue;
                    }
                    let b = t.index_axis(Axis(1), s);
                    out = out + left.dot(&b).mapv(|x| x * w);
                }
            }
        }
    }
    out
}

/// Lift an operator over a contiguous span, filling gap sites with
/// identities. `first` is the chain position of the span's left edge.
fn lift_over_span(op: &LocalOp, first: usize, span_dims: &[usize]) -> Array2<C64> {
    let offsets: SmallVec<[usize; 2]> = op.sites().iter().map(|&s| s - first).collect();
    if offsets.len() == span_dims.len() {
        return op.matrix().clone();
    }
    let listed_dims: SmallVec<[usize; 2]> = offsets.iter().map(|&o| span_dims[o]).collect();
    let fused_span: usize = span_dims.iter().product();
    let fused_op: usize = listed_dims.iter().product();
    let mut out = Array2::zeros((fused_span, fused_span));
    for col in 0..fused_span {
        let cparts = split_index(col, span_dims);
        let listed_col: SmallVec<[usize; 4]> = offsets.iter().map(|&o| cparts[o]).collect();
        let opcol = fuse_index(&listed_col, &listed_dims);
        for oprow in 0..fused_op {
            let listed_row = split_index(oprow, &listed_dims);
            let mut rparts = cparts.clone();
            for (t, &o) in offsets.iter().enumerate() {
                rparts[o] = listed_row[t];
            }
            let row = fuse_index(&rparts, span_dims);
            out[[row, col]] = op.matrix()[[oprow, opcol]];
        }
    }
    out
}

fn reshape2<D: ndarray::Dimension>(a: ndarray::Array<C64, D>, rows: usize, cols: usize) -> Array2<C64> {
    debug_assert_eq!(a.len(), rows * cols);
    to_standard(a)
        .into_shape((rows, cols))
        .unwrap_or_else(|_| unreachable!("element count checked"))
}

fn reshape3<D: ndarray::Dimension>(a: ndarray::Array<C64, D>, x: usize, y: usize, z: usize) -> Array3<C64> {
    debug_assert_eq!(a.len(), x * y * z);
    to_standard(a)
        .into_shape((x, y, z))
        .unwrap_or_else(|_| unreachable!("element count checked"))
}

fn to_standard<D: ndarray::Dimension>(a: ndarray::Array<C64, D>) -> ndarray::Array<C64, D> {
    if a.is_standard_layout() {
        a
    } else {
        a.as_standard_layout().to_owned()
    }
}
