//! Truncated matrix-product states for one-dimensional quantum chains.
//!
//! `schmidt` is the numerical core under the `bornverse` monitored-circuit
//! simulator. It knows nothing about circuits, geometries or random-number
//! policy; it provides:
//!
//! - [`Mps`]: a chain of rank-3 tensors in mixed-canonical form, with QR
//!   gauging, truncated-SVD bond compression, expectation values of
//!   operator products, entanglement entropy and dense-vector extraction.
//! - [`LocalOp`]: an operator over an explicit (possibly gapped) list of
//!   chain positions, with automatic leg reordering for shuffled supports.
//! - [`spin`]: the spin-1 operator algebra, including the two-site
//!   total-spin sector projectors.
//! - [`svd`]: the truncated decomposition shared by everything above.
//!
//! Functions that need randomness (only [`Mps::random`]) take
//! `&mut impl Rng`; the caller owns seeding and stream discipline.
//!
//! # Quick start
//!
//! ```
//! use ndarray::array;
//! use num_complex::Complex64 as C64;
//! use schmidt::{LocalOp, Mps};
//!
//! let zero = array![C64::new(1.0, 0.0), C64::new(0.0, 0.0)];
//! let one = array![C64::new(0.0, 0.0), C64::new(1.0, 0.0)];
//! let mps = Mps::product_state(&[zero, one], 1e-10, 100).unwrap();
//!
//! let z = array![
//!     [C64::new(1.0, 0.0), C64::new(0.0, 0.0)],
//!     [C64::new(0.0, 0.0), C64::new(-1.0, 0.0)],
//! ];
//! let zz = mps.expect_product(&[(0, &z), (1, &z)]).unwrap();
//! assert!((zz.re + 1.0).abs() < 1e-12);
//! ```

pub mod mps;
pub mod spin;
pub mod svd;

pub use mps::{LocalOp, Mps, MpsError, MpsResult, C64};
pub use svd::{svd_truncated, TruncatedSvd};
