//! Inverse (deconvolution) solvers.
//!
//! Recovers latent rate profiles - growth rate or per-cell synthesis rate -
//! from their noisy integrated observations by fitting a Gaussian-basis rate
//! function through an Euler-integrated forward model with Tikhonov
//! regularization on the basis heights.

pub mod basis;
pub mod forward;
pub mod solver;

pub use basis::GaussianBasis;
pub use solver::{infer_growth_rate, infer_synthesis_rate, RateProfile};
