//! # Curveforge Math
//!
//! Numerical utilities for the Curveforge multi-curve calibration engine.
//!
//! This crate provides:
//!
//! - **Interpolation**: Linear and log-linear interpolation with flat extrapolation
//! - **Root Finding**: A vector Broyden solver for joint curve calibration
//! - **Linear Algebra**: Matrix inversion and solve helpers over nalgebra
//!
//! ## Design Philosophy
//!
//! - **Numerical Stability**: LU with SVD fallback for near-singular Jacobians
//! - **No Hidden State**: All solvers are pure functions of their inputs

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::many_single_char_names)]

pub mod error;
pub mod interpolation;
pub mod linear_algebra;
pub mod roots;

pub use error::{MathError, MathResult};
pub use interpolation::{Extrapolation, Interpolation};
pub use roots::{broyden_root, RootFinderConfig, RootFinderReport, VectorFunction};
