//! # Curveforge Core
//!
//! Foundation types for the Curveforge multi-curve calibration engine.
//!
//! This crate provides:
//!
//! - **Dates**: A chrono-backed [`Date`] newtype with financial arithmetic
//! - **Tenors**: Period offsets ([`Tenor`]) used by curve node descriptors
//! - **Day Counts**: ACT/360, ACT/365F and 30/360 year fractions
//! - **Currencies**: ISO 4217 currency codes
//! - **Frequencies**: Payment frequencies for swap and bond schedules

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod daycounts;
pub mod error;
pub mod types;

pub use daycounts::DayCount;
pub use error::{CoreError, CoreResult};
pub use types::{Currency, Date, Frequency, Tenor};
