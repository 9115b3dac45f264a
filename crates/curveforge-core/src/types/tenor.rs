//! Tenor (period) type used by curve node descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// A period offset expressed in days, months or years.
///
/// Tenors identify the maturity of curve calibration instruments and key
/// the term structures of model parameters ("1Y volatility", "5Y node").
///
/// # Example
///
/// ```rust
/// use curveforge_core::types::Tenor;
///
/// let five_years: Tenor = "5Y".parse().unwrap();
/// assert_eq!(five_years, Tenor::years(5));
/// assert_eq!(five_years.to_string(), "5Y");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tenor {
    /// A number of calendar days.
    Days(u32),
    /// A number of whole months.
    Months(u32),
    /// A number of whole years.
    Years(u32),
}

impl Tenor {
    /// A zero-length tenor (spot).
    pub const ZERO: Tenor = Tenor::Days(0);

    /// Creates a tenor of `n` days.
    #[must_use]
    pub fn days(n: u32) -> Self {
        Tenor::Days(n)
    }

    /// Creates a tenor of `n` months.
    #[must_use]
    pub fn months(n: u32) -> Self {
        Tenor::Months(n)
    }

    /// Creates a tenor of `n` years.
    #[must_use]
    pub fn years(n: u32) -> Self {
        Tenor::Years(n)
    }

    /// Returns the date obtained by advancing `date` by this tenor.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is out of range.
    pub fn advance(&self, date: Date) -> CoreResult<Date> {
        match self {
            Tenor::Days(n) => Ok(date.add_days(i64::from(*n))),
            Tenor::Months(n) => date.add_months(*n as i32),
            Tenor::Years(n) => date.add_years(*n as i32),
        }
    }

    /// Approximate length in years, used for ordering and initial guesses.
    #[must_use]
    pub fn approx_years(&self) -> f64 {
        match self {
            Tenor::Days(n) => f64::from(*n) / 365.0,
            Tenor::Months(n) => f64::from(*n) / 12.0,
            Tenor::Years(n) => f64::from(*n),
        }
    }

    /// Whether the tenor has zero length.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Tenor::Days(0) | Tenor::Months(0) | Tenor::Years(0))
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tenor::Days(n) => write!(f, "{n}D"),
            Tenor::Months(n) => write!(f, "{n}M"),
            Tenor::Years(n) => write!(f, "{n}Y"),
        }
    }
}

impl FromStr for Tenor {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let s = s.trim();
        if s.len() < 2 {
            return Err(CoreError::invalid_tenor(s));
        }
        let (num, unit) = s.split_at(s.len() - 1);
        let n: u32 = num.parse().map_err(|_| CoreError::invalid_tenor(s))?;
        match unit {
            "D" | "d" => Ok(Tenor::Days(n)),
            "W" | "w" => Ok(Tenor::Days(n * 7)),
            "M" | "m" => Ok(Tenor::Months(n)),
            "Y" | "y" => Ok(Tenor::Years(n)),
            _ => Err(CoreError::invalid_tenor(s)),
        }
    }
}
