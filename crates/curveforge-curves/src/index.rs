//! Index and issuer keys used to resolve curves on a provider.
//!
//! A curve never knows what it is used for; the provider maps these keys
//! to curve names. Keys are plain value types so that configurations can
//! be serialized and compared structurally.

use curveforge_core::{Currency, DayCount, Tenor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A term deposit index such as EURIBOR 6M or USD LIBOR 3M.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IborIndex {
    /// Index name, e.g. "EURIBOR6M".
    pub name: String,
    /// Currency of the index.
    pub currency: Currency,
    /// Underlying deposit tenor.
    pub tenor: Tenor,
    /// Day count for accrual fractions.
    pub day_count: DayCount,
}

impl IborIndex {
    /// Creates an index with the conventional Act/360 day count.
    pub fn new(name: impl Into<String>, currency: Currency, tenor: Tenor) -> Self {
        Self {
            name: name.into(),
            currency,
            tenor,
            day_count: DayCount::Act360,
        }
    }
}

impl fmt::Display for IborIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An overnight index such as SOFR or ESTR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OvernightIndex {
    /// Index name, e.g. "SOFR".
    pub name: String,
    /// Currency of the index.
    pub currency: Currency,
    /// Day count for accrual fractions.
    pub day_count: DayCount,
}

impl OvernightIndex {
    /// Creates an index with the conventional Act/360 day count.
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            name: name.into(),
            currency,
            day_count: DayCount::Act360,
        }
    }
}

impl fmt::Display for OvernightIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A price index such as HICP or US CPI-U, used by inflation curves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceIndex {
    /// Index name, e.g. "US-CPI-U".
    pub name: String,
    /// Currency of the index.
    pub currency: Currency,
}

impl PriceIndex {
    /// Creates a price index.
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            name: name.into(),
            currency,
        }
    }
}

impl fmt::Display for PriceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Issuer plus legal-entity filter, keying issuer discounting curves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuerKey {
    /// Issuer short name, e.g. "UST".
    pub issuer: String,
    /// Legal-entity filter, e.g. "SENIOR".
    pub filter: String,
}

impl IssuerKey {
    /// Creates an issuer key.
    pub fn new(issuer: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            filter: filter.into(),
        }
    }
}

impl fmt::Display for IssuerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.issuer, self.filter)
    }
}

/// Key for forward-rate projection, either a term index or an overnight
/// index. Instruments carry this so the provider can pick the right
/// pseudo-discount-factor curve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForwardRateKey {
    /// Project off a term deposit index curve.
    Ibor(IborIndex),
    /// Project off an overnight index curve.
    Overnight(OvernightIndex),
}

impl ForwardRateKey {
    /// Currency of the underlying index.
    #[must_use]
    pub fn currency(&self) -> Currency {
        match self {
            Self::Ibor(index) => index.currency,
            Self::Overnight(index) => index.currency,
        }
    }
}

impl fmt::Display for ForwardRateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ibor(index) => write!(f, "{index}"),
            Self::Overnight(index) => write!(f, "{index}"),
        }
    }
}
