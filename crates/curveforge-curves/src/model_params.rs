//! Short-rate model parameters and their assembly from market data.
//!
//! Futures-calibrated variants need a convexity adjustment between the
//! futures rate and the forward rate; the adjustment is a closed-form
//! function of the model parameters. Parameters are assembled from
//! tenor-keyed market quotes with documented defaults substituted (and
//! logged) for anything missing.

use curveforge_core::{Date, Tenor};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::MarketDataId;
use crate::error::CurveResult;

/// Below this mean reversion the adjustment switches to its analytic
/// `a -> 0` (Ho-Lee) limit to avoid cancellation.
const MEAN_REVERSION_FLOOR: f64 = 1e-8;

/// Which model a parameter set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// One-factor Hull-White (extended Vasicek).
    HullWhiteOneFactor,
    /// Two-factor Gaussian (G2++).
    G2pp,
}

impl ModelKind {
    /// Short name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HullWhiteOneFactor => "hull-white-one-factor",
            Self::G2pp => "g2pp",
        }
    }
}

/// Parameters of some supported short-rate model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelParameters {
    /// One-factor Hull-White parameters.
    HullWhiteOneFactor(HullWhiteParameters),
    /// G2++ parameters.
    G2pp(G2Parameters),
}

impl ModelParameters {
    /// The model these parameters belong to.
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::HullWhiteOneFactor(_) => ModelKind::HullWhiteOneFactor,
            Self::G2pp(_) => ModelKind::G2pp,
        }
    }
}

/// A piecewise-constant volatility term structure.
///
/// `volatilities[i]` applies up to `times[i]`; the last volatility extends
/// to infinity, so `times` has one entry fewer than `volatilities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityTermStructure {
    /// Piecewise-constant volatility levels.
    pub volatilities: Vec<f64>,
    /// Right endpoints of the volatility pieces.
    pub times: Vec<f64>,
}

impl VolatilityTermStructure {
    /// A flat volatility.
    #[must_use]
    pub fn flat(volatility: f64) -> Self {
        Self {
            volatilities: vec![volatility],
            times: Vec::new(),
        }
    }

    /// Volatility applying at time `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> f64 {
        let i = self.times.partition_point(|&boundary| boundary < t);
        self.volatilities[i.min(self.volatilities.len() - 1)]
    }
}

/// One-factor Hull-White parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullWhiteParameters {
    /// Mean-reversion speed.
    pub mean_reversion: f64,
    /// Volatility term structure.
    pub volatility: VolatilityTermStructure,
}

impl HullWhiteParameters {
    /// Creates flat-volatility parameters.
    #[must_use]
    pub fn flat(mean_reversion: f64, volatility: f64) -> Self {
        Self {
            mean_reversion,
            volatility: VolatilityTermStructure::flat(volatility),
        }
    }

    /// Additive convexity adjustment between the futures rate and the
    /// forward rate for the period `[t1, t2]` with accrual `accrual`.
    ///
    /// Uses the volatility applying at the futures expiry. As the mean
    /// reversion goes to zero this degenerates to the Ho-Lee adjustment
    /// `sigma^2 t1 t2 / 2` scaled into rate terms.
    #[must_use]
    pub fn futures_convexity(&self, t1: f64, t2: f64, accrual: f64) -> f64 {
        let sigma = self.volatility.at(t1);
        factor_convexity(self.mean_reversion, sigma, t1, t2, accrual)
    }
}

/// G2++ (two-factor Gaussian) parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct G2Parameters {
    /// Mean-reversion speeds of the two factors.
    pub mean_reversions: (f64, f64),
    /// Volatility term structure of the first factor.
    pub first_volatility: VolatilityTermStructure,
    /// Volatility term structure of the second factor.
    pub second_volatility: VolatilityTermStructure,
    /// Instantaneous correlation between the factors.
    pub correlation: f64,
}

impl G2Parameters {
    /// Creates flat-volatility parameters.
    #[must_use]
    pub fn flat(
        mean_reversions: (f64, f64),
        volatilities: (f64, f64),
        correlation: f64,
    ) -> Self {
        Self {
            mean_reversions,
            first_volatility: VolatilityTermStructure::flat(volatilities.0),
            second_volatility: VolatilityTermStructure::flat(volatilities.1),
            correlation,
        }
    }

    /// Additive convexity adjustment between the futures rate and the
    /// forward rate for the period `[t1, t2]` with accrual `accrual`.
    ///
    /// Each factor contributes its one-factor adjustment plus a
    /// correlation cross term built from the same bond-volatility
    /// factors.
    #[must_use]
    pub fn futures_convexity(&self, t1: f64, t2: f64, accrual: f64) -> f64 {
        let (a1, a2) = self.mean_reversions;
        let s1 = self.first_volatility.at(t1);
        let s2 = self.second_volatility.at(t1);
        let own = factor_convexity(a1, s1, t1, t2, accrual)
            + factor_convexity(a2, s2, t1, t2, accrual);
        let cross = self.correlation
            * s1
            * s2
            * bond_volatility(a1, t1, t2)
            * bond_volatility(a2, t1, t2)
            * t1
            / accrual;
        own + cross
    }
}

/// `B(t1, t2) = (1 - exp(-a (t2 - t1))) / a`, with its `a -> 0` limit.
fn bond_volatility(a: f64, t1: f64, t2: f64) -> f64 {
    if a.abs() < MEAN_REVERSION_FLOOR {
        t2 - t1
    } else {
        (1.0 - (-a * (t2 - t1)).exp()) / a
    }
}

/// One-factor Gaussian futures convexity adjustment (Hull's formula).
fn factor_convexity(a: f64, sigma: f64, t1: f64, t2: f64, accrual: f64) -> f64 {
    if a.abs() < MEAN_REVERSION_FLOOR {
        // Ho-Lee limit
        return sigma * sigma * t1 * t2 / (2.0 * accrual) * (t2 - t1);
    }
    let b12 = bond_volatility(a, t1, t2);
    let b01 = bond_volatility(a, 0.0, t1);
    b12 / accrual
        * (b12 * (1.0 - (-2.0 * a * t1).exp()) + 2.0 * a * b01 * b01)
        * sigma
        * sigma
        / (4.0 * a)
}

/// Market-data identifiers for one factor's term structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorTermStructureIds {
    /// Identifier of the mean-reversion quote.
    pub mean_reversion: MarketDataId,
    /// Identifier of the initial (first-piece) volatility quote.
    pub initial_volatility: MarketDataId,
    /// Tenor-keyed identifiers of the later volatility pieces, in tenor
    /// order.
    pub volatilities: Vec<(Tenor, MarketDataId)>,
}

/// Defaults substituted for missing model-parameter quotes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameterDefaults {
    /// Default mean reversion.
    pub mean_reversion: f64,
    /// Default volatility.
    pub volatility: f64,
    /// Default factor correlation (two-factor models).
    pub correlation: f64,
}

impl Default for ModelParameterDefaults {
    fn default() -> Self {
        Self {
            mean_reversion: 0.01,
            volatility: 0.01,
            correlation: 0.0,
        }
    }
}

/// Assembles model parameters from tenor-keyed market quotes.
#[derive(Debug, Clone, Default)]
pub struct TermStructureAssembler {
    defaults: ModelParameterDefaults,
}

impl TermStructureAssembler {
    /// Creates an assembler with the given defaults.
    #[must_use]
    pub fn new(defaults: ModelParameterDefaults) -> Self {
        Self { defaults }
    }

    /// Assembles Hull-White parameters, substituting defaults (with a
    /// warning) for any quote `lookup` cannot supply.
    ///
    /// # Errors
    ///
    /// Fails only on tenor date arithmetic.
    pub fn hull_white(
        &self,
        valuation: Date,
        ids: &FactorTermStructureIds,
        lookup: &dyn Fn(&MarketDataId) -> Option<f64>,
    ) -> CurveResult<HullWhiteParameters> {
        Ok(HullWhiteParameters {
            mean_reversion: self.fetch(lookup, &ids.mean_reversion, self.defaults.mean_reversion),
            volatility: self.volatility_structure(valuation, ids, lookup)?,
        })
    }

    /// Assembles G2++ parameters from two factor term structures and a
    /// correlation quote.
    ///
    /// # Errors
    ///
    /// Fails only on tenor date arithmetic.
    pub fn g2pp(
        &self,
        valuation: Date,
        first: &FactorTermStructureIds,
        second: &FactorTermStructureIds,
        correlation: &MarketDataId,
        lookup: &dyn Fn(&MarketDataId) -> Option<f64>,
    ) -> CurveResult<G2Parameters> {
        Ok(G2Parameters {
            mean_reversions: (
                self.fetch(lookup, &first.mean_reversion, self.defaults.mean_reversion),
                self.fetch(lookup, &second.mean_reversion, self.defaults.mean_reversion),
            ),
            first_volatility: self.volatility_structure(valuation, first, lookup)?,
            second_volatility: self.volatility_structure(valuation, second, lookup)?,
            correlation: self.fetch(lookup, correlation, self.defaults.correlation),
        })
    }

    fn volatility_structure(
        &self,
        valuation: Date,
        ids: &FactorTermStructureIds,
        lookup: &dyn Fn(&MarketDataId) -> Option<f64>,
    ) -> CurveResult<VolatilityTermStructure> {
        let mut volatilities =
            vec![self.fetch(lookup, &ids.initial_volatility, self.defaults.volatility)];
        let mut times = Vec::with_capacity(ids.volatilities.len());
        for (tenor, id) in &ids.volatilities {
            times.push(valuation.year_fraction_to(tenor.advance(valuation)?));
            volatilities.push(self.fetch(lookup, id, self.defaults.volatility));
        }
        Ok(VolatilityTermStructure {
            volatilities,
            times,
        })
    }

    fn fetch(
        &self,
        lookup: &dyn Fn(&MarketDataId) -> Option<f64>,
        id: &MarketDataId,
        default: f64,
    ) -> f64 {
        match lookup(id) {
            Some(value) => value,
            None => {
                warn!(id = %id, default, "model parameter missing, using default");
                default
            }
        }
    }
}
