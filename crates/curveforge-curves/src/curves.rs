//! Calibrated curves: interpolated node points with a value convention.
//!
//! A [`CalibratedCurve`] is the atom of the multi-curve provider. It stores
//! node times (year fractions from the valuation date), node ordinates and
//! a [`CurveValueKind`] saying what the ordinates mean. Discount factors
//! are derived from the ordinates on demand, so the same curve shape can
//! be parameterized as zero rates, discount factors or periodically
//! compounded rates without the consumers caring.

use curveforge_math::{Extrapolation, Interpolation};
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// What a curve's node ordinates represent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CurveValueKind {
    /// Continuously compounded zero rates; `df(t) = exp(-r t)`.
    ZeroRate,
    /// Discount factors stored directly.
    DiscountFactor,
    /// Periodically compounded rates; `df(t) = (1 + r/m)^(-m t)`.
    PeriodicRate {
        /// Compounding periods per year (`m`).
        periods_per_year: u32,
    },
    /// Price-index levels (inflation curves). No discount factors.
    PriceIndex,
}

impl CurveValueKind {
    /// Short name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ZeroRate => "zero-rate",
            Self::DiscountFactor => "discount-factor",
            Self::PeriodicRate { .. } => "periodic-rate",
            Self::PriceIndex => "price-index",
        }
    }
}

/// An immutable interpolated curve produced by calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedCurve {
    name: String,
    times: Vec<f64>,
    values: Vec<f64>,
    kind: CurveValueKind,
    interpolation: Interpolation,
    left: Extrapolation,
    right: Extrapolation,
    #[serde(default)]
    anchor: Option<usize>,
}

impl CalibratedCurve {
    /// Creates a curve from node times and ordinates.
    ///
    /// # Errors
    ///
    /// Fails on empty nodes, non-increasing times, mismatched lengths, or
    /// non-positive ordinates where the value kind requires positivity.
    pub fn new(
        name: impl Into<String>,
        times: Vec<f64>,
        values: Vec<f64>,
        kind: CurveValueKind,
        interpolation: Interpolation,
        left: Extrapolation,
        right: Extrapolation,
    ) -> CurveResult<Self> {
        let name = name.into();
        if times.is_empty() {
            return Err(CurveError::invalid_curve(&name, "no nodes"));
        }
        if times.len() != values.len() {
            return Err(CurveError::invalid_curve(
                &name,
                format!("{} times against {} values", times.len(), values.len()),
            ));
        }
        if times.len() == 1 {
            // Single-node curves are constant; nothing to interpolate.
            if !times[0].is_finite() || !values[0].is_finite() {
                return Err(CurveError::invalid_curve(&name, "non-finite node"));
            }
        } else {
            interpolation
                .validate(&times, &values)
                .map_err(|e| CurveError::invalid_curve(&name, e.to_string()))?;
        }
        if matches!(kind, CurveValueKind::DiscountFactor | CurveValueKind::PriceIndex) {
            if let Some((i, &v)) = values.iter().enumerate().find(|(_, v)| **v <= 0.0) {
                return Err(CurveError::invalid_curve(
                    &name,
                    format!("{} ordinate {v} at node {i} must be positive", kind.name()),
                ));
            }
        }
        Ok(Self {
            name,
            times,
            values,
            kind,
            interpolation,
            left,
            right,
            anchor: None,
        })
    }

    /// Marks node `index` as an anchor: a pinned ordinate that is not a
    /// calibration parameter. Anchored nodes are excluded from
    /// [`Self::parameter_count`] and skipped by the parameter indexing of
    /// [`Self::with_bumped`].
    ///
    /// # Errors
    ///
    /// Fails when `index` is out of range.
    pub fn with_anchor(mut self, index: usize) -> CurveResult<Self> {
        if index >= self.values.len() {
            return Err(CurveError::invalid_curve(
                &self.name,
                format!("anchor index {index} outside {} nodes", self.values.len()),
            ));
        }
        self.anchor = Some(index);
        Ok(self)
    }

    /// Index of the anchor node, if the curve has one.
    #[must_use]
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Curve name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value convention of the node ordinates.
    #[must_use]
    pub fn kind(&self) -> CurveValueKind {
        self.kind
    }

    /// Node times in years.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Node ordinates.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of calibration parameters. An anchored curve has one
    /// parameter fewer than it has nodes: the anchor ordinate is pinned,
    /// not calibrated.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.values.len() - usize::from(self.anchor.is_some())
    }

    /// Raw interpolated ordinate at `t`, in the curve's value convention.
    #[must_use]
    pub fn ordinate(&self, t: f64) -> f64 {
        if self.times.len() == 1 {
            return self.values[0];
        }
        self.interpolation
            .interpolate(&self.times, &self.values, t, self.left, self.right)
    }

    /// Discount factor at time `t`.
    ///
    /// # Errors
    ///
    /// Fails for price-index curves, which do not discount.
    pub fn discount_factor(&self, t: f64) -> CurveResult<f64> {
        match self.kind {
            CurveValueKind::ZeroRate => Ok((-self.ordinate(t) * t).exp()),
            CurveValueKind::DiscountFactor => {
                if t <= 0.0 {
                    Ok(1.0)
                } else {
                    Ok(self.ordinate(t))
                }
            }
            CurveValueKind::PeriodicRate { periods_per_year } => {
                let m = f64::from(periods_per_year);
                Ok((1.0 + self.ordinate(t) / m).powf(-m * t))
            }
            CurveValueKind::PriceIndex => Err(CurveError::invalid_curve(
                &self.name,
                "price-index curves have no discount factors",
            )),
        }
    }

    /// Price-index level at time `t`.
    ///
    /// # Errors
    ///
    /// Fails for curves that are not price-index curves.
    pub fn index_value(&self, t: f64) -> CurveResult<f64> {
        match self.kind {
            CurveValueKind::PriceIndex => Ok(self.ordinate(t)),
            _ => Err(CurveError::invalid_curve(
                &self.name,
                format!("{} curves have no index values", self.kind.name()),
            )),
        }
    }

    /// Simply compounded forward rate between `t1` and `t2` with accrual
    /// fraction `accrual`.
    ///
    /// # Errors
    ///
    /// Fails for price-index curves.
    pub fn forward_rate(&self, t1: f64, t2: f64, accrual: f64) -> CurveResult<f64> {
        let d1 = self.discount_factor(t1)?;
        let d2 = self.discount_factor(t2)?;
        Ok((d1 / d2 - 1.0) / accrual)
    }

    /// Returns a copy with parameter `index` bumped by `shift`. Parameter
    /// indices skip the anchor node, matching [`Self::parameter_count`].
    ///
    /// Used by finite-difference sensitivities; no validation is re-run,
    /// bumps are assumed small enough to preserve curve validity.
    #[must_use]
    pub fn with_bumped(&self, index: usize, shift: f64) -> Self {
        let node = match self.anchor {
            Some(anchor) if index >= anchor => index + 1,
            _ => index,
        };
        let mut bumped = self.clone();
        bumped.values[node] += shift;
        bumped
    }
}
