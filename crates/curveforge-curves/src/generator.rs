//! Curve generators: from a parameter slice to a [`CalibratedCurve`].
//!
//! A generator fixes everything about a curve except its node values: the
//! node times, the value convention and the interpolation. The root
//! finder hands it parameter slices; the generator hands back candidate
//! curves. Anchored generators carry one extra zero-valued node that is
//! not a parameter, keeping fixed-date systems square.

use curveforge_core::Date;
use curveforge_math::{Extrapolation, Interpolation};

use crate::curves::{CalibratedCurve, CurveValueKind};
use crate::error::{CurveError, CurveResult};
use crate::instruments::Instrument;

/// Builds curves of a fixed shape from calibration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGenerator {
    name: String,
    times: Vec<f64>,
    anchor_time: Option<f64>,
    kind: CurveValueKind,
    interpolation: Interpolation,
    left: Extrapolation,
    right: Extrapolation,
}

impl CurveGenerator {
    /// A generator whose node times follow the instruments' last
    /// cash-flow times, in instrument order.
    #[must_use]
    pub fn interpolated(
        name: impl Into<String>,
        instruments: &[Instrument],
        kind: CurveValueKind,
        interpolation: Interpolation,
        left: Extrapolation,
        right: Extrapolation,
    ) -> Self {
        Self {
            name: name.into(),
            times: instruments.iter().map(Instrument::last_time).collect(),
            anchor_time: None,
            kind,
            interpolation,
            left,
            right,
        }
    }

    /// A generator with preset node dates and an anchor date pinning a
    /// zero-valued extra node.
    #[must_use]
    pub fn fixed_date(
        name: impl Into<String>,
        valuation: Date,
        dates: &[Date],
        anchor: Date,
        kind: CurveValueKind,
        interpolation: Interpolation,
        left: Extrapolation,
        right: Extrapolation,
    ) -> Self {
        Self {
            name: name.into(),
            times: dates
                .iter()
                .map(|d| valuation.year_fraction_to(*d))
                .collect(),
            anchor_time: Some(valuation.year_fraction_to(anchor)),
            kind,
            interpolation,
            left,
            right,
        }
    }

    /// The curve name this generator builds.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node times excluding any anchor node.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of free parameters (one per non-anchor node).
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.times.len()
    }

    /// Builds the curve for one parameter slice.
    ///
    /// # Errors
    ///
    /// Fails on a parameter count mismatch or invalid resulting nodes.
    pub fn build(&self, parameters: &[f64]) -> CurveResult<CalibratedCurve> {
        if parameters.len() != self.times.len() {
            return Err(CurveError::BundleSizeMismatch {
                curve: self.name.clone(),
                instruments: parameters.len(),
                parameters: self.times.len(),
            });
        }
        let mut times = self.times.clone();
        let mut values = parameters.to_vec();
        let mut anchor_index = None;
        if let Some(anchor) = self.anchor_time {
            let at = times.partition_point(|&t| t < anchor);
            times.insert(at, anchor);
            values.insert(at, 0.0);
            anchor_index = Some(at);
        }
        let curve = CalibratedCurve::new(
            self.name.clone(),
            times,
            values,
            self.kind,
            self.interpolation,
            self.left,
            self.right,
        )?;
        match anchor_index {
            Some(at) => curve.with_anchor(at),
            None => Ok(curve),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use curveforge_core::Currency;

    fn cash(end: f64, rate: f64) -> Instrument {
        Instrument::Cash {
            currency: Currency::USD,
            projection: None,
            start: 0.0,
            end,
            accrual: end,
            rate,
        }
    }

    #[test]
    fn test_interpolated_times_follow_instruments() {
        let instruments = [cash(0.25, 0.03), cash(0.5, 0.031), cash(1.0, 0.032)];
        let generator = CurveGenerator::interpolated(
            "USD-OIS",
            &instruments,
            CurveValueKind::ZeroRate,
            Interpolation::Linear,
            Extrapolation::Flat,
            Extrapolation::Flat,
        );
        assert_eq!(generator.parameter_count(), 3);
        let curve = generator.build(&[0.03, 0.031, 0.032]).unwrap();
        assert_eq!(curve.times(), [0.25, 0.5, 1.0]);
        assert_relative_eq!(curve.ordinate(0.375), 0.0305);
    }

    #[test]
    fn test_anchor_node_inserted_without_costing_a_parameter() {
        let valuation = Date::from_ymd(2024, 3, 15).unwrap();
        let dates = [
            Date::from_ymd(2025, 3, 15).unwrap(),
            Date::from_ymd(2026, 3, 15).unwrap(),
        ];
        let generator = CurveGenerator::fixed_date(
            "USD-SPREAD",
            valuation,
            &dates,
            valuation,
            CurveValueKind::ZeroRate,
            Interpolation::Linear,
            Extrapolation::Flat,
            Extrapolation::Flat,
        );
        assert_eq!(generator.parameter_count(), 2);
        let curve = generator.build(&[0.01, 0.015]).unwrap();
        // Three nodes, but the anchor stays out of the parameter count.
        assert_eq!(curve.values().len(), 3);
        assert_eq!(curve.parameter_count(), 2);
        assert_eq!(curve.anchor(), Some(0));
        assert_relative_eq!(curve.times()[0], 0.0);
        assert_relative_eq!(curve.values()[0], 0.0);
    }

    #[test]
    fn test_build_rejects_wrong_parameter_count() {
        let instruments = [cash(0.25, 0.03)];
        let generator = CurveGenerator::interpolated(
            "USD-OIS",
            &instruments,
            CurveValueKind::ZeroRate,
            Interpolation::Linear,
            Extrapolation::Flat,
            Extrapolation::Flat,
        );
        assert!(generator.build(&[0.03, 0.02]).is_err());
    }
}
