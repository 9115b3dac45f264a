//! Calibration bundles: the solver-ready form of one group.
//!
//! A [`SingleCurveBundle`] pairs one curve's instruments with the
//! generator that will build it and the role registrations it gets on the
//! provider. A [`MultiCurveBundle`] stacks the bundles of one group in
//! declared order; its concatenated instrument list and parameter vector
//! are what the root finder sees.

use crate::error::{CurveError, CurveResult};
use crate::generator::CurveGenerator;
use crate::instruments::Instrument;
use crate::provider::CurveRegistrations;

/// One curve's calibration inputs.
#[derive(Debug, Clone)]
pub struct SingleCurveBundle {
    /// Curve name.
    pub name: String,
    /// Instruments in quoting order.
    pub instruments: Vec<Instrument>,
    /// Starting parameter values, one per instrument.
    pub initial_guess: Vec<f64>,
    /// Generator producing candidate curves.
    pub generator: CurveGenerator,
    /// Roles the solved curve serves.
    pub registrations: CurveRegistrations,
}

impl SingleCurveBundle {
    /// Creates a bundle, checking that instruments, guesses and generator
    /// parameters all agree in count.
    ///
    /// # Errors
    ///
    /// Fails with `BundleSizeMismatch` when the counts disagree.
    pub fn new(
        name: impl Into<String>,
        instruments: Vec<Instrument>,
        initial_guess: Vec<f64>,
        generator: CurveGenerator,
        registrations: CurveRegistrations,
    ) -> CurveResult<Self> {
        let name = name.into();
        if instruments.len() != generator.parameter_count()
            || initial_guess.len() != instruments.len()
        {
            return Err(CurveError::BundleSizeMismatch {
                curve: name,
                instruments: instruments.len(),
                parameters: generator.parameter_count(),
            });
        }
        Ok(Self {
            name,
            instruments,
            initial_guess,
            generator,
            registrations,
        })
    }

    /// Number of free parameters the generator calibrates.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.generator.parameter_count()
    }
}

/// One calibration group's bundles, in declared order.
#[derive(Debug, Clone, Default)]
pub struct MultiCurveBundle {
    /// Per-curve bundles.
    pub curves: Vec<SingleCurveBundle>,
}

impl MultiCurveBundle {
    /// Creates a group bundle.
    #[must_use]
    pub fn new(curves: Vec<SingleCurveBundle>) -> Self {
        Self { curves }
    }

    /// Total instruments across the group.
    #[must_use]
    pub fn total_instruments(&self) -> usize {
        self.curves.iter().map(|c| c.instruments.len()).sum()
    }

    /// Total parameters across the group.
    #[must_use]
    pub fn total_parameters(&self) -> usize {
        self.curves.iter().map(SingleCurveBundle::parameter_count).sum()
    }

    /// The concatenated initial guess vector.
    #[must_use]
    pub fn stacked_guess(&self) -> Vec<f64> {
        self.curves
            .iter()
            .flat_map(|c| c.initial_guess.iter().copied())
            .collect()
    }

    /// All instruments in stacked order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.curves.iter().flat_map(|c| c.instruments.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveValueKind;
    use curveforge_core::Currency;
    use curveforge_math::{Extrapolation, Interpolation};

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

    fn generator(instruments: &[Instrument]) -> CurveGenerator {
        CurveGenerator::interpolated(
            "USD-OIS",
            instruments,
            CurveValueKind::ZeroRate,
            Interpolation::Linear,
            Extrapolation::Flat,
            Extrapolation::Flat,
        )
    }

    #[test]
    fn test_mismatched_guess_rejected() {
        let instruments = vec![cash(0.25, 0.03), cash(0.5, 0.031)];
        let generator = generator(&instruments);
        let result = SingleCurveBundle::new(
            "USD-OIS",
            instruments,
            vec![0.03],
            generator,
            CurveRegistrations::default(),
        );
        assert!(matches!(result, Err(CurveError::BundleSizeMismatch { .. })));
    }

    #[test]
    fn test_stacked_guess_preserves_order() {
        let a = vec![cash(0.25, 0.03)];
        let b = vec![cash(0.5, 0.031), cash(1.0, 0.032)];
        let group = MultiCurveBundle::new(vec![
            SingleCurveBundle::new(
                "A",
                a.clone(),
                vec![0.03],
                generator(&a),
                CurveRegistrations::default(),
            )
            .unwrap(),
            SingleCurveBundle::new(
                "B",
                b.clone(),
                vec![0.031, 0.032],
                generator(&b),
                CurveRegistrations::default(),
            )
            .unwrap(),
        ]);
        assert_eq!(group.total_instruments(), 3);
        assert_eq!(group.stacked_guess(), vec![0.03, 0.031, 0.032]);
    }
}
