//! The multi-curve provider: named curves plus role maps and FX rates.
//!
//! The provider is immutable. Every mutation returns a new provider with
//! the change applied, so a calibration group can build candidate
//! providers on top of the known data from earlier groups without ever
//! touching it. Curves are shared by `Arc`, making the copies cheap.
//!
//! Curve names are kept in insertion order separately from the lookup
//! maps; anything that iterates curves (sensitivities, block assembly)
//! walks `order`, never a `HashMap`, so results are deterministic.

use curveforge_core::Currency;
use std::collections::HashMap;
use std::sync::Arc;

use crate::curves::CalibratedCurve;
use crate::error::{CurveError, CurveResult};
use crate::index::{ForwardRateKey, IborIndex, IssuerKey, OvernightIndex, PriceIndex};
use crate::model_params::ModelParameters;

/// Exchange rates over a set of currencies, closed under triangulation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FxMatrix {
    currencies: Vec<Currency>,
    // rates[i][j] = units of currency j per one unit of currency i
    rates: Vec<Vec<f64>>,
}

impl FxMatrix {
    /// An empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A matrix holding a single currency.
    #[must_use]
    pub fn single(currency: Currency) -> Self {
        Self {
            currencies: vec![currency],
            rates: vec![vec![1.0]],
        }
    }

    /// The currencies in the matrix.
    #[must_use]
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Returns a matrix extended with `currency`, quoted against an
    /// existing `reference` at `rate` (units of reference per unit of
    /// currency). All cross rates are derived by triangulation.
    ///
    /// # Errors
    ///
    /// Fails if `currency` is already present or `reference` is not
    /// (unless the matrix is empty, in which case both are added).
    pub fn with_currency(
        &self,
        currency: Currency,
        reference: Currency,
        rate: f64,
    ) -> CurveResult<Self> {
        if self.currencies.is_empty() {
            let mut matrix = Self::single(reference);
            return matrix_push(&mut matrix, currency, reference, rate).map(|()| matrix);
        }
        let mut matrix = self.clone();
        matrix_push(&mut matrix, currency, reference, rate)?;
        Ok(matrix)
    }

    /// The exchange rate: units of `counter` per one unit of `base`.
    ///
    /// # Errors
    ///
    /// Fails when either currency is absent.
    pub fn rate(&self, base: Currency, counter: Currency) -> CurveResult<f64> {
        let missing = || CurveError::MissingFxRate {
            base: base.code().into(),
            counter: counter.code().into(),
        };
        let i = self.position(base).ok_or_else(missing)?;
        let j = self.position(counter).ok_or_else(missing)?;
        Ok(self.rates[i][j])
    }

    fn position(&self, currency: Currency) -> Option<usize> {
        self.currencies.iter().position(|&c| c == currency)
    }
}

fn matrix_push(
    matrix: &mut FxMatrix,
    currency: Currency,
    reference: Currency,
    rate: f64,
) -> CurveResult<()> {
    if matrix.position(currency).is_some() {
        return Err(CurveError::InvalidConfiguration {
            name: "fx-matrix".into(),
            reason: format!("currency {} already present", currency.code()),
        });
    }
    let r = matrix
        .position(reference)
        .ok_or_else(|| CurveError::MissingFxRate {
            base: currency.code().into(),
            counter: reference.code().into(),
        })?;
    let n = matrix.currencies.len();
    let mut row = Vec::with_capacity(n + 1);
    for j in 0..n {
        // new/j = new/ref * ref/j
        row.push(rate * matrix.rates[r][j]);
        let inverse = 1.0 / (rate * matrix.rates[r][j]);
        matrix.rates[j].push(inverse);
    }
    row.push(1.0);
    matrix.rates.push(row);
    matrix.currencies.push(currency);
    Ok(())
}

/// The role keys one calibrated curve serves, in provider terms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveRegistrations {
    /// Currencies the curve discounts for.
    pub discounting: Vec<Currency>,
    /// Term indices the curve projects.
    pub ibor: Vec<IborIndex>,
    /// Overnight indices the curve projects.
    pub overnight: Vec<OvernightIndex>,
    /// Issuers the curve discounts for.
    pub issuers: Vec<IssuerKey>,
    /// Price indices the curve projects.
    pub inflation: Vec<PriceIndex>,
}

/// Immutable bundle of calibrated curves with role resolution.
#[derive(Debug, Clone, Default)]
pub struct MulticurveProvider {
    order: Vec<String>,
    curves: HashMap<String, Arc<CalibratedCurve>>,
    discounting: HashMap<Currency, String>,
    ibor: HashMap<IborIndex, String>,
    overnight: HashMap<OvernightIndex, String>,
    issuers: HashMap<IssuerKey, String>,
    inflation: HashMap<PriceIndex, String>,
    fx: FxMatrix,
    model: Option<ModelParameters>,
}

impl MulticurveProvider {
    /// An empty provider with the given FX matrix and optional model
    /// parameters.
    #[must_use]
    pub fn new(fx: FxMatrix, model: Option<ModelParameters>) -> Self {
        Self {
            fx,
            model,
            ..Self::default()
        }
    }

    /// Curve names in insertion order.
    #[must_use]
    pub fn curve_names(&self) -> &[String] {
        &self.order
    }

    /// Whether a curve with `name` is present.
    #[must_use]
    pub fn has_curve(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// The curve named `name`.
    ///
    /// # Errors
    ///
    /// Fails when the curve is absent.
    pub fn curve(&self, name: &str) -> CurveResult<&Arc<CalibratedCurve>> {
        self.curves
            .get(name)
            .ok_or_else(|| CurveError::missing_curve(name))
    }

    /// The FX matrix.
    #[must_use]
    pub fn fx(&self) -> &FxMatrix {
        &self.fx
    }

    /// The model parameters, if any.
    #[must_use]
    pub fn model(&self) -> Option<&ModelParameters> {
        self.model.as_ref()
    }

    /// Risk-free discount factor for `currency` at time `t`.
    ///
    /// # Errors
    ///
    /// Fails when no discounting curve is registered for the currency.
    pub fn discount_factor(&self, currency: Currency, t: f64) -> CurveResult<f64> {
        let name = self.discounting.get(&currency).ok_or_else(|| {
            CurveError::MissingRole {
                role: format!("discounting {}", currency.code()),
            }
        })?;
        self.curve(name)?.discount_factor(t)
    }

    /// Pseudo discount factor on the projection curve for `key` at `t`.
    ///
    /// # Errors
    ///
    /// Fails when no projection curve is registered for the key.
    pub fn projection_discount_factor(&self, key: &ForwardRateKey, t: f64) -> CurveResult<f64> {
        self.projection_curve(key)?.discount_factor(t)
    }

    /// Simply compounded forward rate for `key` between `t1` and `t2`.
    ///
    /// # Errors
    ///
    /// Fails when no projection curve is registered for the key.
    pub fn forward_rate(
        &self,
        key: &ForwardRateKey,
        t1: f64,
        t2: f64,
        accrual: f64,
    ) -> CurveResult<f64> {
        self.projection_curve(key)?.forward_rate(t1, t2, accrual)
    }

    /// Issuer discount factor at time `t`.
    ///
    /// # Errors
    ///
    /// Fails when no curve is registered for the issuer.
    pub fn issuer_discount_factor(&self, issuer: &IssuerKey, t: f64) -> CurveResult<f64> {
        let name = self
            .issuers
            .get(issuer)
            .ok_or_else(|| CurveError::MissingRole {
                role: format!("issuer {issuer}"),
            })?;
        self.curve(name)?.discount_factor(t)
    }

    /// Projected price-index level at time `t`.
    ///
    /// # Errors
    ///
    /// Fails when no inflation curve is registered for the index.
    pub fn price_index_value(&self, index: &PriceIndex, t: f64) -> CurveResult<f64> {
        let name = self
            .inflation
            .get(index)
            .ok_or_else(|| CurveError::MissingRole {
                role: format!("inflation {index}"),
            })?;
        self.curve(name)?.index_value(t)
    }

    fn projection_curve(&self, key: &ForwardRateKey) -> CurveResult<&Arc<CalibratedCurve>> {
        let name = match key {
            ForwardRateKey::Ibor(index) => self.ibor.get(index),
            ForwardRateKey::Overnight(index) => self.overnight.get(index),
        }
        .ok_or_else(|| CurveError::MissingRole {
            role: format!("forward {key}"),
        })?;
        self.curve(name)
    }

    /// Returns a provider extended with `curve` registered under the
    /// given role keys.
    ///
    /// # Errors
    ///
    /// Fails when a curve with the same name is already present.
    pub fn with_curve(
        &self,
        curve: Arc<CalibratedCurve>,
        registrations: &CurveRegistrations,
    ) -> CurveResult<Self> {
        if self.has_curve(curve.name()) {
            return Err(CurveError::DuplicateCurve {
                name: curve.name().into(),
            });
        }
        let mut next = self.clone();
        let name = curve.name().to_string();
        for &currency in &registrations.discounting {
            next.discounting.insert(currency, name.clone());
        }
        for index in &registrations.ibor {
            next.ibor.insert(index.clone(), name.clone());
        }
        for index in &registrations.overnight {
            next.overnight.insert(index.clone(), name.clone());
        }
        for issuer in &registrations.issuers {
            next.issuers.insert(issuer.clone(), name.clone());
        }
        for index in &registrations.inflation {
            next.inflation.insert(index.clone(), name.clone());
        }
        next.order.push(name.clone());
        next.curves.insert(name, curve);
        Ok(next)
    }

    /// Returns a provider with the named curve's node `index` bumped by
    /// `shift`. Role registrations are untouched.
    ///
    /// # Errors
    ///
    /// Fails when the curve is absent.
    pub fn with_bumped_curve(&self, name: &str, index: usize, shift: f64) -> CurveResult<Self> {
        let curve = self.curve(name)?;
        let mut next = self.clone();
        next.curves
            .insert(name.to_string(), Arc::new(curve.with_bumped(index, shift)));
        Ok(next)
    }

    /// Merges every curve and registration of `other` into a copy of
    /// this provider. Used to fold in exogenous bundles.
    ///
    /// # Errors
    ///
    /// Fails when `other` shares a curve name with this provider.
    pub fn merged_with(&self, other: &Self) -> CurveResult<Self> {
        let mut next = self.clone();
        for name in &other.order {
            if next.has_curve(name) {
                return Err(CurveError::DuplicateCurve { name: name.clone() });
            }
            next.order.push(name.clone());
            next.curves.insert(name.clone(), other.curves[name].clone());
        }
        for (key, name) in &other.discounting {
            next.discounting.insert(*key, name.clone());
        }
        for (key, name) in &other.ibor {
            next.ibor.insert(key.clone(), name.clone());
        }
        for (key, name) in &other.overnight {
            next.overnight.insert(key.clone(), name.clone());
        }
        for (key, name) in &other.issuers {
            next.issuers.insert(key.clone(), name.clone());
        }
        for (key, name) in &other.inflation {
            next.inflation.insert(key.clone(), name.clone());
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveValueKind;
    use approx::assert_relative_eq;
    use curveforge_math::{Extrapolation, Interpolation};

    fn flat_curve(name: &str, rate: f64) -> Arc<CalibratedCurve> {
        Arc::new(
            CalibratedCurve::new(
                name,
                vec![1.0, 10.0],
                vec![rate, rate],
                CurveValueKind::ZeroRate,
                Interpolation::Linear,
                Extrapolation::Flat,
                Extrapolation::Flat,
            )
            .unwrap(),
        )
    }

    fn usd_registrations() -> CurveRegistrations {
        CurveRegistrations {
            discounting: vec![Currency::USD],
            ..CurveRegistrations::default()
        }
    }

    #[test]
    fn test_with_curve_leaves_original_untouched() {
        let base = MulticurveProvider::default();
        let extended = base
            .with_curve(flat_curve("USD-OIS", 0.03), &usd_registrations())
            .unwrap();
        assert!(extended.has_curve("USD-OIS"));
        assert!(!base.has_curve("USD-OIS"));
        assert_relative_eq!(
            extended.discount_factor(Currency::USD, 2.0).unwrap(),
            (-0.06f64).exp()
        );
    }

    #[test]
    fn test_duplicate_curve_rejected() {
        let provider = MulticurveProvider::default()
            .with_curve(flat_curve("USD-OIS", 0.03), &usd_registrations())
            .unwrap();
        let result = provider.with_curve(flat_curve("USD-OIS", 0.02), &usd_registrations());
        assert!(matches!(result, Err(CurveError::DuplicateCurve { .. })));
    }

    #[test]
    fn test_curve_names_preserve_insertion_order() {
        let provider = MulticurveProvider::default()
            .with_curve(flat_curve("Z-FIRST", 0.01), &usd_registrations())
            .unwrap()
            .with_curve(flat_curve("A-SECOND", 0.02), &CurveRegistrations::default())
            .unwrap();
        assert_eq!(provider.curve_names(), ["Z-FIRST", "A-SECOND"]);
    }

    #[test]
    fn test_bump_replaces_only_target_curve() {
        let provider = MulticurveProvider::default()
            .with_curve(flat_curve("USD-OIS", 0.03), &usd_registrations())
            .unwrap();
        let bumped = provider.with_bumped_curve("USD-OIS", 0, 1e-4).unwrap();
        assert_relative_eq!(bumped.curve("USD-OIS").unwrap().values()[0], 0.0301);
        assert_relative_eq!(provider.curve("USD-OIS").unwrap().values()[0], 0.03);
    }

    #[test]
    fn test_fx_triangulation() {
        let fx = FxMatrix::single(Currency::USD)
            .with_currency(Currency::EUR, Currency::USD, 1.10)
            .unwrap()
            .with_currency(Currency::GBP, Currency::USD, 1.30)
            .unwrap();
        assert_relative_eq!(fx.rate(Currency::EUR, Currency::USD).unwrap(), 1.10);
        assert_relative_eq!(fx.rate(Currency::USD, Currency::EUR).unwrap(), 1.0 / 1.10);
        // EUR/GBP via USD
        assert_relative_eq!(
            fx.rate(Currency::EUR, Currency::GBP).unwrap(),
            1.10 / 1.30,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_fx_rate_is_an_error() {
        let fx = FxMatrix::single(Currency::USD);
        assert!(fx.rate(Currency::USD, Currency::JPY).is_err());
    }

    #[test]
    fn test_merge_rejects_shared_names() {
        let a = MulticurveProvider::default()
            .with_curve(flat_curve("USD-OIS", 0.03), &usd_registrations())
            .unwrap();
        let b = MulticurveProvider::default()
            .with_curve(flat_curve("USD-OIS", 0.02), &usd_registrations())
            .unwrap();
        assert!(a.merged_with(&b).is_err());
    }
}
