//! Par-spread valuation and finite-difference sensitivities.
//!
//! A [`ValuationCalculator`] prices one instrument against a provider and
//! returns its par spread: the quantity that is zero exactly when the
//! provider reprices the market quote. The root finder drives these to
//! zero. Model-aware calculators differ from the discounting calculator
//! only where the model matters: futures get a convexity adjustment
//! between the futures rate and the forward rate.

use curveforge_core::Currency;
use nalgebra::{DMatrix, DVector};

use crate::error::{CurveError, CurveResult};
use crate::index::ForwardRateKey;
use crate::instruments::{DirectQuote, FloatPeriod, Instrument, SwapInstrument};
use crate::model_params::ModelParameters;
use crate::provider::MulticurveProvider;

/// Prices instruments as par spreads against a provider.
pub trait ValuationCalculator {
    /// Par spread of `instrument` under `provider`.
    ///
    /// # Errors
    ///
    /// Fails when the provider lacks a curve, FX rate or model the
    /// instrument needs.
    fn par_spread(
        &self,
        instrument: &Instrument,
        provider: &MulticurveProvider,
    ) -> CurveResult<f64>;
}

/// Pure multi-curve discounting: no convexity adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParSpreadDiscountingCalculator;

impl ValuationCalculator for ParSpreadDiscountingCalculator {
    fn par_spread(
        &self,
        instrument: &Instrument,
        provider: &MulticurveProvider,
    ) -> CurveResult<f64> {
        par_spread_with_convexity(instrument, provider, &|_, _, _| Ok(0.0))
    }
}

/// Discounting plus one-factor Hull-White futures convexity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParSpreadHullWhiteCalculator;

impl ValuationCalculator for ParSpreadHullWhiteCalculator {
    fn par_spread(
        &self,
        instrument: &Instrument,
        provider: &MulticurveProvider,
    ) -> CurveResult<f64> {
        par_spread_with_convexity(instrument, provider, &|p, (t1, t2), accrual| {
            match p.model() {
                Some(ModelParameters::HullWhiteOneFactor(params)) => {
                    Ok(params.futures_convexity(t1, t2, accrual))
                }
                _ => Err(CurveError::ModelParametersRequired {
                    variant: "hull-white".into(),
                    required: "hull-white-one-factor".into(),
                }),
            }
        })
    }
}

/// Discounting plus G2++ futures convexity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParSpreadG2ppCalculator;

impl ValuationCalculator for ParSpreadG2ppCalculator {
    fn par_spread(
        &self,
        instrument: &Instrument,
        provider: &MulticurveProvider,
    ) -> CurveResult<f64> {
        par_spread_with_convexity(instrument, provider, &|p, (t1, t2), accrual| {
            match p.model() {
                Some(ModelParameters::G2pp(params)) => {
                    Ok(params.futures_convexity(t1, t2, accrual))
                }
                _ => Err(CurveError::ModelParametersRequired {
                    variant: "g2pp".into(),
                    required: "g2pp".into(),
                }),
            }
        })
    }
}

type Convexity<'a> =
    &'a dyn Fn(&MulticurveProvider, (f64, f64), f64) -> CurveResult<f64>;

fn par_spread_with_convexity(
    instrument: &Instrument,
    provider: &MulticurveProvider,
    convexity: Convexity<'_>,
) -> CurveResult<f64> {
    match instrument {
        Instrument::Cash {
            currency,
            projection,
            start,
            end,
            accrual,
            rate,
        } => {
            let (d1, d2) = match projection {
                Some(key) => (
                    provider.projection_discount_factor(key, *start)?,
                    provider.projection_discount_factor(key, *end)?,
                ),
                None => (
                    provider.discount_factor(*currency, *start)?,
                    provider.discount_factor(*currency, *end)?,
                ),
            };
            Ok((d1 / d2 - 1.0) / accrual - rate)
        }
        Instrument::Fra {
            projection,
            start,
            end,
            accrual,
            rate,
            first_fixing,
            ..
        } => {
            let forward = match first_fixing {
                Some(fixing) if *start <= 0.0 => *fixing,
                _ => provider.forward_rate(projection, *start, *end, *accrual)?,
            };
            Ok(forward - rate)
        }
        Instrument::Swap(swap) => {
            let annuity = fixed_annuity(provider, swap)?;
            Ok(float_leg_pv(provider, swap)? / annuity - swap.fixed_rate)
        }
        Instrument::BasisSwap {
            currency,
            pay,
            receive,
            spread,
        } => {
            let pay_pv = basis_leg_pv(provider, *currency, &pay.0, &pay.1, None)?;
            let receive_pv = basis_leg_pv(provider, *currency, &receive.0, &receive.1, None)?;
            let mut annuity = 0.0;
            for period in &pay.1 {
                annuity += period.accrual * provider.discount_factor(*currency, period.pay)?;
            }
            Ok((receive_pv - pay_pv) / annuity - spread)
        }
        Instrument::RateFuture {
            projection,
            start,
            end,
            accrual,
            price,
            ..
        } => {
            let forward = provider.forward_rate(projection, *start, *end, *accrual)?;
            let adjustment = convexity(provider, (*start, *end), *accrual)?;
            Ok(forward + adjustment - (1.0 - price))
        }
        Instrument::SwapFuture {
            expiry,
            underlying,
            price,
        } => {
            // Forward price of the delivered receiver swap plus par.
            let value = underlying.fixed_rate * fixed_annuity(provider, underlying)?
                - float_leg_pv(provider, underlying)?;
            let df = provider.discount_factor(underlying.currency, *expiry)?;
            Ok(1.0 + value / df - price)
        }
        Instrument::FxForward {
            base,
            counter,
            maturity,
            forward,
        } => {
            let spot = provider.fx().rate(*base, *counter)?;
            let implied = spot * provider.discount_factor(*base, *maturity)?
                / provider.discount_factor(*counter, *maturity)?;
            Ok(implied - forward)
        }
        Instrument::Bond {
            issuer,
            coupons,
            coupon_rate,
            maturity,
            price,
            ..
        } => {
            let mut dirty = provider.issuer_discount_factor(issuer, *maturity)?;
            for (pay, accrual) in coupons {
                dirty += coupon_rate * accrual * provider.issuer_discount_factor(issuer, *pay)?;
            }
            Ok(dirty - price)
        }
        Instrument::InflationSwap {
            index,
            maturity,
            base_index,
            rate,
        } => {
            let projected = provider.price_index_value(index, *maturity)?;
            let implied = (projected / base_index).powf(1.0 / maturity) - 1.0;
            Ok(implied - rate)
        }
        Instrument::Direct {
            currency,
            quote,
            time,
            value,
        } => {
            let df = provider.discount_factor(*currency, *time)?;
            let implied = match quote {
                DirectQuote::DiscountFactor => df,
                DirectQuote::ContinuousRate => -df.ln() / time,
                DirectQuote::PeriodicRate { periods_per_year } => {
                    let m = f64::from(*periods_per_year);
                    m * (df.powf(-1.0 / (m * time)) - 1.0)
                }
            };
            Ok(implied - value)
        }
    }
}

/// Fixed-leg annuity: sum of accrual-weighted discount factors.
fn fixed_annuity(provider: &MulticurveProvider, swap: &SwapInstrument) -> CurveResult<f64> {
    let mut annuity = 0.0;
    for (pay, accrual) in &swap.fixed_periods {
        annuity += accrual * provider.discount_factor(swap.currency, *pay)?;
    }
    Ok(annuity)
}

/// Floating-leg present value, honouring a known first fixing when the
/// first period has already started.
fn float_leg_pv(provider: &MulticurveProvider, swap: &SwapInstrument) -> CurveResult<f64> {
    basis_leg_pv(
        provider,
        swap.currency,
        &swap.projection,
        &swap.float_periods,
        swap.first_fixing,
    )
}

fn basis_leg_pv(
    provider: &MulticurveProvider,
    currency: Currency,
    projection: &ForwardRateKey,
    periods: &[FloatPeriod],
    first_fixing: Option<f64>,
) -> CurveResult<f64> {
    let mut pv = 0.0;
    for (i, period) in periods.iter().enumerate() {
        let forward = match first_fixing {
            Some(fixing) if i == 0 && period.start <= 0.0 => fixing,
            _ => provider.forward_rate(projection, period.start, period.end, period.accrual)?,
        };
        pv += forward * period.accrual * provider.discount_factor(currency, period.pay)?;
    }
    Ok(pv)
}

/// Computes Jacobians of residual vectors, by whatever means.
pub trait SensitivityCalculator {
    /// Jacobian `d f / d x` of a residual function at `x`.
    ///
    /// # Errors
    ///
    /// Propagates residual evaluation failures.
    fn parameter_jacobian(
        &self,
        f: &dyn Fn(&DVector<f64>) -> CurveResult<DVector<f64>>,
        x: &DVector<f64>,
    ) -> CurveResult<DMatrix<f64>>;

    /// Jacobian of the instruments' par spreads with respect to the node
    /// values of `curve_order`'s curves, columns stacked curve by curve.
    ///
    /// # Errors
    ///
    /// Propagates pricing failures and missing curves.
    fn provider_jacobian(
        &self,
        valuation: &dyn ValuationCalculator,
        instruments: &[Instrument],
        provider: &MulticurveProvider,
        curve_order: &[String],
    ) -> CurveResult<DMatrix<f64>>;
}

/// Central finite differences.
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifferenceSensitivity {
    step: f64,
}

impl Default for FiniteDifferenceSensitivity {
    fn default() -> Self {
        Self { step: 1e-7 }
    }
}

impl FiniteDifferenceSensitivity {
    /// Creates a calculator with the given bump size.
    #[must_use]
    pub fn new(step: f64) -> Self {
        Self { step }
    }
}

impl SensitivityCalculator for FiniteDifferenceSensitivity {
    fn parameter_jacobian(
        &self,
        f: &dyn Fn(&DVector<f64>) -> CurveResult<DVector<f64>>,
        x: &DVector<f64>,
    ) -> CurveResult<DMatrix<f64>> {
        let n = x.len();
        let mut jacobian = DMatrix::zeros(0, n);
        for j in 0..n {
            let mut up = x.clone();
            up[j] += self.step;
            let mut down = x.clone();
            down[j] -= self.step;
            let column = (f(&up)? - f(&down)?) / (2.0 * self.step);
            if jacobian.nrows() == 0 {
                jacobian = DMatrix::zeros(column.len(), n);
            }
            jacobian.set_column(j, &column);
        }
        Ok(jacobian)
    }

    fn provider_jacobian(
        &self,
        valuation: &dyn ValuationCalculator,
        instruments: &[Instrument],
        provider: &MulticurveProvider,
        curve_order: &[String],
    ) -> CurveResult<DMatrix<f64>> {
        let columns: usize = curve_order
            .iter()
            .map(|name| {
                provider
                    .curve(name)
                    .map(|curve| curve.parameter_count())
            })
            .sum::<CurveResult<usize>>()?;
        let mut jacobian = DMatrix::zeros(instruments.len(), columns);
        let mut offset = 0;
        for name in curve_order {
            let count = provider.curve(name)?.parameter_count();
            for node in 0..count {
                let up = provider.with_bumped_curve(name, node, self.step)?;
                let down = provider.with_bumped_curve(name, node, -self.step)?;
                for (row, instrument) in instruments.iter().enumerate() {
                    let high = valuation.par_spread(instrument, &up)?;
                    let low = valuation.par_spread(instrument, &down)?;
                    jacobian[(row, offset + node)] = (high - low) / (2.0 * self.step);
                }
            }
            offset += count;
        }
        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{CalibratedCurve, CurveValueKind};
    use crate::index::{ForwardRateKey, IborIndex, IssuerKey, PriceIndex};
    use crate::model_params::G2Parameters;
    use crate::provider::{CurveRegistrations, FxMatrix};
    use approx::assert_relative_eq;
    use curveforge_core::{Currency, Tenor};
    use curveforge_math::{Extrapolation, Interpolation};
    use std::sync::Arc;

    fn flat_provider(rate: f64) -> MulticurveProvider {
        let curve = Arc::new(
            CalibratedCurve::new(
                "USD-OIS",
                vec![0.25, 30.0],
                vec![rate, rate],
                CurveValueKind::ZeroRate,
                Interpolation::Linear,
                Extrapolation::Flat,
                Extrapolation::Flat,
            )
            .unwrap(),
        );
        MulticurveProvider::default()
            .with_curve(
                curve,
                &CurveRegistrations {
                    discounting: vec![Currency::USD],
                    ibor: vec![usd3m()],
                    ..CurveRegistrations::default()
                },
            )
            .unwrap()
    }

    fn usd3m() -> IborIndex {
        IborIndex::new("USDLIBOR3M", Currency::USD, Tenor::months(3))
    }

    #[test]
    fn test_cash_par_spread_zero_at_fair_rate() {
        let provider = flat_provider(0.03);
        let accrual = 0.5;
        let d1 = provider.discount_factor(Currency::USD, 0.0).unwrap();
        let d2 = provider.discount_factor(Currency::USD, 0.5).unwrap();
        let fair = (d1 / d2 - 1.0) / accrual;
        let cash = Instrument::Cash {
            currency: Currency::USD,
            projection: None,
            start: 0.0,
            end: 0.5,
            accrual,
            rate: fair,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&cash, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_fra_uses_fixing_for_started_period() {
        let provider = flat_provider(0.03);
        let fra = Instrument::Fra {
            currency: Currency::USD,
            projection: ForwardRateKey::Ibor(usd3m()),
            start: 0.0,
            end: 0.25,
            accrual: 0.25,
            rate: 0.05,
            first_fixing: Some(0.05),
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&fra, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0);
    }

    #[test]
    fn test_hull_white_calculator_requires_model() {
        let provider = flat_provider(0.03);
        let future = Instrument::RateFuture {
            currency: Currency::USD,
            projection: ForwardRateKey::Ibor(usd3m()),
            start: 0.5,
            end: 0.75,
            accrual: 0.25,
            price: 0.97,
        };
        let result = ParSpreadHullWhiteCalculator.par_spread(&future, &provider);
        assert!(matches!(
            result,
            Err(CurveError::ModelParametersRequired { .. })
        ));
        // Non-futures instruments price without a model.
        let cash = Instrument::Cash {
            currency: Currency::USD,
            projection: None,
            start: 0.0,
            end: 0.5,
            accrual: 0.5,
            rate: 0.03,
        };
        assert!(ParSpreadHullWhiteCalculator
            .par_spread(&cash, &provider)
            .is_ok());
    }

    fn flat_zero_curve(name: &str, rate: f64) -> Arc<CalibratedCurve> {
        Arc::new(
            CalibratedCurve::new(
                name,
                vec![0.25, 30.0],
                vec![rate, rate],
                CurveValueKind::ZeroRate,
                Interpolation::Linear,
                Extrapolation::Flat,
                Extrapolation::Flat,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_basis_swap_against_its_own_curve_spreads_at_minus_quote() {
        // Identical legs cancel, so the par spread is exactly the negated
        // quoted spread.
        let provider = flat_provider(0.03);
        let periods = vec![
            FloatPeriod {
                start: 0.0,
                end: 0.5,
                accrual: 0.5,
                pay: 0.5,
            },
            FloatPeriod {
                start: 0.5,
                end: 1.0,
                accrual: 0.5,
                pay: 1.0,
            },
        ];
        let swap = Instrument::BasisSwap {
            currency: Currency::USD,
            pay: (ForwardRateKey::Ibor(usd3m()), periods.clone()),
            receive: (ForwardRateKey::Ibor(usd3m()), periods),
            spread: 0.0015,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&swap, &provider)
            .unwrap();
        assert_relative_eq!(spread, -0.0015, epsilon = 1e-14);
    }

    #[test]
    fn test_swap_future_at_the_forward_rate_prices_at_par() {
        let provider = flat_provider(0.03);
        let fair = provider
            .forward_rate(&ForwardRateKey::Ibor(usd3m()), 0.5, 1.5, 1.0)
            .unwrap();
        let underlying = SwapInstrument {
            currency: Currency::USD,
            projection: ForwardRateKey::Ibor(usd3m()),
            fixed_periods: vec![(1.5, 1.0)],
            float_periods: vec![FloatPeriod {
                start: 0.5,
                end: 1.5,
                accrual: 1.0,
                pay: 1.5,
            }],
            fixed_rate: fair,
            first_fixing: None,
        };
        let future = Instrument::SwapFuture {
            expiry: 0.5,
            underlying,
            price: 1.0,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&future, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_fx_forward_spread_from_covered_parity() {
        let fx = FxMatrix::new()
            .with_currency(Currency::EUR, Currency::USD, 1.10)
            .unwrap();
        let provider = MulticurveProvider::new(fx, None)
            .with_curve(
                flat_zero_curve("USD-DISC", 0.03),
                &CurveRegistrations {
                    discounting: vec![Currency::USD],
                    ..CurveRegistrations::default()
                },
            )
            .unwrap()
            .with_curve(
                flat_zero_curve("EUR-DISC", 0.02),
                &CurveRegistrations {
                    discounting: vec![Currency::EUR],
                    ..CurveRegistrations::default()
                },
            )
            .unwrap();
        // Covered interest parity: F = S * df_base / df_counter.
        let fair = 1.10 * (-0.02f64).exp() / (-0.03f64).exp();
        let forward = Instrument::FxForward {
            base: Currency::EUR,
            counter: Currency::USD,
            maturity: 1.0,
            forward: fair,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&forward, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);

        let off_market = Instrument::FxForward {
            base: Currency::EUR,
            counter: Currency::USD,
            maturity: 1.0,
            forward: fair + 0.01,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&off_market, &provider)
            .unwrap();
        assert_relative_eq!(spread, -0.01, epsilon = 1e-14);
    }

    #[test]
    fn test_bond_spread_is_dirty_price_minus_quote() {
        let issuer = IssuerKey::new("ACME", "SENIOR");
        let provider = MulticurveProvider::default()
            .with_curve(
                flat_zero_curve("ACME-SENIOR", 0.03),
                &CurveRegistrations {
                    issuers: vec![issuer.clone()],
                    ..CurveRegistrations::default()
                },
            )
            .unwrap();
        let dirty = (-0.06f64).exp() + 0.04 * ((-0.03f64).exp() + (-0.06f64).exp());
        let bond = Instrument::Bond {
            issuer,
            currency: Currency::USD,
            coupons: vec![(1.0, 1.0), (2.0, 1.0)],
            coupon_rate: 0.04,
            maturity: 2.0,
            price: dirty,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&bond, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_inflation_swap_spread_from_projected_index_ratio() {
        let cpi = PriceIndex::new("US-CPI-U", Currency::USD);
        let curve = Arc::new(
            CalibratedCurve::new(
                "USD-CPI",
                vec![1.0, 2.0],
                vec![102.0, 105.0625],
                CurveValueKind::PriceIndex,
                Interpolation::Linear,
                Extrapolation::Flat,
                Extrapolation::Linear,
            )
            .unwrap(),
        );
        let provider = MulticurveProvider::default()
            .with_curve(
                curve,
                &CurveRegistrations {
                    inflation: vec![cpi.clone()],
                    ..CurveRegistrations::default()
                },
            )
            .unwrap();
        // 100 * 1.025^2 = 105.0625, so the 2y zero-coupon rate is 2.5%.
        let swap = Instrument::InflationSwap {
            index: cpi,
            maturity: 2.0,
            base_index: 100.0,
            rate: 0.025,
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&swap, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_g2pp_calculator_adds_its_convexity_to_the_discounting_spread() {
        let params = G2Parameters::flat((0.03, 0.08), (0.01, 0.006), 0.5);
        let provider = MulticurveProvider::new(
            FxMatrix::new(),
            Some(ModelParameters::G2pp(params.clone())),
        )
        .with_curve(
            flat_zero_curve("USD-OIS", 0.03),
            &CurveRegistrations {
                discounting: vec![Currency::USD],
                ibor: vec![usd3m()],
                ..CurveRegistrations::default()
            },
        )
        .unwrap();
        let future = Instrument::RateFuture {
            currency: Currency::USD,
            projection: ForwardRateKey::Ibor(usd3m()),
            start: 0.5,
            end: 0.75,
            accrual: 0.25,
            price: 0.97,
        };
        let adjusted = ParSpreadG2ppCalculator
            .par_spread(&future, &provider)
            .unwrap();
        let plain = ParSpreadDiscountingCalculator
            .par_spread(&future, &provider)
            .unwrap();
        assert_relative_eq!(
            adjusted - plain,
            params.futures_convexity(0.5, 0.75, 0.25),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_direct_discount_factor_spread() {
        let provider = flat_provider(0.03);
        let direct = Instrument::Direct {
            currency: Currency::USD,
            quote: DirectQuote::DiscountFactor,
            time: 1.0,
            value: (-0.03f64).exp(),
        };
        let spread = ParSpreadDiscountingCalculator
            .par_spread(&direct, &provider)
            .unwrap();
        assert_relative_eq!(spread, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_provider_jacobian_matches_analytic_direct_node() {
        // Direct discount-factor quote against a discount-factor curve:
        // d(spread)/d(node) is the interpolation weight.
        let curve = Arc::new(
            CalibratedCurve::new(
                "USD-OIS",
                vec![0.5, 1.5],
                vec![0.99, 0.95],
                CurveValueKind::DiscountFactor,
                Interpolation::Linear,
                Extrapolation::Flat,
                Extrapolation::Flat,
            )
            .unwrap(),
        );
        let provider = MulticurveProvider::default()
            .with_curve(
                curve,
                &CurveRegistrations {
                    discounting: vec![Currency::USD],
                    ..CurveRegistrations::default()
                },
            )
            .unwrap();
        let instruments = [Instrument::Direct {
            currency: Currency::USD,
            quote: DirectQuote::DiscountFactor,
            time: 1.0,
            value: 0.97,
        }];
        let jacobian = FiniteDifferenceSensitivity::default()
            .provider_jacobian(
                &ParSpreadDiscountingCalculator,
                &instruments,
                &provider,
                &["USD-OIS".to_string()],
            )
            .unwrap();
        assert_eq!(jacobian.shape(), (1, 2));
        assert_relative_eq!(jacobian[(0, 0)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(jacobian[(0, 1)], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_parameter_jacobian_of_linear_map() {
        let f = |x: &DVector<f64>| -> CurveResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![
                2.0 * x[0] + x[1],
                x[0] - 3.0 * x[1],
            ]))
        };
        let jacobian = FiniteDifferenceSensitivity::default()
            .parameter_jacobian(&f, &DVector::from_vec(vec![0.1, 0.2]))
            .unwrap();
        assert_relative_eq!(jacobian[(0, 0)], 2.0, epsilon = 1e-6);
        assert_relative_eq!(jacobian[(0, 1)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(jacobian[(1, 0)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(jacobian[(1, 1)], -3.0, epsilon = 1e-6);
    }
}
