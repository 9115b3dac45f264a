//! Curve nodes and their conversion to calibration instruments.
//!
//! A [`CurveNode`] is the configuration-side description of one calibration
//! point: an instrument archetype plus the conventions needed to build it.
//! The [`NodeConverter`] turns a node into a time-coordinate [`Instrument`]
//! by resolving tenors against the valuation date, fetching the market
//! quote from the snapshot and, where the archetype needs one, the latest
//! historical fixing.

use curveforge_core::{Currency, Date, DayCount, Frequency, Tenor};
use serde::{Deserialize, Serialize};

use crate::config::{CurveNodeWithId, MarketDataId};
use crate::error::{CurveError, CurveResult};
use crate::index::{ForwardRateKey, IborIndex, IssuerKey, PriceIndex};
use crate::instruments::{DirectQuote, FloatPeriod, Instrument, SwapInstrument};
use crate::market::{FixingSource, MarketDataSnapshot};

/// Months between quarterly roll dates.
const ROLL_STEP_MONTHS: i32 = 3;

/// One calibration point of a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CurveNode {
    /// A deposit starting at `start` and running for `tenor`.
    Cash {
        /// Currency of the deposit.
        currency: Currency,
        /// Forward start offset from the valuation date.
        start: Tenor,
        /// Deposit length.
        tenor: Tenor,
        /// Accrual day count.
        day_count: DayCount,
        /// Index curve the deposit projects off, if any.
        index: Option<IborIndex>,
    },
    /// A forward rate agreement on `index` starting at `start`.
    Fra {
        /// Underlying index.
        index: IborIndex,
        /// Forward start offset from the valuation date.
        start: Tenor,
    },
    /// A spot-starting par swap.
    Swap {
        /// Discounting currency.
        currency: Currency,
        /// Floating-leg projection.
        projection: ForwardRateKey,
        /// Swap length.
        tenor: Tenor,
        /// Fixed-leg payment frequency.
        fixed_frequency: Frequency,
        /// Fixed-leg day count.
        fixed_day_count: DayCount,
    },
    /// A spot-starting float-for-float basis swap.
    BasisSwap {
        /// Discounting currency.
        currency: Currency,
        /// Projection of the spread leg.
        pay: ForwardRateKey,
        /// Projection of the flat leg.
        receive: ForwardRateKey,
        /// Swap length.
        tenor: Tenor,
    },
    /// An interest-rate future on `index` expiring at `start`.
    RateFuture {
        /// Underlying index.
        index: IborIndex,
        /// Expiry offset from the valuation date.
        start: Tenor,
    },
    /// A deliverable swap future.
    DeliverableSwapFuture {
        /// Discounting currency.
        currency: Currency,
        /// Floating-leg index of the underlying swap.
        index: IborIndex,
        /// Expiry / delivery offset from the valuation date.
        start: Tenor,
        /// Length of the underlying swap.
        underlying_tenor: Tenor,
        /// Contractual fixed rate of the underlying swap.
        fixed_rate: f64,
        /// Fixed-leg payment frequency.
        fixed_frequency: Frequency,
        /// Fixed-leg day count.
        fixed_day_count: DayCount,
    },
    /// An FX forward quoted as the outright rate.
    FxForward {
        /// Base currency.
        base: Currency,
        /// Counter currency.
        counter: Currency,
        /// Settlement offset from the valuation date.
        tenor: Tenor,
    },
    /// A fixed-coupon bond quoted by dirty price.
    Bond {
        /// Issuer key.
        issuer: IssuerKey,
        /// Settlement currency.
        currency: Currency,
        /// Time to redemption.
        tenor: Tenor,
        /// Annualized coupon rate.
        coupon: f64,
        /// Coupon frequency.
        frequency: Frequency,
        /// Accrual day count.
        day_count: DayCount,
    },
    /// A zero-coupon inflation swap. Requires the base index fixing.
    InflationSwap {
        /// Underlying price index.
        index: PriceIndex,
        /// Swap length.
        tenor: Tenor,
    },
    /// A FRA starting on the `roll`-th quarterly roll date. Requires the
    /// latest index fixing.
    RollDateFra {
        /// Underlying index.
        index: IborIndex,
        /// Zero-based quarterly roll number.
        roll: u32,
    },
    /// A swap starting on the `roll`-th quarterly roll date. Requires the
    /// latest index fixing.
    RollDateSwap {
        /// Discounting currency.
        currency: Currency,
        /// Floating-leg index.
        index: IborIndex,
        /// Zero-based quarterly roll number.
        roll: u32,
        /// Swap length from the roll date.
        tenor: Tenor,
        /// Fixed-leg payment frequency.
        fixed_frequency: Frequency,
        /// Fixed-leg day count.
        fixed_day_count: DayCount,
    },
    /// A directly quoted discount factor.
    DiscountFactor {
        /// Currency the quote belongs to.
        currency: Currency,
        /// Node maturity.
        tenor: Tenor,
    },
    /// A directly quoted continuously compounded rate.
    ContinuousRate {
        /// Currency the quote belongs to.
        currency: Currency,
        /// Node maturity.
        tenor: Tenor,
    },
    /// A directly quoted periodically compounded rate.
    PeriodicRate {
        /// Currency the quote belongs to.
        currency: Currency,
        /// Node maturity.
        tenor: Tenor,
        /// Compounding periods per year.
        periods_per_year: u32,
    },
}

impl CurveNode {
    /// Short name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Cash { .. } => "cash",
            Self::Fra { .. } => "fra",
            Self::Swap { .. } => "swap",
            Self::BasisSwap { .. } => "basis-swap",
            Self::RateFuture { .. } => "rate-future",
            Self::DeliverableSwapFuture { .. } => "deliverable-swap-future",
            Self::FxForward { .. } => "fx-forward",
            Self::Bond { .. } => "bond",
            Self::InflationSwap { .. } => "inflation-swap",
            Self::RollDateFra { .. } => "roll-date-fra",
            Self::RollDateSwap { .. } => "roll-date-swap",
            Self::DiscountFactor { .. } => "discount-factor",
            Self::ContinuousRate { .. } => "continuous-rate",
            Self::PeriodicRate { .. } => "periodic-rate",
        }
    }

    /// The direct quote kind, for nodes that quote a curve ordinate
    /// without pricing an instrument.
    #[must_use]
    pub fn direct_quote(&self) -> Option<DirectQuote> {
        match self {
            Self::DiscountFactor { .. } => Some(DirectQuote::DiscountFactor),
            Self::ContinuousRate { .. } => Some(DirectQuote::ContinuousRate),
            Self::PeriodicRate {
                periods_per_year, ..
            } => Some(DirectQuote::PeriodicRate {
                periods_per_year: *periods_per_year,
            }),
            _ => None,
        }
    }
}

/// Starting values for curve parameters before the root finder runs.
///
/// Most nodes seed with their own quote; the exceptions are price-quoted
/// nodes where the quote is nowhere near rate scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialGuessConfig {
    /// Guess for deliverable-swap-future nodes.
    pub swap_future: f64,
    /// Guess for FX-forward nodes.
    pub fx_forward: f64,
    /// Guess for bond nodes, whose dirty-price quote is not rate-scale.
    pub bond: f64,
}

impl Default for InitialGuessConfig {
    fn default() -> Self {
        Self {
            swap_future: 0.01,
            fx_forward: 0.02,
            bond: 0.02,
        }
    }
}

impl InitialGuessConfig {
    /// The starting parameter value for `node` quoted at `market_value`.
    #[must_use]
    pub fn guess(&self, node: &CurveNode, market_value: f64) -> f64 {
        match node {
            CurveNode::RateFuture { .. } => 1.0 - market_value,
            CurveNode::DeliverableSwapFuture { .. } => self.swap_future,
            CurveNode::FxForward { .. } => self.fx_forward,
            CurveNode::Bond { .. } => self.bond,
            _ => market_value,
        }
    }
}

/// Converts curve nodes into time-coordinate instruments.
pub struct NodeConverter<'a> {
    valuation: Date,
    fixings: &'a dyn FixingSource,
}

impl<'a> NodeConverter<'a> {
    /// Creates a converter anchored at `valuation`.
    pub fn new(valuation: Date, fixings: &'a dyn FixingSource) -> Self {
        Self { valuation, fixings }
    }

    /// The valuation date times are measured from.
    #[must_use]
    pub fn valuation(&self) -> Date {
        self.valuation
    }

    /// Converts one node, fetching its quote from `snapshot`.
    ///
    /// # Errors
    ///
    /// Fails when the snapshot has no value for the node's identifier,
    /// when a required fixing is absent, or on date arithmetic failures.
    pub fn convert(
        &self,
        curve: &str,
        node: &CurveNodeWithId,
        snapshot: &dyn MarketDataSnapshot,
    ) -> CurveResult<Instrument> {
        let value = snapshot
            .value(curve, &node.id)
            .ok_or_else(|| CurveError::missing_market_data(curve, node.id.as_str()))?;
        self.build(&node.node, &node.id, value)
    }

    fn build(&self, node: &CurveNode, id: &MarketDataId, value: f64) -> CurveResult<Instrument> {
        match node {
            CurveNode::Cash {
                currency,
                start,
                tenor,
                day_count,
                index,
            } => {
                let s = start.advance(self.valuation)?;
                let e = tenor.advance(s)?;
                Ok(Instrument::Cash {
                    currency: *currency,
                    projection: index.clone().map(ForwardRateKey::Ibor),
                    start: self.time(s),
                    end: self.time(e),
                    accrual: day_count.year_fraction(s, e),
                    rate: value,
                })
            }
            CurveNode::Fra { index, start } => {
                let s = start.advance(self.valuation)?;
                let e = index.tenor.advance(s)?;
                Ok(Instrument::Fra {
                    currency: index.currency,
                    projection: ForwardRateKey::Ibor(index.clone()),
                    start: self.time(s),
                    end: self.time(e),
                    accrual: index.day_count.year_fraction(s, e),
                    rate: value,
                    first_fixing: None,
                })
            }
            CurveNode::Swap {
                currency,
                projection,
                tenor,
                fixed_frequency,
                fixed_day_count,
            } => Ok(Instrument::Swap(self.swap(
                *currency,
                projection.clone(),
                self.valuation,
                *tenor,
                *fixed_frequency,
                *fixed_day_count,
                value,
                None,
            )?)),
            CurveNode::BasisSwap {
                currency,
                pay,
                receive,
                tenor,
            } => {
                let end = tenor.advance(self.valuation)?;
                Ok(Instrument::BasisSwap {
                    currency: *currency,
                    pay: (
                        pay.clone(),
                        self.float_schedule(pay, self.valuation, end)?,
                    ),
                    receive: (
                        receive.clone(),
                        self.float_schedule(receive, self.valuation, end)?,
                    ),
                    spread: value,
                })
            }
            CurveNode::RateFuture { index, start } => {
                let s = start.advance(self.valuation)?;
                let e = index.tenor.advance(s)?;
                Ok(Instrument::RateFuture {
                    currency: index.currency,
                    projection: ForwardRateKey::Ibor(index.clone()),
                    start: self.time(s),
                    end: self.time(e),
                    accrual: index.day_count.year_fraction(s, e),
                    price: value,
                })
            }
            CurveNode::DeliverableSwapFuture {
                currency,
                index,
                start,
                underlying_tenor,
                fixed_rate,
                fixed_frequency,
                fixed_day_count,
            } => {
                let expiry = start.advance(self.valuation)?;
                let underlying = self.swap(
                    *currency,
                    ForwardRateKey::Ibor(index.clone()),
                    expiry,
                    *underlying_tenor,
                    *fixed_frequency,
                    *fixed_day_count,
                    *fixed_rate,
                    None,
                )?;
                Ok(Instrument::SwapFuture {
                    expiry: self.time(expiry),
                    underlying,
                    price: value,
                })
            }
            CurveNode::FxForward {
                base,
                counter,
                tenor,
            } => Ok(Instrument::FxForward {
                base: *base,
                counter: *counter,
                maturity: self.time(tenor.advance(self.valuation)?),
                forward: value,
            }),
            CurveNode::Bond {
                issuer,
                currency,
                tenor,
                coupon,
                frequency,
                day_count,
            } => {
                let end = tenor.advance(self.valuation)?;
                let coupons =
                    self.fixed_schedule(self.valuation, end, *frequency, *day_count)?;
                Ok(Instrument::Bond {
                    issuer: issuer.clone(),
                    currency: *currency,
                    coupons,
                    coupon_rate: *coupon,
                    maturity: self.time(end),
                    price: value,
                })
            }
            CurveNode::InflationSwap { index, tenor } => {
                let base_index = self.required_fixing(id)?;
                Ok(Instrument::InflationSwap {
                    index: index.clone(),
                    maturity: self.time(tenor.advance(self.valuation)?),
                    base_index,
                    rate: value,
                })
            }
            CurveNode::RollDateFra { index, roll } => {
                let fixing = self.required_fixing(id)?;
                let s = self.roll_date(*roll)?;
                let e = index.tenor.advance(s)?;
                Ok(Instrument::Fra {
                    currency: index.currency,
                    projection: ForwardRateKey::Ibor(index.clone()),
                    start: self.time(s),
                    end: self.time(e),
                    accrual: index.day_count.year_fraction(s, e),
                    rate: value,
                    first_fixing: Some(fixing),
                })
            }
            CurveNode::RollDateSwap {
                currency,
                index,
                roll,
                tenor,
                fixed_frequency,
                fixed_day_count,
            } => {
                let fixing = self.required_fixing(id)?;
                let start = self.roll_date(*roll)?;
                Ok(Instrument::Swap(self.swap(
                    *currency,
                    ForwardRateKey::Ibor(index.clone()),
                    start,
                    *tenor,
                    *fixed_frequency,
                    *fixed_day_count,
                    value,
                    Some(fixing),
                )?))
            }
            CurveNode::DiscountFactor { currency, tenor } => Ok(Instrument::Direct {
                currency: *currency,
                quote: DirectQuote::DiscountFactor,
                time: self.time(tenor.advance(self.valuation)?),
                value,
            }),
            CurveNode::ContinuousRate { currency, tenor } => Ok(Instrument::Direct {
                currency: *currency,
                quote: DirectQuote::ContinuousRate,
                time: self.time(tenor.advance(self.valuation)?),
                value,
            }),
            CurveNode::PeriodicRate {
                currency,
                tenor,
                periods_per_year,
            } => Ok(Instrument::Direct {
                currency: *currency,
                quote: DirectQuote::PeriodicRate {
                    periods_per_year: *periods_per_year,
                },
                time: self.time(tenor.advance(self.valuation)?),
                value,
            }),
        }
    }

    fn time(&self, date: Date) -> f64 {
        self.valuation.year_fraction_to(date)
    }

    fn required_fixing(&self, id: &MarketDataId) -> CurveResult<f64> {
        self.fixings
            .latest_fixing(id, self.valuation)
            .ok_or_else(|| CurveError::MissingFixing {
                id: id.as_str().into(),
                date: self.valuation.to_string(),
            })
    }

    fn roll_date(&self, roll: u32) -> CurveResult<Date> {
        let months = i32::try_from(roll)
            .ok()
            .and_then(|r| r.checked_mul(ROLL_STEP_MONTHS))
            .ok_or_else(|| CurveError::InvalidConfiguration {
                name: "roll-date".into(),
                reason: format!("roll number {roll} out of range"),
            })?;
        Ok(self.valuation.add_months(months)?)
    }

    #[allow(clippy::too_many_arguments)]
    fn swap(
        &self,
        currency: Currency,
        projection: ForwardRateKey,
        start: Date,
        tenor: Tenor,
        fixed_frequency: Frequency,
        fixed_day_count: DayCount,
        fixed_rate: f64,
        first_fixing: Option<f64>,
    ) -> CurveResult<SwapInstrument> {
        let end = tenor.advance(start)?;
        Ok(SwapInstrument {
            currency,
            projection: projection.clone(),
            fixed_periods: self.fixed_schedule(start, end, fixed_frequency, fixed_day_count)?,
            float_periods: self.float_schedule(&projection, start, end)?,
            fixed_rate,
            first_fixing,
        })
    }

    /// Fixed-leg (payment time, accrual) pairs, stepping by the payment
    /// frequency with a short final stub.
    fn fixed_schedule(
        &self,
        start: Date,
        end: Date,
        frequency: Frequency,
        day_count: DayCount,
    ) -> CurveResult<Vec<(f64, f64)>> {
        let step = i32::try_from(frequency.months_per_period()).unwrap_or(i32::MAX);
        let mut periods = Vec::new();
        let mut prev = start;
        let mut i = 1;
        loop {
            let date = start.add_months(i * step)?.min(end);
            periods.push((self.time(date), day_count.year_fraction(prev, date)));
            if date >= end {
                break;
            }
            prev = date;
            i += 1;
        }
        Ok(periods)
    }

    /// Floating-leg periods. Term indices step by their own tenor;
    /// overnight legs pay annually on the compounded rate.
    fn float_schedule(
        &self,
        projection: &ForwardRateKey,
        start: Date,
        end: Date,
    ) -> CurveResult<Vec<FloatPeriod>> {
        let (step, day_count) = match projection {
            ForwardRateKey::Ibor(index) => (tenor_months(index.tenor), index.day_count),
            ForwardRateKey::Overnight(index) => (Some(12), index.day_count),
        };
        let mut periods = Vec::new();
        let mut prev = start;
        match step {
            Some(step) => {
                let step = i32::try_from(step).unwrap_or(i32::MAX);
                let mut i = 1;
                loop {
                    let date = start.add_months(i * step)?.min(end);
                    periods.push(FloatPeriod {
                        start: self.time(prev),
                        end: self.time(date),
                        accrual: day_count.year_fraction(prev, date),
                        pay: self.time(date),
                    });
                    if date >= end {
                        break;
                    }
                    prev = date;
                    i += 1;
                }
            }
            // Day-based index tenors get a single period for the whole leg.
            None => {
                periods.push(FloatPeriod {
                    start: self.time(start),
                    end: self.time(end),
                    accrual: day_count.year_fraction(start, end),
                    pay: self.time(end),
                });
            }
        }
        Ok(periods)
    }
}

fn tenor_months(tenor: Tenor) -> Option<u32> {
    match tenor {
        Tenor::Months(m) => Some(m),
        Tenor::Years(y) => Some(12 * y),
        Tenor::Days(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::InMemoryFixings;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    struct MapSnapshot(HashMap<String, f64>);

    impl MarketDataSnapshot for MapSnapshot {
        fn value(&self, _curve: &str, id: &MarketDataId) -> Option<f64> {
            self.0.get(id.as_str()).copied()
        }
    }

    fn snapshot(entries: &[(&str, f64)]) -> MapSnapshot {
        MapSnapshot(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        )
    }

    fn converter_inputs() -> (Date, InMemoryFixings) {
        (Date::from_ymd(2024, 3, 15).unwrap(), InMemoryFixings::new())
    }

    #[test]
    fn test_cash_node_times() {
        let (valuation, fixings) = converter_inputs();
        let converter = NodeConverter::new(valuation, &fixings);
        let node = CurveNodeWithId {
            id: MarketDataId::new("USD-DEPO-3M"),
            node: CurveNode::Cash {
                currency: Currency::USD,
                start: Tenor::ZERO,
                tenor: Tenor::months(3),
                day_count: DayCount::Act360,
                index: None,
            },
        };
        let instrument = converter
            .convert("USD-OIS", &node, &snapshot(&[("USD-DEPO-3M", 0.031)]))
            .unwrap();
        let Instrument::Cash { start, end, accrual, rate, .. } = instrument else {
            panic!("expected cash instrument");
        };
        assert_relative_eq!(start, 0.0);
        // 2024-03-15 -> 2024-06-15 is 92 days
        assert_relative_eq!(end, 92.0 / 365.0);
        assert_relative_eq!(accrual, 92.0 / 360.0);
        assert_relative_eq!(rate, 0.031);
    }

    #[test]
    fn test_missing_quote_names_identifier() {
        let (valuation, fixings) = converter_inputs();
        let converter = NodeConverter::new(valuation, &fixings);
        let node = CurveNodeWithId {
            id: MarketDataId::new("USD-DEPO-6M"),
            node: CurveNode::Cash {
                currency: Currency::USD,
                start: Tenor::ZERO,
                tenor: Tenor::months(6),
                day_count: DayCount::Act360,
                index: None,
            },
        };
        let err = converter
            .convert("USD-OIS", &node, &snapshot(&[]))
            .unwrap_err();
        match err {
            CurveError::MissingMarketData { curve, id } => {
                assert_eq!(curve, "USD-OIS");
                assert_eq!(id, "USD-DEPO-6M");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_swap_node_schedules() {
        let (valuation, fixings) = converter_inputs();
        let converter = NodeConverter::new(valuation, &fixings);
        let node = CurveNodeWithId {
            id: MarketDataId::new("EUR-IRS-2Y"),
            node: CurveNode::Swap {
                currency: Currency::EUR,
                projection: ForwardRateKey::Ibor(IborIndex::new(
                    "EURIBOR6M",
                    Currency::EUR,
                    Tenor::months(6),
                )),
                tenor: Tenor::years(2),
                fixed_frequency: Frequency::Annual,
                fixed_day_count: DayCount::Thirty360,
            },
        };
        let instrument = converter
            .convert("EUR-6M", &node, &snapshot(&[("EUR-IRS-2Y", 0.025)]))
            .unwrap();
        let Instrument::Swap(swap) = instrument else {
            panic!("expected swap instrument");
        };
        assert_eq!(swap.fixed_periods.len(), 2);
        assert_eq!(swap.float_periods.len(), 4);
        assert_relative_eq!(swap.fixed_periods[0].1, 1.0);
        assert_relative_eq!(swap.fixed_rate, 0.025);
    }

    #[test]
    fn test_roll_date_fra_requires_fixing() {
        let (valuation, fixings) = converter_inputs();
        let converter = NodeConverter::new(valuation, &fixings);
        let node = CurveNodeWithId {
            id: MarketDataId::new("USD-RDF-1"),
            node: CurveNode::RollDateFra {
                index: IborIndex::new("USDLIBOR3M", Currency::USD, Tenor::months(3)),
                roll: 1,
            },
        };
        let err = converter
            .convert("USD-3M", &node, &snapshot(&[("USD-RDF-1", 0.03)]))
            .unwrap_err();
        assert!(matches!(err, CurveError::MissingFixing { .. }));
    }

    #[test]
    fn test_absurd_roll_number_is_rejected() {
        let (valuation, _) = converter_inputs();
        let fixings = InMemoryFixings::new().with_fixing("USD-RDF-HUGE", valuation, 0.0295);
        let converter = NodeConverter::new(valuation, &fixings);
        let node = CurveNodeWithId {
            id: MarketDataId::new("USD-RDF-HUGE"),
            node: CurveNode::RollDateFra {
                index: IborIndex::new("USDLIBOR3M", Currency::USD, Tenor::months(3)),
                roll: u32::MAX,
            },
        };
        let err = converter
            .convert("USD-3M", &node, &snapshot(&[("USD-RDF-HUGE", 0.03)]))
            .unwrap_err();
        assert!(matches!(err, CurveError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_futures_guess_is_one_minus_price() {
        let guesses = InitialGuessConfig::default();
        let node = CurveNode::RateFuture {
            index: IborIndex::new("USDLIBOR3M", Currency::USD, Tenor::months(3)),
            start: Tenor::months(1),
        };
        assert_relative_eq!(guesses.guess(&node, 0.9875), 0.0125);
    }
}
