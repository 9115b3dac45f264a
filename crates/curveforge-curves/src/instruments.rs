//! Calibration instruments in time-coordinate form.
//!
//! The node converter resolves every date in a node to a year fraction from
//! the valuation date, so instruments carry only times, accrual fractions
//! and the market quote. Pricing then needs nothing but a provider. All
//! floating forwards are projected off pseudo-discount-factor curves:
//! `fwd = (P(t1)/P(t2) - 1) / accrual` on the curve keyed by the
//! instrument's [`ForwardRateKey`].

use curveforge_core::Currency;
use serde::{Deserialize, Serialize};

use crate::index::{ForwardRateKey, IssuerKey, PriceIndex};

/// One floating accrual period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatPeriod {
    /// Forward period start time.
    pub start: f64,
    /// Forward period end time.
    pub end: f64,
    /// Accrual fraction for the period.
    pub accrual: f64,
    /// Payment time (discounting).
    pub pay: f64,
}

/// A fixed-for-floating swap in time coordinates.
///
/// Shared by par swaps, roll-date swaps and the deliverable swap future's
/// underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapInstrument {
    /// Discounting currency.
    pub currency: Currency,
    /// Projection key for the floating leg.
    pub projection: ForwardRateKey,
    /// Fixed-leg (payment time, accrual fraction) pairs.
    pub fixed_periods: Vec<(f64, f64)>,
    /// Floating-leg periods.
    pub float_periods: Vec<FloatPeriod>,
    /// Quoted fixed rate.
    pub fixed_rate: f64,
    /// Known fixing applied to the first floating period when it has
    /// already started.
    pub first_fixing: Option<f64>,
}

/// What a direct (no-solve) node quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectQuote {
    /// A discount factor.
    DiscountFactor,
    /// A continuously compounded zero rate.
    ContinuousRate,
    /// A periodically compounded rate.
    PeriodicRate {
        /// Compounding periods per year.
        periods_per_year: u32,
    },
}

impl DirectQuote {
    /// Short name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DiscountFactor => "discount-factor",
            Self::ContinuousRate => "continuous-rate",
            Self::PeriodicRate { .. } => "periodic-rate",
        }
    }
}

/// A calibration instrument with its market quote.
///
/// Each variant's par spread is zero exactly when the candidate curves
/// reprice the quote; see the valuation calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instrument {
    /// A deposit: single period, simply compounded quoted rate.
    Cash {
        /// Discounting currency.
        currency: Currency,
        /// Projection key when the deposit tracks an index curve.
        projection: Option<ForwardRateKey>,
        /// Period start time.
        start: f64,
        /// Period end time.
        end: f64,
        /// Accrual fraction.
        accrual: f64,
        /// Quoted rate.
        rate: f64,
    },
    /// A forward rate agreement on an index.
    Fra {
        /// Discounting currency.
        currency: Currency,
        /// Projection key.
        projection: ForwardRateKey,
        /// Forward period start time.
        start: f64,
        /// Forward period end time.
        end: f64,
        /// Accrual fraction.
        accrual: f64,
        /// Quoted forward rate.
        rate: f64,
        /// Known fixing when the period has already started.
        first_fixing: Option<f64>,
    },
    /// A par fixed-for-floating swap quoted by its fixed rate.
    Swap(SwapInstrument),
    /// A float-for-float basis swap quoted by the spread on the pay leg.
    BasisSwap {
        /// Discounting currency.
        currency: Currency,
        /// Spread leg periods with their projection key.
        pay: (ForwardRateKey, Vec<FloatPeriod>),
        /// Flat leg periods with their projection key.
        receive: (ForwardRateKey, Vec<FloatPeriod>),
        /// Quoted spread added to the pay leg.
        spread: f64,
    },
    /// An interest-rate future quoted in price terms (100 - rate, scaled
    /// to 1).
    RateFuture {
        /// Discounting currency.
        currency: Currency,
        /// Projection key of the underlying rate.
        projection: ForwardRateKey,
        /// Underlying period start time (futures expiry).
        start: f64,
        /// Underlying period end time.
        end: f64,
        /// Accrual fraction of the underlying period.
        accrual: f64,
        /// Quoted price, e.g. 0.9875.
        price: f64,
    },
    /// A deliverable swap future quoted in price terms.
    SwapFuture {
        /// Futures expiry / delivery time.
        expiry: f64,
        /// The underlying swap, starting at delivery.
        underlying: SwapInstrument,
        /// Quoted price, e.g. 1.0050.
        price: f64,
    },
    /// An FX forward quoted as the outright forward rate.
    FxForward {
        /// Base currency (one unit bought forward).
        base: Currency,
        /// Counter currency.
        counter: Currency,
        /// Settlement time.
        maturity: f64,
        /// Quoted outright forward (counter per base).
        forward: f64,
    },
    /// A fixed-coupon bond quoted by its dirty price.
    Bond {
        /// Issuer key for discounting.
        issuer: IssuerKey,
        /// Settlement currency.
        currency: Currency,
        /// Coupon (payment time, accrual fraction) pairs.
        coupons: Vec<(f64, f64)>,
        /// Annualized coupon rate.
        coupon_rate: f64,
        /// Redemption time.
        maturity: f64,
        /// Quoted dirty price per unit notional.
        price: f64,
    },
    /// A zero-coupon inflation swap quoted by its fixed rate.
    InflationSwap {
        /// Price index of the floating leg.
        index: PriceIndex,
        /// Maturity time.
        maturity: f64,
        /// Index level fixed at the start of the swap.
        base_index: f64,
        /// Quoted annualized fixed rate.
        rate: f64,
    },
    /// A direct quote of a curve ordinate. Only meaningful for
    /// interpolated (no-solve) construction or trivially-solved curves.
    Direct {
        /// Discounting currency the quote belongs to.
        currency: Currency,
        /// What is quoted.
        quote: DirectQuote,
        /// Node time.
        time: f64,
        /// Quoted value.
        value: f64,
    },
}

impl Instrument {
    /// Short name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Cash { .. } => "cash",
            Self::Fra { .. } => "fra",
            Self::Swap(_) => "swap",
            Self::BasisSwap { .. } => "basis-swap",
            Self::RateFuture { .. } => "rate-future",
            Self::SwapFuture { .. } => "swap-future",
            Self::FxForward { .. } => "fx-forward",
            Self::Bond { .. } => "bond",
            Self::InflationSwap { .. } => "inflation-swap",
            Self::Direct { .. } => "direct",
        }
    }

    /// The quoted market value the instrument calibrates to.
    #[must_use]
    pub fn quote(&self) -> f64 {
        match self {
            Self::Cash { rate, .. } | Self::Fra { rate, .. } => *rate,
            Self::Swap(swap) => swap.fixed_rate,
            Self::BasisSwap { spread, .. } => *spread,
            Self::RateFuture { price, .. } | Self::SwapFuture { price, .. } => *price,
            Self::FxForward { forward, .. } => *forward,
            Self::Bond { price, .. } => *price,
            Self::InflationSwap { rate, .. } => *rate,
            Self::Direct { value, .. } => *value,
        }
    }

    /// Time of the last cash flow, used as the node time when curve node
    /// dates follow instrument maturities.
    #[must_use]
    pub fn last_time(&self) -> f64 {
        match self {
            Self::Cash { end, .. } | Self::Fra { end, .. } => *end,
            Self::Swap(swap) => swap_last_time(swap),
            Self::BasisSwap { pay, receive, .. } => {
                let pay_last = periods_last_time(&pay.1);
                let receive_last = periods_last_time(&receive.1);
                pay_last.max(receive_last)
            }
            Self::RateFuture { end, .. } => *end,
            Self::SwapFuture { underlying, .. } => swap_last_time(underlying),
            Self::FxForward { maturity, .. } => *maturity,
            Self::Bond { maturity, .. } => *maturity,
            Self::InflationSwap { maturity, .. } => *maturity,
            Self::Direct { time, .. } => *time,
        }
    }
}

fn periods_last_time(periods: &[FloatPeriod]) -> f64 {
    periods
        .iter()
        .map(|p| p.pay.max(p.end))
        .fold(0.0, f64::max)
}

fn swap_last_time(swap: &SwapInstrument) -> f64 {
    let fixed_last = swap
        .fixed_periods
        .iter()
        .map(|(pay, _)| *pay)
        .fold(0.0, f64::max);
    fixed_last.max(periods_last_time(&swap.float_periods))
}
