//! # Curveforge Curves
//!
//! Multi-curve bootstrapping for the Curveforge analytics library.
//!
//! This crate provides:
//!
//! - **Configuration**: Named construction recipes of ordered curve groups
//! - **Nodes**: Instrument-archetype curve nodes and their conversion to
//!   time-coordinate calibration instruments
//! - **Calibration**: Joint par-spread root finding per group, sequential
//!   across groups, via the [`repository::CurveBuildingRepository`]
//! - **Provider**: An immutable multi-curve environment with role-based
//!   curve resolution and FX rates
//! - **Blocks**: Per-curve inverse-Jacobian bookkeeping mapping curve
//!   parameters back to the original market quotes
//! - **Driver**: A [`driver::CalibrationDriver`] generic over construction
//!   variants (discounting, Hull-White, G2++, inflation, issuer)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use curveforge_curves::prelude::*;
//!
//! let driver = CalibrationDriver::new(&configs, &snapshot, &fixings, &published);
//! let request = ConstructionRequest::new("USD-STANDARD", valuation);
//! let result = driver.construct(&request, &VariantCapabilities::discounting())?;
//!
//! let df = result.provider.discount_factor(Currency::USD, 5.0)?;
//! let (block, jacobian) = result.blocks.get("USD-OIS").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod blocks;
pub mod bundles;
pub mod calculators;
pub mod config;
pub mod curves;
pub mod driver;
pub mod error;
pub mod generator;
pub mod index;
pub mod instruments;
pub mod market;
pub mod model_params;
pub mod nodes;
pub mod provider;
pub mod repository;

pub use error::{CurveError, CurveResult};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::blocks::{CurveBuildingBlock, CurveBuildingBlockBundle};
    pub use crate::bundles::{MultiCurveBundle, SingleCurveBundle};
    pub use crate::calculators::{
        FiniteDifferenceSensitivity, ParSpreadDiscountingCalculator, ParSpreadG2ppCalculator,
        ParSpreadHullWhiteCalculator, SensitivityCalculator, ValuationCalculator,
    };
    pub use crate::config::{
        CurveConstructionConfiguration, CurveDefinition, CurveGroupConfiguration, CurveNodeWithId,
        CurveRole, CurveSpecification, MarketDataId,
    };
    pub use crate::curves::{CalibratedCurve, CurveValueKind};
    pub use crate::driver::{
        CalibrationDriver, ConstructionRequest, ConstructionResult, VariantCapabilities,
    };
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::generator::CurveGenerator;
    pub use crate::index::{ForwardRateKey, IborIndex, IssuerKey, OvernightIndex, PriceIndex};
    pub use crate::instruments::{DirectQuote, FloatPeriod, Instrument, SwapInstrument};
    pub use crate::market::{
        ConfigurationSource, CurveBundleSource, FixingSource, InMemoryBundles,
        InMemoryConfigurationSource, InMemoryFixings, InMemorySnapshot, MarketDataSnapshot,
    };
    pub use crate::model_params::{
        FactorTermStructureIds, G2Parameters, HullWhiteParameters, ModelKind,
        ModelParameterDefaults, ModelParameters, TermStructureAssembler, VolatilityTermStructure,
    };
    pub use crate::nodes::{CurveNode, InitialGuessConfig, NodeConverter};
    pub use crate::provider::{CurveRegistrations, FxMatrix, MulticurveProvider};
    pub use crate::repository::CurveBuildingRepository;
}
