//! Error types for curve construction.
//!
//! Everything that can go wrong between reading a configuration and
//! publishing a calibrated provider surfaces here, with enough context
//! (curve name, market-data identifier, group index) to pinpoint the
//! offending input.

use curveforge_core::CoreError;
use curveforge_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve construction operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve construction.
#[derive(Error, Debug, Clone)]
pub enum CurveError {
    /// No market quote for a curve node.
    #[error("No market value for identifier '{id}' on curve '{curve}'")]
    MissingMarketData {
        /// Curve whose node required the quote.
        curve: String,
        /// The market-data identifier that came back empty.
        id: String,
    },

    /// No historical fixing for a node that requires one.
    #[error("No fixing on or before {date} for identifier '{id}'")]
    MissingFixing {
        /// Identifier the fixing series is keyed by.
        id: String,
        /// Latest acceptable fixing date.
        date: String,
    },

    /// The named construction configuration does not exist.
    #[error("Unknown curve construction configuration '{name}'")]
    MissingConfiguration {
        /// Configuration name that failed to resolve.
        name: String,
    },

    /// A curve in the configuration has no definition.
    #[error("No definition for curve '{curve}'")]
    MissingDefinition {
        /// Curve name.
        curve: String,
    },

    /// A curve in the configuration has no node specification.
    #[error("No specification for curve '{curve}'")]
    MissingSpecification {
        /// Curve name.
        curve: String,
    },

    /// An exogenous configuration has no published bundle.
    #[error("No published bundle for exogenous configuration '{name}'")]
    MissingExogenous {
        /// Exogenous configuration name.
        name: String,
    },

    /// A curve lookup on the provider failed.
    #[error("Curve '{name}' is not present in the provider")]
    MissingCurve {
        /// Requested curve name.
        name: String,
    },

    /// No curve registered for a discounting, forward, issuer or
    /// inflation role.
    #[error("No curve registered for {role}")]
    MissingRole {
        /// Description of the unresolved role key.
        role: String,
    },

    /// A role in the configuration is outside the variant's capability set.
    #[error("Variant '{variant}' does not support role {role} on curve '{curve}'")]
    UnsupportedRole {
        /// Construction variant name.
        variant: String,
        /// Offending role description.
        role: String,
        /// Curve carrying the role.
        curve: String,
    },

    /// A node archetype the converter cannot turn into an instrument.
    #[error("Node kind '{kind}' on curve '{curve}' is not supported here")]
    UnsupportedNode {
        /// Node archetype name.
        kind: String,
        /// Curve carrying the node.
        curve: String,
    },

    /// Interpolated (no-solve) construction requires homogeneous direct nodes.
    #[error("Curve '{curve}' mixes direct node kinds '{first}' and '{second}'")]
    MixedDirectNodeKinds {
        /// Curve name.
        curve: String,
        /// Kind of the first node.
        first: String,
        /// Kind of the conflicting node.
        second: String,
    },

    /// A calibration group is not square.
    #[error(
        "Group {group} is ill-posed: {instruments} instruments against {parameters} parameters"
    )]
    IllPosedSystem {
        /// Zero-based group index within the configuration.
        group: usize,
        /// Total instruments in the group.
        instruments: usize,
        /// Total curve parameters in the group.
        parameters: usize,
    },

    /// A single curve's instrument count does not match its parameter count.
    #[error("Curve '{curve}' has {instruments} instruments but {parameters} parameters")]
    BundleSizeMismatch {
        /// Curve name.
        curve: String,
        /// Instrument count.
        instruments: usize,
        /// Generator parameter count.
        parameters: usize,
    },

    /// The construction variant needs model parameters that were not supplied.
    #[error("Variant '{variant}' requires {required} model parameters")]
    ModelParametersRequired {
        /// Construction variant name.
        variant: String,
        /// Required parameter kind.
        required: String,
    },

    /// Two curves with the same name in one provider.
    #[error("Curve '{name}' is already present")]
    DuplicateCurve {
        /// Duplicated curve name.
        name: String,
    },

    /// A building block's ranges do not partition the parameter vector.
    #[error("Building block ranges do not partition [0, {total}): {detail}")]
    BlockPartition {
        /// Expected total parameter count.
        total: usize,
        /// What went wrong.
        detail: String,
    },

    /// An FX rate between two currencies cannot be derived.
    #[error("No FX rate between {base} and {counter}")]
    MissingFxRate {
        /// Base currency code.
        base: String,
        /// Counter currency code.
        counter: String,
    },

    /// Curve data is invalid (empty, non-monotonic, non-positive, ...).
    #[error("Invalid curve '{curve}': {reason}")]
    InvalidCurve {
        /// Curve name.
        curve: String,
        /// Description of the problem.
        reason: String,
    },

    /// A configuration is internally inconsistent.
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfiguration {
        /// Configuration name.
        name: String,
        /// Description of the problem.
        reason: String,
    },

    /// Error from the math layer (root finding, inversion, interpolation).
    #[error(transparent)]
    Math(#[from] MathError),

    /// Error from the core layer (dates, tenors).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CurveError {
    /// Creates a `MissingMarketData` error.
    pub fn missing_market_data(curve: impl Into<String>, id: impl Into<String>) -> Self {
        Self::MissingMarketData {
            curve: curve.into(),
            id: id.into(),
        }
    }

    /// Creates a `MissingCurve` error.
    pub fn missing_curve(name: impl Into<String>) -> Self {
        Self::MissingCurve { name: name.into() }
    }

    /// Creates an `InvalidCurve` error.
    pub fn invalid_curve(curve: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCurve {
            curve: curve.into(),
            reason: reason.into(),
        }
    }
}
