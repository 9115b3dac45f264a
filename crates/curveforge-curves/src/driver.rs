//! The construction driver: from a named configuration to a calibrated
//! provider.
//!
//! The driver owns the end-to-end plumbing (configuration lookup,
//! exogenous seeding, node conversion, group assembly, publication) and
//! is generic over a [`VariantCapabilities`] record saying what a
//! construction variant supports: which roles it accepts, how it prices,
//! and whether it needs model parameters. Adding a variant means adding a
//! record, not a new driver.

use nalgebra::DMatrix;
use std::sync::Arc;
use tracing::info;

use curveforge_core::Date;

use crate::blocks::{CurveBuildingBlock, CurveBuildingBlockBundle};
use crate::bundles::{MultiCurveBundle, SingleCurveBundle};
use crate::calculators::{
    FiniteDifferenceSensitivity, ParSpreadDiscountingCalculator, ParSpreadG2ppCalculator,
    ParSpreadHullWhiteCalculator, ValuationCalculator,
};
use crate::config::{CurveConstructionConfiguration, CurveDefinition, CurveRole};
use crate::curves::{CalibratedCurve, CurveValueKind};
use crate::error::{CurveError, CurveResult};
use crate::generator::CurveGenerator;
use crate::instruments::{DirectQuote, Instrument};
use crate::market::{ConfigurationSource, CurveBundleSource, FixingSource, MarketDataSnapshot};
use crate::model_params::{ModelKind, ModelParameters};
use crate::nodes::{InitialGuessConfig, NodeConverter};
use crate::provider::{CurveRegistrations, FxMatrix, MulticurveProvider};
use crate::repository::CurveBuildingRepository;

/// What one construction variant supports.
pub struct VariantCapabilities {
    name: &'static str,
    accepts: fn(&CurveRole) -> bool,
    valuation: Box<dyn ValuationCalculator>,
    requires_model: Option<ModelKind>,
}

fn rates_role(role: &CurveRole) -> bool {
    matches!(
        role,
        CurveRole::Discounting(_) | CurveRole::IborForward(_) | CurveRole::OvernightForward(_)
    )
}

impl VariantCapabilities {
    /// Pure multi-curve discounting: rates roles, no model.
    #[must_use]
    pub fn discounting() -> Self {
        Self {
            name: "discounting",
            accepts: rates_role,
            valuation: Box::new(ParSpreadDiscountingCalculator),
            requires_model: None,
        }
    }

    /// Rates roles with Hull-White futures convexity.
    #[must_use]
    pub fn hull_white() -> Self {
        Self {
            name: "hull-white",
            accepts: rates_role,
            valuation: Box::new(ParSpreadHullWhiteCalculator),
            requires_model: Some(ModelKind::HullWhiteOneFactor),
        }
    }

    /// Rates roles with G2++ futures convexity.
    #[must_use]
    pub fn g2pp() -> Self {
        Self {
            name: "g2pp",
            accepts: rates_role,
            valuation: Box::new(ParSpreadG2ppCalculator),
            requires_model: Some(ModelKind::G2pp),
        }
    }

    /// Rates roles plus inflation curves.
    #[must_use]
    pub fn inflation() -> Self {
        Self {
            name: "inflation",
            accepts: |role| rates_role(role) || matches!(role, CurveRole::Inflation(_)),
            valuation: Box::new(ParSpreadDiscountingCalculator),
            requires_model: None,
        }
    }

    /// Rates roles plus issuer curves.
    #[must_use]
    pub fn issuer() -> Self {
        Self {
            name: "issuer",
            accepts: |role| rates_role(role) || matches!(role, CurveRole::Issuer(_)),
            valuation: Box::new(ParSpreadDiscountingCalculator),
            requires_model: None,
        }
    }

    /// Variant name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Inputs of one construction run.
#[derive(Debug, Clone)]
pub struct ConstructionRequest {
    /// Name of the construction configuration.
    pub configuration: String,
    /// Valuation date all times are measured from.
    pub valuation: Date,
    /// FX rates for cross-currency nodes.
    pub fx: FxMatrix,
    /// Model parameters, for variants that need them.
    pub model: Option<ModelParameters>,
}

impl ConstructionRequest {
    /// A request with no FX rates and no model.
    pub fn new(configuration: impl Into<String>, valuation: Date) -> Self {
        Self {
            configuration: configuration.into(),
            valuation,
            fx: FxMatrix::new(),
            model: None,
        }
    }

    /// Sets the FX matrix.
    #[must_use]
    pub fn with_fx(mut self, fx: FxMatrix) -> Self {
        self.fx = fx;
        self
    }

    /// Sets the model parameters.
    #[must_use]
    pub fn with_model(mut self, model: ModelParameters) -> Self {
        self.model = Some(model);
        self
    }
}

/// Output of one construction run.
#[derive(Debug, Clone)]
pub struct ConstructionResult {
    /// The provider holding exogenous and newly calibrated curves.
    pub provider: MulticurveProvider,
    /// Jacobian blocks for every calibrated curve.
    pub blocks: CurveBuildingBlockBundle,
    /// The curves built by this run, in configuration order.
    pub curves: Vec<(String, Arc<CalibratedCurve>)>,
}

/// Drives construction against pluggable data sources.
pub struct CalibrationDriver<'a> {
    configurations: &'a dyn ConfigurationSource,
    snapshot: &'a dyn MarketDataSnapshot,
    fixings: &'a dyn FixingSource,
    published: &'a dyn CurveBundleSource,
    repository: CurveBuildingRepository,
    sensitivity: FiniteDifferenceSensitivity,
    guesses: InitialGuessConfig,
}

impl<'a> CalibrationDriver<'a> {
    /// Creates a driver over the given sources with default tolerances
    /// and guesses.
    pub fn new(
        configurations: &'a dyn ConfigurationSource,
        snapshot: &'a dyn MarketDataSnapshot,
        fixings: &'a dyn FixingSource,
        published: &'a dyn CurveBundleSource,
    ) -> Self {
        Self {
            configurations,
            snapshot,
            fixings,
            published,
            repository: CurveBuildingRepository::default(),
            sensitivity: FiniteDifferenceSensitivity::default(),
            guesses: InitialGuessConfig::default(),
        }
    }

    /// Overrides the calibration repository (tolerances, iteration cap).
    #[must_use]
    pub fn with_repository(mut self, repository: CurveBuildingRepository) -> Self {
        self.repository = repository;
        self
    }

    /// Overrides the initial-guess configuration.
    #[must_use]
    pub fn with_guesses(mut self, guesses: InitialGuessConfig) -> Self {
        self.guesses = guesses;
        self
    }

    /// Runs a full calibrated construction for `request` under `variant`.
    ///
    /// # Errors
    ///
    /// Fails on unresolvable configurations, missing quotes or fixings,
    /// unsupported roles, missing model parameters, ill-posed groups and
    /// non-convergence.
    pub fn construct(
        &self,
        request: &ConstructionRequest,
        variant: &VariantCapabilities,
    ) -> CurveResult<ConstructionResult> {
        let config = self.configuration(&request.configuration)?;
        if let Some(required) = variant.requires_model {
            let supplied = request.model.as_ref().map(ModelParameters::kind);
            if supplied != Some(required) {
                return Err(CurveError::ModelParametersRequired {
                    variant: variant.name.into(),
                    required: required.name().into(),
                });
            }
        }
        let (known, known_blocks) = self.exogenous_seed(&config, request)?;

        let converter = NodeConverter::new(request.valuation, self.fixings);
        let mut groups = Vec::with_capacity(config.groups.len());
        for group in &config.groups {
            let mut bundles = Vec::with_capacity(group.curves.len());
            for (curve_name, roles) in &group.curves {
                if let Some(role) = roles.iter().find(|role| !(variant.accepts)(role)) {
                    return Err(CurveError::UnsupportedRole {
                        variant: variant.name.into(),
                        role: role.to_string(),
                        curve: curve_name.clone(),
                    });
                }
                bundles.push(self.curve_bundle(&converter, curve_name, roles)?);
            }
            groups.push(MultiCurveBundle::new(bundles));
        }

        let (provider, blocks) = self.repository.make_curves(
            &groups,
            known,
            known_blocks,
            variant.valuation.as_ref(),
            &self.sensitivity,
        )?;
        info!(
            configuration = %config.name,
            variant = variant.name,
            curves = config.curve_names().len(),
            "curve construction complete"
        );
        publish(config.curve_names(), provider, blocks)
    }

    /// Builds curves directly from homogeneous direct-quote nodes, with
    /// no root finding; each curve's block is an identity over its own
    /// quotes.
    ///
    /// # Errors
    ///
    /// Fails when any node is not a direct quote, when a curve mixes
    /// direct quote kinds, or on unresolvable configurations.
    pub fn construct_interpolated(
        &self,
        request: &ConstructionRequest,
    ) -> CurveResult<ConstructionResult> {
        let config = self.configuration(&request.configuration)?;
        let (mut provider, mut blocks) = self.exogenous_seed(&config, request)?;
        let converter = NodeConverter::new(request.valuation, self.fixings);

        for group in &config.groups {
            for (curve_name, roles) in &group.curves {
                let specification = self
                    .configurations
                    .curve_specification(curve_name)
                    .ok_or_else(|| CurveError::MissingSpecification {
                        curve: curve_name.clone(),
                    })?;
                let definition = self
                    .configurations
                    .curve_definition(curve_name)
                    .ok_or_else(|| CurveError::MissingDefinition {
                        curve: curve_name.clone(),
                    })?;
                let mut times = Vec::with_capacity(specification.nodes.len());
                let mut values = Vec::with_capacity(specification.nodes.len());
                let mut kind: Option<DirectQuote> = None;
                for node in &specification.nodes {
                    let quote = node.node.direct_quote().ok_or_else(|| {
                        CurveError::UnsupportedNode {
                            kind: node.node.kind_name().into(),
                            curve: curve_name.clone(),
                        }
                    })?;
                    match kind {
                        None => kind = Some(quote),
                        Some(first) if first != quote => {
                            return Err(CurveError::MixedDirectNodeKinds {
                                curve: curve_name.clone(),
                                first: first.name().into(),
                                second: quote.name().into(),
                            });
                        }
                        Some(_) => {}
                    }
                    let Instrument::Direct { time, value, .. } =
                        converter.convert(curve_name, node, self.snapshot)?
                    else {
                        return Err(CurveError::UnsupportedNode {
                            kind: node.node.kind_name().into(),
                            curve: curve_name.clone(),
                        });
                    };
                    times.push(time);
                    values.push(value);
                }
                let kind = match kind {
                    Some(DirectQuote::DiscountFactor) => CurveValueKind::DiscountFactor,
                    Some(DirectQuote::PeriodicRate { periods_per_year }) => {
                        CurveValueKind::PeriodicRate { periods_per_year }
                    }
                    // Continuous rates and the empty-node degenerate case.
                    _ => CurveValueKind::ZeroRate,
                };
                let (interpolation, left, right) = match &definition {
                    CurveDefinition::Interpolated {
                        interpolation,
                        left,
                        right,
                    }
                    | CurveDefinition::FixedDate {
                        interpolation,
                        left,
                        right,
                        ..
                    } => (*interpolation, *left, *right),
                };
                let n = times.len();
                let curve = Arc::new(CalibratedCurve::new(
                    curve_name.clone(),
                    times,
                    values,
                    kind,
                    interpolation,
                    left,
                    right,
                )?);
                provider = provider.with_curve(curve, &registrations_for(roles))?;
                let block = CurveBuildingBlock::new(vec![(curve_name.clone(), (0, n))])?;
                blocks.add(curve_name.clone(), block, DMatrix::identity(n, n));
            }
        }
        publish(config.curve_names(), provider, blocks)
    }

    fn configuration(
        &self,
        name: &str,
    ) -> CurveResult<CurveConstructionConfiguration> {
        let config = self
            .configurations
            .construction_configuration(name)
            .ok_or_else(|| CurveError::MissingConfiguration { name: name.into() })?;
        config.validate()?;
        Ok(config)
    }

    /// The known data a run starts from: the request's FX and model plus
    /// every exogenous configuration's published curves and blocks.
    fn exogenous_seed(
        &self,
        config: &CurveConstructionConfiguration,
        request: &ConstructionRequest,
    ) -> CurveResult<(MulticurveProvider, CurveBuildingBlockBundle)> {
        let mut provider = MulticurveProvider::new(request.fx.clone(), request.model.clone());
        let mut blocks = CurveBuildingBlockBundle::new();
        for name in &config.exogenous {
            let (published, published_blocks) =
                self.published.published_bundle(name).ok_or_else(|| {
                    CurveError::MissingExogenous { name: name.clone() }
                })?;
            provider = provider.merged_with(&published)?;
            blocks.extend_from(&published_blocks);
        }
        Ok((provider, blocks))
    }

    fn curve_bundle(
        &self,
        converter: &NodeConverter<'_>,
        curve_name: &str,
        roles: &[CurveRole],
    ) -> CurveResult<SingleCurveBundle> {
        let specification = self
            .configurations
            .curve_specification(curve_name)
            .ok_or_else(|| CurveError::MissingSpecification {
                curve: curve_name.into(),
            })?;
        let definition = self
            .configurations
            .curve_definition(curve_name)
            .ok_or_else(|| CurveError::MissingDefinition {
                curve: curve_name.into(),
            })?;

        let mut instruments = Vec::with_capacity(specification.nodes.len());
        let mut guesses = Vec::with_capacity(specification.nodes.len());
        for node in &specification.nodes {
            let value = self
                .snapshot
                .value(curve_name, &node.id)
                .ok_or_else(|| CurveError::missing_market_data(curve_name, node.id.as_str()))?;
            let instrument = converter.convert(curve_name, node, self.snapshot)?;
            // Price-index parameters start from the level the base fixing
            // and the quoted rate project, not from the rate itself.
            let guess = match &instrument {
                Instrument::InflationSwap {
                    base_index,
                    maturity,
                    rate,
                    ..
                } => base_index * (1.0 + rate).powf(*maturity),
                _ => self.guesses.guess(&node.node, value),
            };
            guesses.push(guess);
            instruments.push(instrument);
        }

        let kind = if roles.iter().any(|r| matches!(r, CurveRole::Inflation(_))) {
            CurveValueKind::PriceIndex
        } else {
            CurveValueKind::ZeroRate
        };
        let generator = match &definition {
            CurveDefinition::Interpolated {
                interpolation,
                left,
                right,
            } => CurveGenerator::interpolated(
                curve_name,
                &instruments,
                kind,
                *interpolation,
                *left,
                *right,
            ),
            CurveDefinition::FixedDate {
                dates,
                anchor,
                interpolation,
                left,
                right,
            } => CurveGenerator::fixed_date(
                curve_name,
                converter.valuation(),
                dates,
                *anchor,
                kind,
                *interpolation,
                *left,
                *right,
            ),
        };
        SingleCurveBundle::new(
            curve_name,
            instruments,
            guesses,
            generator,
            registrations_for(roles),
        )
    }
}

/// Maps configuration roles to provider registrations.
fn registrations_for(roles: &[CurveRole]) -> CurveRegistrations {
    let mut registrations = CurveRegistrations::default();
    for role in roles {
        match role {
            CurveRole::Discounting(currency) => registrations.discounting.push(*currency),
            CurveRole::IborForward(index) => registrations.ibor.push(index.clone()),
            CurveRole::OvernightForward(index) => registrations.overnight.push(index.clone()),
            CurveRole::Issuer(key) => registrations.issuers.push(key.clone()),
            CurveRole::Inflation(index) => registrations.inflation.push(index.clone()),
        }
    }
    registrations
}

fn publish(
    names: Vec<&str>,
    provider: MulticurveProvider,
    blocks: CurveBuildingBlockBundle,
) -> CurveResult<ConstructionResult> {
    let mut curves = Vec::with_capacity(names.len());
    for name in names {
        curves.push((name.to_string(), provider.curve(name)?.clone()));
    }
    Ok(ConstructionResult {
        provider,
        blocks,
        curves,
    })
}
