//! Sources the construction driver pulls its inputs from.
//!
//! Everything is behind a trait so construction can run against live
//! snapshots, databases or the in-memory implementations used in tests
//! and examples. Snapshot values are scoped per curve: the same ticker
//! may carry different values for different curves in one snapshot.

use std::collections::HashMap;

use curveforge_core::Date;

use crate::blocks::CurveBuildingBlockBundle;
use crate::config::{
    CurveConstructionConfiguration, CurveDefinition, CurveSpecification, MarketDataId,
};
use crate::provider::MulticurveProvider;

/// Resolves configuration objects by name.
pub trait ConfigurationSource {
    /// The construction configuration named `name`.
    fn construction_configuration(&self, name: &str) -> Option<CurveConstructionConfiguration>;

    /// The shape definition of `curve`.
    fn curve_definition(&self, curve: &str) -> Option<CurveDefinition>;

    /// The node specification of `curve`.
    fn curve_specification(&self, curve: &str) -> Option<CurveSpecification>;
}

/// A market-data snapshot with per-curve quote scoping.
pub trait MarketDataSnapshot {
    /// The snapshot value of `id` as quoted for `curve`.
    fn value(&self, curve: &str, id: &MarketDataId) -> Option<f64>;
}

/// Historical fixing series keyed by market-data identifier.
pub trait FixingSource {
    /// The most recent fixing of `id` on or before `date`.
    fn latest_fixing(&self, id: &MarketDataId, date: Date) -> Option<f64>;
}

/// Published results of earlier construction runs, for exogenous
/// dependencies.
pub trait CurveBundleSource {
    /// The published provider and blocks of `configuration`.
    fn published_bundle(
        &self,
        configuration: &str,
    ) -> Option<(MulticurveProvider, CurveBuildingBlockBundle)>;
}

/// In-memory configuration store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigurationSource {
    configurations: HashMap<String, CurveConstructionConfiguration>,
    definitions: HashMap<String, CurveDefinition>,
    specifications: HashMap<String, CurveSpecification>,
}

impl InMemoryConfigurationSource {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a construction configuration.
    #[must_use]
    pub fn with_configuration(mut self, config: CurveConstructionConfiguration) -> Self {
        self.configurations.insert(config.name.clone(), config);
        self
    }

    /// Adds a curve definition.
    #[must_use]
    pub fn with_definition(mut self, curve: impl Into<String>, definition: CurveDefinition) -> Self {
        self.definitions.insert(curve.into(), definition);
        self
    }

    /// Adds a curve specification.
    #[must_use]
    pub fn with_specification(mut self, specification: CurveSpecification) -> Self {
        self.specifications
            .insert(specification.curve_name.clone(), specification);
        self
    }
}

impl ConfigurationSource for InMemoryConfigurationSource {
    fn construction_configuration(&self, name: &str) -> Option<CurveConstructionConfiguration> {
        self.configurations.get(name).cloned()
    }

    fn curve_definition(&self, curve: &str) -> Option<CurveDefinition> {
        self.definitions.get(curve).cloned()
    }

    fn curve_specification(&self, curve: &str) -> Option<CurveSpecification> {
        self.specifications.get(curve).cloned()
    }
}

/// In-memory snapshot keyed by (curve, identifier).
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshot {
    values: HashMap<(String, MarketDataId), f64>,
}

impl InMemorySnapshot {
    /// An empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `id` for `curve`.
    #[must_use]
    pub fn with_value(
        mut self,
        curve: impl Into<String>,
        id: impl Into<String>,
        value: f64,
    ) -> Self {
        self.values
            .insert((curve.into(), MarketDataId::new(id)), value);
        self
    }
}

impl MarketDataSnapshot for InMemorySnapshot {
    fn value(&self, curve: &str, id: &MarketDataId) -> Option<f64> {
        self.values.get(&(curve.to_string(), id.clone())).copied()
    }
}

/// In-memory fixing series.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFixings {
    series: HashMap<MarketDataId, Vec<(Date, f64)>>,
}

impl InMemoryFixings {
    /// An empty fixing store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fixing to the series of `id`, keeping the series sorted.
    #[must_use]
    pub fn with_fixing(mut self, id: impl Into<String>, date: Date, value: f64) -> Self {
        let series = self.series.entry(MarketDataId::new(id)).or_default();
        series.push((date, value));
        series.sort_by_key(|(d, _)| *d);
        self
    }
}

impl FixingSource for InMemoryFixings {
    fn latest_fixing(&self, id: &MarketDataId, date: Date) -> Option<f64> {
        self.series.get(id).and_then(|series| {
            series
                .iter()
                .rev()
                .find(|(d, _)| *d <= date)
                .map(|(_, v)| *v)
        })
    }
}

/// In-memory published-bundle store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBundles {
    bundles: HashMap<String, (MulticurveProvider, CurveBuildingBlockBundle)>,
}

impl InMemoryBundles {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the result of `configuration`.
    #[must_use]
    pub fn with_bundle(
        mut self,
        configuration: impl Into<String>,
        provider: MulticurveProvider,
        blocks: CurveBuildingBlockBundle,
    ) -> Self {
        self.bundles
            .insert(configuration.into(), (provider, blocks));
        self
    }
}

impl CurveBundleSource for InMemoryBundles {
    fn published_bundle(
        &self,
        configuration: &str,
    ) -> Option<(MulticurveProvider, CurveBuildingBlockBundle)> {
        self.bundles.get(configuration).cloned()
    }
}
