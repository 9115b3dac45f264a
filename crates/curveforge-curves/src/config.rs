//! Curve construction configuration.
//!
//! A [`CurveConstructionConfiguration`] names an ordered list of groups;
//! curves within a group are calibrated jointly, groups sequentially with
//! each group seeing every earlier group's curves as known data. Each
//! curve carries the roles it will serve on the provider and points at a
//! [`CurveDefinition`] (shape) and a [`CurveSpecification`] (nodes).

use curveforge_core::{Currency, Date};
use curveforge_math::{Extrapolation, Interpolation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{CurveError, CurveResult};
use crate::index::{IborIndex, IssuerKey, OvernightIndex, PriceIndex};
use crate::nodes::CurveNode;

/// Identifier of a single market quote (ticker, snapshot key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketDataId(pub String);

impl MarketDataId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A role a calibrated curve serves on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveRole {
    /// Risk-free discounting for a currency.
    Discounting(Currency),
    /// Forward projection for a term index.
    IborForward(IborIndex),
    /// Forward projection for an overnight index.
    OvernightForward(OvernightIndex),
    /// Issuer discounting for bonds of a legal entity.
    Issuer(IssuerKey),
    /// Price-index projection for an inflation index.
    Inflation(PriceIndex),
}

impl fmt::Display for CurveRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discounting(ccy) => write!(f, "discounting {}", ccy.code()),
            Self::IborForward(index) => write!(f, "ibor-forward {index}"),
            Self::OvernightForward(index) => write!(f, "overnight-forward {index}"),
            Self::Issuer(key) => write!(f, "issuer {key}"),
            Self::Inflation(index) => write!(f, "inflation {index}"),
        }
    }
}

/// Shape of a curve: how node times are chosen and how nodes are joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CurveDefinition {
    /// Node times follow instrument maturities (last cash-flow time).
    Interpolated {
        /// Interpolation between nodes.
        interpolation: Interpolation,
        /// Extrapolation before the first node.
        left: Extrapolation,
        /// Extrapolation after the last node.
        right: Extrapolation,
    },
    /// Node dates are fixed in advance; an anchor date pins an extra
    /// zero-valued node so the system stays square.
    FixedDate {
        /// The node dates.
        dates: Vec<Date>,
        /// Date of the anchor node.
        anchor: Date,
        /// Interpolation between nodes.
        interpolation: Interpolation,
        /// Extrapolation before the first node.
        left: Extrapolation,
        /// Extrapolation after the last node.
        right: Extrapolation,
    },
}

/// A node together with the identifier its quote is fetched under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveNodeWithId {
    /// Quote identifier in the snapshot.
    pub id: MarketDataId,
    /// The node itself.
    pub node: CurveNode,
}

/// The resolved node list of one curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSpecification {
    /// Curve name.
    pub curve_name: String,
    /// Nodes in quoting order.
    pub nodes: Vec<CurveNodeWithId>,
}

/// One calibration group: curves solved jointly, in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CurveGroupConfiguration {
    /// (curve name, roles) pairs in declared order.
    pub curves: Vec<(String, Vec<CurveRole>)>,
}

impl CurveGroupConfiguration {
    /// A group with a single curve.
    #[must_use]
    pub fn single(name: impl Into<String>, roles: Vec<CurveRole>) -> Self {
        Self {
            curves: vec![(name.into(), roles)],
        }
    }

    /// Adds a curve to the group.
    #[must_use]
    pub fn with_curve(mut self, name: impl Into<String>, roles: Vec<CurveRole>) -> Self {
        self.curves.push((name.into(), roles));
        self
    }
}

/// The full recipe for one construction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveConstructionConfiguration {
    /// Configuration name.
    pub name: String,
    /// Ordered calibration groups.
    pub groups: Vec<CurveGroupConfiguration>,
    /// Names of configurations whose published curves seed this one.
    pub exogenous: Vec<String>,
}

impl CurveConstructionConfiguration {
    /// Creates a configuration with no exogenous dependencies.
    pub fn new(name: impl Into<String>, groups: Vec<CurveGroupConfiguration>) -> Self {
        Self {
            name: name.into(),
            groups,
            exogenous: Vec::new(),
        }
    }

    /// Adds an exogenous configuration dependency.
    #[must_use]
    pub fn with_exogenous(mut self, name: impl Into<String>) -> Self {
        self.exogenous.push(name.into());
        self
    }

    /// All curve names in calibration order.
    #[must_use]
    pub fn curve_names(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.curves.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Fails on empty groups, duplicate curve names, a curve with no
    /// roles, or a self-referential exogenous dependency.
    pub fn validate(&self) -> CurveResult<()> {
        let invalid = |reason: String| CurveError::InvalidConfiguration {
            name: self.name.clone(),
            reason,
        };
        if self.groups.is_empty() {
            return Err(invalid("no groups".into()));
        }
        let mut seen = HashSet::new();
        for (gi, group) in self.groups.iter().enumerate() {
            if group.curves.is_empty() {
                return Err(invalid(format!("group {gi} is empty")));
            }
            for (name, roles) in &group.curves {
                if !seen.insert(name.as_str()) {
                    return Err(invalid(format!("curve '{name}' appears twice")));
                }
                if roles.is_empty() {
                    return Err(invalid(format!("curve '{name}' has no roles")));
                }
            }
        }
        if self.exogenous.iter().any(|e| e == &self.name) {
            return Err(invalid("configuration depends on itself".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_discounting() -> Vec<CurveRole> {
        vec![CurveRole::Discounting(Currency::USD)]
    }

    #[test]
    fn test_validate_accepts_two_groups() {
        let config = CurveConstructionConfiguration::new(
            "USD-STANDARD",
            vec![
                CurveGroupConfiguration::single("USD-OIS", usd_discounting()),
                CurveGroupConfiguration::single(
                    "USD-3M",
                    vec![CurveRole::IborForward(IborIndex::new(
                        "USDLIBOR3M",
                        Currency::USD,
                        curveforge_core::Tenor::months(3),
                    ))],
                ),
            ],
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.curve_names(), vec!["USD-OIS", "USD-3M"]);
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config = CurveConstructionConfiguration::new(
            "DUP",
            vec![
                CurveGroupConfiguration::single("USD-OIS", usd_discounting()),
                CurveGroupConfiguration::single("USD-OIS", usd_discounting()),
            ],
        );
        assert!(matches!(
            config.validate(),
            Err(CurveError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_roleless_curve() {
        let config = CurveConstructionConfiguration::new(
            "NO-ROLE",
            vec![CurveGroupConfiguration::single("USD-OIS", vec![])],
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_serde_round_trip() {
        let config = CurveConstructionConfiguration::new(
            "USD-STANDARD",
            vec![CurveGroupConfiguration::single("USD-OIS", usd_discounting())],
        )
        .with_exogenous("USD-BASE");
        let json = serde_json::to_string(&config).unwrap();
        let back: CurveConstructionConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_self_dependency() {
        let config = CurveConstructionConfiguration::new(
            "SELF",
            vec![CurveGroupConfiguration::single("USD-OIS", usd_discounting())],
        )
        .with_exogenous("SELF");
        assert!(config.validate().is_err());
    }
}
