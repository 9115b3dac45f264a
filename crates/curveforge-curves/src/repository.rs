//! The calibration engine: solves curve groups and maintains the
//! Jacobian block bundle.
//!
//! Groups are solved in order. Within a group every curve's parameters
//! are stacked into one vector and the group's par spreads are driven to
//! zero jointly; the solved curves then join the known data seen by later
//! groups. After each solve the block bundle is updated: the direct block
//! is the inverse of the group's own Jacobian, and sensitivities to
//! earlier curves are chained through the blocks those curves recorded,
//! so every curve ends up with `d(parameters) / d(market quotes)` back to
//! the original quotes.

use nalgebra::{DMatrix, DVector};
use std::sync::Arc;
use tracing::{debug, info};

use curveforge_math::{broyden_root, linear_algebra, RootFinderConfig};

use crate::blocks::{CurveBuildingBlock, CurveBuildingBlockBundle};
use crate::bundles::MultiCurveBundle;
use crate::calculators::{SensitivityCalculator, ValuationCalculator};
use crate::error::{CurveError, CurveResult};
use crate::instruments::Instrument;
use crate::provider::MulticurveProvider;

/// Calibrates curve groups against a provider of known data.
#[derive(Debug, Clone)]
pub struct CurveBuildingRepository {
    root_finder: RootFinderConfig,
}

impl Default for CurveBuildingRepository {
    fn default() -> Self {
        Self {
            root_finder: RootFinderConfig::default(),
        }
    }
}

impl CurveBuildingRepository {
    /// Creates a repository with explicit root-finder tolerances.
    #[must_use]
    pub fn new(absolute_tolerance: f64, relative_tolerance: f64, max_iterations: u32) -> Self {
        Self {
            root_finder: RootFinderConfig {
                absolute_tolerance,
                relative_tolerance,
                max_iterations,
            },
        }
    }

    /// Calibrates `groups` in order on top of `known_data`, returning the
    /// extended provider and the extended block bundle.
    ///
    /// # Errors
    ///
    /// Fails on ill-posed groups, non-convergence, pricing failures or
    /// singular Jacobians.
    pub fn make_curves(
        &self,
        groups: &[MultiCurveBundle],
        known_data: MulticurveProvider,
        known_blocks: CurveBuildingBlockBundle,
        valuation: &dyn ValuationCalculator,
        sensitivity: &dyn SensitivityCalculator,
    ) -> CurveResult<(MulticurveProvider, CurveBuildingBlockBundle)> {
        let mut provider = known_data;
        let mut blocks = known_blocks;
        for (group_index, group) in groups.iter().enumerate() {
            let instruments = group.total_instruments();
            let parameters = group.total_parameters();
            if instruments != parameters {
                return Err(CurveError::IllPosedSystem {
                    group: group_index,
                    instruments,
                    parameters,
                });
            }
            provider = self.solve_group(
                group_index,
                group,
                provider,
                &mut blocks,
                valuation,
                sensitivity,
            )?;
        }
        Ok((provider, blocks))
    }

    fn solve_group(
        &self,
        group_index: usize,
        group: &MultiCurveBundle,
        known: MulticurveProvider,
        blocks: &mut CurveBuildingBlockBundle,
        valuation: &dyn ValuationCalculator,
        sensitivity: &dyn SensitivityCalculator,
    ) -> CurveResult<MulticurveProvider> {
        let instruments: Vec<Instrument> = group.instruments().cloned().collect();

        let residual = |x: &DVector<f64>| -> CurveResult<DVector<f64>> {
            let candidate = build_candidate(group, &known, x)?;
            let mut spreads = DVector::zeros(instruments.len());
            for (i, instrument) in instruments.iter().enumerate() {
                spreads[i] = valuation.par_spread(instrument, &candidate)?;
            }
            Ok(spreads)
        };
        let jacobian =
            |x: &DVector<f64>| sensitivity.parameter_jacobian(&residual, x);

        let guess = DVector::from_vec(group.stacked_guess());
        let report = broyden_root(&residual, &jacobian, guess, &self.root_finder)?;
        info!(
            group = group_index,
            iterations = report.iterations,
            residual = report.residual_norm,
            "calibrated curve group"
        );

        let solved = build_candidate(group, &known, &report.root)?;
        self.update_block_bundle(group, &instruments, &solved, blocks, valuation, sensitivity)?;
        Ok(solved)
    }

    /// Records each solved curve's inverse Jacobian against all quotes it
    /// depends on, directly or through earlier curves.
    fn update_block_bundle(
        &self,
        group: &MultiCurveBundle,
        instruments: &[Instrument],
        provider: &MulticurveProvider,
        blocks: &mut CurveBuildingBlockBundle,
        valuation: &dyn ValuationCalculator,
        sensitivity: &dyn SensitivityCalculator,
    ) -> CurveResult<()> {
        let current: Vec<String> = group.curves.iter().map(|c| c.name.clone()).collect();
        // Earlier curves this provider actually holds, in recorded order.
        let before: Vec<String> = blocks
            .names()
            .filter(|name| provider.has_curve(name) && !current.iter().any(|c| c == name))
            .map(String::from)
            .collect();

        let mut order = before.clone();
        order.extend(current.iter().cloned());
        let full = sensitivity.provider_jacobian(valuation, instruments, provider, &order)?;

        let before_count: usize = before
            .iter()
            .map(|name| provider.curve(name).map(|c| c.parameter_count()))
            .sum::<CurveResult<usize>>()?;
        let current_count = group.total_parameters();

        // Direct block: d(current parameters) / d(current quotes).
        let direct = full.columns(before_count, current_count).into_owned();
        let inverse_direct = linear_algebra::invert(&direct)?;

        // Indirect block: chain through what the earlier curves recorded.
        let indirect = if before_count == 0 {
            None
        } else {
            let other = full.columns(0, before_count).into_owned();
            let parameter_sensitivity = -&inverse_direct * other;
            let transition = transition_matrix(&before, provider, blocks, before_count)?;
            Some(parameter_sensitivity * transition)
        };

        let mut entries: Vec<(String, (usize, usize))> = Vec::with_capacity(order.len());
        let mut offset = 0;
        for name in &before {
            let count = provider.curve(name)?.parameter_count();
            entries.push((name.clone(), (offset, count)));
            offset += count;
        }
        for bundle in &group.curves {
            entries.push((bundle.name.clone(), (offset, bundle.parameter_count())));
            offset += bundle.parameter_count();
        }
        let block = CurveBuildingBlock::new(entries)?;

        let mut row = 0;
        for bundle in &group.curves {
            let count = bundle.parameter_count();
            let mut jacobian = DMatrix::zeros(count, before_count + current_count);
            if let Some(indirect) = &indirect {
                jacobian
                    .view_mut((0, 0), (count, before_count))
                    .copy_from(&indirect.rows(row, count));
            }
            jacobian
                .view_mut((0, before_count), (count, current_count))
                .copy_from(&inverse_direct.rows(row, count));
            debug!(curve = %bundle.name, quotes = before_count + current_count, "recorded building block");
            blocks.add(bundle.name.clone(), block.clone(), jacobian);
            row += count;
        }
        Ok(())
    }
}

/// Builds candidate curves from a stacked parameter vector on top of the
/// known data.
fn build_candidate(
    group: &MultiCurveBundle,
    known: &MulticurveProvider,
    x: &DVector<f64>,
) -> CurveResult<MulticurveProvider> {
    let mut provider = known.clone();
    let slice = x.as_slice();
    let mut offset = 0;
    for bundle in &group.curves {
        let count = bundle.parameter_count();
        let parameters =
            slice
                .get(offset..offset + count)
                .ok_or_else(|| CurveError::BundleSizeMismatch {
                    curve: bundle.name.clone(),
                    instruments: slice.len().saturating_sub(offset),
                    parameters: count,
                })?;
        let curve = bundle.generator.build(parameters)?;
        provider = provider.with_curve(Arc::new(curve), &bundle.registrations)?;
        offset += count;
    }
    Ok(provider)
}

/// Assembles the square matrix mapping earlier-curve parameter moves to
/// original market-quote moves, from the blocks those curves recorded.
fn transition_matrix(
    before: &[String],
    provider: &MulticurveProvider,
    blocks: &CurveBuildingBlockBundle,
    before_count: usize,
) -> CurveResult<DMatrix<f64>> {
    let mut transition = DMatrix::zeros(before_count, before_count);
    // Column layout mirrors the row layout: quotes of `before` in order.
    let mut column_start = vec![0usize; before.len()];
    let mut offset = 0;
    for (i, name) in before.iter().enumerate() {
        column_start[i] = offset;
        offset += provider.curve(name)?.parameter_count();
    }

    let mut row = 0;
    for name in before {
        let count = provider.curve(name)?.parameter_count();
        let (block, matrix) = blocks
            .get(name)
            .ok_or_else(|| CurveError::missing_curve(name))?;
        for (j, dependency) in before.iter().enumerate() {
            if let Some((dep_start, dep_count)) = block.range(dependency) {
                transition
                    .view_mut((row, column_start[j]), (count, dep_count))
                    .copy_from(&matrix.columns(dep_start, dep_count));
            }
        }
        row += count;
    }
    Ok(transition)
}
