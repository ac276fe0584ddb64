//! Correlation Funnel Module
//! Binarizes every column of the cleaned table and ranks the resulting
//! indicator features by their correlation with the top range bin.

use crate::config::AnalysisConfig;
use crate::data::RANGE_COL;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Level used for infrequent categories.
pub const OTHER_LEVEL: &str = "-OTHER";
/// Level used for missing values.
pub const MISSING_LEVEL: &str = "NA";

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column {0:?} is missing")]
    MissingColumn(String),
    #[error("Target bin {0} is constant over the dataset; correlation is undefined")]
    ConstantTarget(String),
    #[error("Range breaks must be non-empty and strictly ascending, got {0:?}")]
    InvalidBreaks(Vec<f64>),
}

/// Binning and encoding settings for the funnel.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    /// Ascending cut points for electric range; the last one opens the target bin.
    pub range_breaks: Vec<f64>,
    /// Number of quantile bins for other numeric columns.
    pub quantile_bins: usize,
    /// Categories with a smaller share than this are lumped into [`OTHER_LEVEL`].
    pub infrequent_threshold: f64,
    pub exclude_columns: Vec<String>,
}

impl FunnelConfig {
    /// Lower edge of the top range bin (the correlation target).
    pub fn target_cutoff(&self) -> Option<f64> {
        self.range_breaks.last().copied()
    }

    pub fn check_breaks(&self) -> Result<(), FunnelError> {
        let ascending = self.range_breaks.windows(2).all(|w| w[0] < w[1]);
        if self.range_breaks.is_empty() || !ascending {
            return Err(FunnelError::InvalidBreaks(self.range_breaks.clone()));
        }
        Ok(())
    }
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for FunnelConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            range_breaks: config.range_breaks.clone(),
            quantile_bins: 4,
            infrequent_threshold: config.infrequent_threshold,
            exclude_columns: config.exclude_columns.clone(),
        }
    }
}

/// Indicator of one bin or level of one column.
#[derive(Debug, Clone)]
pub struct BinaryFeature {
    pub column: String,
    pub bin: String,
    pub indicator: Vec<bool>,
}

impl BinaryFeature {
    pub fn name(&self) -> String {
        format!("{}__{}", self.column, self.bin)
    }
}

/// One row of the funnel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCorrelation {
    pub column: String,
    pub bin: String,
    pub correlation: f64,
    pub count: usize,
}

fn format_edge(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{}", edge as i64)
    } else {
        let s = format!("{:.2}", edge);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Labels of the bins produced by `edges`: `-Inf_e0`, `e0_e1`, ..., `ek_Inf`.
/// No edges, no labels.
pub fn bin_labels(edges: &[f64]) -> Vec<String> {
    let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
        return Vec::new();
    };
    let mut labels = Vec::with_capacity(edges.len() + 1);
    labels.push(format!("-Inf_{}", format_edge(first)));
    for w in edges.windows(2) {
        labels.push(format!("{}_{}", format_edge(w[0]), format_edge(w[1])));
    }
    labels.push(format!("{}_Inf", format_edge(last)));
    labels
}

/// Index into [`bin_labels`] of the half-open bin holding `value`.
fn bin_index(value: f64, edges: &[f64]) -> usize {
    edges.iter().take_while(|&&e| value >= e).count()
}

/// Label of the range bin holding `value`. With the default breaks every
/// range of 215 miles or more falls in `215_Inf`.
pub fn discretize_range(value: f64, breaks: &[f64]) -> Option<String> {
    bin_labels(breaks).into_iter().nth(bin_index(value, breaks))
}

/// Label of the target bin for `breaks`.
pub fn target_bin(breaks: &[f64]) -> Option<String> {
    bin_labels(breaks).pop()
}

/// Interior quantile cut points, duplicates collapsed.
fn quantile_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() || bins < 2 {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mut edges: Vec<f64> = (1..bins)
        .map(|k| {
            let rank = k as f64 / bins as f64 * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (rank.ceil() as usize).min(n - 1);
            let frac = rank - lower as f64;
            sorted[lower] * (1.0 - frac) + sorted[upper] * frac
        })
        .collect();
    edges.dedup();
    edges
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// One indicator per label, in label order, plus an `NA` indicator if any
/// value is missing.
fn indicators(
    column: &str,
    labels: &[String],
    assigned: &[Option<usize>],
) -> Vec<BinaryFeature> {
    let mut features: Vec<BinaryFeature> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| BinaryFeature {
            column: column.to_string(),
            bin: label.clone(),
            indicator: assigned.iter().map(|a| *a == Some(idx)).collect(),
        })
        .collect();

    if assigned.iter().any(|a| a.is_none()) {
        features.push(BinaryFeature {
            column: column.to_string(),
            bin: MISSING_LEVEL.to_string(),
            indicator: assigned.iter().map(|a| a.is_none()).collect(),
        });
    }
    features
}

fn binarize_numeric(name: &str, values: &[Option<f64>], edges: &[f64]) -> Vec<BinaryFeature> {
    if edges.is_empty() {
        return Vec::new();
    }
    let labels = bin_labels(edges);
    let assigned: Vec<Option<usize>> = values
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()).map(|x| bin_index(x, edges)))
        .collect();
    indicators(name, &labels, &assigned)
}

fn binarize_categorical(
    name: &str,
    values: &[Option<String>],
    threshold: f64,
) -> Vec<BinaryFeature> {
    let n = values.len();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for v in values.iter().flatten() {
        let count = counts.entry(v.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(v.as_str());
        }
        *count += 1;
    }

    let min_count = threshold * n as f64;
    let mut kept: Vec<&str> = first_seen
        .into_iter()
        .filter(|level| counts[level] as f64 >= min_count)
        .collect();
    // most frequent first; sort_by is stable so ties keep first-seen order
    kept.sort_by(|a, b| counts[b].cmp(&counts[a]));

    let lumped = counts.len() > kept.len();
    let mut labels: Vec<String> = kept.iter().map(|s| s.to_string()).collect();
    if lumped {
        labels.push(OTHER_LEVEL.to_string());
    }

    let assigned: Vec<Option<usize>> = values
        .iter()
        .map(|v| {
            v.as_deref().map(|s| {
                kept.iter()
                    .position(|k| *k == s)
                    .unwrap_or(labels.len() - 1)
            })
        })
        .collect();
    indicators(name, &labels, &assigned)
}

/// Turn every column of `df` into binary indicator features.
///
/// `electric_range` is cut at the configured breaks, other numeric columns
/// at their quartiles, and everything else is one-hot encoded.
pub fn binarize(
    df: &DataFrame,
    config: &FunnelConfig,
) -> Result<Vec<BinaryFeature>, FunnelError> {
    config.check_breaks()?;
    let mut features = Vec::new();

    for column in df.get_columns() {
        let name = column.name().to_string();
        if config.exclude_columns.iter().any(|c| c == &name) {
            log::debug!("Skipping excluded column {:?}", name);
            continue;
        }

        let binarized = if is_numeric(column.dtype()) {
            let values: Vec<Option<f64>> = column
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .collect();
            let edges = if name == RANGE_COL {
                config.range_breaks.clone()
            } else {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                quantile_edges(&present, config.quantile_bins)
            };
            binarize_numeric(&name, &values, &edges)
        } else {
            let text = column.cast(&DataType::String)?;
            let values: Vec<Option<String>> = text
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect();
            binarize_categorical(&name, &values, config.infrequent_threshold)
        };

        log::debug!("Column {:?} -> {} indicators", name, binarized.len());
        features.extend(binarized);
    }

    Ok(features)
}

/// Pearson correlation of two 0/1 indicators (the phi coefficient).
/// `None` when either side is constant.
pub fn phi_coefficient(x: &[bool], y: &[bool]) -> Option<f64> {
    let n = x.len().min(y.len()) as f64;
    let (mut n_x, mut n_y, mut n_xy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        if a {
            n_x += 1.0;
        }
        if b {
            n_y += 1.0;
        }
        if a && b {
            n_xy += 1.0;
        }
    }

    let denom = (n_x * (n - n_x) * n_y * (n - n_y)).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((n * n_xy - n_x * n_y) / denom)
}

/// Rank features by absolute correlation with `target`, descending. Ties keep
/// input order. Constant features are dropped.
pub fn correlation_funnel(
    features: &[BinaryFeature],
    target: &[bool],
) -> Vec<FeatureCorrelation> {
    let mut dropped = 0usize;
    let mut ranked: Vec<FeatureCorrelation> = features
        .iter()
        .filter_map(|f| match phi_coefficient(&f.indicator, target) {
            Some(correlation) => Some(FeatureCorrelation {
                column: f.column.clone(),
                bin: f.bin.clone(),
                correlation,
                count: f.indicator.iter().filter(|&&b| b).count(),
            }),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        log::warn!("Dropped {} constant indicator features from the funnel", dropped);
    }

    ranked.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Binarize `df` and rank its features against the top range bin.
pub fn run_funnel(
    df: &DataFrame,
    config: &FunnelConfig,
) -> Result<Vec<FeatureCorrelation>, FunnelError> {
    config.check_breaks()?;
    let (Some(cutoff), Some(bin)) = (config.target_cutoff(), target_bin(&config.range_breaks))
    else {
        return Err(FunnelError::InvalidBreaks(config.range_breaks.clone()));
    };

    let range = df
        .column(RANGE_COL)
        .map_err(|_| FunnelError::MissingColumn(RANGE_COL.to_string()))?
        .cast(&DataType::Float64)?;
    let target: Vec<bool> = range
        .f64()?
        .into_iter()
        .map(|v| v.is_some_and(|x| x >= cutoff))
        .collect();

    let target_label = format!("{}__{}", RANGE_COL, bin);
    let hits = target.iter().filter(|&&b| b).count();
    if hits == 0 || hits == target.len() {
        return Err(FunnelError::ConstantTarget(target_label));
    }

    let features = binarize(df, config)?;
    log::info!(
        "Correlation funnel: {} indicators against {} ({} of {} rows)",
        features.len(),
        target_label,
        hits,
        target.len()
    );
    Ok(correlation_funnel(&features, &target))
}
