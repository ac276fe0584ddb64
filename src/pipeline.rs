//! Analysis Pipeline
//! Runs load -> clean -> explore -> split -> fit -> evaluate once, in order.
//! Every step takes the previous step's output and returns a new value.

use crate::config::AnalysisConfig;
use crate::data::{DataLoader, DataProcessor};
use crate::report::{AnalysisReport, DataSummary, SplitSummary};
use crate::stats::correlation::{self, FunnelConfig};
use crate::stats::regression;
use crate::stats::StatsCalculator;
use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use std::path::Path;

/// Load `config.data_path` and run the full analysis.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let raw = DataLoader::load_csv(&config.data_path)
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    analyze_frame(&raw, &config.data_path, config)
}

/// Run the analysis over an already loaded table.
pub fn analyze_frame(
    raw: &DataFrame,
    source: &Path,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate().context("validating settings")?;

    // 1. Clean
    let normalized = DataLoader::normalize_columns(raw).context("normalizing column names")?;
    let typed = DataProcessor::resolve_vehicle_type_column(&normalized)
        .context("locating the vehicle type column")?;
    let cleaned = DataProcessor::clean(&typed).context("cleaning electric range")?;
    let vehicles = DataProcessor::extract_vehicles(&cleaned).context("reading vehicle rows")?;

    // 2. Explore
    let group_stats = StatsCalculator::group_means(&vehicles);
    for gs in &group_stats {
        log::info!("{}: n = {}, mean range = {:.1} mi", gs.ev_type, gs.count, gs.mean);
    }
    let histogram = StatsCalculator::range_histogram(&vehicles, config.histogram_bin_width);
    let funnel = correlation::run_funnel(&cleaned, &FunnelConfig::from(config))
        .context("building the correlation funnel")?;

    // 3. Split -> Fit -> Evaluate
    let split = regression::split(&vehicles, config.train_fraction, config.seed)
        .context("splitting train/test")?;
    log::info!(
        "Split {} rows: {} train / {} test (seed {})",
        vehicles.len(),
        split.train.len(),
        split.test.len(),
        config.seed
    );

    let model = regression::fit(&split.train).context("fitting electric_range ~ e_v_type")?;
    let predicted = regression::predict(&model, &split.test).context("predicting test rows")?;
    let actual: Vec<f64> = split.test.iter().map(|v| v.electric_range).collect();
    let metrics = regression::evaluate(&predicted, &actual).context("evaluating test rows")?;
    log::info!(
        "Test metrics: rmse = {:.3}, mae = {:.3}, rsq = {:.4}",
        metrics.rmse,
        metrics.mae,
        metrics.r_squared
    );

    Ok(AnalysisReport {
        data: DataSummary {
            source: source.to_path_buf(),
            rows_loaded: raw.height(),
            rows_removed: raw.height() - cleaned.height(),
            rows_analyzed: cleaned.height(),
        },
        group_stats,
        histogram,
        funnel,
        split: SplitSummary {
            seed: config.seed,
            train_fraction: config.train_fraction,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        },
        model,
        metrics,
    })
}
