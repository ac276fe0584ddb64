//! Tests for the PNG charts written next to the JSON report.

mod common;

use std::collections::BTreeMap;

use ev_range_report::charts::{ChartError, StaticChartRenderer};
use ev_range_report::config::AnalysisConfig;
use ev_range_report::pipeline::run_analysis;
use ev_range_report::report::{FUNNEL_FILE, HISTOGRAM_FILE};
use ev_range_report::stats::Histogram;

fn file_len(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

// ============================================================================
// Rendering Tests
// ============================================================================

/// Both charts land in the output directory as non-empty files.
#[test]
fn test_charts_are_rendered() {
    let (dir, path) = common::write_csv(&common::registry_csv(50, 5));
    let config = AnalysisConfig {
        data_path: path,
        output_dir: dir.path().join("report"),
        ..AnalysisConfig::default()
    };
    let report = run_analysis(&config).unwrap();
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let histogram = config.output_dir.join(HISTOGRAM_FILE);
    StaticChartRenderer::render_histogram(&report.histogram, &report.group_stats, &histogram)
        .unwrap();
    assert!(file_len(&histogram) > 0);

    let funnel = config.output_dir.join(FUNNEL_FILE);
    StaticChartRenderer::render_funnel(&report.funnel, config.funnel_top_n, &funnel).unwrap();
    assert!(file_len(&funnel) > 0);
}

// ============================================================================
// Empty Input Tests
// ============================================================================

/// A histogram without counts is refused before any file is created.
#[test]
fn test_empty_histogram_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(HISTOGRAM_FILE);
    let hist = Histogram {
        bin_width: 25.0,
        edges: Vec::new(),
        counts: BTreeMap::new(),
    };

    let err = StaticChartRenderer::render_histogram(&hist, &[], &path).unwrap_err();
    assert!(matches!(err, ChartError::Empty(_)));
    assert!(!path.exists());
}

/// An empty funnel, or a top-N of zero, has nothing to draw.
#[test]
fn test_empty_funnel_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(FUNNEL_FILE);

    let err = StaticChartRenderer::render_funnel(&[], 20, &path).unwrap_err();
    assert!(matches!(err, ChartError::Empty(_)));

    let (_csv_dir, csv) = common::write_csv(&common::registry_csv(20, 0));
    let config = AnalysisConfig {
        data_path: csv,
        ..AnalysisConfig::default()
    };
    let report = run_analysis(&config).unwrap();
    let err = StaticChartRenderer::render_funnel(&report.funnel, 0, &path).unwrap_err();
    assert!(matches!(err, ChartError::Empty(_)));
    assert!(!path.exists());
}
