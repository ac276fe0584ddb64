//! End-to-end tests: CSV on disk through to the written JSON report.

mod common;

use approx::assert_relative_eq;

use ev_range_report::config::AnalysisConfig;
use ev_range_report::data::EvType;
use ev_range_report::pipeline::run_analysis;
use ev_range_report::report::{ReportWriter, JSON_FILE};

fn config_for(per_type: usize, zeros: usize) -> (tempfile::TempDir, AnalysisConfig) {
    let (dir, path) = common::write_csv(&common::registry_csv(per_type, zeros));
    let config = AnalysisConfig {
        data_path: path,
        output_dir: dir.path().join("report"),
        ..AnalysisConfig::default()
    };
    (dir, config)
}

/// BEVs average 250 miles and PHEVs 83, so the fit shows a 167-mile decrease.
#[test]
fn test_end_to_end_average_decrease() {
    let (_dir, config) = config_for(100, 10);
    let report = run_analysis(&config).unwrap();

    assert_eq!(report.data.rows_loaded, 210);
    assert_eq!(report.data.rows_removed, 10);
    assert_eq!(report.data.rows_analyzed, 200);
    assert_eq!(report.split.train_rows, 160);
    assert_eq!(report.split.test_rows, 40);

    assert_eq!(report.group_stats.len(), 2);
    assert_relative_eq!(report.group_stats[0].mean, 250.0, epsilon = 1e-9);
    assert_relative_eq!(report.group_stats[1].mean, 83.0, epsilon = 1e-9);

    let model = &report.model;
    assert_eq!(model.reference, EvType::BatteryElectric);
    assert_relative_eq!(model.intercept.estimate, 250.0, epsilon = 3.0);
    assert_relative_eq!(
        model.offset(EvType::PlugInHybrid).unwrap(),
        -167.0,
        epsilon = 3.0
    );
    assert!(model.offsets[0].1.p_value < 1e-10);

    let m = &report.metrics;
    assert_eq!(m.n, 40);
    assert!(m.rmse >= m.mae && m.mae >= 0.0);
    assert!(m.r_squared > 0.9 && m.r_squared <= 1.0);
}

/// Re-running with the same settings reproduces the report.
#[test]
fn test_end_to_end_is_reproducible() {
    let (_dir, config) = config_for(60, 3);
    let first = run_analysis(&config).unwrap();
    let second = run_analysis(&config).unwrap();
    assert_eq!(first.model, second.model);
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.funnel, second.funnel);
}

/// The JSON summary lands in the output directory and carries every section.
#[test]
fn test_json_report_is_written() {
    let (_dir, config) = config_for(40, 0);
    let report = run_analysis(&config).unwrap();
    let path = ReportWriter::write_json(&report, &config.output_dir).unwrap();
    assert_eq!(path, config.output_dir.join(JSON_FILE));

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in ["data", "group_stats", "histogram", "funnel", "split", "model", "metrics"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["model"]["reference"], "battery_electric");
}

/// A dataset with a single vehicle type cannot be fit.
#[test]
fn test_single_vehicle_type_aborts() {
    let csv = (0..20)
        .map(|i| format!("TESLA,Battery Electric Vehicle (BEV),{}", 200 + i * 5))
        .fold("Make,Electric Vehicle Type,Electric Range".to_string(), |acc, row| {
            acc + "\n" + &row
        });
    let (dir, path) = common::write_csv(&csv);
    let config = AnalysisConfig {
        data_path: path,
        output_dir: dir.path().join("report"),
        range_breaks: vec![0.0, 250.0],
        ..AnalysisConfig::default()
    };

    let err = run_analysis(&config).unwrap_err();
    assert!(format!("{err:#}").contains("Degenerate design"));
}
