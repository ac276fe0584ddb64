//! Report Generator Module
//! Prints the analysis tables to the console and writes the JSON summary.

use crate::data::EvType;
use crate::stats::{FeatureCorrelation, FittedModel, GroupStats, Histogram, Metrics};
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const JSON_FILE: &str = "report.json";
pub const HISTOGRAM_FILE: &str = "range_histogram.png";
pub const FUNNEL_FILE: &str = "correlation_funnel.png";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Row counts through the cleaning step.
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub source: PathBuf,
    pub rows_loaded: usize,
    pub rows_removed: usize,
    pub rows_analyzed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub seed: u64,
    pub train_fraction: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Everything the run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub data: DataSummary,
    pub group_stats: Vec<GroupStats>,
    pub histogram: Histogram,
    pub funnel: Vec<FeatureCorrelation>,
    pub split: SplitSummary,
    pub model: FittedModel,
    pub metrics: Metrics,
}

fn num(value: f64) -> Cell {
    Cell::new(format!("{:.3}", value)).set_alignment(CellAlignment::Right)
}

fn format_p(p: f64) -> String {
    if p.is_nan() {
        "-".to_string()
    } else if p < 2e-16 {
        "<2e-16".to_string()
    } else if p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.4}", p)
    }
}

/// Builds and prints the report tables.
pub struct ReportWriter;

impl ReportWriter {
    pub fn group_table(groups: &[GroupStats]) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["EV Type", "N", "Mean", "Median", "Std", "Min", "Max"]);
        for gs in groups {
            table.add_row(vec![
                Cell::new(gs.ev_type),
                Cell::new(gs.count).set_alignment(CellAlignment::Right),
                num(gs.mean),
                num(gs.median),
                num(gs.std),
                num(gs.min),
                num(gs.max),
            ]);
        }
        table
    }

    pub fn histogram_table(hist: &Histogram) -> Table {
        let levels: Vec<EvType> = hist.counts.keys().copied().collect();
        let mut header = vec!["Range (mi)".to_string()];
        header.extend(levels.iter().map(|l| l.to_string()));

        let mut table = Table::new();
        table.set_header(header);
        for (i, edge) in hist.edges.iter().enumerate() {
            let mut row = vec![Cell::new(format!("{:.0}-{:.0}", edge, edge + hist.bin_width))];
            row.extend(levels.iter().map(|l| {
                Cell::new(hist.counts[l][i]).set_alignment(CellAlignment::Right)
            }));
            table.add_row(row);
        }
        table
    }

    pub fn funnel_table(ranked: &[FeatureCorrelation], top_n: usize) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Feature", "Bin", "N", "Correlation"]);
        for fc in ranked.iter().take(top_n) {
            table.add_row(vec![
                Cell::new(&fc.column),
                Cell::new(&fc.bin),
                Cell::new(fc.count).set_alignment(CellAlignment::Right),
                num(fc.correlation),
            ]);
        }
        table
    }

    pub fn coefficient_table(model: &FittedModel) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Term", "Estimate", "Std. Error", "t value", "Pr(>|t|)"]);

        let intercept = format!("(Intercept) [{}]", model.reference);
        let terms = std::iter::once((intercept, &model.intercept)).chain(
            model
                .offsets
                .iter()
                .map(|(level, c)| (format!("e_v_type{}", level), c)),
        );
        for (term, c) in terms {
            table.add_row(vec![
                Cell::new(term),
                num(c.estimate),
                num(c.std_error),
                num(c.t_value),
                Cell::new(format_p(c.p_value)).set_alignment(CellAlignment::Right),
            ]);
        }
        table
    }

    pub fn metrics_table(metrics: &Metrics) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Metric", "Estimate"]);
        table.add_row(vec![Cell::new("rmse"), num(metrics.rmse)]);
        table.add_row(vec![Cell::new("mae"), num(metrics.mae)]);
        table.add_row(vec![Cell::new("rsq"), num(metrics.r_squared)]);
        table
    }

    /// Plain-language reading of each fitted offset.
    pub fn interpretation(model: &FittedModel) -> Vec<String> {
        model
            .offsets
            .iter()
            .map(|(level, c)| {
                let direction = if c.estimate < 0.0 { "fewer" } else { "more" };
                format!(
                    "{} vehicles average {:.0} {} miles of electric range than {}",
                    level,
                    c.estimate.abs(),
                    direction,
                    model.reference
                )
            })
            .collect()
    }

    /// Print every section of the report to stdout.
    pub fn print(report: &AnalysisReport, top_n: usize) {
        let data = &report.data;
        println!(
            "Loaded {} rows from {}; removed {} zero-range rows; analyzing {}.",
            data.rows_loaded,
            data.source.display(),
            data.rows_removed,
            data.rows_analyzed
        );

        println!("\nElectric range by vehicle type");
        println!("{}", Self::group_table(&report.group_stats));

        println!("\nRange distribution ({:.0}-mile bins)", report.histogram.bin_width);
        println!("{}", Self::histogram_table(&report.histogram));

        println!("\nCorrelation funnel (top {})", top_n.min(report.funnel.len()));
        println!("{}", Self::funnel_table(&report.funnel, top_n));

        let split = &report.split;
        println!(
            "\nSplit (seed {}, {:.0}% train): {} train / {} test rows",
            split.seed,
            split.train_fraction * 100.0,
            split.train_rows,
            split.test_rows
        );

        let model = &report.model;
        println!("\nLinear regression: electric_range ~ e_v_type");
        println!("{}", Self::coefficient_table(model));
        println!(
            "Residual standard error: {:.3} on {} degrees of freedom; R-squared: {:.4}, adjusted: {:.4}",
            model.residual_std_error, model.df_residual, model.r_squared, model.adj_r_squared
        );
        for line in Self::interpretation(model) {
            println!("{}", line);
        }

        println!("\nTest set metrics (n = {})", report.metrics.n);
        println!("{}", Self::metrics_table(&report.metrics));
    }

    /// Write the report as pretty JSON into `dir`.
    pub fn write_json(report: &AnalysisReport, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(JSON_FILE);
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(io_err)?;
        let file = File::create(&path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.flush().map_err(io_err)?;

        log::info!("Wrote {}", path.display());
        Ok(path)
    }
}
