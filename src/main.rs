//! EV Range Report - Electric Vehicle Range Analysis
//!
//! Reads `data.csv` from the working directory and writes the report to
//! stdout and the output directory.

use anyhow::{Context, Result};
use env_logger::Env;
use ev_range_report::charts::StaticChartRenderer;
use ev_range_report::config::{AnalysisConfig, CONFIG_FILE};
use ev_range_report::pipeline;
use ev_range_report::report::{ReportWriter, FUNNEL_FILE, HISTOGRAM_FILE};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::load_or_default(CONFIG_FILE)?;
    let report = pipeline::run_analysis(&config)?;

    ReportWriter::print(&report, config.funnel_top_n);

    let out = &config.output_dir;
    std::fs::create_dir_all(out)
        .with_context(|| format!("creating output directory {}", out.display()))?;
    StaticChartRenderer::render_histogram(
        &report.histogram,
        &report.group_stats,
        &out.join(HISTOGRAM_FILE),
    )?;
    StaticChartRenderer::render_funnel(
        &report.funnel,
        config.funnel_top_n,
        &out.join(FUNNEL_FILE),
    )?;
    ReportWriter::write_json(&report, out)?;

    Ok(())
}
