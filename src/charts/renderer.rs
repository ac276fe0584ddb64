//! Static Chart Renderer
//! Generates PNG charts for the report with plotters.
//!
//! Charts:
//! 1. Range histogram: overlaid bars per vehicle type plus a mean line each
//! 2. Correlation funnel: horizontal bars, strongest feature on top

use crate::data::EvType;
use crate::stats::{FeatureCorrelation, GroupStats, Histogram};
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

// Colors
const BLUE: RGBColor = RGBColor(91, 155, 213); // Reference level / positive
const RED: RGBColor = RGBColor(237, 125, 49); // Indicator level / negative
const GRAY: RGBColor = RGBColor(200, 200, 200); // Zero line

const HISTOGRAM_SIZE: (u32, u32) = (1000, 600);
const FUNNEL_ROW_HEIGHT: u32 = 28;
const FUNNEL_WIDTH: u32 = 1100;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render {chart}: {message}")]
    Render {
        chart: &'static str,
        message: String,
    },
    #[error("Nothing to draw for {0}")]
    Empty(&'static str),
}

fn render_err<E: std::fmt::Display>(chart: &'static str) -> impl Fn(E) -> ChartError {
    move |e| ChartError::Render {
        chart,
        message: e.to_string(),
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    fn level_color(ev_type: EvType) -> RGBColor {
        match ev_type {
            EvType::BatteryElectric => BLUE,
            EvType::PlugInHybrid => RED,
        }
    }

    /// Draw the per-type range histogram with a vertical line at each mean.
    pub fn render_histogram(
        hist: &Histogram,
        groups: &[GroupStats],
        path: &Path,
    ) -> Result<(), ChartError> {
        const CHART: &str = "range histogram";
        if hist.counts.is_empty() {
            return Err(ChartError::Empty(CHART));
        }
        let err = render_err(CHART);

        let root = BitMapBackend::new(path, HISTOGRAM_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(&err)?;

        let y_max = (hist.max_count() as f64 * 1.1).ceil() as u32 + 1;
        let mut chart = ChartBuilder::on(&root)
            .caption("Electric Range by Vehicle Type", ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..hist.upper_edge(), 0u32..y_max)
            .map_err(&err)?;

        chart
            .configure_mesh()
            .x_desc("Electric Range (miles)")
            .y_desc("Vehicles")
            .draw()
            .map_err(&err)?;

        for (&ev_type, counts) in &hist.counts {
            let color = Self::level_color(ev_type);
            let bars = hist
                .edges
                .iter()
                .zip(counts)
                .filter(|(_, &count)| count > 0)
                .map(|(&edge, &count)| {
                    Rectangle::new(
                        [(edge, 0u32), (edge + hist.bin_width, count as u32)],
                        color.mix(0.5).filled(),
                    )
                });
            chart
                .draw_series(bars)
                .map_err(&err)?
                .label(ev_type.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                });
        }

        for gs in groups {
            let color = Self::level_color(gs.ev_type);
            chart
                .draw_series(LineSeries::new(
                    vec![(gs.mean, 0u32), (gs.mean, y_max)],
                    color.stroke_width(2),
                ))
                .map_err(&err)?
                .label(format!("mean {} ({:.0} mi)", gs.ev_type, gs.mean))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], &color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(&err)?;

        root.present().map_err(&err)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }

    /// Draw the top `top_n` funnel features as horizontal correlation bars.
    pub fn render_funnel(
        ranked: &[FeatureCorrelation],
        top_n: usize,
        path: &Path,
    ) -> Result<(), ChartError> {
        const CHART: &str = "correlation funnel";
        let rows = &ranked[..ranked.len().min(top_n)];
        if rows.is_empty() {
            return Err(ChartError::Empty(CHART));
        }
        let err = render_err(CHART);

        let n = rows.len();
        let height = 120 + n as u32 * FUNNEL_ROW_HEIGHT;
        let root = BitMapBackend::new(path, (FUNNEL_WIDTH, height)).into_drawing_area();
        root.fill(&WHITE).map_err(&err)?;

        // Row i is drawn at y = n - 1 - i so the strongest feature sits on top
        let labels: Vec<String> = rows
            .iter()
            .map(|r| format!("{}__{}", r.column, r.bin))
            .collect();
        let label_for = |y: &f64| {
            let r = y.round();
            if (y - r).abs() > 1e-6 || r < 0.0 || r as usize >= n {
                return String::new();
            }
            labels[n - 1 - r as usize].clone()
        };

        let mut chart = ChartBuilder::on(&root)
            .caption("Correlation Funnel", ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(320)
            .build_cartesian_2d(-1f64..1f64, -0.5f64..(n as f64 - 0.5))
            .map_err(&err)?;

        chart
            .configure_mesh()
            .y_labels(n)
            .y_label_formatter(&label_for)
            .x_desc("Correlation with top range bin")
            .draw()
            .map_err(&err)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, -0.5), (0.0, n as f64 - 0.5)],
                GRAY.stroke_width(2),
            )))
            .map_err(&err)?;

        chart
            .draw_series(rows.iter().enumerate().map(|(i, r)| {
                let y = (n - 1 - i) as f64;
                let color = if r.correlation >= 0.0 { BLUE } else { RED };
                Rectangle::new([(0.0, y - 0.35), (r.correlation, y + 0.35)], color.filled())
            }))
            .map_err(&err)?;

        root.present().map_err(&err)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}
