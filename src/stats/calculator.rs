//! Statistics Calculator Module
//! Handles descriptive statistics and binned distributions of electric range.

use crate::data::{EvType, Vehicle};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of electric range for one vehicle type.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub ev_type: EvType,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Fixed-width histogram of electric range per vehicle type.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub bin_width: f64,
    /// Lower edge of each bin; bin `i` covers `[edges[i], edges[i] + bin_width)`.
    pub edges: Vec<f64>,
    pub counts: BTreeMap<EvType, Vec<usize>>,
}

impl Histogram {
    pub fn max_count(&self) -> usize {
        self.counts
            .values()
            .flat_map(|c| c.iter().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn upper_edge(&self) -> f64 {
        self.edges.last().map(|e| e + self.bin_width).unwrap_or(0.0)
    }
}

/// Handles descriptive calculations over vehicle records.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute count, mean, median, sample std, min and max. Empty input
    /// yields NaN statistics with a zero count.
    pub fn compute_descriptive_stats(ev_type: EvType, values: &[f64]) -> GroupStats {
        let n = values.len();
        if n == 0 {
            return GroupStats {
                ev_type,
                count: 0,
                mean: f64::NAN,
                median: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        GroupStats {
            ev_type,
            count: n,
            mean,
            median,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
        }
    }

    /// Collect the ranges of one vehicle type.
    pub fn ranges_for(vehicles: &[Vehicle], ev_type: EvType) -> Vec<f64> {
        vehicles
            .iter()
            .filter(|v| v.ev_type == ev_type)
            .map(|v| v.electric_range)
            .collect()
    }

    /// Per vehicle type range summary, reference level first. Types absent
    /// from the data are skipped.
    pub fn group_means(vehicles: &[Vehicle]) -> Vec<GroupStats> {
        EvType::ALL
            .iter()
            .map(|&ev_type| {
                Self::compute_descriptive_stats(ev_type, &Self::ranges_for(vehicles, ev_type))
            })
            .filter(|gs| gs.count > 0)
            .collect()
    }

    /// Bin the ranges of every vehicle type into `[k * width, (k + 1) * width)`
    /// bins starting at zero, enough to cover the largest range.
    pub fn range_histogram(vehicles: &[Vehicle], bin_width: f64) -> Histogram {
        let max = vehicles
            .iter()
            .map(|v| v.electric_range)
            .fold(0.0f64, f64::max);
        let n_bins = ((max / bin_width).floor() as usize + 1).max(1);
        let edges: Vec<f64> = (0..n_bins).map(|k| k as f64 * bin_width).collect();

        let mut counts: BTreeMap<EvType, Vec<usize>> = BTreeMap::new();
        for v in vehicles {
            let bin = ((v.electric_range / bin_width).floor() as usize).min(n_bins - 1);
            counts.entry(v.ev_type).or_insert_with(|| vec![0; n_bins])[bin] += 1;
        }

        Histogram {
            bin_width,
            edges,
            counts,
        }
    }
}
