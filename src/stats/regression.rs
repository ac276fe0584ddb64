//! Regression Module
//! Train/test split, OLS on a single categorical predictor, and held-out
//! evaluation.
//!
//! With one factor the least-squares solution has a closed form: the
//! intercept is the mean of the reference level and each offset is the
//! difference between a level mean and the reference mean.

use crate::data::{EvType, Vehicle};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RegressionError {
    #[error("train_fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),
    #[error("Split of {rows} rows at {fraction} leaves an empty {side} set")]
    EmptySplit {
        rows: usize,
        fraction: f64,
        side: &'static str,
    },
    #[error("Degenerate design: training set is empty")]
    EmptyTrainingSet,
    #[error("Degenerate design: need at least 2 vehicle types, found {0}")]
    SingleLevel(usize),
    #[error("Cannot predict level {0}: it was not present in the training set")]
    UnknownLevel(EvType),
    #[error("Predicted ({predicted}) and actual ({actual}) lengths differ")]
    LengthMismatch { predicted: usize, actual: usize },
    #[error("Cannot evaluate on an empty test set")]
    EmptyEvaluation,
}

/// Disjoint train/test partition of the cleaned dataset. Both sides keep the
/// input row order.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<Vehicle>,
    pub test: Vec<Vehicle>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// One estimated coefficient with its inference statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Fitted model: `range = intercept + offset[level]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedModel {
    pub reference: EvType,
    pub intercept: Coefficient,
    pub offsets: Vec<(EvType, Coefficient)>,
    pub n_obs: usize,
    pub df_residual: usize,
    pub residual_std_error: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
}

impl FittedModel {
    /// Offset of `level` relative to the reference; zero for the reference.
    pub fn offset(&self, level: EvType) -> Option<f64> {
        if level == self.reference {
            return Some(0.0);
        }
        self.offsets
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, c)| c.estimate)
    }
}

/// Held-out evaluation metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub r_squared: f64,
    pub n: usize,
}

/// Split with a ChaCha8 generator seeded from `seed`.
pub fn split(
    vehicles: &[Vehicle],
    train_fraction: f64,
    seed: u64,
) -> Result<Split, RegressionError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    split_with_rng(vehicles, train_fraction, &mut rng)
}

/// Shuffle row indices with `rng` and assign the first
/// `floor(n * train_fraction)` of them to the training set.
pub fn split_with_rng<R: Rng + ?Sized>(
    vehicles: &[Vehicle],
    train_fraction: f64,
    rng: &mut R,
) -> Result<Split, RegressionError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(RegressionError::InvalidFraction(train_fraction));
    }

    let n = vehicles.len();
    let n_train = (n as f64 * train_fraction).floor() as usize;
    let empty_side = if n_train == 0 {
        Some("training")
    } else if n_train == n {
        Some("testing")
    } else {
        None
    };
    if let Some(side) = empty_side {
        return Err(RegressionError::EmptySplit {
            rows: n,
            fraction: train_fraction,
            side,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut train_indices = order[..n_train].to_vec();
    let mut test_indices = order[n_train..].to_vec();
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    let pick = |idx: &[usize]| -> Vec<Vehicle> {
        idx.iter().map(|&i| vehicles[i].clone()).collect()
    };
    let split = Split {
        train: pick(&train_indices),
        test: pick(&test_indices),
        train_indices,
        test_indices,
    };

    log::debug!(
        "Split {} rows into {} train / {} test",
        n,
        split.train.len(),
        split.test.len()
    );
    Ok(split)
}

/// Two-sided p-value of `t` under Student's t with `df` degrees of freedom.
fn two_sided_p(t: f64, df: usize) -> f64 {
    if df == 0 || !t.is_finite() {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    }
}

fn coefficient(estimate: f64, std_error: f64, df: usize) -> Coefficient {
    let t_value = estimate / std_error;
    Coefficient {
        estimate,
        std_error,
        t_value,
        p_value: two_sided_p(t_value, df),
    }
}

/// Ordinary least squares of electric range on vehicle type.
///
/// The lowest present level is the reference. Deterministic: no randomness
/// is involved at fit time.
pub fn fit(train: &[Vehicle]) -> Result<FittedModel, RegressionError> {
    if train.is_empty() {
        return Err(RegressionError::EmptyTrainingSet);
    }

    // (level, n, mean) for each level present, in level order
    let levels: Vec<(EvType, usize, f64)> = EvType::ALL
        .iter()
        .filter_map(|&level| {
            let (n, sum) = train
                .iter()
                .filter(|v| v.ev_type == level)
                .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v.electric_range));
            (n > 0).then(|| (level, n, sum / n as f64))
        })
        .collect();

    if levels.len() < 2 {
        return Err(RegressionError::SingleLevel(levels.len()));
    }

    let n = train.len();
    let k = levels.len();
    let level_mean = |level: EvType| {
        levels
            .iter()
            .find(|(l, _, _)| *l == level)
            .map(|(_, _, m)| *m)
            .unwrap_or(f64::NAN)
    };

    let grand_mean = train.iter().map(|v| v.electric_range).sum::<f64>() / n as f64;
    let ss_res: f64 = train
        .iter()
        .map(|v| (v.electric_range - level_mean(v.ev_type)).powi(2))
        .sum();
    let ss_tot: f64 = train
        .iter()
        .map(|v| (v.electric_range - grand_mean).powi(2))
        .sum();

    let df_residual = n - k;
    let sigma2 = if df_residual > 0 {
        ss_res / df_residual as f64
    } else {
        f64::NAN
    };

    let (reference, n_ref, ref_mean) = levels[0];
    let intercept = coefficient(ref_mean, (sigma2 / n_ref as f64).sqrt(), df_residual);
    let offsets = levels[1..]
        .iter()
        .map(|&(level, n_level, mean)| {
            let se = (sigma2 * (1.0 / n_ref as f64 + 1.0 / n_level as f64)).sqrt();
            (level, coefficient(mean - ref_mean, se, df_residual))
        })
        .collect();

    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        f64::NAN
    };
    let adj_r_squared = if df_residual > 0 {
        1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64
    } else {
        f64::NAN
    };

    Ok(FittedModel {
        reference,
        intercept,
        offsets,
        n_obs: n,
        df_residual,
        residual_std_error: sigma2.sqrt(),
        r_squared,
        adj_r_squared,
    })
}

/// Predicted range for each row: intercept plus the row level's offset.
pub fn predict(model: &FittedModel, rows: &[Vehicle]) -> Result<Vec<f64>, RegressionError> {
    rows.iter()
        .map(|v| {
            model
                .offset(v.ev_type)
                .map(|offset| model.intercept.estimate + offset)
                .ok_or(RegressionError::UnknownLevel(v.ev_type))
        })
        .collect()
}

/// RMSE, MAE and R² of `predicted` against `actual`.
///
/// R² uses the mean of `actual` as the baseline, so it may be negative; it is
/// NaN when `actual` is constant.
pub fn evaluate(predicted: &[f64], actual: &[f64]) -> Result<Metrics, RegressionError> {
    if predicted.len() != actual.len() {
        return Err(RegressionError::LengthMismatch {
            predicted: predicted.len(),
            actual: actual.len(),
        });
    }
    if actual.is_empty() {
        return Err(RegressionError::EmptyEvaluation);
    }

    let n = actual.len() as f64;
    let mean_actual = actual.iter().sum::<f64>() / n;

    let (ss_res, abs_sum) = predicted
        .iter()
        .zip(actual)
        .fold((0.0, 0.0), |(sq, ab), (p, a)| {
            let r = p - a;
            (sq + r * r, ab + r.abs())
        });
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();

    Ok(Metrics {
        rmse: (ss_res / n).sqrt(),
        mae: abs_sum / n,
        r_squared: if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            f64::NAN
        },
        n: actual.len(),
    })
}
