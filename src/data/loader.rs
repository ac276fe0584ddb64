//! CSV Data Loader Module
//! Handles CSV file loading and column name normalization using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("CSV file has no rows: {}", .0.display())]
    NoData(PathBuf),
    #[error("Columns {first:?} and {second:?} both normalize to {normalized:?}")]
    DuplicateColumn {
        first: String,
        second: String,
        normalized: String,
    },
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file with a header row.
    ///
    /// Parse errors are not ignored: a malformed file aborts the load.
    pub fn load_csv(file_path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
        let file_path = file_path.as_ref();
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        if df.height() == 0 {
            return Err(LoaderError::NoData(file_path.to_path_buf()));
        }

        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        Ok(df)
    }

    /// Return a copy of `df` whose column names are lower snake case.
    pub fn normalize_columns(df: &DataFrame) -> Result<DataFrame, LoaderError> {
        let originals: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut normalized: Vec<String> = Vec::with_capacity(originals.len());
        for (i, name) in originals.iter().enumerate() {
            let snake = normalize_column_name(name);
            if let Some(j) = normalized.iter().position(|n| n == &snake) {
                return Err(LoaderError::DuplicateColumn {
                    first: originals[j].clone(),
                    second: originals[i].clone(),
                    normalized: snake,
                });
            }
            normalized.push(snake);
        }

        let mut renamed = df.clone();
        renamed.set_column_names(normalized.iter().map(|s| s.as_str()))?;
        log::debug!("Normalized columns: {:?}", normalized);
        Ok(renamed)
    }

    /// Get list of column names from a DataFrame.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Convert an arbitrary header into lower snake case.
///
/// Runs of non-alphanumeric characters collapse into one `_`, and a word
/// boundary is inserted at lower-to-upper transitions (`ModelYear`) and
/// at the end of an acronym (`DOLVehicle`).
pub fn normalize_column_name(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let lower_to_upper = prev.is_lowercase() || prev.is_ascii_digit();
            let acronym_end = prev.is_uppercase() && next_is_lower;
            if lower_to_upper || acronym_end {
                out.push('_');
            }
        }

        out.extend(c.to_lowercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_registry_headers() {
        assert_eq!(normalize_column_name("Electric Range"), "electric_range");
        assert_eq!(normalize_column_name("EV Type"), "ev_type");
        assert_eq!(normalize_column_name("E.V. Type"), "e_v_type");
        assert_eq!(normalize_column_name("Model Year"), "model_year");
        assert_eq!(normalize_column_name("ModelYear"), "model_year");
        assert_eq!(normalize_column_name("DOLVehicleID"), "dol_vehicle_id");
        assert_eq!(normalize_column_name("VIN (1-10)"), "vin_1_10");
        assert_eq!(normalize_column_name("  2020 Census Tract "), "2020_census_tract");
        assert_eq!(normalize_column_name("electric_range"), "electric_range");
    }

    #[test]
    fn normalize_columns_rejects_collisions() {
        let df = df!(
            "Electric Range" => [10i64],
            "electric_range" => [20i64],
        )
        .unwrap();
        let err = DataLoader::normalize_columns(&df).unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateColumn { .. }));
    }

    #[test]
    fn normalize_columns_leaves_input_untouched() {
        let df = df!("Electric Range" => [10i64], "Make" => ["TESLA"]).unwrap();
        let renamed = DataLoader::normalize_columns(&df).unwrap();
        assert_eq!(DataLoader::get_columns(&renamed), vec!["electric_range", "make"]);
        assert_eq!(DataLoader::get_columns(&df), vec!["Electric Range", "Make"]);
    }
}
