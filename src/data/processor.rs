//! Data Processor Module
//! Handles data cleaning and typed extraction of vehicle records.

use super::vehicle::{EvType, Vehicle};
use polars::prelude::*;
use thiserror::Error;

/// Numeric target column.
pub const RANGE_COL: &str = "electric_range";
/// Categorical predictor column.
pub const EV_TYPE_COL: &str = "e_v_type";
/// Other spellings of the predictor column accepted on input.
pub const EV_TYPE_ALIASES: [&str; 2] = ["ev_type", "electric_vehicle_type"];
pub const MAKE_COL: &str = "make";
pub const MODEL_COL: &str = "model";

/// Assumption: a range of exactly zero marks missing data (the registry has
/// not researched the model), not a vehicle that cannot drive on battery.
/// Rows carrying it are removed by [`DataProcessor::clean`] before any
/// statistic is computed.
pub const MISSING_RANGE_SENTINEL: f64 = 0.0;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column {0:?} is missing")]
    MissingColumn(String),
    #[error("Row {row}: electric_range is missing or not numeric")]
    InvalidRange { row: usize },
    #[error("Row {row}: electric_range {value} is negative")]
    NegativeRange { row: usize, value: f64 },
    #[error("Row {row}: unrecognized vehicle type {value:?}")]
    InvalidVehicleType { row: usize, value: String },
    #[error("No rows left after removing zero-range vehicles")]
    EmptyAfterCleaning,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Return a copy of `df` whose vehicle type column is named [`EV_TYPE_COL`].
    pub fn resolve_vehicle_type_column(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let names = df.get_column_names();
        if names.iter().any(|n| n.as_str() == EV_TYPE_COL) {
            return Ok(df.clone());
        }

        let alias = EV_TYPE_ALIASES
            .iter()
            .find(|alias| names.iter().any(|n| n.as_str() == **alias))
            .ok_or_else(|| ProcessorError::MissingColumn(EV_TYPE_COL.to_string()))?;

        log::debug!("Using column {:?} as {:?}", alias, EV_TYPE_COL);
        let mut renamed = df.clone();
        renamed.rename(alias, EV_TYPE_COL.into())?;
        Ok(renamed)
    }

    /// Cast the range to `Float64` and drop rows holding [`MISSING_RANGE_SENTINEL`].
    ///
    /// A null, unparseable or negative range aborts with the offending row.
    /// The returned frame feeds every downstream step.
    pub fn clean(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let range = df
            .column(RANGE_COL)
            .map_err(|_| ProcessorError::MissingColumn(RANGE_COL.to_string()))?
            .cast(&DataType::Float64)?;
        let range_ca = range.f64()?;

        for (row, value) in range_ca.into_iter().enumerate() {
            match value {
                None => return Err(ProcessorError::InvalidRange { row }),
                Some(v) if v.is_nan() => return Err(ProcessorError::InvalidRange { row }),
                Some(v) if v < 0.0 => return Err(ProcessorError::NegativeRange { row, value: v }),
                Some(_) => {}
            }
        }

        let cleaned = df
            .clone()
            .lazy()
            .with_column(col(RANGE_COL).cast(DataType::Float64))
            .filter(col(RANGE_COL).neq(lit(MISSING_RANGE_SENTINEL)))
            .collect()?;

        if cleaned.height() == 0 {
            return Err(ProcessorError::EmptyAfterCleaning);
        }

        log::info!(
            "Removed {} zero-range rows, {} rows remain",
            df.height() - cleaned.height(),
            cleaned.height()
        );
        Ok(cleaned)
    }

    /// Extract typed vehicle records from a cleaned DataFrame.
    pub fn extract_vehicles(df: &DataFrame) -> Result<Vec<Vehicle>, ProcessorError> {
        let range = df
            .column(RANGE_COL)
            .map_err(|_| ProcessorError::MissingColumn(RANGE_COL.to_string()))?
            .cast(&DataType::Float64)?;
        let range_ca = range.f64()?;

        let ev_type = df
            .column(EV_TYPE_COL)
            .map_err(|_| ProcessorError::MissingColumn(EV_TYPE_COL.to_string()))?
            .cast(&DataType::String)?;
        let ev_type_ca = ev_type.as_materialized_series().str()?;

        let make = Self::optional_strings(df, MAKE_COL)?;
        let model = Self::optional_strings(df, MODEL_COL)?;

        let mut vehicles = Vec::with_capacity(df.height());
        let rows = range_ca.into_iter().zip(ev_type_ca.into_iter()).enumerate();
        for (row, (range, raw_type)) in rows {
            let electric_range = range.ok_or(ProcessorError::InvalidRange { row })?;
            let ev_type = raw_type.and_then(EvType::parse).ok_or_else(|| {
                ProcessorError::InvalidVehicleType {
                    row,
                    value: raw_type.unwrap_or("null").to_string(),
                }
            })?;

            vehicles.push(Vehicle {
                electric_range,
                ev_type,
                make: make.get(row).cloned().flatten(),
                model: model.get(row).cloned().flatten(),
            });
        }

        Ok(vehicles)
    }

    /// Read an optional text column; absent columns yield an empty vector.
    fn optional_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let Ok(column) = df.column(name) else {
            return Ok(Vec::new());
        };
        let text = column.cast(&DataType::String)?;
        Ok(text
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "electric_range" => [200i64, 0, 30, 0, 250],
            "e_v_type" => [
                "Battery Electric Vehicle (BEV)",
                "Battery Electric Vehicle (BEV)",
                "Plug-in Hybrid Electric Vehicle (PHEV)",
                "Plug-in Hybrid Electric Vehicle (PHEV)",
                "Battery Electric Vehicle (BEV)",
            ],
            "make" => ["TESLA", "KIA", "TOYOTA", "BMW", "NISSAN"],
        )
        .unwrap()
    }

    #[test]
    fn clean_drops_zero_range_rows() {
        let cleaned = DataProcessor::clean(&sample()).unwrap();
        assert_eq!(cleaned.height(), 3);
        let ranges: Vec<f64> = cleaned
            .column(RANGE_COL)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ranges, vec![200.0, 30.0, 250.0]);
    }

    #[test]
    fn clean_rejects_missing_range() {
        let df = df!(
            "electric_range" => [Some(10.0f64), None],
            "e_v_type" => ["BEV", "BEV"],
        )
        .unwrap();
        let err = DataProcessor::clean(&df).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidRange { row: 1 }));
    }

    #[test]
    fn clean_rejects_negative_range() {
        let df = df!("electric_range" => [10.0f64, -5.0], "e_v_type" => ["BEV", "BEV"]).unwrap();
        let err = DataProcessor::clean(&df).unwrap_err();
        assert!(matches!(err, ProcessorError::NegativeRange { row: 1, .. }));
    }

    #[test]
    fn clean_rejects_all_zero_dataset() {
        let df = df!("electric_range" => [0i64, 0], "e_v_type" => ["BEV", "PHEV"]).unwrap();
        let err = DataProcessor::clean(&df).unwrap_err();
        assert!(matches!(err, ProcessorError::EmptyAfterCleaning));
    }

    #[test]
    fn extract_vehicles_parses_types() {
        let cleaned = DataProcessor::clean(&sample()).unwrap();
        let vehicles = DataProcessor::extract_vehicles(&cleaned).unwrap();
        assert_eq!(vehicles.len(), 3);
        assert_eq!(vehicles[0].ev_type, EvType::BatteryElectric);
        assert_eq!(vehicles[1].ev_type, EvType::PlugInHybrid);
        assert_eq!(vehicles[1].make.as_deref(), Some("TOYOTA"));
        assert_eq!(vehicles[2].model, None);
    }

    #[test]
    fn extract_vehicles_rejects_unknown_type() {
        let df = df!("electric_range" => [10.0f64], "e_v_type" => ["Fuel Cell"]).unwrap();
        let err = DataProcessor::extract_vehicles(&df).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidVehicleType { row: 0, .. }));
    }

    #[test]
    fn resolves_vehicle_type_alias() {
        let df = df!("electric_range" => [10.0f64], "ev_type" => ["BEV"]).unwrap();
        let resolved = DataProcessor::resolve_vehicle_type_column(&df).unwrap();
        assert!(resolved.column(EV_TYPE_COL).is_ok());
        assert!(df.column(EV_TYPE_COL).is_err());
    }

    #[test]
    fn missing_vehicle_type_column_is_an_error() {
        let df = df!("electric_range" => [10.0f64]).unwrap();
        let err = DataProcessor::resolve_vehicle_type_column(&df).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(_)));
    }
}
