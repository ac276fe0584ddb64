//! Data module - CSV loading, cleaning and typed records

mod loader;
mod processor;
mod vehicle;

pub use loader::{normalize_column_name, DataLoader, LoaderError};
pub use processor::{
    DataProcessor, ProcessorError, EV_TYPE_ALIASES, EV_TYPE_COL, MAKE_COL,
    MISSING_RANGE_SENTINEL, MODEL_COL, RANGE_COL,
};
pub use vehicle::{EvType, Vehicle};
