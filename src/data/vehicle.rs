//! Vehicle Record Module
//! Typed view of a cleaned dataset row.

use serde::Serialize;
use std::fmt;

/// Electric vehicle category. Declaration order is the factor level order:
/// the first variant is the regression reference level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvType {
    BatteryElectric,
    PlugInHybrid,
}

impl EvType {
    pub const ALL: [EvType; 2] = [EvType::BatteryElectric, EvType::PlugInHybrid];

    /// Parse a free-text vehicle type such as
    /// `"Battery Electric Vehicle (BEV)"` or `"plug_in_hybrid"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = crate::data::normalize_column_name(raw);
        if key == "bev" || key.starts_with("battery_electric") {
            Some(EvType::BatteryElectric)
        } else if key == "phev" || key.starts_with("plug_in_hybrid") {
            Some(EvType::PlugInHybrid)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvType::BatteryElectric => "battery_electric",
            EvType::PlugInHybrid => "plug_in_hybrid",
        }
    }
}

impl fmt::Display for EvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vehicle from the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub electric_range: f64,
    pub ev_type: EvType,
    pub make: Option<String>,
    pub model: Option<String>,
}
