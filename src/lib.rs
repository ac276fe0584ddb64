//! EV Range Report - electric vehicle range analysis
//!
//! Loads a vehicle registry CSV, summarizes electric range by vehicle type,
//! ranks binarized features in a correlation funnel, and fits a held-out
//! linear regression of range on vehicle type.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;
