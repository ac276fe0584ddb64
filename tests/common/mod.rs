//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADER: &str = "VIN (1-10),Make,Model,Model Year,Electric Vehicle Type,Electric Range";

/// Registry-shaped CSV: BEVs averaging 250 miles, PHEVs averaging 83 miles
/// (exactly, when `per_type` is a multiple of 5), plus `zeros` zero-range
/// rows from a make that appears nowhere else.
pub fn registry_csv(per_type: usize, zeros: usize) -> String {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..per_type {
        let bev_range = 242 + (i % 5) * 4;
        let phev_range = 79 + (i % 5) * 2;
        let bev_model = if i % 2 == 0 { "MODEL 3" } else { "MODEL Y" };
        lines.push(format!(
            "B{i:05},TESLA,{bev_model},{},Battery Electric Vehicle (BEV),{bev_range}",
            2018 + i % 5
        ));
        lines.push(format!(
            "P{i:05},TOYOTA,PRIUS PRIME,{},Plug-in Hybrid Electric Vehicle (PHEV),{phev_range}",
            2016 + i % 5
        ));
    }
    for i in 0..zeros {
        lines.push(format!(
            "Z{i:05},GHOSTMOTORS,UNKNOWN,2023,Battery Electric Vehicle (BEV),0"
        ));
    }
    lines.join("\n") + "\n"
}

/// Write `contents` as `data.csv` in a fresh temporary directory.
pub fn write_csv(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}
