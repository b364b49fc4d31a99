use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use capacity::{Boundary, MemoryPoint};
use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::{ExperimentConfig, Result};

/// The format of the `date` field of every result file.
pub const DATE_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Returns the current local time formatted with `DATE_FORMAT`.
pub fn now() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// The amount of trainable parameters of the measured model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamCounts {
    pub num_params_gates: usize,
    pub num_params_obs: usize,
    pub num_params: usize,
}

impl ParamCounts {
    pub fn new(num_params_gates: usize, num_params_obs: usize) -> Self {
        Self {
            num_params_gates,
            num_params_obs,
            num_params: num_params_gates + num_params_obs,
        }
    }
}

/// The record of a fat-shattering run.
#[derive(Debug, Clone, Serialize)]
pub struct FatResults {
    pub date: String,
    pub time_taken: f64,
    pub hyperparameters: ExperimentConfig,
    #[serde(flatten)]
    pub params: ParamCounts,
    pub fat_dim: i64,
    pub boundary: Boundary,
    pub fat_dim_norm: f64,
}

impl FatResults {
    pub fn new(
        config: ExperimentConfig,
        time_taken: Duration,
        params: ParamCounts,
        fat_dim: i64,
        boundary: Boundary,
        norm: f64,
    ) -> Self {
        Self {
            date: now(),
            time_taken: time_taken.as_secs_f64(),
            hyperparameters: config,
            params,
            fat_dim,
            boundary,
            fat_dim_norm: fat_dim as f64 / norm,
        }
    }
}

/// The record of a memorization capacity run.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryResults {
    pub date: String,
    pub time_taken: f64,
    pub hyperparameters: ExperimentConfig,
    #[serde(flatten)]
    pub params: ParamCounts,
    /// The largest capacity reached over every size.
    pub max_capacity: u64,
    pub memory: Vec<MemoryPoint>,
}

impl MemoryResults {
    pub fn new(
        config: ExperimentConfig,
        time_taken: Duration,
        params: ParamCounts,
        memory: Vec<MemoryPoint>,
    ) -> Self {
        Self {
            date: now(),
            time_taken: time_taken.as_secs_f64(),
            hyperparameters: config,
            params,
            max_capacity: memory.iter().map(|p| p.capacity).max().unwrap_or(0),
            memory,
        }
    }
}

/// Writes `results` as pretty JSON to a fresh `<uuid>.json` file inside `save_dir`,
/// creating the directory if needed.
///
/// # Returns
/// The path of the written file.
pub fn save_results<T: Serialize>(results: &T, save_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(save_dir)?;

    let path = save_dir.join(format!("{}.json", Uuid::new_v4()));
    let json = serde_json::to_string_pretty(results)?;
    fs::write(&path, json)?;

    Ok(path)
}
