//! Capacity experiments on parameterized quantum circuits, configured from YAML and the
//! command line and recorded as JSON.

pub mod config;
pub mod error;
pub mod results;
pub mod run;

pub use config::{DEFAULT_CONFIG, ExperimentConfig, Overrides};
pub use error::{ExperimentErr, Result};
pub use run::{run_fat, run_memory};
