use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Args;
use machine_learning::arch::qnn::MAX_QUBITS;
use serde::{Deserialize, Serialize};

use crate::{ExperimentErr, Result};

/// The configuration file read when none is given.
pub const DEFAULT_CONFIG: &str = "cfg_fat.yaml";

/// Every hyperparameter of a capacity experiment.
///
/// Keys missing from the configuration file take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub dmin: usize,
    pub dmax: usize,
    pub dstep: usize,
    pub gamma: f64,
    pub gamma_fac: f64,
    pub num_qubits: usize,
    pub num_reups: usize,
    pub num_layers: usize,
    pub omega: f64,
    #[serde(rename = "Sb")]
    pub sb: usize,
    #[serde(rename = "Sr")]
    pub sr: usize,
    pub lr: f64,
    pub amsgrad: bool,
    pub opt_steps: usize,
    pub opt_stop: f64,
    pub early_stop: bool,
    pub seed: Option<u64>,
    pub save_dir: PathBuf,
    pub cuda: bool,
    pub nmin: usize,
    pub nmax: usize,
    pub num_samples: usize,
    pub num_epochs: usize,
    pub stop_count: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dmin: 1,
            dmax: 10,
            dstep: 1,
            gamma: 0.1,
            gamma_fac: 1.0,
            num_qubits: 3,
            num_reups: 1,
            num_layers: 1,
            omega: 0.0,
            sb: 10,
            sr: 10,
            lr: 0.1,
            amsgrad: true,
            opt_steps: 300,
            opt_stop: 1e-16,
            early_stop: true,
            seed: None,
            save_dir: PathBuf::from("results"),
            cuda: false,
            nmin: 1,
            nmax: 10,
            num_samples: 10,
            num_epochs: 300,
            stop_count: 2,
        }
    }
}

impl ExperimentConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path).map_err(|e| {
            ExperimentErr::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Checks the values no estimator can run with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ExperimentErr::Config(msg));

        if !(1..=MAX_QUBITS).contains(&self.num_qubits) {
            return fail(format!(
                "num_qubits must be between 1 and {MAX_QUBITS}, got {}",
                self.num_qubits
            ));
        }

        for (key, value) in [
            ("num_reups", self.num_reups),
            ("Sb", self.sb),
            ("Sr", self.sr),
            ("opt_steps", self.opt_steps),
            ("num_samples", self.num_samples),
            ("num_epochs", self.num_epochs),
        ] {
            if value == 0 {
                return fail(format!("{key} must be at least 1"));
            }
        }

        if !(self.lr.is_finite() && self.lr > 0.0) {
            return fail(format!("lr must be positive, got {}", self.lr));
        }

        if self.gamma < 0.0 || self.gamma_fac < 0.0 {
            return fail("gamma and gamma_fac can't be negative".into());
        }

        Ok(())
    }
}

/// Command line overrides, one flag per configuration key.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Minimum value of d for experiments
    #[arg(long)]
    pub dmin: Option<usize>,
    /// Maximum value of d for experiments (included)
    #[arg(long)]
    pub dmax: Option<usize>,
    /// Step size for d in experiments
    #[arg(long)]
    pub dstep: Option<usize>,
    /// Margin value for fat shattering
    #[arg(long)]
    pub gamma: Option<f64>,
    /// Additional multiplicative factor for the margin of the generated data
    #[arg(long)]
    pub gamma_fac: Option<f64>,
    /// Number of qubits in the model
    #[arg(long)]
    pub num_qubits: Option<usize>,
    /// Number of data re-uploads in the model
    #[arg(long)]
    pub num_reups: Option<usize>,
    /// Number of variational layers per re-upload
    #[arg(long)]
    pub num_layers: Option<usize>,
    /// The exponential feature scaling factor
    #[arg(long)]
    pub omega: Option<f64>,
    /// Number of binary labelings to check shattering
    #[arg(long = "Sb")]
    pub sb: Option<usize>,
    /// Number of level offset samples to check shattering
    #[arg(long = "Sr")]
    pub sr: Option<usize>,
    /// Learning rate
    #[arg(long)]
    pub lr: Option<f64>,
    /// Use amsgrad
    #[arg(long)]
    pub amsgrad: Option<bool>,
    /// Number of optimization steps
    #[arg(long)]
    pub opt_steps: Option<usize>,
    /// Convergence threshold for optimization
    #[arg(long)]
    pub opt_stop: Option<f64>,
    /// Stop iterating once the capacity stops growing
    #[arg(long)]
    pub early_stop: Option<bool>,
    /// Random seed for the data and the initial parameters
    #[arg(long)]
    pub seed: Option<u64>,
    /// Directory for saving results
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
    /// Request a GPU backend
    #[arg(long)]
    pub cuda: Option<bool>,
    /// Smallest data set size for memory runs
    #[arg(long)]
    pub nmin: Option<usize>,
    /// Largest data set size for memory runs (included)
    #[arg(long)]
    pub nmax: Option<usize>,
    /// Random labelings per data set size
    #[arg(long)]
    pub num_samples: Option<usize>,
    /// Training epochs per labeling
    #[arg(long)]
    pub num_epochs: Option<usize>,
    /// Sizes without capacity growth before stopping
    #[arg(long)]
    pub stop_count: Option<usize>,
}

impl Overrides {
    /// Replaces every value of `config` given on the command line.
    pub fn apply(self, config: &mut ExperimentConfig) {
        macro_rules! set {
            ($src:ident => $dst:ident: $($key:ident),* $(,)?) => {
                $(if let Some(value) = $src.$key {
                    $dst.$key = value;
                })*
            };
        }

        let overrides = self;
        set!(
            overrides => config:
            dmin,
            dmax,
            dstep,
            gamma,
            gamma_fac,
            num_qubits,
            num_reups,
            num_layers,
            omega,
            sb,
            sr,
            lr,
            amsgrad,
            opt_steps,
            opt_stop,
            early_stop,
            save_dir,
            cuda,
            nmin,
            nmax,
            num_samples,
            num_epochs,
            stop_count,
        );

        if overrides.seed.is_some() {
            config.seed = overrides.seed;
        }
    }
}
