use serde::Serialize;

use crate::{Result, arch::Model, dataset::DataLoader};

/// The metrics of a single training epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub train_loss: f64,
    pub valid_loss: f64,
    pub mre: f64,
}

/// The `Trainer` is responsible for fitting a model to a dataset.
pub trait Trainer {
    /// Trains `model` on the `train` batches, validating on the `valid` batches after every
    /// epoch.
    ///
    /// # Arguments
    /// * `model` - The model to train, left holding the resulting parameters.
    /// * `train` - The training batches.
    /// * `valid` - The validation batches.
    ///
    /// # Returns
    /// The training loss this run settled on.
    fn train<M: Model>(
        &mut self,
        model: &mut M,
        train: &mut DataLoader,
        valid: &mut DataLoader,
    ) -> Result<f64>;

    /// Returns the metrics of the last epoch of the last `train` call.
    fn last_report(&self) -> Option<EpochReport>;
}
