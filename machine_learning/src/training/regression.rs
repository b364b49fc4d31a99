use std::path::PathBuf;

use log::{debug, warn};

use super::{
    Checkpoint, CheckpointKind, EpochReport, EpochWriter, LogWriter, Trainer, backprop_batch,
    evaluate,
};
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::DataLoader,
    optimization::Optimizer,
};

/// The knobs of a `RegressionTrainer`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// The maximum amount of epochs per `train` call.
    pub num_epochs: usize,
    /// Training stops as soon as the epoch loss is at most this value.
    pub opt_stop: f64,
    /// The relative loss improvement under which an epoch counts as stagnant.
    pub stagnation_threshold: f64,
    /// The amount of consecutive stagnant epochs that stops training.
    pub stagnation_count: usize,
    /// Whether to keep and return the best training loss instead of the last one.
    pub best_loss: bool,
    /// File prefix for the best parameter checkpoints, if any.
    pub checkpoint: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_epochs: 300,
            opt_stop: 1e-16,
            stagnation_threshold: 0.01,
            stagnation_count: 100,
            best_loss: true,
            checkpoint: None,
        }
    }
}

/// The best value seen for one metric and the parameters achieving it.
struct Best {
    kind: CheckpointKind,
    epoch: usize,
    value: f64,
    params: Vec<f64>,
}

impl Best {
    fn new(kind: CheckpointKind, params: &[f64]) -> Self {
        Self {
            kind,
            epoch: 0,
            value: f64::INFINITY,
            params: params.to_vec(),
        }
    }

    /// Records `params` if `value` improves on the best so far. NaN never does.
    fn offer(&mut self, epoch: usize, value: f64, params: &[f64]) {
        if value.is_nan() || value >= self.value {
            return;
        }

        self.epoch = epoch;
        self.value = value;
        self.params.copy_from_slice(params);
    }

    fn save(&self, prefix: &Option<PathBuf>) -> Result<()> {
        let Some(prefix) = prefix else {
            return Ok(());
        };

        let checkpoint = Checkpoint {
            epoch: self.epoch,
            value: self.value,
            params: self.params.clone(),
        };
        checkpoint.save(&self.kind.path(prefix))
    }
}

/// A full gradient descent style trainer for scalar regression models.
///
/// Every `train` call builds a fresh optimizer through its factory, so successive fits don't
/// share moment estimates.
pub struct RegressionTrainer<F, L, W = LogWriter> {
    optimizer_factory: F,
    loss_fn: L,
    writer: W,
    config: TrainerConfig,
    last: Option<EpochReport>,
}

impl<F, O, L> RegressionTrainer<F, L>
where
    F: FnMut(usize) -> O,
    O: Optimizer,
    L: LossFn,
{
    /// Creates a new `RegressionTrainer` logging its epochs.
    ///
    /// # Arguments
    /// * `optimizer_factory` - Builds an optimizer for a model of the given amount of parameters.
    /// * `loss_fn` - The loss function to minimize.
    /// * `config` - The trainer's configuration.
    pub fn new(optimizer_factory: F, loss_fn: L, config: TrainerConfig) -> Self {
        Self::with_writer(optimizer_factory, loss_fn, LogWriter, config)
    }
}

impl<F, O, L, W> RegressionTrainer<F, L, W>
where
    F: FnMut(usize) -> O,
    O: Optimizer,
    L: LossFn,
    W: EpochWriter,
{
    /// Creates a new `RegressionTrainer` sending its epoch reports to `writer`.
    pub fn with_writer(optimizer_factory: F, loss_fn: L, writer: W, config: TrainerConfig) -> Self {
        Self {
            optimizer_factory,
            loss_fn,
            writer,
            config,
            last: None,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TrainerConfig {
        &mut self.config
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn train_epoch<M: Model>(
        &self,
        model: &mut M,
        loader: &mut DataLoader,
        optimizer: &mut O,
        grad: &mut [f64],
    ) -> Result<f64> {
        loader.reset();

        let (mut loss, mut count) = (0.0, 0);
        while let Some(batch) = loader.next_batch() {
            let size = batch.len();
            loss += backprop_batch(model, batch, &self.loss_fn, optimizer, grad)? * size as f64;
            count += size;
        }

        Ok(loss / count as f64)
    }
}

impl<F, O, L, W> Trainer for RegressionTrainer<F, L, W>
where
    F: FnMut(usize) -> O,
    O: Optimizer,
    L: LossFn,
    W: EpochWriter,
{
    fn train<M: Model>(
        &mut self,
        model: &mut M,
        train: &mut DataLoader,
        valid: &mut DataLoader,
    ) -> Result<f64> {
        if self.config.num_epochs == 0 {
            return Err(MlErr::InvalidConfig("num_epochs must be at least 1".into()));
        }

        self.last = None;

        let mut optimizer = (self.optimizer_factory)(model.size());
        let mut grad = vec![0.0; model.size()];

        let mut best_train = Best::new(CheckpointKind::BestTrain, model.params());
        let mut best_valid = Best::new(CheckpointKind::BestValid, model.params());
        let mut best_mre = Best::new(CheckpointKind::BestMre, model.params());

        let mut prev_loss = None;
        let mut stagnant = 0;
        let mut train_loss = f64::INFINITY;

        for epoch in 1..=self.config.num_epochs {
            train_loss = self.train_epoch(model, train, &mut optimizer, &mut grad)?;
            let eval = evaluate(model, valid, &self.loss_fn)?;

            let report = EpochReport {
                epoch,
                train_loss,
                valid_loss: eval.loss,
                mre: eval.mre,
            };
            self.writer.write(&report);
            self.last = Some(report);

            if self.config.best_loss {
                let params = model.params();
                best_train.offer(epoch, train_loss, params);
                best_valid.offer(epoch, eval.loss, params);
                best_mre.offer(epoch, eval.mre, params);
            }

            if train_loss <= self.config.opt_stop {
                debug!("reached opt_stop at epoch {epoch}: loss={train_loss:e}");
                break;
            }

            if let Some(prev) = prev_loss {
                if (prev - train_loss) / prev < self.config.stagnation_threshold {
                    stagnant += 1;
                } else {
                    stagnant = 0;
                }

                if stagnant >= self.config.stagnation_count {
                    warn!("loss stagnated for {stagnant} epochs, stopping at epoch {epoch}");
                    break;
                }
            }

            prev_loss = Some(train_loss);
        }

        if self.config.best_loss {
            for best in [&best_train, &best_valid, &best_mre] {
                best.save(&self.config.checkpoint)?;
            }
        }

        if self.config.best_loss && best_train.value.is_finite() {
            model.set_params(&best_train.params)?;
            return Ok(best_train.value);
        }

        Ok(train_loss)
    }

    fn last_report(&self) -> Option<EpochReport> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{
        arch::{Linear, loss::Mse},
        dataset::InMemoryDataset,
        optimization::{Adam, GradientDescent},
    };
    use ndarray::{Array1, Array2, array};

    fn line_loader(batch_size: usize) -> DataLoader {
        let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64 / 5.0);
        let y = x.column(0).mapv(|x| 2.0 * x + 1.0);
        let dataset = InMemoryDataset::new(x, y).unwrap();
        DataLoader::new(dataset, NonZeroUsize::new(batch_size).unwrap())
    }

    #[test]
    fn fits_a_line() {
        let config = TrainerConfig {
            num_epochs: 2000,
            stagnation_count: usize::MAX,
            ..Default::default()
        };
        let mut trainer = RegressionTrainer::new(|_| GradientDescent::new(0.5), Mse, config);
        let mut model = Linear::zeros(1);
        let (mut train, mut valid) = (line_loader(6), line_loader(6));

        let loss = trainer.train(&mut model, &mut train, &mut valid).unwrap();

        assert!(loss < 1e-6);
        assert!((model.params()[0] - 2.0).abs() < 1e-2);
        assert!((model.params()[1] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn records_every_epoch_until_stagnation() {
        let config = TrainerConfig {
            num_epochs: 50,
            stagnation_count: 3,
            ..Default::default()
        };
        // a zero learning rate never improves the loss
        let mut trainer = RegressionTrainer::with_writer(
            |_| GradientDescent::new(0.0),
            Mse,
            Vec::new(),
            config,
        );
        let mut model = Linear::zeros(1);
        let (mut train, mut valid) = (line_loader(4), line_loader(4));

        trainer.train(&mut model, &mut train, &mut valid).unwrap();

        // epoch 1 sets the reference, epochs 2..=4 are stagnant
        let reports = trainer.writer();
        assert_eq!(reports.len(), 4);
        assert_eq!(trainer.last_report(), reports.last().copied());
        assert!(reports.windows(2).all(|w| w[0].train_loss == w[1].train_loss));
    }

    #[test]
    fn opt_stop_ends_training() {
        let config = TrainerConfig {
            num_epochs: 100,
            opt_stop: 1.0,
            ..Default::default()
        };
        let mut trainer = RegressionTrainer::with_writer(
            |_| GradientDescent::new(0.0),
            Mse,
            Vec::new(),
            config,
        );
        let mut model = Linear::new(1, vec![2.0, 1.0]).unwrap();
        let (mut train, mut valid) = (line_loader(6), line_loader(6));

        let loss = trainer.train(&mut model, &mut train, &mut valid).unwrap();

        assert_eq!(loss, 0.0);
        assert_eq!(trainer.writer().len(), 1);
    }

    #[test]
    fn last_loss_when_not_keeping_best() {
        let config = TrainerConfig {
            num_epochs: 5,
            best_loss: false,
            ..Default::default()
        };
        let mut trainer = RegressionTrainer::with_writer(
            |n| Adam::with_lr(n, 0.1),
            Mse,
            Vec::new(),
            config,
        );
        let mut model = Linear::zeros(1);
        let (mut train, mut valid) = (line_loader(2), line_loader(2));

        let loss = trainer.train(&mut model, &mut train, &mut valid).unwrap();

        assert_eq!(Some(loss), trainer.writer().last().map(|r| r.train_loss));
    }

    #[test]
    fn mre_weights_uneven_batches() {
        let x = array![[1.0], [1.0], [1.0]];
        let y: Array1<f64> = array![1.0, 1.0, 4.0];
        let dataset = InMemoryDataset::new(x, y).unwrap();
        let mut train = DataLoader::new(dataset.clone(), NonZeroUsize::new(2).unwrap());
        let mut valid = DataLoader::new(dataset, NonZeroUsize::new(2).unwrap());

        let config = TrainerConfig {
            num_epochs: 1,
            ..Default::default()
        };
        let mut trainer = RegressionTrainer::with_writer(
            |_| GradientDescent::new(0.0),
            Mse,
            Vec::new(),
            config,
        );
        let mut model = Linear::new(1, vec![1.0, 0.0]).unwrap();

        trainer.train(&mut model, &mut train, &mut valid).unwrap();

        // batch means are 0 and 0.75, the unweighted mean of means would be 0.375
        let report = trainer.last_report().unwrap();
        assert!((report.mre - 0.25).abs() < 1e-12);
    }

    #[test]
    fn writes_best_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("linear");
        let config = TrainerConfig {
            num_epochs: 10,
            checkpoint: Some(prefix.clone()),
            ..Default::default()
        };
        let mut trainer = RegressionTrainer::new(|_| GradientDescent::new(0.5), Mse, config);
        let mut model = Linear::zeros(1);
        let (mut train, mut valid) = (line_loader(6), line_loader(6));

        let loss = trainer.train(&mut model, &mut train, &mut valid).unwrap();

        for kind in [
            CheckpointKind::BestTrain,
            CheckpointKind::BestValid,
            CheckpointKind::BestMre,
        ] {
            assert!(kind.path(&prefix).exists());
        }

        let best = Checkpoint::load(&CheckpointKind::BestTrain.path(&prefix)).unwrap();
        assert!((best.value - loss).abs() <= 1e-12 * loss.max(1.0));
        for (saved, param) in best.params.iter().zip(model.params()) {
            assert!((saved - param).abs() < 1e-12);
        }
    }

    #[test]
    fn checkpoints_are_written_without_any_improvement() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("nan");
        let config = TrainerConfig {
            num_epochs: 3,
            checkpoint: Some(prefix.clone()),
            ..Default::default()
        };
        let x = array![[0.0], [1.0]];
        let y = array![f64::NAN, 1.0];
        let dataset = InMemoryDataset::new(x, y).unwrap();
        let mut train = DataLoader::full_batch(dataset.clone());
        let mut valid = DataLoader::full_batch(dataset);
        let mut trainer = RegressionTrainer::with_writer(
            |_| GradientDescent::new(0.1),
            Mse,
            Vec::new(),
            config,
        );
        let mut model = Linear::zeros(1);

        let loss = trainer.train(&mut model, &mut train, &mut valid).unwrap();

        assert!(loss.is_nan());
        assert_eq!(trainer.writer().len(), 3);
        for kind in [
            CheckpointKind::BestTrain,
            CheckpointKind::BestValid,
            CheckpointKind::BestMre,
        ] {
            assert!(kind.path(&prefix).exists());
        }
    }

    #[test]
    fn zero_epochs_is_an_error() {
        let config = TrainerConfig {
            num_epochs: 0,
            ..Default::default()
        };
        let mut trainer = RegressionTrainer::new(|_| GradientDescent::new(0.5), Mse, config);
        let mut model = Linear::zeros(1);
        let (mut train, mut valid) = (line_loader(6), line_loader(6));

        assert!(matches!(
            trainer.train(&mut model, &mut train, &mut valid),
            Err(MlErr::InvalidConfig(_))
        ));
    }
}
