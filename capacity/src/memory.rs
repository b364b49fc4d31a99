use log::{debug, info};
use machine_learning::{
    arch::{Model, loss::Mse},
    dataset::{DataLoader, InMemoryDataset},
    training::{Trainer, evaluate},
};
use serde::Serialize;

use crate::{
    CapacityErr, Result,
    datagen::{CapacityData, DataGenCapacity},
};

/// The mantissa bits of an `f64`, the most a relative error can resolve.
pub const MAX_BITS: u32 = 52;

/// The result of fitting random labelings of `samples` points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryPoint {
    pub samples: usize,
    /// Median over labelings of the final training loss.
    pub train_loss: f64,
    /// Median over labelings of the final validation loss.
    pub valid_loss: f64,
    /// Median over labelings of the final mean relative error.
    pub mre: f64,
    /// Bits of every label recovered at that relative error.
    pub bits: u32,
    /// `samples * bits`.
    pub capacity: u64,
}

impl MemoryPoint {
    fn new(samples: usize, fitted: Fitted) -> Self {
        let bits = resolved_bits(fitted.mre);

        Self {
            samples,
            train_loss: fitted.train_loss,
            valid_loss: fitted.valid_loss,
            mre: fitted.mre,
            bits,
            capacity: samples as u64 * bits as u64,
        }
    }
}

/// `floor(log2(1 / mre))` clamped to `[0, MAX_BITS]`.
pub fn resolved_bits(mre: f64) -> u32 {
    if mre.is_nan() {
        return 0;
    }
    if mre <= 0.0 {
        return MAX_BITS;
    }

    (1.0 / mre).log2().floor().clamp(0.0, MAX_BITS as f64) as u32
}

/// Medians over the labelings of one data set.
#[derive(Debug, Clone, Copy)]
struct Fitted {
    train_loss: f64,
    valid_loss: f64,
    mre: f64,
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);

    let n = values.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => values[n / 2],
        _ => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    }
}

/// Fits every labeling of `data`, each starting from `initial`. Training and validation use
/// the same points, which is what memorizing them means.
fn fit_labelings<M, T>(
    model: &mut M,
    initial: &[f64],
    data: &CapacityData,
    trainer: &mut T,
) -> Result<Fitted>
where
    M: Model,
    T: Trainer,
{
    let samples = data.num_samples();

    let mut train_losses = Vec::with_capacity(samples);
    let mut valid_losses = Vec::with_capacity(samples);
    let mut mres = Vec::with_capacity(samples);

    for sample in 0..samples {
        model.set_params(initial)?;

        let dataset = InMemoryDataset::new(data.x.clone(), data.labels(sample).to_owned())?;
        let mut train = DataLoader::full_batch(dataset.clone());
        let mut valid = DataLoader::full_batch(dataset);

        let train_loss = trainer.train(model, &mut train, &mut valid)?;
        // measured on the parameters the trainer left in the model
        let eval = evaluate(model, &mut valid, &Mse)?;

        train_losses.push(train_loss);
        valid_losses.push(eval.loss);
        mres.push(eval.mre);
    }

    Ok(Fitted {
        train_loss: median(&mut train_losses),
        valid_loss: median(&mut valid_losses),
        mre: median(&mut mres),
    })
}

/// Generates one data set of `n` points and fits each of its random labelings.
///
/// # Returns
/// The median over labelings of the final mean relative error.
pub fn fit_rand_labels<M, T>(
    model: &mut M,
    datagen: &mut DataGenCapacity,
    trainer: &mut T,
    n: usize,
) -> Result<f64>
where
    M: Model,
    T: Trainer,
{
    let initial = model.params().to_vec();
    let data = datagen.gen_data(n)?;
    Ok(fit_labelings(model, &initial, &data, trainer)?.mre)
}

/// Estimates the memorization capacity of `model` for every data set size in `nmin..=nmax`.
///
/// Every size gets a fresh data set from `datagen` and every fit starts from the parameters the
/// model had on entry. With `stop_count = Some(k)` the search
/// ends once the capacity hasn't grown for `k` consecutive sizes.
///
/// # Returns
/// One point per size fitted, or an error if `nmin` is zero or `nmax < nmin`.
pub fn memory<M, T>(
    model: &mut M,
    datagen: &mut DataGenCapacity,
    trainer: &mut T,
    nmin: usize,
    nmax: usize,
    stop_count: Option<usize>,
) -> Result<Vec<MemoryPoint>>
where
    M: Model,
    T: Trainer,
{
    if nmin == 0 {
        return Err(CapacityErr::InvalidRange("nmin must be at least 1".into()));
    }
    if nmax < nmin {
        return Err(CapacityErr::InvalidRange(format!(
            "nmax ({nmax}) is smaller than nmin ({nmin})"
        )));
    }

    let initial = model.params().to_vec();
    let mut points: Vec<MemoryPoint> = Vec::with_capacity(nmax - nmin + 1);
    let mut not_improving = 0;

    for n in nmin..=nmax {
        let data = datagen.gen_data(n)?;
        let point = MemoryPoint::new(n, fit_labelings(model, &initial, &data, trainer)?);
        debug!(
            "n = {n}: mre={:e} bits={} capacity={}",
            point.mre, point.bits, point.capacity
        );

        match points.last() {
            Some(prev) if point.capacity <= prev.capacity => not_improving += 1,
            _ => not_improving = 0,
        }
        points.push(point);

        if stop_count.is_some_and(|count| not_improving >= count) {
            info!("capacity stopped growing at n = {n}");
            break;
        }
    }

    Ok(points)
}
