use ndarray::{Array1, Array2};

use crate::{
    Result,
    arch::{Model, loss::LossFn, model::check_len},
    dataset::{BatchRef, DataLoader},
    optimization::Optimizer,
};

/// Performs a single optimization step on a batch.
///
/// # Arguments
/// * `model` - The model whose parameters get updated.
/// * `batch` - The batch to fit.
/// * `loss_fn` - The loss function to minimize.
/// * `optimizer` - The optimizer applying the gradient.
/// * `grad` - Scratch gradient buffer of `model.size()` elements.
///
/// # Returns
/// The batch loss before the update.
pub fn backprop_batch<M, L, O>(
    model: &mut M,
    batch: BatchRef<'_>,
    loss_fn: &L,
    optimizer: &mut O,
    grad: &mut [f64],
) -> Result<f64>
where
    M: Model + ?Sized,
    L: LossFn,
    O: Optimizer,
{
    let size = model.size();
    check_len("gradient", grad.len(), size)?;

    let mut jacobian = Array2::<f64>::zeros((batch.len(), size));
    let mut y_pred = Array1::<f64>::zeros(batch.len());

    for (i, x) in batch.x.rows().into_iter().enumerate() {
        let mut row = jacobian.row_mut(i);
        // rows of a fresh standard layout array are contiguous
        let row = row.as_slice_mut().unwrap_or_default();
        y_pred[i] = model.evaluate_grad(x, model.params(), row)?;
    }

    let loss = loss_fn.loss(y_pred.view(), batch.y);
    let delta = loss_fn.loss_prime(y_pred.view(), batch.y);

    // chain rule: dL/dp = sum_i dL/dpred_i * dpred_i/dp
    let total = delta.dot(&jacobian);
    grad.iter_mut().zip(total).for_each(|(g, t)| *g = t);

    optimizer.update_params(grad, model.params_mut())?;
    Ok(loss)
}

/// Size-weighted metrics of a model over every batch of a loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    /// Mean relative error `|pred - y| / |y|`.
    pub mre: f64,
}

/// Evaluates a model on every batch of `loader`, from its start.
///
/// Batch metrics are weighted by the batch size, so uneven final batches count once per sample.
pub fn evaluate<M, L>(model: &M, loader: &mut DataLoader, loss_fn: &L) -> Result<Evaluation>
where
    M: Model + ?Sized,
    L: LossFn,
{
    loader.reset();

    let (mut loss, mut mre, mut count) = (0.0, 0.0, 0);
    while let Some(batch) = loader.next_batch() {
        let y_pred = model.predict_batch(batch.x)?;
        let size = batch.len() as f64;

        loss += loss_fn.loss(y_pred.view(), batch.y) * size;
        let rel = ((&y_pred - &batch.y).mapv(f64::abs) / batch.y.mapv(f64::abs))
            .mean()
            .unwrap_or_default();
        mre += rel * size;
        count += batch.len();
    }

    loader.reset();

    let count = count as f64;
    Ok(Evaluation {
        loss: loss / count,
        mre: mre / count,
    })
}
