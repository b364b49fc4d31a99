use ndarray::{Array1, ArrayView1};

/// A loss function over a batch of scalar predictions.
pub trait LossFn {
    /// Returns the loss of the batch.
    fn loss(&self, y_pred: ArrayView1<f64>, y: ArrayView1<f64>) -> f64;

    /// Returns the derivative of the loss with respect to every prediction.
    fn loss_prime(&self, y_pred: ArrayView1<f64>, y: ArrayView1<f64>) -> Array1<f64>;
}
