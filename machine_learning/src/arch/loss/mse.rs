use ndarray::{Array1, ArrayView1};

use super::LossFn;

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        (&y_pred - &y)
            .mapv(|x| x.powi(2))
            .mean()
            .unwrap_or_default()
    }

    fn loss_prime(&self, y_pred: ArrayView1<f64>, y: ArrayView1<f64>) -> Array1<f64> {
        (&y_pred - &y) * (2.0 / y_pred.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn loss_is_mean_of_squares() {
        let loss = Mse.loss(array![1.0, 2.0].view(), array![0.0, 4.0].view());
        assert_eq!(loss, 2.5);
    }

    #[test]
    fn empty_batch_has_zero_loss() {
        let empty = Array1::<f64>::zeros(0);
        assert_eq!(Mse.loss(empty.view(), empty.view()), 0.0);
    }

    #[test]
    fn derivative_scales_with_batch_size() {
        let prime = Mse.loss_prime(array![1.0, 2.0].view(), array![0.0, 4.0].view());
        assert_eq!(prime, array![1.0, -2.0]);
    }
}
