use log::trace;
use machine_learning::{
    arch::{
        Model,
        loss::{LossFn, Mse},
    },
    dataset::BatchRef,
    optimization::Optimizer,
    training::backprop_batch,
};
use ndarray::{ArrayView1, ArrayView2};

use crate::Result;

/// Fits a model to a single labeled data set.
pub trait Fitter {
    /// Optimizes the parameters of `model` so that it predicts `y` on `x`.
    ///
    /// # Returns
    /// The loss after fitting.
    fn fit<M: Model>(&mut self, model: &mut M, x: ArrayView2<f64>, y: ArrayView1<f64>)
    -> Result<f64>;
}

impl<T: Fitter + ?Sized> Fitter for &mut T {
    fn fit<M: Model>(
        &mut self,
        model: &mut M,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<f64> {
        (**self).fit(model, x, y)
    }
}

/// A full batch fitter running at most `opt_steps` optimizer steps.
///
/// A fresh optimizer is built for every fit, so no moment estimates leak between labelings.
pub struct OptimizerFitter<F, L = Mse> {
    optimizer_factory: F,
    loss_fn: L,
    opt_steps: usize,
    opt_stop: f64,
}

impl<F, O> OptimizerFitter<F>
where
    F: FnMut(usize) -> O,
    O: Optimizer,
{
    /// Creates a new `OptimizerFitter` minimizing the mean squared error.
    ///
    /// # Arguments
    /// * `optimizer_factory` - Builds an optimizer for the given amount of parameters.
    /// * `opt_steps` - The maximum amount of optimizer steps per fit.
    /// * `opt_stop` - Fitting stops once the loss is below this value.
    pub fn new(optimizer_factory: F, opt_steps: usize, opt_stop: f64) -> Self {
        Self::with_loss(optimizer_factory, Mse, opt_steps, opt_stop)
    }
}

impl<F, O, L> OptimizerFitter<F, L>
where
    F: FnMut(usize) -> O,
    O: Optimizer,
    L: LossFn,
{
    pub fn with_loss(optimizer_factory: F, loss_fn: L, opt_steps: usize, opt_stop: f64) -> Self {
        Self {
            optimizer_factory,
            loss_fn,
            opt_steps,
            opt_stop,
        }
    }
}

impl<F, O, L> Fitter for OptimizerFitter<F, L>
where
    F: FnMut(usize) -> O,
    O: Optimizer,
    L: LossFn,
{
    fn fit<M: Model>(
        &mut self,
        model: &mut M,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<f64> {
        let mut optimizer = (self.optimizer_factory)(model.size());
        let mut grad = vec![0.0; model.size()];
        let batch = BatchRef { x, y };

        for step in 0..self.opt_steps {
            let loss = backprop_batch(model, batch, &self.loss_fn, &mut optimizer, &mut grad)?;

            if loss < self.opt_stop {
                trace!("fit converged after {step} steps: loss={loss:e}");
                break;
            }
        }

        let y_pred = model.predict_batch(x)?;
        Ok(self.loss_fn.loss(y_pred.view(), y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machine_learning::{arch::Linear, optimization::GradientDescent};
    use ndarray::array;

    #[test]
    fn fits_two_points_exactly() {
        let mut fitter = OptimizerFitter::new(|_| GradientDescent::new(0.25), 200, 1e-20);
        let mut model = Linear::zeros(1);
        let x = array![[-1.0], [1.0]];
        let y = array![0.3, 0.9];

        let loss = fitter.fit(&mut model, x.view(), y.view()).unwrap();

        assert!(loss < 1e-12);
        assert!((model.params()[0] - 0.3).abs() < 1e-6);
        assert!((model.params()[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn zero_steps_leaves_the_model_untouched() {
        let mut fitter = OptimizerFitter::new(|_| GradientDescent::new(0.25), 0, 0.0);
        let mut model = Linear::new(1, vec![1.0, 0.0]).unwrap();
        let x = array![[1.0]];
        let y = array![3.0];

        let loss = fitter.fit(&mut model, x.view(), y.view()).unwrap();

        assert_eq!(loss, 4.0);
        assert_eq!(model.params(), [1.0, 0.0]);
    }
}
