use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{MlErr, Result};

/// A trainable scalar-output model.
///
/// A `Model` owns its flat parameter buffer, but evaluation takes the parameters explicitly so
/// callers can probe shifted or candidate parameter vectors without mutating the model.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the model's current parameters.
    fn params(&self) -> &[f64];

    /// Returns the model's current parameters for in place updates.
    fn params_mut(&mut self) -> &mut [f64];

    /// Evaluates the model on a single input.
    ///
    /// # Arguments
    /// * `x` - The input features.
    /// * `params` - The parameters to evaluate with, must have `size()` elements.
    ///
    /// # Returns
    /// The scalar prediction or an error if the shapes don't match.
    fn evaluate(&self, x: ArrayView1<f64>, params: &[f64]) -> Result<f64>;

    /// Evaluates the model on a single input and writes the derivative of the prediction with
    /// respect to every parameter into `grad`, overwriting its contents.
    ///
    /// # Arguments
    /// * `x` - The input features.
    /// * `params` - The parameters to evaluate with.
    /// * `grad` - A buffer of `size()` elements.
    ///
    /// # Returns
    /// The scalar prediction.
    fn evaluate_grad(&self, x: ArrayView1<f64>, params: &[f64], grad: &mut [f64]) -> Result<f64>;

    /// Replaces the model's parameters.
    ///
    /// # Returns
    /// An error if `params` doesn't have exactly `size()` elements.
    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        let expected = self.size();

        if params.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got: params.len(),
                expected,
            });
        }

        self.params_mut().copy_from_slice(params);
        Ok(())
    }

    /// Evaluates the model on a single input with its current parameters.
    fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        self.evaluate(x, self.params())
    }

    /// Evaluates the model on every row of `x` with its current parameters.
    fn predict_batch(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        x.rows()
            .into_iter()
            .map(|row| self.predict(row))
            .collect::<Result<Vec<_>>>()
            .map(Array1::from)
    }
}

/// Checks that an input has the amount of features a model expects.
pub(crate) fn check_input(x: ArrayView1<f64>, expected: usize) -> Result<()> {
    if x.len() != expected {
        return Err(MlErr::SizeMismatch {
            what: "input features",
            got: x.len(),
            expected,
        });
    }

    Ok(())
}

/// Checks that a parameter or gradient buffer has the amount of elements a model expects.
pub(crate) fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MlErr::SizeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}
