use std::ops::Range;

use ndarray::{ArrayView1, aview1};

use super::{
    Model,
    model::{check_input, check_len},
};
use crate::{Result, initialization::ParamGen};

/// An affine model `y = w·x + b`.
///
/// Flat layout: `[w_0, .., w_{in_dim - 1}, b]`.
#[derive(Debug, Clone)]
pub struct Linear {
    in_dim: usize,
    params: Vec<f64>,
}

impl Linear {
    /// Creates a new `Linear` model.
    ///
    /// # Arguments
    /// * `in_dim` - The amount of input features.
    /// * `params` - The initial weights followed by the bias.
    ///
    /// # Returns
    /// A new `Linear` or an error if `params` doesn't have `in_dim + 1` elements.
    pub fn new(in_dim: usize, params: Vec<f64>) -> Result<Self> {
        check_len("linear parameters", params.len(), in_dim + 1)?;
        Ok(Self { in_dim, params })
    }

    /// Creates a new `Linear` model with every parameter set to zero.
    pub fn zeros(in_dim: usize) -> Self {
        Self {
            in_dim,
            params: vec![0.0; in_dim + 1],
        }
    }

    /// Creates a new `Linear` model sampling its parameters from a generator.
    pub fn init<G: ParamGen>(in_dim: usize, param_gen: &mut G) -> Result<Self> {
        let params = param_gen.sample_exact(in_dim + 1)?;
        Self::new(in_dim, params)
    }

    /// Returns the amount of input features.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    fn weights_range(&self) -> Range<usize> {
        0..self.in_dim
    }

    fn view<'a>(&self, params: &'a [f64]) -> (ArrayView1<'a, f64>, f64) {
        let w = aview1(&params[self.weights_range()]);
        (w, params[self.in_dim])
    }
}

impl Model for Linear {
    fn size(&self) -> usize {
        self.in_dim + 1
    }

    fn params(&self) -> &[f64] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    fn evaluate(&self, x: ArrayView1<f64>, params: &[f64]) -> Result<f64> {
        check_input(x, self.in_dim)?;
        check_len("linear parameters", params.len(), self.size())?;

        let (w, b) = self.view(params);
        Ok(w.dot(&x) + b)
    }

    fn evaluate_grad(&self, x: ArrayView1<f64>, params: &[f64], grad: &mut [f64]) -> Result<f64> {
        check_len("linear gradient", grad.len(), self.size())?;
        let y = self.evaluate(x, params)?;

        // d(w·x + b)/dw = x, d(w·x + b)/db = 1
        for (g, &xi) in grad[self.weights_range()].iter_mut().zip(x.iter()) {
            *g = xi;
        }
        grad[self.in_dim] = 1.0;

        Ok(y)
    }
}
