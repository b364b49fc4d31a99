use crate::{MlErr, Result};

/// A `ParamGen` generates values for the initial state of the model's parameters.
pub trait ParamGen {
    /// Should sample at most `n` parameters.
    ///
    /// # Arguments
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// An option whether the generator is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f64>>;

    /// Samples exactly `n` parameters.
    ///
    /// # Returns
    /// An error if the generator is exhausted before producing `n` values.
    fn sample_exact(&mut self, n: usize) -> Result<Vec<f64>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let sample = self.sample(n).unwrap_or_default();

        if sample.len() != n {
            return Err(MlErr::ParamGenExhausted {
                got: sample.len(),
                expected: n,
            });
        }

        Ok(sample)
    }
}

impl<G: ParamGen + ?Sized> ParamGen for Box<G> {
    fn sample(&mut self, n: usize) -> Option<Vec<f64>> {
        (**self).sample(n)
    }
}
