use super::Optimizer;
use crate::{Result, arch::model::check_len};

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    beta1_t: f64,
    beta2_t: f64,
    v: Box<[f64]>,
    s: Box<[f64]>,
    s_max: Option<Box<[f64]>>,
    epsilon: f64,
}

impl Adam {
    pub const BETA1: f64 = 0.9;
    pub const BETA2: f64 = 0.999;
    pub const EPSILON: f64 = 1e-8;

    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new(len: usize, learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            beta1_t: 1.,
            beta2_t: 1.,
            v: vec![0.; len].into_boxed_slice(),
            s: vec![0.; len].into_boxed_slice(),
            s_max: None,
            epsilon,
        }
    }

    /// Creates a new `Adam` optimizer with the default betas and epsilon.
    pub fn with_lr(len: usize, learning_rate: f64) -> Self {
        Self::new(len, learning_rate, Self::BETA1, Self::BETA2, Self::EPSILON)
    }

    /// Enables or disables the AMSGrad variant, which normalizes every step by the running
    /// maximum of the second moment estimate.
    pub fn amsgrad(mut self, enabled: bool) -> Self {
        self.s_max = enabled.then(|| vec![0.; self.s.len()].into_boxed_slice());
        self
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, grad: &[f64], params: &mut [f64]) -> Result<()> {
        check_len("gradient", grad.len(), params.len())?;
        check_len("adam state", self.v.len(), params.len())?;

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        self.beta1_t *= b1;
        self.beta2_t *= b2;

        let bc1 = 1. - self.beta1_t;
        let bc2 = 1. - self.beta2_t;
        let step_size = lr * (bc2.sqrt() / bc1);

        let moments = params
            .iter_mut()
            .zip(grad)
            .zip(self.v.iter_mut())
            .zip(self.s.iter_mut());

        match self.s_max.as_deref_mut() {
            Some(s_max) => moments
                .zip(s_max.iter_mut())
                .for_each(|((((p, g), v), s), s_max)| {
                    *v = b1 * *v + (1. - b1) * g;
                    *s = b2 * *s + (1. - b2) * g.powi(2);
                    *s_max = s_max.max(*s);
                    *p -= step_size * *v / (s_max.sqrt() + eps);
                }),
            None => moments.for_each(|(((p, g), v), s)| {
                *v = b1 * *v + (1. - b1) * g;
                *s = b2 * *s + (1. - b2) * g.powi(2);
                *p -= step_size * *v / (s.sqrt() + eps);
            }),
        }

        Ok(())
    }
}
