//! Parameterized quantum circuit models.
//!
//! The circuits are evaluated exactly on a dense state vector, which keeps them usable as plain
//! differentiable functions `evaluate(x, params) -> f64` for a handful of qubits.

mod state;

use std::{f64::consts::FRAC_PI_2, ops::Range};

use ndarray::ArrayView1;

use super::{
    Model,
    model::{check_input, check_len},
};
use crate::{MlErr, Result, initialization::ParamGen};
use state::StateVector;

/// Largest register the dense simulation accepts.
pub const MAX_QUBITS: usize = 20;

/// Maps the flat parameter buffer of an `IqpeReuploadSu2Parity` into its three tensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QnnLayout {
    /// Initial RY angles, shape `(reps, num_qubits)`.
    pub init_theta: Range<usize>,
    /// Two-design RY angles, shape `(reps, layers, num_qubits - 1, 2)`.
    pub theta: Range<usize>,
    /// Observable weights, one per parity observable (identity included), `2^num_qubits`.
    pub w: Range<usize>,
}

impl QnnLayout {
    pub fn new(num_qubits: usize, reps: usize, layers: usize) -> Self {
        let init_len = reps * num_qubits;
        let theta_len = reps * layers * num_qubits.saturating_sub(1) * 2;
        let w_len = 1 << num_qubits;

        Self {
            init_theta: 0..init_len,
            theta: init_len..init_len + theta_len,
            w: init_len + theta_len..init_len + theta_len + w_len,
        }
    }

    /// Total amount of parameters.
    pub fn len(&self) -> usize {
        self.w.end
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Amount of trainable gate angles.
    pub fn num_gates(&self) -> usize {
        self.theta.end
    }
}

/// An IQP embedding circuit with simplified two-design SU(2) layers, re-uploaded `reps` times,
/// measured on a weighted sum of all parity observables.
///
/// Re-upload `k` embeds the features scaled by `2^(omega * k)`.
#[derive(Debug, Clone)]
pub struct IqpeReuploadSu2Parity {
    num_qubits: usize,
    reps: usize,
    layers: usize,
    omega: f64,
    layout: QnnLayout,
    params: Vec<f64>,
}

impl IqpeReuploadSu2Parity {
    /// Creates a new `IqpeReuploadSu2Parity`.
    ///
    /// # Arguments
    /// * `num_qubits` - The amount of qubits, which is also the amount of input features.
    /// * `reps` - The amount of data re-uploads.
    /// * `layers` - The amount of two-design layers per re-upload.
    /// * `omega` - The exponential feature scaling factor.
    /// * `params` - Exactly three tensors: the initial thetas, the main thetas and the weights W.
    ///
    /// # Returns
    /// A new instance or an error if the shapes are invalid.
    pub fn new(
        num_qubits: usize,
        reps: usize,
        layers: usize,
        omega: f64,
        params: Vec<Vec<f64>>,
    ) -> Result<Self> {
        Self::check_shape(num_qubits, reps)?;
        check_len("parameter tensors", params.len(), 3)?;

        let layout = QnnLayout::new(num_qubits, reps, layers);
        check_len("initial thetas", params[0].len(), layout.init_theta.len())?;
        check_len("thetas", params[1].len(), layout.theta.len())?;
        check_len("observable weights", params[2].len(), layout.w.len())?;

        Ok(Self {
            num_qubits,
            reps,
            layers,
            omega,
            layout,
            params: params.concat(),
        })
    }

    /// Creates a new `IqpeReuploadSu2Parity` sampling every parameter from a generator.
    pub fn init<G: ParamGen>(
        num_qubits: usize,
        reps: usize,
        layers: usize,
        omega: f64,
        param_gen: &mut G,
    ) -> Result<Self> {
        Self::check_shape(num_qubits, reps)?;

        let layout = QnnLayout::new(num_qubits, reps, layers);
        let params = param_gen.sample_exact(layout.len())?;

        Ok(Self {
            num_qubits,
            reps,
            layers,
            omega,
            layout,
            params,
        })
    }

    fn check_shape(num_qubits: usize, reps: usize) -> Result<()> {
        if num_qubits == 0 || num_qubits > MAX_QUBITS {
            return Err(MlErr::InvalidConfig(format!(
                "num_qubits must be between 1 and {MAX_QUBITS}, got {num_qubits}"
            )));
        }

        if reps == 0 {
            return Err(MlErr::InvalidConfig("num_reups must be at least 1".into()));
        }

        Ok(())
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn reps(&self) -> usize {
        self.reps
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn set_omega(&mut self, omega: f64) {
        self.omega = omega;
    }

    pub fn layout(&self) -> &QnnLayout {
        &self.layout
    }

    /// Amount of gate parameters.
    pub fn num_params_gates(&self) -> usize {
        self.layout.num_gates()
    }

    /// Amount of observable weights.
    pub fn num_params_obs(&self) -> usize {
        self.layout.w.len()
    }

    /// The current observable weights W.
    pub fn weights(&self) -> &[f64] {
        &self.params[self.layout.w.clone()]
    }

    /// Runs the circuit and returns the expectation of every parity observable.
    fn parities(&self, x: ArrayView1<f64>, params: &[f64]) -> Vec<f64> {
        let n = self.num_qubits;
        let pairs = n - 1;
        let init = &params[self.layout.init_theta.clone()];
        let theta = &params[self.layout.theta.clone()];
        let mut state = StateVector::zero(n);

        for rep in 0..self.reps {
            let scale = 2f64.powf(self.omega * rep as f64);
            let features: Vec<f64> = x.iter().map(|xi| scale * xi).collect();
            iqp_embedding(&mut state, &features);

            let per_rep = self.layers * pairs * 2;
            two_design(
                &mut state,
                &init[rep * n..(rep + 1) * n],
                &theta[rep * per_rep..(rep + 1) * per_rep],
                self.layers,
            );
        }

        state.parities()
    }

    fn energy(&self, x: ArrayView1<f64>, params: &[f64]) -> f64 {
        let w = &params[self.layout.w.clone()];
        self.parities(x, params)
            .iter()
            .zip(w)
            .map(|(p, w)| p * w)
            .sum()
    }
}

impl Model for IqpeReuploadSu2Parity {
    fn size(&self) -> usize {
        self.layout.len()
    }

    fn params(&self) -> &[f64] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    fn evaluate(&self, x: ArrayView1<f64>, params: &[f64]) -> Result<f64> {
        check_input(x, self.num_qubits)?;
        check_len("circuit parameters", params.len(), self.size())?;

        Ok(self.energy(x, params))
    }

    fn evaluate_grad(&self, x: ArrayView1<f64>, params: &[f64], grad: &mut [f64]) -> Result<f64> {
        check_input(x, self.num_qubits)?;
        check_len("circuit parameters", params.len(), self.size())?;
        check_len("circuit gradient", grad.len(), self.size())?;

        let parities = self.parities(x, params);
        let w = &params[self.layout.w.clone()];
        let y = parities.iter().zip(w).map(|(p, w)| p * w).sum();

        grad[self.layout.w.clone()].copy_from_slice(&parities);

        // Every angle drives a single RY gate, so the two-term parameter-shift rule is exact.
        let mut shifted = params.to_vec();
        for k in 0..self.layout.num_gates() {
            let angle = params[k];

            shifted[k] = angle + FRAC_PI_2;
            let plus = self.energy(x, &shifted);
            shifted[k] = angle - FRAC_PI_2;
            let minus = self.energy(x, &shifted);
            shifted[k] = angle;

            grad[k] = (plus - minus) / 2.0;
        }

        Ok(y)
    }
}

/// Hadamards, then `RZ(f_i)` on every wire and `ZZ(f_i * f_j)` on every pair, all of which are
/// diagonal in the computational basis.
fn iqp_embedding(state: &mut StateVector, features: &[f64]) {
    let n = features.len();
    (0..n).for_each(|w| state.hadamard(w));

    let phase = |index: usize| {
        let spins: Vec<f64> = (0..n).map(|w| state.spin(index, w)).collect();
        let mut phi = 0.0;

        for i in 0..n {
            phi -= features[i] * spins[i] / 2.0;
            for j in i + 1..n {
                phi -= features[i] * features[j] * spins[i] * spins[j] / 2.0;
            }
        }

        phi
    };

    let phases: Vec<f64> = (0..1usize << n).map(phase).collect();
    state.apply_phase(|index| phases[index]);
}

/// Initial RY layer followed by `layers` blocks of CZ entanglers and RY rotations, first on the
/// even pairs `(2i, 2i + 1)` and then on the odd pairs `(2i + 1, 2i + 2)`.
fn two_design(state: &mut StateVector, init: &[f64], weights: &[f64], layers: usize) {
    let n = init.len();
    let pairs = n - 1;
    let even = n / 2;

    for (w, &angle) in init.iter().enumerate() {
        state.ry(w, angle);
    }

    for layer in 0..layers {
        let lw = &weights[layer * pairs * 2..(layer + 1) * pairs * 2];

        for i in 0..even {
            state.cz(2 * i, 2 * i + 1);
        }
        for i in 0..even {
            state.ry(2 * i, lw[2 * i]);
            state.ry(2 * i + 1, lw[2 * i + 1]);
        }

        for i in 0..(n - 1) / 2 {
            state.cz(2 * i + 1, 2 * i + 2);
        }
        for i in 0..(n - 1) / 2 {
            let pair = even + i;
            state.ry(2 * i + 1, lw[2 * pair]);
            state.ry(2 * i + 2, lw[2 * pair + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::RandParamGen;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn parameter_counts() {
        let layout = QnnLayout::new(3, 2, 1);
        assert_eq!(layout.init_theta, 0..6);
        assert_eq!(layout.theta, 6..14);
        assert_eq!(layout.w, 14..22);
        assert_eq!(layout.len(), 22);
    }

    #[test]
    fn requires_three_tensors() {
        let res = IqpeReuploadSu2Parity::new(2, 1, 1, 0.0, vec![vec![0.0; 2], vec![0.0; 2]]);
        assert!(matches!(
            res,
            Err(MlErr::SizeMismatch {
                what: "parameter tensors",
                got: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn rejects_wrong_tensor_shapes() {
        let res = IqpeReuploadSu2Parity::new(
            2,
            1,
            1,
            0.0,
            vec![vec![0.0; 2], vec![0.0; 3], vec![0.0; 4]],
        );
        assert!(res.is_err());
    }

    #[test]
    fn identity_weight_gives_constant_output() {
        let mut w = vec![0.0; 4];
        w[0] = 0.75;
        let model =
            IqpeReuploadSu2Parity::new(2, 1, 1, 0.0, vec![vec![0.3, -0.4], vec![0.1, 0.2], w])
                .unwrap();

        for x in [array![0.1, 0.2], array![-0.9, 0.5]] {
            assert!((model.predict(x.view()).unwrap() - 0.75).abs() < 1e-12);
        }
    }

    #[test]
    fn output_is_bounded_by_weight_norm() {
        let rng = StdRng::seed_from_u64(11);
        let mut param_gen = RandParamGen::uniform(rng, 22, -2.0, 2.0).unwrap();
        let model = IqpeReuploadSu2Parity::init(3, 2, 1, 1.0, &mut param_gen).unwrap();
        let bound: f64 = model.weights().iter().map(|w| w.abs()).sum();

        let y = model.predict(array![0.2, -0.7, 0.9].view()).unwrap();
        assert!(y.abs() <= bound + 1e-12);
    }

    #[test]
    fn parameter_shift_gradient_matches_finite_differences() {
        let rng = StdRng::seed_from_u64(7);
        let mut param_gen = RandParamGen::normal(rng, usize::MAX, 0.0, 1.0).unwrap();
        let model = IqpeReuploadSu2Parity::init(3, 2, 1, 0.5, &mut param_gen).unwrap();
        let x = array![0.3, -0.2, 0.8];

        let mut grad = vec![0.0; model.size()];
        model
            .evaluate_grad(x.view(), model.params(), &mut grad)
            .unwrap();

        let h = 1e-6;
        let mut params = model.params().to_vec();
        for k in 0..model.size() {
            let p = params[k];
            params[k] = p + h;
            let plus = model.evaluate(x.view(), &params).unwrap();
            params[k] = p - h;
            let minus = model.evaluate(x.view(), &params).unwrap();
            params[k] = p;

            let fd = (plus - minus) / (2.0 * h);
            assert!((fd - grad[k]).abs() < 1e-5, "param {k}: {fd} vs {}", grad[k]);
        }
    }
}
