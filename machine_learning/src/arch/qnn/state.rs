use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;

/// Dense state vector of `num_qubits` qubits.
///
/// Wire `0` is the most significant bit of a basis index.
#[derive(Debug, Clone)]
pub(super) struct StateVector {
    num_qubits: usize,
    amps: Vec<Complex64>,
}

impl StateVector {
    /// Returns the `|0..0>` state.
    pub fn zero(num_qubits: usize) -> Self {
        let mut amps = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amps[0] = Complex64::new(1.0, 0.0);
        Self { num_qubits, amps }
    }

    #[inline]
    fn mask(&self, wire: usize) -> usize {
        1 << (self.num_qubits - 1 - wire)
    }

    /// The Z eigenvalue of `wire` on the basis state `index`.
    #[inline]
    pub fn spin(&self, index: usize, wire: usize) -> f64 {
        if index & self.mask(wire) == 0 { 1.0 } else { -1.0 }
    }

    pub fn hadamard(&mut self, wire: usize) {
        let m = self.mask(wire);

        for i in (0..self.amps.len()).filter(|i| i & m == 0) {
            let (a, b) = (self.amps[i], self.amps[i | m]);
            self.amps[i] = (a + b) * FRAC_1_SQRT_2;
            self.amps[i | m] = (a - b) * FRAC_1_SQRT_2;
        }
    }

    pub fn ry(&mut self, wire: usize, theta: f64) {
        let m = self.mask(wire);
        let (s, c) = (theta / 2.0).sin_cos();

        for i in (0..self.amps.len()).filter(|i| i & m == 0) {
            let (a, b) = (self.amps[i], self.amps[i | m]);
            self.amps[i] = a * c - b * s;
            self.amps[i | m] = a * s + b * c;
        }
    }

    pub fn cz(&mut self, control: usize, target: usize) {
        let both = self.mask(control) | self.mask(target);

        for (i, amp) in self.amps.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }

    /// Multiplies every basis amplitude by `exp(i * phase(index))`.
    pub fn apply_phase<F>(&mut self, phase: F)
    where
        F: Fn(usize) -> f64,
    {
        for (i, amp) in self.amps.iter_mut().enumerate() {
            *amp *= Complex64::from_polar(1.0, phase(i));
        }
    }

    /// Returns `<Z_S>` for every subset `S` of wires, indexed by the subset's basis-index mask.
    /// Entry `0` is the identity.
    pub fn parities(&self) -> Vec<f64> {
        let mut v: Vec<f64> = self.amps.iter().map(|a| a.norm_sqr()).collect();

        // Walsh-Hadamard transform of the probabilities.
        let mut h = 1;
        while h < v.len() {
            for i in (0..v.len()).step_by(2 * h) {
                for j in i..i + h {
                    let (a, b) = (v[j], v[j + h]);
                    v[j] = a + b;
                    v[j + h] = a - b;
                }
            }
            h *= 2;
        }

        v
    }
}
