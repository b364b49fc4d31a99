use ndarray::{Array2, Array3};
use ndarray_rand::RandomExt;
use rand::{Rng, rngs::StdRng};

use super::{Instance, InstanceGen, seeded_rng, uniform};
use crate::{CapacityErr, Result};

/// Generates shattering instances of random points, offsets and labelings.
///
/// Points are uniform in `[-1, 1)^sizex` and offsets uniform in `[0, 1)`. Whenever the `Sb`
/// budget allows it every one of the `2^d` labelings is enumerated, otherwise `Sb` random
/// labelings are drawn.
#[derive(Debug, Clone)]
pub struct DataGenFat {
    sizex: usize,
    sb: usize,
    sr: usize,
    gamma: f64,
    rng: StdRng,
}

impl DataGenFat {
    /// Creates a new `DataGenFat`.
    ///
    /// # Arguments
    /// * `sizex` - The dimension of every point.
    /// * `sb` - The maximum amount of labelings per instance.
    /// * `sr` - The amount of offset samples per instance.
    /// * `gamma` - The margin the targets are placed at around the offsets.
    /// * `seed` - The seed of the generator, taken from the OS if `None`.
    ///
    /// # Returns
    /// An error if any of the sizes is zero.
    pub fn new(sizex: usize, sb: usize, sr: usize, gamma: f64, seed: Option<u64>) -> Result<Self> {
        for (what, value) in [("sizex", sizex), ("Sb", sb), ("Sr", sr)] {
            if value == 0 {
                return Err(CapacityErr::InvalidSize(format!("{what} must be at least 1")));
            }
        }

        Ok(Self {
            sizex,
            sb,
            sr,
            gamma,
            rng: seeded_rng(seed),
        })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn labelings(&mut self, d: usize) -> Array2<u8> {
        let exhaustive = u32::try_from(d)
            .ok()
            .and_then(|d| 1usize.checked_shl(d))
            .filter(|&count| count <= self.sb);

        match exhaustive {
            // row k holds the binary digits of k, most significant first
            Some(count) => {
                Array2::from_shape_fn((count, d), |(k, i)| ((k >> (d - 1 - i)) & 1) as u8)
            }
            None => Array2::from_shape_fn((self.sb, d), |_| self.rng.random::<bool>() as u8),
        }
    }
}

impl InstanceGen for DataGenFat {
    fn gen_instance(&mut self, d: usize) -> Result<Instance> {
        if d == 0 {
            return Err(CapacityErr::InvalidSize(
                "an instance needs at least one point".into(),
            ));
        }

        let x = Array2::random_using((d, self.sizex), uniform(-1.0, 1.0)?, &mut self.rng);
        let b = self.labelings(d);
        let r = Array2::random_using((self.sr, d), uniform(0.0, 1.0)?, &mut self.rng);

        let gamma = self.gamma;
        let y = Array3::from_shape_fn((self.sr, b.nrows(), d), |(sr, sb, i)| {
            if b[(sb, i)] == 1 {
                r[(sr, i)] + gamma
            } else {
                r[(sr, i)] - gamma
            }
        });

        Instance::new(x, y, b, r)
    }
}
