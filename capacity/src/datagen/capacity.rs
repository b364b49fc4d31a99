use ndarray::{Array2, ArrayView1, ArrayView2};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;

use super::{seeded_rng, uniform};
use crate::{CapacityErr, Result};

/// A data set of `n` random points with `num_samples` random labelings of them.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityData {
    /// The points, shape `(n, sizex)`.
    pub x: Array2<f64>,
    /// The labels, shape `(num_samples, n)`.
    pub y: Array2<f64>,
}

impl CapacityData {
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_samples(&self) -> usize {
        self.y.nrows()
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn labels(&self, sample: usize) -> ArrayView1<'_, f64> {
        self.y.row(sample)
    }
}

/// Generates random regression data sets for memorization experiments. Inputs and labels
/// are both uniform in `[-1, 1)`.
#[derive(Debug, Clone)]
pub struct DataGenCapacity {
    sizex: usize,
    num_samples: usize,
    rng: StdRng,
}

impl DataGenCapacity {
    pub fn new(sizex: usize, num_samples: usize, seed: Option<u64>) -> Result<Self> {
        if sizex == 0 || num_samples == 0 {
            return Err(CapacityErr::InvalidSize(
                "sizex and num_samples must be at least 1".into(),
            ));
        }

        Ok(Self {
            sizex,
            num_samples,
            rng: seeded_rng(seed),
        })
    }

    pub fn sizex(&self) -> usize {
        self.sizex
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Generates `n` points and `num_samples` labelings of them.
    pub fn gen_data(&mut self, n: usize) -> Result<CapacityData> {
        if n == 0 {
            return Err(CapacityErr::InvalidSize(
                "a data set needs at least one point".into(),
            ));
        }

        let dist = uniform(-1.0, 1.0)?;
        let x = Array2::random_using((n, self.sizex), &dist, &mut self.rng);
        let y = Array2::random_using((self.num_samples, n), &dist, &mut self.rng);

        Ok(CapacityData { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_and_ranges() {
        let mut datagen = DataGenCapacity::new(3, 4, Some(0)).unwrap();
        let data = datagen.gen_data(5).unwrap();

        assert_eq!(data.x.dim(), (5, 3));
        assert_eq!(data.y.dim(), (4, 5));
        assert!(data.y.iter().all(|y| (-1.0..1.0).contains(y)));
    }

    #[test]
    fn empty_data_set_is_an_error() {
        let mut datagen = DataGenCapacity::new(3, 4, Some(0)).unwrap();
        assert!(datagen.gen_data(0).is_err());
    }
}
