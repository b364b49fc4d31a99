use ndarray::{Array2, Array3, ArrayView1, ArrayView2, s};

use crate::{CapacityErr, Result};

/// A randomized shattering trial over `d` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    x: Array2<f64>,
    y: Array3<f64>,
    b: Array2<u8>,
    r: Array2<f64>,
}

impl Instance {
    /// Creates a new `Instance`.
    ///
    /// # Arguments
    /// * `x` - The `d` input points, one per row.
    /// * `y` - The regression targets indexed by `(offset sample, labeling, point)`.
    /// * `b` - The binary labelings indexed by `(labeling, point)`.
    /// * `r` - The offset levels indexed by `(offset sample, point)`.
    ///
    /// # Returns
    /// An error if the shapes don't agree with each other.
    pub fn new(x: Array2<f64>, y: Array3<f64>, b: Array2<u8>, r: Array2<f64>) -> Result<Self> {
        let d = x.nrows();
        let (sr, sb, points) = y.dim();

        let checks = [
            ("target points", points, d),
            ("labelings", b.nrows(), sb),
            ("labeling points", b.ncols(), d),
            ("offset samples", r.nrows(), sr),
            ("offset points", r.ncols(), d),
        ];

        for (what, got, expected) in checks {
            if got != expected {
                return Err(CapacityErr::ShapeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        Ok(Self { x, y, b, r })
    }

    /// The amount of points.
    pub fn d(&self) -> usize {
        self.x.nrows()
    }

    pub fn num_offsets(&self) -> usize {
        self.r.nrows()
    }

    pub fn num_labelings(&self) -> usize {
        self.b.nrows()
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// The targets of labeling `sb` around offset sample `sr`.
    pub fn targets(&self, sr: usize, sb: usize) -> ArrayView1<'_, f64> {
        self.y.slice(s![sr, sb, ..])
    }

    pub fn labeling(&self, sb: usize) -> ArrayView1<'_, u8> {
        self.b.row(sb)
    }

    pub fn offsets(&self, sr: usize) -> ArrayView1<'_, f64> {
        self.r.row(sr)
    }
}

/// Generates a fresh random instance per data set size.
pub trait InstanceGen {
    /// Generates an instance of `d` points.
    ///
    /// # Returns
    /// An error if `d` is zero.
    fn gen_instance(&mut self, d: usize) -> Result<Instance>;
}

impl<G: InstanceGen + ?Sized> InstanceGen for &mut G {
    fn gen_instance(&mut self, d: usize) -> Result<Instance> {
        (**self).gen_instance(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn accepts_consistent_shapes() {
        let x = array![[0.0], [1.0]];
        let y = Array3::zeros((1, 2, 2));
        let b = array![[0, 1], [1, 0]];
        let r = array![[0.5, 0.5]];

        let instance = Instance::new(x, y, b, r).unwrap();
        assert_eq!(instance.d(), 2);
        assert_eq!(instance.num_labelings(), 2);
        assert_eq!(instance.num_offsets(), 1);
    }

    #[test]
    fn rejects_short_labelings() {
        let x = array![[0.0], [1.0]];
        let y = Array3::zeros((1, 2, 2));
        let b = array![[0], [1]];
        let r = array![[0.5, 0.5]];

        assert!(matches!(
            Instance::new(x, y, b, r),
            Err(CapacityErr::ShapeMismatch {
                what: "labeling points",
                got: 1,
                expected: 2
            })
        ));
    }
}
