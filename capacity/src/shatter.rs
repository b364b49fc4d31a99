use log::trace;
use machine_learning::arch::Model;
use ndarray::ArrayView1;

use crate::{Fitter, Result, datagen::Instance};

/// Where every fit of a shattering check starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartPolicy {
    /// Every fit starts from the parameters the model had when the check began.
    #[default]
    Cold,
    /// Every fit continues from the parameters left by the previous one.
    Warm,
}

/// Decides whether a model shatters an instance with a given margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShatterChecker {
    gamma: f64,
    start: StartPolicy,
}

impl ShatterChecker {
    pub fn new(gamma: f64, start: StartPolicy) -> Self {
        Self { gamma, start }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn start(&self) -> StartPolicy {
        self.start
    }

    /// Checks whether `model` shatters `instance`.
    ///
    /// The instance is shattered if for some offset sample every labeling can be fitted with
    /// each point landing on the right side of its offset by at least `gamma`. The check stops
    /// at the first labeling that can't be realized and at the first offset sample for which
    /// all of them are.
    ///
    /// # Returns
    /// Whether the instance is shattered, or an error if the model or the fitter fail.
    pub fn check<M, F>(&self, model: &mut M, instance: &Instance, fitter: &mut F) -> Result<bool>
    where
        M: Model,
        F: Fitter,
    {
        let initial = model.params().to_vec();

        for sr in 0..instance.num_offsets() {
            let offsets = instance.offsets(sr);
            let mut shattered = true;

            for sb in 0..instance.num_labelings() {
                if self.start == StartPolicy::Cold {
                    model.set_params(&initial)?;
                }

                fitter.fit(model, instance.x(), instance.targets(sr, sb))?;
                let predictions = model.predict_batch(instance.x())?;

                if !realizes(predictions.view(), instance.labeling(sb), offsets, self.gamma) {
                    trace!("offset sample {sr} fails on labeling {sb}");
                    shattered = false;
                    break;
                }
            }

            if shattered {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Checks that every prediction is above `offset + gamma` where labeled `1` and below
/// `offset - gamma` where labeled `0`. NaN predictions never realize a label.
fn realizes(
    predictions: ArrayView1<f64>,
    labeling: ArrayView1<u8>,
    offsets: ArrayView1<f64>,
    gamma: f64,
) -> bool {
    predictions
        .iter()
        .zip(labeling)
        .zip(offsets)
        .all(|((&pred, &label), &r)| {
            if label == 1 {
                pred >= r + gamma
            } else {
                pred <= r - gamma
            }
        })
}

/// Checks whether `model` shatters `instance` with margin `gamma`.
///
/// See [`ShatterChecker::check`].
pub fn check_shattering<M, F>(
    model: &mut M,
    instance: &Instance,
    fitter: &mut F,
    gamma: f64,
    start: StartPolicy,
) -> Result<bool>
where
    M: Model,
    F: Fitter,
{
    ShatterChecker::new(gamma, start).check(model, instance, fitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use machine_learning::arch::Linear;
    use ndarray::{Array2, Array3, ArrayView2, array};

    #[test]
    fn realizes_requires_margin_on_both_sides() {
        let labeling = array![1, 0];
        let offsets = array![0.5, 0.5];

        let ok = array![0.7, 0.3];
        let short = array![0.55, 0.3];
        let nan = array![f64::NAN, 0.3];

        assert!(realizes(ok.view(), labeling.view(), offsets.view(), 0.2));
        assert!(!realizes(short.view(), labeling.view(), offsets.view(), 0.2));
        assert!(!realizes(nan.view(), labeling.view(), offsets.view(), 0.2));
    }

    /// Records the parameters every fit starts from, then moves them by one.
    struct Recorder {
        starts: Vec<Vec<f64>>,
    }

    impl Fitter for Recorder {
        fn fit<M: Model>(
            &mut self,
            model: &mut M,
            _x: ArrayView2<f64>,
            _y: ArrayView1<f64>,
        ) -> Result<f64> {
            self.starts.push(model.params().to_vec());
            model.params_mut().iter_mut().for_each(|p| *p += 1.0);
            Ok(0.0)
        }
    }

    /// Two points with every labeling and an offset no prediction is ever near.
    fn instance() -> Instance {
        let x = array![[-1.0], [1.0]];
        let b: Array2<u8> = array![[0, 0], [0, 1], [1, 0], [1, 1]];
        let r = array![[1e6, 1e6]];
        let y = Array3::from_shape_fn((1, 4, 2), |(_, sb, i)| b[(sb, i)] as f64);
        Instance::new(x, y, b, r).unwrap()
    }

    #[test]
    fn cold_start_restores_parameters_before_every_fit() {
        let mut model = Linear::zeros(1);
        let mut recorder = Recorder { starts: Vec::new() };
        let instance = instance();

        // the all zero labeling passes, the next one fails
        let shattered =
            check_shattering(&mut model, &instance, &mut recorder, 0.1, StartPolicy::Cold)
                .unwrap();

        assert!(!shattered);
        assert_eq!(recorder.starts, [vec![0.0, 0.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn warm_start_continues_from_previous_fit() {
        let mut model = Linear::zeros(1);
        let mut recorder = Recorder { starts: Vec::new() };
        let instance = instance();

        check_shattering(&mut model, &instance, &mut recorder, 0.1, StartPolicy::Warm).unwrap();

        assert_eq!(recorder.starts, [vec![0.0, 0.0], vec![1.0, 1.0]]);
    }
}
