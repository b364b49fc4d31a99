use capacity::{
    Boundary, FatDim, FatShattering, OptimizerFitter, StartPolicy,
    datagen::{DataGenFat, Instance},
    check_shattering, fat_shattering_dim,
};
use machine_learning::{arch::Linear, optimization::GradientDescent};
use ndarray::{Array2, Array3, array};

const GAMMA: f64 = 0.1;

fn fitter() -> OptimizerFitter<impl FnMut(usize) -> GradientDescent> {
    OptimizerFitter::new(|_| GradientDescent::new(0.25), 200, 1e-20)
}

/// Every labeling of the points `xs` in counting order around a single constant offset, with
/// the targets twice the checked margin away from it.
fn exhaustive_instance(xs: &[f64], offset: f64) -> Instance {
    let d = xs.len();
    let x = Array2::from_shape_fn((d, 1), |(i, _)| xs[i]);
    let b = Array2::from_shape_fn((1 << d, d), |(k, i)| ((k >> (d - 1 - i)) & 1) as u8);
    let r = Array2::from_elem((1, d), offset);
    let y = Array3::from_shape_fn((1, 1 << d, d), |(_, sb, i)| {
        if b[(sb, i)] == 1 {
            offset + 2.0 * GAMMA
        } else {
            offset - 2.0 * GAMMA
        }
    });

    Instance::new(x, y, b, r).unwrap()
}

#[test]
fn line_shatters_two_points() {
    let mut model = Linear::zeros(1);
    let instance = exhaustive_instance(&[-1.0, 1.0], 0.5);

    let shattered =
        check_shattering(&mut model, &instance, &mut fitter(), GAMMA, StartPolicy::Cold).unwrap();

    assert!(shattered);
}

#[test]
fn line_never_shatters_three_collinear_points() {
    let mut model = Linear::zeros(1);
    let instance = exhaustive_instance(&[-1.0, 0.0, 1.0], 0.5);

    for start in [StartPolicy::Cold, StartPolicy::Warm] {
        let shattered =
            check_shattering(&mut model, &instance, &mut fitter(), GAMMA, start).unwrap();
        assert!(!shattered);
    }
}

#[test]
fn margin_wider_than_targets_is_never_realized() {
    let mut model = Linear::zeros(1);
    let instance = exhaustive_instance(&[-1.0, 1.0], 0.5);

    let shattered =
        check_shattering(&mut model, &instance, &mut fitter(), 3.0 * GAMMA, StartPolicy::Cold)
            .unwrap();

    assert!(!shattered);
}

#[test]
fn second_offset_sample_can_succeed() {
    let mut model = Linear::zeros(1);
    let x = array![[-1.0], [1.0]];
    let b: Array2<u8> = array![[0, 1], [1, 0]];
    let r = array![[0.5, 0.5], [0.5, 0.5]];
    // the first offset sample asks for targets on the wrong side of the offsets
    let y = Array3::from_shape_fn((2, 2, 2), |(sr, sb, i)| {
        let side = if b[(sb, i)] == 1 { 1.0 } else { -1.0 };
        let side = if sr == 0 { -side } else { side };
        0.5 + side * 2.0 * GAMMA
    });
    let instance = Instance::new(x, y, b, r).unwrap();

    let shattered =
        check_shattering(&mut model, &instance, &mut fitter(), GAMMA, StartPolicy::Cold).unwrap();

    assert!(shattered);
}

#[test]
fn line_dimension_stops_below_three_points() {
    let mut model = Linear::zeros(1);
    let mut datagen = DataGenFat::new(1, 8, 2, 2.0 * GAMMA, Some(0)).unwrap();

    let dim = fat_shattering_dim(&mut model, &mut datagen, &mut fitter(), 3, 5, GAMMA, 1).unwrap();

    assert_eq!(
        dim,
        FatDim {
            dim: 2,
            boundary: Boundary::BelowMin
        }
    );
}

#[test]
fn single_point_search_reaches_dmax() {
    let mut model = Linear::zeros(1);
    let mut datagen = DataGenFat::new(1, 8, 2, 2.0 * GAMMA, Some(0)).unwrap();

    let dim = FatShattering::new(1, 1, GAMMA)
        .start(StartPolicy::Warm)
        .estimate(&mut model, &mut datagen, &mut fitter())
        .unwrap();

    assert_eq!(
        dim,
        FatDim {
            dim: 1,
            boundary: Boundary::ReachedMax
        }
    );
}

#[test]
fn line_dimension_from_one() {
    let mut model = Linear::zeros(1);
    let mut datagen = DataGenFat::new(1, 8, 2, 2.0 * GAMMA, Some(3)).unwrap();

    let dim = fat_shattering_dim(&mut model, &mut datagen, &mut fitter(), 1, 6, GAMMA, 1).unwrap();

    // one point always shatters and three points never do
    assert_eq!(dim.boundary, Boundary::Exact);
    assert!((1..=2).contains(&dim.dim));
}
