/// Computes the normalization constant `C = (V / gamma)^2 * log2(V / gamma)` of a set of
/// observable weights, with `V = scale * ||weights||_1`.
///
/// `scale` defaults to 1. A zero `gamma` is not guarded against and yields an infinite or NaN
/// constant.
pub fn normalize_const(weights: &[f64], gamma: f64, scale: Option<f64>) -> f64 {
    let v = scale.unwrap_or(1.0) * weights.iter().map(|w| w.abs()).sum::<f64>();
    let ratio = v / gamma;
    ratio.powi(2) * ratio.log2()
}
