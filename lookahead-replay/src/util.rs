//! Numerical helpers shared by the sampler and the lookahead expander.
use ndarray::{ArrayD, Axis};

/// Promotes an array to rank 2 or more.
///
/// A batch of logically scalar values with shape `[b]` becomes `[b, 1]`.
/// Arrays of rank 2 or higher are returned as is.
pub fn array_min2d<A>(mut x: ArrayD<A>) -> ArrayD<A> {
    while x.ndim() < 2 {
        let axis = Axis(x.ndim());
        x = x.insert_axis(axis);
    }
    x
}

/// Discounted cumulative sums of `x`.
///
/// Computes `y[t] = x[t] + gamma * y[t + 1]` backwards from the last element,
/// so that `y[0]` is the discounted return of the whole sequence,
/// `sum_k gamma^k * x[k]`. An empty input gives an empty output.
///
/// With `gamma == 0`, `y` is `x` itself, even if later rewards are not finite.
pub fn discount(x: &[f32], gamma: f32) -> Vec<f32> {
    if gamma == 0.0 {
        return x.to_vec();
    }
    let mut y = vec![0f32; x.len()];
    let mut acc = 0f32;
    for (t, r) in x.iter().enumerate().rev() {
        acc = *r + gamma * acc;
        y[t] = acc;
    }
    y
}
