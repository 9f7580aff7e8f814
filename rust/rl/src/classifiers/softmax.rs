use crate::{Result, SolverError};
use ndarray::{Array2, Axis};

/// Added to the true-class probability before taking the log, so a confident wrong
/// prediction costs a large but finite loss.
pub const LOG_EPSILON: f64 = 1e-4;

/// Softmax (cross-entropy) loss and its gradient, without explicit loops over samples.
///
/// - `w`: `C x D` weights
/// - `x`: `D x N` data, one sample per column
/// - `y`: `N` labels in `0..C`
/// - `reg`: L2 regularization strength
///
/// Returns the loss and the gradient with respect to `w`.
pub fn softmax_loss_vectorized(
    w: &Array2<f64>,
    x: &Array2<f64>,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Array2<f64>)> {
    let (classes, d) = w.dim();
    let (dx, n) = x.dim();
    if dx != d {
        return Err(SolverError::DimensionMismatch {
            expected: d,
            actual: dx,
        });
    }
    if y.len() != n {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if n == 0 {
        return Err(SolverError::EmptyBatch);
    }
    if let Some(&label) = y.iter().find(|&&l| l >= classes) {
        return Err(SolverError::InvalidLabel { label, classes });
    }

    // Shift every column by its max so exp cannot overflow.
    let mut probs = w.dot(x);
    let max = probs.fold_axis(Axis(0), f64::NEG_INFINITY, |&m, &s| m.max(s));
    probs -= &max.insert_axis(Axis(0));
    probs.mapv_inplace(f64::exp);
    let sums = probs.sum_axis(Axis(0));
    probs /= &sums.insert_axis(Axis(0));

    let n = n as f64;
    let data_loss = -y
        .iter()
        .enumerate()
        .map(|(i, &label)| (probs[[label, i]] + LOG_EPSILON).ln())
        .sum::<f64>()
        / n;
    let loss = data_loss + 0.5 * reg * w.mapv(|v| v * v).sum();

    for (i, &label) in y.iter().enumerate() {
        probs[[label, i]] -= 1.;
    }
    let dw = probs.dot(&x.t()) / n + &(w * reg);

    Ok((loss, dw))
}
