//! Channel Builders (C3): derive amplitude and speed 1-D series from a
//! position matrix, per §4.3.

use ndarray::Array2;

/// `A[t] = ‖M[t]‖₂` for each row of `M`.
pub fn amplitude(m: &Array2<f64>) -> Vec<f64> {
    m.outer_iter()
        .map(|row| row.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect()
}

/// `S[t] = ‖M[t] − M[t−1]‖₂` for `t ∈ [1, T)`. This implementation chooses
/// length `T-1` (no leading zero padding) — the live and reference speed
/// series are always built by this same function, so the "must match"
/// requirement in §4.3 holds by construction.
pub fn speed(m: &Array2<f64>) -> Vec<f64> {
    if m.nrows() < 2 {
        return Vec::new();
    }
    (1..m.nrows())
        .map(|t| {
            let prev = m.row(t - 1);
            let cur = m.row(t);
            cur.iter()
                .zip(prev.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}
