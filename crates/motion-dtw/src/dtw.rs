//! DTW Engine (C4): optimal monotone warping path + total cost over
//! equal-dimensional sequences, with an optional Sakoe-Chiba band and a
//! deterministic tie-break rule, per §4.4.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::band::Band;
use crate::error::{DtwError, DtwResultT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    None,
    Diag,
    Up,
    Left,
}

/// A warping path plus its per-step costs and total.
#[derive(Debug, Clone, PartialEq)]
pub struct DtwOutcome {
    /// Ordered `(i, j)` pairs from `(0, 0)` to `(|A|-1, |B|-1)`.
    pub path: Vec<(usize, usize)>,
    /// `local_costs[k] = dist(A[path[k].0], B[path[k].1])`.
    pub local_costs: Vec<f64>,
    /// Sum of `local_costs`.
    pub total: f64,
}

/// Compute the optimal DTW alignment between `a` and `b`.
///
/// `a` and `b` must have equal column counts (dimensionality); rows are
/// the sequence steps. Distance is the Euclidean norm over each row pair
/// (a plain absolute difference when columns == 1).
pub fn dtw(a: ArrayView2<f64>, b: ArrayView2<f64>, band: Band) -> DtwResultT<DtwOutcome> {
    if a.ncols() != b.ncols() {
        return Err(DtwError::DimMismatch {
            a: a.ncols(),
            b: b.ncols(),
        });
    }
    let n = a.nrows();
    let m = b.nrows();
    if n == 0 || m == 0 {
        return Err(DtwError::EmptySequence);
    }

    let mut dp = Array2::<f64>::from_elem((n, m), f64::INFINITY);
    let mut back = Array2::<Direction>::from_elem((n, m), Direction::None);

    for i in 0..n {
        for j in 0..m {
            if !band.allows(i, j, n, m) {
                continue;
            }

            let d = euclid(a.row(i), b.row(j));

            if i == 0 && j == 0 {
                dp[[0, 0]] = d;
                continue;
            }

            let diag = if i > 0 && j > 0 {
                dp[[i - 1, j - 1]]
            } else {
                f64::INFINITY
            };
            let up = if i > 0 { dp[[i - 1, j]] } else { f64::INFINITY };
            let left = if j > 0 { dp[[i, j - 1]] } else { f64::INFINITY };

            // Tie-break: diagonal, then advance-A (up), then advance-B (left).
            let mut best = diag;
            let mut dir = Direction::Diag;
            if up < best {
                best = up;
                dir = Direction::Up;
            }
            if left < best {
                best = left;
                dir = Direction::Left;
            }

            if best.is_finite() {
                dp[[i, j]] = d + best;
                back[[i, j]] = dir;
            }
        }
    }

    if !dp[[n - 1, m - 1]].is_finite() {
        return Err(DtwError::BandInfeasible);
    }

    let mut path = Vec::new();
    let (mut i, mut j) = (n - 1, m - 1);
    loop {
        path.push((i, j));
        if i == 0 && j == 0 {
            break;
        }
        match back[[i, j]] {
            Direction::Diag => {
                i -= 1;
                j -= 1;
            }
            Direction::Up => i -= 1,
            Direction::Left => j -= 1,
            Direction::None => unreachable!("reachable non-origin cell always has a direction"),
        }
    }
    path.reverse();

    let local_costs: Vec<f64> = path.iter().map(|&(i, j)| euclid(a.row(i), b.row(j))).collect();
    let total = local_costs.iter().sum();

    Ok(DtwOutcome {
        path,
        local_costs,
        total,
    })
}

/// `aligned_ref_by_live[i]` = the last reference index `j` paired with
/// live index `i` along `path`. Every live index appears in `path` at
/// least once (DTW always starts at `i=0` and `i` never decreases), so
/// in practice no `-1` sentinel survives — see §3's invariant note.
pub fn aligned_ref_by_live(path: &[(usize, usize)], live_len: usize) -> Vec<i64> {
    let mut out = vec![-1i64; live_len];
    for &(i, j) in path {
        out[i] = j as i64;
    }
    out
}

fn euclid(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn two_frame_self_match() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = x.clone();
        let out = dtw(x.view(), y.view(), Band::Unrestricted).unwrap();
        assert_eq!(out.path, vec![(0, 0), (1, 1)]);
        assert_eq!(out.total, 0.0);
    }

    #[test]
    fn one_extra_live_frame_aligns_via_advance_a() {
        let x = array![[0.0, 0.0], [0.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0, 0.0], [1.0, 1.0]];
        let out = dtw(x.view(), y.view(), Band::Unrestricted).unwrap();
        assert_eq!(out.path, vec![(0, 0), (1, 0), (2, 1)]);
        assert_eq!(out.total, 0.0);
        assert_eq!(aligned_ref_by_live(&out.path, 3), vec![0, 0, 1]);
    }

    #[test]
    fn dim_mismatch_is_rejected() {
        let x = array![[0.0, 0.0]];
        let y = array![[0.0, 0.0, 0.0]];
        assert_eq!(
            dtw(x.view(), y.view(), Band::Unrestricted).unwrap_err(),
            DtwError::DimMismatch { a: 2, b: 3 }
        );
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let x: Array2<f64> = Array2::zeros((0, 2));
        let y = array![[0.0, 0.0]];
        assert_eq!(
            dtw(x.view(), y.view(), Band::Unrestricted).unwrap_err(),
            DtwError::EmptySequence
        );
    }

    #[test]
    fn zero_radius_band_with_unequal_lengths_is_infeasible() {
        let x = Array2::<f64>::zeros((3, 1));
        let y = Array2::<f64>::zeros((2, 1));
        assert_eq!(
            dtw(x.view(), y.view(), Band::Fixed(0)).unwrap_err(),
            DtwError::BandInfeasible
        );
    }

    #[test]
    fn path_is_monotone_and_bounded() {
        let x = array![[0.0], [1.0], [2.0], [1.5]];
        let y = array![[0.0], [2.0], [1.0]];
        let out = dtw(x.view(), y.view(), Band::Unrestricted).unwrap();
        assert_eq!(out.path.first(), Some(&(0, 0)));
        assert_eq!(out.path.last(), Some(&(3, 2)));
        for w in out.path.windows(2) {
            let (i0, j0) = w[0];
            let (i1, j1) = w[1];
            assert!(i1 >= i0 && j1 >= j0);
            let step = (i1 - i0, j1 - j0);
            assert!(matches!(step, (1, 0) | (0, 1) | (1, 1)));
        }
    }

    #[test]
    fn tie_break_prefers_diagonal_then_advance_a_then_advance_b() {
        // All-equal-distance grid: every cell has distance 1, so every
        // predecessor choice ties. The chosen path should always take
        // the diagonal where available.
        let x = Array2::<f64>::zeros((3, 3));
        let y = Array2::<f64>::zeros((3, 3));
        let out = dtw(x.view(), y.view(), Band::Unrestricted).unwrap();
        assert_eq!(out.path, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn local_costs_length_matches_path_length() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![[0.0], [2.0]];
        let out = dtw(x.view(), y.view(), Band::Unrestricted).unwrap();
        assert_eq!(out.local_costs.len(), out.path.len());
    }
}
