//! Pure downsampling rule for `/dtw/sessions/{test}/{sid}/series` (§4.9).

/// Indices to keep from a series of length `len` when capped at `max_points`.
///
/// If `len <= max_points` (or `max_points == 0`, meaning "no cap"), every
/// index is kept. Otherwise picks `0, step, 2*step, ...` with
/// `step = floor(len / max_points)`.
pub fn downsample_indices(len: usize, max_points: usize) -> Vec<usize> {
    if max_points == 0 || len <= max_points {
        return (0..len).collect();
    }
    let step = (len / max_points).max(1);
    (0..len).step_by(step).collect()
}

/// Applies `downsample_indices` to a local-cost series and its aligned-ref
/// alignment map, each against its own length. `local_costs` is indexed by
/// warping-path step (length `L`); `aligned_ref_by_live` is indexed by live
/// frame (length `T_live`) and the two generally differ whenever the path
/// contains an advance-B step, so they are downsampled independently rather
/// than sharing one index set.
pub fn downsample_channel(local_costs: &[f64], aligned_ref_by_live: &[i64], max_points: usize) -> (Vec<f64>, Vec<i64>) {
    let cost_idx = downsample_indices(local_costs.len(), max_points);
    let costs = cost_idx.iter().map(|&i| local_costs[i]).collect();

    let aligned_idx = downsample_indices(aligned_ref_by_live.len(), max_points);
    let aligned = aligned_idx.iter().map(|&i| aligned_ref_by_live[i]).collect();

    (costs, aligned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_is_returned_whole() {
        assert_eq!(downsample_indices(5, 10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_cap_means_no_downsampling() {
        assert_eq!(downsample_indices(1000, 0), (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn long_series_steps_by_the_floor_ratio() {
        // len=10, max_points=3 -> step = floor(10/3) = 3 -> indices 0,3,6,9
        assert_eq!(downsample_indices(10, 3), vec![0, 3, 6, 9]);
    }

    #[test]
    fn exact_multiple_length_stays_in_bounds() {
        // len=9, max_points=3 -> step=3 -> 0,3,6
        assert_eq!(downsample_indices(9, 3), vec![0, 3, 6]);
    }

    #[test]
    fn channel_downsampling_keeps_costs_and_alignment_in_sync() {
        let costs = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
        let aligned: Vec<i64> = (0..10).collect();
        let (c, a) = downsample_channel(&costs, &aligned, 3);
        assert_eq!(c, vec![0.0, 0.3, 0.6, 0.9]);
        assert_eq!(a, vec![0, 3, 6, 9]);
    }
}
