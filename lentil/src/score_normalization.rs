use crate::pair_aggregate::quantile;
use crate::reshape::FeatureMatrix;
use clap::ValueEnum;
use log::info;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScoreScaling {
    #[default]
    None,
    Minmax,
    #[value(name = "clip-log1p")]
    ClipLog1p,
}

pub const DEFAULT_CLIP_QUANTILES: (f64, f64) = (0.05, 0.95);

/// `(x - min) / (max - min)` over the present values; a constant column
/// becomes all zero
pub fn minmax_column(xx: &mut [Option<f64>]) {
    let (lo, hi) = xx
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if lo > hi {
        return;
    }
    let range = hi - lo;
    for x in xx.iter_mut().flatten() {
        *x = if range > 0.0 { (*x - lo) / range } else { 0.0 };
    }
}

/// Clip to the `[q_lo, q_hi]` quantiles, rescale into [0, 1], apply
/// `log1p` and min-max again
pub fn clip_log1p_column(xx: &mut [Option<f64>], q_lo: f64, q_hi: f64) {
    let present: Vec<f64> = xx.iter().flatten().copied().collect();
    let (Some(lo), Some(hi)) = (quantile(&present, q_lo), quantile(&present, q_hi)) else {
        return;
    };
    let range = hi - lo;
    for x in xx.iter_mut().flatten() {
        let clipped = x.clamp(lo, hi);
        let scaled = if range > 0.0 { (clipped - lo) / range } else { 0.0 };
        *x = scaled.ln_1p();
    }
    minmax_column(xx);
}

/// Rescale every evidence column of the matrix in place. Under
/// `ClipLog1p`, prescaled kinds only get the final min-max.
pub fn normalize_matrix(mat: &mut FeatureMatrix, how: ScoreScaling) {
    if how == ScoreScaling::None {
        return;
    }
    let (q_lo, q_hi) = DEFAULT_CLIP_QUANTILES;
    for j in 0..mat.ncols() {
        let mut xx = mat.column_values(j);
        match how {
            ScoreScaling::ClipLog1p if !mat.columns[j].is_prescaled() => {
                clip_log1p_column(&mut xx, q_lo, q_hi)
            }
            _ => minmax_column(&mut xx),
        }
        mat.set_column(j, &xx);
    }
    info!("rescaled {} evidence columns ({:?})", mat.ncols(), how);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn minmax_keeps_absent_cells() {
        let mut xx = vec![Some(2.0), None, Some(4.0), Some(3.0)];
        minmax_column(&mut xx);
        assert_eq!(xx, vec![Some(0.0), None, Some(1.0), Some(0.5)]);

        let mut constant = vec![Some(7.0), Some(7.0), None];
        minmax_column(&mut constant);
        assert_eq!(constant, vec![Some(0.0), Some(0.0), None]);

        let mut empty: Vec<Option<f64>> = vec![None, None];
        minmax_column(&mut empty);
        assert_eq!(empty, vec![None, None]);
    }

    #[test]
    fn clip_log1p_tames_outliers() {
        let mut xx: Vec<Option<f64>> = (0..=10).map(|i| Some(i as f64)).collect();
        xx.push(Some(1000.0));
        xx.push(None);
        clip_log1p_column(&mut xx, 0.0, 0.9);

        let present: Vec<f64> = xx.iter().flatten().copied().collect();
        assert_abs_diff_eq!(present[0], 0.0);
        assert_abs_diff_eq!(*present.last().unwrap(), 1.0);
        assert_eq!(xx.last(), Some(&None));
        assert!(present.windows(2).all(|w| w[0] <= w[1]));
    }
}
