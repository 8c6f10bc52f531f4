use crate::evidence::{EdgeKey, PairKey, SOURCE_COLUMN, TARGET_COLUMN};
use crate::reshape::{LABEL_COLUMN, N_EDGES_COLUMN};
use log::info;
use matrix_util::table::{ColumnData, Table};
use std::collections::BTreeMap;

pub const DEFAULT_QUANTILE: f64 = 0.75;

/// Collapse the edge scores of one (TF, target) pair into a single value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairAggregation {
    /// linearly interpolated quantile
    Quantile(f64),
    /// softmax-weighted mean with inverse temperature λ
    Softmax(f64),
    /// share of supporting edges scoring above a threshold
    FractionAbove(f64),
    Mean,
    Max,
}

impl PairAggregation {
    pub fn column_name(&self) -> Box<str> {
        match self {
            PairAggregation::Quantile(q) => format!("quantile_{}", q),
            PairAggregation::Softmax(lambda) => format!("softmax_{}", lambda),
            PairAggregation::FractionAbove(t) => format!("frac_above_{}", t),
            PairAggregation::Mean => "mean".to_string(),
            PairAggregation::Max => "max".to_string(),
        }
        .into_boxed_str()
    }

    /// `None` if no score is present
    pub fn apply(&self, scores: &[f64]) -> Option<f64> {
        match self {
            PairAggregation::Quantile(q) => quantile(scores, *q),
            PairAggregation::Softmax(lambda) => softmax_weighted_mean(scores, *lambda),
            PairAggregation::FractionAbove(t) => fraction_above(scores, *t),
            PairAggregation::Mean => {
                (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
            }
            PairAggregation::Max => scores.iter().copied().reduce(f64::max),
        }
    }
}

/// Quantile by linear interpolation between the closest ranks
///
/// * `q` - probability, clamped into [0, 1]
pub fn quantile(xx: &[f64], q: f64) -> Option<f64> {
    if xx.is_empty() {
        return None;
    }
    let mut sorted = xx.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lb = pos.floor() as usize;
    let ub = pos.ceil() as usize;
    let frac = pos - lb as f64;
    Some(sorted[lb] + (sorted[ub] - sorted[lb]) * frac)
}

/// `Σ s exp(λ s) / Σ exp(λ s)`, computed as `exp(λ (s - s_ref))` with
/// `s_ref` the score of the largest weight (max for λ >= 0, min
/// otherwise) so that no weight exceeds one
pub fn softmax_weighted_mean(xx: &[f64], lambda: f64) -> Option<f64> {
    if xx.len() == 1 {
        return Some(xx[0]);
    }
    let s_ref = if lambda >= 0.0 {
        xx.iter().copied().reduce(f64::max)?
    } else {
        xx.iter().copied().reduce(f64::min)?
    };
    let (num, denom) = xx.iter().fold((0.0, 0.0), |(num, denom), &s| {
        let w = (lambda * (s - s_ref)).exp();
        (num + w * s, denom + w)
    });
    Some(num / denom)
}

pub fn fraction_above(xx: &[f64], threshold: f64) -> Option<f64> {
    if xx.is_empty() {
        return None;
    }
    let n_above = xx.iter().filter(|&&s| s > threshold).count();
    Some(n_above as f64 / xx.len() as f64)
}

/// One row per (TF, target) pair and one column per policy
#[derive(Debug, Clone, PartialEq)]
pub struct PairScores {
    pub pairs: Vec<PairKey>,
    pub n_edges: Vec<usize>,
    pub policies: Vec<PairAggregation>,
    /// `scores[j][i]`: policy `j` on pair `i`
    pub scores: Vec<Vec<Option<f64>>>,
}

impl PairScores {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            pairs: rows.iter().map(|&i| self.pairs[i].clone()).collect(),
            n_edges: rows.iter().map(|&i| self.n_edges[i]).collect(),
            policies: self.policies.clone(),
            scores: self
                .scores
                .iter()
                .map(|col| rows.iter().map(|&i| col[i]).collect())
                .collect(),
        }
    }

    pub fn to_table(&self, labels: Option<&[Option<i64>]>) -> anyhow::Result<Table> {
        let mut table = Table::new();
        table.push_column(
            SOURCE_COLUMN,
            ColumnData::Text(self.pairs.iter().map(|p| p.source.clone()).collect()),
        )?;
        table.push_column(
            TARGET_COLUMN,
            ColumnData::Text(self.pairs.iter().map(|p| p.target.clone()).collect()),
        )?;
        table.push_column(
            N_EDGES_COLUMN,
            ColumnData::Int(self.n_edges.iter().map(|&n| Some(n as i64)).collect()),
        )?;
        for (policy, col) in self.policies.iter().zip(self.scores.iter()) {
            table.push_column(&policy.column_name(), ColumnData::Float(col.clone()))?;
        }
        if let Some(labels) = labels {
            table.push_column(LABEL_COLUMN, ColumnData::Int(labels.to_vec()))?;
        }
        Ok(table)
    }
}

/// Group edge scores by (TF, target) and apply every policy.
///
/// * `edges` - edge keys
/// * `scores` - one score per edge, `None` if absent
/// * `policies` - aggregation policies, one output column each
pub fn aggregate_pairs(
    edges: &[EdgeKey],
    scores: &[Option<f64>],
    policies: &[PairAggregation],
) -> anyhow::Result<PairScores> {
    if edges.len() != scores.len() {
        return Err(anyhow::anyhow!(
            "{} edges but {} scores",
            edges.len(),
            scores.len()
        ));
    }

    let mut pair_to_scores: BTreeMap<PairKey, (usize, Vec<f64>)> = BTreeMap::new();
    for (edge, score) in edges.iter().zip(scores.iter()) {
        let entry = pair_to_scores.entry(edge.pair()).or_default();
        entry.0 += 1;
        if let Some(s) = score.filter(|s| s.is_finite()) {
            entry.1.push(s);
        }
    }

    let npairs = pair_to_scores.len();
    let mut pairs = Vec::with_capacity(npairs);
    let mut n_edges = Vec::with_capacity(npairs);
    let mut out = vec![Vec::with_capacity(npairs); policies.len()];

    for (pair, (nn, ss)) in pair_to_scores {
        for (policy, col) in policies.iter().zip(out.iter_mut()) {
            col.push(policy.apply(&ss));
        }
        pairs.push(pair);
        n_edges.push(nn);
    }

    info!("{} edges collapsed into {} pairs", edges.len(), npairs);

    Ok(PairScores {
        pairs,
        n_edges,
        policies: policies.to_vec(),
        scores: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quantile_interpolates() {
        let xx = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(quantile(&xx, 0.75).unwrap(), 4.0);
        assert_abs_diff_eq!(quantile(&xx, 0.5).unwrap(), 3.0);
        assert_abs_diff_eq!(quantile(&[0.0, 1.0], 0.75).unwrap(), 0.75);
        assert_eq!(quantile(&[], 0.75), None);
    }

    #[test]
    fn single_edge_policies() {
        let s = [0.42];
        assert_abs_diff_eq!(quantile(&s, 0.75).unwrap(), 0.42);
        assert_abs_diff_eq!(softmax_weighted_mean(&s, 5.0).unwrap(), 0.42, epsilon = 1e-12);
        assert_abs_diff_eq!(PairAggregation::Mean.apply(&s).unwrap(), 0.42);
        assert_abs_diff_eq!(PairAggregation::Max.apply(&s).unwrap(), 0.42);
        assert_eq!(fraction_above(&s, 0.5), Some(0.0));
        assert_eq!(fraction_above(&s, 0.4), Some(1.0));
    }

    #[test]
    fn softmax_is_stable_for_large_lambda() {
        let s = [0.1, 0.9, 0.5];
        let v = softmax_weighted_mean(&s, 1e4).unwrap();
        assert!(v.is_finite());
        assert_abs_diff_eq!(v, 0.9, epsilon = 1e-9);

        let v = softmax_weighted_mean(&s, 0.0).unwrap();
        assert_abs_diff_eq!(v, 0.5, epsilon = 1e-12);

        let v = softmax_weighted_mean(&s, -1e4).unwrap();
        assert_abs_diff_eq!(v, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn softmax_is_finite_for_huge_scores() {
        assert_eq!(softmax_weighted_mean(&[1e300], 1e10), Some(1e300));
        assert_eq!(softmax_weighted_mean(&[1e300, 1.0], 1e10), Some(1e300));
        assert_eq!(softmax_weighted_mean(&[1e300, 1.0], -1e10), Some(1.0));
    }

    #[test]
    fn pairs_ignore_peaks() -> anyhow::Result<()> {
        let edges = vec![
            EdgeKey::new("TF1", "chr1:100-200", "G1")?,
            EdgeKey::new("TF1", "chr1:300-400", "G1")?,
            EdgeKey::new("TF2", "chr2:1-2", "G2")?,
        ];
        let scores = vec![Some(0.2), Some(0.6), None];
        let out = aggregate_pairs(
            &edges,
            &scores,
            &[PairAggregation::Mean, PairAggregation::FractionAbove(0.5)],
        )?;
        assert_eq!(out.len(), 2);
        assert_eq!(out.n_edges, vec![2, 1]);
        assert_abs_diff_eq!(out.scores[0][0].unwrap(), 0.4, epsilon = 1e-12);
        assert_eq!(out.scores[1][0], Some(0.5));
        assert_eq!(out.scores[0][1], None);
        assert_eq!(out.scores[1][1], None);
        Ok(())
    }
}
