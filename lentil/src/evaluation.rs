use crate::ground_truth::Label;
use log::info;

/// Ranking quality of a score against binary labels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub n_pos: usize,
    pub n_neg: usize,
    pub auroc: f64,
    pub auprc: f64,
}

impl Evaluation {
    /// `None` if either class is empty after dropping unlabeled rows and
    /// absent scores
    pub fn new(scores: &[Option<f64>], labels: &[Label]) -> Option<Self> {
        let pairs: Vec<(f64, bool)> = scores
            .iter()
            .zip(labels)
            .filter_map(|(s, l)| match (s, l) {
                (Some(s), Label::Positive) if s.is_finite() => Some((*s, true)),
                (Some(s), Label::Negative) if s.is_finite() => Some((*s, false)),
                _ => None,
            })
            .collect();
        Some(Self {
            n_pos: pairs.iter().filter(|(_, y)| *y).count(),
            n_neg: pairs.iter().filter(|(_, y)| !*y).count(),
            auroc: auroc(&pairs)?,
            auprc: average_precision(&pairs)?,
        })
    }

    pub fn report(&self, what: &str) {
        info!(
            "{}: AUROC = {:.4}, AUPRC = {:.4} ({} positives, {} negatives)",
            what, self.auroc, self.auprc, self.n_pos, self.n_neg
        );
    }
}

/// Rank-sum AUROC; tied scores share their average rank
pub fn auroc(scored: &[(f64, bool)]) -> Option<f64> {
    let n_pos = scored.iter().filter(|(_, y)| *y).count();
    let n_neg = scored.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut sorted = scored.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum_pos = 0.0;
    let mut lb = 0;
    while lb < sorted.len() {
        let mut ub = lb + 1;
        while ub < sorted.len() && sorted[ub].0 == sorted[lb].0 {
            ub += 1;
        }
        // 1-based ranks lb+1 ..= ub
        let avg_rank = (lb + 1 + ub) as f64 / 2.0;
        let npos_tied = sorted[lb..ub].iter().filter(|(_, y)| *y).count();
        rank_sum_pos += avg_rank * npos_tied as f64;
        lb = ub;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Average precision: precision at each distinct threshold weighted by
/// the gain in recall
pub fn average_precision(scored: &[(f64, bool)]) -> Option<f64> {
    let n_pos = scored.iter().filter(|(_, y)| *y).count();
    if n_pos == 0 || n_pos == scored.len() {
        return None;
    }

    let mut sorted = scored.to_vec();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0));

    let (mut tp, mut fp) = (0_usize, 0_usize);
    let mut prev_recall = 0.0;
    let mut ap = 0.0;
    let mut lb = 0;
    while lb < sorted.len() {
        let mut ub = lb;
        while ub < sorted.len() && sorted[ub].0 == sorted[lb].0 {
            if sorted[ub].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            ub += 1;
        }
        let recall = tp as f64 / n_pos as f64;
        let precision = tp as f64 / (tp + fp) as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
        lb = ub;
    }
    Some(ap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn perfect_ranking() {
        let xy = [(0.9, true), (0.8, true), (0.3, false), (0.1, false)];
        assert_abs_diff_eq!(auroc(&xy).unwrap(), 1.0);
        assert_abs_diff_eq!(average_precision(&xy).unwrap(), 1.0);
    }

    #[test]
    fn ties_count_half() {
        let xy = [(0.5, true), (0.5, false)];
        assert_abs_diff_eq!(auroc(&xy).unwrap(), 0.5);
        assert_abs_diff_eq!(average_precision(&xy).unwrap(), 0.5);

        let xy = [(0.9, false), (0.8, true), (0.3, true), (0.1, false)];
        assert_abs_diff_eq!(auroc(&xy).unwrap(), 0.5);
        // recall 0.5 at precision 1/2, recall 1 at precision 2/3
        assert_abs_diff_eq!(average_precision(&xy).unwrap(), 0.25 + 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn single_class_is_undefined() {
        let scores = [Some(0.1), Some(0.2), None];
        let labels = [Label::Negative, Label::Unlabeled, Label::Positive];
        assert_eq!(Evaluation::new(&scores, &labels), None);
        assert_eq!(auroc(&[(0.1, true)]), None);
    }
}
