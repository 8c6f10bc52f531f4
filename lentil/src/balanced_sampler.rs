use crate::ground_truth::Label;
use log::info;
use matrix_util::utils::partition_by_membership;

/// Row indexes of a class-balanced subset: `min(#pos, #neg)` rows of
/// each class drawn without replacement, positives first. Unlabeled
/// rows never enter. Empty if either class is empty.
pub fn balanced_sample(labels: &[Label], seed: u64) -> Vec<usize> {
    let n_pos = labels.iter().filter(|&&l| l == Label::Positive).count();
    let n_neg = labels.iter().filter(|&&l| l == Label::Negative).count();
    let n_each = n_pos.min(n_neg);

    if n_each == 0 {
        info!("balanced sample is empty ({} positive, {} negative)", n_pos, n_neg);
        return vec![];
    }

    let mut groups = partition_by_membership(labels, Some(n_each), seed);
    let mut ret = groups.remove(&Label::Positive).unwrap_or_default();
    ret.extend(groups.remove(&Label::Negative).unwrap_or_default());

    info!(
        "balanced sample: {} of {} positives, {} of {} negatives",
        n_each, n_pos, n_each, n_neg
    );
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_balanced() {
        let ll = vec![
            Label::Negative,
            Label::Positive,
            Label::Negative,
            Label::Unlabeled,
            Label::Negative,
            Label::Positive,
            Label::Negative,
        ];
        let idx = balanced_sample(&ll, 42);
        assert_eq!(idx.len(), 4);
        assert_eq!(ll[idx[0]], Label::Positive);
        assert_eq!(ll[idx[1]], Label::Positive);
        assert_eq!(ll[idx[2]], Label::Negative);
        assert_eq!(ll[idx[3]], Label::Negative);
        assert_eq!(idx, balanced_sample(&ll, 42));
    }

    #[test]
    fn empty_class_gives_empty_sample() {
        assert!(balanced_sample(&[Label::Negative, Label::Negative], 1).is_empty());
        assert!(balanced_sample(&[Label::Unlabeled; 3], 1).is_empty());
        assert!(balanced_sample(&[], 1).is_empty());
    }
}
