use fnv::FnvHashMap as HashMap;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::hash::Hash;

/// partition membership vector into groups of indexes
/// # Arguments
/// * `membership` - a vector of membership (E.g., class labels)
/// * `nelem_per_group` - number of elements per group (if None, no downsampling)
/// * `rseed` - random seed for downsampling
/// # Returns
/// A hashmap: group name -> sorted indexes of the elements
///
/// Downsampling is reproducible: each group draws from its own `StdRng`
/// seeded by `rseed` and the first index of the group.
pub fn partition_by_membership<T>(
    membership: &[T],
    nelem_per_group: Option<usize>,
    rseed: u64,
) -> HashMap<T, Vec<usize>>
where
    T: Eq + Hash + Clone + Send + Sync,
{
    let mut groups: HashMap<T, Vec<usize>> = HashMap::default();
    for (i, k) in membership.iter().enumerate() {
        groups.entry(k.clone()).or_default().push(i);
    }

    if let Some(ntarget) = nelem_per_group {
        groups.par_iter_mut().for_each(|(_k, elems)| {
            if elems.len() > ntarget {
                let mut rng = StdRng::seed_from_u64(rseed.wrapping_add(elems[0] as u64));
                elems.shuffle(&mut rng);
                elems.truncate(ntarget);
                elems.sort_unstable();
            }
        });
    }
    groups
}

/// Generate minibatch intervals
/// * `ntot` - number of total samples
/// * `batch_size` - the size of each batch
pub fn generate_minibatch_intervals(ntot: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let batch_size = batch_size.max(1);
    let num_batches = ntot.div_ceil(batch_size);
    (0..num_batches)
        .map(|b| {
            let lb: usize = b * batch_size;
            let ub: usize = ((b + 1) * batch_size).min(ntot);
            (lb, ub)
        })
        .collect::<Vec<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsampling_is_reproducible() {
        let membership: Vec<u8> = (0..100).map(|i| (i % 3) as u8).collect();
        let a = partition_by_membership(&membership, Some(5), 7);
        let b = partition_by_membership(&membership, Some(5), 7);
        for k in 0..3u8 {
            assert_eq!(a[&k].len(), 5);
            assert_eq!(a[&k], b[&k]);
            assert!(a[&k].iter().all(|&i| membership[i] == k));
        }
    }

    #[test]
    fn minibatch_intervals_cover_everything() {
        assert_eq!(
            generate_minibatch_intervals(10, 4),
            vec![(0, 4), (4, 8), (8, 10)]
        );
        assert!(generate_minibatch_intervals(0, 4).is_empty());
    }
}
