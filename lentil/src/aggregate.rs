use crate::error::EdgeError;
use crate::evidence::{EdgeKey, EvidenceKind, EvidenceRecord};
use clap::ValueEnum;
use fnv::FnvHashMap as HashMap;
use indicatif::ParallelProgressIterator;
use log::{debug, info, warn};
use matrix_util::utils::generate_minibatch_intervals;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// How repeated observations of the same (edge, evidence kind) are
/// reduced to one value. All of them are commutative and mergeable
/// across partitions.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Mean,
    Max,
    Min,
}

impl std::fmt::Display for Reduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reduction::Mean => write!(f, "mean"),
            Reduction::Max => write!(f, "max"),
            Reduction::Min => write!(f, "min"),
        }
    }
}

/// Partial sufficient statistics of one (edge, kind) cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAccumulator {
    n_obs: usize,
    n_valid: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for ScoreAccumulator {
    fn default() -> Self {
        Self {
            n_obs: 0,
            n_valid: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ScoreAccumulator {
    /// `None` counts as an observation but does not enter the reduction
    pub fn add(&mut self, value: Option<f64>) {
        self.n_obs += 1;
        if let Some(x) = value.filter(|x| x.is_finite()) {
            self.n_valid += 1;
            self.sum += x;
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.n_obs += other.n_obs;
        self.n_valid += other.n_valid;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn num_observations(&self) -> usize {
        self.n_obs
    }

    /// reduced value, absent if no valid observation or if the sum
    /// overflowed
    pub fn reduce(&self, how: Reduction) -> Option<f64> {
        if self.n_valid == 0 {
            return None;
        }
        let ret = match how {
            Reduction::Mean => self.sum / self.n_valid as f64,
            Reduction::Max => self.max,
            Reduction::Min => self.min,
        };
        Some(ret).filter(|x| x.is_finite())
    }
}

/// Evidence reduced by (edge, kind) but not yet pivoted
#[derive(Debug, Default, Clone)]
pub struct ReducedEvidence {
    cells: HashMap<(EdgeKey, EvidenceKind), ScoreAccumulator>,
}

impl ReducedEvidence {
    /// Reduce one partition of records
    pub fn from_records(records: &[EvidenceRecord]) -> Self {
        let mut cells: HashMap<(EdgeKey, EvidenceKind), ScoreAccumulator> = HashMap::default();
        for rec in records {
            cells
                .entry((rec.edge.clone(), rec.kind.clone()))
                .or_default()
                .add(rec.value);
        }
        Self { cells }
    }

    /// Merge partial reductions of two partitions
    pub fn merge(self, other: Self) -> Self {
        let (mut big, small) = if self.cells.len() >= other.cells.len() {
            (self, other)
        } else {
            (other, self)
        };
        for (key, acc) in small.cells {
            big.cells.entry(key).or_default().merge(&acc);
        }
        big
    }

    pub fn get(&self, edge: &EdgeKey, kind: &EvidenceKind) -> Option<&ScoreAccumulator> {
        self.cells.get(&(edge.clone(), kind.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &EvidenceKind, &ScoreAccumulator)> {
        self.cells.iter().map(|((e, k), acc)| (e, k, acc))
    }

    /// The column universe: every kind seen in any partition. Only
    /// meaningful once all partitions are merged.
    pub fn kinds(&self) -> BTreeSet<EvidenceKind> {
        self.cells.keys().map(|(_, k)| k.clone()).collect()
    }

    pub fn num_edges(&self) -> usize {
        self.cells.keys().map(|(e, _)| e).collect::<BTreeSet<_>>().len()
    }

    pub fn summary(&self) -> ReductionSummary {
        let mut summary = ReductionSummary {
            n_cells: self.cells.len(),
            ..Default::default()
        };
        for acc in self.cells.values() {
            summary.n_records += acc.n_obs;
            summary.n_invalid_records += acc.n_obs - acc.n_valid;
            if acc.n_obs > 1 {
                summary.n_duplicate_cells += 1;
            }
            if acc.n_valid == 0 {
                summary.n_absent_cells += 1;
            }
        }
        summary
    }
}

/// Counts of the non-fatal conditions met during a reduction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReductionSummary {
    pub n_records: usize,
    pub n_cells: usize,
    pub n_invalid_records: usize,
    pub n_absent_cells: usize,
    pub n_duplicate_cells: usize,
}

impl ReductionSummary {
    pub fn report(&self, how: Reduction) {
        info!(
            "reduced {} evidence records into {} (edge, evidence) cells",
            self.n_records, self.n_cells
        );
        if self.n_invalid_records > 0 {
            warn!(
                "{}",
                EdgeError::MissingEvidence {
                    n_records: self.n_invalid_records,
                    n_cells: self.n_absent_cells,
                }
            );
        }
        if self.n_duplicate_cells > 0 {
            debug!(
                "{}",
                EdgeError::DuplicateKeyConflict {
                    n_keys: self.n_duplicate_cells,
                    reduction: how.to_string().into_boxed_str(),
                }
            );
        }
    }
}

/// Reduce records block by block in parallel, then merge the partial
/// tables.
///
/// * `block_size` - number of records per block
pub fn reduce_evidence(records: &[EvidenceRecord], block_size: usize) -> ReducedEvidence {
    let blocks = generate_minibatch_intervals(records.len(), block_size);
    let njobs = blocks.len() as u64;

    blocks
        .into_par_iter()
        .progress_count(njobs)
        .map(|(lb, ub)| ReducedEvidence::from_records(&records[lb..ub]))
        .reduce(ReducedEvidence::default, ReducedEvidence::merge)
}

/// Reduce records that were already partitioned upstream
pub fn reduce_partitions(partitions: &[Vec<EvidenceRecord>]) -> ReducedEvidence {
    partitions
        .par_iter()
        .map(|part| ReducedEvidence::from_records(part))
        .reduce(ReducedEvidence::default, ReducedEvidence::merge)
}
