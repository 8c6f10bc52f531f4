use genomic_data::MalformedCoordinate;

/// Error taxonomy of the aggregation and labeling engine.
///
/// `MissingEvidence`, `EmptyGroundTruth` and `DuplicateKeyConflict` are
/// reported through the log and never abort a run; the others are
/// returned as errors (wrapped in `anyhow::Error`).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EdgeError {
    #[error(transparent)]
    MalformedCoordinate(#[from] MalformedCoordinate),

    #[error("malformed identifier `{raw}` in field `{field}`")]
    MalformedIdentifier { field: &'static str, raw: Box<str> },

    #[error("{n_records} evidence value(s) were not finite numbers; {n_cells} cell(s) left absent")]
    MissingEvidence { n_records: usize, n_cells: usize },

    #[error("model expects feature(s) not found in the evidence schema: {}", .missing.join(", "))]
    FeatureMismatch { missing: Vec<Box<str>> },

    #[error("ground truth set is empty; every label is negative")]
    EmptyGroundTruth,

    #[error("{n_keys} (edge, evidence) key(s) observed more than once; reduced by {reduction}")]
    DuplicateKeyConflict { n_keys: usize, reduction: Box<str> },

    #[error("missing column `{column}` in {file}")]
    MissingColumn { column: Box<str>, file: Box<str> },
}
