use crate::common::*;
use lentil::score_normalization::{normalize_matrix, ScoreScaling};

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// melted evidence files (`.tsv`, `.tsv.gz`, `.csv`, `.parquet`)
    /// with columns `source_id`, `peak_id`, `target_id`, `score_type`,
    /// `score_value`
    #[arg(value_delimiter = ',', required = true)]
    evidence_files: Vec<Box<str>>,

    /// reduction of repeated (edge, evidence) observations
    #[arg(long, value_enum, default_value = "mean")]
    reduction: Reduction,

    /// rescaling of the evidence columns after the pivot
    #[arg(long, value_enum, default_value = "none")]
    normalize: ScoreScaling,

    /// number of records per parallel block
    #[arg(long, default_value_t = 100_000)]
    block_size: usize,

    /// stop at the first malformed identifier instead of skipping it
    #[arg(long, default_value_t = false)]
    strict_identifiers: bool,

    /// output feature matrix (`.parquet`, `.tsv` or `.tsv.gz`)
    #[arg(short, long, required = true)]
    output: Box<str>,
}

pub fn run_aggregate(args: &AggregateArgs) -> anyhow::Result<()> {
    let melted = read_melted_evidence_files(&args.evidence_files, args.strict_identifiers)?;

    if melted.n_malformed > 0 {
        warn!(
            "skipped {} rows with malformed identifiers",
            melted.n_malformed
        );
    }

    if melted.records.is_empty() {
        return Err(anyhow::anyhow!("no valid evidence records"));
    }

    info!(
        "reducing {} records in blocks of {}",
        melted.records.len(),
        args.block_size
    );

    let reduced = reduce_evidence(&melted.records, args.block_size);
    reduced.summary().report(args.reduction);

    let mut mat = pivot_reduced(&reduced, args.reduction);
    info!(
        "feature matrix: {} edges x {} evidence columns",
        mat.nrows(),
        mat.ncols()
    );

    for kind in mat.columns.iter().filter(|k| !k.is_known()) {
        info!("unrecognized evidence type kept as column `{}`", kind);
    }

    normalize_matrix(&mut mat, args.normalize);

    mkdir(&args.output)?;
    mat.to_table(None, None)?.to_file(&args.output)?;
    info!("wrote {}", args.output);
    Ok(())
}
