use crate::common::*;
use crate::run_label::label_scope;
use lentil::pair_aggregate::{aggregate_pairs, PairAggregation, DEFAULT_QUANTILE};

#[derive(Args, Debug)]
pub struct PairScoreArgs {
    /// scored edge table (`score` output) or feature matrix
    #[arg(required = true)]
    matrix_file: Box<str>,

    /// column holding the per-edge score
    #[arg(short = 'c', long, default_value = "prediction")]
    score_column: Box<str>,

    /// quantile of the edge scores (0.75 if given without a value)
    #[arg(long, num_args = 0..=1, default_missing_value = "0.75")]
    quantile: Option<f64>,

    /// softmax-weighted mean with this inverse temperature
    #[arg(long)]
    softmax_lambda: Option<f64>,

    /// fraction of edges scoring above this threshold
    #[arg(long)]
    fraction_threshold: Option<f64>,

    /// mean of the edge scores
    #[arg(long, default_value_t = false)]
    mean: bool,

    /// max of the edge scores
    #[arg(long, default_value_t = false)]
    max: bool,

    /// reference network files to label the pairs
    #[arg(short, long, value_delimiter = ',')]
    reference_files: Vec<Box<str>>,

    /// leave pairs of TFs absent in the references unlabeled
    #[arg(long, default_value_t = false)]
    reference_tfs_only: bool,

    /// keep a class-balanced subset of the labeled pairs
    #[arg(long, default_value_t = false)]
    balanced: bool,

    /// random seed for the balanced subset
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// output pair table (`.parquet`, `.tsv` or `.tsv.gz`)
    #[arg(short, long, required = true)]
    output: Box<str>,
}

impl PairScoreArgs {
    fn policies(&self) -> Vec<PairAggregation> {
        let mut ret = vec![];
        if let Some(q) = self.quantile {
            ret.push(PairAggregation::Quantile(q));
        }
        if let Some(lambda) = self.softmax_lambda {
            ret.push(PairAggregation::Softmax(lambda));
        }
        if let Some(t) = self.fraction_threshold {
            ret.push(PairAggregation::FractionAbove(t));
        }
        if self.mean {
            ret.push(PairAggregation::Mean);
        }
        if self.max {
            ret.push(PairAggregation::Max);
        }
        if ret.is_empty() {
            ret.push(PairAggregation::Quantile(DEFAULT_QUANTILE));
        }
        ret
    }
}

pub fn run_pair_score(args: &PairScoreArgs) -> anyhow::Result<()> {
    if args.balanced && args.reference_files.is_empty() {
        return Err(anyhow::anyhow!("--balanced needs reference files"));
    }

    let table = Table::from_file(
        &args.matrix_file,
        &[SOURCE_COLUMN, PEAK_COLUMN, TARGET_COLUMN],
    )?;
    let mat = FeatureMatrix::from_table(&table)?;

    let score_column = table
        .column(&args.score_column)
        .or_else(|| table.column(EvidenceKind::from(args.score_column.as_ref()).name()))
        .ok_or(EdgeError::MissingColumn {
            column: args.score_column.clone(),
            file: args.matrix_file.clone(),
        })?;
    let scores = score_column.to_float_vec();

    let policies = args.policies();
    let pairs = aggregate_pairs(&mat.edges, &scores, &policies)?;

    if args.reference_files.is_empty() {
        mkdir(&args.output)?;
        pairs.to_table(None)?.to_file(&args.output)?;
        info!("wrote {} pairs to {}", pairs.len(), args.output);
        return Ok(());
    }

    let truth = GroundTruthSet::from_files(&args.reference_files)?;
    let labels = label_pairs(&pairs.pairs, &truth, label_scope(args.reference_tfs_only));

    let (pairs, labels) = if args.balanced {
        let rows = balanced_sample(&labels, args.seed);
        let labels: Vec<Label> = rows.iter().map(|&i| labels[i]).collect();
        (pairs.select_rows(&rows), labels)
    } else {
        (pairs, labels)
    };

    for (policy, col) in pairs.policies.iter().zip(pairs.scores.iter()) {
        match Evaluation::new(col, &labels) {
            Some(eval) => eval.report(&policy.column_name()),
            None => warn!("{}: need both positive and negative pairs", policy.column_name()),
        }
    }

    let codes: Vec<Option<i64>> = labels.iter().map(|l| l.to_int()).collect();
    mkdir(&args.output)?;
    pairs.to_table(Some(&codes))?.to_file(&args.output)?;
    info!("wrote {} pairs to {}", pairs.len(), args.output);
    Ok(())
}
