use crate::common::*;

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// feature matrix produced by `aggregate`
    #[arg(required = true)]
    matrix_file: Box<str>,

    /// reference network files (two columns: TF, target gene)
    #[arg(short, long, value_delimiter = ',', required = true)]
    reference_files: Vec<Box<str>>,

    /// leave edges of TFs absent in the references unlabeled
    #[arg(long, default_value_t = false)]
    reference_tfs_only: bool,

    /// keep a class-balanced subset of the labeled edges
    #[arg(long, default_value_t = false)]
    balanced: bool,

    /// random seed for the balanced subset
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// output labeled matrix (`.parquet`, `.tsv` or `.tsv.gz`)
    #[arg(short, long, required = true)]
    output: Box<str>,
}

pub fn run_label(args: &LabelArgs) -> anyhow::Result<()> {
    let mat = FeatureMatrix::from_file(&args.matrix_file)?;
    info!(
        "{}: {} edges x {} evidence columns",
        args.matrix_file,
        mat.nrows(),
        mat.ncols()
    );

    let truth = GroundTruthSet::from_files(&args.reference_files)?;
    let scope = label_scope(args.reference_tfs_only);
    let labels = label_edges(&mat.edges, &truth, scope);

    let (n_pos, n_neg, n_unl) = count_labels(&labels);
    info!(
        "{} positive, {} negative, {} unlabeled edges",
        n_pos, n_neg, n_unl
    );

    let (mat, labels) = if args.balanced {
        let rows = balanced_sample(&labels, args.seed);
        let labels: Vec<Label> = rows.iter().map(|&i| labels[i]).collect();
        (mat.select_rows(&rows), labels)
    } else {
        (mat, labels)
    };

    let codes: Vec<Option<i64>> = labels.iter().map(|l| l.to_int()).collect();

    mkdir(&args.output)?;
    mat.to_table(Some(&codes), None)?.to_file(&args.output)?;
    info!("wrote {} labeled edges to {}", mat.nrows(), args.output);
    Ok(())
}

pub fn label_scope(reference_tfs_only: bool) -> LabelScope {
    if reference_tfs_only {
        LabelScope::ReferenceSources
    } else {
        LabelScope::AllEdges
    }
}
