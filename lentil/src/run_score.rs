use crate::common::*;
use crate::run_label::label_scope;
use lentil::scoring::{apply_model, LinearModel};

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// feature matrix produced by `aggregate` or `label`
    #[arg(required = true)]
    matrix_file: Box<str>,

    /// fitted linear model (`.json`) with `feature_names`, `weights`,
    /// `intercept` and `link` (`identity` or `logistic`)
    #[arg(short, long, required = true)]
    model: Box<str>,

    /// reference network files to evaluate the predictions
    #[arg(short, long, value_delimiter = ',')]
    reference_files: Vec<Box<str>>,

    /// evaluate only edges of TFs present in the references
    #[arg(long, default_value_t = false)]
    reference_tfs_only: bool,

    /// output predictions (`.parquet`, `.tsv` or `.tsv.gz`)
    #[arg(short, long, required = true)]
    output: Box<str>,
}

pub fn run_score(args: &ScoreArgs) -> anyhow::Result<()> {
    let mat = FeatureMatrix::from_file(&args.matrix_file)?;
    let model = LinearModel::from_json_file(&args.model)?;
    info!(
        "{}: {} features [{}]",
        args.model,
        model.feature_names.len(),
        model.feature_names.join(", ")
    );

    let scored = apply_model(&mat, &model)?;
    let mat = mat.select_rows(&scored.rows);

    let labels = if args.reference_files.is_empty() {
        None
    } else {
        let truth = GroundTruthSet::from_files(&args.reference_files)?;
        let labels = label_edges(&mat.edges, &truth, label_scope(args.reference_tfs_only));
        match Evaluation::new(&scored.predictions, &labels) {
            Some(eval) => eval.report(&args.model),
            None => warn!("need both positive and negative edges to evaluate"),
        }
        Some(labels.iter().map(|l| l.to_int()).collect::<Vec<_>>())
    };

    mkdir(&args.output)?;
    mat.to_table(labels.as_deref(), Some(&scored.predictions))?
        .to_file(&args.output)?;
    info!("wrote {} predictions to {}", scored.predictions.len(), args.output);
    Ok(())
}
