use approx::assert_abs_diff_eq;
use lentil::aggregate::{reduce_evidence, Reduction};
use lentil::balanced_sampler::balanced_sample;
use lentil::evidence::{read_melted_evidence, EdgeKey, EvidenceKind};
use lentil::evidence::PairKey;
use lentil::ground_truth::{label_edges, label_pairs, GroundTruthSet, Label, LabelScope};
use lentil::pair_aggregate::{aggregate_pairs, PairAggregation};
use lentil::reshape::{pivot_reduced, FeatureMatrix};
use lentil::scoring::{apply_model, LinearModel, Link};
use lentil::EdgeError;
use matrix_util::common_io::write_lines;

const HEADER: &str = "source_id\tpeak_id\ttarget_id\tscore_type\tscore_value";

fn write_evidence(dir: &std::path::Path, name: &str, rows: &[&str]) -> anyhow::Result<String> {
    let file = dir.join(name).to_str().unwrap().to_string();
    let mut lines = vec![HEADER];
    lines.extend_from_slice(rows);
    write_lines(&lines, &file)?;
    Ok(file)
}

#[test]
fn duplicate_observations_are_averaged() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write_evidence(
        dir.path(),
        "melted.tsv.gz",
        &[
            "TF1\tchr1:100-200\tG1\thomer\t0.8",
            "tf1\t1:100-200\tg1\thomer\t0.6",
            "TF1\tchr1_100_200\tG1\tcorr\t0.3",
        ],
    )?;

    let melted = read_melted_evidence(&file, false)?;
    assert_eq!(melted.records.len(), 3);
    assert_eq!(melted.n_malformed, 0);

    let reduced = reduce_evidence(&melted.records, 2);
    let mat = pivot_reduced(&reduced, Reduction::Mean);

    assert_eq!(mat.nrows(), 1);
    let homer = mat.column_index(&EvidenceKind::HomerBinding).unwrap();
    let corr = mat.column_index(&EvidenceKind::PeakGeneCorrelation).unwrap();
    assert_abs_diff_eq!(mat.get(0, homer).unwrap(), 0.7, epsilon = 1e-12);
    assert_abs_diff_eq!(mat.get(0, corr).unwrap(), 0.3, epsilon = 1e-12);
    Ok(())
}

#[test]
fn one_row_per_distinct_edge() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write_evidence(
        dir.path(),
        "melted.tsv",
        &[
            "TF1\tchr1:100-200\tG1\thomer\t0.8",
            "TF1\tchr1:300-400\tG1\thomer\t0.1",
            "TF2\tchr2:1-2\tG2\tcicero\tNaN",
            "TF2\tchr2:1-2\tG2\tmy_new_score\t2.5",
            "TF3\tchr3:1-2\tG3\thomer\tNA",
        ],
    )?;

    let melted = read_melted_evidence(&file, false)?;
    let reduced = reduce_evidence(&melted.records, 100);
    let mat = pivot_reduced(&reduced, Reduction::Mean);

    assert_eq!(mat.nrows(), reduced.num_edges());
    assert_eq!(mat.nrows(), 4);
    assert_eq!(
        mat.columns,
        vec![
            EvidenceKind::HomerBinding,
            EvidenceKind::Coaccessibility,
            EvidenceKind::Unknown("my_new_score".into()),
        ]
    );

    let tf3 = mat
        .edges
        .iter()
        .position(|e| e.source.as_ref() == "TF3")
        .unwrap();
    assert!(mat.row(tf3).iter().all(|x| x.is_none()));
    Ok(())
}

#[test]
fn malformed_identifiers_are_skipped_unless_strict() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write_evidence(
        dir.path(),
        "melted.tsv",
        &[
            "TF1\tchr1:100-200\tG1\thomer\t0.8",
            "TF1\tchr1:200-100\tG1\thomer\t0.8",
            "TF1\tchr1:-5-10\tG1\thomer\t0.8",
            "TF1\tchr1:100-200\tG1\tprediction\t0.5",
            "TF1\tchr1:100-200\tG1\ttarget_id\t0.5",
        ],
    )?;

    let melted = read_melted_evidence(&file, false)?;
    assert_eq!(melted.records.len(), 1);
    assert_eq!(melted.n_malformed, 4);

    let err = read_melted_evidence(&file, true).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EdgeError>(),
        Some(EdgeError::MalformedCoordinate(_))
    ));
    Ok(())
}

#[test]
fn missing_columns_are_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("bad.tsv").to_str().unwrap().to_string();
    write_lines(&["source_id\tpeak_id\ttarget_id\tscore_type", "TF1\tchr1:1-2\tG1\thomer"], &file)?;

    let err = read_melted_evidence(&file, false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EdgeError>(),
        Some(EdgeError::MissingColumn { .. })
    ));
    Ok(())
}

#[test]
fn labels_from_reference_file_are_idempotent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let reference = dir.path().join("ref.tsv.gz").to_str().unwrap().to_string();
    write_lines(&["TF\tGene", "tf1\tg1", "TF9\tG9"], &reference)?;

    let truth = GroundTruthSet::from_files(&[reference.into_boxed_str()])?;
    assert_eq!(truth.len(), 2);

    let edges = vec![
        EdgeKey::new("TF1", "chr1:100-200", "G1")?,
        EdgeKey::new("TF2", "chr2:1-2", "G2")?,
    ];
    let first = label_edges(&edges, &truth, LabelScope::AllEdges);
    let second = label_edges(&edges, &truth, LabelScope::AllEdges);
    assert_eq!(first, vec![Label::Positive, Label::Negative]);
    assert_eq!(first, second);

    let codes: Vec<_> = first.iter().map(|l| l.to_int()).collect();
    assert_eq!(codes, vec![Some(1), Some(0)]);
    Ok(())
}

#[test]
fn reference_header_is_matched_or_falls_back() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let swapped = dir.path().join("swapped.tsv").to_str().unwrap().to_string();
    write_lines(&["target\tregulator", "G1\tTF1"], &swapped)?;
    let unnamed = dir.path().join("unnamed.csv").to_str().unwrap().to_string();
    write_lines(&["a,b", "TF2,G2", "TF2,G3"], &unnamed)?;

    let truth = GroundTruthSet::from_files(&[swapped.into_boxed_str(), unnamed.into_boxed_str()])?;
    assert_eq!(truth.len(), 3);
    assert!(truth.contains(&PairKey::new("TF1", "G1")?));
    assert!(truth.contains(&PairKey::new("TF2", "G3")?));
    assert!(!truth.contains(&PairKey::new("G1", "TF1")?));

    let pairs = vec![
        PairKey::new("TF2", "G2")?,
        PairKey::new("TF1", "G2")?,
        PairKey::new("TF3", "G1")?,
    ];
    assert_eq!(
        label_pairs(&pairs, &truth, LabelScope::AllEdges),
        vec![Label::Positive, Label::Negative, Label::Negative]
    );
    assert_eq!(
        label_pairs(&pairs, &truth, LabelScope::ReferenceSources),
        vec![Label::Positive, Label::Negative, Label::Unlabeled]
    );
    Ok(())
}

#[test]
fn balanced_subset_of_a_labeled_matrix() -> anyhow::Result<()> {
    let edges = (0..10)
        .map(|i| EdgeKey::new(&format!("TF{}", i), "chr1:100-200", "G1"))
        .collect::<Result<Vec<_>, _>>()?;
    let truth = GroundTruthSet::from_pairs(vec![
        edges[3].pair(),
        edges[7].pair(),
        edges[8].pair(),
    ]);
    let labels = label_edges(&edges, &truth, LabelScope::AllEdges);

    let rows = balanced_sample(&labels, 7);
    assert_eq!(rows.len(), 6);
    let n_pos = rows.iter().filter(|&&i| labels[i] == Label::Positive).count();
    assert_eq!(n_pos, 3);
    assert_eq!(rows, balanced_sample(&labels, 7));
    Ok(())
}

#[test]
fn model_with_unknown_feature_is_rejected() -> anyhow::Result<()> {
    let mat = FeatureMatrix::new(
        vec![EdgeKey::new("TF1", "chr1:100-200", "G1")?],
        vec![EvidenceKind::HomerBinding, EvidenceKind::PeakGeneCorrelation],
        vec![Some(0.7), Some(0.3)],
    )?;
    let model = LinearModel {
        feature_names: vec!["homer".into(), "corr".into(), "missing_feature".into()],
        weights: vec![1.0, 1.0, 1.0],
        intercept: 0.0,
        link: Link::Identity,
    };

    let err = apply_model(&mat, &model).unwrap_err();
    match err.downcast_ref::<EdgeError>() {
        Some(EdgeError::FeatureMismatch { missing }) => {
            assert_eq!(missing, &vec![Box::<str>::from("missing_feature")]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[test]
fn aggregate_score_and_collapse_pairs() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write_evidence(
        dir.path(),
        "melted.tsv",
        &[
            "TF1\tchr1:100-200\tG1\thomer\t0.8",
            "TF1\tchr1:100-200\tG1\tcorr\t0.2",
            "TF1\tchr1:500-600\tG1\thomer\t0.4",
            "TF2\tchr2:1-2\tG2\thomer\t0.1",
        ],
    )?;
    let melted = read_melted_evidence(&file, false)?;
    let mat = pivot_reduced(&reduce_evidence(&melted.records, 1), Reduction::Mean);

    let matrix_file = dir.path().join("matrix.parquet").to_str().unwrap().to_string();
    mat.to_table(None, None)?.to_file(&matrix_file)?;
    let mat = FeatureMatrix::from_file(&matrix_file)?;
    assert_eq!(mat.nrows(), 3);

    let model = LinearModel {
        feature_names: vec!["homer_binding_score".into(), "correlation".into()],
        weights: vec![1.0, 1.0],
        intercept: 0.0,
        link: Link::Identity,
    };
    let scored = apply_model(&mat, &model)?;
    assert_eq!(scored.predictions.len(), 3);

    let pairs = aggregate_pairs(
        &scored.edges,
        &scored.predictions,
        &[PairAggregation::Max, PairAggregation::FractionAbove(0.5)],
    )?;
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs.pairs[0].source.as_ref(), "TF1");
    assert_eq!(pairs.n_edges, vec![2, 1]);
    assert_abs_diff_eq!(pairs.scores[0][0].unwrap(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(pairs.scores[1][0].unwrap(), 0.5);
    assert_abs_diff_eq!(pairs.scores[0][1].unwrap(), 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(pairs.scores[1][1].unwrap(), 0.0);
    Ok(())
}
