use crate::error::EdgeError;
use crate::evidence::{EdgeKey, EvidenceKind};
use crate::reshape::FeatureMatrix;
use fnv::FnvHashSet as HashSet;
use indicatif::ParallelProgressIterator;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fitted edge classifier with an ordered feature contract. Missing
/// feature values are passed as `f64::NAN`.
pub trait EdgeClassifier: Sync {
    fn feature_names(&self) -> &[Box<str>];

    fn predict(&self, row: &[f64]) -> f64;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Link {
    #[default]
    Identity,
    Logistic,
}

/// Linear predictor `intercept + Σ w x` through a link function; missing
/// features contribute nothing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub feature_names: Vec<Box<str>>,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub link: Link,
}

impl LinearModel {
    pub fn from_json_file(file: &str) -> anyhow::Result<Self> {
        let reader = matrix_util::common_io::open_buf_reader(file)?;
        let model: LinearModel = serde_json::from_reader(reader)?;
        if model.feature_names.len() != model.weights.len() {
            anyhow::bail!(
                "{}: {} feature names but {} weights",
                file,
                model.feature_names.len(),
                model.weights.len()
            );
        }
        Ok(model)
    }
}

impl EdgeClassifier for LinearModel {
    fn feature_names(&self) -> &[Box<str>] {
        &self.feature_names
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let eta = self
            .weights
            .iter()
            .zip(row)
            .filter(|(_, x)| !x.is_nan())
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        match self.link {
            Link::Identity => eta,
            Link::Logistic => 1.0 / (1.0 + (-eta).exp()),
        }
    }
}

/// Column index of every model feature, in the model's order
pub fn resolve_features(mat: &FeatureMatrix, names: &[Box<str>]) -> Result<Vec<usize>, EdgeError> {
    let mut index = Vec::with_capacity(names.len());
    let mut missing = vec![];
    for name in names {
        match mat.column_index(&EvidenceKind::from(name.as_ref())) {
            Some(j) => index.push(j),
            None => missing.push(name.clone()),
        }
    }
    if missing.is_empty() {
        Ok(index)
    } else {
        Err(EdgeError::FeatureMismatch { missing })
    }
}

/// One prediction per distinct edge
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEdges {
    pub edges: Vec<EdgeKey>,
    /// `None` where the model returned a non-finite score
    pub predictions: Vec<Option<f64>>,
    /// rows of the input matrix kept for each edge
    pub rows: Vec<usize>,
}

/// Select the model features, predict every row in parallel and keep
/// the first row of each edge.
pub fn apply_model<M: EdgeClassifier + ?Sized>(
    mat: &FeatureMatrix,
    model: &M,
) -> anyhow::Result<ScoredEdges> {
    let index = resolve_features(mat, model.feature_names())?;

    let mut seen: HashSet<&EdgeKey> = HashSet::default();
    let rows: Vec<usize> = (0..mat.nrows())
        .filter(|&i| seen.insert(&mat.edges[i]))
        .collect();
    if rows.len() < mat.nrows() {
        warn!("dropped {} rows of duplicate edges", mat.nrows() - rows.len());
    }

    let predictions: Vec<Option<f64>> = rows
        .par_iter()
        .progress_count(rows.len() as u64)
        .map(|&i| {
            let x: Vec<f64> = index
                .iter()
                .map(|&j| mat.get(i, j).unwrap_or(f64::NAN))
                .collect();
            Some(model.predict(&x)).filter(|y| y.is_finite())
        })
        .collect();

    info!(
        "scored {} edges with {} features",
        predictions.len(),
        index.len()
    );

    Ok(ScoredEdges {
        edges: rows.iter().map(|&i| mat.edges[i].clone()).collect(),
        predictions,
        rows,
    })
}
