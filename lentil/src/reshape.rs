use crate::aggregate::{ReducedEvidence, Reduction};
use crate::error::EdgeError;
use crate::evidence::{EdgeKey, EvidenceKind, PEAK_COLUMN, SOURCE_COLUMN, TARGET_COLUMN};
use matrix_util::table::{ColumnData, Table};
use std::collections::BTreeMap;

pub const LABEL_COLUMN: &str = "label";
pub const PREDICTION_COLUMN: &str = "prediction";
pub const N_EDGES_COLUMN: &str = "n_edges";

/// Non-feature columns that may ride along a feature matrix
pub const RESERVED_COLUMNS: [&str; 3] = [LABEL_COLUMN, PREDICTION_COLUMN, N_EDGES_COLUMN];

/// Wide edge x evidence matrix (row-major). Rows are sorted by edge;
/// columns follow the order of `EvidenceKind`. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    pub edges: Vec<EdgeKey>,
    pub columns: Vec<EvidenceKind>,
    values: Vec<Option<f64>>,
}

impl FeatureMatrix {
    pub fn new(
        edges: Vec<EdgeKey>,
        columns: Vec<EvidenceKind>,
        values: Vec<Option<f64>>,
    ) -> anyhow::Result<Self> {
        if values.len() != edges.len() * columns.len() {
            return Err(anyhow::anyhow!(
                "{} values for a {} x {} matrix",
                values.len(),
                edges.len(),
                columns.len()
            ));
        }
        Ok(Self {
            edges,
            columns,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.edges.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, kind: &EvidenceKind) -> Option<usize> {
        self.columns.iter().position(|k| k == kind)
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values[i * self.ncols() + j]
    }

    pub fn row(&self, i: usize) -> &[Option<f64>] {
        let ncols = self.ncols();
        &self.values[i * ncols..(i + 1) * ncols]
    }

    pub fn column_values(&self, j: usize) -> Vec<Option<f64>> {
        (0..self.nrows()).map(|i| self.get(i, j)).collect()
    }

    pub fn set_column(&mut self, j: usize, data: &[Option<f64>]) {
        let ncols = self.ncols();
        debug_assert_eq!(data.len(), self.nrows());
        for (i, x) in data.iter().enumerate() {
            self.values[i * ncols + j] = *x;
        }
    }

    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            edges: rows.iter().map(|&i| self.edges[i].clone()).collect(),
            columns: self.columns.clone(),
            values: rows.iter().flat_map(|&i| self.row(i).to_vec()).collect(),
        }
    }

    /// Key columns, then one column per evidence kind, then the
    /// optional `label` and `prediction` columns
    pub fn to_table(
        &self,
        labels: Option<&[Option<i64>]>,
        predictions: Option<&[Option<f64>]>,
    ) -> anyhow::Result<Table> {
        let mut table = Table::new();
        table.push_column(
            SOURCE_COLUMN,
            ColumnData::Text(self.edges.iter().map(|e| e.source.clone()).collect()),
        )?;
        table.push_column(
            PEAK_COLUMN,
            ColumnData::Text(
                self.edges
                    .iter()
                    .map(|e| e.peak.to_string().into_boxed_str())
                    .collect(),
            ),
        )?;
        table.push_column(
            TARGET_COLUMN,
            ColumnData::Text(self.edges.iter().map(|e| e.target.clone()).collect()),
        )?;
        for (j, kind) in self.columns.iter().enumerate() {
            table.push_column(kind.name(), ColumnData::Float(self.column_values(j)))?;
        }
        if let Some(labels) = labels {
            table.push_column(LABEL_COLUMN, ColumnData::Int(labels.to_vec()))?;
        }
        if let Some(predictions) = predictions {
            table.push_column(PREDICTION_COLUMN, ColumnData::Float(predictions.to_vec()))?;
        }
        Ok(table)
    }

    /// Rebuild a matrix from a table written by `to_table`. Every
    /// non-key, non-reserved column is an evidence column; key fields
    /// are normalized again.
    pub fn from_table(table: &Table) -> anyhow::Result<Self> {
        let sources = table.require_column(SOURCE_COLUMN)?.to_text_vec();
        let peaks = table.require_column(PEAK_COLUMN)?.to_text_vec();
        let targets = table.require_column(TARGET_COLUMN)?.to_text_vec();

        let edges = (0..table.nrows())
            .map(|i| EdgeKey::new(&sources[i], &peaks[i], &targets[i]))
            .collect::<Result<Vec<_>, EdgeError>>()?;

        let mut columns = vec![];
        let mut data = vec![];
        for (name, col) in table.columns() {
            if is_key_column(name) || is_reserved_column(name) || !col.is_numeric() {
                continue;
            }
            let kind = EvidenceKind::from(name);
            if columns.contains(&kind) {
                return Err(anyhow::anyhow!("evidence column `{}` appears twice", kind));
            }
            columns.push(kind);
            data.push(col.to_float_vec());
        }

        let ncols = columns.len();
        let mut values = vec![None; edges.len() * ncols];
        for (j, col) in data.iter().enumerate() {
            for (i, x) in col.iter().enumerate() {
                values[i * ncols + j] = *x;
            }
        }
        Self::new(edges, columns, values)
    }

    /// Read a matrix from `.parquet` or delimited text
    pub fn from_file(file: &str) -> anyhow::Result<Self> {
        let table = Table::from_file(file, &[SOURCE_COLUMN, PEAK_COLUMN, TARGET_COLUMN])?;
        Self::from_table(&table)
    }
}

pub fn is_key_column(name: &str) -> bool {
    [SOURCE_COLUMN, PEAK_COLUMN, TARGET_COLUMN]
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

pub fn is_reserved_column(name: &str) -> bool {
    RESERVED_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Pivot a fully merged reduction into one row per edge and one column
/// per evidence kind seen anywhere in the input.
pub fn pivot_reduced(reduced: &ReducedEvidence, how: Reduction) -> FeatureMatrix {
    let columns: Vec<EvidenceKind> = reduced.kinds().into_iter().collect();
    let ncols = columns.len();
    let col_index: BTreeMap<&EvidenceKind, usize> =
        columns.iter().enumerate().map(|(j, k)| (k, j)).collect();

    let mut rows: BTreeMap<&EdgeKey, Vec<Option<f64>>> = BTreeMap::new();
    for (edge, kind, acc) in reduced.iter() {
        let j = col_index[kind];
        rows.entry(edge).or_insert_with(|| vec![None; ncols])[j] = acc.reduce(how);
    }

    let mut edges = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len() * ncols);
    for (edge, row) in rows {
        edges.push(edge.clone());
        values.extend(row);
    }

    FeatureMatrix {
        edges,
        columns,
        values,
    }
}
