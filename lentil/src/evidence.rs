use crate::error::EdgeError;
use crate::reshape::{is_key_column, is_reserved_column};
use genomic_data::{normalize_symbol, parse_peak, Peak};
use log::{debug, info, warn};
use matrix_util::common_io::{delimiter_for, file_ext, read_lines_of_words_delim};
use matrix_util::parquet::peek_parquet_field_names;
use matrix_util::table::{parse_float_cell, ColumnData, Table};
use rayon::prelude::*;

pub const SOURCE_COLUMN: &str = "source_id";
pub const PEAK_COLUMN: &str = "peak_id";
pub const TARGET_COLUMN: &str = "target_id";
pub const SCORE_TYPE_COLUMN: &str = "score_type";
pub const SCORE_VALUE_COLUMN: &str = "score_value";

/// Kind of regulatory evidence. Known kinds are listed in column order;
/// anything else is kept under its lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvidenceKind {
    SlidingWindow,
    HomerBinding,
    Coaccessibility,
    PeakGeneCorrelation,
    TssDistance,
    TfExpression,
    TgExpression,
    PeakAccessibility,
    EnhancerDb,
    StringExperimental,
    StringTextmining,
    StringCombined,
    Unknown(Box<str>),
}

impl EvidenceKind {
    pub const KNOWN: [EvidenceKind; 12] = [
        EvidenceKind::SlidingWindow,
        EvidenceKind::HomerBinding,
        EvidenceKind::Coaccessibility,
        EvidenceKind::PeakGeneCorrelation,
        EvidenceKind::TssDistance,
        EvidenceKind::TfExpression,
        EvidenceKind::TgExpression,
        EvidenceKind::PeakAccessibility,
        EvidenceKind::EnhancerDb,
        EvidenceKind::StringExperimental,
        EvidenceKind::StringTextmining,
        EvidenceKind::StringCombined,
    ];

    /// canonical column name
    pub fn name(&self) -> &str {
        match self {
            EvidenceKind::SlidingWindow => "sliding_window_score",
            EvidenceKind::HomerBinding => "homer_binding_score",
            EvidenceKind::Coaccessibility => "cicero_score",
            EvidenceKind::PeakGeneCorrelation => "correlation",
            EvidenceKind::TssDistance => "tss_dist_score",
            EvidenceKind::TfExpression => "mean_tf_expression",
            EvidenceKind::TgExpression => "mean_tg_expression",
            EvidenceKind::PeakAccessibility => "mean_peak_accessibility",
            EvidenceKind::EnhancerDb => "enh_score",
            EvidenceKind::StringExperimental => "string_experimental_score",
            EvidenceKind::StringTextmining => "string_textmining_score",
            EvidenceKind::StringCombined => "string_combined_score",
            EvidenceKind::Unknown(name) => name,
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            EvidenceKind::SlidingWindow => &["sliding_window", "motif"],
            EvidenceKind::HomerBinding => &["homer"],
            EvidenceKind::Coaccessibility => &["cicero", "coaccessibility"],
            EvidenceKind::PeakGeneCorrelation => &["corr", "peak_gene_correlation"],
            EvidenceKind::TssDistance => &["tss_dist"],
            EvidenceKind::TfExpression => &["tf_expression"],
            EvidenceKind::TgExpression => &["tg_expression"],
            EvidenceKind::PeakAccessibility => &["peak_accessibility"],
            EvidenceKind::EnhancerDb => &["enhancer_db"],
            _ => &[],
        }
    }

    /// Scores that are already on a comparable scale upstream
    /// (expression means, distance decay, co-accessibility); quantile
    /// clipping leaves them alone.
    pub fn is_prescaled(&self) -> bool {
        matches!(
            self,
            EvidenceKind::TfExpression
                | EvidenceKind::TgExpression
                | EvidenceKind::PeakAccessibility
                | EvidenceKind::TssDistance
                | EvidenceKind::Coaccessibility
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EvidenceKind::Unknown(_))
    }
}

impl From<&str> for EvidenceKind {
    fn from(val: &str) -> Self {
        let val = val.trim();
        EvidenceKind::KNOWN
            .iter()
            .find(|k| {
                k.name().eq_ignore_ascii_case(val)
                    || k.aliases().iter().any(|a| a.eq_ignore_ascii_case(val))
            })
            .cloned()
            .unwrap_or_else(|| EvidenceKind::Unknown(val.to_lowercase().into_boxed_str()))
    }
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A candidate regulatory edge: TF -> peak -> target gene
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: Box<str>,
    pub peak: Peak,
    pub target: Box<str>,
}

/// A TF -> target gene pair, forgetting the peak
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub source: Box<str>,
    pub target: Box<str>,
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}@{}", self.source, self.peak, self.target)
    }
}

impl PairKey {
    /// normalize both symbols
    pub fn new(source: &str, target: &str) -> Result<Self, EdgeError> {
        Ok(Self {
            source: checked_symbol(SOURCE_COLUMN, source)?,
            target: checked_symbol(TARGET_COLUMN, target)?,
        })
    }
}

impl EdgeKey {
    /// normalize the symbols and the peak coordinates
    pub fn new(source: &str, peak: &str, target: &str) -> Result<Self, EdgeError> {
        Ok(Self {
            source: checked_symbol(SOURCE_COLUMN, source)?,
            peak: parse_peak(peak)?,
            target: checked_symbol(TARGET_COLUMN, target)?,
        })
    }

    pub fn pair(&self) -> PairKey {
        PairKey {
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

fn checked_symbol(field: &'static str, raw: &str) -> Result<Box<str>, EdgeError> {
    let symbol = normalize_symbol(raw);
    if symbol.is_empty() || symbol.contains(char::is_whitespace) {
        return Err(EdgeError::MalformedIdentifier {
            field,
            raw: raw.into(),
        });
    }
    Ok(symbol)
}

/// One melted evidence observation. `value` is `None` when the raw score
/// was not a finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    pub edge: EdgeKey,
    pub kind: EvidenceKind,
    pub value: Option<f64>,
}

impl EvidenceRecord {
    pub fn new(edge: EdgeKey, kind: EvidenceKind, value: f64) -> Self {
        Self {
            edge,
            kind,
            value: Some(value).filter(|x| x.is_finite()),
        }
    }

    /// Normalize one raw row of a melted table
    pub fn from_raw(
        source: &str,
        peak: &str,
        target: &str,
        score_type: &str,
        score_value: &str,
    ) -> Result<Self, EdgeError> {
        let edge = EdgeKey::new(source, peak, target)?;
        let kind = EvidenceKind::from(score_type);
        // the kind becomes a column name next to the keys and outputs
        let name = kind.name();
        if name.is_empty() || is_key_column(name) || is_reserved_column(name) {
            return Err(EdgeError::MalformedIdentifier {
                field: SCORE_TYPE_COLUMN,
                raw: score_type.into(),
            });
        }
        let value = parse_float_cell(score_value);
        if value.is_none() {
            debug!("{}: not a finite {} value `{}`", edge, kind, score_value);
        }
        Ok(Self { edge, kind, value })
    }
}

/// Records loaded from melted evidence files
#[derive(Debug, Default)]
pub struct MeltedEvidence {
    pub records: Vec<EvidenceRecord>,
    pub n_malformed: usize,
}

impl MeltedEvidence {
    pub fn extend(&mut self, other: MeltedEvidence) {
        self.records.extend(other.records);
        self.n_malformed += other.n_malformed;
    }
}

/// Read melted evidence from several files and concatenate them.
///
/// * `strict` - the first malformed row aborts instead of being skipped
pub fn read_melted_evidence_files(
    files: &[Box<str>],
    strict: bool,
) -> anyhow::Result<MeltedEvidence> {
    let mut out = MeltedEvidence::default();
    for file in files {
        let evidence = read_melted_evidence(file, strict)?;
        info!(
            "{}: {} evidence records ({} malformed rows skipped)",
            file,
            evidence.records.len(),
            evidence.n_malformed
        );
        out.extend(evidence);
    }
    Ok(out)
}

/// Read one melted evidence table (`.parquet`, `.csv`, `.tsv`,
/// optionally gzipped) with the columns `source_id`, `peak_id`,
/// `target_id`, `score_type`, `score_value`.
pub fn read_melted_evidence(file: &str, strict: bool) -> anyhow::Result<MeltedEvidence> {
    let required = [
        SOURCE_COLUMN,
        PEAK_COLUMN,
        TARGET_COLUMN,
        SCORE_TYPE_COLUMN,
        SCORE_VALUE_COLUMN,
    ];

    let rows: Vec<[Box<str>; 5]> = match file_ext(file).as_deref() {
        Ok("parquet") | Ok("pq") => {
            let names = peek_parquet_field_names(file)?;
            check_columns(file, &names, &required)?;
            let table = Table::from_parquet(file)?;
            let columns = required
                .iter()
                .map(|c| table.require_column(c).map(ColumnData::to_text_vec))
                .collect::<anyhow::Result<Vec<_>>>()?;
            (0..table.nrows())
                .map(|i| std::array::from_fn(|j| columns[j][i].clone()))
                .collect()
        }
        _ => {
            let out = read_lines_of_words_delim(file, delimiter_for(file), 0)?;
            check_columns(file, &out.header, &required)?;
            let index: Vec<usize> = required
                .iter()
                .filter_map(|c| out.header.iter().position(|h| h.eq_ignore_ascii_case(c)))
                .collect();
            out.lines
                .into_iter()
                .map(|words| {
                    std::array::from_fn(|j| words.get(index[j]).cloned().unwrap_or_default())
                })
                .collect()
        }
    };

    let parsed: Vec<Result<EvidenceRecord, EdgeError>> = rows
        .par_iter()
        .map(|[s, p, t, k, v]| EvidenceRecord::from_raw(s, p, t, k, v))
        .collect();

    let mut out = MeltedEvidence::default();
    for rec in parsed {
        match rec {
            Ok(rec) => out.records.push(rec),
            Err(e) if strict => return Err(anyhow::anyhow!(e).context(format!("reading {}", file))),
            Err(e) => {
                if out.n_malformed < 5 {
                    warn!("{}: skip row: {}", file, e);
                }
                out.n_malformed += 1;
            }
        }
    }
    Ok(out)
}

fn check_columns(file: &str, header: &[Box<str>], required: &[&str]) -> anyhow::Result<()> {
    for column in required {
        if !header.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            return Err(EdgeError::MissingColumn {
                column: (*column).into(),
                file: file.into(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_resolve_aliases_case_insensitively() {
        assert_eq!(EvidenceKind::from("homer"), EvidenceKind::HomerBinding);
        assert_eq!(EvidenceKind::from("HOMER_binding_score"), EvidenceKind::HomerBinding);
        assert_eq!(EvidenceKind::from("corr"), EvidenceKind::PeakGeneCorrelation);
        assert_eq!(EvidenceKind::from("TSS_dist_score"), EvidenceKind::TssDistance);
        assert_eq!(
            EvidenceKind::from("Missing_Feature"),
            EvidenceKind::Unknown("missing_feature".into())
        );
        assert!(EvidenceKind::HomerBinding < EvidenceKind::Unknown("a".into()));
    }

    #[test]
    fn raw_rows_are_normalized() -> anyhow::Result<()> {
        let rec = EvidenceRecord::from_raw("Sox2", "1:100-200", "nanog", "cicero", "0.5")?;
        assert_eq!(rec.edge.source.as_ref(), "SOX2");
        assert_eq!(rec.edge.peak.to_string(), "chr1:100-200");
        assert_eq!(rec.edge.target.as_ref(), "NANOG");
        assert_eq!(rec.kind, EvidenceKind::Coaccessibility);
        assert_eq!(rec.value, Some(0.5));

        let rec = EvidenceRecord::from_raw("Sox2", "chr1_100_200", "nanog", "cicero", "NaN")?;
        assert_eq!(rec.value, None);
        Ok(())
    }

    #[test]
    fn malformed_rows_are_typed_errors() {
        assert!(matches!(
            EvidenceRecord::from_raw("TF1", "chr1:200-100", "G1", "homer", "1"),
            Err(EdgeError::MalformedCoordinate(_))
        ));
        assert!(matches!(
            EvidenceRecord::from_raw(" ", "chr1:100-200", "G1", "homer", "1"),
            Err(EdgeError::MalformedIdentifier { .. })
        ));
        assert!(matches!(
            EvidenceRecord::from_raw("TF1", "chr1:100-200", "G1", "", "1"),
            Err(EdgeError::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn column_names_are_not_evidence_kinds() {
        for name in ["source_id", "Peak_ID", "target_id", "label", "prediction", "n_edges"] {
            assert!(matches!(
                EvidenceRecord::from_raw("TF1", "chr1:100-200", "G1", name, "1"),
                Err(EdgeError::MalformedIdentifier { field: SCORE_TYPE_COLUMN, .. })
            ));
        }
        assert!(EvidenceRecord::from_raw("TF1", "chr1:100-200", "G1", "my_score", "1").is_ok());
    }
}
