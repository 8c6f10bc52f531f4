use crate::error::EdgeError;
use crate::evidence::{EdgeKey, PairKey};
use fnv::FnvHashSet as HashSet;
use log::{info, warn};
use matrix_util::common_io::{delimiter_for, read_lines_of_words_delim, ReadLinesOut};

const SOURCE_HEADERS: [&str; 6] = ["source", "source_id", "tf", "regulator", "from", "gene1"];
const TARGET_HEADERS: [&str; 6] = ["target", "target_id", "gene", "tg", "to", "gene2"];

/// Reference regulatory network: a set of (TF, target) pairs
#[derive(Debug, Clone, Default)]
pub struct GroundTruthSet {
    pairs: HashSet<PairKey>,
    sources: HashSet<Box<str>>,
}

impl GroundTruthSet {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = PairKey>,
    {
        let pairs: HashSet<PairKey> = pairs.into_iter().collect();
        let sources = pairs.iter().map(|p| p.source.clone()).collect();
        Self { pairs, sources }
    }

    /// Merge several reference files into one set
    pub fn from_files(files: &[Box<str>]) -> anyhow::Result<Self> {
        let mut pairs = vec![];
        for file in files {
            pairs.extend(read_reference_pairs(file)?);
        }
        let ret = Self::from_pairs(pairs);
        info!(
            "ground truth: {} pairs over {} TFs from {} file(s)",
            ret.len(),
            ret.sources.len(),
            files.len()
        );
        Ok(ret)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, pair: &PairKey) -> bool {
        self.pairs.contains(pair)
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.sources.contains(source)
    }
}

/// Read the (TF, target) pairs of a delimited reference file (header
/// required). Header names are matched against common spellings;
/// otherwise the first two columns are used.
fn read_reference_pairs(file: &str) -> anyhow::Result<Vec<PairKey>> {
    let ReadLinesOut { lines, header } = read_lines_of_words_delim(file, delimiter_for(file), 0)?;

    if header.len() < 2 {
        anyhow::bail!("{}: expected at least two columns in the header", file);
    }

    let find = |aliases: &[&str]| {
        header
            .iter()
            .position(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
    };
    let (src_col, tgt_col) = match (find(&SOURCE_HEADERS), find(&TARGET_HEADERS)) {
        (Some(s), Some(t)) if s != t => (s, t),
        _ => {
            warn!(
                "{}: unrecognized header [{}]; using the first two columns",
                file,
                header.join(", ")
            );
            (0, 1)
        }
    };

    let mut pairs = Vec::with_capacity(lines.len());
    let mut n_skipped = 0;
    for words in lines {
        match (words.get(src_col), words.get(tgt_col)) {
            (Some(s), Some(t)) => match PairKey::new(s, t) {
                Ok(pair) => pairs.push(pair),
                Err(_) => n_skipped += 1,
            },
            _ => n_skipped += 1,
        }
    }
    if n_skipped > 0 {
        warn!("{}: skipped {} malformed reference lines", file, n_skipped);
    }
    Ok(pairs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Positive,
    Negative,
    Unlabeled,
}

impl Label {
    /// `1`, `0`, or null
    pub fn to_int(self) -> Option<i64> {
        match self {
            Label::Positive => Some(1),
            Label::Negative => Some(0),
            Label::Unlabeled => None,
        }
    }

    pub fn from_int(x: Option<i64>) -> Self {
        match x {
            Some(1) => Label::Positive,
            Some(0) => Label::Negative,
            _ => Label::Unlabeled,
        }
    }
}

/// Which edges may receive a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelScope {
    /// every edge is positive or negative
    #[default]
    AllEdges,
    /// edges from TFs absent in the reference stay unlabeled
    ReferenceSources,
}

/// An empty reference labels everything negative, whatever the scope
pub fn label_pair(pair: &PairKey, truth: &GroundTruthSet, scope: LabelScope) -> Label {
    if truth.is_empty() {
        Label::Negative
    } else if truth.contains(pair) {
        Label::Positive
    } else if scope == LabelScope::ReferenceSources && !truth.has_source(&pair.source) {
        Label::Unlabeled
    } else {
        Label::Negative
    }
}

/// Label each edge by whether its (TF, target) pair is in the reference;
/// the peak is ignored
pub fn label_edges(edges: &[EdgeKey], truth: &GroundTruthSet, scope: LabelScope) -> Vec<Label> {
    warn_if_empty(truth);
    edges
        .iter()
        .map(|e| label_pair(&e.pair(), truth, scope))
        .collect()
}

pub fn label_pairs(pairs: &[PairKey], truth: &GroundTruthSet, scope: LabelScope) -> Vec<Label> {
    warn_if_empty(truth);
    pairs.iter().map(|p| label_pair(p, truth, scope)).collect()
}

fn warn_if_empty(truth: &GroundTruthSet) {
    if truth.is_empty() {
        warn!("{}", EdgeError::EmptyGroundTruth);
    }
}

pub fn count_labels(labels: &[Label]) -> (usize, usize, usize) {
    labels.iter().fold((0, 0, 0), |(p, n, u), l| match l {
        Label::Positive => (p + 1, n, u),
        Label::Negative => (p, n + 1, u),
        Label::Unlabeled => (p, n, u + 1),
    })
}
