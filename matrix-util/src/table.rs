use crate::common_io::{delimiter_for, file_ext, read_lines_of_words_delim, write_lines};

/// Missing cells in text output
pub const MISSING_TEXT: &str = "NA";

/// One column of a keyed table; numeric cells may be missing
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Box<str>>),
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(x) => x.len(),
            ColumnData::Float(x) => x.len(),
            ColumnData::Int(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnData::Text(_))
    }

    /// numeric view of the column; text cells are parsed
    pub fn to_float_vec(&self) -> Vec<Option<f64>> {
        match self {
            ColumnData::Float(x) => x.clone(),
            ColumnData::Int(x) => x.iter().map(|v| v.map(|v| v as f64)).collect(),
            ColumnData::Text(x) => x.iter().map(|s| parse_float_cell(s)).collect(),
        }
    }

    /// text view of the column; numbers are formatted
    pub fn to_text_vec(&self) -> Vec<Box<str>> {
        (0..self.len()).map(|i| self.format_cell(i)).collect()
    }

    fn format_cell(&self, i: usize) -> Box<str> {
        match self {
            ColumnData::Text(x) => x[i].clone(),
            ColumnData::Float(x) => match x[i] {
                Some(v) => v.to_string().into_boxed_str(),
                None => MISSING_TEXT.into(),
            },
            ColumnData::Int(x) => match x[i] {
                Some(v) => v.to_string().into_boxed_str(),
                None => MISSING_TEXT.into(),
            },
        }
    }
}

/// Parse a numeric cell; `NA`, empty, `nan` and non-finite values are
/// missing
pub fn parse_float_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case(MISSING_TEXT) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// A column-oriented table with named columns of equal length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub(crate) names: Vec<Box<str>>,
    pub(crate) columns: Vec<ColumnData>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[Box<str>] {
        &self.names
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnData)> {
        self.names
            .iter()
            .map(|n| n.as_ref())
            .zip(self.columns.iter())
    }

    /// Append a column; its length must match the existing columns
    pub fn push_column(&mut self, name: &str, data: ColumnData) -> anyhow::Result<()> {
        if !self.columns.is_empty() && data.len() != self.nrows() {
            return Err(anyhow::anyhow!(
                "column `{}` has {} rows, but the table has {}",
                name,
                data.len(),
                self.nrows()
            ));
        }
        if self.position(name).is_some() {
            return Err(anyhow::anyhow!("duplicate column `{}`", name));
        }
        self.names.push(name.into());
        self.columns.push(data);
        Ok(())
    }

    /// case-insensitive column lookup
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.position(name).map(|j| &self.columns[j])
    }

    pub fn require_column(&self, name: &str) -> anyhow::Result<&ColumnData> {
        self.column(name)
            .ok_or(anyhow::anyhow!("missing column `{}`", name))
    }

    /// Write the table to `.parquet`, or to a delimited text file
    /// (`.csv`, `.tsv`, optionally gzipped)
    pub fn to_file(&self, file_path: &str) -> anyhow::Result<()> {
        match file_ext(file_path).as_deref() {
            Ok("parquet") | Ok("pq") => self.to_parquet(file_path),
            _ => self.to_delim(file_path, delimiter_for(file_path)),
        }
    }

    /// Read a table from `.parquet` or delimited text. Text columns named
    /// in `text_columns` stay text, the others are parsed as numbers.
    pub fn from_file(file_path: &str, text_columns: &[&str]) -> anyhow::Result<Self> {
        match file_ext(file_path).as_deref() {
            Ok("parquet") | Ok("pq") => Self::from_parquet(file_path),
            _ => Self::from_delim(file_path, delimiter_for(file_path), text_columns),
        }
    }

    pub fn to_delim(&self, file_path: &str, delim: char) -> anyhow::Result<()> {
        let sep = delim.to_string();
        let mut lines: Vec<Box<str>> = Vec::with_capacity(self.nrows() + 1);
        lines.push(self.names.join(&sep).into_boxed_str());

        let text_columns: Vec<Vec<Box<str>>> =
            self.columns.iter().map(|c| c.to_text_vec()).collect();

        for i in 0..self.nrows() {
            let words: Vec<&str> = text_columns.iter().map(|c| c[i].as_ref()).collect();
            lines.push(words.join(&sep).into_boxed_str());
        }
        write_lines(&lines, file_path)
    }

    pub fn from_delim(file_path: &str, delim: char, text_columns: &[&str]) -> anyhow::Result<Self> {
        let out = read_lines_of_words_delim(file_path, delim, 0)?;
        let ncols = out.header.len();

        if let Some((i, _)) = out
            .lines
            .iter()
            .enumerate()
            .find(|(_, words)| words.len() != ncols)
        {
            return Err(anyhow::anyhow!(
                "{}: data line {} has a different number of fields than the header ({})",
                file_path,
                i + 1,
                ncols
            ));
        }

        let mut table = Table::new();
        for (j, name) in out.header.iter().enumerate() {
            let is_text = text_columns.iter().any(|t| t.eq_ignore_ascii_case(name));
            let data = if is_text {
                ColumnData::Text(out.lines.iter().map(|w| w[j].clone()).collect())
            } else {
                ColumnData::Float(out.lines.iter().map(|w| parse_float_cell(&w[j])).collect())
            };
            table.push_column(name, data)?;
        }
        Ok(table)
    }
}
