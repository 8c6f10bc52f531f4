use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn split_words(line: &str, delim: char) -> Vec<Box<str>> {
    line.split(delim)
        .map(|x| x.trim().to_owned().into_boxed_str())
        .collect()
}

/// Guess a field delimiter from the file name: `.csv` and `.csv.gz`
/// are comma-separated, everything else is tab-separated.
pub fn delimiter_for(file_path: &str) -> char {
    match file_ext(file_path).as_deref() {
        Ok("csv") => ',',
        _ => '\t',
    }
}

pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

///
/// Read lines and split them into words
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
/// Empty lines and lines starting with `#` or `%` are skipped.
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: char,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let buf_reader: Box<dyn BufRead> = open_buf_reader(input_file)?;

    fn is_data_line(line: &str) -> bool {
        !(line.trim().is_empty() || line.starts_with('#') || line.starts_with('%'))
    }

    let mut lines_raw: Vec<Box<str>> = vec![];
    for line in buf_reader.lines() {
        let line = line?;
        if is_data_line(&line) {
            lines_raw.push(line.into_boxed_str());
        }
    }

    let mut header = vec![];

    let body: &[Box<str>] = if hdr_line < 0 {
        &lines_raw
    } else {
        let n_skip = hdr_line as usize;
        if lines_raw.len() < (n_skip + 1) {
            return Err(anyhow::anyhow!("no header line in {}", input_file));
        }
        header.extend(split_words(&lines_raw[n_skip], delim));
        &lines_raw[(n_skip + 1)..]
    };

    // splitting is cheap, but evidence tables run to millions of lines
    let lines: Vec<Vec<Box<str>>> = body.par_iter().map(|s| split_words(s, delim)).collect();

    Ok(ReadLinesOut { lines, header })
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file_path: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file_path)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match ext {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn std::io::Write>> {
    // we can simply override with stdout
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(std::io::BufWriter::new(std::io::stdout())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let output_file = File::create(output_file)?;
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            let output_file = File::create(output_file)?;
            Ok(Box::new(BufWriter::new(output_file)))
        }
    }
}

///
/// Take the extension of a file, looking through a trailing `.gz`
/// * `file` - file name
///
pub fn file_ext(file_path: &str) -> anyhow::Result<Box<str>> {
    let path = Path::new(file_path);
    let path = match path.extension().and_then(|x| x.to_str()) {
        Some("gz") => Path::new(path.file_stem().unwrap_or_default()),
        _ => path,
    };
    path.extension()
        .and_then(|x| x.to_str())
        .map(|x| x.to_lowercase().into_boxed_str())
        .ok_or(anyhow::anyhow!("failed to extract extension: {}", file_path))
}

///
/// Create a parent directory if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

