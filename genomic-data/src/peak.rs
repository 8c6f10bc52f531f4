use std::str::FromStr;

/// A peak identifier that could not be turned into a canonical
/// `chr:start-stop` interval
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed coordinate `{raw}`: {reason}")]
pub struct MalformedCoordinate {
    pub raw: Box<str>,
    pub reason: &'static str,
}

impl MalformedCoordinate {
    fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.into(),
            reason,
        }
    }
}

/// Half-open chromatin peak interval `[start, stop)` on a chromosome
/// named with the `chr` prefix.
///
/// Two peaks are the same iff their canonical strings are the same;
/// there is no coordinate tolerance.
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Peak {
    pub chr: Box<str>,
    pub start: u64,
    pub stop: u64,
}

/// display as `chr:start-stop`
impl std::fmt::Display for Peak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.stop)
    }
}

impl Peak {
    /// Build a peak from raw parts; `chr` is normalized
    pub fn new(chr: &str, start: u64, stop: u64) -> Result<Self, MalformedCoordinate> {
        if stop <= start {
            return Err(MalformedCoordinate::new(
                &format!("{}:{}-{}", chr, start, stop),
                "end must be greater than start",
            ));
        }
        Ok(Self {
            chr: normalize_chr(chr)?,
            start,
            stop,
        })
    }
}

impl FromStr for Peak {
    type Err = MalformedCoordinate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_peak(s)
    }
}

/// Normalize a chromosome name to `chr` + contig.
///
/// `1`, `chr1` and `CHR1` all become `chr1`; the contig itself keeps its
/// case (`chrX`, `chrUn_KI270302v1`).
pub fn normalize_chr(raw: &str) -> Result<Box<str>, MalformedCoordinate> {
    let trimmed = raw.trim();
    let contig = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
        _ => trimmed,
    };

    if contig.is_empty() {
        return Err(MalformedCoordinate::new(raw, "empty chromosome name"));
    }
    if contig.contains(|c: char| c.is_whitespace() || c == ':') {
        return Err(MalformedCoordinate::new(raw, "invalid chromosome name"));
    }
    Ok(format!("chr{}", contig).into_boxed_str())
}

/// Parse a peak identifier.
///
/// Accepts `chr1:100-200` (and `1:100-200`) as well as the
/// underscore-separated `chr1_100_200` written by co-accessibility tools.
/// Start and stop must be non-negative integers with `start < stop`.
pub fn parse_peak(raw: &str) -> Result<Peak, MalformedCoordinate> {
    let s = raw.trim();

    let (chr, start, stop) = if let Some((chr, range)) = s.rsplit_once(':') {
        let (start, stop) = range
            .split_once('-')
            .ok_or_else(|| MalformedCoordinate::new(raw, "expected `chr:start-end`"))?;
        (chr, start, stop)
    } else {
        let mut words = s.rsplitn(3, '_');
        match (words.next(), words.next(), words.next()) {
            (Some(stop), Some(start), Some(chr)) => (chr, start, stop),
            _ => {
                return Err(MalformedCoordinate::new(
                    raw,
                    "expected `chr:start-end` or `chr_start_end`",
                ))
            }
        }
    };

    let start = parse_position(raw, start)?;
    let stop = parse_position(raw, stop)?;

    if stop <= start {
        return Err(MalformedCoordinate::new(
            raw,
            "end must be greater than start",
        ));
    }

    Ok(Peak {
        chr: normalize_chr(chr).map_err(|e| MalformedCoordinate::new(raw, e.reason))?,
        start,
        stop,
    })
}

fn parse_position(raw: &str, pos: &str) -> Result<u64, MalformedCoordinate> {
    let pos = pos.trim();
    if pos.is_empty() || !pos.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedCoordinate::new(
            raw,
            "positions must be non-negative integers",
        ));
    }
    pos.parse::<u64>()
        .map_err(|_| MalformedCoordinate::new(raw, "position out of range"))
}
