//! Florida corporate file decoder.
//!
//! The Florida export is a fixed-width text file, one entity per line. Blocks
//! are padded with spaces (and sometimes NUL bytes), so a line is split into
//! fields on runs of three or more spaces or on tabs:
//!
//! ```text
//! [0] entity id + name   [1] status/type   [2] principal street   [3] principal city,
//! [4] principal zip      [5] mailing street [6] mailing city,      [7] mailing state + zip
//! [8..] filing date somewhere as MMDDYYYY
//! ```
//!
//! Lines that do not fit are skipped without error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{first_zip5, parse_mdy, strip_trailing_comma};
use crate::models::{FloridaRecord, StandardRecord, Tabular};
use crate::parser::decode_lossy;

static ENTITY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][0-9]{11}").unwrap());
static ENTITY_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z][0-9]{11})(.*)$").unwrap());
static FIELD_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{3,}|\t+").unwrap());
static STATE_ZIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]{2})\s*([0-9]{5})").unwrap());
static DATE8: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{8}").unwrap());

/// Fewest fields a usable line splits into.
const MIN_FIELDS: usize = 8;

/// Options for decoding a Florida file.
#[derive(Debug, Clone)]
pub struct FloridaOptions {
    /// Keep only this filing date (`MM/DD/YYYY`). Ignored when it does not parse.
    pub date_filter: Option<String>,
    /// Project onto the standard schema using the mailing address.
    pub mailing_only: bool,
}

impl Default for FloridaOptions {
    fn default() -> Self {
        Self {
            date_filter: None,
            mailing_only: true,
        }
    }
}

/// Decoded records in the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FloridaOutput {
    /// Standard seven-column records.
    Mailing(Vec<StandardRecord>),
    /// Full principal + mailing records.
    Full(Vec<FloridaRecord>),
}

impl FloridaOutput {
    pub fn len(&self) -> usize {
        match self {
            FloridaOutput::Mailing(r) => r.len(),
            FloridaOutput::Full(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Header names of the output shape.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FloridaOutput::Mailing(_) => StandardRecord::COLUMNS,
            FloridaOutput::Full(_) => FloridaRecord::COLUMNS,
        }
    }
}

/// Result of decoding a file.
#[derive(Debug, Clone)]
pub struct FloridaParse {
    pub output: FloridaOutput,
    /// Non-blank lines in the file
    pub lines_seen: usize,
    /// Lines that did not match the layout
    pub lines_rejected: usize,
}

/// Decode a Florida file.
///
/// Bytes are decoded leniently; embedded NULs are treated as spaces.
pub fn parse_florida(bytes: &[u8], options: &FloridaOptions) -> FloridaParse {
    let text = decode_lossy(bytes);

    let mut lines_seen = 0;
    let mut records = Vec::new();
    for raw in text.split(is_line_break) {
        let line = raw.replace('\0', " ");
        if line.trim().is_empty() {
            continue;
        }
        lines_seen += 1;
        if let Some(record) = parse_line(&line) {
            records.push(record);
        }
    }
    let lines_rejected = lines_seen - records.len();

    let target = options.date_filter.as_deref().and_then(parse_mdy);
    if let Some(target) = target {
        records.retain(|r| parse_mdy(&r.filing_date) == Some(target));
    }

    let output = if options.mailing_only {
        FloridaOutput::Mailing(
            records
                .iter()
                .map(FloridaRecord::to_mailing)
                .filter(StandardRecord::is_complete)
                .collect(),
        )
    } else {
        FloridaOutput::Full(records.into_iter().filter(FloridaRecord::is_complete).collect())
    };

    FloridaParse {
        output,
        lines_seen,
        lines_rejected,
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Decode one line. `None` when it does not follow the layout.
///
/// Fields may come back empty; completeness is checked by the caller.
pub fn parse_line(line: &str) -> Option<FloridaRecord> {
    let line = line.trim_end_matches(['\n', '\r']);
    if !ENTITY_PREFIX.is_match(line) {
        return None;
    }

    let parts: Vec<&str> = FIELD_SEP
        .split(line)
        .filter(|p| !p.trim().is_empty())
        .collect();
    if parts.len() < MIN_FIELDS {
        return None;
    }

    let caps = ENTITY_NAME.captures(parts[0].trim())?;
    let entity_id = caps[1].trim().to_string();
    let name = caps[2].trim().to_string();

    let field = |i: usize| parts.get(i).copied().unwrap_or("");

    let principal_street = field(2).trim().to_string();
    let principal_city = strip_trailing_comma(field(3)).to_string();
    let principal_zip = first_zip5(field(4)).unwrap_or("").to_string();

    let mailing_street = field(5).trim().to_string();
    let mailing_city = strip_trailing_comma(field(6)).to_string();
    let (mailing_state, mailing_zip) = match STATE_ZIP.captures(field(7).trim()) {
        Some(c) => (c[1].to_string(), c[2].to_string()),
        None => (String::new(), String::new()),
    };

    let filing_date = parts[MIN_FIELDS..]
        .iter()
        .find_map(|p| DATE8.find(p))
        .map(|m| {
            let d = m.as_str();
            format!("{}/{}/{}", &d[0..2], &d[2..4], &d[4..])
        })
        .unwrap_or_default();

    Some(FloridaRecord {
        entity_id,
        name,
        filing_date,
        principal_street,
        principal_city,
        principal_zip,
        mailing_street,
        mailing_city,
        mailing_state,
        mailing_zip,
    })
}
