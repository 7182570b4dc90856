//! Reading uploaded files: lenient decoding, delimiter detection and CSV
//! parsing into typed state rows or a plain header + rows table. Xlsx
//! workbooks are read into the same table shape.
//!
//! No state-specific logic here.

use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Cursor;
use std::path::Path;

use crate::error::{IngestError, IngestResult};

/// Cell spellings read as an absent value.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True when `value` is empty or one of the spreadsheet null spellings.
pub fn is_null_marker(value: &str) -> bool {
    NULL_MARKERS.contains(&value)
}

/// Serde helper for optional cells: null markers become `None`.
pub fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|v| !is_null_marker(v)))
}

/// A delimited file read as headers plus string rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Column headers, trimmed
    pub headers: Vec<String>,
    /// Data rows, each padded to `headers.len()`
    pub rows: Vec<Vec<String>>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

impl CsvTable {
    /// Index of a column by exact header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Required columns absent from the header, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| self.column(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Never fails: unknown encodings and invalid sequences fall back to lossy UTF-8.
/// A leading byte-order mark is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "iso-8859-15" | "latin-9" | "latin9" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        _ => decode_lossy(bytes),
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// UTF-8 decode with invalid sequences replaced by U+FFFD.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to comma when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn decode_upload(bytes: &[u8]) -> IngestResult<(String, String)> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    if content.trim().is_empty() {
        return Err(IngestError::EmptyFile);
    }
    Ok((content, encoding))
}

fn reader(content: &str, delimiter: char) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// Read a comma-separated state export into typed rows.
///
/// All `required` columns must appear in the header; missing ones are
/// reported together. Extra columns are ignored.
pub fn read_rows<T: DeserializeOwned>(bytes: &[u8], required: &[&str]) -> IngestResult<Vec<T>> {
    let (content, _) = decode_upload(bytes)?;
    let mut rdr = reader(&content, ',');

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::NoHeaders);
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Parse a delimited file with encoding and delimiter auto-detection.
pub fn parse_table(bytes: &[u8]) -> IngestResult<CsvTable> {
    let (content, encoding) = decode_upload(bytes)?;
    let delimiter = detect_delimiter(&content);
    let mut rdr = reader(&content, delimiter);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(CsvTable {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

/// Zip local-file header, the first bytes of every xlsx workbook.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// True when `bytes` look like an xlsx workbook rather than text.
pub fn is_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Read the first worksheet of an xlsx workbook.
///
/// The first row is the header. Date cells come out as `MM/DD/YYYY`.
pub fn parse_workbook(bytes: &[u8]) -> IngestResult<CsvTable> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e: calamine::XlsxError| IngestError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyFile)?
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    let mut lines = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(IngestError::EmptyFile),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::NoHeaders);
    }

    let rows = lines
        .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()))
        .map(|mut row| {
            row.resize(headers.len(), String::new());
            row
        })
        .collect();

    Ok(CsvTable {
        headers,
        rows,
        encoding: "xlsx".to_string(),
        delimiter: ',',
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%m/%d/%Y").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::Error(_) => String::new(),
        _ => cell.to_string(),
    }
}

/// Parse an upload as a workbook or a delimited file, whichever it is.
pub fn parse_upload(bytes: &[u8]) -> IngestResult<CsvTable> {
    if is_workbook(bytes) {
        parse_workbook(bytes)
    } else {
        parse_table(bytes)
    }
}

/// Parse a workbook or delimited file from disk with auto-detection.
pub fn parse_table_file<P: AsRef<Path>>(path: P) -> IngestResult<CsvTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_upload(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(rename = "name", default, deserialize_with = "nullable")]
        name: Option<String>,
        #[serde(rename = "age", default, deserialize_with = "nullable")]
        age: Option<String>,
    }

    #[test]
    fn test_read_rows_by_header() {
        let csv = "age, name \n30,Alice\n,Bob\n";
        let rows: Vec<Row> = read_rows(csv.as_bytes(), &["name", "age"]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("Alice"));
        assert_eq!(rows[0].age.as_deref(), Some("30"));
        assert_eq!(rows[1].age, None);
    }

    #[test]
    fn test_null_markers_are_absent() {
        let csv = "name,age\nN/A,nan\nNULL,<NA>\n";
        let rows: Vec<Row> = read_rows(csv.as_bytes(), &["name"]).unwrap();

        assert!(rows.iter().all(|r| r.name.is_none() && r.age.is_none()));
    }

    #[test]
    fn test_optional_column_may_be_missing() {
        let csv = "name\nAlice\n";
        let rows: Vec<Row> = read_rows(csv.as_bytes(), &["name"]).unwrap();
        assert_eq!(rows[0].age, None);
    }

    #[test]
    fn test_missing_required_columns_reported_together() {
        let csv = "other\n1\n";
        let err = read_rows::<Row>(csv.as_bytes(), &["name", "age"]).unwrap_err();
        match err {
            IngestError::MissingColumns(cols) => assert_eq!(cols, vec!["name", "age"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_quoted_commas_stay_in_cell() {
        let csv = "name,age\n\"Smith, Jones\",40\n";
        let rows: Vec<Row> = read_rows(csv.as_bytes(), &["name"]).unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("Smith, Jones"));
    }

    #[test]
    fn test_empty_file_error() {
        assert!(matches!(parse_table(b"  \n"), Err(IngestError::EmptyFile)));
        assert!(matches!(read_rows::<Row>(b"", &[]), Err(IngestError::EmptyFile)));
    }

    #[test]
    fn test_parse_table_pads_short_rows() {
        let table = parse_table(b"a;b;c\n1;2\n\n3;4;5\n").unwrap();

        assert_eq!(table.delimiter, ';');
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_missing_columns() {
        let table = parse_table(b"Name,City\nA,B\n").unwrap();
        assert_eq!(table.missing_columns(&["Name", "Zipcode"]), vec!["Zipcode"]);
        assert_eq!(table.column("City"), Some(1));
    }

    #[test]
    fn test_bom_removed() {
        let table = parse_table("\u{feff}Name,City\nA,B\n".as_bytes()).unwrap();
        assert_eq!(table.headers[0], "Name");
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_single_column() {
        assert_eq!(detect_delimiter("Name\nAlice"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_keeps_currency_sign() {
        // 0xA4 is the generic currency sign in latin1, the euro only in ISO-8859-15.
        assert_eq!(decode_content(&[0xA4], "iso-8859-1"), "\u{a4}");
        assert_eq!(decode_content(&[0xA4], "iso-8859-15"), "\u{20ac}");
    }

    #[test]
    fn test_workbook_detected_by_content() {
        assert!(is_workbook(b"PK\x03\x04rest"));
        assert!(!is_workbook(b"Name,City\n"));
        assert!(matches!(parse_upload(b"PK\x03\x04broken"), Err(IngestError::Workbook(_))));
        assert_eq!(parse_upload(b"Name,City\nA,B\n").unwrap().rows, vec![vec!["A", "B"]]);
    }

    #[test]
    fn test_lossy_replaces_invalid_bytes() {
        let decoded = decode_lossy(&[b'A', 0xFF, b'B']);
        assert_eq!(decoded, "A\u{fffd}B");
    }
}
