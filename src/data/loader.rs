use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::error::LoadError;
use super::model::{Row, Table};

/// Identifier columns, most preferred first. When none is present the
/// first column is used.
pub const IDENTIFIER_CANDIDATES: [&str; 5] = ["serial_number", "sn", "serial", "part_number", "partno"];

pub const NAME_COLUMN: &str = "name";
pub const PRICE_COLUMN: &str = "price";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Where a table comes from. Fixed for the lifetime of the process so that
/// a reload re-reads the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn load(&self) -> Result<Table, LoadError> {
        load_table(&self.path, self.delimiter)
    }
}

/// Parse a delimited text file with a header row into a [`Table`].
///
/// Fails only when the file cannot be opened or read, or has no header.
/// Short rows are padded with `""`, long rows are truncated and invalid
/// UTF-8 is replaced; each is counted and logged once per load.
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let read_error = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let header = reader.byte_headers().map_err(read_error)?.clone();
    if header.is_empty() {
        return Err(LoadError::MissingHeader {
            path: path.to_path_buf(),
        });
    }
    let mut columns: Vec<String> = header.iter().map(|h| decode(h).0).collect();
    if let Some(first) = columns.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }

    let width = columns.len();
    let mut stats = IrregularRows::default();
    let mut records = Vec::new();

    for result in reader.byte_records() {
        let record = result.map_err(read_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() < width {
            stats.short += 1;
            log::debug!("{}:{line}: {} of {width} fields, padding", path.display(), record.len());
        } else if record.len() > width {
            stats.long += 1;
            log::debug!("{}:{line}: {} of {width} fields, truncating", path.display(), record.len());
        }

        let mut cells = Vec::with_capacity(width);
        for field in record.iter().take(width) {
            let (text, lossy) = decode(field);
            if lossy {
                stats.lossy += 1;
            }
            cells.push(text);
        }
        cells.resize(width, String::new());
        records.push(cells);
    }

    stats.report(path);
    Ok(build_table(columns, records))
}

// ---------------------------------------------------------------------------
// Table construction
// ---------------------------------------------------------------------------

/// Derive the normalized fields for every record and assemble the table.
///
/// `records` are padded or truncated to the header width.
pub(crate) fn build_table(columns: Vec<String>, records: Vec<Vec<String>>) -> Table {
    let columns = dedupe_columns(columns);
    let width = columns.len();

    let position = |name: &str| columns.iter().position(|c| c == name);
    let name_index = position(NAME_COLUMN);
    let price_index = position(PRICE_COLUMN);
    let identifier_column = IDENTIFIER_CANDIDATES
        .iter()
        .find_map(|&candidate| position(candidate))
        .unwrap_or(0);

    let rows = records
        .into_iter()
        .map(|mut cells| {
            cells.resize(width, String::new());
            let normalized_name = name_index
                .map(|i| cells[i].to_lowercase())
                .unwrap_or_default();
            let normalized_price = price_index.and_then(|i| parse_price(&cells[i]));
            let identifier = cells.get(identifier_column).cloned().unwrap_or_default();
            Row {
                cells,
                normalized_name,
                normalized_price,
                identifier,
            }
        })
        .collect();

    Table {
        rows,
        columns,
        identifier_column,
    }
}

/// Recover a number from free-form price text such as `"$1,299.00"` or
/// `"EUR -4.5"`: keep only digits, `.` and `-`, then parse.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rename repeated header names the way pandas' CSV reader does: each
/// repeat of `x` gets the next unused `x.N` from a per-name counter, and a
/// generated name that collides is suffixed again (`x.1.1`).
fn dedupe_columns(columns: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::with_capacity(columns.len());
    let mut out = Vec::with_capacity(columns.len());

    for mut column in columns {
        let mut count = counts.get(&column).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(column.clone(), count + 1);
            column = format!("{column}.{count}");
            count = counts.get(&column).copied().unwrap_or(0);
        }
        counts.insert(column.clone(), count + 1);
        out.push(column);
    }
    out
}

fn decode(bytes: &[u8]) -> (String, bool) {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => (s.to_string(), false),
        Cow::Owned(s) => (s, true),
    }
}

/// Counts of rows that needed repair while loading.
#[derive(Debug, Default)]
struct IrregularRows {
    short: usize,
    long: usize,
    lossy: usize,
}

impl IrregularRows {
    fn report(&self, path: &Path) {
        if self.short > 0 {
            log::warn!("{}: padded {} short row(s) with empty values", path.display(), self.short);
        }
        if self.long > 0 {
            log::warn!("{}: dropped extra fields from {} row(s)", path.display(), self.long);
        }
        if self.lossy > 0 {
            log::warn!("{}: replaced invalid UTF-8 in {} field(s)", path.display(), self.lossy);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn source(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_rows_and_derives_fields() {
        let file = source(b"sn,name,price\nSN1,Bolt A,$12.50\nSN2,Bolt B,\n");
        let table = load_table(file.path(), b',').unwrap();

        assert_eq!(table.columns, ["sn", "name", "price"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.identifier_column_name(), "sn");

        let first = &table.rows[0];
        assert_eq!(first.normalized_name, "bolt a");
        assert_eq!(first.normalized_price, Some(12.5));
        assert_eq!(first.identifier, "SN1");

        let second = &table.rows[1];
        assert_eq!(second.cells, ["SN2", "Bolt B", ""]);
        assert_eq!(second.normalized_price, None);
    }

    #[test]
    fn identifier_follows_preference_order() {
        let table = build_table(
            vec!["partno".into(), "serial".into(), "name".into()],
            vec![vec!["P-1".into(), "S-1".into(), "x".into()]],
        );
        assert_eq!(table.identifier_column_name(), "serial");
        assert_eq!(table.rows[0].identifier, "S-1");
    }

    #[test]
    fn identifier_falls_back_to_first_column() {
        let table = build_table(
            vec!["code".into(), "description".into()],
            vec![vec!["C-9".into(), "Gasket".into()]],
        );
        assert_eq!(table.identifier_column, 0);
        assert_eq!(table.rows[0].identifier, "C-9");
        assert_eq!(table.rows[0].normalized_name, "");
        assert_eq!(table.rows[0].normalized_price, None);
    }

    #[test]
    fn ragged_rows_are_padded_and_truncated() {
        let file = source(b"sn,name,price\nSN1\nSN2,Nut,4,extra,fields\n");
        let table = load_table(file.path(), b',').unwrap();
        assert_eq!(table.rows[0].cells, ["SN1", "", ""]);
        assert_eq!(table.rows[1].cells, ["SN2", "Nut", "4"]);
        assert_eq!(table.rows[1].normalized_price, Some(4.0));
    }

    #[test]
    fn invalid_utf8_and_blank_lines_do_not_fail() {
        let file = source(b"sn,name\n\nSN1,Gr\xfcn\n\nSN2,Blue\n");
        let table = load_table(file.path(), b',').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].cells[1], "Gr\u{fffd}n");
    }

    #[test]
    fn custom_delimiter_and_bom() {
        let file = source("\u{feff}part_number;name\nA;Pump\n".as_bytes());
        let table = SourceFile::new(file.path()).with_delimiter(b';').load().unwrap();
        assert_eq!(table.columns, ["part_number", "name"]);
        assert_eq!(table.rows[0].identifier, "A");
    }

    #[test]
    fn duplicate_headers_are_renamed() {
        let columns = dedupe_columns(vec!["a".into(), "a".into(), "a.1".into(), "a".into()]);
        assert_eq!(columns, ["a", "a.1", "a.1.1", "a.2"]);

        let columns = dedupe_columns(vec!["sn".into(), "name".into(), "sn".into(), "sn".into()]);
        assert_eq!(columns, ["sn", "name", "sn.1", "sn.2"]);
    }

    #[test]
    fn header_only_file_is_an_empty_table() {
        let file = source(b"sn,name\n");
        let table = load_table(file.path(), b',').unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn empty_file_has_no_header() {
        let file = source(b"");
        let err = load_table(file.path(), b',').unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader { .. }), "{err}");
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("LE.txt"), b',').unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }), "{err}");
    }

    #[test]
    fn price_parsing_strips_noise() {
        assert_eq!(parse_price("$1,299.00"), Some(1299.0));
        assert_eq!(parse_price("EUR -4.5"), Some(-4.5));
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("-"), None);
    }
}
