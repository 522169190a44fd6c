use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use slideset_common::{Cell, ElementKind, Underlying};
use slideset_table::{ColumnMeta, Table};

use crate::SaveDestination;
use crate::error::IoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTrim {
    #[default]
    None,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTypeInference {
    /// Every column is read as text.
    Off,
    /// A column takes the first kind every one of its fields parses as:
    /// integer, numeric, logical (`true`/`false` words), then text.
    #[default]
    Basic,
}

#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    /// When false, columns are named `C1`, `C2`, ...
    pub has_headers: bool,
    pub trim: CsvTrim,
    pub type_inference: CsvTypeInference,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            trim: CsvTrim::None,
            type_inference: CsvTypeInference::Basic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvNewline {
    #[default]
    Lf,
    Crlf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvQuoteStyle {
    #[default]
    Necessary,
    Always,
    Never,
    NonNumeric,
}

#[derive(Clone, Debug)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
    pub newline: CsvNewline,
    pub quote_style: CsvQuoteStyle,
    /// Emit a header record of column names.
    pub headers: bool,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            newline: CsvNewline::Lf,
            quote_style: CsvQuoteStyle::Necessary,
            headers: true,
        }
    }
}

/// Read one table from CSV. Every record must have the same number of
/// fields.
pub fn read_table<R: Read>(
    reader: R,
    name: &str,
    opts: &CsvReadOptions,
) -> Result<Table, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(opts.has_headers)
        .trim(match opts.trim {
            CsvTrim::None => csv::Trim::None,
            CsvTrim::All => csv::Trim::All,
        })
        .from_reader(reader);

    let mut names: Vec<String> = if opts.has_headers {
        rdr.headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| if h.is_empty() { default_column_name(i) } else { h.to_string() })
            .collect()
    } else {
        Vec::new()
    };
    let mut fields: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for record in rdr.records() {
        let record = record?;
        if fields.is_empty() && !record.is_empty() {
            fields = vec![Vec::new(); record.len()];
        }
        for (column, field) in record.iter().enumerate() {
            fields[column].push(field.to_string());
        }
    }
    if names.is_empty() {
        names = (0..fields.len()).map(default_column_name).collect();
    }

    let mut table = Table::new(name);
    for (name, values) in names.into_iter().zip(fields) {
        let kind = match opts.type_inference {
            CsvTypeInference::Off => ElementKind::Text,
            CsvTypeInference::Basic => infer_kind(&values),
        };
        let meta = ColumnMeta::new(name, kind);
        let cells = values
            .iter()
            .map(|v| Cell::with_value(field_value(kind, v), meta.subtype.clone()))
            .collect();
        table
            .add_column_with_cells(meta, cells)
            .map_err(|e| IoError::table(table.name(), e))?;
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(table = %table.name(), columns = table.column_count(), rows = table.row_count(), "read csv table");
    Ok(table)
}

/// Read a CSV file, naming the table after the file stem.
pub fn read_table_path<P: AsRef<Path>>(path: P, opts: &CsvReadOptions) -> Result<Table, IoError> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let file = File::open(path)?;
    let mut table = read_table(BufReader::new(file), &name, opts)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        table.set_working_dir(Some(dir.to_path_buf()));
    }
    Ok(table)
}

/// Write a table as CSV, one record per row of cell text.
pub fn write_table(
    table: &Table,
    dest: SaveDestination<'_>,
    opts: &CsvWriteOptions,
) -> Result<Option<Vec<u8>>, IoError> {
    match dest {
        SaveDestination::InPlace => Err(IoError::Backend {
            backend: "csv".to_string(),
            message: "tables carry no source path; save to an explicit path".to_string(),
        }),
        SaveDestination::Path(path) => {
            let mut file = File::create(path)?;
            write_records(&mut file, table, opts)?;
            Ok(None)
        }
        SaveDestination::Writer(writer) => {
            write_records(writer, table, opts)?;
            Ok(None)
        }
        SaveDestination::Bytes => {
            let mut buf = Vec::new();
            write_records(&mut buf, table, opts)?;
            Ok(Some(buf))
        }
    }
}

fn write_records<W: Write + ?Sized>(
    out: &mut W,
    table: &Table,
    opts: &CsvWriteOptions,
) -> Result<(), IoError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .terminator(match opts.newline {
            CsvNewline::Lf => csv::Terminator::Any(b'\n'),
            CsvNewline::Crlf => csv::Terminator::CRLF,
        })
        .quote_style(match opts.quote_style {
            CsvQuoteStyle::Necessary => csv::QuoteStyle::Necessary,
            CsvQuoteStyle::Always => csv::QuoteStyle::Always,
            CsvQuoteStyle::Never => csv::QuoteStyle::Never,
            CsvQuoteStyle::NonNumeric => csv::QuoteStyle::NonNumeric,
        })
        .from_writer(out);

    if opts.headers {
        wtr.write_record(table.columns().iter().map(|c| c.name.as_str()))?;
    }
    let columns = (0..table.column_count())
        .map(|c| table.column_cells(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| IoError::table(table.name(), e))?;
    for row in 0..table.row_count() {
        wtr.write_record(columns.iter().map(|cells| cells[row].text()))?;
    }
    wtr.flush()?;
    Ok(())
}

fn infer_kind(values: &[String]) -> ElementKind {
    if values.is_empty() || values.iter().any(String::is_empty) {
        return ElementKind::Text;
    }
    if values.iter().all(|v| parse_unambiguous_i64(v).is_some()) {
        ElementKind::Integer
    } else if values.iter().all(|v| parse_numeric(v).is_some()) {
        ElementKind::Numeric
    } else if values.iter().all(|v| parse_bool(v).is_some()) {
        ElementKind::Logical
    } else {
        ElementKind::Text
    }
}

/// Value of a field already known to fit `kind`.
fn field_value(kind: ElementKind, field: &str) -> Underlying {
    match kind {
        ElementKind::Integer => parse_unambiguous_i64(field)
            .map(Underlying::Integer)
            .unwrap_or_else(|| Underlying::Text(field.to_string())),
        ElementKind::Numeric => parse_numeric(field)
            .map(Underlying::Numeric)
            .unwrap_or_else(|| Underlying::Text(field.to_string())),
        ElementKind::Logical => parse_bool(field)
            .map(Underlying::Logical)
            .unwrap_or_else(|| Underlying::Text(field.to_string())),
        ElementKind::Text | ElementKind::FileLink => Underlying::Text(field.to_string()),
    }
}

/// Name for a column whose header is blank or absent, from its 0-based index.
fn default_column_name(index: usize) -> String {
    format!("C{}", index + 1)
}

/// Integers outside the range an `f64` holds exactly are not numeric; a
/// column containing one stays text.
fn parse_numeric(s: &str) -> Option<f64> {
    const EXACT: i64 = 1 << 53;
    match parse_unambiguous_i64(s) {
        Some(i) => (-EXACT..=EXACT).contains(&i).then_some(i as f64),
        None => parse_unambiguous_f64(s),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_unambiguous_i64(s: &str) -> Option<i64> {
    // Leading zeros ("007") stay text.
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty()
        || (digits.len() > 1 && digits.starts_with('0'))
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    s.parse().ok()
}

fn parse_unambiguous_f64(s: &str) -> Option<f64> {
    if !(s.contains('.') || s.contains('e') || s.contains('E')) {
        return None;
    }
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.") {
        return None;
    }
    let n: f64 = s.parse().ok()?;
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn inference_prefers_the_narrowest_kind() {
        assert_eq!(infer_kind(&strings(&["1", "-2", "30"])), ElementKind::Integer);
        assert_eq!(infer_kind(&strings(&["1", "2.5"])), ElementKind::Numeric);
        assert_eq!(infer_kind(&strings(&["TRUE", "false"])), ElementKind::Logical);
        assert_eq!(infer_kind(&strings(&["0", "1"])), ElementKind::Integer);
        assert_eq!(
            infer_kind(&strings(&["9007199254740993", "0.5"])),
            ElementKind::Text
        );
        assert_eq!(
            infer_kind(&strings(&["9007199254740992", "0.5"])),
            ElementKind::Numeric
        );
        assert_eq!(infer_kind(&strings(&["007", "8"])), ElementKind::Text);
        assert_eq!(infer_kind(&strings(&["1", ""])), ElementKind::Text);
        assert_eq!(infer_kind(&strings(&["inf"])), ElementKind::Text);
    }
}
