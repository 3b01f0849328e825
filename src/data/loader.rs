use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::{Result, TraceError};
use super::model::{Schema, Trace};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and clean a trace from a CSV file.
///
/// * `None` / `Some(Schema::Headered)` – first row names the columns.
/// * `Some(Schema::Fixed(names))` – no header, columns named positionally.
///
/// Fails with [`TraceError::Schema`] when the file has fewer columns than the
/// schema needs, and with [`TraceError::Io`] / [`TraceError::Csv`] when it
/// cannot be read as a delimited table.
pub fn load_trace(path: &Path, schema: Option<&Schema>) -> Result<Trace> {
    let file = File::open(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trace = load_trace_from_reader(file, schema)?;
    log::info!("Loaded {} from {}", trace, path.display());
    Ok(trace)
}

/// Like [`load_trace`] but the layout is sniffed from the first row.
///
/// See [`detect_schema_from_reader`] for the rule.
pub fn load_any(path: &Path) -> Result<Trace> {
    let bytes = std::fs::read(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = detect_schema_from_reader(bytes.as_slice())?;
    log::debug!("{}: detected {:?}", path.display(), schema);
    let trace = load_trace_from_reader(bytes.as_slice(), Some(&schema))?;
    log::info!("Loaded {} from {}", trace, path.display());
    Ok(trace)
}

pub fn load_trace_from_reader<R: Read>(reader: R, schema: Option<&Schema>) -> Result<Trace> {
    let schema = schema.cloned().unwrap_or(Schema::Headered);
    let raw = read_raw(reader, &schema)?;
    Ok(clean(raw))
}

/// Guess the layout of a file from its first row.
///
/// If any field of the first row is numeric the file is taken to be the
/// headerless oscillator layout ([`Schema::oscillator`]); otherwise the first
/// row is a header. A header never holds numbers, while a corrupt first
/// record still has some, and is then dropped during cleaning.
pub fn detect_schema(path: &Path) -> Result<Schema> {
    let file = File::open(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    detect_schema_from_reader(file)
}

pub fn detect_schema_from_reader<R: Read>(reader: R) -> Result<Schema> {
    let mut reader = csv_reader(reader, false);
    let first = reader.headers()?;
    let numeric = first.iter().any(|cell| parse_cell(cell).is_some());
    Ok(if numeric {
        Schema::oscillator()
    } else {
        Schema::Headered
    })
}

// ---------------------------------------------------------------------------
// Raw table: names + coerced cells, before cleaning
// ---------------------------------------------------------------------------

/// A parsed but uncleaned table. `None` marks a cell that did not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

/// Read the whole table, coercing every cell to `f64`.
///
/// The column count is checked on the first row, before any record is
/// coerced. Short rows are padded with missing cells.
pub fn read_raw<R: Read>(reader: R, schema: &Schema) -> Result<RawTable> {
    let mut reader = csv_reader(reader, schema.has_header());

    let first = reader.headers()?.clone();
    let expected = schema.min_columns();
    if first.len() < expected {
        return Err(TraceError::Schema {
            expected,
            actual: first.len(),
        });
    }

    let names: Vec<String> = match schema {
        Schema::Headered => first
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if h.is_empty() {
                    format!("column_{i}")
                } else {
                    h.to_string()
                }
            })
            .collect(),
        Schema::Fixed(names) => {
            if first.len() > names.len() {
                log::warn!(
                    "Ignoring {} column(s) beyond the {}-column schema",
                    first.len() - names.len(),
                    names.len()
                );
            }
            names.clone()
        }
    };

    let mut seen = BTreeSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(TraceError::DuplicateChannel(name.clone()));
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = (0..names.len())
            .map(|i| record.get(i).and_then(parse_cell))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { names, rows })
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Drop every record holding a missing or non-finite cell and renumber the
/// survivors from zero.
pub fn clean(raw: RawTable) -> Trace {
    let total = raw.rows.len();
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(total); raw.names.len()];

    for (row_no, row) in raw.rows.iter().enumerate() {
        let complete = row.iter().all(|cell| matches!(cell, Some(v) if v.is_finite()));
        if !complete {
            log::debug!("Dropping row {row_no}: missing or non-finite cell");
            continue;
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell.unwrap_or(f64::NAN));
        }
    }

    let kept = columns.first().map(Vec::len).unwrap_or(0);
    if kept < total {
        log::info!("Dropped {} of {} rows during cleaning", total - kept, total);
    }

    Trace::from_columns(raw.names, columns, kept)
}

// -- helpers --

fn csv_reader<R: Read>(reader: R, has_headers: bool) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// A cell that does not parse as a float is missing, not an error.
fn parse_cell(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}
