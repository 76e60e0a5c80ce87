use crate::error::{Result, VizError};
use crate::sheet::row::*;
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Input formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    pub fn from_filename(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".xlsx") {
            Ok(SheetFormat::Xlsx)
        } else if lower.ends_with(".csv") {
            Ok(SheetFormat::Csv)
        } else {
            Err(VizError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// Read a sheet from disk; the format follows the file name.
pub fn load_path(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| VizError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_table(&bytes, &name)
}

/// Parse an uploaded byte stream into a table.
///
/// The first row (CSV record or worksheet row) is the header; header names are
/// kept exactly as written.
pub fn load_table(bytes: &[u8], filename: &str) -> Result<Table> {
    let table = match SheetFormat::from_filename(filename)? {
        SheetFormat::Csv => parse_csv(bytes, filename)?,
        SheetFormat::Xlsx => parse_xlsx(bytes, filename)?,
    };
    debug!(
        source = filename,
        columns = table.headers.len(),
        rows = table.len(),
        "loaded sheet"
    );
    Ok(table)
}

fn parse_csv(bytes: &[u8], filename: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(VizError::EmptySheet(filename.to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }

    Ok(Table {
        source: filename.to_string(),
        headers,
        rows,
    })
}

fn parse_xlsx(bytes: &[u8], filename: &str) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| VizError::EmptySheet(filename.to_string()))??;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Err(VizError::EmptySheet(filename.to_string())),
    };

    let rows = iter
        .map(|r| r.iter().map(cell_from_data).collect())
        .collect();

    Ok(Table {
        source: filename.to_string(),
        headers,
        rows,
    })
}

fn header_text(d: &Data) -> String {
    match d {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_from_data(d: &Data) -> Cell {
    match d {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// Resolved positions of the columns the pipeline reads.
struct Columns {
    op_type: usize,
    op_code: usize,
    core_count: usize,
    kernel_duration: usize,
    pm_ideal: usize,
    global_call_count: usize,
}

impl Columns {
    fn resolve(table: &Table) -> Result<Self> {
        let find = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| VizError::MissingColumn {
                    column: name.to_string(),
                    source_name: table.source.clone(),
                })
        };
        Ok(Self {
            op_type: find(COL_OP_TYPE)?,
            op_code: find(COL_OP_CODE)?,
            core_count: find(COL_CORE_COUNT)?,
            kernel_duration: find(COL_KERNEL_DURATION)?,
            pm_ideal: find(COL_PM_IDEAL)?,
            global_call_count: find(COL_GLOBAL_CALL_COUNT)?,
        })
    }
}

/// Extract typed operation records from a loaded table.
///
/// Missing required columns and non-numeric text in numeric columns are
/// errors. Empty numeric cells become `None`; the utilization step turns
/// those into a zero utilization.
pub fn records(table: &Table) -> Result<Vec<OperationRecord>> {
    let cols = Columns::resolve(table)?;

    let mut out = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let core_count = match number(table, row, cols.core_count, COL_CORE_COUNT)? {
            Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Some(v as u32),
            Some(v) => return Err(bad_cell(row, COL_CORE_COUNT, v.to_string())),
            None => None,
        };
        let global_call_count =
            match number(table, row, cols.global_call_count, COL_GLOBAL_CALL_COUNT)? {
                Some(v) if v.fract() == 0.0 => Some(v as i64),
                Some(v) => return Err(bad_cell(row, COL_GLOBAL_CALL_COUNT, v.to_string())),
                None => None,
            };

        out.push(OperationRecord {
            op_code: table.cell(row, cols.op_code).as_text().into_owned(),
            op_type: table.cell(row, cols.op_type).as_text().into_owned(),
            core_count,
            kernel_duration_ns: number(table, row, cols.kernel_duration, COL_KERNEL_DURATION)?,
            ideal_ns: number(table, row, cols.pm_ideal, COL_PM_IDEAL)?,
            global_call_count,
            adjusted_utilization: 0.0,
        });
    }
    Ok(out)
}

/// Numeric view of a cell; NaN reads the same as an empty cell.
fn number(table: &Table, row: usize, col: usize, name: &str) -> Result<Option<f64>> {
    match table.cell(row, col) {
        Cell::Empty => Ok(None),
        Cell::Number(v) if v.is_nan() => Ok(None),
        Cell::Number(v) => Ok(Some(*v)),
        Cell::Text(s) if s.trim().is_empty() => Ok(None),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| bad_cell(row, name, s.clone())),
    }
}

fn bad_cell(row: usize, column: &str, value: String) -> VizError {
    VizError::BadCell {
        row: row + 1,
        column: column.to_string(),
        value,
    }
}
