use serde::Serialize;
use std::borrow::Cow;

pub const COL_OP_TYPE: &str = "OP TYPE";
pub const COL_OP_CODE: &str = "OP CODE";
pub const COL_CORE_COUNT: &str = "CORE COUNT";
pub const COL_KERNEL_DURATION: &str = "DEVICE KERNEL DURATION [ns]";
pub const COL_PM_IDEAL: &str = "PM IDEAL [ns]";
pub const COL_GLOBAL_CALL_COUNT: &str = "GLOBAL CALL COUNT";
pub const COL_ADJUSTED_UTILIZATION: &str = "Adjusted Utilization";

/// A single cell of a loaded sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Classify a raw delimited-text field.
    ///
    /// A field is a `Number` only when the value prints back as the same
    /// text, so `as_text` never rewrites it: `54` is a number, `007` and
    /// `1.50` stay text. Numeric columns parse text cells on demand.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return Cell::Empty;
        }
        match field.parse::<f64>() {
            Ok(v) if v.to_string() == field => Cell::Number(v),
            _ => Cell::Text(field.to_string()),
        }
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Number(v) => Cow::Owned(v.to_string()),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

/// A sheet as loaded, with header names kept verbatim.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Where the table came from (file name); used in error messages.
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, col); short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One executed operation from a performance sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    pub op_code: String,
    pub op_type: String,
    pub core_count: Option<u32>,
    pub kernel_duration_ns: Option<f64>,
    pub ideal_ns: Option<f64>,
    pub global_call_count: Option<i64>,
    /// Filled in by `model::utilization::annotate`.
    pub adjusted_utilization: f64,
}
