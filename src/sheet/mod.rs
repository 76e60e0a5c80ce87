//! Loading of performance sheets (CSV or XLSX) into tables and typed records.

pub mod parse;
pub mod row;

pub use parse::{SheetFormat, load_path, load_table, records};
pub use row::{Cell, OperationRecord, Table};
